use crate::types::BlockPosition;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Horizontal chunk coordinates. A chunk column is 16x16 blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChunkPosition {
    pub x: i32,
    pub z: i32,
}

impl ChunkPosition {
    pub const SHIFT: i32 = 4;

    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    pub fn containing(pos: BlockPosition) -> Self {
        Self::new(pos.x >> Self::SHIFT, pos.z >> Self::SHIFT)
    }

    pub fn min_block_x(&self) -> i32 {
        self.x << Self::SHIFT
    }

    pub fn min_block_z(&self) -> i32 {
        self.z << Self::SHIFT
    }
}

impl fmt::Display for ChunkPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.x, self.z)
    }
}

/// Axis-aligned box of blocks, both corners inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CuboidRegion {
    min: BlockPosition,
    max: BlockPosition,
}

impl CuboidRegion {
    pub fn new(a: BlockPosition, b: BlockPosition) -> Self {
        Self {
            min: BlockPosition::new(a.x.min(b.x), a.y.min(b.y), a.z.min(b.z)),
            max: BlockPosition::new(a.x.max(b.x), a.y.max(b.y), a.z.max(b.z)),
        }
    }

    pub fn min(&self) -> BlockPosition {
        self.min
    }

    pub fn max(&self) -> BlockPosition {
        self.max
    }

    pub fn contains(&self, pos: BlockPosition) -> bool {
        (self.min.x..=self.max.x).contains(&pos.x)
            && (self.min.y..=self.max.y).contains(&pos.y)
            && (self.min.z..=self.max.z).contains(&pos.z)
    }

    /// Saturates at `u64::MAX` for regions spanning the whole coordinate range.
    pub fn volume(&self) -> u64 {
        let span = |min: i32, max: i32| (i64::from(max) - i64::from(min) + 1) as u64;
        span(self.min.x, self.max.x)
            .saturating_mul(span(self.min.y, self.max.y))
            .saturating_mul(span(self.min.z, self.max.z))
    }

    /// Every block position, x fastest, then z, then y.
    pub fn positions(&self) -> impl Iterator<Item = BlockPosition> + '_ {
        let (min, max) = (self.min, self.max);
        (min.y..=max.y).flat_map(move |y| {
            (min.z..=max.z)
                .flat_map(move |z| (min.x..=max.x).map(move |x| BlockPosition::new(x, y, z)))
        })
    }

    /// Chunks overlapping the region, widened by `halo` chunks on each horizontal side.
    pub fn chunks(&self, halo: u32) -> Vec<ChunkPosition> {
        let halo = halo as i32;
        let lo = ChunkPosition::containing(self.min);
        let hi = ChunkPosition::containing(self.max);
        let mut chunks = Vec::new();
        for x in (lo.x - halo)..=(hi.x + halo) {
            for z in (lo.z - halo)..=(hi.z + halo) {
                chunks.push(ChunkPosition::new(x, z));
            }
        }
        chunks
    }
}

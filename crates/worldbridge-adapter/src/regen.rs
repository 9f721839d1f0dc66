//! Region regeneration through a disposable sibling world.
//!
//! The live world is never touched. A throwaway world sharing its generator is
//! created in a temporary directory, the chunks covering the region (plus a
//! halo) are generated there, and the result is copied block by block into the
//! caller's extent. The throwaway world and its directory are removed on every
//! exit path.

use crate::binding::{ChunkFuture, EphemeralWorld, GenerationStage, HostBinding, RegenSource};
use crate::block::BlockStateHolder;
use crate::codec::TagCodec;
use crate::config::AdapterConfig;
use crate::mutator::BlockMutator;
use crate::property::PropertyRegistry;
use futures::task::noop_waker_ref;
use futures::FutureExt;
use std::collections::HashMap;
use std::task::{Context, Poll};
use std::thread;
use tempfile::TempDir;
use worldbridge_common::{BlockPosition, BridgeError, ChunkPosition, CuboidRegion, Result};
use worldbridge_logger::{
    log,
    LogSeverity::{Debug, Error, Info},
};
use worldbridge_nbt::Tag;

/// Destination of regenerated blocks, usually the caller's edit session.
pub trait Extent {
    fn set_block(&mut self, pos: BlockPosition, block: BlockStateHolder) -> bool;

    fn set_biome(&mut self, pos: BlockPosition, biome: &str) -> bool;
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegenOptions {
    /// Generate with this seed instead of the live world's.
    pub seed: Option<i64>,
    pub regen_biomes: bool,
}

impl RegenOptions {
    pub fn with_seed(mut self, seed: i64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_biomes(mut self) -> Self {
        self.regen_biomes = true;
        self
    }
}

/// Replaces every `seed` key in the tree, at any depth.
pub fn override_seed(tag: &mut Tag, seed: i64) {
    match tag {
        Tag::Compound(map) => {
            for (key, value) in map.iter_mut() {
                if key == "seed" {
                    *value = Tag::Long(seed);
                } else {
                    override_seed(value, seed);
                }
            }
        }
        Tag::List(elements) => elements.iter_mut().for_each(|e| override_seed(e, seed)),
        _ => {}
    }
}

/// Owns the ephemeral world and its storage; tears both down when dropped.
struct EphemeralGuard<W: EphemeralWorld> {
    world: W,
    storage: Option<TempDir>,
}

impl<W: EphemeralWorld> Drop for EphemeralGuard<W> {
    fn drop(&mut self) {
        if let Err(err) = self.world.close() {
            log(format!("Failed to close ephemeral world: {}", err), Error);
        }
        if let Some(storage) = self.storage.take() {
            let path = storage.path().to_path_buf();
            if let Err(err) = storage.close() {
                log(
                    format!("Failed to delete regeneration storage {}: {}", path.display(), err),
                    Error,
                );
            }
        }
    }
}

pub struct Regenerator<'a, B: HostBinding> {
    binding: &'a B,
    registry: &'a PropertyRegistry,
    config: &'a AdapterConfig,
}

impl<'a, B: HostBinding> Regenerator<'a, B> {
    pub fn new(binding: &'a B, registry: &'a PropertyRegistry, config: &'a AdapterConfig) -> Self {
        Self {
            binding,
            registry,
            config,
        }
    }

    pub fn regenerate<S, X>(
        &self,
        source: &S,
        region: &CuboidRegion,
        extent: &mut X,
        options: &RegenOptions,
    ) -> Result<bool>
    where
        S: RegenSource,
        S::Ephemeral: EphemeralWorld<Node = B::Node, State = B::State>,
        X: Extent + ?Sized,
    {
        let mut settings = source.world_settings();
        if let Some(seed) = options.seed {
            settings.seed = seed;
            override_seed(&mut settings.generator, seed);
        }

        let storage = tempfile::Builder::new()
            .prefix(&self.config.regen_temp_prefix)
            .tempdir()?;
        log(
            format!(
                "Regenerating {} blocks of {} in {}",
                region.volume(),
                settings.name,
                storage.path().display()
            ),
            Info,
        );

        let world = source.create_ephemeral(&settings, storage.path())?;
        let mut guard = EphemeralGuard {
            world,
            storage: Some(storage),
        };

        let chunks = self.await_chunks(&mut guard.world, region)?;
        self.copy_region(&guard.world, &chunks, region, extent, options)?;

        log(format!("Regenerated {} chunks", chunks.len()), Info);
        Ok(true)
    }

    /// Requests every chunk and waits for all of them, letting the host
    /// scheduler run between polls. Fails as soon as one chunk fails.
    fn await_chunks<W>(
        &self,
        world: &mut W,
        region: &CuboidRegion,
    ) -> Result<HashMap<ChunkPosition, W::Chunk>>
    where
        W: EphemeralWorld,
    {
        let mut pending: Vec<(ChunkPosition, ChunkFuture<W::Chunk>)> = region
            .chunks(self.config.regen_halo_chunks)
            .into_iter()
            .map(|pos| (pos, world.request_chunk(pos, GenerationStage::Features)))
            .collect();
        let mut ready = HashMap::with_capacity(pending.len());
        let mut cx = Context::from_waker(noop_waker_ref());

        loop {
            let mut i = 0;
            while i < pending.len() {
                match pending[i].1.poll_unpin(&mut cx) {
                    Poll::Ready(Some(chunk)) => {
                        pending.swap_remove(i);
                        ready.insert(world.chunk_position(&chunk), chunk);
                    }
                    Poll::Ready(None) => {
                        return Err(BridgeError::RegenFailed(format!(
                            "chunk {} failed to generate",
                            pending[i].0
                        )));
                    }
                    Poll::Pending => i += 1,
                }
            }
            if pending.is_empty() {
                return Ok(ready);
            }

            let ran = world.run_pending_tasks(self.config.regen_pump_budget);
            if let Some(watchdog) = self.binding.watchdog() {
                watchdog.tick();
            }
            if ran == 0 {
                thread::yield_now();
            }
        }
    }

    fn copy_region<W, X>(
        &self,
        world: &W,
        chunks: &HashMap<ChunkPosition, W::Chunk>,
        region: &CuboidRegion,
        extent: &mut X,
        options: &RegenOptions,
    ) -> Result<()>
    where
        W: EphemeralWorld<Node = B::Node, State = B::State>,
        X: Extent + ?Sized,
    {
        let mutator = BlockMutator::new(self.binding, self.registry, self.config);
        let codec = TagCodec::new(self.binding, self.config.list_policy);
        let mut refused = 0usize;

        for pos in region.positions() {
            let chunk = chunks.get(&pos.chunk()).ok_or_else(|| {
                BridgeError::RegenFailed(format!("chunk {} was never generated", pos.chunk()))
            })?;

            let mut block = mutator.holder_from_state(&world.chunk_block_state(chunk, pos));
            if let Some(native) = world.chunk_block_entity(chunk, pos) {
                block = block.with_nbt(codec.to_stable(&native)?);
            }
            if !extent.set_block(pos, block) {
                refused += 1;
            }

            if options.regen_biomes {
                if let Some(biome) = world.chunk_biome(chunk, pos) {
                    extent.set_biome(pos, &biome);
                }
            }
        }

        if refused > 0 {
            log(format!("Extent refused {} regenerated blocks", refused), Debug);
        }
        Ok(())
    }
}

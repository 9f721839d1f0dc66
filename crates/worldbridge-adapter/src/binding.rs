//! The version-specific surface an adapter is built on.
//!
//! Everything in this module is implemented once per host release. The
//! algorithms elsewhere in the crate only ever talk to the host through these
//! traits, so supporting a new release means writing a new binding and nothing
//! else.

use crate::property::PropertyValue;
use crate::side_effect::SideEffect;
use futures::future::BoxFuture;
use std::collections::BTreeSet;
use std::io;
use std::path::Path;
use worldbridge_common::{BlockPosition, ChunkPosition, Direction, Location, Result};
use worldbridge_nbt::Tag;

/// Borrowed view of one host tag node, classified into the closed set of kinds.
#[derive(Debug)]
pub enum NativeView<'a, N> {
    End,
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    ByteArray(&'a [i8]),
    IntArray(&'a [i32]),
    LongArray(&'a [i64]),
    String(&'a str),
    /// Elements are fetched separately through [`NativeTags::list_elements`].
    List,
    Compound(Vec<(&'a str, &'a N)>),
    /// A node class this binding does not know. Always fatal.
    Unrecognized(String),
}

/// Owned description of a host node to construct.
#[derive(Debug)]
pub enum NativeValue<N> {
    End,
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    ByteArray(Vec<i8>),
    IntArray(Vec<i32>),
    LongArray(Vec<i64>),
    String(String),
    List(Vec<N>),
    Compound(Vec<(String, N)>),
}

/// Access to the host's own tag tree classes.
pub trait NativeTags {
    type Node: Clone;

    fn inspect<'a>(&self, node: &'a Self::Node) -> NativeView<'a, Self::Node>;

    /// Recovers the elements of a list node. Hosts that keep the element type
    /// in a side record may fail here on legacy data.
    fn list_elements<'a>(
        &self,
        list: &'a Self::Node,
    ) -> std::result::Result<Vec<&'a Self::Node>, String>;

    fn build(&self, value: NativeValue<Self::Node>) -> Self::Node;
}

/// Kind of one state axis as the host declares it.
#[derive(Debug, Clone, PartialEq)]
pub enum NativeAxisKind {
    Boolean,
    Integer(Vec<i32>),
    Enum(Vec<String>),
    Direction(Vec<Direction>),
    Unrecognized(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct NativeAxis {
    pub name: String,
    pub kind: NativeAxisKind,
}

/// Access to the host's block types and block states.
pub trait NativeStates {
    type State: Clone + PartialEq;

    /// `None` if the host has no such block type.
    fn default_state(&self, block_type: &str) -> Option<Self::State>;

    fn state_axes(&self, block_type: &str) -> Option<Vec<NativeAxis>>;

    fn block_type_of(&self, state: &Self::State) -> String;

    /// Sets one axis, translating the value into the host's own value object.
    /// `None` means the host refused the value.
    fn with_property(
        &self,
        state: &Self::State,
        axis: &str,
        value: &PropertyValue,
    ) -> Option<Self::State>;

    fn property_values(&self, state: &Self::State) -> Vec<(String, PropertyValue)>;

    fn state_id(&self, state: &Self::State) -> u32;

    fn state_by_id(&self, id: u32) -> Option<Self::State>;

    fn is_air(&self, state: &Self::State) -> bool;
}

pub trait Watchdog {
    fn tick(&self);
}

/// Root of a binding: identifies the release and ties the pieces together.
pub trait HostBinding: NativeTags + NativeStates {
    /// Data version this binding was written against.
    fn expected_data_version(&self) -> i32;

    /// Data version the running host reports.
    fn data_version(&self) -> i32;

    /// Locates every host internal the binding needs. Runs once at startup.
    fn resolve(&self) -> Result<()> {
        Ok(())
    }

    fn supported_side_effects(&self) -> BTreeSet<SideEffect>;

    /// Translation key of the block's display name, `None` for unknown types.
    fn block_translation_key(&self, block_type: &str) -> Option<String>;

    fn item_translation_key(&self, item_type: &str) -> Option<String>;

    fn watchdog(&self) -> Option<&dyn Watchdog> {
        None
    }
}

/// Whether a plugin-visible event was allowed to proceed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOutcome {
    Allowed,
    Cancelled,
}

/// A live world of the host.
pub trait NativeWorld {
    type Node;
    type State;

    fn block_state(&self, pos: BlockPosition) -> Self::State;

    /// Installs `state` without cascading updates. Returns the previous state,
    /// or `None` when the host refused the placement.
    fn set_block_state(&mut self, pos: BlockPosition, state: Self::State) -> Option<Self::State>;

    fn has_block_entity(&self, pos: BlockPosition) -> bool;

    /// Registry id of the block-entity at `pos`, if the host knows it.
    fn block_entity_id(&self, pos: BlockPosition) -> Option<String>;

    fn save_block_entity(&self, pos: BlockPosition) -> Option<Self::Node>;

    fn load_block_entity(&mut self, pos: BlockPosition, tag: Self::Node) -> bool;

    fn valid_state_for_position(&self, state: &Self::State, pos: BlockPosition) -> Self::State;

    fn update_lighting(&mut self, pos: BlockPosition);

    fn mark_block_changed(&mut self, pos: BlockPosition);

    fn notify_block_update(&mut self, pos: BlockPosition, old: &Self::State, new: &Self::State);

    /// Runs physics for the block at `neighbor` after `source` changed.
    fn neighbor_changed(&mut self, neighbor: BlockPosition, source: BlockPosition, old: &Self::State);

    fn update_shape(&mut self, pos: BlockPosition, state: &Self::State);

    fn fire_physics_event(&mut self, pos: BlockPosition, new: &Self::State) -> EventOutcome;

    fn on_block_state_change(&mut self, pos: BlockPosition, old: &Self::State, new: &Self::State);

    fn can_place(&self, state: &Self::State, pos: BlockPosition) -> bool;

    fn clear_container(&mut self, pos: BlockPosition) -> bool;

    fn send_block_entity_data(&mut self, player: &str, pos: BlockPosition, tag: Self::Node);

    /// Sends an entity status packet about `player` to that player alone.
    fn send_entity_status(&mut self, player: &str, status: u8);
}

/// Entities of a live world.
pub trait NativeEntities {
    type Node;
    type Entity;

    /// `None` for entities the host cannot name.
    fn entity_type(&self, entity: &Self::Entity) -> Option<String>;

    fn save_entity(&self, entity: &Self::Entity) -> Self::Node;

    fn create_entity(&mut self, type_id: &str) -> Option<Self::Entity>;

    fn load_entity(&mut self, entity: &Self::Entity, tag: Self::Node);

    fn place_entity(&mut self, entity: &Self::Entity, location: &Location);

    fn add_entity(&mut self, entity: &Self::Entity) -> bool;
}

/// Settings a world was created with, in the stable model.
#[derive(Debug, Clone, PartialEq)]
pub struct WorldSettings {
    pub name: String,
    pub seed: i64,
    pub environment: String,
    /// Generator settings tree; may embed the seed in nested compounds.
    pub generator: Tag,
    pub game_rules: Vec<(String, String)>,
}

/// How far chunk generation must have progressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum GenerationStage {
    Terrain,
    Features,
    Full,
}

/// Future of one chunk request; resolves to `None` when generation failed.
pub type ChunkFuture<C> = BoxFuture<'static, Option<C>>;

/// A live world that can spawn a disposable sibling for regeneration.
pub trait RegenSource {
    type Ephemeral: EphemeralWorld;

    fn world_settings(&self) -> WorldSettings;

    /// Builds a non-persisted world sharing this world's generator, storing its
    /// scratch data under `storage`.
    fn create_ephemeral(&self, settings: &WorldSettings, storage: &Path) -> Result<Self::Ephemeral>;
}

pub trait EphemeralWorld {
    type Node;
    type State;
    type Chunk: Send + 'static;

    fn request_chunk(&mut self, pos: ChunkPosition, stage: GenerationStage) -> ChunkFuture<Self::Chunk>;

    /// Lets the host scheduler drain up to `budget` queued tasks. Returns how
    /// many ran.
    fn run_pending_tasks(&mut self, budget: u32) -> usize;

    fn chunk_position(&self, chunk: &Self::Chunk) -> ChunkPosition;

    fn chunk_block_state(&self, chunk: &Self::Chunk, pos: BlockPosition) -> Self::State;

    fn chunk_block_entity(&self, chunk: &Self::Chunk, pos: BlockPosition) -> Option<Self::Node>;

    fn chunk_biome(&self, chunk: &Self::Chunk, pos: BlockPosition) -> Option<String>;

    /// Stops the world and releases its handles. Called exactly once.
    fn close(&mut self) -> io::Result<()>;
}

#![allow(dead_code)]

//! In-memory host used by the integration tests.

use futures::FutureExt;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::runtime::Handle;
use tokio::sync::oneshot;
use uuid::Uuid;
use worldbridge_adapter::binding::{
    ChunkFuture, EphemeralWorld, EventOutcome, GenerationStage, HostBinding, NativeAxis,
    NativeAxisKind, NativeEntities, NativeStates, NativeTags, NativeValue, NativeView,
    NativeWorld, RegenSource, Watchdog, WorldSettings,
};
use worldbridge_adapter::{BlockStateHolder, Extent, PropertyValue, SideEffect};
use worldbridge_common::{BlockPosition, BridgeError, ChunkPosition, Direction, Location, Result};
use worldbridge_nbt::Tag;

pub const DATA_VERSION: i32 = 3465;

// ---------------------------------------------------------------------------
// tag tree

/// Host tag node. Lists keep their element kinds in a separate record.
#[derive(Debug, Clone, PartialEq)]
pub enum MemNode {
    Leaf(Tag),
    List { kinds: Vec<u8>, items: Vec<MemNode> },
    Compound(Vec<(String, MemNode)>),
    Alien(String),
}

impl MemNode {
    pub fn kind_id(&self) -> u8 {
        match self {
            MemNode::Leaf(tag) => tag.get_type_id(),
            MemNode::List { .. } => 9,
            MemNode::Compound(_) => 10,
            MemNode::Alien(_) => 255,
        }
    }

    /// A list whose kind record lost track of its elements.
    pub fn corrupt_list(items: Vec<MemNode>) -> MemNode {
        MemNode::List { kinds: Vec::new(), items }
    }

    pub fn get(&self, key: &str) -> Option<&MemNode> {
        match self {
            MemNode::Compound(entries) => entries.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }

    pub fn has(&self, key: &str) -> bool {
        self.get(key).is_some()
    }
}

// ---------------------------------------------------------------------------
// block states

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MemState {
    pub block: String,
    pub props: BTreeMap<String, PropertyValue>,
}

impl MemState {
    pub fn new(block: &str) -> Self {
        Self {
            block: block.to_owned(),
            props: BTreeMap::new(),
        }
    }

    pub fn air() -> Self {
        Self::new("minecraft:air")
    }

    pub fn with(mut self, name: &str, value: PropertyValue) -> Self {
        self.props.insert(name.to_owned(), value);
        self
    }

    pub fn chest(facing: Direction) -> Self {
        Self::new("minecraft:chest")
            .with("facing", PropertyValue::Direction(facing))
            .with("type", PropertyValue::Enum("single".to_owned()))
            .with("waterlogged", PropertyValue::Bool(false))
    }

    pub fn grass() -> Self {
        Self::new("minecraft:grass_block").with("snowy", PropertyValue::Bool(false))
    }
}

fn axis(name: &str, kind: NativeAxisKind) -> NativeAxis {
    NativeAxis {
        name: name.to_owned(),
        kind,
    }
}

fn enum_axis(name: &str, values: &[&str]) -> NativeAxis {
    axis(
        name,
        NativeAxisKind::Enum(values.iter().map(|v| v.to_string()).collect()),
    )
}

fn block_table() -> Vec<(String, Vec<NativeAxis>)> {
    let horizontal = vec![Direction::North, Direction::South, Direction::West, Direction::East];
    vec![
        ("minecraft:air".to_owned(), vec![]),
        ("minecraft:stone".to_owned(), vec![]),
        (
            "minecraft:grass_block".to_owned(),
            vec![axis("snowy", NativeAxisKind::Boolean)],
        ),
        ("minecraft:oak_log".to_owned(), vec![enum_axis("axis", &["y", "x", "z"])]),
        (
            "minecraft:chest".to_owned(),
            vec![
                axis("facing", NativeAxisKind::Direction(horizontal.clone())),
                enum_axis("type", &["single", "left", "right"]),
                axis("waterlogged", NativeAxisKind::Boolean),
            ],
        ),
        (
            "minecraft:repeater".to_owned(),
            vec![
                axis("delay", NativeAxisKind::Integer(vec![1, 2, 3, 4])),
                axis("facing", NativeAxisKind::Direction(horizontal)),
                axis("locked", NativeAxisKind::Boolean),
                axis("powered", NativeAxisKind::Boolean),
            ],
        ),
        (
            "test:spline".to_owned(),
            vec![axis("shape", NativeAxisKind::Unrecognized("SplineProperty".to_owned()))],
        ),
    ]
}

fn axis_values(kind: &NativeAxisKind) -> Vec<PropertyValue> {
    match kind {
        NativeAxisKind::Boolean => vec![PropertyValue::Bool(false), PropertyValue::Bool(true)],
        NativeAxisKind::Integer(values) => values.iter().copied().map(PropertyValue::Int).collect(),
        NativeAxisKind::Enum(values) => values.iter().cloned().map(PropertyValue::Enum).collect(),
        NativeAxisKind::Direction(values) => {
            values.iter().copied().map(PropertyValue::Direction).collect()
        }
        NativeAxisKind::Unrecognized(_) => Vec::new(),
    }
}

fn all_states(block: &str, axes: &[NativeAxis]) -> Vec<MemState> {
    let mut states = vec![MemState::new(block)];
    for axis in axes {
        let values = axis_values(&axis.kind);
        if values.is_empty() {
            continue;
        }
        let mut next = Vec::with_capacity(states.len() * values.len());
        for state in &states {
            for value in &values {
                next.push(state.clone().with(&axis.name, value.clone()));
            }
        }
        states = next;
    }
    states
}

#[derive(Default)]
pub struct MemWatchdog {
    pub ticks: AtomicUsize,
}

impl Watchdog for MemWatchdog {
    fn tick(&self) {
        self.ticks.fetch_add(1, Ordering::SeqCst);
    }
}

/// Items that have no block form.
pub const ITEMS: [&str; 2] = ["minecraft:diamond", "minecraft:stick"];

/// Binding of the in-memory host.
pub struct MemHost {
    pub data_version: i32,
    pub missing: Option<String>,
    pub unsupported: BTreeSet<SideEffect>,
    pub watchdog: Option<MemWatchdog>,
    axes: HashMap<String, Vec<NativeAxis>>,
    table: Vec<MemState>,
    ids: HashMap<MemState, u32>,
}

impl MemHost {
    pub fn new() -> Self {
        let mut axes = HashMap::new();
        let mut table = Vec::new();
        for (block, block_axes) in block_table() {
            table.extend(all_states(&block, &block_axes));
            axes.insert(block, block_axes);
        }
        let ids = table
            .iter()
            .enumerate()
            .map(|(id, state)| (state.clone(), id as u32))
            .collect();

        Self {
            data_version: DATA_VERSION,
            missing: None,
            unsupported: BTreeSet::new(),
            watchdog: Some(MemWatchdog::default()),
            axes,
            table,
            ids,
        }
    }

    pub fn reporting(data_version: i32) -> Self {
        Self {
            data_version,
            ..Self::new()
        }
    }

    pub fn without(mut self, effect: SideEffect) -> Self {
        self.unsupported.insert(effect);
        self
    }

    pub fn block_types(&self) -> Vec<String> {
        let mut types: Vec<String> = self.axes.keys().cloned().collect();
        types.sort();
        types
    }

    pub fn ticks(&self) -> usize {
        self.watchdog
            .as_ref()
            .map(|w| w.ticks.load(Ordering::SeqCst))
            .unwrap_or(0)
    }
}

impl NativeTags for MemHost {
    type Node = MemNode;

    fn inspect<'a>(&self, node: &'a MemNode) -> NativeView<'a, MemNode> {
        match node {
            MemNode::Leaf(tag) => match tag {
                Tag::End => NativeView::End,
                Tag::Byte(v) => NativeView::Byte(*v),
                Tag::Short(v) => NativeView::Short(*v),
                Tag::Int(v) => NativeView::Int(*v),
                Tag::Long(v) => NativeView::Long(*v),
                Tag::Float(v) => NativeView::Float(*v),
                Tag::Double(v) => NativeView::Double(*v),
                Tag::ByteArray(v) => NativeView::ByteArray(v),
                Tag::IntArray(v) => NativeView::IntArray(v),
                Tag::LongArray(v) => NativeView::LongArray(v),
                Tag::String(v) => NativeView::String(v),
                Tag::List(_) | Tag::Compound(_) => {
                    NativeView::Unrecognized("LeafContainer".to_owned())
                }
            },
            MemNode::List { .. } => NativeView::List,
            MemNode::Compound(entries) => {
                NativeView::Compound(entries.iter().map(|(k, v)| (k.as_str(), v)).collect())
            }
            MemNode::Alien(class) => NativeView::Unrecognized(class.clone()),
        }
    }

    fn list_elements<'a>(&self, list: &'a MemNode) -> std::result::Result<Vec<&'a MemNode>, String> {
        match list {
            MemNode::List { kinds, items } if kinds.len() == items.len() => Ok(items.iter().collect()),
            MemNode::List { kinds, items } => Err(format!(
                "{} element kinds recorded for {} elements",
                kinds.len(),
                items.len()
            )),
            _ => Err("not a list".to_owned()),
        }
    }

    fn build(&self, value: NativeValue<MemNode>) -> MemNode {
        match value {
            NativeValue::End => MemNode::Leaf(Tag::End),
            NativeValue::Byte(v) => MemNode::Leaf(Tag::Byte(v)),
            NativeValue::Short(v) => MemNode::Leaf(Tag::Short(v)),
            NativeValue::Int(v) => MemNode::Leaf(Tag::Int(v)),
            NativeValue::Long(v) => MemNode::Leaf(Tag::Long(v)),
            NativeValue::Float(v) => MemNode::Leaf(Tag::Float(v)),
            NativeValue::Double(v) => MemNode::Leaf(Tag::Double(v)),
            NativeValue::ByteArray(v) => MemNode::Leaf(Tag::ByteArray(v)),
            NativeValue::IntArray(v) => MemNode::Leaf(Tag::IntArray(v)),
            NativeValue::LongArray(v) => MemNode::Leaf(Tag::LongArray(v)),
            NativeValue::String(v) => MemNode::Leaf(Tag::String(v)),
            NativeValue::List(items) => MemNode::List {
                kinds: items.iter().map(MemNode::kind_id).collect(),
                items,
            },
            NativeValue::Compound(entries) => MemNode::Compound(entries),
        }
    }
}

impl NativeStates for MemHost {
    type State = MemState;

    fn default_state(&self, block_type: &str) -> Option<MemState> {
        self.table.iter().find(|s| s.block == block_type).cloned()
    }

    fn state_axes(&self, block_type: &str) -> Option<Vec<NativeAxis>> {
        self.axes.get(block_type).cloned()
    }

    fn block_type_of(&self, state: &MemState) -> String {
        state.block.clone()
    }

    fn with_property(&self, state: &MemState, axis: &str, value: &PropertyValue) -> Option<MemState> {
        let kind = &self
            .axes
            .get(&state.block)?
            .iter()
            .find(|a| a.name == axis)?
            .kind;
        axis_values(kind)
            .contains(value)
            .then(|| state.clone().with(axis, value.clone()))
    }

    fn property_values(&self, state: &MemState) -> Vec<(String, PropertyValue)> {
        state
            .props
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    fn state_id(&self, state: &MemState) -> u32 {
        self.ids.get(state).copied().unwrap_or(0)
    }

    fn state_by_id(&self, id: u32) -> Option<MemState> {
        self.table.get(id as usize).cloned()
    }

    fn is_air(&self, state: &MemState) -> bool {
        state.block == "minecraft:air"
    }
}

impl HostBinding for MemHost {
    fn expected_data_version(&self) -> i32 {
        DATA_VERSION
    }

    fn data_version(&self) -> i32 {
        self.data_version
    }

    fn resolve(&self) -> Result<()> {
        match &self.missing {
            Some(name) => Err(BridgeError::MissingBinding(name.clone())),
            None => Ok(()),
        }
    }

    fn supported_side_effects(&self) -> BTreeSet<SideEffect> {
        SideEffect::ALL
            .into_iter()
            .filter(|e| !self.unsupported.contains(e))
            .collect()
    }

    fn block_translation_key(&self, block_type: &str) -> Option<String> {
        self.axes
            .contains_key(block_type)
            .then(|| format!("block.{}", block_type.replace(':', ".")))
    }

    fn item_translation_key(&self, item_type: &str) -> Option<String> {
        if ITEMS.contains(&item_type) {
            Some(format!("item.{}", item_type.replace(':', ".")))
        } else {
            self.block_translation_key(item_type)
        }
    }

    fn watchdog(&self) -> Option<&dyn Watchdog> {
        self.watchdog.as_ref().map(|w| w as &dyn Watchdog)
    }
}

// ---------------------------------------------------------------------------
// live world

/// One observable host reaction to a write.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Lighting(BlockPosition),
    MarkChanged(BlockPosition),
    Notify(BlockPosition),
    Event(BlockPosition),
    Neighbor(BlockPosition),
    Shape(BlockPosition, MemState),
    EntityAi(BlockPosition),
}

#[derive(Debug, Clone)]
pub struct MemEntity {
    pub type_id: Option<String>,
    pub tag: MemNode,
    pub location: Option<Location>,
    pub added: bool,
}

#[derive(Default)]
pub struct MemWorld {
    blocks: HashMap<BlockPosition, MemState>,
    block_entities: HashMap<BlockPosition, MemNode>,
    pub entities: HashMap<Uuid, MemEntity>,
    pub calls: Vec<Call>,
    pub sent: Vec<(String, BlockPosition, MemNode)>,
    pub statuses: Vec<(String, u8)>,
    pub cancel_events: bool,
    spawned: usize,
}

pub const KNOWN_ENTITIES: [&str; 2] = ["minecraft:pig", "minecraft:armor_stand"];

impl MemWorld {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn writable(pos: BlockPosition) -> bool {
        (0..256).contains(&pos.y)
    }

    pub fn state_at(&self, pos: BlockPosition) -> MemState {
        self.blocks.get(&pos).cloned().unwrap_or_else(MemState::air)
    }

    pub fn block_entity(&self, pos: BlockPosition) -> Option<&MemNode> {
        self.block_entities.get(&pos)
    }

    /// Replaces a block-entity tag without going through the adapter.
    pub fn put_block_entity(&mut self, pos: BlockPosition, node: MemNode) {
        self.block_entities.insert(pos, node);
    }

    pub fn take_calls(&mut self) -> Vec<Call> {
        std::mem::take(&mut self.calls)
    }

    fn new_uuid(&mut self, type_id: &str) -> Uuid {
        self.spawned += 1;
        Uuid::new_v3(
            &Uuid::NAMESPACE_OID,
            format!("{}#{}", type_id, self.spawned).as_bytes(),
        )
    }

    /// Adds an entity as if it had been loaded with the world.
    pub fn spawn_existing(&mut self, type_id: Option<&str>, tag: MemNode) -> Uuid {
        let id = self.new_uuid(type_id.unwrap_or("player"));
        self.entities.insert(
            id,
            MemEntity {
                type_id: type_id.map(str::to_owned),
                tag,
                location: None,
                added: true,
            },
        );
        id
    }
}

fn empty_chest_entity() -> MemNode {
    MemNode::Compound(vec![(
        "Items".to_owned(),
        MemNode::List {
            kinds: vec![],
            items: vec![],
        },
    )])
}

impl NativeWorld for MemWorld {
    type Node = MemNode;
    type State = MemState;

    fn block_state(&self, pos: BlockPosition) -> MemState {
        self.state_at(pos)
    }

    fn set_block_state(&mut self, pos: BlockPosition, state: MemState) -> Option<MemState> {
        if !Self::writable(pos) {
            return None;
        }
        let holds_entity = state.block == "minecraft:chest";
        let old = self.blocks.insert(pos, state).unwrap_or_else(MemState::air);
        if holds_entity {
            self.block_entities.entry(pos).or_insert_with(empty_chest_entity);
        } else {
            self.block_entities.remove(&pos);
        }
        Some(old)
    }

    fn has_block_entity(&self, pos: BlockPosition) -> bool {
        self.block_entities.contains_key(&pos)
    }

    fn block_entity_id(&self, pos: BlockPosition) -> Option<String> {
        self.has_block_entity(pos).then(|| "minecraft:chest".to_owned())
    }

    fn save_block_entity(&self, pos: BlockPosition) -> Option<MemNode> {
        self.block_entities.get(&pos).cloned()
    }

    fn load_block_entity(&mut self, pos: BlockPosition, tag: MemNode) -> bool {
        match self.block_entities.get_mut(&pos) {
            Some(slot) => {
                *slot = tag;
                true
            }
            None => false,
        }
    }

    /// Repeaters without a signal source cannot stay powered.
    fn valid_state_for_position(&self, state: &MemState, _pos: BlockPosition) -> MemState {
        if state.block == "minecraft:repeater" {
            state.clone().with("powered", PropertyValue::Bool(false))
        } else {
            state.clone()
        }
    }

    fn update_lighting(&mut self, pos: BlockPosition) {
        self.calls.push(Call::Lighting(pos));
    }

    fn mark_block_changed(&mut self, pos: BlockPosition) {
        self.calls.push(Call::MarkChanged(pos));
    }

    fn notify_block_update(&mut self, pos: BlockPosition, _old: &MemState, _new: &MemState) {
        self.calls.push(Call::Notify(pos));
    }

    fn neighbor_changed(&mut self, neighbor: BlockPosition, _source: BlockPosition, _old: &MemState) {
        self.calls.push(Call::Neighbor(neighbor));
    }

    fn update_shape(&mut self, pos: BlockPosition, state: &MemState) {
        self.calls.push(Call::Shape(pos, state.clone()));
    }

    fn fire_physics_event(&mut self, pos: BlockPosition, _new: &MemState) -> EventOutcome {
        self.calls.push(Call::Event(pos));
        if self.cancel_events {
            EventOutcome::Cancelled
        } else {
            EventOutcome::Allowed
        }
    }

    fn on_block_state_change(&mut self, pos: BlockPosition, _old: &MemState, _new: &MemState) {
        self.calls.push(Call::EntityAi(pos));
    }

    fn can_place(&self, _state: &MemState, pos: BlockPosition) -> bool {
        Self::writable(pos) && self.state_at(pos) == MemState::air()
    }

    fn clear_container(&mut self, pos: BlockPosition) -> bool {
        match self.block_entities.get_mut(&pos) {
            Some(node) => {
                *node = empty_chest_entity();
                true
            }
            None => false,
        }
    }

    fn send_block_entity_data(&mut self, player: &str, pos: BlockPosition, tag: MemNode) {
        self.sent.push((player.to_owned(), pos, tag));
    }

    fn send_entity_status(&mut self, player: &str, status: u8) {
        self.statuses.push((player.to_owned(), status));
    }
}

impl NativeEntities for MemWorld {
    type Node = MemNode;
    type Entity = Uuid;

    fn entity_type(&self, entity: &Uuid) -> Option<String> {
        self.entities.get(entity).and_then(|e| e.type_id.clone())
    }

    fn save_entity(&self, entity: &Uuid) -> MemNode {
        self.entities
            .get(entity)
            .map(|e| e.tag.clone())
            .unwrap_or_else(|| MemNode::Compound(vec![]))
    }

    fn create_entity(&mut self, type_id: &str) -> Option<Uuid> {
        if !KNOWN_ENTITIES.contains(&type_id) {
            return None;
        }
        let id = self.new_uuid(type_id);
        let tag = MemNode::Compound(vec![(
            "UUID".to_owned(),
            MemNode::Leaf(Tag::IntArray(vec![1, 2, 3, 4])),
        )]);
        self.entities.insert(
            id,
            MemEntity {
                type_id: Some(type_id.to_owned()),
                tag,
                location: None,
                added: false,
            },
        );
        Some(id)
    }

    fn load_entity(&mut self, entity: &Uuid, tag: MemNode) {
        if let Some(e) = self.entities.get_mut(entity) {
            e.tag = tag;
        }
    }

    fn place_entity(&mut self, entity: &Uuid, location: &Location) {
        if let Some(e) = self.entities.get_mut(entity) {
            e.location = Some(location.clone());
        }
    }

    /// Entities below the world are refused.
    fn add_entity(&mut self, entity: &Uuid) -> bool {
        match self.entities.get_mut(entity) {
            Some(e) if e.location.as_ref().map_or(false, |l| l.y >= 0.0) => {
                e.added = true;
                true
            }
            _ => false,
        }
    }
}

// ---------------------------------------------------------------------------
// regeneration

/// Terrain of the generator: stone, a grass layer whose height depends on the
/// seed, and a chest every seventh diagonal.
pub fn surface_y(seed: i64) -> i32 {
    3 + seed.rem_euclid(2) as i32
}

pub fn biome_for(seed: i64) -> &'static str {
    if seed.rem_euclid(2) == 0 {
        "minecraft:plains"
    } else {
        "minecraft:desert"
    }
}

pub fn generated_state(pos: BlockPosition, seed: i64) -> MemState {
    let surface = surface_y(seed);
    if pos.y < surface {
        MemState::new("minecraft:stone")
    } else if pos.y == surface {
        MemState::grass()
    } else if pos.y == surface + 1 && (pos.x + pos.z).rem_euclid(7) == 0 {
        MemState::chest(Direction::North)
    } else {
        MemState::air()
    }
}

#[derive(Debug)]
pub struct MemChunk {
    pub pos: ChunkPosition,
    seed: i64,
}

fn chest_loot(pos: BlockPosition) -> MemNode {
    MemNode::Compound(vec![
        ("id".to_owned(), MemNode::Leaf(Tag::String("minecraft:chest".to_owned()))),
        (
            "LootTableSeed".to_owned(),
            MemNode::Leaf(Tag::Long((pos.x as i64) << 32 | pos.z as u32 as i64)),
        ),
    ])
}

type HostTask = Box<dyn FnOnce() + Send>;

pub struct MemEphemeral {
    handle: Handle,
    seed: i64,
    failing: HashSet<ChunkPosition>,
    queue: VecDeque<HostTask>,
    closed: Arc<AtomicBool>,
    requested: Arc<Mutex<Vec<ChunkPosition>>>,
}

impl EphemeralWorld for MemEphemeral {
    type Node = MemNode;
    type State = MemState;
    type Chunk = MemChunk;

    /// Generation only starts once the host scheduler runs the queued task.
    fn request_chunk(&mut self, pos: ChunkPosition, stage: GenerationStage) -> ChunkFuture<MemChunk> {
        assert!(stage >= GenerationStage::Features);
        if let Ok(mut requested) = self.requested.lock() {
            requested.push(pos);
        }

        let (tx, rx) = oneshot::channel();
        let handle = self.handle.clone();
        let seed = self.seed;
        let fail = self.failing.contains(&pos);
        self.queue.push_back(Box::new(move || {
            handle.spawn(async move {
                tokio::task::yield_now().await;
                let chunk = (!fail).then_some(MemChunk { pos, seed });
                let _ = tx.send(chunk);
            });
        }));
        async move { rx.await.ok().flatten() }.boxed()
    }

    fn run_pending_tasks(&mut self, budget: u32) -> usize {
        let mut ran = 0;
        while ran < budget as usize {
            match self.queue.pop_front() {
                Some(task) => {
                    task();
                    ran += 1;
                }
                None => break,
            }
        }
        ran
    }

    fn chunk_position(&self, chunk: &MemChunk) -> ChunkPosition {
        chunk.pos
    }

    fn chunk_block_state(&self, chunk: &MemChunk, pos: BlockPosition) -> MemState {
        assert_eq!(pos.chunk(), chunk.pos);
        generated_state(pos, chunk.seed)
    }

    fn chunk_block_entity(&self, chunk: &MemChunk, pos: BlockPosition) -> Option<MemNode> {
        (generated_state(pos, chunk.seed).block == "minecraft:chest").then(|| chest_loot(pos))
    }

    fn chunk_biome(&self, chunk: &MemChunk, _pos: BlockPosition) -> Option<String> {
        Some(biome_for(chunk.seed).to_owned())
    }

    fn close(&mut self) -> io::Result<()> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// Live world side of regeneration: hands out ephemeral worlds and records
/// what happened to them.
pub struct MemSource {
    pub seed: i64,
    handle: Handle,
    pub failing: HashSet<ChunkPosition>,
    pub closed: Arc<AtomicBool>,
    pub requested: Arc<Mutex<Vec<ChunkPosition>>>,
    pub storage: Mutex<Option<PathBuf>>,
    pub settings_seen: Mutex<Option<WorldSettings>>,
}

impl MemSource {
    pub fn new(handle: Handle, seed: i64) -> Self {
        Self {
            seed,
            handle,
            failing: HashSet::new(),
            closed: Arc::new(AtomicBool::new(false)),
            requested: Arc::new(Mutex::new(Vec::new())),
            storage: Mutex::new(None),
            settings_seen: Mutex::new(None),
        }
    }

    pub fn failing_at(mut self, pos: ChunkPosition) -> Self {
        self.failing.insert(pos);
        self
    }

    pub fn storage_path(&self) -> Option<PathBuf> {
        self.storage.lock().ok().and_then(|s| s.clone())
    }

    pub fn was_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn requested_chunks(&self) -> Vec<ChunkPosition> {
        self.requested.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

impl RegenSource for MemSource {
    type Ephemeral = MemEphemeral;

    fn world_settings(&self) -> WorldSettings {
        WorldSettings {
            name: "world".to_owned(),
            seed: self.seed,
            environment: "normal".to_owned(),
            generator: Tag::compound([
                ("type", Tag::String("minecraft:noise".to_owned())),
                ("seed", Tag::Long(self.seed)),
                (
                    "biome_source",
                    Tag::compound([
                        ("type", Tag::String("minecraft:multi_noise".to_owned())),
                        ("seed", Tag::Long(self.seed)),
                    ]),
                ),
            ]),
            game_rules: vec![("doDaylightCycle".to_owned(), "false".to_owned())],
        }
    }

    fn create_ephemeral(&self, settings: &WorldSettings, storage: &Path) -> Result<MemEphemeral> {
        fs::write(storage.join("level.dat"), settings.name.as_bytes())?;
        if let Ok(mut slot) = self.storage.lock() {
            *slot = Some(storage.to_path_buf());
        }
        if let Ok(mut slot) = self.settings_seen.lock() {
            *slot = Some(settings.clone());
        }

        Ok(MemEphemeral {
            handle: self.handle.clone(),
            seed: settings.seed,
            failing: self.failing.clone(),
            queue: VecDeque::new(),
            closed: self.closed.clone(),
            requested: self.requested.clone(),
        })
    }
}

#[derive(Default)]
pub struct MemExtent {
    pub blocks: BTreeMap<BlockPosition, BlockStateHolder>,
    pub biomes: HashMap<BlockPosition, String>,
}

impl Extent for MemExtent {
    fn set_block(&mut self, pos: BlockPosition, block: BlockStateHolder) -> bool {
        self.blocks.insert(pos, block);
        true
    }

    fn set_biome(&mut self, pos: BlockPosition, biome: &str) -> bool {
        self.biomes.insert(pos, biome.to_owned());
        true
    }
}

pub fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .unwrap()
}

use crate::binding::{EphemeralWorld, HostBinding, NativeEntities, NativeWorld, RegenSource};
use crate::block::BlockStateHolder;
use crate::codec::TagCodec;
use crate::config::AdapterConfig;
use crate::entity;
use crate::mutator::{BlockMutator, WriteReport};
use crate::property::{PropertyMap, PropertyRegistry};
use crate::regen::{Extent, RegenOptions, Regenerator};
use crate::side_effect::{SideEffect, SideEffectSet};
use std::collections::BTreeSet;
use std::sync::Arc;
use worldbridge_common::{BlockPosition, BridgeError, CuboidRegion, Location, Result};
use worldbridge_logger::{log, LogSeverity::Info};
use worldbridge_nbt::Tag;

/// Entity status that tells a client it holds operator level 4.
pub const OP_LEVEL_STATUS: u8 = 28;

/// The adapter for one host release: every operation the editing tool uses,
/// built on a resolved binding.
pub struct WorldAdapter<B: HostBinding> {
    binding: B,
    registry: PropertyRegistry,
    config: AdapterConfig,
}

impl<B: HostBinding> WorldAdapter<B> {
    /// Checks the host's data version and resolves the binding. Any failure
    /// here means this adapter cannot be used with the running host.
    pub fn new(binding: B, config: AdapterConfig) -> Result<Self> {
        let expected = config
            .expected_data_version
            .unwrap_or_else(|| binding.expected_data_version());
        let found = binding.data_version();
        if found != expected {
            return Err(BridgeError::VersionMismatch { expected, found });
        }
        binding.resolve()?;

        log(format!("World adapter ready for data version {}", found), Info);
        Ok(Self {
            binding,
            registry: PropertyRegistry::new(),
            config,
        })
    }

    pub fn binding(&self) -> &B {
        &self.binding
    }

    pub fn config(&self) -> &AdapterConfig {
        &self.config
    }

    pub fn codec(&self) -> TagCodec<'_, B> {
        TagCodec::new(&self.binding, self.config.list_policy)
    }

    fn mutator(&self) -> BlockMutator<'_, B> {
        BlockMutator::new(&self.binding, &self.registry, &self.config)
    }

    pub fn get_properties(&self, block_type: &str) -> Result<Arc<PropertyMap>> {
        self.registry.properties_of(&self.binding, block_type)
    }

    /// Callers must not request effects outside this set.
    pub fn supported_side_effects(&self) -> BTreeSet<SideEffect> {
        self.binding.supported_side_effects()
    }

    pub fn read_block<W>(&self, world: &W, pos: BlockPosition) -> Result<BlockStateHolder>
    where
        W: NativeWorld<Node = B::Node, State = B::State>,
    {
        self.mutator().read_block(world, pos)
    }

    /// Returns whether the position's state changed. A rejected placement is
    /// `Ok(false)`.
    pub fn write_block<W>(
        &self,
        world: &mut W,
        pos: BlockPosition,
        block: &BlockStateHolder,
        effects: &SideEffectSet,
    ) -> Result<bool>
    where
        W: NativeWorld<Node = B::Node, State = B::State>,
    {
        Ok(self.write_block_report(world, pos, block, effects)?.changed())
    }

    pub fn write_block_report<W>(
        &self,
        world: &mut W,
        pos: BlockPosition,
        block: &BlockStateHolder,
        effects: &SideEffectSet,
    ) -> Result<WriteReport>
    where
        W: NativeWorld<Node = B::Node, State = B::State>,
    {
        self.mutator().write_block(world, pos, block, effects)
    }

    pub fn internal_block_state_id(&self, block: &BlockStateHolder) -> Result<Option<u32>> {
        self.mutator().internal_id(block)
    }

    pub fn can_place_at<W>(&self, world: &W, pos: BlockPosition, block: &BlockStateHolder) -> Result<bool>
    where
        W: NativeWorld<Node = B::Node, State = B::State>,
    {
        let state = self.mutator().resolve(block)?;
        Ok(world.can_place(&state, pos))
    }

    pub fn clear_container<W>(&self, world: &mut W, pos: BlockPosition) -> bool
    where
        W: NativeWorld<Node = B::Node, State = B::State>,
    {
        world.clear_container(pos)
    }

    /// Shows `tag` as the block-entity data at `pos` to one player only.
    pub fn send_fake_block_entity<W>(
        &self,
        world: &mut W,
        player: &str,
        pos: BlockPosition,
        tag: &Tag,
    ) -> Result<()>
    where
        W: NativeWorld<Node = B::Node, State = B::State>,
    {
        let codec = self.codec();
        codec.check_writable(tag)?;
        world.send_block_entity_data(player, pos, codec.from_stable(tag));
        Ok(())
    }

    /// Makes the player's client believe it has operator rights, unlocking
    /// client-side features gated on them. Grants nothing on the server.
    pub fn send_fake_op<W>(&self, world: &mut W, player: &str)
    where
        W: NativeWorld<Node = B::Node, State = B::State>,
    {
        world.send_entity_status(player, OP_LEVEL_STATUS);
    }

    pub fn rich_block_name(&self, block_type: &str) -> Result<String> {
        self.binding
            .block_translation_key(block_type)
            .ok_or_else(|| BridgeError::UnknownBlockType(block_type.to_owned()))
    }

    pub fn rich_item_name(&self, item_type: &str) -> Option<String> {
        self.binding.item_translation_key(item_type)
    }

    pub fn read_entity<E>(&self, entities: &E, entity: &E::Entity) -> Result<Option<(String, Tag)>>
    where
        E: NativeEntities<Node = B::Node>,
    {
        entity::read_entity(&self.codec(), entities, entity)
    }

    pub fn create_entity<E>(
        &self,
        entities: &mut E,
        location: &Location,
        type_id: &str,
        tag: Option<&Tag>,
    ) -> Result<Option<E::Entity>>
    where
        E: NativeEntities<Node = B::Node>,
    {
        entity::create_entity(&self.codec(), entities, location, type_id, tag)
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
        Regenerator::new(&self.binding, &self.registry, &self.config)
            .regenerate(source, region, extent, options)
    }

    pub fn supports_watchdog(&self) -> bool {
        self.binding.watchdog().is_some()
    }

    pub fn tick_watchdog(&self) {
        if let Some(watchdog) = self.binding.watchdog() {
            watchdog.tick();
        }
    }
}

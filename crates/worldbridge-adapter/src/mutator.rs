use crate::binding::{EventOutcome, HostBinding, NativeWorld};
use crate::block::BlockStateHolder;
use crate::codec::TagCodec;
use crate::config::AdapterConfig;
use crate::property::PropertyRegistry;
use crate::side_effect::{SideEffect, SideEffectSet};
use std::collections::BTreeSet;
use worldbridge_common::{BlockPosition, BridgeError, Direction, Result};
use worldbridge_logger::{log, LogSeverity::Debug};
use worldbridge_nbt::Tag;

/// What the install step did to the target position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallOutcome {
    Changed,
    /// The position already held the requested state.
    Unchanged,
    /// The host refused the placement; nothing else ran.
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteReport {
    pub outcome: InstallOutcome,
    pub metadata_attached: bool,
    /// Effects that ran, in order.
    pub applied: Vec<SideEffect>,
    /// The physics event was cancelled and the remaining effects skipped.
    pub cancelled: bool,
}

impl WriteReport {
    fn new(outcome: InstallOutcome) -> Self {
        Self {
            outcome,
            metadata_attached: false,
            applied: Vec::new(),
            cancelled: false,
        }
    }

    pub fn changed(&self) -> bool {
        self.outcome == InstallOutcome::Changed
    }
}

/// Reads and writes single blocks of a live world.
pub struct BlockMutator<'a, B: HostBinding> {
    binding: &'a B,
    registry: &'a PropertyRegistry,
    config: &'a AdapterConfig,
}

impl<'a, B: HostBinding> BlockMutator<'a, B> {
    pub fn new(binding: &'a B, registry: &'a PropertyRegistry, config: &'a AdapterConfig) -> Self {
        Self {
            binding,
            registry,
            config,
        }
    }

    fn codec(&self) -> TagCodec<'a, B> {
        TagCodec::new(self.binding, self.config.list_policy)
    }

    /// Host state for `block`. A cached state id is trusted when it still
    /// names the same block type.
    pub fn resolve(&self, block: &BlockStateHolder) -> Result<B::State> {
        if let Some(state) = block
            .internal_id()
            .and_then(|id| self.binding.state_by_id(id))
            .filter(|state| self.binding.block_type_of(state) == block.block_type())
        {
            return Ok(state);
        }

        let default = self
            .binding
            .default_state(block.block_type())
            .ok_or_else(|| BridgeError::UnknownBlockType(block.block_type().to_owned()))?;
        self.registry
            .apply(self.binding, block.block_type(), default, block.properties())
    }

    pub fn holder_from_state(&self, state: &B::State) -> BlockStateHolder {
        BlockStateHolder::from_host(
            self.binding.block_type_of(state),
            self.registry.read_back(self.binding, state),
            self.binding.state_id(state),
        )
    }

    pub fn read_block<W>(&self, world: &W, pos: BlockPosition) -> Result<BlockStateHolder>
    where
        W: NativeWorld<Node = B::Node, State = B::State>,
    {
        let state = world.block_state(pos);
        let holder = self.holder_from_state(&state);
        match world.save_block_entity(pos) {
            Some(native) => Ok(holder.with_nbt(self.codec().to_stable(&native)?)),
            None => Ok(holder),
        }
    }

    /// Combined host id, `None` when the host maps a non-air block to air.
    pub fn internal_id(&self, block: &BlockStateHolder) -> Result<Option<u32>> {
        let state = self.resolve(block)?;
        let id = self.binding.state_id(&state);
        Ok((id != 0 || self.binding.is_air(&state)).then_some(id))
    }

    pub fn write_block<W>(
        &self,
        world: &mut W,
        pos: BlockPosition,
        block: &BlockStateHolder,
        effects: &SideEffectSet,
    ) -> Result<WriteReport>
    where
        W: NativeWorld<Node = B::Node, State = B::State>,
    {
        let supported = self.binding.supported_side_effects();
        if let Some(effect) = effects.first_unsupported(&supported) {
            return Err(BridgeError::UnsupportedSideEffect(effect.to_string()));
        }

        if let Some(nbt) = block.nbt() {
            self.codec().check_writable(nbt)?;
        }

        let new_state = self.resolve(block)?;
        let Some(old_state) = world.set_block_state(pos, new_state.clone()) else {
            log(format!("Host refused placement at {}", pos), Debug);
            return Ok(WriteReport::new(InstallOutcome::Rejected));
        };

        let changed = old_state != new_state;
        let mut report = WriteReport::new(if changed {
            InstallOutcome::Changed
        } else {
            InstallOutcome::Unchanged
        });

        if let Some(nbt) = block.nbt() {
            if world.has_block_entity(pos) {
                report.metadata_attached = self.attach_metadata(world, pos, nbt);
            }
        }

        self.apply_side_effects(
            world, pos, &old_state, new_state, effects, &supported, changed, &mut report,
        );
        Ok(report)
    }

    fn attach_metadata<W>(&self, world: &mut W, pos: BlockPosition, nbt: &Tag) -> bool
    where
        W: NativeWorld<Node = B::Node, State = B::State>,
    {
        let mut tag = nbt.clone();
        let Some(map) = tag.as_compound_mut() else {
            return false;
        };
        map.insert("x".to_owned(), Tag::Int(pos.x));
        map.insert("y".to_owned(), Tag::Int(pos.y));
        map.insert("z".to_owned(), Tag::Int(pos.z));
        if self.config.stamp_block_entity_id {
            if let Some(id) = world.block_entity_id(pos) {
                map.insert("id".to_owned(), Tag::String(id));
            }
        }
        let native = self.codec().from_stable(&tag);
        world.load_block_entity(pos, native)
    }

    #[allow(clippy::too_many_arguments)]
    fn apply_side_effects<W>(
        &self,
        world: &mut W,
        pos: BlockPosition,
        old: &B::State,
        mut new: B::State,
        effects: &SideEffectSet,
        supported: &BTreeSet<SideEffect>,
        changed: bool,
        report: &mut WriteReport,
    ) where
        W: NativeWorld<Node = B::Node, State = B::State>,
    {
        // an unchanged position only gets what was asked for by name
        let enabled = |effect: SideEffect| {
            supported.contains(&effect)
                && if changed {
                    effects.should_apply(effect)
                } else {
                    effects.is_explicitly_on(effect)
                }
        };

        for effect in SideEffect::ALL {
            if !enabled(effect) {
                continue;
            }
            match effect {
                SideEffect::Validation => {
                    let valid = world.valid_state_for_position(&new, pos);
                    if valid != new && world.set_block_state(pos, valid.clone()).is_some() {
                        new = valid;
                    }
                }
                SideEffect::Lighting => world.update_lighting(pos),
                SideEffect::Network => {
                    world.mark_block_changed(pos);
                    world.notify_block_update(pos, old, &new);
                }
                SideEffect::Events => {
                    if world.fire_physics_event(pos, &new) == EventOutcome::Cancelled {
                        report.applied.push(effect);
                        report.cancelled = true;
                        return;
                    }
                }
                SideEffect::Neighbors => {
                    for direction in Direction::NEIGHBOUR_ORDER {
                        world.neighbor_changed(pos.offset(direction), pos, old);
                    }
                }
                SideEffect::Update => {
                    world.update_shape(pos, old);
                    world.update_shape(pos, &new);
                }
                SideEffect::EntityAi => world.on_block_state_change(pos, old, &new),
            }
            report.applied.push(effect);
        }
    }
}

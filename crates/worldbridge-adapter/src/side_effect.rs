use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Consequences of a block write beyond the write itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SideEffect {
    /// Replace the state with what the host considers valid at the position.
    Validation,
    Lighting,
    /// Client update packets.
    Network,
    /// Plugin-visible, cancellable physics event.
    Events,
    /// Neighbour physics notification.
    Neighbors,
    /// Shape and connection updates.
    Update,
    /// AI, points of interest and other simulation wake-ups.
    EntityAi,
}

impl SideEffect {
    /// Order in which a write applies its effects.
    pub const ALL: [SideEffect; 7] = [
        SideEffect::Validation,
        SideEffect::Lighting,
        SideEffect::Network,
        SideEffect::Events,
        SideEffect::Neighbors,
        SideEffect::Update,
        SideEffect::EntityAi,
    ];

    pub fn host_default(&self) -> bool {
        match self {
            SideEffect::Lighting
            | SideEffect::Neighbors
            | SideEffect::Update
            | SideEffect::Network => true,
            SideEffect::Validation | SideEffect::EntityAi | SideEffect::Events => false,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            SideEffect::Validation => "validation",
            SideEffect::Lighting => "lighting",
            SideEffect::Network => "network",
            SideEffect::Events => "events",
            SideEffect::Neighbors => "neighbors",
            SideEffect::Update => "update",
            SideEffect::EntityAi => "entity_ai",
        }
    }
}

impl fmt::Display for SideEffect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SideEffectState {
    On,
    Off,
    #[default]
    Default,
}

/// Per-write policy for every side effect. Unlisted effects use `Default`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SideEffectSet {
    states: BTreeMap<SideEffect, SideEffectState>,
}

impl SideEffectSet {
    /// Every effect at its host default.
    pub fn defaults() -> Self {
        Self::default()
    }

    /// Every effect off.
    pub fn none() -> Self {
        Self {
            states: SideEffect::ALL
                .into_iter()
                .map(|e| (e, SideEffectState::Off))
                .collect(),
        }
    }

    pub fn with(mut self, effect: SideEffect, state: SideEffectState) -> Self {
        self.states.insert(effect, state);
        self
    }

    pub fn state(&self, effect: SideEffect) -> SideEffectState {
        self.states.get(&effect).copied().unwrap_or_default()
    }

    /// Resolves `Default` through the host default table.
    pub fn should_apply(&self, effect: SideEffect) -> bool {
        match self.state(effect) {
            SideEffectState::On => true,
            SideEffectState::Off => false,
            SideEffectState::Default => effect.host_default(),
        }
    }

    pub fn is_explicitly_on(&self, effect: SideEffect) -> bool {
        self.state(effect) == SideEffectState::On
    }

    /// Effects the caller asked for explicitly.
    pub fn explicit(&self) -> impl Iterator<Item = SideEffect> + '_ {
        self.states
            .iter()
            .filter(|(_, s)| **s == SideEffectState::On)
            .map(|(e, _)| *e)
    }

    /// First explicitly requested effect missing from `supported`.
    pub fn first_unsupported(&self, supported: &BTreeSet<SideEffect>) -> Option<SideEffect> {
        self.explicit().find(|e| !supported.contains(e))
    }
}

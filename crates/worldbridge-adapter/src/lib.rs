pub mod adapter;
pub mod binding;
pub mod block;
pub mod codec;
pub mod config;
pub mod entity;
pub mod mutator;
pub mod property;
pub mod regen;
pub mod side_effect;

pub use adapter::{WorldAdapter, OP_LEVEL_STATUS};
pub use block::BlockStateHolder;
pub use codec::{ListPolicy, TagCodec};
pub use config::AdapterConfig;
pub use mutator::{InstallOutcome, WriteReport};
pub use property::{Property, PropertyMap, PropertyValue};
pub use regen::{Extent, RegenOptions};
pub use side_effect::{SideEffect, SideEffectSet, SideEffectState};

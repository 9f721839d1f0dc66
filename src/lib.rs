pub use worldbridge_adapter as adapter;
pub use worldbridge_common as common;
pub use worldbridge_logger as logger;
pub use worldbridge_nbt as nbt;

// Re-export commonly used items
pub use worldbridge_adapter::{
    AdapterConfig, BlockStateHolder, Extent, RegenOptions, SideEffect, SideEffectSet,
    WorldAdapter,
};
pub use worldbridge_common::{BlockPosition, BridgeError, CuboidRegion, Result};
pub use worldbridge_logger::{log, LogSeverity};
pub use worldbridge_nbt::{NBTFile, Tag};

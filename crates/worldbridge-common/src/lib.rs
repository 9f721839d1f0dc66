pub mod chunk;
pub mod error;
pub mod types;

pub use chunk::{ChunkPosition, CuboidRegion};
pub use error::BridgeError;
pub use types::{BlockPosition, Direction, Location, Result};

pub mod config;
pub mod constants;
pub mod error;
pub mod math;
pub mod types;

pub use config::ViewerConfig;
pub use error::TesseraError;
pub use types::{ChunkCoord, ChunkId};

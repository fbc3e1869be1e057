use std::io;
use std::path::PathBuf;

use tessera_assets::AssetError;
use tessera_core::types::ChunkCoord;

/// Errors that can occur while baking chunk assets.
#[derive(Debug, thiserror::Error)]
pub enum BakeError {
    #[error("failed to create output directory {path}: {source}")]
    CreateDir { path: PathBuf, source: io::Error },

    #[error("failed to write {path}: {source}")]
    Write { path: PathBuf, source: io::Error },

    #[error("failed to encode chunk {coord}: {source}")]
    Encode { coord: ChunkCoord, source: AssetError },

    #[error("invalid bake parameters: {0}")]
    InvalidParams(String),
}

use std::io;
use std::path::PathBuf;

/// Errors that stop the static server from starting or running.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("directory not found: {0}")]
    MissingDirectory(PathBuf),

    #[error("entry page not found: {0}")]
    MissingIndex(PathBuf),

    #[error("failed to read chunk directory {path}: {source}")]
    ChunkScan { path: PathBuf, source: io::Error },

    #[error("failed to bind {addr}: {source}")]
    Bind { addr: String, source: io::Error },

    #[error("server error: {0}")]
    Serve(#[from] io::Error),
}

use thiserror::Error;

/// Errors that can occur during viewer initialization and runtime.
#[derive(Debug, Error)]
pub enum TesseraError {
    #[error("WebGPU adapter not found: {0}")]
    AdapterNotFound(String),

    #[error("Failed to request GPU device: {0}")]
    DeviceRequestFailed(String),

    #[error("Surface configuration failed: {0}")]
    SurfaceConfigFailed(String),

    #[error("Browser API call failed: {0}")]
    Browser(String),

    #[error("Required page element missing: {0}")]
    MissingElement(String),

    #[error("Failed to parse viewer config RON: {0}")]
    ConfigParse(String),

    #[error("Invalid viewer config: {0}")]
    InvalidConfig(String),
}

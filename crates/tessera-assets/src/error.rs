/// Errors that can occur while reading or writing chunk assets.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("failed to parse glTF: {0}")]
    Parse(String),

    #[error("glTF file has no scene")]
    NoScene,

    #[error("glTF scene contains no triangle meshes")]
    Empty,

    #[error("mesh {mesh:?} has no POSITION attribute")]
    MissingPositions { mesh: String },

    #[error("mesh {mesh:?} references external buffer {uri:?}; chunk assets must be self-contained")]
    ExternalBuffer { mesh: String, uri: String },

    #[error("mesh {mesh:?} declares {attribute} but its data cannot be read")]
    UnreadableAccessor {
        mesh: String,
        attribute: &'static str,
    },

    #[error("mesh {mesh:?} index {index} out of range ({vertex_count} vertices)")]
    IndexOutOfRange {
        mesh: String,
        index: u32,
        vertex_count: usize,
    },

    #[error("mesh {mesh:?} attribute {attribute} has {actual} entries, expected {expected}")]
    AttributeLength {
        mesh: String,
        attribute: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("failed to serialize glTF: {0}")]
    Encode(String),
}

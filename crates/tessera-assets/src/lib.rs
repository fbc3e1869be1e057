pub mod decode;
pub mod encode;
pub mod error;
pub mod paths;
pub mod scene;

pub use decode::decode_chunk;
pub use encode::encode_chunk;
pub use error::AssetError;
pub use paths::{chunk_asset_path, chunk_asset_url, chunk_file_name, parse_chunk_file_name};
pub use scene::{Bounds, ChunkMesh, ChunkScene, MeshVertex};

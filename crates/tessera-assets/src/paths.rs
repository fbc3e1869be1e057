use tessera_core::constants::{CHUNK_ASSET_DIR, CHUNK_ASSET_EXT};
use tessera_core::types::ChunkCoord;

/// `{x}_{z}.glb`
pub fn chunk_file_name(coord: ChunkCoord) -> String {
    format!("{}.{}", coord.id(), CHUNK_ASSET_EXT)
}

/// `chunks/{x}_{z}.glb`, relative to the site root.
pub fn chunk_asset_path(coord: ChunkCoord) -> String {
    format!("{}/{}", CHUNK_ASSET_DIR, chunk_file_name(coord))
}

/// Asset URL under `base`. An empty base yields the page-relative path.
pub fn chunk_asset_url(base: &str, coord: ChunkCoord) -> String {
    let base = base.trim_end_matches('/');
    if base.is_empty() {
        chunk_asset_path(coord)
    } else {
        format!("{}/{}", base, chunk_asset_path(coord))
    }
}

/// Inverse of `chunk_file_name`; `None` for anything that is not a chunk asset.
pub fn parse_chunk_file_name(name: &str) -> Option<ChunkCoord> {
    let stem = name
        .strip_suffix(CHUNK_ASSET_EXT)?
        .strip_suffix('.')?;
    stem.parse().ok()
}

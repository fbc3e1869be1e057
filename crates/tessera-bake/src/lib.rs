pub mod error;
pub mod generate;

use std::fs;
use std::path::{Path, PathBuf};

use tessera_assets::{chunk_file_name, encode_chunk};
use tessera_core::types::ChunkCoord;

pub use error::BakeError;
pub use generate::{generate_chunk, BakeParams};

const GENERATOR: &str = concat!("tessera-bake ", env!("CARGO_PKG_VERSION"));

/// Totals for one bake run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BakeSummary {
    pub chunks: usize,
    pub triangles: usize,
    pub bytes: usize,
    pub files: Vec<PathBuf>,
}

/// Generate and encode one chunk as GLB bytes.
pub fn bake_chunk(coord: ChunkCoord, params: &BakeParams) -> Result<(Vec<u8>, usize), BakeError> {
    params.validate()?;
    let scene = generate_chunk(coord, params);
    let bytes =
        encode_chunk(&scene, GENERATOR).map_err(|source| BakeError::Encode { coord, source })?;
    Ok((bytes, scene.triangle_count()))
}

/// Write `{x}_{z}.glb` for every coordinate in the square of `radius` around
/// the origin into `out_dir`, creating it if needed.
pub fn bake_grid(out_dir: &Path, radius: u32, params: &BakeParams) -> Result<BakeSummary, BakeError> {
    params.validate()?;
    fs::create_dir_all(out_dir).map_err(|source| BakeError::CreateDir {
        path: out_dir.to_path_buf(),
        source,
    })?;

    let coords: Vec<ChunkCoord> = ChunkCoord::ORIGIN.neighborhood(radius).collect();
    let total = coords.len();
    let mut summary = BakeSummary::default();

    for (n, coord) in coords.into_iter().enumerate() {
        let (bytes, triangles) = bake_chunk(coord, params)?;
        let path = out_dir.join(chunk_file_name(coord));
        fs::write(&path, &bytes).map_err(|source| BakeError::Write {
            path: path.clone(),
            source,
        })?;
        log::info!(
            "[{}/{}] {} ({} triangles, {} bytes)",
            n + 1,
            total,
            path.display(),
            triangles,
            bytes.len()
        );

        summary.chunks += 1;
        summary.triangles += triangles;
        summary.bytes += bytes.len();
        summary.files.push(path);
    }

    Ok(summary)
}

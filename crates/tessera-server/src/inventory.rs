use std::fs;
use std::path::Path;

use tessera_assets::parse_chunk_file_name;
use tessera_core::types::ChunkCoord;

use crate::error::ServerError;

/// Coordinates of every `{x}_{z}.glb` in `dir`, sorted. Other files are ignored.
pub fn scan_chunk_dir(dir: &Path) -> Result<Vec<ChunkCoord>, ServerError> {
    let entries = fs::read_dir(dir).map_err(|source| ServerError::ChunkScan {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut coords = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| ServerError::ChunkScan {
            path: dir.to_path_buf(),
            source,
        })?;
        if !entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
            continue;
        }
        let name = entry.file_name();
        match name.to_str().and_then(parse_chunk_file_name) {
            Some(coord) => coords.push(coord),
            None => log::debug!("Skipping non-chunk file {:?}", name),
        }
    }
    coords.sort();
    Ok(coords)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_finds_chunk_files_only() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["0_0.glb", "-1_2.glb", "readme.txt", "1_1.gltf", "a_b.glb"] {
            fs::write(dir.path().join(name), b"x").unwrap();
        }
        fs::create_dir(dir.path().join("3_3.glb")).unwrap();

        let coords = scan_chunk_dir(dir.path()).unwrap();
        assert_eq!(coords, vec![ChunkCoord::new(-1, 2), ChunkCoord::new(0, 0)]);
    }

    #[test]
    fn test_scan_missing_dir_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = scan_chunk_dir(&dir.path().join("nope")).unwrap_err();
        assert!(matches!(err, ServerError::ChunkScan { .. }));
    }
}

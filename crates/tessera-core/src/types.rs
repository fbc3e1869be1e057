use std::fmt;
use std::str::FromStr;

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Chunk coordinate on the infinite x/z grid (each unit = CHUNK_SIZE world units).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct ChunkCoord {
    pub x: i32,
    pub z: i32,
}

impl ChunkCoord {
    pub const ORIGIN: ChunkCoord = ChunkCoord { x: 0, z: 0 };

    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// Stable string key for this coordinate, e.g. `-1_2`.
    pub fn id(&self) -> ChunkId {
        ChunkId(format!("{}_{}", self.x, self.z))
    }

    /// Chebyshev (chessboard) distance in chunks.
    pub fn chebyshev(&self, other: ChunkCoord) -> u32 {
        let dx = self.x.abs_diff(other.x);
        let dz = self.z.abs_diff(other.z);
        dx.max(dz)
    }

    /// World-space translation of this chunk's local origin. Y is always zero.
    pub fn world_offset(&self, chunk_size: f32) -> Vec3 {
        Vec3::new(self.x as f32 * chunk_size, 0.0, self.z as f32 * chunk_size)
    }

    /// All coordinates with both axis offsets in `[-radius, radius]`, row-major in x then z.
    /// Cells past the `i32` range are skipped; radii above `i32::MAX` are clamped.
    pub fn neighborhood(self, radius: u32) -> impl Iterator<Item = ChunkCoord> {
        let r = i32::try_from(radius).unwrap_or(i32::MAX);
        (-r..=r).filter_map(move |dx| self.x.checked_add(dx)).flat_map(move |x| {
            (-r..=r).filter_map(move |dz| Some(ChunkCoord::new(x, self.z.checked_add(dz)?)))
        })
    }
}

impl fmt::Display for ChunkCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.z)
    }
}

/// Registry/asset key derived from a `ChunkCoord`. Distinct coordinates
/// always produce distinct ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkId(String);

impl ChunkId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Recover the coordinate this id was derived from.
    pub fn coord(&self) -> Option<ChunkCoord> {
        self.0.parse().ok()
    }
}

impl fmt::Display for ChunkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<ChunkCoord> for ChunkId {
    fn from(coord: ChunkCoord) -> Self {
        coord.id()
    }
}

/// Error parsing a `x_z` chunk id.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("malformed chunk id: {0:?}")]
pub struct ParseChunkIdError(pub String);

impl FromStr for ChunkCoord {
    type Err = ParseChunkIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Signs use '-', so the first '_' is always the separator.
        let (x, z) = s
            .split_once('_')
            .ok_or_else(|| ParseChunkIdError(s.to_string()))?;
        let x = x.parse().map_err(|_| ParseChunkIdError(s.to_string()))?;
        let z = z.parse().map_err(|_| ParseChunkIdError(s.to_string()))?;
        Ok(ChunkCoord::new(x, z))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_id_format() {
        assert_eq!(ChunkCoord::new(-1, 2).id().as_str(), "-1_2");
        assert_eq!(ChunkCoord::ORIGIN.id().as_str(), "0_0");
    }

    #[test]
    fn test_id_is_injective_over_grid() {
        let mut ids = HashSet::new();
        for c in ChunkCoord::ORIGIN.neighborhood(12) {
            assert!(ids.insert(c.id()), "duplicate id for {c}");
            assert_eq!(c.id().coord(), Some(c));
        }
        // Values that would collide under naive concatenation stay distinct.
        assert_ne!(ChunkCoord::new(1, 12).id(), ChunkCoord::new(11, 2).id());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!("".parse::<ChunkCoord>().is_err());
        assert!("3".parse::<ChunkCoord>().is_err());
        assert!("a_b".parse::<ChunkCoord>().is_err());
        assert!("1_2_3".parse::<ChunkCoord>().is_err());
        assert_eq!("-3_-4".parse::<ChunkCoord>(), Ok(ChunkCoord::new(-3, -4)));
    }

    #[test]
    fn test_chebyshev() {
        let p = ChunkCoord::new(3, 0);
        assert_eq!(p.chebyshev(ChunkCoord::new(3, 0)), 0);
        assert_eq!(p.chebyshev(ChunkCoord::new(1, 2)), 2);
        assert_eq!(p.chebyshev(ChunkCoord::new(0, -1)), 3);
        assert_eq!(
            ChunkCoord::new(i32::MIN, 0).chebyshev(ChunkCoord::new(i32::MAX, 0)),
            u32::MAX
        );
    }

    #[test]
    fn test_neighborhood_is_square() {
        let cells: Vec<_> = ChunkCoord::new(3, 0).neighborhood(2).collect();
        assert_eq!(cells.len(), 25);
        assert!(cells.contains(&ChunkCoord::new(1, -2)));
        assert!(cells.contains(&ChunkCoord::new(5, 2)));
        assert!(!cells.contains(&ChunkCoord::new(0, 0)));
        assert_eq!(ChunkCoord::ORIGIN.neighborhood(0).count(), 1);
    }

    #[test]
    fn test_neighborhood_at_grid_edge() {
        let edge = ChunkCoord::new(i32::MAX, i32::MIN);
        let cells: Vec<_> = edge.neighborhood(1).collect();
        assert_eq!(cells.len(), 4);
        assert!(cells.contains(&ChunkCoord::new(i32::MAX - 1, i32::MIN + 1)));
        assert!(cells.iter().all(|c| c.chebyshev(edge) <= 1));
    }

    #[test]
    fn test_neighborhood_huge_radius_is_not_empty() {
        let mut cells = ChunkCoord::ORIGIN.neighborhood(u32::MAX);
        assert_eq!(cells.next(), Some(ChunkCoord::new(-i32::MAX, -i32::MAX)));
    }

    #[test]
    fn test_world_offset() {
        let off = ChunkCoord::new(-2, 1).world_offset(1500.0);
        assert_eq!(off, Vec3::new(-3000.0, 0.0, 1500.0));
    }
}

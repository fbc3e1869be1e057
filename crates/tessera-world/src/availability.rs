use std::collections::HashSet;

use tessera_core::types::ChunkCoord;

/// Coordinates for which a chunk asset is known to exist. Built once at
/// startup; there is no way to mutate it afterwards.
#[derive(Debug, Clone, Default)]
pub struct AvailabilitySet {
    coords: HashSet<ChunkCoord>,
}

impl AvailabilitySet {
    /// Every coordinate with x and z in `[-radius, radius]`.
    /// A negative radius yields an empty set.
    pub fn square(radius: i32) -> Self {
        if radius < 0 {
            return Self::default();
        }
        ChunkCoord::ORIGIN.neighborhood(radius as u32).collect()
    }

    pub fn from_coords(coords: impl IntoIterator<Item = ChunkCoord>) -> Self {
        coords.into_iter().collect()
    }

    pub fn contains(&self, coord: ChunkCoord) -> bool {
        self.coords.contains(&coord)
    }

    pub fn len(&self) -> usize {
        self.coords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coords.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChunkCoord> {
        self.coords.iter()
    }
}

impl FromIterator<ChunkCoord> for AvailabilitySet {
    fn from_iter<T: IntoIterator<Item = ChunkCoord>>(iter: T) -> Self {
        Self {
            coords: iter.into_iter().collect(),
        }
    }
}

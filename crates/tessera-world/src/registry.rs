use std::collections::HashMap;

use tessera_core::types::ChunkCoord;

use crate::chunk::{ChunkCounts, ChunkEntry, ChunkState, FetchTicket};

/// Coordinate → load state. Owns every loaded handle.
///
/// Transitions that do not start from the expected state are refused
/// instead of overwriting the existing entry.
pub struct ChunkRegistry<H> {
    entries: HashMap<ChunkCoord, ChunkEntry<H>>,
}

impl<H> Default for ChunkRegistry<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H> ChunkRegistry<H> {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    pub fn state(&self, coord: ChunkCoord) -> ChunkState {
        self.entries
            .get(&coord)
            .map_or(ChunkState::Absent, ChunkEntry::state)
    }

    /// Absent → Loading. Returns false if the coordinate already has an entry.
    pub fn begin_loading(&mut self, coord: ChunkCoord, ticket: FetchTicket, now_ms: f64) -> bool {
        if self.entries.contains_key(&coord) {
            return false;
        }
        self.entries.insert(
            coord,
            ChunkEntry::Loading {
                ticket,
                started_ms: now_ms,
            },
        );
        true
    }

    /// Ticket of the in-flight fetch, if the coordinate is Loading.
    pub fn loading_ticket(&self, coord: ChunkCoord) -> Option<FetchTicket> {
        match self.entries.get(&coord) {
            Some(ChunkEntry::Loading { ticket, .. }) => Some(*ticket),
            _ => None,
        }
    }

    /// Loading(ticket) → Loaded(handle). Hands the handle back if the entry is
    /// not Loading with this ticket, so the caller can release it.
    pub fn finish_loading(
        &mut self,
        coord: ChunkCoord,
        ticket: FetchTicket,
        handle: H,
    ) -> Result<(), H> {
        if self.loading_ticket(coord) != Some(ticket) {
            return Err(handle);
        }
        self.entries.insert(coord, ChunkEntry::Loaded(handle));
        Ok(())
    }

    /// Loading(ticket) → Absent.
    pub fn cancel_loading(&mut self, coord: ChunkCoord, ticket: FetchTicket) -> bool {
        if self.loading_ticket(coord) != Some(ticket) {
            return false;
        }
        self.entries.remove(&coord);
        true
    }

    /// Loaded → Absent. `release` runs before this call returns, so the
    /// coordinate cannot be loaded again while its old handle is alive.
    /// Returns false (and does nothing) unless the coordinate is Loaded.
    pub fn unload(&mut self, coord: ChunkCoord, release: impl FnOnce(ChunkCoord, H)) -> bool {
        if self.state(coord) != ChunkState::Loaded {
            return false;
        }
        match self.entries.remove(&coord) {
            Some(ChunkEntry::Loaded(handle)) => {
                release(coord, handle);
                true
            }
            _ => false,
        }
    }

    /// Loaded coordinates in sorted order.
    pub fn loaded_coords(&self) -> Vec<ChunkCoord> {
        let mut coords: Vec<_> = self
            .entries
            .iter()
            .filter(|(_, e)| matches!(e, ChunkEntry::Loaded(_)))
            .map(|(c, _)| *c)
            .collect();
        coords.sort();
        coords
    }

    /// Loading coordinates in sorted order.
    pub fn loading_coords(&self) -> Vec<ChunkCoord> {
        let mut coords: Vec<_> = self
            .entries
            .iter()
            .filter(|(_, e)| matches!(e, ChunkEntry::Loading { .. }))
            .map(|(c, _)| *c)
            .collect();
        coords.sort();
        coords
    }

    /// Fetches started strictly before `cutoff_ms`.
    pub fn loading_started_before(&self, cutoff_ms: f64) -> Vec<(ChunkCoord, FetchTicket)> {
        let mut stalled: Vec<_> = self
            .entries
            .iter()
            .filter_map(|(c, e)| match e {
                ChunkEntry::Loading { ticket, started_ms } if *started_ms < cutoff_ms => {
                    Some((*c, *ticket))
                }
                _ => None,
            })
            .collect();
        stalled.sort_by_key(|(c, _)| *c);
        stalled
    }

    /// Iterator over loaded handles, for drawing.
    pub fn handles(&self) -> impl Iterator<Item = (ChunkCoord, &H)> {
        self.entries.iter().filter_map(|(c, e)| match e {
            ChunkEntry::Loaded(h) => Some((*c, h)),
            ChunkEntry::Loading { .. } => None,
        })
    }

    pub fn counts(&self) -> ChunkCounts {
        let mut counts = ChunkCounts::default();
        for entry in self.entries.values() {
            match entry {
                ChunkEntry::Loading { .. } => counts.loading += 1,
                ChunkEntry::Loaded(_) => counts.loaded += 1,
            }
        }
        counts
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

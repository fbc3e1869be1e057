/// Identifies one fetch attempt. A completion is only accepted when its ticket
/// matches the ticket the registry entry was put into `Loading` with.
pub type FetchTicket = u64;

/// Observable chunk lifecycle state.
///
/// ```text
/// Absent --request--> Loading --success--> Loaded --unload--> Absent
///                        |
///                        +--failure / timeout / no longer needed--> Absent
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkState {
    /// No entry; no fetch in flight and no resources held.
    Absent,
    /// A fetch has been issued and has not settled.
    Loading,
    /// Renderable resources are attached and owned by the registry.
    Loaded,
}

/// Registry entry. `Absent` is the absence of an entry, so it has no variant here.
#[derive(Debug)]
pub(crate) enum ChunkEntry<H> {
    Loading { ticket: FetchTicket, started_ms: f64 },
    Loaded(H),
}

impl<H> ChunkEntry<H> {
    pub(crate) fn state(&self) -> ChunkState {
        match self {
            ChunkEntry::Loading { .. } => ChunkState::Loading,
            ChunkEntry::Loaded(_) => ChunkState::Loaded,
        }
    }
}

/// Snapshot of registry occupancy, pushed to the UI on every change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChunkCounts {
    pub loaded: u32,
    pub loading: u32,
}

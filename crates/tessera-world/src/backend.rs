use glam::Vec3;
use tessera_core::types::ChunkCoord;

use crate::chunk::{ChunkCounts, FetchTicket};

/// Side effects the chunk manager needs from its host.
///
/// The browser implementation starts HTTP fetches, uploads decoded scenes to
/// the GPU and refreshes the page text. Tests substitute a recording backend.
pub trait ChunkBackend {
    /// Decoded asset delivered by a successful fetch.
    type Payload;
    /// Renderable resources for one loaded chunk.
    type Handle;

    /// Start an asynchronous fetch. The result must eventually be handed to
    /// `ChunkManager::on_fetch_complete` together with `ticket`.
    fn request(&mut self, coord: ChunkCoord, ticket: FetchTicket);

    /// Turn a fetched payload into renderable resources placed at `offset`.
    fn attach(&mut self, coord: ChunkCoord, payload: Self::Payload, offset: Vec3) -> Self::Handle;

    /// Free the resources behind `handle`. Called exactly once per handle.
    fn release(&mut self, coord: ChunkCoord, handle: Self::Handle);

    /// Registry occupancy changed.
    fn chunks_changed(&mut self, counts: ChunkCounts);
}

pub mod availability;
pub mod backend;
pub mod chunk;
pub mod manager;
pub mod registry;
pub mod streaming;

pub use availability::AvailabilitySet;
pub use backend::ChunkBackend;
pub use chunk::{ChunkCounts, ChunkState, FetchTicket};
pub use manager::{ChunkManager, CompletionOutcome, ReconcileReport};
pub use registry::ChunkRegistry;
pub use streaming::{RetrySchedule, StreamingPolicy};

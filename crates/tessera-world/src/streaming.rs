use std::collections::HashMap;

use tessera_core::config::ViewerConfig;
use tessera_core::constants::{CHUNK_SIZE, FETCH_TIMEOUT_MS, RETRY_DELAY_MS};
use tessera_core::types::ChunkCoord;

/// Knobs for chunk streaming. The visible radius is passed to each
/// `reconcile` call instead of living here.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StreamingPolicy {
    /// World units per chunk edge; scales the attach offset.
    pub chunk_size: f32,
    /// In-flight fetches older than this are abandoned.
    pub fetch_timeout_ms: f64,
    /// Wait after a failure before the chunk is requested again.
    pub retry_delay_ms: f64,
}

impl Default for StreamingPolicy {
    fn default() -> Self {
        Self {
            chunk_size: CHUNK_SIZE,
            fetch_timeout_ms: FETCH_TIMEOUT_MS,
            retry_delay_ms: RETRY_DELAY_MS,
        }
    }
}

impl From<&ViewerConfig> for StreamingPolicy {
    fn from(config: &ViewerConfig) -> Self {
        Self {
            chunk_size: config.chunk_size,
            fetch_timeout_ms: config.fetch_timeout_ms,
            retry_delay_ms: config.retry_delay_ms,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct FailureRecord {
    attempts: u32,
    retry_at_ms: f64,
}

/// Failed chunks and when they may be requested again.
#[derive(Debug, Default)]
pub struct RetrySchedule {
    failures: HashMap<ChunkCoord, FailureRecord>,
}

impl RetrySchedule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a failed attempt; returns the number of consecutive failures.
    pub fn record_failure(&mut self, coord: ChunkCoord, now_ms: f64, delay_ms: f64) -> u32 {
        let record = self.failures.entry(coord).or_insert(FailureRecord {
            attempts: 0,
            retry_at_ms: now_ms,
        });
        record.attempts += 1;
        record.retry_at_ms = now_ms + delay_ms;
        record.attempts
    }

    /// Whether `coord` failed recently and its back-off has not elapsed.
    pub fn is_backing_off(&self, coord: ChunkCoord, now_ms: f64) -> bool {
        self.failures
            .get(&coord)
            .is_some_and(|r| now_ms < r.retry_at_ms)
    }

    pub fn attempts(&self, coord: ChunkCoord) -> u32 {
        self.failures.get(&coord).map_or(0, |r| r.attempts)
    }

    pub fn clear(&mut self, coord: ChunkCoord) {
        self.failures.remove(&coord);
    }

    /// Forget failures that no longer matter (e.g. outside the visible set).
    pub fn retain(&mut self, mut keep: impl FnMut(ChunkCoord) -> bool) {
        self.failures.retain(|c, _| keep(*c));
    }

    /// Whether any failure accepted by `filter` has reached its retry time.
    pub fn any_due(&self, now_ms: f64, mut filter: impl FnMut(ChunkCoord) -> bool) -> bool {
        self.failures
            .iter()
            .any(|(c, r)| r.retry_at_ms <= now_ms && filter(*c))
    }

    pub fn len(&self) -> usize {
        self.failures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }
}

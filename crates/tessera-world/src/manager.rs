use std::fmt::Display;

use tessera_core::types::ChunkCoord;

use crate::availability::AvailabilitySet;
use crate::backend::ChunkBackend;
use crate::chunk::{ChunkCounts, ChunkState, FetchTicket};
use crate::registry::ChunkRegistry;
use crate::streaming::{RetrySchedule, StreamingPolicy};

/// What a single `reconcile` call did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Coordinates moved to Loading (a fetch was issued for each).
    pub requested: Vec<ChunkCoord>,
    /// Coordinates whose handles were released.
    pub unloaded: Vec<ChunkCoord>,
    /// Needed coordinates with no backing asset.
    pub unavailable: usize,
    /// Needed coordinates skipped because a recent fetch failed.
    pub backing_off: usize,
}

impl ReconcileReport {
    pub fn is_noop(&self) -> bool {
        self.requested.is_empty() && self.unloaded.is_empty()
    }
}

/// How a fetch completion was handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionOutcome {
    /// Payload attached; chunk is Loaded.
    Loaded,
    /// Fetch failed; chunk is Absent and scheduled for retry.
    Failed,
    /// Payload arrived after the player moved away; dropped, chunk is Absent.
    Discarded,
    /// Ticket no longer current (timed out or superseded); ignored.
    Stale,
}

/// Keeps the registry in line with the square neighborhood around the player.
///
/// Owns the registry, so every state change goes through the operations
/// below. All side effects are routed through a `ChunkBackend`.
pub struct ChunkManager<H> {
    registry: ChunkRegistry<H>,
    availability: AvailabilitySet,
    policy: StreamingPolicy,
    retries: RetrySchedule,
    next_ticket: FetchTicket,
    /// Player chunk and radius of the most recent reconcile.
    focus: Option<(ChunkCoord, u32)>,
}

impl<H> ChunkManager<H> {
    pub fn new(availability: AvailabilitySet, policy: StreamingPolicy) -> Self {
        Self {
            registry: ChunkRegistry::new(),
            availability,
            policy,
            retries: RetrySchedule::new(),
            next_ticket: 1,
            focus: None,
        }
    }

    pub fn registry(&self) -> &ChunkRegistry<H> {
        &self.registry
    }

    pub fn availability(&self) -> &AvailabilitySet {
        &self.availability
    }

    pub fn policy(&self) -> &StreamingPolicy {
        &self.policy
    }

    pub fn state(&self, coord: ChunkCoord) -> ChunkState {
        self.registry.state(coord)
    }

    pub fn counts(&self) -> ChunkCounts {
        self.registry.counts()
    }

    /// Consecutive failed fetches for `coord` since it last loaded.
    pub fn failed_attempts(&self, coord: ChunkCoord) -> u32 {
        self.retries.attempts(coord)
    }

    /// Player chunk of the last reconcile, if any has happened.
    pub fn focus_chunk(&self) -> Option<ChunkCoord> {
        self.focus.map(|(c, _)| c)
    }

    /// Whether `coord` is inside the neighborhood of the last reconcile.
    pub fn is_needed(&self, coord: ChunkCoord) -> bool {
        self.focus
            .is_some_and(|(player, radius)| player.chebyshev(coord) <= radius)
    }

    /// True before the first reconcile and whenever the player changed chunk.
    pub fn needs_reconcile(&self, player_chunk: ChunkCoord) -> bool {
        self.focus_chunk() != Some(player_chunk)
    }

    /// True when a failed chunk inside the current neighborhood may be retried.
    pub fn retry_due(&self, now_ms: f64) -> bool {
        self.retries.any_due(now_ms, |c| {
            self.is_needed(c) && self.registry.state(c) == ChunkState::Absent
        })
    }

    /// Bring the registry in line with the `radius` neighborhood of `player_chunk`.
    ///
    /// Unloads first so GPU memory is returned before new uploads start.
    /// Calling this again with the same arguments issues no fetches and no
    /// releases.
    pub fn reconcile<B>(
        &mut self,
        player_chunk: ChunkCoord,
        radius: u32,
        now_ms: f64,
        backend: &mut B,
    ) -> ReconcileReport
    where
        B: ChunkBackend<Handle = H>,
    {
        self.focus = Some((player_chunk, radius));
        let mut report = ReconcileReport::default();

        for coord in self.registry.loaded_coords() {
            if coord.chebyshev(player_chunk) <= radius {
                continue;
            }
            if self
                .registry
                .unload(coord, |c, handle| backend.release(c, handle))
            {
                report.unloaded.push(coord);
            }
        }
        if !report.unloaded.is_empty() {
            backend.chunks_changed(self.registry.counts());
        }

        for coord in player_chunk.neighborhood(radius) {
            if self.registry.state(coord) != ChunkState::Absent {
                continue;
            }
            if !self.availability.contains(coord) {
                report.unavailable += 1;
                continue;
            }
            if self.retries.is_backing_off(coord, now_ms) {
                report.backing_off += 1;
                continue;
            }
            let ticket = self.next_ticket;
            self.next_ticket += 1;
            if self.registry.begin_loading(coord, ticket, now_ms) {
                backend.request(coord, ticket);
                report.requested.push(coord);
            }
        }
        if !report.requested.is_empty() {
            backend.chunks_changed(self.registry.counts());
        }

        // Failures outside the neighborhood are retried fresh if the player returns.
        self.retries
            .retain(|c| c.chebyshev(player_chunk) <= radius);

        if !report.is_noop() {
            log::debug!(
                "Reconcile at chunk {}: {} requested, {} unloaded, {} unavailable, {} backing off",
                player_chunk.id(),
                report.requested.len(),
                report.unloaded.len(),
                report.unavailable,
                report.backing_off
            );
        }
        report
    }

    /// Settle the fetch identified by (`coord`, `ticket`).
    pub fn on_fetch_complete<B, E>(
        &mut self,
        coord: ChunkCoord,
        ticket: FetchTicket,
        result: Result<B::Payload, E>,
        now_ms: f64,
        backend: &mut B,
    ) -> CompletionOutcome
    where
        B: ChunkBackend<Handle = H>,
        E: Display,
    {
        if self.registry.loading_ticket(coord) != Some(ticket) {
            log::debug!(
                "Ignoring stale completion for chunk {} (ticket {})",
                coord.id(),
                ticket
            );
            return CompletionOutcome::Stale;
        }

        let outcome = match result {
            Ok(payload) if self.is_needed(coord) => {
                let offset = coord.world_offset(self.policy.chunk_size);
                let handle = backend.attach(coord, payload, offset);
                if let Err(handle) = self.registry.finish_loading(coord, ticket, handle) {
                    backend.release(coord, handle);
                }
                self.retries.clear(coord);
                CompletionOutcome::Loaded
            }
            Ok(_payload) => {
                log::debug!(
                    "Chunk {} arrived outside the visible area, dropping it",
                    coord.id()
                );
                self.registry.cancel_loading(coord, ticket);
                CompletionOutcome::Discarded
            }
            Err(e) => {
                log::warn!("Failed to load chunk {}: {}", coord.id(), e);
                self.registry.cancel_loading(coord, ticket);
                self.retries
                    .record_failure(coord, now_ms, self.policy.retry_delay_ms);
                CompletionOutcome::Failed
            }
        };
        backend.chunks_changed(self.registry.counts());
        outcome
    }

    /// Abandon fetches that have been in flight longer than the policy timeout.
    /// Their late completions will be reported as `Stale`.
    pub fn expire_stalled<B>(&mut self, now_ms: f64, backend: &mut B) -> Vec<ChunkCoord>
    where
        B: ChunkBackend<Handle = H>,
    {
        let cutoff = now_ms - self.policy.fetch_timeout_ms;
        let mut expired = Vec::new();
        for (coord, ticket) in self.registry.loading_started_before(cutoff) {
            if self.registry.cancel_loading(coord, ticket) {
                log::warn!(
                    "Chunk {} fetch timed out after {:.0} ms",
                    coord.id(),
                    self.policy.fetch_timeout_ms
                );
                self.retries
                    .record_failure(coord, now_ms, self.policy.retry_delay_ms);
                expired.push(coord);
            }
        }
        if !expired.is_empty() {
            backend.chunks_changed(self.registry.counts());
        }
        expired
    }

    /// Release every loaded chunk (viewer teardown). In-flight fetches are
    /// forgotten; their completions will be `Stale`.
    pub fn unload_all<B>(&mut self, backend: &mut B) -> usize
    where
        B: ChunkBackend<Handle = H>,
    {
        let mut released = 0;
        for coord in self.registry.loaded_coords() {
            if self
                .registry
                .unload(coord, |c, handle| backend.release(c, handle))
            {
                released += 1;
            }
        }
        for coord in self.registry.loading_coords() {
            if let Some(ticket) = self.registry.loading_ticket(coord) {
                self.registry.cancel_loading(coord, ticket);
            }
        }
        self.focus = None;
        backend.chunks_changed(self.registry.counts());
        released
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use std::collections::{HashMap, HashSet};

    const CS: f32 = 1500.0;
    const R: u32 = 2;

    /// Handle that remembers where it was attached.
    #[derive(Debug, PartialEq)]
    struct TestHandle {
        coord: ChunkCoord,
        offset: Vec3,
        serial: u32,
    }

    #[derive(Default)]
    struct RecordingBackend {
        requests: Vec<(ChunkCoord, FetchTicket)>,
        attached: Vec<ChunkCoord>,
        released: Vec<TestHandle>,
        notifications: Vec<ChunkCounts>,
        next_serial: u32,
        live: HashSet<u32>,
    }

    impl RecordingBackend {
        /// Requests issued since the last call, keyed by coordinate.
        fn take_requests(&mut self) -> HashMap<ChunkCoord, FetchTicket> {
            self.requests.drain(..).collect()
        }
    }

    impl ChunkBackend for RecordingBackend {
        type Payload = &'static str;
        type Handle = TestHandle;

        fn request(&mut self, coord: ChunkCoord, ticket: FetchTicket) {
            self.requests.push((coord, ticket));
        }

        fn attach(&mut self, coord: ChunkCoord, _payload: &'static str, offset: Vec3) -> TestHandle {
            self.attached.push(coord);
            let serial = self.next_serial;
            self.next_serial += 1;
            self.live.insert(serial);
            TestHandle {
                coord,
                offset,
                serial,
            }
        }

        fn release(&mut self, coord: ChunkCoord, handle: TestHandle) {
            assert_eq!(coord, handle.coord);
            assert!(self.live.remove(&handle.serial), "handle released twice");
            self.released.push(handle);
        }

        fn chunks_changed(&mut self, counts: ChunkCounts) {
            self.notifications.push(counts);
        }
    }

    fn c(x: i32, z: i32) -> ChunkCoord {
        ChunkCoord::new(x, z)
    }

    fn manager() -> ChunkManager<TestHandle> {
        ChunkManager::new(AvailabilitySet::square(2), StreamingPolicy::default())
    }

    /// Complete every outstanding request successfully.
    fn complete_all(
        mgr: &mut ChunkManager<TestHandle>,
        backend: &mut RecordingBackend,
        now_ms: f64,
    ) {
        for (coord, ticket) in backend.take_requests() {
            mgr.on_fetch_complete::<_, String>(coord, ticket, Ok("glb"), now_ms, backend);
        }
    }

    fn expected_loaded(player: ChunkCoord, radius: u32) -> Vec<ChunkCoord> {
        let avail = AvailabilitySet::square(2);
        let mut v: Vec<_> = player
            .neighborhood(radius)
            .filter(|c| avail.contains(*c))
            .collect();
        v.sort();
        v
    }

    #[test]
    fn test_startup_at_origin_loads_full_grid() {
        let mut mgr = manager();
        let mut backend = RecordingBackend::default();

        let report = mgr.reconcile(c(0, 0), R, 0.0, &mut backend);
        assert_eq!(report.requested.len(), 25);
        assert_eq!(report.unavailable, 0);
        assert_eq!(mgr.counts(), ChunkCounts { loaded: 0, loading: 25 });
        for coord in c(0, 0).neighborhood(R) {
            assert_eq!(mgr.state(coord), ChunkState::Loading);
        }

        complete_all(&mut mgr, &mut backend, 10.0);
        assert_eq!(mgr.counts(), ChunkCounts { loaded: 25, loading: 0 });
        assert_eq!(mgr.registry().loaded_coords(), expected_loaded(c(0, 0), R));
    }

    #[test]
    fn test_attach_offset_is_coord_times_chunk_size() {
        let mut mgr = manager();
        let mut backend = RecordingBackend::default();
        mgr.reconcile(c(0, 0), R, 0.0, &mut backend);
        complete_all(&mut mgr, &mut backend, 0.0);

        for (coord, handle) in mgr.registry().handles() {
            assert_eq!(handle.offset, Vec3::new(coord.x as f32 * CS, 0.0, coord.z as f32 * CS));
        }
    }

    #[test]
    fn test_reconcile_is_idempotent() {
        let mut mgr = manager();
        let mut backend = RecordingBackend::default();
        mgr.reconcile(c(0, 0), R, 0.0, &mut backend);
        let first = backend.requests.len();

        // Again while fetches are in flight.
        let report = mgr.reconcile(c(0, 0), R, 1.0, &mut backend);
        assert!(report.is_noop());
        assert_eq!(backend.requests.len(), first);

        // And again after they all landed.
        complete_all(&mut mgr, &mut backend, 2.0);
        let notified = backend.notifications.len();
        let report = mgr.reconcile(c(0, 0), R, 3.0, &mut backend);
        assert!(report.is_noop());
        assert!(backend.requests.is_empty());
        assert!(backend.released.is_empty());
        assert_eq!(backend.notifications.len(), notified);
    }

    #[test]
    fn test_move_to_three_zero_unloads_and_respects_availability() {
        let mut mgr = manager();
        let mut backend = RecordingBackend::default();
        mgr.reconcile(c(0, 0), R, 0.0, &mut backend);
        complete_all(&mut mgr, &mut backend, 0.0);

        let report = mgr.reconcile(c(3, 0), R, 100.0, &mut backend);
        // x in {-2, -1, 0} leaves the neighborhood of (3, 0).
        assert_eq!(report.unloaded.len(), 15);
        assert!(report.unloaded.iter().all(|u| u.x <= 0));
        // x in {3, 4, 5} is needed but has no assets.
        assert!(report.requested.is_empty());
        assert_eq!(report.unavailable, 15);

        assert_eq!(mgr.registry().loaded_coords(), expected_loaded(c(3, 0), R));
        assert_eq!(mgr.counts().loaded, 10);
        assert_eq!(backend.released.len(), 15);
        assert!(backend.live.len() == 10);
    }

    #[test]
    fn test_loaded_set_matches_neighborhood_after_walk() {
        let mut mgr = manager();
        let mut backend = RecordingBackend::default();
        let path = [c(0, 0), c(1, 0), c(1, 1), c(-3, 1), c(-1, -2), c(0, 0), c(7, 7)];
        for (step, player) in path.into_iter().enumerate() {
            mgr.reconcile(player, R, step as f64, &mut backend);
            complete_all(&mut mgr, &mut backend, step as f64);
            assert_eq!(
                mgr.registry().loaded_coords(),
                expected_loaded(player, R),
                "after moving to {player}"
            );
            assert_eq!(mgr.counts().loading, 0);
            assert_eq!(backend.live.len() as u32, mgr.counts().loaded);
        }
        assert_eq!(mgr.counts().loaded, 0);
    }

    #[test]
    fn test_boundary_oscillation_releases_before_reload() {
        let mut mgr = manager();
        let mut backend = RecordingBackend::default();
        mgr.reconcile(c(0, 0), R, 0.0, &mut backend);
        complete_all(&mut mgr, &mut backend, 0.0);

        for i in 0..10 {
            let player = if i % 2 == 0 { c(1, 0) } else { c(0, 0) };
            mgr.reconcile(player, R, i as f64, &mut backend);
            complete_all(&mut mgr, &mut backend, i as f64);
            // Every handle ever attached is either live in the registry or released once.
            assert_eq!(backend.live.len() as u32, mgr.counts().loaded);
            assert_eq!(
                backend.attached.len(),
                backend.released.len() + backend.live.len()
            );
        }
        // Column x = -2 was unloaded and reloaded five times.
        let reloads = backend.attached.iter().filter(|a| **a == c(-2, 0)).count();
        assert_eq!(reloads, 6);
    }

    #[test]
    fn test_no_duplicate_fetch_while_loading() {
        let mut mgr = manager();
        let mut backend = RecordingBackend::default();
        mgr.reconcile(c(0, 0), R, 0.0, &mut backend);
        // Wander inside range without completing anything.
        mgr.reconcile(c(1, 0), R, 1.0, &mut backend);
        mgr.reconcile(c(0, 0), R, 2.0, &mut backend);

        let mut seen = HashSet::new();
        for (coord, _) in &backend.requests {
            assert!(seen.insert(*coord), "duplicate fetch for {coord}");
        }
        assert_eq!(seen.len(), 25);
    }

    #[test]
    fn test_failed_fetch_reverts_and_retries_after_delay() {
        let mut mgr = manager();
        let mut backend = RecordingBackend::default();
        mgr.reconcile(c(0, 0), R, 0.0, &mut backend);

        let requests = backend.take_requests();
        for (coord, ticket) in &requests {
            let result: Result<&'static str, &str> = if *coord == c(1, 1) {
                Err("404 Not Found")
            } else {
                Ok("glb")
            };
            let outcome = mgr.on_fetch_complete(*coord, *ticket, result, 100.0, &mut backend);
            if *coord == c(1, 1) {
                assert_eq!(outcome, CompletionOutcome::Failed);
            }
        }
        assert_eq!(mgr.state(c(1, 1)), ChunkState::Absent);
        assert_eq!(mgr.failed_attempts(c(1, 1)), 1);
        assert_eq!(mgr.counts(), ChunkCounts { loaded: 24, loading: 0 });

        // Too early: still backing off.
        let delay = mgr.policy().retry_delay_ms;
        assert!(!mgr.retry_due(100.0 + delay - 1.0));
        let report = mgr.reconcile(c(0, 0), R, 100.0 + delay - 1.0, &mut backend);
        assert!(report.requested.is_empty());
        assert_eq!(report.backing_off, 1);

        // After the delay the same visible set re-issues the fetch.
        assert!(mgr.retry_due(100.0 + delay));
        let report = mgr.reconcile(c(0, 0), R, 100.0 + delay, &mut backend);
        assert_eq!(report.requested, vec![c(1, 1)]);
        complete_all(&mut mgr, &mut backend, 200.0 + delay);
        assert_eq!(mgr.state(c(1, 1)), ChunkState::Loaded);
        assert_eq!(mgr.failed_attempts(c(1, 1)), 0);
        assert!(!mgr.retry_due(f64::MAX));
    }

    #[test]
    fn test_completion_after_moving_away_is_discarded() {
        let mut mgr = manager();
        let mut backend = RecordingBackend::default();
        mgr.reconcile(c(0, 0), R, 0.0, &mut backend);
        let requests = backend.take_requests();

        // Player sprints to (3, 0) before anything arrives.
        mgr.reconcile(c(3, 0), R, 1.0, &mut backend);
        // Loading chunks are not unloaded: there is nothing to release yet.
        assert!(backend.released.is_empty());

        for (coord, ticket) in requests {
            let outcome =
                mgr.on_fetch_complete::<_, String>(coord, ticket, Ok("glb"), 2.0, &mut backend);
            if coord.x >= 1 {
                assert_eq!(outcome, CompletionOutcome::Loaded);
            } else {
                assert_eq!(outcome, CompletionOutcome::Discarded);
                assert_eq!(mgr.state(coord), ChunkState::Absent);
            }
        }
        assert_eq!(mgr.registry().loaded_coords(), expected_loaded(c(3, 0), R));
        assert_eq!(backend.attached.len(), 10);
    }

    #[test]
    fn test_stalled_fetch_expires_and_late_completion_is_stale() {
        let mut mgr = manager();
        let mut backend = RecordingBackend::default();
        mgr.reconcile(c(0, 0), 0, 0.0, &mut backend);
        let (coord, ticket) = backend.requests[0];
        assert_eq!(coord, c(0, 0));

        let timeout = mgr.policy().fetch_timeout_ms;
        assert!(mgr.expire_stalled(timeout - 1.0, &mut backend).is_empty());
        assert_eq!(mgr.expire_stalled(timeout + 1.0, &mut backend), vec![c(0, 0)]);
        assert_eq!(mgr.state(c(0, 0)), ChunkState::Absent);

        let outcome =
            mgr.on_fetch_complete::<_, String>(coord, ticket, Ok("late"), timeout + 2.0, &mut backend);
        assert_eq!(outcome, CompletionOutcome::Stale);
        assert!(backend.attached.is_empty());

        // Retry issues a fresh ticket; the old one can never complete it.
        let retry_at = timeout + 1.0 + mgr.policy().retry_delay_ms;
        let report = mgr.reconcile(c(0, 0), 0, retry_at, &mut backend);
        assert_eq!(report.requested, vec![c(0, 0)]);
        let (_, new_ticket) = backend.requests[1];
        assert_ne!(new_ticket, ticket);
        let outcome =
            mgr.on_fetch_complete::<_, String>(coord, ticket, Ok("late"), retry_at, &mut backend);
        assert_eq!(outcome, CompletionOutcome::Stale);
        assert_eq!(mgr.state(c(0, 0)), ChunkState::Loading);
    }

    #[test]
    fn test_no_unload_for_absent_or_loading() {
        let mut mgr = manager();
        let mut backend = RecordingBackend::default();
        mgr.reconcile(c(0, 0), R, 0.0, &mut backend);
        // Nothing loaded yet; moving far away must not release anything.
        let report = mgr.reconcile(c(10, 10), R, 1.0, &mut backend);
        assert!(report.unloaded.is_empty());
        assert!(backend.released.is_empty());
        assert_eq!(mgr.counts().loading, 25);
    }

    #[test]
    fn test_notifications_follow_every_change() {
        let mut mgr = manager();
        let mut backend = RecordingBackend::default();
        mgr.reconcile(c(0, 0), 1, 0.0, &mut backend);
        assert_eq!(
            backend.notifications.last(),
            Some(&ChunkCounts { loaded: 0, loading: 9 })
        );
        complete_all(&mut mgr, &mut backend, 0.0);
        assert_eq!(backend.notifications.len(), 1 + 9);
        assert_eq!(
            backend.notifications.last(),
            Some(&ChunkCounts { loaded: 9, loading: 0 })
        );

        mgr.reconcile(c(2, 0), 1, 0.0, &mut backend);
        // One notification for the unload batch, one for the request batch.
        assert_eq!(backend.notifications.len(), 12);
    }

    #[test]
    fn test_needs_reconcile_tracks_player_chunk() {
        let mut mgr = manager();
        let mut backend = RecordingBackend::default();
        assert!(mgr.needs_reconcile(c(0, 0)));
        mgr.reconcile(c(0, 0), R, 0.0, &mut backend);
        assert!(!mgr.needs_reconcile(c(0, 0)));
        assert!(mgr.needs_reconcile(c(0, 1)));
        assert!(mgr.is_needed(c(2, -2)));
        assert!(!mgr.is_needed(c(3, 0)));
    }

    #[test]
    fn test_unload_all_releases_everything() {
        let mut mgr = manager();
        let mut backend = RecordingBackend::default();
        mgr.reconcile(c(0, 0), R, 0.0, &mut backend);
        let mut requests: Vec<_> = backend.take_requests().into_iter().collect();
        requests.sort();
        let (pending, done) = requests.split_at(5);
        for (coord, ticket) in done {
            mgr.on_fetch_complete::<_, String>(*coord, *ticket, Ok("glb"), 0.0, &mut backend);
        }

        assert_eq!(mgr.unload_all(&mut backend), 20);
        assert!(backend.live.is_empty());
        assert!(mgr.registry().is_empty());
        for (coord, ticket) in pending {
            let outcome =
                mgr.on_fetch_complete::<_, String>(*coord, *ticket, Ok("glb"), 1.0, &mut backend);
            assert_eq!(outcome, CompletionOutcome::Stale);
        }
        assert!(mgr.needs_reconcile(c(0, 0)));
    }
}

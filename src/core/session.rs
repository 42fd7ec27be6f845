use std::fmt;
use std::time::{Duration, Instant};

use log::{trace, warn};

use super::params::{FrameRequest, FrameSize};
use super::region::Region;
use super::surface::DoubleBuffer;

/// Monotonic identifier of one frame's dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(pub u64);

impl SessionId {
    pub fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A worker's answer to one tile request
///
/// `pixels` is a full-frame RGBA buffer; only `region` is meaningful.
#[derive(Debug, Clone)]
pub struct TileResult {
    pub session: SessionId,
    pub worker: usize,
    pub region: Region,
    pub pixels: Vec<u8>,
}

/// Why a tile result was discarded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// No session, or a session other than the active one
    UnknownSession,
    /// The session already completed
    SessionClosed,
    /// Region does not match what was sent to that worker
    UnexpectedRegion,
    DuplicateRegion,
    /// Buffer length does not match the session's frame size
    SizeMismatch,
    /// The session's target surface has become the visible one
    TargetVisible,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileOutcome {
    Accepted { completed: usize, expected: usize },
    FrameComplete,
    Dropped(DropReason),
}

/// Bookkeeping for one in-flight frame
#[derive(Debug, Clone)]
pub struct FrameSession {
    id: SessionId,
    request: FrameRequest,
    regions: Vec<Region>,
    received: Vec<bool>,
    completed: usize,
    target_surface: usize,
    started: Instant,
    closed: bool,
}

impl FrameSession {
    /// `regions[i]` is the region sent to worker `i`
    pub fn new(
        id: SessionId,
        request: FrameRequest,
        regions: Vec<Region>,
        target_surface: usize,
    ) -> Self {
        let received = vec![false; regions.len()];
        Self {
            id,
            request,
            regions,
            received,
            completed: 0,
            target_surface,
            started: Instant::now(),
            closed: false,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn request(&self) -> &FrameRequest {
        &self.request
    }

    pub fn size(&self) -> FrameSize {
        self.request.size()
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn expected_tile_count(&self) -> usize {
        self.regions.len()
    }

    pub fn completed_tile_count(&self) -> usize {
        self.completed
    }

    pub fn target_surface(&self) -> usize {
        self.target_surface
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Time since dispatch began
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Check a result against this session without touching any state
    fn screen(&self, result: &TileResult) -> Result<usize, DropReason> {
        if result.session != self.id {
            return Err(DropReason::UnknownSession);
        }
        if self.closed {
            return Err(DropReason::SessionClosed);
        }
        if self.regions.get(result.worker) != Some(&result.region) {
            return Err(DropReason::UnexpectedRegion);
        }
        if self.received[result.worker] {
            return Err(DropReason::DuplicateRegion);
        }
        if result.pixels.len() != self.size().byte_len() {
            return Err(DropReason::SizeMismatch);
        }
        Ok(result.worker)
    }
}

/// Aggregates tile results into the hidden surface and signals completion once
#[derive(Debug, Default)]
pub struct CompletionTracker {
    session: Option<FrameSession>,
    dropped: u64,
}

impl CompletionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a freshly dispatched session, superseding the previous one
    pub fn begin(&mut self, session: FrameSession) {
        if let Some(previous) = &self.session {
            if !previous.is_closed() {
                warn!(
                    "session {} superseded with {}/{} tiles",
                    previous.id,
                    previous.completed,
                    previous.expected_tile_count()
                );
            }
        }
        self.session = Some(session);
    }

    /// Most recent session, open or closed
    pub fn session(&self) -> Option<&FrameSession> {
        self.session.as_ref()
    }

    /// True while a session still waits for tiles
    pub fn is_in_flight(&self) -> bool {
        self.session.as_ref().is_some_and(|s| !s.is_closed())
    }

    /// Results discarded since this tracker was created
    pub fn dropped_results(&self) -> u64 {
        self.dropped
    }

    /// Composite one tile into the write surface and count it
    ///
    /// Tiles may arrive in any order. The final count fires `FrameComplete`
    /// exactly once, after which the session is closed and further results
    /// for it are dropped.
    pub fn on_tile_result(&mut self, buffers: &mut DoubleBuffer, result: TileResult) -> TileOutcome {
        let outcome = self.apply(buffers, &result);
        if let TileOutcome::Dropped(reason) = outcome {
            self.dropped += 1;
            warn!(
                "dropped tile from worker {} for session {}: {:?}",
                result.worker, result.session, reason
            );
        }
        outcome
    }

    fn apply(&mut self, buffers: &mut DoubleBuffer, result: &TileResult) -> TileOutcome {
        let Some(session) = self.session.as_mut() else {
            return TileOutcome::Dropped(DropReason::UnknownSession);
        };

        let slot = match session.screen(result) {
            Ok(slot) => slot,
            Err(reason) => return TileOutcome::Dropped(reason),
        };

        if buffers.visible_index() == session.target_surface {
            return TileOutcome::Dropped(DropReason::TargetVisible);
        }
        if !buffers
            .write_surface_mut()
            .blit_region(&result.pixels, result.region)
        {
            return TileOutcome::Dropped(DropReason::SizeMismatch);
        }

        session.received[slot] = true;
        session.completed += 1;
        trace!(
            "session {} tile {} composited ({}/{})",
            session.id,
            slot,
            session.completed,
            session.expected_tile_count()
        );

        if session.completed == session.expected_tile_count() {
            session.closed = true;
            TileOutcome::FrameComplete
        } else {
            TileOutcome::Accepted {
                completed: session.completed,
                expected: session.expected_tile_count(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::params::ViewParams;
    use crate::core::region::plan;

    const SIZE: FrameSize = FrameSize::new(8, 6);

    fn start(tracker: &mut CompletionTracker, buffers: &mut DoubleBuffer, id: u64) -> Vec<Region> {
        let regions = plan(SIZE.width, SIZE.height, 4);
        buffers.prepare_write(SIZE);
        let request = FrameRequest::new(SIZE, &ViewParams::default(), 0.0);
        tracker.begin(FrameSession::new(
            SessionId(id),
            request,
            regions.clone(),
            1 - buffers.visible_index(),
        ));
        regions
    }

    fn tile(id: u64, worker: usize, region: Region, fill: u8) -> TileResult {
        TileResult {
            session: SessionId(id),
            worker,
            region,
            pixels: vec![fill; SIZE.byte_len()],
        }
    }

    #[test]
    fn test_counts_until_complete() {
        let mut tracker = CompletionTracker::new();
        let mut buffers = DoubleBuffer::new(SIZE);
        let regions = start(&mut tracker, &mut buffers, 1);

        for (i, region) in regions.iter().enumerate().take(3) {
            let outcome = tracker.on_tile_result(&mut buffers, tile(1, i, *region, 7));
            assert_eq!(
                outcome,
                TileOutcome::Accepted {
                    completed: i + 1,
                    expected: 4
                }
            );
            assert!(tracker.is_in_flight());
        }

        let outcome = tracker.on_tile_result(&mut buffers, tile(1, 3, regions[3], 7));
        assert_eq!(outcome, TileOutcome::FrameComplete);
        assert!(!tracker.is_in_flight());
        assert!(buffers.write_surface().pixels().iter().all(|&b| b == 7));
    }

    #[test]
    fn test_late_result_after_close_is_dropped() {
        let mut tracker = CompletionTracker::new();
        let mut buffers = DoubleBuffer::new(SIZE);
        let regions = start(&mut tracker, &mut buffers, 1);
        for (i, region) in regions.iter().enumerate() {
            tracker.on_tile_result(&mut buffers, tile(1, i, *region, 7));
        }

        let outcome = tracker.on_tile_result(&mut buffers, tile(1, 0, regions[0], 9));
        assert_eq!(outcome, TileOutcome::Dropped(DropReason::SessionClosed));
        assert_eq!(tracker.dropped_results(), 1);
        assert_eq!(buffers.write_surface().pixel(0, 0), Some([7, 7, 7, 7]));
    }

    #[test]
    fn test_stale_session_is_dropped() {
        let mut tracker = CompletionTracker::new();
        let mut buffers = DoubleBuffer::new(SIZE);
        let regions = start(&mut tracker, &mut buffers, 2);

        let outcome = tracker.on_tile_result(&mut buffers, tile(1, 0, regions[0], 9));
        assert_eq!(outcome, TileOutcome::Dropped(DropReason::UnknownSession));
        assert_eq!(tracker.session().map(|s| s.completed_tile_count()), Some(0));
    }

    #[test]
    fn test_no_session_drops() {
        let mut tracker = CompletionTracker::new();
        let mut buffers = DoubleBuffer::new(SIZE);
        let outcome = tracker.on_tile_result(&mut buffers, tile(1, 0, Region::full(8, 6), 1));
        assert_eq!(outcome, TileOutcome::Dropped(DropReason::UnknownSession));
    }

    #[test]
    fn test_duplicate_region_not_double_counted() {
        let mut tracker = CompletionTracker::new();
        let mut buffers = DoubleBuffer::new(SIZE);
        let regions = start(&mut tracker, &mut buffers, 1);

        tracker.on_tile_result(&mut buffers, tile(1, 2, regions[2], 3));
        let outcome = tracker.on_tile_result(&mut buffers, tile(1, 2, regions[2], 3));
        assert_eq!(outcome, TileOutcome::Dropped(DropReason::DuplicateRegion));
        assert_eq!(tracker.session().map(|s| s.completed_tile_count()), Some(1));
    }

    #[test]
    fn test_region_must_match_worker() {
        let mut tracker = CompletionTracker::new();
        let mut buffers = DoubleBuffer::new(SIZE);
        let regions = start(&mut tracker, &mut buffers, 1);

        let outcome = tracker.on_tile_result(&mut buffers, tile(1, 0, regions[1], 3));
        assert_eq!(outcome, TileOutcome::Dropped(DropReason::UnexpectedRegion));
    }

    #[test]
    fn test_wrong_buffer_size_dropped() {
        let mut tracker = CompletionTracker::new();
        let mut buffers = DoubleBuffer::new(SIZE);
        let regions = start(&mut tracker, &mut buffers, 1);

        let mut result = tile(1, 0, regions[0], 3);
        result.pixels.truncate(16);
        let outcome = tracker.on_tile_result(&mut buffers, result);
        assert_eq!(outcome, TileOutcome::Dropped(DropReason::SizeMismatch));
    }

    #[test]
    fn test_never_writes_visible_surface() {
        let mut tracker = CompletionTracker::new();
        let mut buffers = DoubleBuffer::new(SIZE);
        let regions = start(&mut tracker, &mut buffers, 1);
        buffers.swap();

        let outcome = tracker.on_tile_result(&mut buffers, tile(1, 0, regions[0], 3));
        assert_eq!(outcome, TileOutcome::Dropped(DropReason::TargetVisible));
        assert!(buffers.visible().pixels().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_session_id_display_and_next() {
        assert_eq!(SessionId(4).next(), SessionId(5));
        assert_eq!(SessionId(4).to_string(), "#4");
    }
}

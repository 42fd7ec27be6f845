use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{debug, info, warn};

use super::controller::{InputEvent, ParameterSource};
use super::dispatcher::FrameDispatcher;
use super::drive::{DriveLoop, DrivePhase, DriveState};
use super::frame::FrameStats;
use super::params::{FrameRequest, FrameSize};
use super::region::{plan, TileGrid};
use super::session::{CompletionTracker, SessionId, TileOutcome, TileResult};
use super::surface::DoubleBuffer;
use super::worker_pool::{TileRenderer, WorkerPool};
use crate::config::RelayConfig;
use crate::error::Result;

/// What one call to [`Orchestrator::tick`] did
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TickReport {
    /// Frame swapped to visible during this tick
    pub completed: Option<FrameStats>,
    /// Session dispatched during this tick
    pub dispatched: Option<SessionId>,
}

/// Single coordinating context for the frame pipeline
///
/// Owns the worker pool, the double buffer and the drive loop. Every state
/// change happens on the thread that calls into it; workers only ever see
/// immutable tile requests.
pub struct Orchestrator {
    pool: WorkerPool,
    dispatcher: FrameDispatcher,
    tracker: CompletionTracker,
    buffers: DoubleBuffer,
    drive: DriveLoop,
    grid: TileGrid,
    max_size: (u32, u32),
    param_revision: u64,
    dispatched_revision: u64,
    frames_published: u64,
    last_stats: Option<FrameStats>,
}

impl Orchestrator {
    pub fn new(config: &RelayConfig, renderer: impl TileRenderer) -> Result<Self> {
        config.validate()?;

        let grid = config.grid();
        let pool = WorkerPool::new(config.workers, Arc::new(renderer))?;
        info!(
            "orchestrator ready: {} workers in a {}x{} grid, max frame {}x{}",
            config.workers, grid.columns, grid.rows, config.max_width, config.max_height
        );

        Ok(Self {
            pool,
            dispatcher: FrameDispatcher::new(),
            tracker: CompletionTracker::new(),
            buffers: DoubleBuffer::new(FrameSize::new(grid.columns, grid.rows)),
            drive: DriveLoop::new(config.start_playing),
            grid,
            max_size: config.max_size(),
            param_revision: 0,
            dispatched_revision: 0,
            frames_published: 0,
            last_stats: None,
        })
    }

    pub fn play(&mut self) {
        self.drive.play();
    }

    pub fn pause(&mut self) {
        self.drive.pause();
    }

    pub fn toggle_play(&mut self) {
        self.drive.toggle_play();
    }

    pub fn interaction_start(&mut self) {
        self.drive.interaction_start();
    }

    pub fn interaction_end(&mut self) {
        self.drive.interaction_end();
    }

    /// Note that the parameter source changed
    ///
    /// Never schedules on its own; the next dispatched frame samples the
    /// source, whatever caused it to run.
    pub fn parameter_changed(&mut self) {
        self.param_revision += 1;
    }

    pub fn handle(&mut self, event: InputEvent) {
        match event {
            InputEvent::ParameterChanged => self.parameter_changed(),
            InputEvent::InteractionStart => self.interaction_start(),
            InputEvent::InteractionEnd => self.interaction_end(),
            InputEvent::PlayToggled => self.toggle_play(),
        }
    }

    /// Composite every finished tile, then dispatch the scheduled frame
    ///
    /// `now` must come from a monotonic clock shared by all calls.
    pub fn tick(&mut self, now: Duration, source: &dyn ParameterSource) -> Result<TickReport> {
        let mut report = TickReport::default();
        while let Some(result) = self.pool.try_recv() {
            if let Some(stats) = self.accept(result) {
                report.completed = Some(stats);
            }
        }
        report.dispatched = self.dispatch_scheduled(now, source)?;
        Ok(report)
    }

    /// Block until the in-flight frame is published or `timeout` passes
    pub fn wait_for_frame(&mut self, timeout: Duration) -> Option<FrameStats> {
        let deadline = Instant::now() + timeout;
        while self.tracker.is_in_flight() {
            let remaining = deadline.checked_duration_since(Instant::now())?;
            let result = self.pool.recv_timeout(remaining)?;
            if let Some(stats) = self.accept(result) {
                return Some(stats);
            }
        }
        None
    }

    fn accept(&mut self, result: TileResult) -> Option<FrameStats> {
        if self.tracker.on_tile_result(&mut self.buffers, result) != TileOutcome::FrameComplete {
            return None;
        }

        let session = self.tracker.session()?;
        let size = session.size();
        let stats = FrameStats {
            number: self.frames_published + 1,
            session: session.id(),
            width: size.width,
            height: size.height,
            elapsed: session.elapsed(),
            animation_time: session.request().animation_time,
            param_revision: self.dispatched_revision,
            dropped_results: self.tracker.dropped_results(),
        };

        self.buffers.swap();
        self.frames_published = stats.number;
        self.last_stats = Some(stats);

        let phase = self.drive.frame_complete();
        debug!(
            "frame {} ({}) published at {}x{} in {:.2} ms, next {:?}",
            stats.number,
            stats.session,
            stats.width,
            stats.height,
            stats.elapsed_ms(),
            phase
        );
        Some(stats)
    }

    fn dispatch_scheduled(
        &mut self,
        now: Duration,
        source: &dyn ParameterSource,
    ) -> Result<Option<SessionId>> {
        let Some(reason) = self.drive.scheduled() else {
            return Ok(None);
        };
        let Some(animation_time) = self.drive.begin_frame(now) else {
            return Ok(None);
        };

        let view = source.view_params();
        let size = FrameSize::fit(
            source.viewport(),
            view.resolution_factor,
            self.max_size,
            self.grid,
        );
        let frame = FrameRequest::new(size, &view, animation_time.as_secs_f32());
        let regions = plan(size.width, size.height, self.pool.size());
        let target = 1 - self.buffers.visible_index();
        self.buffers.prepare_write(size);

        match self
            .dispatcher
            .dispatch(frame, regions, &mut self.pool, target)
        {
            Ok(session) => {
                let id = session.id();
                self.tracker.begin(session);
                self.dispatched_revision = self.param_revision;
                Ok(Some(id))
            }
            Err(err) => {
                warn!("dispatch refused, frame rescheduled: {err}");
                self.drive.abort_frame(reason);
                Err(err)
            }
        }
    }

    /// Pixels of the surface currently on display
    pub fn visible_pixels(&self) -> &[u8] {
        self.buffers.visible().pixels()
    }

    pub fn visible_dimensions(&self) -> (u32, u32) {
        self.buffers.visible().dimensions()
    }

    /// Dispatch-to-swap time of the last published frame
    pub fn last_frame_time_ms(&self) -> Option<f64> {
        self.last_stats.map(|s| s.elapsed_ms())
    }

    pub fn last_stats(&self) -> Option<&FrameStats> {
        self.last_stats.as_ref()
    }

    pub fn frames_published(&self) -> u64 {
        self.frames_published
    }

    pub fn param_revision(&self) -> u64 {
        self.param_revision
    }

    pub fn dropped_results(&self) -> u64 {
        self.tracker.dropped_results()
    }

    pub fn phase(&self) -> DrivePhase {
        self.drive.phase()
    }

    pub fn drive_state(&self) -> &DriveState {
        self.drive.state()
    }
}

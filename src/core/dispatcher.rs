use log::debug;

use super::params::{FrameRequest, TileRequest};
use super::region::Region;
use super::session::{FrameSession, SessionId};
use super::worker_pool::WorkerPool;
use crate::error::{RelayError, Result};

/// Fans one frame out to the worker pool, region `i` to worker `i`
#[derive(Debug)]
pub struct FrameDispatcher {
    next_session: SessionId,
}

impl FrameDispatcher {
    pub fn new() -> Self {
        Self {
            next_session: SessionId(1),
        }
    }

    /// Send every tile of `frame` and return the session that tracks them
    ///
    /// Nothing is sent unless every worker is idle. If a worker disconnects
    /// partway through, the session id is retired anyway, so tiles already
    /// sent come back under a session the tracker never saw and are dropped.
    pub fn dispatch(
        &mut self,
        frame: FrameRequest,
        regions: Vec<Region>,
        pool: &mut WorkerPool,
        target_surface: usize,
    ) -> Result<FrameSession> {
        if regions.len() != pool.size() {
            return Err(RelayError::PlanMismatch {
                regions: regions.len(),
                workers: pool.size(),
            });
        }
        if let Some(worker) = (0..pool.size()).find(|&w| !pool.is_idle(w)) {
            let session = pool.outstanding(worker).map(|s| s.0).unwrap_or_default();
            return Err(RelayError::WorkerBusy { worker, session });
        }

        let id = self.next_session;
        self.next_session = id.next();
        for (worker, region) in regions.iter().enumerate() {
            debug_assert!(!region.is_empty(), "empty region planned for worker {worker}");
            pool.submit(TileRequest {
                session: id,
                worker,
                frame,
                region: *region,
            })?;
        }

        debug!(
            "dispatched session {id}: {}x{} in {} tiles",
            frame.width,
            frame.height,
            regions.len()
        );
        Ok(FrameSession::new(id, frame, regions, target_surface))
    }
}

impl Default for FrameDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

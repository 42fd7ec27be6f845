use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, unbounded, Receiver, RecvTimeoutError, Sender, TryRecvError};
use log::{debug, error};

use super::params::TileRequest;
use super::session::{SessionId, TileResult};
use crate::error::{RelayError, Result};

/// Pixel generator invoked by workers, one tile at a time
///
/// Must return a full-frame `width * height * 4` RGBA buffer whose bytes
/// inside `request.region` are valid.
pub trait TileRenderer: Send + Sync + 'static {
    fn render_tile(&self, request: &TileRequest) -> Vec<u8>;
}

impl<F> TileRenderer for F
where
    F: Fn(&TileRequest) -> Vec<u8> + Send + Sync + 'static,
{
    fn render_tile(&self, request: &TileRequest) -> Vec<u8> {
        self(request)
    }
}

struct Worker {
    requests: Option<Sender<TileRequest>>,
    handle: Option<JoinHandle<()>>,
    outstanding: Option<SessionId>,
}

/// Fixed set of render threads
///
/// Each worker owns a request channel holding at most one tile; every worker
/// answers on a shared result channel. Workers keep no state between tiles.
pub struct WorkerPool {
    workers: Vec<Worker>,
    results: Receiver<TileResult>,
}

impl WorkerPool {
    pub fn new(size: usize, renderer: Arc<dyn TileRenderer>) -> Result<Self> {
        let (result_tx, results) = unbounded();
        let mut workers = Vec::with_capacity(size);

        for index in 0..size {
            let (request_tx, request_rx) = bounded::<TileRequest>(1);
            let result_tx = result_tx.clone();
            let renderer = Arc::clone(&renderer);

            let handle = thread::Builder::new()
                .name(format!("tile-worker-{index}"))
                .spawn(move || worker_loop(index, renderer, request_rx, result_tx))
                .map_err(|source| RelayError::SpawnWorker {
                    worker: index,
                    source,
                })?;

            workers.push(Worker {
                requests: Some(request_tx),
                handle: Some(handle),
                outstanding: None,
            });
        }

        debug!("worker pool started with {size} workers");
        Ok(Self { workers, results })
    }

    pub fn size(&self) -> usize {
        self.workers.len()
    }

    /// Session the worker still owes a tile to, if any
    pub fn outstanding(&self, worker: usize) -> Option<SessionId> {
        self.workers.get(worker).and_then(|w| w.outstanding)
    }

    pub fn is_idle(&self, worker: usize) -> bool {
        self.outstanding(worker).is_none()
    }

    pub fn all_idle(&self) -> bool {
        self.workers.iter().all(|w| w.outstanding.is_none())
    }

    /// Hand a tile to `request.worker`
    ///
    /// Refuses a worker that has not answered its previous request.
    pub fn submit(&mut self, request: TileRequest) -> Result<()> {
        let index = request.worker;
        let worker = self
            .workers
            .get_mut(index)
            .ok_or(RelayError::WorkerDisconnected(index))?;

        if let Some(session) = worker.outstanding {
            return Err(RelayError::WorkerBusy {
                worker: index,
                session: session.0,
            });
        }

        let sender = worker
            .requests
            .as_ref()
            .ok_or(RelayError::WorkerDisconnected(index))?;
        sender
            .send(request)
            .map_err(|_| RelayError::WorkerDisconnected(index))?;

        worker.outstanding = Some(request.session);
        Ok(())
    }

    /// Next finished tile, if one is waiting
    pub fn try_recv(&mut self) -> Option<TileResult> {
        match self.results.try_recv() {
            Ok(result) => Some(self.release(result)),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    /// Wait up to `timeout` for the next finished tile
    pub fn recv_timeout(&mut self, timeout: Duration) -> Option<TileResult> {
        match self.results.recv_timeout(timeout) {
            Ok(result) => Some(self.release(result)),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }

    /// Close a worker's request channel so later submits to it fail
    #[cfg(test)]
    pub(crate) fn disconnect(&mut self, worker: usize) {
        if let Some(w) = self.workers.get_mut(worker) {
            w.requests.take();
        }
    }

    fn release(&mut self, result: TileResult) -> TileResult {
        if let Some(worker) = self.workers.get_mut(result.worker) {
            if worker.outstanding == Some(result.session) {
                worker.outstanding = None;
            }
        }
        result
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        for worker in &mut self.workers {
            worker.requests.take();
        }
        for (index, worker) in self.workers.iter_mut().enumerate() {
            if let Some(handle) = worker.handle.take() {
                if handle.join().is_err() {
                    error!("tile worker {index} panicked");
                }
            }
        }
    }
}

fn worker_loop(
    index: usize,
    renderer: Arc<dyn TileRenderer>,
    requests: Receiver<TileRequest>,
    results: Sender<TileResult>,
) {
    for request in requests.iter() {
        let pixels = renderer.render_tile(&request);
        let result = TileResult {
            session: request.session,
            worker: index,
            region: request.region,
            pixels,
        };
        if results.send(result).is_err() {
            break;
        }
    }
    debug!("tile worker {index} exiting");
}

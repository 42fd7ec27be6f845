use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by the orchestration layer
///
/// Tile results that arrive for the wrong session are not errors; the
/// completion tracker drops and counts them instead.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("failed to read config file {path:?}")]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path:?}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("worker {worker} still owes a tile for session {session}")]
    WorkerBusy { worker: usize, session: u64 },

    #[error("planned {regions} regions for {workers} workers")]
    PlanMismatch { regions: usize, workers: usize },

    #[error("worker {0} is no longer accepting requests")]
    WorkerDisconnected(usize),

    #[error("failed to spawn worker {worker}")]
    SpawnWorker {
        worker: usize,
        #[source]
        source: std::io::Error,
    },

    #[error("presenter failure: {0}")]
    Present(String),
}

pub type Result<T> = std::result::Result<T, RelayError>;

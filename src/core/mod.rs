pub mod clock;
pub mod controller;
pub mod dispatcher;
pub mod drive;
pub mod frame;
pub mod orchestrator;
pub mod params;
pub mod region;
pub mod session;
pub mod surface;
pub mod worker_pool;

pub use clock::FrameClock;
pub use controller::{InputEvent, ParameterSource, ViewControls};
pub use dispatcher::FrameDispatcher;
pub use drive::{DriveLoop, DrivePhase, DriveState, ScheduleReason};
pub use frame::FrameStats;
pub use orchestrator::{Orchestrator, TickReport};
pub use params::{FrameRequest, FrameSize, TileRequest, ViewParams};
pub use region::{plan, Region, TileGrid};
pub use session::{
    CompletionTracker, DropReason, FrameSession, SessionId, TileOutcome, TileResult,
};
pub use surface::{DoubleBuffer, Surface};
pub use worker_pool::{TileRenderer, WorkerPool};

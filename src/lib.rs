pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod input_adapter;
pub mod present;
pub mod scenes;

pub use config::RelayConfig;
pub use error::{RelayError, Result};

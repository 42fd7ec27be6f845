// cli.rs - Command-line interface configuration
use std::path::PathBuf;

use clap::Parser;

use crate::config::RelayConfig;
use crate::error::Result;

#[derive(Parser, Debug, Clone)]
#[command(name = "tile-relay")]
#[command(about = "Tiled multi-threaded frame renderer", long_about = None)]
pub struct Cli {
    /// JSON config file; flags below override its values
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Number of render workers (one tile each)
    #[arg(long)]
    pub workers: Option<usize>,

    /// Start with the animation paused
    #[arg(long, default_value = "false")]
    pub paused: bool,

    /// Render without a window and print frame timings
    #[arg(long, default_value = "false")]
    pub headless: bool,

    /// Frames to render in headless mode
    #[arg(long, default_value = "60")]
    pub frames: u64,

    /// Viewport width in headless mode
    #[arg(long, default_value = "800")]
    pub width: u32,

    /// Viewport height in headless mode
    #[arg(long, default_value = "600")]
    pub height: u32,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, default_value = "false")]
    pub verbose: bool,
}

impl Cli {
    /// Load the config file, if any, and apply flag overrides
    pub fn resolve_config(&self) -> Result<RelayConfig> {
        let mut config = match &self.config {
            Some(path) => RelayConfig::from_json_file(path)?,
            None => RelayConfig::default(),
        };
        if let Some(workers) = self.workers {
            config.workers = workers;
        }
        if self.paused {
            config.start_playing = false;
        }
        config.validate()?;
        Ok(config)
    }
}

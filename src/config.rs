use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::{TileGrid, ViewParams};
use crate::error::{RelayError, Result};

pub const DEFAULT_WORKERS: usize = 4;
pub const DEFAULT_MAX_WIDTH: u32 = 2 * 1920;
pub const DEFAULT_MAX_HEIGHT: u32 = 2 * 1080;

/// Orchestrator settings, loadable from JSON
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Worker threads, and therefore tiles per frame
    pub workers: usize,
    pub max_width: u32,
    pub max_height: u32,
    pub start_playing: bool,
    /// Initial view parameters
    pub view: ViewParams,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            max_width: DEFAULT_MAX_WIDTH,
            max_height: DEFAULT_MAX_HEIGHT,
            start_playing: true,
            view: ViewParams::default(),
        }
    }
}

impl RelayConfig {
    /// Read, parse and validate a JSON config file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| RelayError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self =
            serde_json::from_str(&text).map_err(|source| RelayError::ConfigParse {
                path: path.to_path_buf(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    pub fn grid(&self) -> TileGrid {
        TileGrid::for_tile_count(self.workers)
    }

    pub fn max_size(&self) -> (u32, u32) {
        (self.max_width, self.max_height)
    }

    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(RelayError::Config("workers must be at least 1".into()));
        }

        let grid = self.grid();
        if self.max_width < grid.columns || self.max_height < grid.rows {
            return Err(RelayError::Config(format!(
                "max size {}x{} cannot hold a {}x{} tile grid",
                self.max_width, self.max_height, grid.columns, grid.rows
            )));
        }

        let factor = self.view.resolution_factor;
        if !factor.is_finite() || factor <= 0.0 {
            return Err(RelayError::Config(format!(
                "resolution_factor must be positive, got {factor}"
            )));
        }

        let fov = self.view.field_of_view;
        if !(fov > 0.0 && fov < std::f32::consts::PI) {
            return Err(RelayError::Config(format!(
                "field_of_view must be within (0, pi) radians, got {fov}"
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = RelayConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_size(), (3840, 2160));
        assert_eq!(config.grid(), TileGrid { columns: 2, rows: 2 });
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config: RelayConfig =
            serde_json::from_str(r#"{ "workers": 6, "view": { "supersampling": true } }"#)
                .unwrap();
        assert_eq!(config.workers, 6);
        assert_eq!(config.max_width, DEFAULT_MAX_WIDTH);
        assert!(config.view.supersampling);
        assert_eq!(config.view.resolution_factor, 1.0);
    }

    #[test]
    fn test_rejects_zero_workers() {
        let config = RelayConfig {
            workers: 0,
            ..RelayConfig::default()
        };
        assert!(matches!(config.validate(), Err(RelayError::Config(_))));
    }

    #[test]
    fn test_rejects_cap_smaller_than_grid() {
        let config = RelayConfig {
            workers: 9,
            max_width: 2,
            ..RelayConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_bad_view() {
        let mut config = RelayConfig::default();
        config.view.resolution_factor = 0.0;
        assert!(config.validate().is_err());

        let mut config = RelayConfig::default();
        config.view.field_of_view = 4.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_file_reports_path() {
        let err = RelayConfig::from_json_file("/nonexistent/relay.json").unwrap_err();
        assert!(matches!(err, RelayError::ConfigIo { .. }));
        assert!(err.to_string().contains("relay.json"));
    }

    #[test]
    fn test_file_round_trip() {
        let path = std::env::temp_dir().join(format!("tile-relay-config-{}.json", std::process::id()));
        let original = RelayConfig {
            workers: 2,
            start_playing: false,
            ..RelayConfig::default()
        };
        std::fs::write(&path, serde_json::to_string_pretty(&original).unwrap()).unwrap();

        let loaded = RelayConfig::from_json_file(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(loaded, original);
    }
}

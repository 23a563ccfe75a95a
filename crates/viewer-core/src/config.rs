//! Viewer configuration.
//!
//! Layered as defaults, then an optional YAML file, then `GRIBVIEW_*`
//! environment variables. Command-line flags are applied last by the host.

use std::path::{Path, PathBuf};

use gribview_common::ConfigError;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Window size the canvas is carved out of.
const DEFAULT_WINDOW_WIDTH: f64 = 1280.0;
const DEFAULT_WINDOW_HEIGHT: f64 = 800.0;
/// Side panel on the left of the canvas.
const SIDE_PANEL_WIDTH: f64 = 350.0;
/// Status bar below the canvas.
const STATUS_BAR_HEIGHT: f64 = 30.0;

/// Configuration for a viewer session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Initial colormap name; unknown names render grey.
    pub colormap: String,

    /// Extra colormaps to load, as a JSON colormap file.
    pub colormap_file: Option<PathBuf>,

    /// Recompute the color range from every newly rendered record.
    pub auto_fit: bool,

    /// Color range used until auto-fit replaces it.
    pub value_min: f64,
    pub value_max: f64,

    /// Attribute columns shown in the record table; `index` is always first.
    pub columns: Vec<String>,

    /// Drawable canvas size in pixels.
    pub canvas_width: f64,
    pub canvas_height: f64,

    /// Relative zoom change per wheel notch.
    pub zoom_step: f64,

    /// Decimal places for values in CSV output.
    pub csv_precision: usize,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            colormap: "jet".to_string(),
            colormap_file: None,
            auto_fit: true,
            value_min: 0.0,
            value_max: 1.0,
            columns: vec![
                "index".to_string(),
                "level".to_string(),
                "shortName".to_string(),
                "dataDate".to_string(),
            ],
            canvas_width: DEFAULT_WINDOW_WIDTH - SIDE_PANEL_WIDTH,
            canvas_height: DEFAULT_WINDOW_HEIGHT - STATUS_BAR_HEIGHT,
            zoom_step: 0.1,
            csv_precision: 6,
        }
    }
}

impl ViewerConfig {
    /// Load a YAML file; keys it leaves out keep their defaults.
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let config: Self = serde_yaml::from_str(&contents).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        debug!(path = %path.display(), "Loaded viewer config");
        Ok(config)
    }

    /// Load configuration from environment variables over the defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env();
        config
    }

    /// Override fields from `GRIBVIEW_*` environment variables.
    ///
    /// Unparseable values are logged and ignored.
    pub fn apply_env(&mut self) {
        if let Ok(val) = std::env::var("GRIBVIEW_COLORMAP") {
            self.colormap = val;
        }

        if let Ok(val) = std::env::var("GRIBVIEW_COLORMAP_FILE") {
            self.colormap_file = Some(PathBuf::from(val));
        }

        if let Ok(val) = std::env::var("GRIBVIEW_AUTO_FIT") {
            self.auto_fit = val.to_lowercase() == "true" || val == "1";
        }

        parse_env("GRIBVIEW_VALUE_MIN", &mut self.value_min);
        parse_env("GRIBVIEW_VALUE_MAX", &mut self.value_max);

        if let Ok(val) = std::env::var("GRIBVIEW_COLUMNS") {
            self.columns = val
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect();
        }

        parse_env("GRIBVIEW_CANVAS_WIDTH", &mut self.canvas_width);
        parse_env("GRIBVIEW_CANVAS_HEIGHT", &mut self.canvas_height);
        parse_env("GRIBVIEW_ZOOM_STEP", &mut self.zoom_step);
        parse_env("GRIBVIEW_CSV_PRECISION", &mut self.csv_precision);
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.canvas_width > 0.0 && self.canvas_height > 0.0) {
            return Err(ConfigError::InvalidValue {
                key: "canvas_width/canvas_height".to_string(),
                message: format!(
                    "canvas must be positive, got {}x{}",
                    self.canvas_width, self.canvas_height
                ),
            });
        }

        if !(self.zoom_step > 0.0 && self.zoom_step < 1.0) {
            return Err(ConfigError::InvalidValue {
                key: "zoom_step".to_string(),
                message: format!("must be in (0, 1), got {}", self.zoom_step),
            });
        }

        if self.csv_precision > 17 {
            return Err(ConfigError::InvalidValue {
                key: "csv_precision".to_string(),
                message: format!("at most 17 decimal places, got {}", self.csv_precision),
            });
        }

        Ok(())
    }

    /// Displayed columns with `index` forced to the front exactly once.
    pub fn normalized_columns(&self) -> Vec<String> {
        let mut columns = vec!["index".to_string()];
        for column in &self.columns {
            if column != "index" && !columns.contains(column) {
                columns.push(column.clone());
            }
        }
        columns
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, target: &mut T) {
    if let Ok(val) = std::env::var(key) {
        match val.parse() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(key = key, value = %val, "Ignoring unparseable environment value"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ViewerConfig::default();
        assert_eq!(config.colormap, "jet");
        assert!(config.auto_fit);
        assert_eq!(config.canvas_width, 930.0);
        assert_eq!(config.canvas_height, 770.0);
        assert_eq!(config.columns, vec!["index", "level", "shortName", "dataDate"]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_yaml_partial_override() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("viewer.yaml");
        std::fs::write(&path, "colormap: viridis\nzoom_step: 0.25\ncolumns: [shortName, index]\n").unwrap();

        let config = ViewerConfig::from_yaml_file(&path).unwrap();
        assert_eq!(config.colormap, "viridis");
        assert_eq!(config.zoom_step, 0.25);
        assert!(config.auto_fit);
        assert_eq!(config.normalized_columns(), vec!["index", "shortName"]);
    }

    #[test]
    fn test_yaml_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = ViewerConfig::from_yaml_file(dir.path().join("none.yaml"));
        assert!(matches!(missing, Err(ConfigError::Read { .. })));

        let path = dir.path().join("bad.yaml");
        std::fs::write(&path, "zoom_step: [1, 2]\n").unwrap();
        assert!(ViewerConfig::from_yaml_file(&path).is_err());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = ViewerConfig {
            zoom_step: 1.5,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        config.zoom_step = 0.1;
        config.canvas_width = 0.0;
        assert!(config.validate().is_err());
    }
}

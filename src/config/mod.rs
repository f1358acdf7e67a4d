use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::mesh::{GridOrigin, GridRounding};
use crate::vfm::pipeline::DEFAULT_GRID_M;

pub const DEFAULT_BASE_AMOUNT: f64 = 100.0;
pub const DEFAULT_RANGE_PERCENT: f64 = 20.0;

fn default_grid() -> f64 {
    DEFAULT_GRID_M
}
fn default_buffer() -> f64 {
    0.0
}
fn default_base_amount() -> f64 {
    DEFAULT_BASE_AMOUNT
}
fn default_range() -> f64 {
    DEFAULT_RANGE_PERCENT
}
fn default_true() -> bool {
    true
}
fn default_verbose() -> bool {
    false
}

/// Settings read from `vfmap.toml`
///
/// Grid and application settings sit at the top level; the raster service
/// has its own `[raster]` table.
#[derive(Debug, Deserialize)]
pub struct FileConfig {
    #[serde(default = "default_grid")]
    pub grid_ew: f64,
    #[serde(default = "default_grid")]
    pub grid_ns: f64,
    #[serde(default = "default_buffer")]
    pub buffer: f64,
    #[serde(default)]
    pub origin: GridOrigin,
    #[serde(default)]
    pub rounding: GridRounding,
    #[serde(default)]
    pub max_cells: Option<usize>,
    #[serde(default = "default_base_amount")]
    pub base_amount: f64,
    #[serde(default = "default_range")]
    pub range: f64,
    /// Five-step distribution; `false` selects the stepless one
    #[serde(default = "default_true")]
    pub five_steps: bool,
    #[serde(default = "default_true")]
    pub interpolate_missing: bool,
    #[serde(default)]
    pub output: Option<PathBuf>,
    #[serde(default = "default_verbose")]
    pub verbose: bool,
    #[serde(default)]
    pub raster: Option<RasterConfig>,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            grid_ew: default_grid(),
            grid_ns: default_grid(),
            buffer: default_buffer(),
            origin: GridOrigin::default(),
            rounding: GridRounding::default(),
            max_cells: None,
            base_amount: default_base_amount(),
            range: default_range(),
            five_steps: true,
            interpolate_missing: true,
            output: None,
            verbose: default_verbose(),
            raster: None,
        }
    }
}

fn default_band() -> usize {
    0
}

fn default_timeout_secs() -> u64 {
    60
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct RasterConfig {
    /// HTTP endpoint serving raster windows
    #[serde(default)]
    pub url: Option<String>,
    /// Local grid file, used when no URL is set
    #[serde(default)]
    pub file: Option<PathBuf>,
    #[serde(default = "default_band")]
    pub band: usize,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for RasterConfig {
    fn default() -> Self {
        Self {
            url: None,
            file: None,
            band: default_band(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl FileConfig {
    /// First config file found in the search paths, if any parses
    pub fn load() -> Option<Self> {
        for path in get_config_paths() {
            if path.exists()
                && let Ok(contents) = std::fs::read_to_string(&path)
            {
                match toml::from_str(&contents) {
                    Ok(config) => return Some(config),
                    Err(e) => {
                        tracing::warn!("failed to parse config file {:?}: {}", path, e);
                    }
                }
            }
        }
        None
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(toml::from_str(&contents)?)
    }

    pub fn raster(&self) -> RasterConfig {
        self.raster.clone().unwrap_or_default()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

fn get_config_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    paths.push(PathBuf::from("vfmap.toml"));
    paths.push(PathBuf::from(".vfmap.toml"));

    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join("vfmap").join("config.toml"));
    }

    if let Some(home) = dirs::home_dir() {
        paths.push(home.join(".vfmap.toml"));
    }

    paths
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: FileConfig = toml::from_str("").unwrap();

        assert_eq!(config.grid_ew, 20.0);
        assert_eq!(config.grid_ns, 20.0);
        assert_eq!(config.buffer, 0.0);
        assert_eq!(config.origin, GridOrigin::NorthWest);
        assert_eq!(config.rounding, GridRounding::Floor);
        assert_eq!(config.base_amount, 100.0);
        assert_eq!(config.range, 20.0);
        assert!(config.five_steps);
        assert!(config.interpolate_missing);
        assert_eq!(config.raster(), RasterConfig::default());
    }

    #[test]
    fn test_parse_full_config() {
        let config: FileConfig = toml::from_str(
            r#"
            grid_ew = 15.0
            grid_ns = 25.0
            buffer = 5.0
            origin = "se"
            rounding = "ceil"
            max_cells = 2000
            base_amount = 60.0
            range = 30.0
            five_steps = false
            interpolate_missing = false

            [raster]
            url = "https://example.org/humus"
            band = 2
            timeout_secs = 15
            "#,
        )
        .unwrap();

        assert_eq!(config.grid_ew, 15.0);
        assert_eq!(config.grid_ns, 25.0);
        assert_eq!(config.origin, GridOrigin::SouthEast);
        assert_eq!(config.rounding, GridRounding::Ceil);
        assert_eq!(config.max_cells, Some(2000));
        assert!(!config.five_steps);
        assert!(!config.interpolate_missing);

        let raster = config.raster();
        assert_eq!(raster.url.as_deref(), Some("https://example.org/humus"));
        assert_eq!(raster.band, 2);
        assert_eq!(raster.timeout_secs, 15);
        assert!(raster.file.is_none());
    }

    #[test]
    fn test_unknown_origin_is_rejected() {
        let result: Result<FileConfig, _> = toml::from_str(r#"origin = "north""#);
        assert!(result.is_err());
    }

    #[test]
    fn test_config_paths() {
        let paths = get_config_paths();
        assert_eq!(paths[0], PathBuf::from("vfmap.toml"));
        assert_eq!(paths[1], PathBuf::from(".vfmap.toml"));
    }
}

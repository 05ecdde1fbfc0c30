use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::store::Coordinates;

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub library: LibraryConfig,

    #[serde(default)]
    pub map: MapConfig,

    #[serde(default)]
    pub capture: CaptureConfig,

    #[serde(default)]
    pub log: LogConfig,
}

/// What a failed write reports to its caller.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum Durability {
    /// Log the failure and carry on.
    #[default]
    BestEffort,
    /// Return the failure.
    Strict,
}

/// How record keys are derived from the clock.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum KeyMode {
    /// Bump past the newest issued key, including keys already in the store.
    #[default]
    Monotonic,
    /// Raw wall-clock milliseconds; same-millisecond writes share a key.
    Timestamp,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoreConfig {
    #[serde(default = "default_store_path")]
    pub path: PathBuf,

    #[serde(default)]
    pub durability: Durability,

    #[serde(default)]
    pub keys: KeyMode,
}

fn default_store_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("snapmap")
        .join("photos.db")
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
            durability: Durability::default(),
            keys: KeyMode::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LibraryConfig {
    /// Upper bound on how stale the library view may get between change events.
    #[serde(default = "default_refresh_interval_secs")]
    pub refresh_interval_secs: u64,
}

fn default_refresh_interval_secs() -> u64 {
    5
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            refresh_interval_secs: default_refresh_interval_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MapConfig {
    #[serde(default = "default_latitude_delta")]
    pub latitude_delta: f64,

    #[serde(default = "default_longitude_delta")]
    pub longitude_delta: f64,
}

fn default_latitude_delta() -> f64 {
    0.0922
}

fn default_longitude_delta() -> f64 {
    0.0421
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            latitude_delta: default_latitude_delta(),
            longitude_delta: default_longitude_delta(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CaptureConfig {
    #[serde(default = "default_image_extensions")]
    pub image_extensions: Vec<String>,

    /// Used when neither explicit coordinates nor EXIF GPS data are available.
    #[serde(default)]
    pub location_fallback: Option<Coordinates>,
}

fn default_image_extensions() -> Vec<String> {
    vec![
        "jpg".to_string(),
        "jpeg".to_string(),
        "png".to_string(),
        "heic".to_string(),
        "heif".to_string(),
        "webp".to_string(),
    ]
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            image_extensions: default_image_extensions(),
            location_fallback: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LogConfig {
    /// Filter directive; `SNAPMAP_LOG` takes precedence.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Prefer systemd-journald where available.
    #[serde(default = "default_true")]
    pub journald: bool,

    /// Rolling log file location; defaults under the data directory.
    #[serde(default)]
    pub directory: Option<PathBuf>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            journald: true,
            directory: None,
        }
    }
}

impl LogConfig {
    pub fn log_dir(&self) -> PathBuf {
        self.directory.clone().unwrap_or_else(|| {
            dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("snapmap")
                .join("logs")
        })
    }
}

impl Config {
    /// Load from `SNAPMAP_CONFIG` or the default location, creating the
    /// default file when none exists yet.
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            let config = Config::default();
            config.save_to(&config_path)?;
            Ok(config)
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        Ok(())
    }

    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("snapmap")
    }

    fn config_path() -> PathBuf {
        if let Ok(path) = std::env::var("SNAPMAP_CONFIG") {
            return PathBuf::from(path);
        }
        Self::config_dir().join("config.toml")
    }
}

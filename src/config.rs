//! ==============================================================================
//! config.rs - Runtime Configuration Loader
//! ==============================================================================
//!
//! purpose:
//!     defines the schema for `airsense.toml`.
//!     loads configuration from file or falls back to defaults.
//!
//! structure:
//!     - ServerConfig: listen address and the dashboard's static asset dir.
//!     - StorageConfig: which ReadingStore backend to use and where.
//!     - AnalysisConfig: default time window for stats/analysis queries.
//!     - LoggingConfig: tracing filter and whether to log every reading.
//!
//! alert thresholds are not configurable; they live as
//! constants next to the rules that use them (analysis/).
//!
//! ==============================================================================

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Root configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
pub struct HubConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    pub static_dir: PathBuf,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Sqlite,
    Memory,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub database_url: String,
    pub max_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AnalysisConfig {
    /// window used when a request gives no (or a non-positive) `hours`
    pub default_hours: i64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub show_sensor_data: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8080".to_string(),
            static_dir: PathBuf::from("web").join("dist"),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Sqlite,
            database_url: "sqlite://sensor.db?mode=rwc".to_string(),
            max_connections: 5,
        }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self { default_hours: 24 }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), show_sensor_data: true }
    }
}

/// where the active configuration came from, reported once logging is up
#[derive(Debug)]
pub enum ConfigSource {
    File(PathBuf),
    /// no file was found
    Defaults,
    /// a file was found but could not be used
    Rejected { path: PathBuf, error: String },
}

impl HubConfig {
    /// Load configuration from file
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| anyhow::anyhow!("Failed to read config file: {}", e))?;

        let config: HubConfig = toml::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse config: {}", e))?;

        Ok(config)
    }

    /// Load with default fallback
    ///
    /// the tracing subscriber is configured from the result, so this cannot
    /// log itself; the caller reports the returned source instead.
    pub fn load_or_default() -> (Self, ConfigSource) {
        let paths = [
            PathBuf::from("config").join("airsense.toml"),
            PathBuf::from("..").join("config").join("airsense.toml"),
        ];

        for path in paths {
            if path.exists() {
                return match Self::load(&path) {
                    Ok(config) => (config, ConfigSource::File(path)),
                    Err(e) => (
                        Self::default(),
                        ConfigSource::Rejected { path, error: format!("{:#}", e) },
                    ),
                };
            }
        }

        (Self::default(), ConfigSource::Defaults)
    }

    /// Log configuration summary
    pub fn log_summary(&self) {
        tracing::info!("[CONFIG] Bind: {}", self.server.bind);
        tracing::info!("[CONFIG] Static assets: {}", self.server.static_dir.display());
        match self.storage.backend {
            StorageBackend::Sqlite => {
                tracing::info!("[CONFIG] Storage: sqlite ({})", self.storage.database_url)
            }
            StorageBackend::Memory => tracing::info!("[CONFIG] Storage: memory (not persisted)"),
        }
        tracing::info!("[CONFIG] Default window: {}h", self.analysis.default_hours);
        tracing::info!("[CONFIG] Log level: {}", self.logging.level);
    }
}

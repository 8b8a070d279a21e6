//! Typed configuration.
//!
//! One JSON file, all sections optional; anything missing falls back to the
//! defaults below, so a missing file is a valid (all-default) configuration.
//! `MICROFICHE_CONFIG` points at an alternate file, and `MICROFICHE_BIND` /
//! `MICROFICHE_PORT` override the listen address without touching the file.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use crate::logging::LoggingConfig;

pub const DEFAULT_PORT: u16 = 3005;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to write config file {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    pub server: ServerConfig,
    pub archive: ArchiveConfig,
    pub converter: ConverterConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
        }
    }
}

/// Upstream API bases. All overridable so tests and mirrors can point the
/// service at local stubs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ArchiveConfig {
    pub metadata_base: String,
    pub search_base: String,
    pub cdx_base: String,
    pub services_base: String,
    /// Base for item thumbnail images, fed to the transcoder.
    pub thumb_base: String,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            metadata_base: "https://archive.org".to_string(),
            search_base: "https://archive.org".to_string(),
            cdx_base: "https://web.archive.org".to_string(),
            services_base: "https://archive.org/services".to_string(),
            thumb_base: "https://archive.org/services/img".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConverterConfig {
    /// Converter executable, resolved via PATH.
    pub program: String,
    /// Wall-clock limit for one conversion.
    pub convert_timeout_secs: u64,
    pub fetch_timeout_secs: u64,
    pub fetch_connect_timeout_secs: u64,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            program: "convert".to_string(),
            convert_timeout_secs: 60,
            fetch_timeout_secs: 30,
            fetch_connect_timeout_secs: 10,
        }
    }
}

/// Resolved config file location.
/// Priority: `MICROFICHE_CONFIG` > `<config dir>/microfiche/config.json`.
pub fn default_config_path() -> PathBuf {
    if let Ok(path) = env::var("MICROFICHE_CONFIG") {
        return PathBuf::from(path);
    }
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("microfiche")
        .join("config.json")
}

/// Loads configuration from the default path with env overrides applied.
pub fn load_config() -> Result<Config, ConfigError> {
    let mut config = load_config_from(&default_config_path())?;
    apply_env_overrides(&mut config);
    Ok(config)
}

/// Loads configuration from an explicit path. A missing file is the
/// all-default configuration, not an error.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Ok(Config::default());
    }
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.display().to_string(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.display().to_string(),
        source,
    })
}

fn apply_env_overrides(config: &mut Config) {
    if let Ok(bind) = env::var("MICROFICHE_BIND") {
        config.server.bind = bind;
    }
    if let Some(port) = env::var("MICROFICHE_PORT")
        .ok()
        .and_then(|p| p.parse::<u16>().ok())
    {
        config.server.port = port;
    }
}

/// Writes the config atomically: temp file in the same directory, then
/// rename over the target.
pub fn persist_config_file(path: &Path, config: &Config) -> Result<(), ConfigError> {
    let write_err = |source: std::io::Error| ConfigError::Write {
        path: path.display().to_string(),
        source,
    };

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(write_err)?;
    }
    // Pretty-print with serde; the struct always serializes.
    let body = serde_json::to_string_pretty(config)
        .map_err(|e| write_err(std::io::Error::other(e)))?;

    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, body).map_err(write_err)?;
    fs::rename(&tmp, path).map_err(write_err)?;
    Ok(())
}

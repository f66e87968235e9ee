//! Configuration loading and management.
//!
//! [`ServerConfig`] holds everything needed to launch a Tika server process.
//! It can be built programmatically, or loaded from TOML, YAML or JSON files,
//! and `discover()` searches the current directory and its parents for a
//! `tika.toml`.

use crate::{Result, TikaError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

/// Default port Tika Server listens on.
pub const DEFAULT_PORT: u16 = 9998;

/// Default hostname used to build the server URL.
pub const DEFAULT_HOSTNAME: &str = "localhost";

/// Default time to wait for a freshly launched server to answer `/version`.
pub const DEFAULT_STARTUP_TIMEOUT_SECS: u64 = 10;

/// Server launch configuration.
///
/// # Example
///
/// ```rust
/// use tika::ServerConfig;
///
/// let config = ServerConfig {
///     port: 9999,
///     ..Default::default()
/// };
/// assert_eq!(config.hostname, "localhost");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Hostname the server is reached on
    #[serde(default = "default_hostname")]
    pub hostname: String,

    /// Port passed to the server with `-p`
    #[serde(default = "default_port")]
    pub port: u16,

    /// How long `start()` waits for the server to become ready
    #[serde(default = "default_startup_timeout_secs")]
    pub startup_timeout_secs: u64,

    /// Java runtime used to run the archive
    #[serde(default = "default_java_path")]
    pub java_path: String,

    /// Java system properties, passed as `-Dkey=value`
    #[serde(default)]
    pub java_props: BTreeMap<String, String>,
}

fn default_hostname() -> String {
    DEFAULT_HOSTNAME.to_string()
}
fn default_port() -> u16 {
    DEFAULT_PORT
}
fn default_startup_timeout_secs() -> u64 {
    DEFAULT_STARTUP_TIMEOUT_SECS
}
fn default_java_path() -> String {
    "java".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            hostname: default_hostname(),
            port: default_port(),
            startup_timeout_secs: default_startup_timeout_secs(),
            java_path: default_java_path(),
            java_props: BTreeMap::new(),
        }
    }
}

impl ServerConfig {
    /// Startup timeout as a [`Duration`].
    pub fn startup_timeout(&self) -> Duration {
        Duration::from_secs(self.startup_timeout_secs)
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns `TikaError::Validation` if the file can't be read or is invalid TOML.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = read_config(path.as_ref())?;

        toml::from_str(&content)
            .map_err(|e| TikaError::validation(format!("Invalid TOML in {}: {}", path.as_ref().display(), e)))
    }

    /// Load configuration from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = read_config(path.as_ref())?;

        serde_yaml_ng::from_str(&content)
            .map_err(|e| TikaError::validation(format!("Invalid YAML in {}: {}", path.as_ref().display(), e)))
    }

    /// Load configuration from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = read_config(path.as_ref())?;

        serde_json::from_str(&content)
            .map_err(|e| TikaError::validation(format!("Invalid JSON in {}: {}", path.as_ref().display(), e)))
    }

    /// Load configuration, picking the format from the file extension.
    ///
    /// `.toml`, `.yaml`/`.yml` and `.json` are recognised.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase());

        match extension.as_deref() {
            Some("toml") => Self::from_toml_file(path),
            Some("yaml") | Some("yml") => Self::from_yaml_file(path),
            Some("json") => Self::from_json_file(path),
            _ => Err(TikaError::validation(format!(
                "Unsupported config file format: {} (expected .toml, .yaml, .yml or .json)",
                path.display()
            ))),
        }
    }

    /// Discover configuration file in parent directories.
    ///
    /// Searches for `tika.toml` in current directory and parent directories.
    ///
    /// # Returns
    ///
    /// - `Some(config)` if found
    /// - `None` if no config file found
    pub fn discover() -> Result<Option<Self>> {
        let current = std::env::current_dir().map_err(TikaError::Io)?;
        Self::discover_from(&current)
    }

    fn discover_from(start: &Path) -> Result<Option<Self>> {
        for dir in start.ancestors() {
            let candidate = dir.join("tika.toml");
            if candidate.exists() {
                tracing::debug!("Using server config from {}", candidate.display());
                return Ok(Some(Self::from_toml_file(candidate)?));
            }
        }

        Ok(None)
    }
}

fn read_config(path: &Path) -> Result<String> {
    std::fs::read_to_string(path)
        .map_err(|e| TikaError::validation(format!("Failed to read config file {}: {}", path.display(), e)))
}

//! Persistent client settings.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use ferry_ftp::{Config, TransferMode};

/// Settings read from `settings.json`.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Port used when the command line gives none.
    pub default_port: u16,
    /// Control and data connect timeout, in seconds.
    pub connect_timeout_secs: u64,
    /// Control reply timeout, in seconds.
    pub io_timeout_secs: u64,
    /// Initial transfer mode ("binary" or "ascii").
    #[serde(with = "transfer_mode_serde")]
    pub transfer_mode: TransferMode,
    /// Directory downloads are written to.
    pub download_dir: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_port: ferry_ftp::connection::DEFAULT_PORT,
            connect_timeout_secs: 30,
            io_timeout_secs: 60,
            transfer_mode: TransferMode::Binary,
            download_dir: PathBuf::from("."),
        }
    }
}

impl Settings {
    /// Builds the library configuration for `host`.
    ///
    /// `port` overrides `default_port` when given.
    pub fn to_config(&self, host: &str, port: Option<u16>) -> Config {
        Config::builder(host)
            .port(port.unwrap_or(self.default_port))
            .connect_timeout(Duration::from_secs(self.connect_timeout_secs))
            .io_timeout(Duration::from_secs(self.io_timeout_secs))
            .local_dir(self.download_dir.clone())
            .transfer_mode(self.transfer_mode)
            .build()
    }
}

/// Serde helpers for `TransferMode`, stored by name.
mod transfer_mode_serde {
    use ferry_ftp::TransferMode;
    use serde::{Deserialize, Deserializer, Serializer};

    #[allow(clippy::trivially_copy_pass_by_ref)] // Required by serde with= signature
    pub fn serialize<S>(mode: &TransferMode, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let s = match mode {
            TransferMode::Ascii => "ascii",
            TransferMode::Binary => "binary",
        };
        serializer.serialize_str(s)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<TransferMode, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Default location: `<config dir>/ferry/settings.json`.
pub fn default_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("ferry")
        .join("settings.json")
}

/// Loads settings from `path`, falling back to defaults if it does not exist.
pub async fn load(path: &Path) -> Result<Settings> {
    if !path.exists() {
        tracing::debug!("No settings at {}, using defaults", path.display());
        return Ok(Settings::default());
    }

    let contents = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading settings: {}", path.display()))?;
    let settings = serde_json::from_str(&contents)
        .with_context(|| format!("parsing settings: {}", path.display()))?;

    tracing::info!("Settings loaded from {}", path.display());
    Ok(settings)
}

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::constants::{DEFAULT_BACKEND_URL, DEFAULT_DEVICE_TAG};

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Backend endpoint every action is POSTed to
    #[serde(default = "default_backend_url")]
    pub backend_url: String,

    /// Where the saved session, offline cache and log live
    #[serde(default)]
    pub data_dir: Option<PathBuf>,

    /// Request timeout in seconds (no timeout when unset)
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,

    /// Sent as `dispositivo` with every registered session
    #[serde(default = "default_device_tag")]
    pub device_tag: String,
}

fn default_backend_url() -> String {
    DEFAULT_BACKEND_URL.to_string()
}

fn default_device_tag() -> String {
    DEFAULT_DEVICE_TAG.to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            backend_url: default_backend_url(),
            data_dir: None,
            request_timeout_secs: None,
            device_tag: default_device_tag(),
        }
    }
}

impl AppConfig {
    /// Default config file location
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("kine")
            .join("config.yaml")
    }

    /// Load config from `path`, falling back to defaults when the file is
    /// missing or unreadable
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            return AppConfig::default();
        }

        match std::fs::read_to_string(path) {
            Ok(content) => match serde_yaml::from_str(&content) {
                Ok(config) => return config,
                Err(e) => tracing::warn!("Failed to parse config {}: {}", path.display(), e),
            },
            Err(e) => tracing::warn!("Failed to read config {}: {}", path.display(), e),
        }

        AppConfig::default()
    }

    /// Resolved data directory
    pub fn data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".kine")
        })
    }
}

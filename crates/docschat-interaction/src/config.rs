//! Backend endpoint configuration.
//!
//! Supports reading settings from `~/.config/docschat/config.json`, with
//! environment-variable fallback for the backend URL.

use serde::Deserialize;
use std::env;
use std::fs;
use std::path::PathBuf;

/// Default backend base URL for local development.
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8000";

/// Default per-request timeout in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Backend gateway configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct BackendConfig {
    /// Base URL of the document-chat backend.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Per-request timeout in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_base_url() -> String {
    DEFAULT_BACKEND_URL.to_string()
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl BackendConfig {
    /// Loads configuration with the following priority:
    ///
    /// 1. `~/.config/docschat/config.json`
    /// 2. The `DOCSCHAT_BACKEND_URL` environment variable
    /// 3. Built-in defaults (`http://localhost:8000`, 30s timeout)
    ///
    /// A missing file is not an error; a malformed file is.
    pub fn load() -> Result<Self, String> {
        let mut config = match config_path() {
            Ok(path) if path.exists() => {
                let content = fs::read_to_string(&path).map_err(|e| {
                    format!(
                        "Failed to read configuration file at {}: {}",
                        path.display(),
                        e
                    )
                })?;
                serde_json::from_str(&content).map_err(|e| {
                    format!(
                        "Failed to parse configuration file at {}: {}",
                        path.display(),
                        e
                    )
                })?
            }
            _ => Self::default(),
        };

        if let Ok(url) = env::var("DOCSCHAT_BACKEND_URL") {
            config.base_url = url;
        }
        Ok(config)
    }

    /// Overrides the base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

/// Returns the path to the configuration file:
/// `~/.config/docschat/config.json`
fn config_path() -> Result<PathBuf, String> {
    let home = dirs::home_dir().ok_or_else(|| "Could not determine home directory".to_string())?;
    Ok(home.join(".config").join("docschat").join("config.json"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = BackendConfig::default();
        assert_eq!(config.base_url, DEFAULT_BACKEND_URL);
        assert_eq!(config.request_timeout_secs, DEFAULT_REQUEST_TIMEOUT_SECS);
    }

    #[test]
    fn test_partial_file_falls_back_to_defaults() {
        let config: BackendConfig =
            serde_json::from_str(r#"{ "base_url": "http://backend:9000" }"#).unwrap();
        assert_eq!(config.base_url, "http://backend:9000");
        assert_eq!(config.request_timeout_secs, DEFAULT_REQUEST_TIMEOUT_SECS);
    }

    #[test]
    fn test_builder_override() {
        let config = BackendConfig::default().with_base_url("http://other:1234");
        assert_eq!(config.base_url, "http://other:1234");
    }
}

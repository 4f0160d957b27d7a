//! Client configuration: API base URL and the on-disk config directory.

use crate::error::{Error, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const DEFAULT_API_URL: &str = "http://localhost:5000";
const API_URL_ENV: &str = "GURUDESK_API_URL";

/// Get the global GuruDesk directory for configuration and the saved token
pub fn global_config_dir() -> Result<PathBuf> {
    ProjectDirs::from("com", "gurudesk", "gurudesk")
        .map(|dirs| dirs.config_dir().to_path_buf())
        .ok_or_else(|| Error::Config("Could not determine home directory".to_string()))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the GuruDesk backend, e.g. `https://gurudesk.example.id`
    pub api_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
        }
    }
}

impl Config {
    /// Resolve configuration: explicit path, then env override, then the
    /// global config file, then defaults.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        let mut config = match explicit_path {
            Some(path) => Self::from_file(path)?,
            None => {
                let default_path = global_config_dir()?.join("config.toml");
                if default_path.exists() {
                    Self::from_file(&default_path)?
                } else {
                    Self::default()
                }
            }
        };

        if let Ok(url) = std::env::var(API_URL_ENV) {
            if !url.is_empty() {
                config.api_url = url;
            }
        }

        config.api_url = config.api_url.trim_end_matches('/').to_string();
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Cannot read config {}: {}", path.display(), e))
        })?;
        Ok(toml::from_str(&content)?)
    }

    /// Write the configuration to the global config file.
    pub fn save(&self) -> Result<PathBuf> {
        let dir = global_config_dir()?;
        std::fs::create_dir_all(&dir)?;
        let path = dir.join("config.toml");
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Cannot serialize config: {e}")))?;
        std::fs::write(&path, content)?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_api_url_is_localhost() {
        let config = Config::default();
        assert_eq!(config.api_url, "http://localhost:5000");
    }

    #[test]
    fn load_from_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "api_url = \"https://sekolah.example.id/\"\n").unwrap();
        let config = Config::load(Some(&path)).unwrap();
        // trailing slash is normalized away
        assert_eq!(config.api_url, "https://sekolah.example.id");
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let result = Config::load(Some(Path::new("/nonexistent/config.toml")));
        assert!(matches!(result, Err(Error::Config(_))));
    }
}

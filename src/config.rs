use dirs::home_dir;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

pub const DEFAULT_BASE_URL: &str = "https://home.trutankless.com";

/// Environment variable that overrides the location of the config file
pub const CONFIG_PATH_ENV: &str = "TRUTANKLESS_CONFIG";

/// Endpoint configuration handed to a `Session` when it is built
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    base_url: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

impl ApiConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn token_url(&self) -> String {
        format!("{}/api/dash-oauth/token", self.base_url)
    }

    pub fn locations_url(&self) -> String {
        format!("{}/api/dashboard/locations", self.base_url)
    }

    pub fn device_url(&self, device_id: &str) -> String {
        format!("{}/api/dashboard/devices/{}", self.base_url, device_id)
    }

    /// Build the HTTP client for a single call. It is dropped with the call,
    /// so no connection state outlives it.
    pub(crate) fn http_client(&self) -> Result<reqwest::Client> {
        Ok(reqwest::Client::builder().build()?)
    }
}

/// Configuration data stored in ~/.trutankless.yml
///
/// Only the account identity lives here; passwords and tokens are never written.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

impl Config {
    pub fn api_config(&self) -> ApiConfig {
        self.base_url
            .as_deref()
            .map(ApiConfig::new)
            .unwrap_or_default()
    }
}

/// Get the path to the configuration file (~/.trutankless.yml)
pub fn get_config_path() -> Result<PathBuf> {
    if let Some(path) = std::env::var_os(CONFIG_PATH_ENV) {
        return Ok(PathBuf::from(path));
    }
    let home = home_dir()
        .ok_or_else(|| Error::Config("Failed to determine home directory".to_string()))?;
    Ok(home.join(".trutankless.yml"))
}

pub fn load_config() -> Result<Config> {
    load_config_from(&get_config_path()?)
}

pub fn load_config_from(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Err(Error::Config(
            "Not logged in. Please run 'trutankless login' first.".to_string(),
        ));
    }

    let content = fs::read_to_string(path)?;
    let config: Config = serde_yaml::from_str(&content)?;
    debug!("Loaded configuration for user: {}", config.email);
    Ok(config)
}

pub fn save_config(config: &Config) -> Result<()> {
    save_config_to(&get_config_path()?, config)
}

pub fn save_config_to(path: &Path, config: &Config) -> Result<()> {
    let content = serde_yaml::to_string(config)?;
    fs::write(path, content)?;
    debug!("Saved configuration for user: {}", config.email);
    Ok(())
}

/// Clear the configuration file (logout)
pub fn clear_config() -> Result<()> {
    clear_config_at(&get_config_path()?)
}

pub fn clear_config_at(path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_file(path)?;
        debug!("Configuration file cleared");
    } else {
        warn!("Configuration file does not exist, nothing to clear");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_endpoint_urls() {
        let config = ApiConfig::default();
        assert_eq!(
            config.token_url(),
            "https://home.trutankless.com/api/dash-oauth/token"
        );
        assert_eq!(
            config.locations_url(),
            "https://home.trutankless.com/api/dashboard/locations"
        );
        assert_eq!(
            config.device_url("1061"),
            "https://home.trutankless.com/api/dashboard/devices/1061"
        );
    }

    #[test]
    fn test_trailing_slash_is_trimmed() {
        let config = ApiConfig::new("http://127.0.0.1:8080/");
        assert_eq!(config.base_url(), "http://127.0.0.1:8080");
        assert_eq!(
            config.locations_url(),
            "http://127.0.0.1:8080/api/dashboard/locations"
        );
    }

    #[test]
    fn test_config_roundtrip_through_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.yml");

        let config = Config {
            email: "user@example.com".to_string(),
            base_url: None,
        };
        save_config_to(&path, &config).unwrap();

        let yaml = fs::read_to_string(&path).unwrap();
        assert!(yaml.contains("email: user@example.com"));
        assert!(!yaml.contains("base_url"));
        assert!(!yaml.contains("password"));

        let loaded = load_config_from(&path).unwrap();
        assert_eq!(loaded, config);
        assert_eq!(loaded.api_config(), ApiConfig::default());

        clear_config_at(&path).unwrap();
        assert!(!path.exists());
        // Clearing twice is not an error
        clear_config_at(&path).unwrap();
    }

    #[test]
    fn test_load_missing_config() {
        let dir = tempdir().unwrap();
        let err = load_config_from(&dir.path().join("missing.yml")).unwrap_err();
        assert!(err.to_string().contains("Not logged in"));
    }

    #[test]
    fn test_custom_base_url_in_config() {
        let config = Config {
            email: "user@example.com".to_string(),
            base_url: Some("http://localhost:9000".to_string()),
        };
        assert_eq!(config.api_config().base_url(), "http://localhost:9000");
    }
}

//! Client configuration (`config.toml`)

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ledger::LedgerClient;
use crate::proposal::Account;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Config {
    /// Base URL of the ledger gateway
    #[serde(default = "default_api_endpoint")]
    pub api_endpoint: String,

    /// Connected account; read-only mode when unset
    #[serde(default)]
    pub account: Option<String>,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

fn default_api_endpoint() -> String {
    "http://localhost:3000/api".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_connect_timeout_secs() -> u64 {
    10
}

impl Default for Config {
    fn default() -> Self {
        Config {
            api_endpoint: default_api_endpoint(),
            account: None,
            request_timeout_secs: default_request_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

impl Config {
    /// Load from the default location, writing defaults on first run.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            let contents = fs::read_to_string(path)?;
            let config: Config = toml::from_str(&contents)?;
            log::debug!("Loaded config from {}", path.display());
            Ok(config)
        } else {
            let config = Config::default();
            config.save_to(path)?;
            log::info!("📝 Wrote default config to {}", path.display());
            Ok(config)
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("lct-governance")
            .join("config.toml")
    }

    pub fn account(&self) -> Option<Account> {
        self.account
            .as_deref()
            .filter(|a| !a.trim().is_empty())
            .map(Account::new)
    }

    pub fn ledger_client(&self) -> crate::Result<LedgerClient> {
        let client = LedgerClient::new(
            self.api_endpoint.clone(),
            Duration::from_secs(self.request_timeout_secs),
            Duration::from_secs(self.connect_timeout_secs),
        )?;
        Ok(match self.account() {
            Some(account) => client.with_account(account),
            None => client,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_load_writes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config, Config::default());
        assert!(path.exists());

        let reloaded = Config::load_from(&path).unwrap();
        assert_eq!(reloaded, config);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "account = \"0xF39F\"\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.api_endpoint, default_api_endpoint());
        assert_eq!(config.request_timeout_secs, 30);
        assert_eq!(config.account(), Some(Account::new("0xf39f")));
    }

    #[test]
    fn test_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "request_timeout_secs = \"soon\"").unwrap();

        assert!(matches!(Config::load_from(&path), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_blank_account_is_read_only() {
        let config = Config {
            account: Some("  ".to_string()),
            ..Config::default()
        };
        assert_eq!(config.account(), None);
        assert!(config.ledger_client().unwrap().account().is_none());
    }
}

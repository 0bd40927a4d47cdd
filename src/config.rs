//! Configuration management and secure token storage.
//!
//! Persistent settings live in an XDG-compliant TOML file. The GitHub token is
//! kept out of that file and resolved from the CLI flag, the environment or
//! the OS keyring (macOS Keychain, Windows Credential Manager, Linux
//! secret-service), in that order.

use anyhow::{Context, Result};

use keyring::{Entry, Error as KeyringError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, warn};

use crate::admin::{AdminGate, DEFAULT_ADMIN_PASSWORD};
use crate::storage::github::DEFAULT_DOCUMENT_PATH;
use crate::storage::{GithubSettings, SupabaseSettings};

/// Errors that can occur during config operations
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to determine config directory
    #[error("Unable to determine config directory")]
    ConfigDirNotFound,

    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse config file
    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Failed to serialize config
    #[error("Failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),

    /// Key is not one of [`CONFIG_KEYS`]
    #[error("Unknown config key: {0}")]
    UnknownKey(String),

    /// Keyring operation failed
    #[error("Keyring operation failed: {0}")]
    KeyringError(String),

    /// Generic error from anyhow
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Persistent settings
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Config {
    /// GitHub owner of the repository holding the palette document
    pub owner: Option<String>,

    /// Repository holding the palette document
    pub repo: Option<String>,

    /// Branch to read and commit to (repository default when unset)
    pub branch: Option<String>,

    /// Path of the palette document inside the repository
    pub path: Option<String>,

    /// Supabase project URL
    pub supabase_url: Option<String>,

    /// Shared admin-mode password
    pub admin_password: Option<String>,
}

/// Keys accepted by `config set` / `config unset`.
pub const CONFIG_KEYS: [&str; 6] = [
    "owner",
    "repo",
    "branch",
    "path",
    "supabase_url",
    "admin_password",
];

/// Service name for keyring entries
const KEYRING_SERVICE: &str = "palette-showcase";

/// Account name for GitHub token in keyring
const KEYRING_ACCOUNT: &str = "github-token";

pub const GITHUB_TOKEN_ENV: &str = "GITHUB_TOKEN";
pub const SUPABASE_URL_ENV: &str = "SUPABASE_URL";
pub const SUPABASE_KEY_ENV: &str = "SUPABASE_ANON_KEY";
/// Overrides the GitHub API base URI (used to target a mock server).
pub const GITHUB_API_BASE_ENV: &str = "OCTO_BASE";

/// Secure token storage abstraction
pub trait SecretStore {
    /// Get the stored GitHub token
    fn get_token(&self) -> Result<Option<String>, ConfigError>;

    /// Store a GitHub token securely
    fn set_token(&self, token: &str) -> Result<(), ConfigError>;

    /// Delete the stored GitHub token
    fn delete_token(&self) -> Result<(), ConfigError>;
}

/// Default implementation using the system keyring
pub struct KeyringStore {
    account: &'static str,
}

impl Default for KeyringStore {
    fn default() -> Self {
        Self {
            account: KEYRING_ACCOUNT,
        }
    }
}

impl KeyringStore {
    fn entry(&self) -> Result<Entry, ConfigError> {
        Entry::new(KEYRING_SERVICE, self.account).map_err(|e| {
            ConfigError::KeyringError(format!("Failed to create keyring entry: {e}"))
        })
    }
}

impl SecretStore for KeyringStore {
    fn get_token(&self) -> Result<Option<String>, ConfigError> {
        match self.entry()?.get_password() {
            Ok(token) => Ok(Some(token)),
            Err(KeyringError::NoEntry) => Ok(None),
            Err(e) => Err(ConfigError::KeyringError(format!(
                "Failed to retrieve token from keyring: {e}. Try setting {GITHUB_TOKEN_ENV} instead."
            ))),
        }
    }

    fn set_token(&self, token: &str) -> Result<(), ConfigError> {
        self.entry()?
            .set_password(token)
            .map_err(|e| ConfigError::KeyringError(format!("Failed to store token: {e}")))
    }

    fn delete_token(&self) -> Result<(), ConfigError> {
        match self.entry()?.delete_credential() {
            Ok(()) => Ok(()),
            Err(KeyringError::NoEntry) => Ok(()), // Already deleted
            Err(e) => Err(ConfigError::KeyringError(format!(
                "Failed to delete token: {e}"
            ))),
        }
    }
}

/// Get the path to the config file
pub fn config_file_path() -> Result<PathBuf, ConfigError> {
    let config_dir = dirs::config_dir().ok_or(ConfigError::ConfigDirNotFound)?;
    Ok(config_dir.join("palette-showcase").join("config.toml"))
}

/// Load configuration from file
pub fn load_config() -> Result<Config, ConfigError> {
    let config_path = config_file_path()?;

    if !config_path.exists() {
        return Ok(Config::default());
    }

    let content = fs::read_to_string(&config_path)
        .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

    if content.trim().is_empty() {
        return Ok(Config::default());
    }

    Ok(toml::from_str(&content)?)
}

/// Save configuration to file
pub fn save_config(config: &Config) -> Result<(), ConfigError> {
    let config_path = config_file_path()?;

    if let Some(parent) = config_path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config directory: {}", parent.display()))?;
    }

    let content = toml::to_string_pretty(config)?;
    fs::write(&config_path, content)
        .with_context(|| format!("Failed to write config file: {}", config_path.display()))?;

    Ok(())
}

fn config_slot<'a>(
    config: &'a mut Config,
    key: &str,
) -> Result<&'a mut Option<String>, ConfigError> {
    match key {
        "owner" => Ok(&mut config.owner),
        "repo" => Ok(&mut config.repo),
        "branch" => Ok(&mut config.branch),
        "path" => Ok(&mut config.path),
        "supabase_url" => Ok(&mut config.supabase_url),
        "admin_password" => Ok(&mut config.admin_password),
        _ => Err(ConfigError::UnknownKey(key.to_string())),
    }
}

/// Update a single config value
pub fn update_config_value(key: &str, value: &str) -> Result<(), ConfigError> {
    let mut config = load_config()?;
    *config_slot(&mut config, key)? = Some(value.to_string());
    save_config(&config)
}

/// Delete a config value (set it to None)
pub fn delete_config_value(key: &str) -> Result<(), ConfigError> {
    let mut config = load_config()?;
    *config_slot(&mut config, key)? = None;
    save_config(&config)
}

/// Get GitHub token following priority: CLI flag → env var → keyring → none
pub fn resolve_github_token(
    cli_token: Option<&str>,
    secret_store: &dyn SecretStore,
) -> Result<Option<String>, ConfigError> {
    if let Some(token) = cli_token {
        return Ok(Some(token.to_string()));
    }

    if let Ok(token) = std::env::var(GITHUB_TOKEN_ENV) {
        if !token.trim().is_empty() {
            return Ok(Some(token));
        }
    }

    secret_store.get_token()
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Command-line overrides that take precedence over the config file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub owner: Option<String>,
    pub repo: Option<String>,
    pub branch: Option<String>,
    pub token: Option<String>,
}

/// Everything needed to build the storage cascade and admin gate.
#[derive(Debug, Clone)]
pub struct Settings {
    pub github: GithubSettings,
    pub supabase: SupabaseSettings,
    pub admin_password: String,
}

impl Settings {
    /// Merge CLI overrides, environment and config file.
    ///
    /// Keyring failures are not fatal: the GitHub stage is simply left
    /// unconfigured.
    pub fn resolve(overrides: Overrides, config: Config, secret_store: &dyn SecretStore) -> Self {
        let token = match resolve_github_token(overrides.token.as_deref(), secret_store) {
            Ok(token) => token,
            Err(e) => {
                warn!(error = %e, "Could not read GitHub token from keyring");
                None
            }
        };

        let defaults = GithubSettings::default();
        let github = GithubSettings {
            owner: overrides.owner.or(config.owner).unwrap_or(defaults.owner),
            repo: overrides.repo.or(config.repo).unwrap_or(defaults.repo),
            branch: overrides.branch.or(config.branch),
            path: config
                .path
                .unwrap_or_else(|| DEFAULT_DOCUMENT_PATH.to_string()),
            token,
            api_base: non_empty_env(GITHUB_API_BASE_ENV),
        };

        let supabase = SupabaseSettings {
            url: non_empty_env(SUPABASE_URL_ENV).or(config.supabase_url),
            anon_key: non_empty_env(SUPABASE_KEY_ENV),
        };

        debug!(
            github = github.is_configured(),
            supabase = supabase.is_configured(),
            "Resolved storage settings"
        );

        Self {
            github,
            supabase,
            admin_password: config
                .admin_password
                .unwrap_or_else(|| DEFAULT_ADMIN_PASSWORD.to_string()),
        }
    }

    pub fn admin_gate(&self) -> AdminGate {
        AdminGate::new(self.admin_password.clone())
    }
}

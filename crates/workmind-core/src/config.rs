use crate::error::{Result, WorkmindError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level WorkMind configuration stored as TOML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkmindConfig {
    #[serde(default)]
    pub client: ClientSettings,
    #[serde(default)]
    pub server: ServerSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientSettings {
    /// Base URL of the WorkMind API.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Interval between document status polls, in milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Workspace used when a command does not name one.
    #[serde(default)]
    pub default_workspace: Option<String>,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            poll_interval_ms: default_poll_interval_ms(),
            default_workspace: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
    /// Path to the SQLite database holding workspaces, members and overrides.
    #[serde(default = "default_db_path")]
    pub db_path: String,
    #[serde(default = "default_jwt_secret")]
    pub jwt_secret: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            db_path: default_db_path(),
            jwt_secret: default_jwt_secret(),
        }
    }
}

fn default_base_url() -> String {
    "http://127.0.0.1:8400".to_string()
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_poll_interval_ms() -> u64 {
    3000
}
fn default_listen_addr() -> String {
    "127.0.0.1:8400".to_string()
}
fn default_db_path() -> String {
    "workmind.db".to_string()
}
fn default_jwt_secret() -> String {
    "workmind-jwt-secret-change-me".to_string()
}

impl WorkmindConfig {
    /// Load config from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(WorkmindError::ConfigNotFound(path.display().to_string()));
        }
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| WorkmindError::TomlDe(e.to_string()))
    }

    /// Load config, falling back to defaults when the file does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        match Self::load(path) {
            Err(WorkmindError::ConfigNotFound(_)) => {
                tracing::debug!("no config at {}, using defaults", path.display());
                let base_dir = path.parent().unwrap_or(Path::new("."));
                Ok(Self::default_config(base_dir))
            }
            other => other,
        }
    }

    /// Save config to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| WorkmindError::TomlSer(e.to_string()))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Default config for `workmind init`.
    pub fn default_config(base_dir: &Path) -> Self {
        Self {
            client: ClientSettings::default(),
            server: ServerSettings {
                db_path: base_dir.join("workmind.db").display().to_string(),
                ..ServerSettings::default()
            },
        }
    }

    /// Resolve the config file path: `<base_dir>/workmind.toml`
    pub fn default_path(base_dir: &Path) -> PathBuf {
        base_dir.join("workmind.toml")
    }

    /// Resolve the default workmind home directory: `~/.workmind`
    pub fn default_base_dir() -> Result<PathBuf> {
        dirs::home_dir()
            .map(|h| h.join(".workmind"))
            .ok_or_else(|| WorkmindError::Config("Cannot determine home directory".to_string()))
    }
}

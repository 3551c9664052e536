use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct KbaseConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub http: HttpConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub transport: String,
    pub host: String,
    pub port: u16,
    pub log_level: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StorageConfig {
    pub db_path: String,
}

/// The optional HTTP front door (`/health`, `/stats`, `/search`).
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct HttpConfig {
    pub enabled: bool,
    pub host: String,
    pub port: u16,
    /// Shared secret expected in `x-api-key`. Empty disables auth.
    pub api_key: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            transport: "stdio".into(),
            host: "127.0.0.1".into(),
            port: 8700,
            log_level: "info".into(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        let db_path = default_kbase_dir()
            .join("knowledge.db")
            .to_string_lossy()
            .into_owned();
        Self { db_path }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            host: "0.0.0.0".into(),
            port: 3000,
            api_key: String::new(),
        }
    }
}

impl HttpConfig {
    /// The configured API key, or `None` when auth is disabled.
    pub fn api_key(&self) -> Option<&str> {
        let key = self.api_key.trim();
        (!key.is_empty()).then_some(key)
    }
}

/// Returns `~/.kbase/`, falling back to the working directory when no home
/// directory can be determined.
pub fn default_kbase_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".kbase")
}

/// Returns the default config file path: `~/.kbase/config.toml`
pub fn default_config_path() -> PathBuf {
    default_kbase_dir().join("config.toml")
}

impl KbaseConfig {
    /// Load config from TOML file (if it exists) then apply env var overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(default_config_path())
    }

    /// Load from a specific path, then apply env var overrides.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let contents =
                std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str(&contents).context("failed to parse config TOML")?
        } else {
            info!("no config file at {}, using defaults", path.display());
            KbaseConfig::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides. The `KBASE_*` names win over the
    /// bare legacy names (`DATABASE_PATH`, `PORT`, `API_KEY`).
    fn apply_env_overrides(&mut self) {
        if let Some(val) = env_any(&["KBASE_DB", "DATABASE_PATH"]) {
            self.storage.db_path = val;
        }
        if let Some(val) = env_any(&["KBASE_LOG_LEVEL"]) {
            self.server.log_level = val;
        }
        if let Some(val) = env_any(&["KBASE_TRANSPORT"]) {
            self.server.transport = val;
        }
        if let Some(val) = env_any(&["KBASE_ENABLE_HTTP", "ENABLE_WEB_API"]) {
            self.http.enabled = matches!(val.to_ascii_lowercase().as_str(), "true" | "1" | "yes");
        }
        if let Some(val) = env_any(&["KBASE_HTTP_PORT", "PORT"]) {
            match val.parse() {
                Ok(port) => self.http.port = port,
                Err(_) => tracing::warn!(value = %val, "ignoring invalid HTTP port override"),
            }
        }
        if let Some(val) = env_any(&["KBASE_API_KEY", "API_KEY"]) {
            self.http.api_key = val;
        }
    }

    /// Resolve the database path, expanding `~` if needed.
    pub fn resolved_db_path(&self) -> PathBuf {
        expand_tilde(&self.storage.db_path)
    }
}

fn env_any(names: &[&str]) -> Option<String> {
    names.iter().find_map(|name| std::env::var(name).ok())
}

pub fn expand_tilde(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}

//! Application configuration: optional YAML file, then environment overrides.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use warehouse_infra::DatabaseConfig;
use warehouse_observability::LogConfig;

pub const CONFIG_PATH_ENV: &str = "WAREHOUSE_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "config/config.yaml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("could not parse config file: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },

    #[error("SECRET must be set to a non-empty value")]
    MissingSecret,
}

/// Which inventory store backs the service.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    #[default]
    Postgres,
    Memory,
}

impl FromStr for StoreKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "postgres" => Ok(StoreKind::Postgres),
            "memory" => Ok(StoreKind::Memory),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub address: String,
    pub request_timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            address: "0.0.0.0:8080".to_string(),
            request_timeout_secs: 30,
        }
    }
}

impl HttpConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub http: HttpConfig,
    pub database: DatabaseConfig,
    pub store: StoreKind,
    pub log: LogConfig,
    /// Token signing secret. Environment only.
    #[serde(skip)]
    pub secret: String,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("http", &self.http)
            .field("database", &self.database)
            .field("store", &self.store)
            .field("log", &self.log)
            .field("secret", &"<redacted>")
            .finish()
    }
}

impl AppConfig {
    /// Load from `$WAREHOUSE_CONFIG` (or `config/config.yaml`) and the process
    /// environment.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        let yaml = read_optional(Path::new(&path))?;
        Self::from_sources(yaml.as_deref(), |key| std::env::var(key).ok())
    }

    /// Build from YAML text (if any) and an environment lookup.
    pub fn from_sources(
        yaml: Option<&str>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let mut cfg: AppConfig = match yaml {
            Some(text) if !text.trim().is_empty() => serde_yaml::from_str(text)?,
            _ => AppConfig::default(),
        };

        if let Some(v) = env("DB_HOST") {
            cfg.database.host = v;
        }
        if let Some(v) = env("DB_PORT") {
            cfg.database.port = parse("DB_PORT", v)?;
        }
        if let Some(v) = env("DB_USER") {
            cfg.database.user = v;
        }
        if let Some(v) = env("DB_PASSWORD") {
            cfg.database.password = v;
        }
        if let Some(v) = env("DB_NAME") {
            cfg.database.name = v;
        }
        if let Some(v) = env("DB_MAX_CONNECTIONS") {
            cfg.database.max_connections = parse("DB_MAX_CONNECTIONS", v)?;
        }
        if let Some(v) = env("DB_MIN_CONNECTIONS") {
            cfg.database.min_connections = parse("DB_MIN_CONNECTIONS", v)?;
        }
        if let Some(v) = env("HTTP_ADDRESS") {
            cfg.http.address = v;
        }
        if let Some(v) = env("REQUEST_TIMEOUT_SECS") {
            cfg.http.request_timeout_secs = parse("REQUEST_TIMEOUT_SECS", v)?;
        }
        if let Some(v) = env("WAREHOUSE_STORE") {
            cfg.store = parse("WAREHOUSE_STORE", v)?;
        }
        cfg.secret = env("SECRET").unwrap_or_default();

        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.secret.trim().is_empty() {
            return Err(ConfigError::MissingSecret);
        }
        if self.database.max_connections == 0 {
            return Err(ConfigError::Invalid {
                key: "database.max_connections",
                value: "0".to_string(),
            });
        }
        Ok(())
    }
}

fn read_optional(path: &Path) -> Result<Option<String>, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(text) => Ok(Some(text)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(source) => Err(ConfigError::Read {
            path: path.to_path_buf(),
            source,
        }),
    }
}

fn parse<T: FromStr>(key: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::Invalid { key, value })
}

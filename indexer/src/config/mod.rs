use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use dotenv::dotenv;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::infrastructure::tzkt::MAX_PAGE_LIMIT;

/// Largest page the query API serves
pub const MAX_API_PAGE_LIMIT: u16 = 100;

/// Env var naming the config file when `--config` is not given
pub const CONFIG_PATH_ENV: &str = "CONFIG_PATH";

const DEFAULT_CONFIG_PATH: &str = "config.yaml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Configuration for the HTTP listener
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Upper bound on how long shutdown waits for in-flight work
    #[serde(with = "humantime_duration")]
    pub shutdown_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            shutdown_timeout: Duration::from_secs(30),
        }
    }
}

impl ServerConfig {
    /// Returns formatted server address string (host:port)
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseImpl {
    #[default]
    Psql,
    Memory,
}

/// Configuration for the database
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct DatabaseConfig {
    #[serde(rename = "impl")]
    pub implementation: DatabaseImpl,
    pub psql: PsqlConfig,
    /// Full connection URL; set from `DATABASE_URL`, wins over `psql.*`
    #[serde(skip)]
    pub url_override: Option<String>,
}

impl DatabaseConfig {
    pub fn url(&self) -> String {
        self.url_override
            .clone()
            .unwrap_or_else(|| self.psql.url())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PsqlConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub dbname: String,
    pub sslmode: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

impl Default for PsqlConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            user: "tezos".to_string(),
            password: "tezos".to_string(),
            dbname: "tezos_delegations".to_string(),
            sslmode: "disable".to_string(),
            max_connections: 10,
            min_connections: 2,
        }
    }
}

impl PsqlConfig {
    pub fn url(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}?sslmode={}",
            self.user, self.password, self.host, self.port, self.dbname, self.sslmode
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UpstreamImpl {
    #[default]
    Api,
    Mock,
}

/// Configuration for the TzKT HTTP client
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TzktHttpConfig {
    pub url: String,
    /// Per-request timeout
    #[serde(with = "humantime_duration")]
    pub timeout: Duration,
}

impl Default for TzktHttpConfig {
    fn default() -> Self {
        Self {
            url: "https://api.tzkt.io".to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// Configuration for the upstream indexer
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TzktApiConfig {
    #[serde(rename = "impl")]
    pub implementation: UpstreamImpl,
    pub api: TzktHttpConfig,
    #[serde(with = "humantime_duration")]
    pub polling_interval: Duration,
}

impl Default for TzktApiConfig {
    fn default() -> Self {
        Self {
            implementation: UpstreamImpl::Api,
            api: TzktHttpConfig::default(),
            polling_interval: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PaginationConfig {
    /// Page size the API uses when `limit` is absent
    pub limit: u16,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self { limit: 50 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MetricsImpl {
    #[default]
    Prometheus,
    Memory,
    Noop,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct MetricsConfig {
    #[serde(rename = "impl")]
    pub implementation: MetricsImpl,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// GELF over UDP sink
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GraylogConfig {
    pub enabled: bool,
    pub host: String,
    pub port: u16,
    pub facility: String,
}

impl Default for GraylogConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            host: "localhost".to_string(),
            port: 12201,
            facility: "tezos-delegations".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
    pub enable_file: bool,
    pub file_path: PathBuf,
    pub graylog: GraylogConfig,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Text,
            enable_file: false,
            file_path: PathBuf::from("logs/tezos-delegations.log"),
            graylog: GraylogConfig::default(),
        }
    }
}

/// Sync engine tuning
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub historical_page_size: u32,
    pub incremental_page_size: u32,
    pub db_batch_size: usize,
    #[serde(with = "humantime_duration")]
    pub page_pause: Duration,
    #[serde(with = "humantime_duration")]
    pub batch_pause: Duration,
    pub derive_accounts: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            historical_page_size: 1_000,
            incremental_page_size: 150,
            db_batch_size: 100,
            page_pause: Duration::from_millis(100),
            batch_pause: Duration::from_millis(50),
            derive_accounts: true,
        }
    }
}

/// Application configuration shared by the job and API processes
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub tzktapi: TzktApiConfig,
    pub pagination: PaginationConfig,
    pub metrics: MetricsConfig,
    pub logging: LoggingConfig,
    pub sync: SyncConfig,
}

impl AppConfig {
    /// Loads `.env`, then the YAML file at `path` (or `CONFIG_PATH`, or
    /// `config.yaml`), applies env overrides and validates the result.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        dotenv().ok();

        let path = match path {
            Some(path) => path.to_path_buf(),
            None => env::var(CONFIG_PATH_ENV)
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH)),
        };
        debug!("Reading config from {:?}", path);

        let raw = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        let mut config = Self::from_yaml(&raw).map_err(|err| match err {
            ConfigError::Parse { source, .. } => ConfigError::Parse { path, source },
            other => other,
        })?;

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Parses YAML without touching the environment
    pub fn from_yaml(raw: &str) -> Result<Self, ConfigError> {
        // An empty document is a valid all-defaults config
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(raw).map_err(|source| ConfigError::Parse {
            path: PathBuf::new(),
            source,
        })
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(url) = env::var("DATABASE_URL") {
            if !url.trim().is_empty() {
                self.database.url_override = Some(url);
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let limit = self.pagination.limit;
        if limit == 0 || limit > MAX_API_PAGE_LIMIT {
            return Err(ConfigError::Invalid(format!(
                "pagination.limit must be within [1, {MAX_API_PAGE_LIMIT}], got {limit}"
            )));
        }

        for (key, size) in [
            ("sync.historical_page_size", self.sync.historical_page_size),
            ("sync.incremental_page_size", self.sync.incremental_page_size),
        ] {
            if size == 0 || size > MAX_PAGE_LIMIT {
                return Err(ConfigError::Invalid(format!(
                    "{key} must be within [1, {MAX_PAGE_LIMIT}], got {size}"
                )));
            }
        }

        if self.sync.db_batch_size == 0 {
            return Err(ConfigError::Invalid(
                "sync.db_batch_size must be positive".to_string(),
            ));
        }

        if self.tzktapi.implementation == UpstreamImpl::Api && self.tzktapi.api.url.trim().is_empty()
        {
            return Err(ConfigError::Invalid(
                "tzktapi.api.url is required when tzktapi.impl is api".to_string(),
            ));
        }

        if self.tzktapi.polling_interval.is_zero() {
            return Err(ConfigError::Invalid(
                "tzktapi.polling_interval must be non-zero".to_string(),
            ));
        }

        Ok(())
    }
}

/// humantime strings ("30s", "100ms") for `Duration` fields
mod humantime_duration {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        humantime::parse_duration(raw.trim()).map_err(serde::de::Error::custom)
    }
}

//! Configuration layer: typed settings with layered precedence (file → env → CLI).

use std::{
    net::SocketAddr,
    num::{NonZeroU32, NonZeroUsize},
    path::PathBuf,
    str::FromStr,
    time::Duration,
};

use clap::{Parser, ValueHint, builder::BoolishValueParser};
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;
use url::Url;

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "dealstack";
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_GRACEFUL_SHUTDOWN_SECS: u64 = 30;
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 8;
const DEFAULT_LIST_CACHE_TTL_SECS: u64 = 120;
const DEFAULT_CLICK_WINDOW_SECS: u64 = 60;
const DEFAULT_CLICK_MAX_PER_WINDOW: u32 = 12;
const DEFAULT_CLICK_TABLE_CAPACITY: usize = 50_000;
const DEFAULT_AUDIT_QUEUE_CAPACITY: usize = 1024;
const DEFAULT_PAGE_SIZE: u32 = 20;
const DEFAULT_HOMEPAGE_LIMIT: u32 = 8;

/// Command-line arguments for the dealstack binary.
#[derive(Debug, Default, Parser)]
#[command(name = "dealstack", version, about = "dealstack storefront API server")]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "DEALSTACK_CONFIG_FILE", value_name = "PATH", value_hint = ValueHint::FilePath)]
    pub config_file: Option<PathBuf>,

    /// Override the listener host.
    #[arg(long = "server-host", value_name = "HOST")]
    pub server_host: Option<String>,

    /// Override the listener port.
    #[arg(long = "server-port", value_name = "PORT")]
    pub server_port: Option<u16>,

    /// Override the graceful shutdown timeout.
    #[arg(long = "server-graceful-shutdown-seconds", value_name = "SECONDS")]
    pub graceful_shutdown_seconds: Option<u64>,

    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub log_json: Option<bool>,

    /// Override the database connection URL.
    #[arg(long = "database-url", env = "DATABASE_URL", value_name = "URL")]
    pub database_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub logging: LoggingSettings,
    pub database: DatabaseSettings,
    pub cache: CacheSettings,
    pub rate_limit: RateLimitSettings,
    pub clicks: ClickSettings,
    pub pagination: PaginationSettings,
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub addr: SocketAddr,
    pub graceful_shutdown: Duration,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: NonZeroU32,
}

#[derive(Debug, Clone)]
pub struct CacheSettings {
    pub list_ttl: Duration,
}

#[derive(Debug, Clone)]
pub struct RateLimitSettings {
    pub window: Duration,
    pub max_clicks: NonZeroU32,
    pub table_capacity: NonZeroUsize,
}

#[derive(Debug, Clone)]
pub struct ClickSettings {
    pub audit_queue_capacity: NonZeroUsize,
}

#[derive(Debug, Clone)]
pub struct PaginationSettings {
    pub default_limit: NonZeroU32,
    pub homepage_limit: NonZeroU32,
    pub api_base: Option<Url>,
    pub canonical_origin: Option<Url>,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(Environment::with_prefix("DEALSTACK").separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;
    raw.apply_cli_overrides(cli);

    Settings::from_raw(raw)
}

pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let cli = CliArgs::parse();
    let settings = load(&cli)?;
    Ok((cli, settings))
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    server: RawServerSettings,
    logging: RawLoggingSettings,
    database: RawDatabaseSettings,
    cache: RawCacheSettings,
    rate_limit: RawRateLimitSettings,
    clicks: RawClickSettings,
    pagination: RawPaginationSettings,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawServerSettings {
    host: Option<String>,
    port: Option<u16>,
    graceful_shutdown_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawDatabaseSettings {
    url: Option<String>,
    max_connections: Option<u32>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawCacheSettings {
    list_ttl_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawRateLimitSettings {
    window_seconds: Option<u64>,
    max_clicks: Option<u32>,
    table_capacity: Option<usize>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawClickSettings {
    audit_queue_capacity: Option<usize>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawPaginationSettings {
    default_limit: Option<u32>,
    homepage_limit: Option<u32>,
    api_base: Option<String>,
    canonical_origin: Option<String>,
}

impl RawSettings {
    fn apply_cli_overrides(&mut self, cli: &CliArgs) {
        if let Some(host) = cli.server_host.as_ref() {
            self.server.host = Some(host.clone());
        }
        if let Some(port) = cli.server_port {
            self.server.port = Some(port);
        }
        if let Some(seconds) = cli.graceful_shutdown_seconds {
            self.server.graceful_shutdown_seconds = Some(seconds);
        }
        if let Some(level) = cli.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = cli.log_json {
            self.logging.json = Some(json);
        }
        if let Some(url) = cli.database_url.as_ref() {
            self.database.url = Some(url.clone());
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let host = raw.server.host.unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = raw.server.port.unwrap_or(DEFAULT_PORT);
        let addr = format!("{host}:{port}")
            .parse::<SocketAddr>()
            .map_err(|err| LoadError::invalid("server.host", err.to_string()))?;

        let level = match raw.logging.level {
            Some(level) => LevelFilter::from_str(&level)
                .map_err(|err| LoadError::invalid("logging.level", err.to_string()))?,
            None => LevelFilter::INFO,
        };
        let format = if raw.logging.json.unwrap_or(false) {
            LogFormat::Json
        } else {
            LogFormat::Compact
        };

        let url = raw
            .database
            .url
            .ok_or_else(|| LoadError::invalid("database.url", "missing database URL"))?;
        let max_connections = non_zero_u32(
            "database.max_connections",
            raw.database
                .max_connections
                .unwrap_or(DEFAULT_DB_MAX_CONNECTIONS),
        )?;

        let list_ttl = Duration::from_secs(
            raw.cache
                .list_ttl_seconds
                .unwrap_or(DEFAULT_LIST_CACHE_TTL_SECS),
        );

        let rate_limit = RateLimitSettings {
            window: Duration::from_secs(
                raw.rate_limit
                    .window_seconds
                    .unwrap_or(DEFAULT_CLICK_WINDOW_SECS),
            ),
            max_clicks: non_zero_u32(
                "rate_limit.max_clicks",
                raw.rate_limit
                    .max_clicks
                    .unwrap_or(DEFAULT_CLICK_MAX_PER_WINDOW),
            )?,
            table_capacity: non_zero_usize(
                "rate_limit.table_capacity",
                raw.rate_limit
                    .table_capacity
                    .unwrap_or(DEFAULT_CLICK_TABLE_CAPACITY),
            )?,
        };

        let clicks = ClickSettings {
            audit_queue_capacity: non_zero_usize(
                "clicks.audit_queue_capacity",
                raw.clicks
                    .audit_queue_capacity
                    .unwrap_or(DEFAULT_AUDIT_QUEUE_CAPACITY),
            )?,
        };

        let pagination = PaginationSettings {
            default_limit: non_zero_u32(
                "pagination.default_limit",
                raw.pagination.default_limit.unwrap_or(DEFAULT_PAGE_SIZE),
            )?,
            homepage_limit: non_zero_u32(
                "pagination.homepage_limit",
                raw.pagination
                    .homepage_limit
                    .unwrap_or(DEFAULT_HOMEPAGE_LIMIT),
            )?,
            api_base: parse_url("pagination.api_base", raw.pagination.api_base)?,
            canonical_origin: parse_url(
                "pagination.canonical_origin",
                raw.pagination.canonical_origin,
            )?,
        };

        Ok(Self {
            server: ServerSettings {
                addr,
                graceful_shutdown: Duration::from_secs(
                    raw.server
                        .graceful_shutdown_seconds
                        .unwrap_or(DEFAULT_GRACEFUL_SHUTDOWN_SECS),
                ),
            },
            logging: LoggingSettings { level, format },
            database: DatabaseSettings {
                url,
                max_connections,
            },
            cache: CacheSettings { list_ttl },
            rate_limit,
            clicks,
            pagination,
        })
    }
}

fn non_zero_u32(key: &'static str, value: u32) -> Result<NonZeroU32, LoadError> {
    NonZeroU32::new(value).ok_or_else(|| LoadError::invalid(key, "must be greater than zero"))
}

fn non_zero_usize(key: &'static str, value: usize) -> Result<NonZeroUsize, LoadError> {
    NonZeroUsize::new(value).ok_or_else(|| LoadError::invalid(key, "must be greater than zero"))
}

fn parse_url(key: &'static str, value: Option<String>) -> Result<Option<Url>, LoadError> {
    value
        .filter(|value| !value.trim().is_empty())
        .map(|value| Url::parse(&value).map_err(|err| LoadError::invalid(key, err.to_string())))
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_with_database() -> RawSettings {
        RawSettings {
            database: RawDatabaseSettings {
                url: Some("postgres://localhost/dealstack".to_string()),
                max_connections: None,
            },
            ..RawSettings::default()
        }
    }

    #[test]
    fn defaults_fill_every_section() {
        let settings = Settings::from_raw(raw_with_database()).expect("settings");

        assert_eq!(settings.server.addr.port(), DEFAULT_PORT);
        assert_eq!(settings.cache.list_ttl, Duration::from_secs(120));
        assert_eq!(settings.rate_limit.max_clicks.get(), 12);
        assert_eq!(settings.rate_limit.window, Duration::from_secs(60));
        assert_eq!(settings.pagination.default_limit.get(), 20);
        assert!(settings.pagination.api_base.is_none());
    }

    #[test]
    fn missing_database_url_is_rejected() {
        let err = Settings::from_raw(RawSettings::default()).expect_err("missing url");
        assert!(matches!(err, LoadError::Invalid { key: "database.url", .. }));
    }

    #[test]
    fn zero_limits_are_rejected() {
        let mut raw = raw_with_database();
        raw.pagination.default_limit = Some(0);
        let err = Settings::from_raw(raw).expect_err("zero limit");
        assert!(matches!(
            err,
            LoadError::Invalid {
                key: "pagination.default_limit",
                ..
            }
        ));
    }

    #[test]
    fn invalid_api_base_is_rejected() {
        let mut raw = raw_with_database();
        raw.pagination.api_base = Some("not a url".to_string());
        assert!(Settings::from_raw(raw).is_err());
    }

    #[test]
    fn cli_overrides_replace_file_values() {
        let mut raw = raw_with_database();
        let cli = CliArgs {
            server_port: Some(4100),
            log_json: Some(true),
            ..CliArgs::default()
        };
        raw.apply_cli_overrides(&cli);
        let settings = Settings::from_raw(raw).expect("settings");

        assert_eq!(settings.server.addr.port(), 4100);
        assert!(matches!(settings.logging.format, LogFormat::Json));
    }
}

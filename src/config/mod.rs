//! Configuration layer: typed settings with layered precedence (file → env → CLI).

use std::{
    net::SocketAddr,
    num::{NonZeroU32, NonZeroUsize},
    path::PathBuf,
    str::FromStr,
    time::Duration,
};

use clap::{Args, Parser, builder::BoolishValueParser};
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "scaffale";
const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_DB_HOST: &str = "localhost";
const DEFAULT_DB_PORT: u16 = 5432;
const DEFAULT_DB_USERNAME: &str = "postgres";
const DEFAULT_DB_PASSWORD: &str = "postgres";
const DEFAULT_DB_NAME: &str = "scaffale";
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 20;
const DEFAULT_CACHE_TTL_SECS: u64 = 10;
const DEFAULT_CACHE_MAX_ENTRIES: usize = 1000;
const DEFAULT_LISTING_MAX_LIMIT: u32 = 1000;
const DEFAULT_SEED_TOTAL: u32 = 50_000;
const DEFAULT_SEED_BATCH_SIZE: u32 = 2_000;

/// Command-line arguments for the scaffale binary.
#[derive(Debug, Parser)]
#[command(name = "scaffale", version, about = "Scaffale item listing server")]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(
        long = "config-file",
        env = "SCAFFALE_CONFIG_FILE",
        value_name = "PATH"
    )]
    pub config_file: Option<PathBuf>,

    #[command(flatten)]
    pub overrides: Overrides,
}

#[derive(Debug, Args, Default, Clone)]
pub struct Overrides {
    /// Override the listener host.
    #[arg(long = "server-host", value_name = "HOST")]
    pub server_host: Option<String>,

    /// Override the listener port.
    #[arg(long = "server-port", value_name = "PORT")]
    pub server_port: Option<u16>,

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

    /// Override the database host.
    #[arg(long = "database-host", value_name = "HOST")]
    pub database_host: Option<String>,

    /// Override the database port.
    #[arg(long = "database-port", value_name = "PORT")]
    pub database_port: Option<u16>,

    /// Override the database user.
    #[arg(long = "database-username", value_name = "USER")]
    pub database_username: Option<String>,

    /// Override the database password.
    #[arg(long = "database-password", value_name = "PASSWORD")]
    pub database_password: Option<String>,

    /// Override the database name.
    #[arg(long = "database-name", value_name = "NAME")]
    pub database_name: Option<String>,

    /// Override the connection pool size.
    #[arg(long = "database-max-connections", value_name = "COUNT")]
    pub database_max_connections: Option<u32>,

    /// Override the listing cache TTL in seconds.
    #[arg(long = "cache-ttl-seconds", value_name = "SECONDS")]
    pub cache_ttl_seconds: Option<u64>,

    /// Override the listing cache entry ceiling.
    #[arg(long = "cache-max-entries", value_name = "COUNT")]
    pub cache_max_entries: Option<usize>,

    /// Override the maximum page size accepted by the listing endpoint.
    #[arg(long = "listing-max-limit", value_name = "COUNT")]
    pub listing_max_limit: Option<u32>,

    /// Toggle startup seeding of an empty store.
    #[arg(
        long = "seed-enabled",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub seed_enabled: Option<bool>,

    /// Override the number of rows the seeder inserts.
    #[arg(long = "seed-total", value_name = "COUNT")]
    pub seed_total: Option<u32>,

    /// Override the seeder batch size.
    #[arg(long = "seed-batch-size", value_name = "COUNT")]
    pub seed_batch_size: Option<u32>,
}

/// Fully-resolved deployment settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub logging: LoggingSettings,
    pub database: DatabaseSettings,
    pub cache: CacheSettings,
    pub listing: ListingSettings,
    pub seed: SeedSettings,
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub addr: SocketAddr,
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
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub database: String,
    pub max_connections: NonZeroU32,
}

#[derive(Debug, Clone)]
pub struct CacheSettings {
    pub ttl: Duration,
    pub max_entries: NonZeroUsize,
}

#[derive(Debug, Clone)]
pub struct ListingSettings {
    pub max_limit: NonZeroU32,
}

#[derive(Debug, Clone)]
pub struct SeedSettings {
    pub enabled: bool,
    pub total: u32,
    pub batch_size: NonZeroU32,
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

    builder = builder.add_source(Environment::with_prefix("SCAFFALE").separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;
    raw.apply_overrides(&cli.overrides);

    Settings::from_raw(raw)
}

/// Resolve configuration using the supplied CLI arguments, returning both for downstream use.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    server: RawServerSettings,
    logging: RawLoggingSettings,
    database: RawDatabaseSettings,
    cache: RawCacheSettings,
    listing: RawListingSettings,
    seed: RawSeedSettings,
}

impl RawSettings {
    fn apply_overrides(&mut self, overrides: &Overrides) {
        if let Some(host) = overrides.server_host.as_ref() {
            self.server.host = Some(host.clone());
        }
        if let Some(port) = overrides.server_port {
            self.server.port = Some(port);
        }
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
        if let Some(host) = overrides.database_host.as_ref() {
            self.database.host = Some(host.clone());
        }
        if let Some(port) = overrides.database_port {
            self.database.port = Some(port);
        }
        if let Some(username) = overrides.database_username.as_ref() {
            self.database.username = Some(username.clone());
        }
        if let Some(password) = overrides.database_password.as_ref() {
            self.database.password = Some(password.clone());
        }
        if let Some(name) = overrides.database_name.as_ref() {
            self.database.database = Some(name.clone());
        }
        if let Some(max) = overrides.database_max_connections {
            self.database.max_connections = Some(max);
        }
        if let Some(ttl) = overrides.cache_ttl_seconds {
            self.cache.ttl_seconds = Some(ttl);
        }
        if let Some(max) = overrides.cache_max_entries {
            self.cache.max_entries = Some(max);
        }
        if let Some(max) = overrides.listing_max_limit {
            self.listing.max_limit = Some(max);
        }
        if let Some(enabled) = overrides.seed_enabled {
            self.seed.enabled = Some(enabled);
        }
        if let Some(total) = overrides.seed_total {
            self.seed.total = Some(total);
        }
        if let Some(batch) = overrides.seed_batch_size {
            self.seed.batch_size = Some(batch);
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            server,
            logging,
            database,
            cache,
            listing,
            seed,
        } = raw;

        let server = build_server_settings(server)?;
        let logging = build_logging_settings(logging)?;
        let database = build_database_settings(database)?;
        let cache = build_cache_settings(cache)?;
        let listing = build_listing_settings(listing)?;
        let seed = build_seed_settings(seed)?;

        Ok(Self {
            server,
            logging,
            database,
            cache,
            listing,
            seed,
        })
    }
}

fn build_server_settings(server: RawServerSettings) -> Result<ServerSettings, LoadError> {
    let host = server.host.unwrap_or_else(|| DEFAULT_HOST.to_string());

    let port = server.port.unwrap_or(DEFAULT_PORT);
    if port == 0 {
        return Err(LoadError::invalid(
            "server.port",
            "port must be greater than zero",
        ));
    }

    let addr = parse_socket_addr(&host, port)
        .map_err(|reason| LoadError::invalid("server.addr", reason))?;

    Ok(ServerSettings { addr })
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_database_settings(database: RawDatabaseSettings) -> Result<DatabaseSettings, LoadError> {
    let host = non_empty(
        database.host.unwrap_or_else(|| DEFAULT_DB_HOST.to_string()),
        "database.host",
    )?;

    let port = database.port.unwrap_or(DEFAULT_DB_PORT);
    if port == 0 {
        return Err(LoadError::invalid(
            "database.port",
            "port must be greater than zero",
        ));
    }

    let username = non_empty(
        database
            .username
            .unwrap_or_else(|| DEFAULT_DB_USERNAME.to_string()),
        "database.username",
    )?;
    let password = database
        .password
        .unwrap_or_else(|| DEFAULT_DB_PASSWORD.to_string());
    let name = non_empty(
        database
            .database
            .unwrap_or_else(|| DEFAULT_DB_NAME.to_string()),
        "database.database",
    )?;

    let max_value = database
        .max_connections
        .unwrap_or(DEFAULT_DB_MAX_CONNECTIONS);
    let max_connections = non_zero_u32(max_value.into(), "database.max_connections")?;

    Ok(DatabaseSettings {
        host,
        port,
        username,
        password,
        database: name,
        max_connections,
    })
}

fn build_cache_settings(cache: RawCacheSettings) -> Result<CacheSettings, LoadError> {
    let ttl_seconds = cache.ttl_seconds.unwrap_or(DEFAULT_CACHE_TTL_SECS);
    if ttl_seconds == 0 {
        return Err(LoadError::invalid(
            "cache.ttl_seconds",
            "must be greater than zero",
        ));
    }

    let max_value = cache.max_entries.unwrap_or(DEFAULT_CACHE_MAX_ENTRIES);
    let max_entries = NonZeroUsize::new(max_value)
        .ok_or_else(|| LoadError::invalid("cache.max_entries", "must be greater than zero"))?;

    Ok(CacheSettings {
        ttl: Duration::from_secs(ttl_seconds),
        max_entries,
    })
}

fn build_listing_settings(listing: RawListingSettings) -> Result<ListingSettings, LoadError> {
    let max_value = listing.max_limit.unwrap_or(DEFAULT_LISTING_MAX_LIMIT);
    let max_limit = non_zero_u32(max_value.into(), "listing.max_limit")?;

    Ok(ListingSettings { max_limit })
}

fn build_seed_settings(seed: RawSeedSettings) -> Result<SeedSettings, LoadError> {
    let enabled = seed.enabled.unwrap_or(true);
    let total = seed.total.unwrap_or(DEFAULT_SEED_TOTAL);
    let batch_value = seed.batch_size.unwrap_or(DEFAULT_SEED_BATCH_SIZE);
    let batch_size = non_zero_u32(batch_value.into(), "seed.batch_size")?;

    Ok(SeedSettings {
        enabled,
        total,
        batch_size,
    })
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawServerSettings {
    host: Option<String>,
    port: Option<u16>,
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
    host: Option<String>,
    port: Option<u16>,
    username: Option<String>,
    password: Option<String>,
    database: Option<String>,
    max_connections: Option<u32>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawCacheSettings {
    ttl_seconds: Option<u64>,
    max_entries: Option<usize>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawListingSettings {
    max_limit: Option<u32>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSeedSettings {
    enabled: Option<bool>,
    total: Option<u32>,
    batch_size: Option<u32>,
}

fn parse_socket_addr(host: &str, port: u16) -> Result<SocketAddr, String> {
    let candidate = format!("{host}:{port}");
    candidate
        .parse()
        .map_err(|err| format!("invalid address `{candidate}`: {err}"))
}

fn non_empty(value: String, key: &'static str) -> Result<String, LoadError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(LoadError::invalid(key, "must not be empty"));
    }
    Ok(trimmed.to_string())
}

fn non_zero_u32(value: u64, key: &'static str) -> Result<NonZeroU32, LoadError> {
    if value == 0 {
        return Err(LoadError::invalid(key, "must be greater than zero"));
    }
    let value_u32: u32 = value
        .try_into()
        .map_err(|_| LoadError::invalid(key, "value exceeds supported range for u32"))?;
    NonZeroU32::new(value_u32).ok_or_else(|| LoadError::invalid(key, "must be greater than zero"))
}

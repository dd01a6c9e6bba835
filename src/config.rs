//! Configuration Module
//!
//! Connection options for the Redis server and provider-level settings.
//! The connection options round-trip through the comma-separated
//! configuration string form (`host,option=value,...`).

use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use tracing::warn;

use crate::cache::AbsoluteExpirationMode;
use crate::error::{CacheError, Result};

// == Defaults ==
/// Connection target used when none is configured
pub const DEFAULT_CONFIGURATION: &str = "localhost:6379";

/// Port assumed when the host carries none
pub const DEFAULT_PORT: u16 = 6379;

/// Redis logical database used by the provider
pub const DEFAULT_DATABASE: i64 = 2;

/// TTL applied when a policy sets no expiration
pub const DEFAULT_TTL_SECONDS: u64 = 120;

// == Proxy Mode ==
/// Proxy sitting in front of the Redis server, if any.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Proxy {
    #[default]
    None,
    Twemproxy,
    Envoyproxy,
}

impl fmt::Display for Proxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Proxy::None => "None",
            Proxy::Twemproxy => "Twemproxy",
            Proxy::Envoyproxy => "Envoyproxy",
        };
        f.write_str(name)
    }
}

impl FromStr for Proxy {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(Proxy::None),
            "twemproxy" => Ok(Proxy::Twemproxy),
            "envoyproxy" => Ok(Proxy::Envoyproxy),
            other => Err(CacheError::InvalidConfiguration(format!(
                "unknown proxy mode '{}'",
                other
            ))),
        }
    }
}

// == Redis Configuration ==
/// Redis connection options.
///
/// Only `host`, the credentials, `connect_timeout` and `response_timeout`
/// influence the connection the provider opens. The remaining options are
/// carried so that the string form stays complete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedisConfiguration {
    /// Server endpoint, `host` or `host:port`
    pub host: String,
    pub abort_connect: bool,
    pub allow_admin: bool,
    pub connect_retry: u32,
    /// Connect timeout in milliseconds
    pub connect_timeout: u64,
    pub config_check_seconds: u64,
    /// Rendered verbatim in the string form; must not contain `,`
    pub password: Option<String>,
    /// Rendered verbatim in the string form; must not contain `,`
    pub user: Option<String>,
    pub proxy: Proxy,
    /// Per-operation response timeout in milliseconds
    pub response_timeout: u64,
    pub sync_timeout: u64,
    pub async_timeout: u64,
    /// Write buffer size in bytes
    pub write_buffer: u32,
}

impl RedisConfiguration {
    // == Constructor ==
    /// Creates a configuration for `host` with every other option at its default.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            abort_connect: true,
            allow_admin: false,
            connect_retry: 3,
            connect_timeout: 5000,
            config_check_seconds: 60,
            password: None,
            user: None,
            proxy: Proxy::None,
            response_timeout: 5000,
            sync_timeout: 5000,
            async_timeout: 5000,
            write_buffer: 4096,
        }
    }

    /// Connect timeout as a Duration.
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout)
    }

    /// Response timeout as a Duration.
    pub fn response_timeout(&self) -> Duration {
        Duration::from_millis(self.response_timeout)
    }

    // == Connection URL ==
    /// Builds the `redis://` URL the client connects with, selecting `database`.
    ///
    /// Credentials are percent-encoded so that separators inside a password
    /// survive URL parsing.
    pub fn connection_url(&self, database: i64) -> Result<String> {
        let (host, port) = match self.host.rsplit_once(':') {
            Some((host, port)) => {
                let port = port.parse::<u16>().map_err(|_| {
                    CacheError::InvalidConfiguration(format!(
                        "invalid port in endpoint '{}'",
                        self.host
                    ))
                })?;
                (host, port)
            }
            None => (self.host.as_str(), DEFAULT_PORT),
        };

        if host.is_empty() {
            return Err(CacheError::InvalidConfiguration(
                "endpoint host cannot be empty".to_string(),
            ));
        }

        let credentials = match (&self.user, &self.password) {
            (Some(user), Some(password)) => format!(
                "{}:{}@",
                urlencoding::encode(user),
                urlencoding::encode(password)
            ),
            (None, Some(password)) => format!(":{}@", urlencoding::encode(password)),
            (Some(user), None) => format!("{}@", urlencoding::encode(user)),
            (None, None) => String::new(),
        };

        Ok(format!("redis://{}{}:{}/{}", credentials, host, port, database))
    }
}

impl Default for RedisConfiguration {
    fn default() -> Self {
        Self::new(DEFAULT_CONFIGURATION)
    }
}

/// Renders the configuration string form.
///
/// Values are written unescaped. A `password` or `user` containing `,`
/// produces a string that does not parse back to the same configuration;
/// `=` inside a value is fine since options split on the first `=` only.
impl fmt::Display for RedisConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{},abortConnect={},allowAdmin={},connectRetry={},connectTimeout={},configCheckSeconds={}",
            self.host,
            self.abort_connect,
            self.allow_admin,
            self.connect_retry,
            self.connect_timeout,
            self.config_check_seconds
        )?;
        if let Some(password) = &self.password {
            write!(f, ",password={}", password)?;
        }
        if let Some(user) = &self.user {
            write!(f, ",user={}", user)?;
        }
        write!(
            f,
            ",proxy={},responseTimeout={},syncTimeout={},asyncTimeout={},writeBuffer={}",
            self.proxy, self.response_timeout, self.sync_timeout, self.async_timeout, self.write_buffer
        )
    }
}

impl FromStr for RedisConfiguration {
    type Err = CacheError;

    /// Parses `host[:port],option=value,...`. Option names are matched
    /// case-insensitively; unknown options are skipped with a warning.
    /// Each option splits on its first `=`, and `,` always ends a token.
    fn from_str(s: &str) -> Result<Self> {
        let mut host: Option<String> = None;
        let mut config = RedisConfiguration::new("");

        for token in s.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            let Some((name, value)) = token.split_once('=') else {
                if host.is_some() {
                    return Err(CacheError::InvalidConfiguration(format!(
                        "multiple endpoints are not supported: '{}'",
                        token
                    )));
                }
                host = Some(token.to_string());
                continue;
            };

            let value = value.trim();
            match name.trim().to_ascii_lowercase().as_str() {
                "abortconnect" => config.abort_connect = parse_option(name, value)?,
                "allowadmin" => config.allow_admin = parse_option(name, value)?,
                "connectretry" => config.connect_retry = parse_option(name, value)?,
                "connecttimeout" => config.connect_timeout = parse_option(name, value)?,
                "configcheckseconds" => config.config_check_seconds = parse_option(name, value)?,
                "password" => config.password = Some(value.to_string()),
                "user" => config.user = Some(value.to_string()),
                "proxy" => config.proxy = value.parse()?,
                "responsetimeout" => config.response_timeout = parse_option(name, value)?,
                "synctimeout" => config.sync_timeout = parse_option(name, value)?,
                "asynctimeout" => config.async_timeout = parse_option(name, value)?,
                "writebuffer" => config.write_buffer = parse_option(name, value)?,
                _ => warn!("Ignoring unsupported configuration option '{}'", name),
            }
        }

        config.host = host.ok_or_else(|| {
            CacheError::InvalidConfiguration("configuration has no endpoint".to_string())
        })?;
        Ok(config)
    }
}

fn parse_option<T: FromStr>(name: &str, value: &str) -> Result<T> {
    value.parse().map_err(|_| {
        CacheError::InvalidConfiguration(format!("invalid value '{}' for option '{}'", value, name))
    })
}

// == Provider Configuration ==
/// Provider settings, owned by a single provider instance.
#[derive(Debug, Clone)]
pub struct Config {
    /// Connection options
    pub redis: RedisConfiguration,
    /// Redis logical database index
    pub database: i64,
    /// TTL applied when a policy sets no expiration
    pub default_ttl: Duration,
    /// How an absolute expiration is turned into a TTL
    pub absolute_expiration_mode: AbsoluteExpirationMode,
}

impl Config {
    /// Creates a Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `REDIS_CONFIGURATION` - Configuration string (default: `localhost:6379`)
    /// - `REDIS_DATABASE` - Database index (default: 2)
    /// - `CACHE_DEFAULT_TTL` - Default TTL in seconds (default: 120)
    /// - `CACHE_ABSOLUTE_EXPIRATION_MODE` - `remaining` or `legacy` (default: `remaining`)
    ///
    /// A malformed configuration string or expiration mode is an error, as is
    /// a zero default TTL. Unparseable numeric settings fall back to their
    /// defaults.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds a Config from `lookup`, which maps a variable name to its value.
    ///
    /// Empty or whitespace-only values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let redis = match var("REDIS_CONFIGURATION") {
            Some(value) => value.parse()?,
            None => RedisConfiguration::default(),
        };
        let absolute_expiration_mode = match var("CACHE_ABSOLUTE_EXPIRATION_MODE") {
            Some(value) => value.trim().parse()?,
            None => AbsoluteExpirationMode::default(),
        };

        let config = Self {
            redis,
            database: var("REDIS_DATABASE")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(DEFAULT_DATABASE),
            default_ttl: Duration::from_secs(
                var("CACHE_DEFAULT_TTL")
                    .and_then(|v| v.trim().parse().ok())
                    .unwrap_or(DEFAULT_TTL_SECONDS),
            ),
            absolute_expiration_mode,
        };
        config.validate()?;
        Ok(config)
    }

    /// Checks settings that would otherwise misbehave silently at write time.
    ///
    /// A zero default TTL would turn every write under the default policy
    /// into a delete.
    pub fn validate(&self) -> Result<()> {
        if self.default_ttl.is_zero() {
            return Err(CacheError::InvalidConfiguration(
                "default TTL must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Uses `redis` with every provider setting at its default.
    pub fn with_redis(redis: RedisConfiguration) -> Self {
        Self {
            redis,
            ..Self::default()
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            redis: RedisConfiguration::default(),
            database: DEFAULT_DATABASE,
            default_ttl: Duration::from_secs(DEFAULT_TTL_SECONDS),
            absolute_expiration_mode: AbsoluteExpirationMode::default(),
        }
    }
}

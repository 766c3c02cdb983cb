// Service configuration read from the environment
// A `.env` file is loaded first when present

use std::net::{IpAddr, SocketAddr};
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

use crate::infrastructure::daily_cache::DEFAULT_CAPACITY;
use crate::infrastructure::posten_client::POSTEN_ORIGIN;
use crate::infrastructure::{RetryPolicy, Timeouts};

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub posten_base_url: String,
    pub cache_capacity: NonZeroUsize,
    pub static_dir: PathBuf,
    pub timeouts: Timeouts,
    pub retry: RetryPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 5000)),
            posten_base_url: POSTEN_ORIGIN.to_string(),
            cache_capacity: NonZeroUsize::new(DEFAULT_CAPACITY).unwrap_or(NonZeroUsize::MIN),
            static_dir: PathBuf::from("static"),
            timeouts: Timeouts::default(),
            retry: RetryPolicy::default(),
        }
    }
}

impl Config {
    /// Loads configuration from process environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration through `lookup`, falling back to defaults for missing keys
    ///
    /// # Variables
    /// - `HOST`, `PORT` - listen address (default `0.0.0.0:5000`)
    /// - `POSTEN_BASE_URL` - upstream origin
    /// - `CACHE_CAPACITY` - postal codes cached per day
    /// - `STATIC_DIR` - directory holding the favicon
    /// - `UPSTREAM_RETRIES`, `UPSTREAM_BACKOFF_MS` - retry tuning
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let host: IpAddr = parse_or(&lookup, "HOST", defaults.bind_addr.ip())?;
        let port: u16 = parse_or(&lookup, "PORT", defaults.bind_addr.port())?;

        let posten_base_url = lookup("POSTEN_BASE_URL").unwrap_or_else(|| {
            tracing::warn!("POSTEN_BASE_URL not set, using default");
            defaults.posten_base_url.clone()
        });

        let cache_capacity = parse_or(&lookup, "CACHE_CAPACITY", defaults.cache_capacity)?;

        let static_dir = lookup("STATIC_DIR").map(PathBuf::from).unwrap_or_else(|| {
            tracing::warn!("STATIC_DIR not set, using default");
            defaults.static_dir.clone()
        });

        let retry = RetryPolicy {
            max_retries: parse_or(&lookup, "UPSTREAM_RETRIES", defaults.retry.max_retries)?,
            backoff_factor: Duration::from_millis(parse_or(
                &lookup,
                "UPSTREAM_BACKOFF_MS",
                defaults.retry.backoff_factor.as_millis() as u64,
            )?),
        };

        Ok(Self {
            bind_addr: SocketAddr::new(host, port),
            posten_base_url,
            cache_capacity,
            static_dir,
            timeouts: defaults.timeouts,
            retry,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue { key, value }),
        None => {
            tracing::warn!("{} not set, using default", key);
            Ok(default)
        }
    }
}

//! Client configuration with environment overrides.
//!
//! | variable              | field       | default             |
//! |-----------------------|-------------|---------------------|
//! | `RIDEEM_HOST`         | `host`      | `https://rideem.io` |
//! | `RIDEEM_KEY`          | `key`       | none                |
//! | `RIDEEM_POOL_SIZE`    | `pool_size` | 10                  |
//! | `RIDEEM_TIMEOUT_SECS` | `timeout`   | 30                  |

use std::time::Duration;

use crate::error::{Error, Result};
use crate::pool::DEFAULT_POOL_SIZE;
use crate::transport::DEFAULT_TIMEOUT;

pub const DEFAULT_HOST: &str = "https://rideem.io";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL including scheme.
    pub host: String,
    /// App secret key sent with redeem calls that don't supply their own.
    pub key: Option<String>,
    /// Workers in the lazily created pool.
    pub pool_size: usize,
    /// Global timeout for one round trip.
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            key: None,
            pool_size: DEFAULT_POOL_SIZE,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl ClientConfig {
    /// Defaults overridden by `RIDEEM_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each variable name.
    ///
    /// Empty values are ignored.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(host) = get("RIDEEM_HOST") {
            config.host = host;
        }
        if let Some(key) = get("RIDEEM_KEY") {
            config.key = Some(key);
        }
        if let Some(raw) = get("RIDEEM_POOL_SIZE") {
            config.pool_size = parse_number("RIDEEM_POOL_SIZE", &raw)?;
            if config.pool_size == 0 {
                return Err(Error::InvalidConfig("RIDEEM_POOL_SIZE must be at least 1".to_string()));
            }
        }
        if let Some(raw) = get("RIDEEM_TIMEOUT_SECS") {
            config.timeout = Duration::from_secs(parse_number("RIDEEM_TIMEOUT_SECS", &raw)?);
        }

        Ok(config)
    }
}

fn parse_number<N: std::str::FromStr>(name: &str, raw: &str) -> Result<N> {
    raw.trim()
        .parse()
        .map_err(|_| Error::InvalidConfig(format!("{name}: expected a number, got {raw:?}")))
}

//! Service configuration loaded from environment variables.
//!
//! Follows 12-factor style: all settings come from environment variables
//! (or a `.env` file via `dotenvy`). Every session built from a
//! [`WatchConfig`] keeps those values for its whole life.

use std::net::SocketAddr;
use std::time::Duration;

use crate::watch::RetryPolicy;

/// Top-level service configuration.
///
/// Loaded once at startup via [`WatchConfig::from_env`].
#[derive(Debug, Clone)]
pub struct WatchConfig {
    /// Socket address to bind the HTTP server to (e.g. `0.0.0.0:6464`).
    pub listen_addr: SocketAddr,

    /// Base address of the Nomad HTTP API.
    pub nomad_addr: String,

    /// How long upstream may hold a blocking query open.
    pub wait: Duration,

    /// Per-poller retry policy applied before a failure is escalated.
    pub retry: RetryPolicy,

    /// Capacity of each session's outbound event queue.
    pub sink_capacity: usize,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 6464)),
            nomad_addr: "http://127.0.0.1:4646".to_string(),
            wait: Duration::from_secs(60),
            retry: RetryPolicy::default(),
            sink_capacity: 64,
        }
    }
}

impl WatchConfig {
    /// Loads configuration from environment variables.
    ///
    /// Falls back to the [`Default`] values when a variable is not set or
    /// does not parse. Calls `dotenvy::dotenv().ok()` to optionally load a
    /// `.env` file.
    ///
    /// | Variable               | Default                 |
    /// |------------------------|-------------------------|
    /// | `LISTEN_ADDR`          | `0.0.0.0:6464`          |
    /// | `NOMAD_ADDR`           | `http://127.0.0.1:4646` |
    /// | `WATCH_WAIT_SECS`      | `60`                    |
    /// | `WATCH_RETRY_MAX`      | `3`                     |
    /// | `WATCH_RETRY_FIRST_MS` | `500`                   |
    /// | `WATCH_RETRY_MAX_MS`   | `10000`                 |
    /// | `WATCH_RETRY_FACTOR`   | `2.0`                   |
    /// | `SINK_CAPACITY`        | `64`                    |
    ///
    /// # Errors
    ///
    /// Returns an error if `LISTEN_ADDR` is set but cannot be parsed as
    /// a [`SocketAddr`].
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        dotenvy::dotenv().ok();
        let defaults = Self::default();

        let listen_addr: SocketAddr = match std::env::var("LISTEN_ADDR") {
            Ok(raw) => raw.parse()?,
            Err(_) => defaults.listen_addr,
        };

        let nomad_addr = std::env::var("NOMAD_ADDR")
            .map(|v| v.trim_end_matches('/').to_string())
            .unwrap_or(defaults.nomad_addr);

        let wait = Duration::from_secs(parse_env("WATCH_WAIT_SECS", defaults.wait.as_secs()));

        let retry = RetryPolicy {
            first: Duration::from_millis(parse_env(
                "WATCH_RETRY_FIRST_MS",
                millis(defaults.retry.first),
            )),
            max: Duration::from_millis(parse_env("WATCH_RETRY_MAX_MS", millis(defaults.retry.max))),
            factor: parse_env("WATCH_RETRY_FACTOR", defaults.retry.factor),
            max_retries: parse_env("WATCH_RETRY_MAX", defaults.retry.max_retries),
        };

        let sink_capacity = parse_env("SINK_CAPACITY", defaults.sink_capacity);

        Ok(Self {
            listen_addr,
            nomad_addr,
            wait,
            retry,
            sink_capacity,
        })
    }
}

fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

/// Parses an environment variable as `T`, returning `default` on missing
/// or invalid values.
fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = WatchConfig::default();
        assert_eq!(config.listen_addr.port(), 6464);
        assert_eq!(config.nomad_addr, "http://127.0.0.1:4646");
        assert_eq!(config.wait, Duration::from_secs(60));
        assert_eq!(config.retry.max_retries, 3);
        assert_eq!(config.sink_capacity, 64);
    }

    #[test]
    fn parse_env_falls_back_on_missing_key() {
        let value: u64 = parse_env("NOMAD_WATCH_TEST_SURELY_UNSET_KEY", 17);
        assert_eq!(value, 17);
    }
}

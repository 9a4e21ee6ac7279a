//! Session configuration.
//!
//! [`ClientConfig`] is fixed at client construction and never mutated.
//! Values can come from the [`ClientBuilder`](super::ClientBuilder) or from
//! `NJSPC_*` environment variables.
//!
//! # Environment Variables
//!
//! | Variable | Field | Format |
//! |----------|-------|--------|
//! | `NJSPC_HOST` | `host` | hostname or IP |
//! | `NJSPC_PORT` | `port` | integer |
//! | `NJSPC_REQUEST_TIMEOUT` | `request_timeout` | seconds, may be fractional |
//! | `NJSPC_AUTO_RECONNECT` | `auto_reconnect` | `true`/`false`/`1`/`0`/`yes`/`no`/`on`/`off` |
//! | `NJSPC_RECONNECT_DELAY` | `reconnect_delay` | seconds |
//! | `NJSPC_MAX_RECONNECT_ATTEMPTS` | `max_reconnect_attempts` | integer, or `none`/`unlimited` |
//! | `NJSPC_WATCHDOG_TIMEOUT` | `watchdog_timeout` | seconds |
//! | `NJSPC_UNKNOWN_EVENTS_LOG` | `unknown_events_log` | path |

// ============================================================================
// Imports
// ============================================================================

use std::path::PathBuf;
use std::time::Duration;

use crate::error::{Error, Result};

// ============================================================================
// Defaults
// ============================================================================

/// Default controller host.
pub const DEFAULT_HOST: &str = "localhost";

/// Default controller port.
pub const DEFAULT_PORT: u16 = 4200;

/// Default timeout for command/query requests.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Reconnect automatically by default.
pub const DEFAULT_AUTO_RECONNECT: bool = true;

/// Default pause between reconnect attempts.
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// Default cap on attempts per retry campaign.
pub const DEFAULT_MAX_RECONNECT_ATTEMPTS: Option<u32> = Some(5);

/// Default idle time before a health probe.
pub const DEFAULT_WATCHDOG_TIMEOUT: Duration = Duration::from_secs(60);

/// Default bound on a push channel connect attempt.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default bound on the status probe.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

// ============================================================================
// ClientConfig
// ============================================================================

/// Immutable session configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Controller hostname or IP address.
    pub host: String,
    /// Controller port (push and command channels share it).
    pub port: u16,
    /// Timeout for command/query requests.
    pub request_timeout: Duration,
    /// Run the connection monitor after `connect`.
    pub auto_reconnect: bool,
    /// Pause before each reconnect attempt.
    pub reconnect_delay: Duration,
    /// Attempts per retry campaign; `None` retries until connected.
    pub max_reconnect_attempts: Option<u32>,
    /// Idle time after which the connection is health-checked.
    pub watchdog_timeout: Duration,
    /// Where to record unrecognized events, if anywhere.
    pub unknown_events_log: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            auto_reconnect: DEFAULT_AUTO_RECONNECT,
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
            max_reconnect_attempts: DEFAULT_MAX_RECONNECT_ATTEMPTS,
            watchdog_timeout: DEFAULT_WATCHDOG_TIMEOUT,
            unknown_events_log: None,
        }
    }
}

impl ClientConfig {
    /// Reads `NJSPC_*` variables from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if a variable is set but cannot be parsed.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads `NJSPC_*` variables through `lookup`. Unset variables keep
    /// their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if a variable is set but cannot be parsed.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(host) = lookup("NJSPC_HOST") {
            config.host = host;
        }
        if let Some(port) = lookup("NJSPC_PORT") {
            config.port = parse_port("NJSPC_PORT", &port)?;
        }
        if let Some(value) = lookup("NJSPC_REQUEST_TIMEOUT") {
            config.request_timeout = parse_seconds("NJSPC_REQUEST_TIMEOUT", &value)?;
        }
        if let Some(value) = lookup("NJSPC_AUTO_RECONNECT") {
            config.auto_reconnect = parse_bool("NJSPC_AUTO_RECONNECT", &value)?;
        }
        if let Some(value) = lookup("NJSPC_RECONNECT_DELAY") {
            config.reconnect_delay = parse_seconds("NJSPC_RECONNECT_DELAY", &value)?;
        }
        if let Some(value) = lookup("NJSPC_MAX_RECONNECT_ATTEMPTS") {
            config.max_reconnect_attempts =
                parse_max_attempts("NJSPC_MAX_RECONNECT_ATTEMPTS", &value)?;
        }
        if let Some(value) = lookup("NJSPC_WATCHDOG_TIMEOUT") {
            config.watchdog_timeout = parse_seconds("NJSPC_WATCHDOG_TIMEOUT", &value)?;
        }
        if let Some(path) = lookup("NJSPC_UNKNOWN_EVENTS_LOG") {
            config.unknown_events_log = Some(PathBuf::from(path));
        }

        Ok(config.normalized())
    }

    /// Applies fallbacks: empty host and port 0 take their defaults, an
    /// empty log path disables the log.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        if self.host.trim().is_empty() {
            self.host = DEFAULT_HOST.to_string();
        }
        if self.port == 0 {
            self.port = DEFAULT_PORT;
        }
        if self
            .unknown_events_log
            .as_ref()
            .is_some_and(|path| path.as_os_str().is_empty())
        {
            self.unknown_events_log = None;
        }
        self
    }

    /// Checks values that would make the client unusable.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for zero request or watchdog timeouts.
    pub fn validate(&self) -> Result<()> {
        if self.request_timeout.is_zero() {
            return Err(Error::config("request_timeout must be greater than zero"));
        }
        if self.watchdog_timeout.is_zero() {
            return Err(Error::config("watchdog_timeout must be greater than zero"));
        }
        Ok(())
    }
}

// ============================================================================
// Parsing
// ============================================================================

fn parse_port(key: &str, value: &str) -> Result<u16> {
    value
        .trim()
        .parse()
        .map_err(|e| Error::config(format!("{key}: invalid port '{value}': {e}")))
}

fn parse_seconds(key: &str, value: &str) -> Result<Duration> {
    let seconds: f64 = value
        .trim()
        .parse()
        .map_err(|e| Error::config(format!("{key}: invalid number '{value}': {e}")))?;

    Duration::try_from_secs_f64(seconds)
        .map_err(|e| Error::config(format!("{key}: invalid duration '{value}': {e}")))
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(Error::config(format!("{key}: invalid boolean '{value}'"))),
    }
}

fn parse_max_attempts(key: &str, value: &str) -> Result<Option<u32>> {
    match value.trim().to_ascii_lowercase().as_str() {
        "" | "none" | "null" | "unlimited" => Ok(None),
        number => number
            .parse()
            .map(Some)
            .map_err(|e| Error::config(format!("{key}: invalid count '{value}': {e}"))),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use rustc_hash::FxHashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: FxHashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.host, "localhost");
        assert_eq!(config.port, 4200);
        assert_eq!(config.request_timeout, Duration::from_secs(10));
        assert!(config.auto_reconnect);
        assert_eq!(config.reconnect_delay, Duration::from_secs(5));
        assert_eq!(config.max_reconnect_attempts, Some(5));
        assert_eq!(config.watchdog_timeout, Duration::from_secs(60));
        assert!(config.unknown_events_log.is_none());
    }

    #[test]
    fn test_empty_lookup_keeps_defaults() {
        let config = ClientConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config, ClientConfig::default());
    }

    #[test]
    fn test_lookup_coerces_values() {
        let config = ClientConfig::from_lookup(lookup_from(&[
            ("NJSPC_HOST", "nixie-poolcontroller"),
            ("NJSPC_PORT", "4201"),
            ("NJSPC_REQUEST_TIMEOUT", "2.5"),
            ("NJSPC_AUTO_RECONNECT", "False"),
            ("NJSPC_RECONNECT_DELAY", "1"),
            ("NJSPC_MAX_RECONNECT_ATTEMPTS", "unlimited"),
            ("NJSPC_WATCHDOG_TIMEOUT", "30"),
            ("NJSPC_UNKNOWN_EVENTS_LOG", "/tmp/unknown.log"),
        ]))
        .unwrap();

        assert_eq!(config.host, "nixie-poolcontroller");
        assert_eq!(config.port, 4201);
        assert_eq!(config.request_timeout, Duration::from_millis(2500));
        assert!(!config.auto_reconnect);
        assert_eq!(config.reconnect_delay, Duration::from_secs(1));
        assert_eq!(config.max_reconnect_attempts, None);
        assert_eq!(config.watchdog_timeout, Duration::from_secs(30));
        assert_eq!(
            config.unknown_events_log,
            Some(PathBuf::from("/tmp/unknown.log"))
        );
    }

    #[test]
    fn test_lookup_applies_fallbacks() {
        let config = ClientConfig::from_lookup(lookup_from(&[
            ("NJSPC_HOST", ""),
            ("NJSPC_PORT", "0"),
            ("NJSPC_UNKNOWN_EVENTS_LOG", ""),
        ]))
        .unwrap();

        assert_eq!(config.host, DEFAULT_HOST);
        assert_eq!(config.port, DEFAULT_PORT);
        assert!(config.unknown_events_log.is_none());
    }

    #[test]
    fn test_lookup_rejects_garbage() {
        for (key, value) in [
            ("NJSPC_PORT", "pool"),
            ("NJSPC_PORT", "70000"),
            ("NJSPC_REQUEST_TIMEOUT", "soon"),
            ("NJSPC_RECONNECT_DELAY", "-1"),
            ("NJSPC_AUTO_RECONNECT", "maybe"),
            ("NJSPC_MAX_RECONNECT_ATTEMPTS", "-3"),
        ] {
            let err = ClientConfig::from_lookup(lookup_from(&[(key, value)])).unwrap_err();
            assert!(
                matches!(err, Error::Config { .. }),
                "{key}={value} should be rejected"
            );
            assert!(err.to_string().contains(key));
        }
    }

    #[test]
    fn test_validate() {
        assert!(ClientConfig::default().validate().is_ok());

        let config = ClientConfig {
            request_timeout: Duration::ZERO,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = ClientConfig {
            watchdog_timeout: Duration::ZERO,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}

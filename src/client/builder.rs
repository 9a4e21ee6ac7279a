//! Builder pattern for client configuration.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use njspc::Client;
//!
//! # fn example() -> njspc::Result<()> {
//! let client = Client::builder()
//!     .host("192.168.1.50")
//!     .port(4200)
//!     .reconnect_delay(Duration::from_secs(2))
//!     .unlimited_reconnect_attempts()
//!     .build()?;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::error::Result;
use crate::transport::{HttpTransport, ReqwestTransport, SocketIoFactory, TransportFactory};

use super::config::ClientConfig;
use super::core::Client;

// ============================================================================
// ClientBuilder
// ============================================================================

/// Builder for configuring a [`Client`].
#[derive(Clone, Default)]
pub struct ClientBuilder {
    config: ClientConfig,
    push_factory: Option<Arc<dyn TransportFactory>>,
    http: Option<Arc<dyn HttpTransport>>,
}

impl fmt::Debug for ClientBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientBuilder")
            .field("config", &self.config)
            .field("custom_push_transport", &self.push_factory.is_some())
            .field("custom_http_transport", &self.http.is_some())
            .finish()
    }
}

// ============================================================================
// ClientBuilder - Constructor
// ============================================================================

impl ClientBuilder {
    /// Creates a builder with default settings.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

// ============================================================================
// ClientBuilder - Configuration
// ============================================================================

impl ClientBuilder {
    /// Sets the controller hostname or IP address.
    #[inline]
    #[must_use]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    /// Sets the controller port.
    #[inline]
    #[must_use]
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    /// Sets the default command/query timeout.
    #[inline]
    #[must_use]
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    /// Enables or disables the connection monitor.
    #[inline]
    #[must_use]
    pub fn auto_reconnect(mut self, enabled: bool) -> Self {
        self.config.auto_reconnect = enabled;
        self
    }

    /// Sets the pause before each reconnect attempt.
    #[inline]
    #[must_use]
    pub fn reconnect_delay(mut self, delay: Duration) -> Self {
        self.config.reconnect_delay = delay;
        self
    }

    /// Caps attempts per retry campaign; `None` means unlimited.
    #[inline]
    #[must_use]
    pub fn max_reconnect_attempts(mut self, max: Option<u32>) -> Self {
        self.config.max_reconnect_attempts = max;
        self
    }

    /// Retries until connected or stopped.
    #[inline]
    #[must_use]
    pub fn unlimited_reconnect_attempts(self) -> Self {
        self.max_reconnect_attempts(None)
    }

    /// Sets the idle time after which the connection is health-checked.
    #[inline]
    #[must_use]
    pub fn watchdog_timeout(mut self, timeout: Duration) -> Self {
        self.config.watchdog_timeout = timeout;
        self
    }

    /// Records unrecognized events to `path`.
    #[inline]
    #[must_use]
    pub fn unknown_events_log(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.unknown_events_log = Some(path.into());
        self
    }

    /// Replaces the whole configuration, e.g. one read with
    /// [`ClientConfig::from_env`].
    #[inline]
    #[must_use]
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }
}

// ============================================================================
// ClientBuilder - Transports
// ============================================================================

impl ClientBuilder {
    /// Uses `factory` for push channel handles instead of Socket.IO.
    #[inline]
    #[must_use]
    pub fn push_transport(mut self, factory: Arc<dyn TransportFactory>) -> Self {
        self.push_factory = Some(factory);
        self
    }

    /// Uses `http` for the command channel instead of `reqwest`.
    #[inline]
    #[must_use]
    pub fn http_transport(mut self, http: Arc<dyn HttpTransport>) -> Self {
        self.http = Some(http);
        self
    }
}

// ============================================================================
// ClientBuilder - Build
// ============================================================================

impl ClientBuilder {
    /// Builds the client. Performs no I/O.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Config`] if a timeout is zero.
    pub fn build(self) -> Result<Client> {
        let config = self.config.normalized();
        config.validate()?;

        let push_factory: Arc<dyn TransportFactory> = match self.push_factory {
            Some(factory) => factory,
            None => Arc::new(SocketIoFactory),
        };
        let http: Arc<dyn HttpTransport> = match self.http {
            Some(http) => http,
            None => Arc::new(ReqwestTransport::new()),
        };

        Ok(Client::new(config, push_factory, http))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use crate::client::config::{DEFAULT_HOST, DEFAULT_PORT};
    use crate::error::Error;

    #[test]
    fn test_builder_defaults() {
        let client = ClientBuilder::new().build().unwrap();
        assert_eq!(client.config(), &ClientConfig::default());
    }

    #[test]
    fn test_builder_setters() {
        let client = ClientBuilder::new()
            .host("pool.local")
            .port(4300)
            .request_timeout(Duration::from_secs(3))
            .auto_reconnect(false)
            .reconnect_delay(Duration::from_secs(1))
            .unlimited_reconnect_attempts()
            .watchdog_timeout(Duration::from_secs(30))
            .unknown_events_log("/tmp/unknown.log")
            .build()
            .unwrap();

        let config = client.config();
        assert_eq!(config.host, "pool.local");
        assert_eq!(config.port, 4300);
        assert_eq!(config.request_timeout, Duration::from_secs(3));
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
    fn test_builder_normalizes_fallbacks() {
        let client = ClientBuilder::new()
            .host("")
            .port(0)
            .unknown_events_log("")
            .build()
            .unwrap();

        assert_eq!(client.config().host, DEFAULT_HOST);
        assert_eq!(client.config().port, DEFAULT_PORT);
        assert!(client.config().unknown_events_log.is_none());
    }

    #[test]
    fn test_builder_rejects_zero_timeouts() {
        let err = ClientBuilder::new()
            .request_timeout(Duration::ZERO)
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::Config { .. }));

        let err = ClientBuilder::new()
            .watchdog_timeout(Duration::ZERO)
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn test_builder_from_config() {
        let config = ClientConfig::from_lookup(|key| {
            (key == "NJSPC_PORT").then(|| "4201".to_string())
        })
        .unwrap();

        let client = ClientBuilder::new().config(config).build().unwrap();
        assert_eq!(client.config().port, 4201);
    }
}

use std::time::Duration;

use crate::error::Error;
use crate::transport::TransportOptions;

/// Configuration for a [`Pool`](crate::Pool) and the clients it builds.
#[derive(Debug, Clone)]
pub struct Config {
    /// Number of clients built up front. Also the maximum number of
    /// concurrent leases.
    pub pool_size: usize,
    /// Budget for establishing one connection.
    pub connect_timeout: Duration,
    /// Budget for one full request/response exchange.
    pub send_timeout: Duration,
    /// Maximum connection age before the client reconnects. `None` keeps
    /// connections for as long as the server allows.
    pub connection_expiry: Option<Duration>,
    /// Total bytes per message buffer (headers + body regions).
    pub buffer_size: usize,
    /// Bytes reserved for the request line and headers.
    pub max_headers_size: usize,
    /// Enable TCP_NODELAY on every connection.
    pub tcp_nodelay: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            pool_size: 16,
            connect_timeout: Duration::from_millis(100),
            send_timeout: Duration::from_secs(1),
            connection_expiry: None,
            buffer_size: 65536,
            max_headers_size: 8192,
            tcp_nodelay: true,
        }
    }
}

impl Config {
    /// Validate configuration values. Returns an error if any value is out of range.
    pub fn validate(&self) -> Result<(), Error> {
        if self.pool_size == 0 {
            return Err(Error::InvalidConfiguration("pool_size must be > 0".into()));
        }
        if self.buffer_size == 0 {
            return Err(Error::InvalidConfiguration(
                "buffer_size must be > 0".into(),
            ));
        }
        if self.max_headers_size > self.buffer_size {
            return Err(Error::InvalidConfiguration(
                "max_headers_size must be <= buffer_size".into(),
            ));
        }
        if self.connect_timeout.is_zero() || self.send_timeout.is_zero() {
            return Err(Error::InvalidConfiguration(
                "connect_timeout and send_timeout must be > 0".into(),
            ));
        }
        if self.connection_expiry.is_some_and(|e| e.is_zero()) {
            return Err(Error::InvalidConfiguration(
                "connection_expiry must be > 0 when set".into(),
            ));
        }
        Ok(())
    }

    pub(crate) fn transport_options(&self) -> TransportOptions {
        TransportOptions {
            tcp_nodelay: self.tcp_nodelay,
        }
    }
}

/// Builder for [`Config`] with discoverable methods and `build()` validation.
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use http_reactor::ConfigBuilder;
///
/// let config = ConfigBuilder::default()
///     .pool_size(64)
///     .connect_timeout(Duration::from_millis(50))
///     .send_timeout(Duration::from_millis(500))
///     .connection_expiry(Duration::from_secs(30))
///     .buffer(16384, 1024)
///     .build()
///     .expect("invalid config");
/// assert_eq!(config.pool_size, 64);
/// ```
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new builder with default config values.
    pub fn new() -> Self {
        Self::default()
    }

    // ── Pool settings ────────────────────────────────────────────────

    /// Number of clients in the pool.
    pub fn pool_size(mut self, n: usize) -> Self {
        self.config.pool_size = n;
        self
    }

    // ── Timing settings ──────────────────────────────────────────────

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    pub fn send_timeout(mut self, timeout: Duration) -> Self {
        self.config.send_timeout = timeout;
        self
    }

    /// Reconnect once a connection is older than `expiry`.
    pub fn connection_expiry(mut self, expiry: Duration) -> Self {
        self.config.connection_expiry = Some(expiry);
        self
    }

    // ── Buffer settings ──────────────────────────────────────────────

    /// Message buffer size and the share of it reserved for headers.
    pub fn buffer(mut self, size: usize, max_headers_size: usize) -> Self {
        self.config.buffer_size = size;
        self.config.max_headers_size = max_headers_size;
        self
    }

    // ── Connection settings ──────────────────────────────────────────

    pub fn tcp_nodelay(mut self, enable: bool) -> Self {
        self.config.tcp_nodelay = enable;
        self
    }

    // ── Terminal ─────────────────────────────────────────────────────

    /// Validate and build the final [`Config`].
    pub fn build(self) -> Result<Config, Error> {
        self.config.validate()?;
        Ok(self.config)
    }
}

use super::codec::HttpCodec;
use crate::dispatch::MissPolicy;
use crate::stream::StreamConfig;
use std::net::SocketAddr;
use std::time::Duration;

/// Default port the mock server listens on
pub const DEFAULT_PORT: u16 = 12345;

/// Configuration for the HTTP mock server
///
/// Extends `StreamConfig` with HTTP-specific options.
///
/// # Examples
///
/// ```rust
/// use nucklee::http::HttpConfig;
/// use nucklee::MissPolicy;
/// use std::time::Duration;
///
/// let config = HttpConfig {
///     bind_addr: "127.0.0.1:12345".parse().unwrap(),
///     max_connections: 100,
///     buffer_size: 8192,
///     max_request_size: 64 * 1024,
///     read_timeout: Duration::from_secs(30),
///     write_timeout: Duration::from_secs(30),
///     server_name: Some("nucklee".to_string()),
///     miss_policy: MissPolicy::NotFound,
/// };
/// ```
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Network address to bind to
    pub bind_addr: SocketAddr,
    /// Maximum number of concurrent connections
    pub max_connections: usize,
    /// Read buffer growth per read
    pub buffer_size: usize,
    /// Upper bound for a request head plus its body
    pub max_request_size: usize,
    /// Read timeout for connections
    pub read_timeout: Duration,
    /// Write timeout for connections
    pub write_timeout: Duration,
    /// `Server` header value added to every response (optional)
    pub server_name: Option<String>,
    /// How requests without a fixture are answered
    pub miss_policy: MissPolicy,
}

impl HttpConfig {
    pub fn codec(&self) -> HttpCodec {
        HttpCodec::new(self.max_request_size, self.server_name.clone())
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)),
            max_connections: 1000,
            buffer_size: 8192,
            max_request_size: 1024 * 1024, // 1MB
            read_timeout: Duration::from_secs(30),
            write_timeout: Duration::from_secs(30),
            server_name: None,
            miss_policy: MissPolicy::default(),
        }
    }
}

impl From<HttpConfig> for StreamConfig {
    fn from(config: HttpConfig) -> Self {
        Self {
            bind_addr: config.bind_addr,
            max_connections: config.max_connections,
            buffer_size: config.buffer_size,
            read_timeout: config.read_timeout,
            write_timeout: config.write_timeout,
        }
    }
}

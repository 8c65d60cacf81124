use crate::fixture::LoadError;
use crate::http::HttpProtocolError;
use thiserror::Error;

/// Error types for the nucklee library
#[derive(Error, Debug)]
pub enum MockError {
    /// TCP-related errors (accept, read, write)
    #[error("TCP error: {0}")]
    Tcp(#[from] std::io::Error),

    /// HTTP framing errors on a connection
    #[error("HTTP error: {0}")]
    Http(HttpProtocolError),

    /// Fixture directory could not be loaded
    #[error("Fixture error: {0}")]
    Load(#[from] LoadError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<HttpProtocolError> for MockError {
    fn from(err: HttpProtocolError) -> Self {
        match err {
            HttpProtocolError::Io(e) => MockError::Tcp(e),
            other => MockError::Http(other),
        }
    }
}

/// Result type for the nucklee library
pub type Result<T> = std::result::Result<T, MockError>;

pub mod cache;
pub mod common;
pub mod dispatch;
pub mod fixture;
pub mod http;
pub mod stream;
pub mod tcp;

// Re-export main types for convenience
pub use cache::{RequestKey, ResponseCache, ResponseRecord};
pub use common::MockServerTrait;
pub use dispatch::{Dispatcher, MissPolicy, Reply};
pub use fixture::{FixtureLoader, FixtureParser, LoaderConfig};
pub use crate::http::{HttpConfig, HttpMockServer};

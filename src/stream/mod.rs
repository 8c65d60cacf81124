//! Stream transport for the mock server
//!
//! The server is generic over the stream protocol so the same HTTP handling
//! runs on any listener/stream pair implementing [`StreamProtocol`].

pub mod config;
pub mod protocol;
pub mod server;

pub use config::StreamConfig;
pub use protocol::StreamProtocol;
pub use server::StreamMockServer;

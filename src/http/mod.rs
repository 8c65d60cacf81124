//! HTTP mock server
//!
//! This module provides the HTTP/1.x framing used to answer inbound requests
//! with recorded fixture responses.

pub mod codec;
pub mod config;


pub use crate::stream::StreamMockServer;
pub use codec::{HttpCodec, HttpProtocolError, InboundRequest, ResponseFrame};
pub use config::{DEFAULT_PORT, HttpConfig};

use crate::tcp::TcpProtocol;

/// Type alias for the HTTP mock server over TCP
pub type HttpMockServer = StreamMockServer<TcpProtocol>;

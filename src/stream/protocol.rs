use super::config::StreamConfig;
use bytes::BytesMut;
use std::future::Future;
use std::net::SocketAddr;

/// Trait for stream-based transports (TCP and friends)
///
/// This trait defines the operations the generic mock server needs from a
/// listener/stream pair.
pub trait StreamProtocol {
    /// Error type for this protocol
    type Error: Send + Into<crate::MockError>;
    /// Listener type for this protocol
    type Listener: Send;
    /// Stream type for this protocol
    type Stream: Send;

    /// Binds a listener to the configured address
    fn bind(config: &StreamConfig) -> impl Future<Output = Result<Self::Listener, Self::Error>> + Send;

    /// Returns the address the listener is actually bound to
    fn local_addr(listener: &Self::Listener) -> Result<SocketAddr, Self::Error>;

    /// Accepts a new connection from the listener
    fn accept(listener: &mut Self::Listener) -> impl Future<Output = Result<(Self::Stream, SocketAddr), Self::Error>> + Send;

    /// Reads available data, appending it to `buffer`; `Ok(0)` means end of stream
    fn read(stream: &mut Self::Stream, buffer: &mut BytesMut) -> impl Future<Output = Result<usize, Self::Error>> + Send;

    /// Writes all of `data` to a stream
    fn write(stream: &mut Self::Stream, data: &[u8]) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Flushes a stream
    fn flush(stream: &mut Self::Stream) -> impl Future<Output = Result<(), Self::Error>> + Send;
}

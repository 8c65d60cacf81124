use crate::MockError;
use crate::stream::{StreamConfig, StreamProtocol};
use bytes::BytesMut;
use std::net::SocketAddr;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// TCP transport for the mock server
pub struct TcpProtocol;

impl StreamProtocol for TcpProtocol {
    type Error = MockError;
    type Listener = TcpListener;
    type Stream = TcpStream;

    fn bind(config: &StreamConfig) -> impl std::future::Future<Output = Result<TcpListener, MockError>> + Send {
        let bind_addr = config.bind_addr;
        async move {
            TcpListener::bind(bind_addr)
                .await
                .map_err(|e| MockError::Config(format!("Failed to bind TCP listener on {bind_addr}: {e}")))
        }
    }

    fn local_addr(listener: &TcpListener) -> Result<SocketAddr, MockError> {
        listener.local_addr().map_err(MockError::Tcp)
    }

    fn accept(listener: &mut TcpListener) -> impl std::future::Future<Output = Result<(TcpStream, SocketAddr), MockError>> + Send {
        async move {
            let (stream, addr) = listener.accept().await.map_err(MockError::Tcp)?;
            // Responses are written in one piece, no need to wait for coalescing
            stream.set_nodelay(true).map_err(MockError::Tcp)?;
            Ok((stream, addr))
        }
    }

    fn read(stream: &mut TcpStream, buffer: &mut BytesMut) -> impl std::future::Future<Output = Result<usize, MockError>> + Send {
        async move { stream.read_buf(buffer).await.map_err(MockError::Tcp) }
    }

    fn write(stream: &mut TcpStream, data: &[u8]) -> impl std::future::Future<Output = Result<(), MockError>> + Send {
        async move { stream.write_all(data).await.map_err(MockError::Tcp) }
    }

    fn flush(stream: &mut TcpStream) -> impl std::future::Future<Output = Result<(), MockError>> + Send {
        async move { stream.flush().await.map_err(MockError::Tcp) }
    }
}

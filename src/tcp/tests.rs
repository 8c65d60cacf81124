use super::TcpProtocol;
use crate::stream::{StreamConfig, StreamProtocol};
use bytes::BytesMut;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;

#[tokio::test]
async fn test_tcp_protocol_bind_and_accept() {
    let config = StreamConfig::default();

    let mut listener = TcpProtocol::bind(&config).await.unwrap();
    let addr = TcpProtocol::local_addr(&listener).unwrap();
    assert_ne!(addr.port(), 0);

    let client_handle = tokio::spawn(async move { TcpStream::connect(addr).await.unwrap() });

    let (_stream, client_addr) = TcpProtocol::accept(&mut listener).await.unwrap();
    assert!(client_addr.ip().is_loopback());

    let _client_stream = client_handle.await.unwrap();
}

#[tokio::test]
async fn test_tcp_protocol_read_appends() {
    let config = StreamConfig::default();
    let mut listener = TcpProtocol::bind(&config).await.unwrap();
    let addr = TcpProtocol::local_addr(&listener).unwrap();

    let client_handle = tokio::spawn(async move {
        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream.write_all(b"hello").await.unwrap();
        stream.flush().await.unwrap();
        stream
    });

    let (mut stream, _) = TcpProtocol::accept(&mut listener).await.unwrap();
    let mut buffer = BytesMut::from(&b">"[..]);
    let mut total = 0;
    while total < 5 {
        total += TcpProtocol::read(&mut stream, &mut buffer).await.unwrap();
    }

    assert_eq!(&buffer[..], b">hello");
    drop(client_handle.await.unwrap());
}

#[tokio::test]
async fn test_tcp_protocol_bind_conflict() {
    let config = StreamConfig::default();
    let listener = TcpProtocol::bind(&config).await.unwrap();
    let taken = StreamConfig {
        bind_addr: TcpProtocol::local_addr(&listener).unwrap(),
        ..Default::default()
    };

    let result = TcpProtocol::bind(&taken).await;
    assert!(matches!(result, Err(crate::MockError::Config(_))));
}

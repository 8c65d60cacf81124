use crate::cache::ResponseCache;
use crate::dispatch::MissPolicy;
use crate::http::{HttpConfig, HttpMockServer};
use crate::stream::StreamProtocol;
use crate::tcp::TcpProtocol;
use crate::Result;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Spawns a mock server on an ephemeral loopback port for integration tests
///
/// The listener is bound before the server task starts, so the returned
/// address accepts connections immediately.
pub async fn spawn_test_server(
    cache: ResponseCache,
    miss_policy: MissPolicy,
) -> Result<(JoinHandle<Result<()>>, SocketAddr)> {
    let config = HttpConfig {
        bind_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
        max_connections: 10,
        read_timeout: Duration::from_secs(5),
        write_timeout: Duration::from_secs(5),
        miss_policy,
        ..Default::default()
    };

    let server = HttpMockServer::from_http_config(config, cache);
    let listener = TcpProtocol::bind(server.config()).await?;
    let addr = TcpProtocol::local_addr(&listener)?;

    let server_handle = tokio::spawn(async move { server.serve(listener).await });

    Ok((server_handle, addr))
}

use super::{StreamConfig, StreamProtocol};
use crate::cache::{ResponseCache, ResponseRecord};
use crate::common::MockServerTrait;
use crate::dispatch::Dispatcher;
use crate::http::{HttpCodec, HttpConfig, ResponseFrame};
use crate::{MockError, Result};
use async_trait::async_trait;
use bytes::BytesMut;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::{signal, time::timeout};
use tokio_util::codec::{Decoder, Encoder};
use tracing::{debug, error, info, warn, Instrument};

/// Generic stream-based mock server that works with any stream protocol
///
/// Each accepted connection is served by its own task. Requests are decoded
/// with [`HttpCodec`], answered by the shared [`Dispatcher`] and written back;
/// the connection stays open while the client asks for keep-alive.
///
/// # Examples
///
/// ```no_run
/// use nucklee::common::MockServerTrait;
/// use nucklee::http::{HttpConfig, HttpMockServer};
/// use nucklee::fixture::{FixtureLoader, LoaderConfig};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let (cache, _) = FixtureLoader::new(LoaderConfig::default()).load()?;
///     let server = HttpMockServer::from_http_config(HttpConfig::default(), cache);
///     server.run().await?;
///     Ok(())
/// }
/// ```
pub struct StreamMockServer<P: StreamProtocol> {
    config: StreamConfig,
    codec: HttpCodec,
    dispatcher: Arc<Dispatcher>,
    protocol: std::marker::PhantomData<P>,
    shutdown_signal: Arc<tokio::sync::broadcast::Sender<()>>,
}

impl<P> StreamMockServer<P>
where
    P: StreamProtocol + Send + Sync + 'static,
    P::Error: Into<MockError> + std::fmt::Display,
    P::Stream: 'static,
{
    /// Creates a new server answering from `dispatcher`
    pub fn new(config: StreamConfig, codec: HttpCodec, dispatcher: Arc<Dispatcher>) -> Self {
        let (shutdown_signal, _) = tokio::sync::broadcast::channel(1);
        Self {
            config,
            codec,
            dispatcher,
            protocol: std::marker::PhantomData,
            shutdown_signal: Arc::new(shutdown_signal),
        }
    }

    /// Creates a server from an HTTP configuration and a loaded cache
    pub fn from_http_config(config: HttpConfig, cache: ResponseCache) -> Self {
        let codec = config.codec();
        let dispatcher = Dispatcher::new(Arc::new(cache), config.miss_policy);
        Self::new(config.into(), codec, Arc::new(dispatcher))
    }

    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    /// Accepts connections on an already bound listener until shutdown
    pub async fn serve(&self, mut listener: P::Listener) -> Result<()> {
        let local_addr = P::local_addr(&listener).map_err(Into::<MockError>::into)?;
        info!(
            address = %local_addr,
            fixtures = self.dispatcher.cache().len(),
            miss_policy = ?self.dispatcher.miss_policy(),
            "Mock server listening"
        );

        let connection_count = Arc::new(AtomicUsize::new(0));
        let mut shutdown_rx = self.shutdown_signal.subscribe();

        loop {
            tokio::select! {
                accept_result = P::accept(&mut listener) => {
                    match accept_result {
                        Ok((stream, addr)) => {
                            let current_count = connection_count.load(Ordering::SeqCst);
                            if current_count >= self.config.max_connections {
                                warn!(%addr, current = current_count, limit = self.config.max_connections, "Connection rejected: limit reached");
                                continue;
                            }

                            let new_count = connection_count.fetch_add(1, Ordering::SeqCst) + 1;
                            debug!(%addr, current = new_count, "Accepted connection");

                            let config = self.config.clone();
                            let codec = self.codec.clone();
                            let dispatcher = self.dispatcher.clone();
                            let connection_count = connection_count.clone();
                            let span = tracing::info_span!("connection", %addr);

                            tokio::spawn(async move {
                                let result = Self::handle_connection(stream, addr, config, codec, dispatcher)
                                    .instrument(span)
                                    .await;
                                if let Err(e) = result {
                                    error!(%addr, error = %e, "Error handling connection");
                                }
                                let final_count = connection_count.fetch_sub(1, Ordering::SeqCst) - 1;
                                debug!(%addr, current = final_count, "Connection closed");
                            });
                        }
                        Err(e) => {
                            error!(error = %e, "Failed to accept connection");
                        }
                    }
                }
                _ = signal::ctrl_c() => {
                    info!("Received shutdown signal, stopping server");
                    break;
                }
                _ = shutdown_rx.recv() => {
                    info!("Received internal shutdown signal, stopping server");
                    break;
                }
            }
        }

        info!("Mock server stopped");
        Ok(())
    }

    /// Serves requests on a single connection
    async fn handle_connection(
        mut stream: P::Stream,
        addr: SocketAddr,
        config: StreamConfig,
        mut codec: HttpCodec,
        dispatcher: Arc<Dispatcher>,
    ) -> Result<()> {
        let mut buffer = BytesMut::with_capacity(config.buffer_size);
        let mut response = BytesMut::new();

        loop {
            let request = match codec.decode(&mut buffer) {
                Ok(Some(request)) => request,
                Ok(None) => {
                    buffer.reserve(config.buffer_size);
                    let read_result = timeout(config.read_timeout, P::read(&mut stream, &mut buffer)).await;
                    match read_result {
                        Ok(Ok(0)) => {
                            if !buffer.is_empty() {
                                warn!(%addr, pending = buffer.len(), "Client closed connection mid-request");
                            }
                            break;
                        }
                        Ok(Ok(n)) => {
                            debug!(%addr, size = n, "Received data");
                            continue;
                        }
                        Ok(Err(e)) => return Err(e.into()),
                        Err(_) if buffer.is_empty() => {
                            debug!(%addr, "Idle connection timed out");
                            break;
                        }
                        Err(_) => {
                            warn!(%addr, "Read timeout");
                            break;
                        }
                    }
                }
                Err(e) => {
                    warn!(%addr, error = %e, "Rejecting request");
                    let Some(status) = e.status() else {
                        return Err(e.into());
                    };
                    let empty = ResponseRecord::default();
                    response.clear();
                    codec.encode(
                        ResponseFrame {
                            status,
                            record: &empty,
                            keep_alive: false,
                            include_body: true,
                        },
                        &mut response,
                    )?;
                    Self::write_response(&mut stream, addr, &config, &response).await?;
                    break;
                }
            };

            let key = request.key();
            let reply = dispatcher.dispatch(&key);
            info!(
                %addr,
                %key,
                version = request.version,
                status = reply.status.as_u16(),
                matched = reply.matched,
                "Served request"
            );

            response.clear();
            codec.encode(
                ResponseFrame {
                    status: reply.status,
                    record: &reply.record,
                    keep_alive: request.keep_alive,
                    include_body: !request.is_head(),
                },
                &mut response,
            )?;

            if !Self::write_response(&mut stream, addr, &config, &response).await? {
                break;
            }
            if !request.keep_alive {
                break;
            }
        }

        Ok(())
    }

    /// Writes one encoded response; `Ok(false)` means the write timed out
    async fn write_response(
        stream: &mut P::Stream,
        addr: SocketAddr,
        config: &StreamConfig,
        data: &[u8],
    ) -> Result<bool> {
        let write_result = timeout(config.write_timeout, P::write(stream, data)).await;
        match write_result {
            Ok(Ok(())) => {
                P::flush(stream).await.map_err(Into::<MockError>::into)?;
                debug!(%addr, size = data.len(), "Wrote response");
                Ok(true)
            }
            Ok(Err(e)) => Err(e.into()),
            Err(_) => {
                warn!(%addr, "Write timeout");
                Ok(false)
            }
        }
    }
}

#[async_trait]
impl<P> MockServerTrait for StreamMockServer<P>
where
    P: StreamProtocol + Send + Sync + 'static,
    P::Error: Into<MockError> + std::fmt::Display,
    P::Stream: 'static,
{
    /// Binds the configured address and serves until shutdown
    async fn run(&self) -> Result<()> {
        let listener = P::bind(&self.config).await.map_err(Into::<MockError>::into)?;
        self.serve(listener).await
    }

    fn shutdown_signal(&self) -> tokio::sync::broadcast::Sender<()> {
        self.shutdown_signal.as_ref().clone()
    }
}

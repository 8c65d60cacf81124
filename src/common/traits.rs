use crate::Result;
use async_trait::async_trait;

/// Common interface of the mock servers
#[async_trait]
pub trait MockServerTrait {
    /// Starts the server and serves requests until shutdown
    async fn run(&self) -> Result<()>;

    /// Returns a shutdown signal sender that can be used to gracefully shutdown the server
    fn shutdown_signal(&self) -> tokio::sync::broadcast::Sender<()>;
}

use color_eyre::eyre::{Result, WrapErr};
use nucklee::fixture::loader::DEFAULT_ROOT;
use nucklee::http::DEFAULT_PORT;
use nucklee::{FixtureLoader, HttpConfig, HttpMockServer, LoaderConfig, MockServerTrait};
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize error handling
    color_eyre::install()?;

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("nucklee=info")),
        )
        .init();

    // Usage: nucklee [fixture_dir] [port]
    let args: Vec<String> = std::env::args().collect();

    let root = args
        .get(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_ROOT));
    let port = match args.get(2) {
        Some(port) => port
            .parse::<u16>()
            .wrap_err_with(|| format!("Invalid port {port:?}"))?,
        None => DEFAULT_PORT,
    };

    let loader = FixtureLoader::new(LoaderConfig {
        root,
        ..Default::default()
    });
    let root = loader.config().root.display();
    let (cache, report) = loader
        .load()
        .wrap_err_with(|| format!("Failed to load fixtures from {root}"))?;

    if report.files_failed > 0 || report.blocks_skipped > 0 {
        warn!(
            %root,
            files_failed = report.files_failed,
            blocks_skipped = report.blocks_skipped,
            "Some fixtures could not be loaded"
        );
    }

    if cache.is_empty() {
        info!(%root, "No fixtures found, nothing to serve");
        return Ok(());
    }

    let config = HttpConfig {
        bind_addr: SocketAddr::from(([0, 0, 0, 0], port)),
        ..Default::default()
    };

    info!(
        requests = cache.len(),
        files = report.files_loaded,
        %root,
        port,
        "Serving cached requests"
    );

    let server = HttpMockServer::from_http_config(config, cache);
    server.run().await.wrap_err("Failed to run mock server")?;

    Ok(())
}

//! Bucketgate server.
//!
//! Serves objects from remote buckets under short path aliases: with
//! `BUCKET_ALIASES=static=my-bucket`, a request for `/static/css/app.css`
//! returns object `css/app.css` from bucket `my-bucket`.
//!
//! # Usage
//!
//! ```text
//! BUCKET_ALIASES=static=my-bucket,img=my-images bucketgate-server
//! ```
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `GATEWAY_LISTEN` | `0.0.0.0:8080` | Bind address |
//! | `BUCKET_ALIASES` | *(empty)* | Comma-separated `alias=bucket` pairs |
//! | `GATEWAY_CONFIG_FILE` | *(unset)* | JSON config file, overridden by env vars |
//! | `STORAGE_BACKEND` | `s3` | `s3` or `local` |
//! | `STORAGE_CREDENTIALS_FILE` | *(unset)* | Shared-credentials file for the S3 backend |
//! | `STORAGE_ENDPOINT_URL` | *(unset)* | Custom S3 endpoint |
//! | `STORAGE_REGION` | `us-east-1` | S3 region |
//! | `STORAGE_FORCE_PATH_STYLE` | `false` | Path-style S3 addressing |
//! | `LOCAL_STORAGE_ROOT` | `./data` | Root directory for the local backend |
//! | `ALIAS_INDEX_HTML` | `false` | Serve the index document for directory paths |
//! | `INDEX_DOCUMENT` | `index.html` | Index document name |
//! | `LOG_LEVEL` | `info` | Log level filter |
//! | `RUST_LOG` | *(unset)* | Fine-grained tracing filter (overrides `LOG_LEVEL`) |

mod gateway;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use bucketgate_core::{GatewayConfig, StorageBackend};
use bucketgate_http::BucketProxyService;
use bucketgate_storage::{LocalObjectFetcher, S3ObjectFetcher, S3Settings, SharedFetcher};
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as HttpConnBuilder;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::gateway::{GatewayService, HEALTH_PATH};

/// Server version reported at startup.
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the tracing subscriber.
///
/// Uses `RUST_LOG` if set, otherwise falls back to the `LOG_LEVEL` config value.
fn init_tracing(log_level: &str) -> Result<()> {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::try_new(log_level)
            .with_context(|| format!("invalid log level filter: {log_level}"))?
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    Ok(())
}

/// Build the [`S3Settings`] from the gateway configuration.
fn build_s3_settings(config: &GatewayConfig) -> S3Settings {
    S3Settings {
        credentials_path: config.credentials_path.as_ref().map(PathBuf::from),
        endpoint_url: config.storage_endpoint.clone(),
        region: config.storage_region.clone(),
        force_path_style: config.force_path_style,
    }
}

/// Create the storage collaborator selected by `STORAGE_BACKEND`.
async fn build_fetcher(config: &GatewayConfig) -> SharedFetcher {
    match config.storage_backend {
        StorageBackend::S3 => {
            let settings = build_s3_settings(config);
            info!(
                endpoint = ?settings.endpoint_url,
                region = %settings.region,
                force_path_style = settings.force_path_style,
                credentials_file = settings.credentials_path.is_some(),
                "initializing S3 storage backend",
            );
            Arc::new(S3ObjectFetcher::from_settings(&settings).await)
        }
        StorageBackend::Local => {
            info!(root = %config.local_storage_root, "initializing local storage backend");
            Arc::new(LocalObjectFetcher::new(&config.local_storage_root))
        }
    }
}

/// Run the accept loop, serving connections until a shutdown signal is received.
async fn serve(listener: TcpListener, service: GatewayService) -> Result<()> {
    let graceful = hyper_util::server::graceful::GracefulShutdown::new();
    let http = HttpConnBuilder::new(TokioExecutor::new());

    let shutdown = async {
        tokio::signal::ctrl_c().await.ok();
        info!("received shutdown signal, draining connections");
    };

    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            result = listener.accept() => {
                let (stream, peer_addr) = match result {
                    Ok(conn) => conn,
                    Err(e) => {
                        warn!(error = %e, "failed to accept connection");
                        continue;
                    }
                };

                let svc = service.clone();
                let conn = http.serve_connection(TokioIo::new(stream), svc);
                let conn = graceful.watch(conn.into_owned());

                // A failed object stream ends up here and only drops this connection.
                tokio::spawn(async move {
                    if let Err(e) = conn.await {
                        error!(peer_addr = %peer_addr, error = %e, "connection error");
                    }
                });
            }

            () = &mut shutdown => {
                info!("shutting down gracefully");
                break;
            }
        }
    }

    graceful.shutdown().await;
    info!("all connections drained, exiting");

    Ok(())
}

/// Probe the health endpoint of a running server.
///
/// Succeeds if the response is 200 OK and reports the server as running.
async fn run_health_check(addr: &str) -> Result<()> {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    let stream = TcpStream::connect(addr)
        .await
        .with_context(|| format!("cannot connect to {addr}"))?;

    let (mut reader, mut writer) = stream.into_split();

    let request = format!("GET {HEALTH_PATH} HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n\r\n");
    writer.write_all(request.as_bytes()).await?;
    writer.shutdown().await?;

    let mut response = String::new();
    reader.read_to_string(&mut response).await?;

    if response.contains("200 OK") && response.contains("\"running\"") {
        Ok(())
    } else {
        anyhow::bail!("unhealthy response from {addr}")
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = GatewayConfig::from_env().context("failed to load gateway configuration")?;

    // Handle --health-check flag for Docker HEALTHCHECK.
    if std::env::args().any(|a| a == "--health-check") {
        let addr = config.gateway_listen.replace("0.0.0.0", "127.0.0.1");
        let healthy = run_health_check(&addr).await.is_ok();
        std::process::exit(i32::from(!healthy));
    }

    init_tracing(&config.log_level)?;

    let router = config
        .alias_router()
        .context("invalid bucket alias configuration")?;

    if router.table().is_empty() {
        warn!("no bucket aliases configured, every request will return 404");
    }
    for (alias, bucket) in router.table().iter() {
        info!(alias, bucket, "registered bucket alias");
    }
    if let Some(document) = router.index_document() {
        info!(document, "index document mode enabled");
    }

    let fetcher = build_fetcher(&config).await;
    let gateway = GatewayService::new(BucketProxyService::new(router, fetcher));

    let addr: SocketAddr = config
        .gateway_listen
        .parse()
        .with_context(|| format!("invalid bind address: {}", config.gateway_listen))?;

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind to {addr}"))?;

    info!(
        %addr,
        backend = %config.storage_backend,
        version = VERSION,
        "starting bucketgate server",
    );

    serve(listener, gateway).await
}

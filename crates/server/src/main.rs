use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use filestream_core::{FileMetadata, MessageId, RemoteFileId};
use filestream_gateway::GatewayBuilder;
use filestream_server::api::AppState;
use filestream_server::config::{FilestreamConfig, LINK_SECRET_ENV};
use filestream_worker::start_pool;

const PUBLIC_IP_URL: &str = "https://api.ipify.org";

/// Filestream HTTP server.
#[derive(Parser, Debug)]
#[command(
    name = "filestream-server",
    about = "Serve files from a chat-based store as streamable links"
)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, global = true, default_value = "filestream.toml")]
    config: String,

    /// Override the bind host.
    #[arg(long, global = true)]
    host: Option<String>,

    /// Override the bind port.
    #[arg(long, global = true)]
    port: Option<u16>,

    /// Development mode (debug logging).
    #[arg(long, global = true)]
    dev: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the server (default).
    Run,
    /// Compute the link hash of a file offline, using the configured codec.
    Hash {
        /// File name as reported by the backing store.
        #[arg(long)]
        name: String,
        /// File size in bytes.
        #[arg(long)]
        size: u64,
        /// MIME type.
        #[arg(long, default_value = "")]
        mime: String,
        /// Remote file identifier.
        #[arg(long)]
        remote_id: String,
    },
}

#[tokio::main]
#[allow(clippy::too_many_lines)]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let (mut config, found) = FilestreamConfig::load(&cli.config)?;

    if let Some(Commands::Hash {
        name,
        size,
        mime,
        remote_id,
    }) = cli.command
    {
        let codec = config.links.codec(std::env::var(LINK_SECRET_ENV).ok())?;
        let metadata = FileMetadata {
            message_id: MessageId::new(0),
            file_name: name,
            file_size: size,
            mime_type: mime,
            remote_file_id: RemoteFileId::new(remote_id),
        };
        println!("{}", codec.hash(&metadata));
        return Ok(());
    }

    // CLI overrides take precedence.
    if let Some(host) = cli.host {
        config.server.host = host;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    let dev = cli.dev || config.server.dev;

    let telemetry_guard = filestream_server::telemetry::init(&config.telemetry, dev);

    if !found {
        info!(path = %cli.config, "config file not found, using defaults");
    }

    // A primary session that fails to start aborts startup.
    let bootstrap = filestream_server::worker_factory::create_bootstrap(&config.workers).await?;
    let pool = Arc::new(start_pool(bootstrap.as_ref()).await?);

    let codec = config.links.codec(std::env::var(LINK_SECRET_ENV).ok())?;
    if !codec.is_keyed() {
        warn!("links.secret is not set, link hashes can be computed by anyone who knows a file's attributes");
    }

    let public_url = config.server.resolved_public_url(config.tls.enabled);
    let mut builder = GatewayBuilder::new()
        .pool(Arc::clone(&pool))
        .public_url(public_url.clone())
        .codec(codec)
        .cache_capacity(config.cache.max_entries)
        .fetch_timeout(config.workers.fetch_timeout());
    if let Some(ttl) = config.cache.ttl() {
        builder = builder.cache_ttl(ttl);
    }
    let gateway = Arc::new(builder.build()?);

    let app = filestream_server::api::router(AppState::new(gateway));

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(
        version = env!("CARGO_PKG_VERSION"),
        address = %addr,
        public_url = %public_url,
        workers = pool.len(),
        tls = config.tls.enabled,
        "filestream-server listening"
    );
    if config.server.lookup_public_ip {
        tokio::spawn(log_public_ip());
    }

    let shutdown_timeout = Duration::from_secs(config.server.shutdown_timeout_seconds);
    if config.tls.enabled {
        let acceptor = filestream_server::tls::acceptor_from_config(&config.tls)?;
        filestream_server::tls::serve_tls(
            listener,
            acceptor,
            app,
            shutdown_signal(),
            shutdown_timeout,
        )
        .await;
    } else {
        // Open streams can outlive the shutdown signal; stop waiting for
        // them after the configured timeout.
        let (signalled_tx, signalled_rx) = oneshot::channel();
        let server = axum::serve(listener, app).with_graceful_shutdown(async move {
            shutdown_signal().await;
            let _ = signalled_tx.send(());
        });
        tokio::select! {
            result = server => result?,
            () = async {
                let _ = signalled_rx.await;
                tokio::time::sleep(shutdown_timeout).await;
            } => {
                warn!(
                    timeout_secs = config.server.shutdown_timeout_seconds,
                    "shutdown timeout exceeded, dropping open streams"
                );
            }
        }
    }

    // Flush pending OpenTelemetry spans before exit.
    telemetry_guard.shutdown();

    info!("filestream-server shut down");
    Ok(())
}

/// Log the machine's public IP. Best effort: failures are only logged at
/// debug level.
async fn log_public_ip() {
    let lookup = async {
        reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()?
            .get(PUBLIC_IP_URL)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await
    };
    match lookup.await {
        Ok(ip) => info!(public_ip = %ip.trim(), "public IP resolved"),
        Err(e) => debug!(error = %e, "public IP lookup failed"),
    }
}

/// Wait for SIGINT (Ctrl+C) or SIGTERM, then return to trigger graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => { info!("received SIGINT"); }
        () = terminate => { info!("received SIGTERM"); }
    }
}

//! HTTPS termination.
//!
//! Loads the server certificate and key into a `rustls` configuration and
//! runs an accept loop that hands each TLS stream to the axum router.

use std::fs;
use std::future::Future;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use hyper_util::rt::{TokioExecutor, TokioIo};
use rustls::pki_types::{CertificateDer, PrivateKeyDer};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpListener;
use tokio_rustls::TlsAcceptor;
use tokio_rustls::server::TlsStream;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tower::ServiceExt;
use tracing::{debug, info, warn};

use crate::config::TlsConfig;

/// Errors that can occur during TLS setup.
#[derive(Debug, Error)]
pub enum TlsError {
    /// Failed to read a file from disk.
    #[error("failed to read {path}: {source}")]
    FileRead {
        path: String,
        source: std::io::Error,
    },

    /// No certificates were found in the PEM file.
    #[error("no certificates found in {0}")]
    NoCertificates(String),

    /// No private key was found in the PEM file.
    #[error("no private key found in {0}")]
    NoPrivateKey(String),

    /// The `[tls]` section is incomplete or invalid.
    #[error("invalid TLS configuration: {0}")]
    InvalidConfig(String),

    /// The `rustls` configuration could not be built.
    #[error("rustls config error: {0}")]
    RustlsConfig(String),
}

fn open_pem(path: &Path) -> Result<BufReader<fs::File>, TlsError> {
    fs::File::open(path)
        .map(BufReader::new)
        .map_err(|source| read_error(path, source))
}

fn read_error(path: &Path, source: std::io::Error) -> TlsError {
    TlsError::FileRead {
        path: path.display().to_string(),
        source,
    }
}

/// Load a PEM certificate chain from a file.
pub fn load_certs(path: impl AsRef<Path>) -> Result<Vec<CertificateDer<'static>>, TlsError> {
    let path = path.as_ref();
    let certs = rustls_pemfile::certs(&mut open_pem(path)?)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| read_error(path, e))?;
    if certs.is_empty() {
        return Err(TlsError::NoCertificates(path.display().to_string()));
    }
    Ok(certs)
}

/// Load the first PKCS#8, RSA or EC private key from a PEM file.
pub fn load_private_key(path: impl AsRef<Path>) -> Result<PrivateKeyDer<'static>, TlsError> {
    let path = path.as_ref();
    rustls_pemfile::private_key(&mut open_pem(path)?)
        .map_err(|e| read_error(path, e))?
        .ok_or_else(|| TlsError::NoPrivateKey(path.display().to_string()))
}

/// Minimum TLS protocol version.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MinTlsVersion {
    /// TLS 1.2 (default).
    #[default]
    Tls12,
    /// TLS 1.3.
    Tls13,
}

impl MinTlsVersion {
    /// Parse a version string like `"1.2"` or `"1.3"`.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "1.2" => Some(Self::Tls12),
            "1.3" => Some(Self::Tls13),
            _ => None,
        }
    }
}

/// Build a `rustls::ServerConfig` from a certificate chain and key.
pub fn build_server_config(
    cert_path: &str,
    key_path: &str,
    min_version: MinTlsVersion,
) -> Result<Arc<rustls::ServerConfig>, TlsError> {
    let certs = load_certs(cert_path)?;
    let key = load_private_key(key_path)?;

    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let versions: &[&'static rustls::SupportedProtocolVersion] = match min_version {
        MinTlsVersion::Tls12 => &[&rustls::version::TLS12, &rustls::version::TLS13],
        MinTlsVersion::Tls13 => &[&rustls::version::TLS13],
    };
    let mut config = rustls::ServerConfig::builder_with_provider(provider)
        .with_protocol_versions(versions)
        .map_err(|e| TlsError::RustlsConfig(e.to_string()))?
        .with_no_client_auth()
        .with_single_cert(certs, key)
        .map_err(|e| TlsError::RustlsConfig(e.to_string()))?;
    config.alpn_protocols = vec![b"h2".to_vec(), b"http/1.1".to_vec()];

    Ok(Arc::new(config))
}

/// Build a TLS acceptor from the `[tls]` section.
pub fn acceptor_from_config(config: &TlsConfig) -> Result<TlsAcceptor, TlsError> {
    let cert_path = config
        .cert_path
        .as_deref()
        .ok_or_else(|| TlsError::InvalidConfig("cert_path is required".into()))?;
    let key_path = config
        .key_path
        .as_deref()
        .ok_or_else(|| TlsError::InvalidConfig("key_path is required".into()))?;
    let min_version = MinTlsVersion::parse(&config.min_version).ok_or_else(|| {
        TlsError::InvalidConfig(format!("unsupported min_version {:?}", config.min_version))
    })?;

    let server_config = build_server_config(cert_path, key_path, min_version)?;
    Ok(TlsAcceptor::from(server_config))
}

/// Pause after a failed `accept()` so persistent errors (EMFILE) do not spin.
const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(100);
/// Clients that have not finished the handshake by then are dropped.
const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

async fn handshake<S>(
    acceptor: &TlsAcceptor,
    stream: S,
    limit: Duration,
) -> std::io::Result<TlsStream<S>>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    tokio::time::timeout(limit, acceptor.accept(stream))
        .await
        .map_err(|_| std::io::Error::new(std::io::ErrorKind::TimedOut, "TLS handshake timed out"))?
}

/// Serve `app` over TLS until `shutdown` resolves.
///
/// Open connections are asked to finish their in-flight requests and are
/// given `drain_timeout` to do so before the loop returns.
pub async fn serve_tls<F>(
    listener: TcpListener,
    acceptor: TlsAcceptor,
    app: Router,
    shutdown: F,
    drain_timeout: Duration,
) where
    F: Future<Output = ()> + Send,
{
    let tracker = TaskTracker::new();
    let cancel = CancellationToken::new();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            result = listener.accept() => {
                let (tcp_stream, remote_addr) = match result {
                    Ok(accepted) => accepted,
                    Err(e) => {
                        warn!(error = %e, "failed to accept connection");
                        tokio::time::sleep(ACCEPT_ERROR_BACKOFF).await;
                        continue;
                    }
                };
                let acceptor = acceptor.clone();
                let app = app.clone();
                let cancel = cancel.clone();

                tracker.spawn(async move {
                    let tls_stream = match handshake(&acceptor, tcp_stream, HANDSHAKE_TIMEOUT).await {
                        Ok(stream) => stream,
                        Err(e) => {
                            debug!(%remote_addr, error = %e, "TLS handshake failed");
                            return;
                        }
                    };

                    let io = TokioIo::new(tls_stream);
                    let hyper_service = hyper::service::service_fn(
                        move |request: hyper::Request<hyper::body::Incoming>| {
                            app.clone().oneshot(request)
                        },
                    );

                    let builder = hyper_util::server::conn::auto::Builder::new(TokioExecutor::new());
                    let conn = builder.serve_connection(io, hyper_service);
                    tokio::pin!(conn);

                    tokio::select! {
                        result = conn.as_mut() => {
                            if let Err(e) = result {
                                debug!(%remote_addr, error = %e, "connection closed with error");
                            }
                        }
                        () = cancel.cancelled() => {
                            conn.as_mut().graceful_shutdown();
                            let _ = conn.await;
                        }
                    }
                });
            }
            () = &mut shutdown => {
                break;
            }
        }
    }

    drop(listener);
    cancel.cancel();
    tracker.close();

    info!(connections = tracker.len(), "draining TLS connections");
    if tokio::time::timeout(drain_timeout, tracker.wait())
        .await
        .is_err()
    {
        warn!(
            timeout_secs = drain_timeout.as_secs(),
            "shutdown timeout exceeded, dropping open connections"
        );
    }
}

//! APR Server - Main entry point.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use apr_api::AppState;
use apr_auth::{AuthGate, TokenConfig, TokenIssuer, TokenVerifier};
use apr_crypto::{KeyStore, Keypair};
use apr_storage::MemoryCredentialStore;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "apr-server")]
#[command(about = "APR - token issuing and verification server")]
#[command(version)]
struct Cli {
    /// Server bind address
    #[arg(long, default_value = "0.0.0.0:7887", env = "APR_BIND_ADDRESS")]
    bind: String,

    /// PEM-encoded RSA private key (PKCS#1 or PKCS#8, at least 4096 bits)
    #[arg(long, default_value = "private.pem", env = "APR_PRIVATE_KEY")]
    private_key: PathBuf,

    /// JSON file mapping usernames to argon2 password hashes
    #[arg(long, env = "APR_CREDENTIALS")]
    credentials: Option<PathBuf>,

    /// Value written to, and required in, the `iss` claim
    #[arg(long, default_value = "apr", env = "APR_ISSUER")]
    issuer: String,

    /// Default audience, also the service name protected routes accept
    #[arg(long, default_value = "apr", env = "APR_AUDIENCE")]
    audience: String,

    /// Enable development mode (generate a throwaway key if none is found)
    #[arg(long, env = "APR_DEV_MODE")]
    dev: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    tracing::info!("Starting APR server...");
    tracing::info!("Bind address: {}", cli.bind);

    if cli.dev {
        tracing::warn!("Development mode enabled - DO NOT USE IN PRODUCTION");
    }

    let keypair = load_keypair(&cli.private_key, cli.dev)?;

    let issuer = TokenIssuer::new(&keypair, TokenConfig::new(&cli.issuer, &cli.audience))?;
    let config = issuer.config();
    tracing::info!(
        issuer = %config.issuer,
        audience = %config.default_audience,
        validity_secs = config.validity.as_secs(),
        "Token issuer ready"
    );
    let verifier = Arc::new(TokenVerifier::new(keypair.public_key())?);
    let gate = AuthGate::new(verifier, &cli.audience, &cli.issuer);

    let credentials = match &cli.credentials {
        Some(path) => {
            let store = MemoryCredentialStore::from_json_file(path).await?;
            if store.is_empty() {
                tracing::warn!(path = %path.display(), "Credentials file has no users");
            }
            store
        },
        None => {
            tracing::warn!("No credentials file configured - every login will be rejected");
            MemoryCredentialStore::new()
        },
    };

    let app = apr_api::router(AppState::new(issuer, gate, credentials));

    let listener = tokio::net::TcpListener::bind(&cli.bind)
        .await
        .with_context(|| format!("failed to bind {}", cli.bind))?;

    tracing::info!("APR server started successfully");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shutting down...");

    Ok(())
}

/// Loads the signing key. Only development mode may fall back to a
/// generated key.
fn load_keypair(path: &Path, dev: bool) -> anyhow::Result<Keypair> {
    let result = if dev {
        KeyStore::load(path).map(|loaded| {
            if loaded.is_generated() {
                tracing::warn!(
                    path = %path.display(),
                    "No signing key found - generated a temporary one; tokens will not survive a restart"
                );
            }
            loaded.keypair
        })
    } else {
        Keypair::from_pem_file(path)
    };

    result.map_err(|e| {
        if e.is_parse_error() {
            tracing::error!(
                path = %path.display(),
                error = %e,
                "Signing key is unusable - provide a PEM RSA private key of at least 4096 bits"
            );
            anyhow::Error::new(e).context(format!("unusable signing key in {}", path.display()))
        } else {
            anyhow::Error::new(e)
                .context(format!("failed to load signing key from {}", path.display()))
        }
    })
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            },
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}

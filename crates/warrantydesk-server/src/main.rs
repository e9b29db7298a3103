//! Warrantydesk Server
//!
//! REST backend for warranty cases: accounts and sessions, vehicle
//! submissions, case documents and comments, and warranty-fee payment.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::http::HeaderValue;
use clap::Parser;
use tracing::info;

use warrantydesk_core::FixedFee;
use warrantydesk_core::tracing_init::init_tracing;
use warrantydesk_server::api::{AppState, build_router};
use warrantydesk_server::auth::JwtManager;
use warrantydesk_server::config::{
    DEFAULT_ACCESS_TTL_SECS, DEFAULT_REFRESH_TTL_SECS, JwtSettings, PaymentUrls,
};
use warrantydesk_server::server::{LocalDocumentStore, MockGateway};
use warrantydesk_server::storage::Database;

#[derive(Parser, Debug)]
#[command(name = "warrantydesk-server")]
#[command(
    version,
    about = "Warrantydesk server - warranty case workflow and REST API"
)]
struct Args {
    /// Address to listen on.
    #[arg(long, env = "WARRANTYDESK_ADDR", default_value = "0.0.0.0:8080")]
    addr: SocketAddr,

    /// Path to SQLite database file.
    #[arg(long, env = "WARRANTYDESK_DB_PATH")]
    db_path: Option<PathBuf>,

    /// Directory that uploaded case documents are written under.
    #[arg(long, env = "WARRANTYDESK_DOCUMENTS_DIR")]
    documents_dir: Option<PathBuf>,

    /// HMAC signing key for access tokens (at least 32 bytes).
    #[arg(long, env = "WARRANTYDESK_JWT_KEY", hide_env_values = true)]
    jwt_key: String,

    /// Issuer claim for access tokens.
    #[arg(long, env = "WARRANTYDESK_JWT_ISSUER", default_value = "warrantydesk")]
    jwt_issuer: String,

    /// Audience claim for access tokens.
    #[arg(long, env = "WARRANTYDESK_JWT_AUDIENCE", default_value = "warrantydesk-app")]
    jwt_audience: String,

    /// Access token TTL in seconds.
    #[arg(long, default_value_t = DEFAULT_ACCESS_TTL_SECS)]
    access_ttl: i64,

    /// Refresh token TTL in seconds.
    #[arg(long, default_value_t = DEFAULT_REFRESH_TTL_SECS)]
    refresh_ttl: i64,

    /// Public base URL of this server, used for payment gateway callbacks.
    #[arg(long, env = "WARRANTYDESK_PUBLIC_BASE_URL", default_value = "http://localhost:8080")]
    public_base_url: String,

    /// Base URL of the web client, used for post-payment redirects.
    #[arg(long, env = "WARRANTYDESK_FRONTEND_URL", default_value = "http://localhost:3000")]
    frontend_url: String,

    /// Allowed CORS origin. CORS is disabled when unset.
    #[arg(long, env = "WARRANTYDESK_CORS_ORIGIN")]
    cors_origin: Option<String>,

    /// Warranty fee charged per payment request.
    #[arg(long, default_value_t = FixedFee::DEFAULT_AMOUNT)]
    warranty_fee: i64,

    /// Output logs as JSON (for structured log aggregation).
    #[arg(long)]
    log_json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    init_tracing("warrantydesk_server=info,tower_http=info", args.log_json);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        addr = %args.addr,
        "Starting warrantydesk-server"
    );

    // Bad signing settings must stop startup before anything is bound.
    let settings = JwtSettings::new(&args.jwt_issuer, &args.jwt_audience, args.jwt_key.as_bytes())?
        .with_ttls(args.access_ttl, args.refresh_ttl);
    let jwt = Arc::new(JwtManager::new(&settings));

    let cors_origin = args
        .cors_origin
        .as_deref()
        .map(HeaderValue::from_str)
        .transpose()
        .map_err(|e| anyhow::anyhow!("Invalid CORS origin: {e}"))?;

    let db_path = match args.db_path {
        Some(path) => path,
        None => data_dir()?.join("warrantydesk.db"),
    };
    let documents_dir = match args.documents_dir {
        Some(dir) => dir,
        None => data_dir()?,
    };
    info!(path = %documents_dir.display(), "Document store");
    info!(path = %db_path.display(), "Opening database");
    let db = Database::open(&db_path).await?;

    let urls = PaymentUrls::new(&args.public_base_url, &args.frontend_url);
    let state = AppState::new(
        db,
        jwt,
        Arc::new(FixedFee(args.warranty_fee)),
        Arc::new(MockGateway::new(&urls.public_base_url)),
        Arc::new(LocalDocumentStore::new(documents_dir)),
        urls,
    );
    let app = build_router(state, cors_origin);

    let listener = tokio::net::TcpListener::bind(args.addr).await?;
    info!(addr = %args.addr, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Received shutdown signal");
        })
        .await?;

    info!("Server stopped");
    Ok(())
}

fn data_dir() -> anyhow::Result<PathBuf> {
    let home =
        dirs::home_dir().ok_or_else(|| anyhow::anyhow!("Cannot determine home directory"))?;
    Ok(home.join(".warrantydesk"))
}

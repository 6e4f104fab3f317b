mod config;
mod cv;
mod db;
mod errors;
mod i18n;
mod models;
mod routes;
mod state;
mod wizard;

use anyhow::Result;
use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use std::net::SocketAddr;
use std::time::Duration;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use std::sync::Arc;

use crate::config::Config;
use crate::cv::PgCvRepository;
use crate::db::create_pool;
use crate::i18n::MessageCatalog;
use crate::routes::build_router;
use crate::state::AppState;
use crate::wizard::{DurableStorage, MemoryStorage, RedisStorage, WizardSessions};

const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(5 * 60);

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting CV wizard API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let db = create_pool(&config.database_url).await?;

    // Initialize durable wizard storage (Redis, or memory when not configured)
    let storage: Arc<dyn DurableStorage> = match &config.redis_url {
        Some(url) => {
            let client = redis::Client::open(url.clone())?;
            info!("Redis client initialized");
            Arc::new(RedisStorage::new(client, config.wizard_state_ttl_secs))
        }
        None => {
            warn!("REDIS_URL not set, wizard state will not survive restarts");
            Arc::new(MemoryStorage::new())
        }
    };

    // Initialize S3 / MinIO
    let s3 = build_s3_client(&config).await;
    info!("S3 client initialized");

    // Initialize validation messages
    let catalog = MessageCatalog::for_locale(&config.locale)?;
    info!("Message catalog loaded (locale: {})", catalog.locale());

    // Live sessions are dropped from memory once their stored state would expire
    let sessions = WizardSessions::new(
        storage,
        Duration::from_secs(config.wizard_state_ttl_secs),
    );
    sessions.spawn_sweeper(SESSION_SWEEP_INTERVAL);

    // Build app state
    let state = AppState {
        sessions,
        cvs: Arc::new(PgCvRepository::new(db, s3, config.s3_bucket.clone())),
        translator: Arc::new(catalog),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict CORS to the wizard front-end origin

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Constructs an S3 client configured for MinIO (local) or AWS (production).
async fn build_s3_client(config: &Config) -> aws_sdk_s3::Client {
    let credentials = Credentials::new(
        &config.aws_access_key_id,
        &config.aws_secret_access_key,
        None,
        None,
        "cv-wizard-static",
    );

    let s3_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(Region::new("us-east-1"))
        .credentials_provider(credentials)
        .endpoint_url(&config.s3_endpoint)
        .load()
        .await;

    aws_sdk_s3::Client::new(&s3_config)
}

// API server clippy configuration
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::unwrap_used))]

//! Mr Abdallah Platform API Server
//!
//! Serves admin authentication and the question bank.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::{header, Method};
use mr_abdallah_api::{
    auth::{Argon2Hasher, CredentialHasher},
    config::LogFormat,
    create_router, AppState, Config,
};
use mr_abdallah_shared::{
    create_pool, run_migrations, AdminStore, MemoryAdminStore, MemoryQuestionStore,
    PgAdminStore, PgQuestionStore, QuestionStore,
};
use secrecy::ExposeSecret;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Configuration errors are reported before tracing exists
    let config = Config::from_env()?;

    init_tracing(config.log_format);
    tracing::info!(
        "Starting Mr Abdallah API Server v{}",
        env!("CARGO_PKG_VERSION")
    );

    let (admins, questions) = build_stores(&config).await?;
    let hasher: Arc<dyn CredentialHasher> = Arc::new(Argon2Hasher::new(config.password_hash_cost)?);

    let state = AppState::new(config.clone(), admins, questions, hasher);

    // Build CORS layer - explicit origin allowlist
    let allowed_origins: Vec<axum::http::HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|s| s.parse().ok())
        .collect();

    tracing::info!(
        allowed_origins = ?allowed_origins,
        "CORS configured with {} allowed origins",
        allowed_origins.len()
    );

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed_origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([header::CONTENT_TYPE]);

    let app = create_router(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    // Parse bind address
    let addr: SocketAddr = config.bind_address.parse()?;
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,mr_abdallah_api=debug".into());

    match format {
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init(),
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
    }
}

async fn build_stores(
    config: &Config,
) -> anyhow::Result<(Arc<dyn AdminStore>, Arc<dyn QuestionStore>)> {
    let Some(database_url) = &config.database_url else {
        tracing::warn!("DATABASE_URL not set - using in-memory stores, data is lost on restart");
        return Ok((
            Arc::new(MemoryAdminStore::new()),
            Arc::new(MemoryQuestionStore::new()),
        ));
    };

    tracing::info!("Connecting to database...");
    let pool = create_pool(database_url.expose_secret()).await?;
    tracing::info!("Database connection established");

    if config.run_migrations {
        tracing::info!("Running database migrations...");
        run_migrations(&pool).await?;
    } else {
        tracing::info!("Database migrations skipped (RUN_MIGRATIONS=false)");
    }

    Ok((
        Arc::new(PgAdminStore::new(pool.clone())),
        Arc::new(PgQuestionStore::new(pool)),
    ))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        // without a signal handler, keep serving
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

//! Bar Stock Manager - Backend Server

use std::time::Duration;

use bar_stock_backend::{config::Config, create_app, external::JwksCache, middleware::TokenVerifier, AppState};
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        "bsm_server=debug,bar_stock_backend=debug,tower_http=debug,sqlx=warn".into()
    });
    let json_logs = std::env::var("BSM_LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json"));
    let registry = tracing_subscriber::registry().with(filter);
    if json_logs {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    // Load configuration
    let config = Config::load()?;

    tracing::info!("Starting Bar Stock Manager Server");
    tracing::info!("Environment: {}", config.environment);

    // Create database connection pool
    tracing::info!("Connecting to database...");
    let db_pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .acquire_timeout(Duration::from_secs(30))
        .connect(&config.database.url)
        .await?;

    tracing::info!("Database connection established");

    if config.should_run_migrations() {
        tracing::info!("Running database migrations...");
        sqlx::migrate!("./migrations").run(&db_pool).await?;
        tracing::info!("Migrations completed");
    }

    let jwks = JwksCache::new(
        config.auth.jwks_url.clone(),
        Duration::from_secs(config.auth.jwks_ttl_secs),
    );
    let verifier = TokenVerifier::new(jwks, &config.auth);

    if config.assistant.api_key.as_deref().map_or(true, str::is_empty) {
        tracing::warn!("No assistant API key configured; the assistant will answer with a notice");
    }

    let addr = config.bind_address();
    let state = AppState::new(db_pool, config, verifier);
    let app = create_app(state);

    tracing::info!("Listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

//! Bar Stock Manager - Backend
//!
//! Multi-tenant inventory API for bars and restaurants: products, a stock
//! movement ledger with its snapshot, teams with per-member route access,
//! reports and a stock assistant.

use std::sync::Arc;

use axum::{routing::get, Router};
use shared::NegativeStockPolicy;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub mod config;
pub mod error;
pub mod external;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod services;

pub use config::Config;
pub use error::{AppError, AppResult};

use external::GeminiClient;
use middleware::TokenVerifier;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db: sqlx::PgPool,
    pub config: Arc<Config>,
    pub verifier: Arc<TokenVerifier>,
    pub assistant: GeminiClient,
}

impl AppState {
    pub fn new(db: sqlx::PgPool, config: Config, verifier: TokenVerifier) -> Self {
        let assistant = GeminiClient::new(&config.assistant);
        Self {
            db,
            config: Arc::new(config),
            verifier: Arc::new(verifier),
            assistant,
        }
    }

    pub fn stock_policy(&self) -> NegativeStockPolicy {
        NegativeStockPolicy::from_allow_negative(self.config.stock.allow_negative)
    }
}

/// Create the application router with all routes and middleware
pub fn create_app(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .route("/health", get(handlers::health_check))
        .nest("/api", routes::api_routes(state.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Root endpoint
async fn root() -> &'static str {
    "Bar Stock Manager API"
}

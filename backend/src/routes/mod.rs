//! Route definitions for the Bar Stock Manager API

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};

use crate::{handlers, middleware::auth_middleware, AppState};

/// Create API routes
pub fn api_routes(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/catalog", get(handlers::get_catalog))
        .nest("/users", user_routes())
        .nest("/teams", team_routes())
        .nest("/products", product_routes())
        .nest("/stock", stock_routes())
        .nest("/reports", report_routes())
        .nest("/ai", assistant_routes())
        .route_layer(middleware::from_fn_with_state(state, auth_middleware));

    Router::new()
        // Health check (public)
        .route("/health", get(handlers::health_check))
        .merge(protected)
}

/// Profile and preference routes
fn user_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/profile",
            get(handlers::get_profile)
                .post(handlers::create_profile)
                .put(handlers::update_profile),
        )
        .route("/lookup/:custom_id", get(handlers::lookup_user))
        .route(
            "/preferences",
            get(handlers::get_preferences)
                .post(handlers::create_preferences)
                .put(handlers::update_preferences),
        )
}

/// Team management routes
fn team_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_teams).post(handlers::create_team))
        .route("/active", get(handlers::get_active_team))
        .route("/join", post(handlers::join_team))
        .route(
            "/:id/members",
            get(handlers::list_members).post(handlers::add_member),
        )
        .route(
            "/:id/members/:member_id/routes",
            put(handlers::set_member_routes),
        )
}

/// Product catalog routes
fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_products).post(handlers::create_product))
        .route(
            "/:id",
            get(handlers::get_product)
                .put(handlers::update_product)
                .delete(handlers::delete_product),
        )
}

/// Stock level and movement ledger routes
fn stock_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::get_stock_levels))
        .route("/movement", post(handlers::register_movement))
        .route("/movements", get(handlers::list_movements))
        .route("/alerts", get(handlers::get_alerts))
        .route("/count", post(handlers::apply_stock_count))
        .route("/:product_id/reconcile", get(handlers::reconcile_product))
}

/// Report routes
fn report_routes() -> Router<AppState> {
    Router::new()
        .route("/stock", get(handlers::get_stock_report))
        .route("/movements", get(handlers::get_movement_report))
}

/// Assistant routes
fn assistant_routes() -> Router<AppState> {
    Router::new()
        .route("/chat", post(handlers::chat))
        .route("/suggestions/replenishment", post(handlers::suggest_replenishment))
        .route("/suggestions/demand", post(handlers::predict_demand))
}

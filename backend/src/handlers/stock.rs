//! Stock and movement ledger HTTP handlers

use axum::{
    extract::{Path, Query, State},
    Json,
};
use axum_extra::extract::WithRejection;
use serde::Deserialize;
use shared::{
    clamp_history_limit, Movement, MovementWithProduct, ProductWithStock, Reconciliation,
    RegisterMovementRequest, StockAlerts, StockCountRequest, StockCountResult,
};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::middleware::team::StockRoute;
use crate::middleware::{ActiveTeam, CurrentUser, RequireRoute};
use crate::services::{PreferencesService, ProductService, StockService};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<i64>,
    pub product_id: Option<Uuid>,
}

/// Register a movement and apply it to the product's stock
pub async fn register_movement(
    State(state): State<AppState>,
    current_user: CurrentUser,
    guard: RequireRoute<StockRoute>,
    WithRejection(Json(input), _): WithRejection<Json<RegisterMovementRequest>, AppError>,
) -> AppResult<Json<Movement>> {
    let draft = input.into_draft()?;

    let service = StockService::new(state.db.clone(), state.stock_policy());
    let movement = service
        .register_movement(guard.team_id(), current_user.0.user_id, &draft)
        .await?;
    Ok(Json(movement))
}

/// Every product of the active team with its current level
pub async fn get_stock_levels(
    State(state): State<AppState>,
    active: ActiveTeam,
) -> AppResult<Json<Vec<ProductWithStock>>> {
    let Some(team) = active.0 else {
        return Ok(Json(Vec::new()));
    };

    let service = ProductService::new(state.db);
    Ok(Json(service.list_with_stock(team.team_id).await?))
}

/// Most recent movements, newest first
pub async fn list_movements(
    State(state): State<AppState>,
    active: ActiveTeam,
    WithRejection(Query(query), _): WithRejection<Query<HistoryQuery>, AppError>,
) -> AppResult<Json<Vec<MovementWithProduct>>> {
    let Some(team) = active.0 else {
        return Ok(Json(Vec::new()));
    };

    let limit = clamp_history_limit(
        query.limit,
        state.config.stock.movement_history_limit,
        state.config.stock.max_history_limit,
    );

    let service = StockService::new(state.db.clone(), state.stock_policy());
    let movements = service
        .movement_history(team.team_id, limit, query.product_id)
        .await?;
    Ok(Json(movements))
}

/// Low-stock list and dashboard counters
pub async fn get_alerts(
    State(state): State<AppState>,
    current_user: CurrentUser,
    active: ActiveTeam,
) -> AppResult<Json<StockAlerts>> {
    let Some(team) = active.0 else {
        return Ok(Json(StockAlerts::default()));
    };

    // The caller's own alert window wins over the server default
    let expiry_days = PreferencesService::new(state.db.clone())
        .find(current_user.0.user_id)
        .await?
        .map(|prefs| i64::from(prefs.alert_expiry_days))
        .unwrap_or(state.config.stock.expiry_alert_days);

    let service = StockService::new(state.db.clone(), state.stock_policy());
    Ok(Json(service.alerts(team.team_id, expiry_days).await?))
}

/// Compare a product's snapshot with the replay of its ledger
pub async fn reconcile_product(
    State(state): State<AppState>,
    WithRejection(Path(product_id), _): WithRejection<Path<Uuid>, AppError>,
    active: ActiveTeam,
) -> AppResult<Json<Reconciliation>> {
    let team = active.require()?;
    let service = StockService::new(state.db.clone(), state.stock_policy());
    Ok(Json(service.reconcile(team.team_id, product_id).await?))
}

/// Record a physical stock count as adjustments
pub async fn apply_stock_count(
    State(state): State<AppState>,
    current_user: CurrentUser,
    guard: RequireRoute<StockRoute>,
    WithRejection(Json(input), _): WithRejection<Json<StockCountRequest>, AppError>,
) -> AppResult<Json<StockCountResult>> {
    let service = StockService::new(state.db.clone(), state.stock_policy());
    let result = service
        .apply_stock_count(
            guard.team_id(),
            current_user.0.user_id,
            &input.items,
            input.notes.as_deref(),
        )
        .await?;
    Ok(Json(result))
}

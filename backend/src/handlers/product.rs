//! Product catalog HTTP handlers

use axum::{
    extract::{Path, State},
    Json,
};
use axum_extra::extract::WithRejection;
use serde_json::json;
use shared::{ProductInput, ProductWithStock};
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::middleware::team::ProductsRoute;
use crate::middleware::{ActiveTeam, CurrentUser, RequireRoute};
use crate::services::ProductService;
use crate::AppState;

/// Products of the active team with their stock; empty without a team
pub async fn list_products(
    State(state): State<AppState>,
    active: ActiveTeam,
) -> AppResult<Json<Vec<ProductWithStock>>> {
    let Some(team) = active.0 else {
        return Ok(Json(Vec::new()));
    };

    let service = ProductService::new(state.db);
    Ok(Json(service.list_with_stock(team.team_id).await?))
}

pub async fn get_product(
    State(state): State<AppState>,
    WithRejection(Path(product_id), _): WithRejection<Path<Uuid>, AppError>,
    active: ActiveTeam,
) -> AppResult<Json<ProductWithStock>> {
    let team = active.require()?;
    let service = ProductService::new(state.db);
    Ok(Json(service.get(team.team_id, product_id).await?))
}

pub async fn create_product(
    State(state): State<AppState>,
    current_user: CurrentUser,
    guard: RequireRoute<ProductsRoute>,
    WithRejection(Json(input), _): WithRejection<Json<ProductInput>, AppError>,
) -> AppResult<Json<ProductWithStock>> {
    input.validate()?;

    let service = ProductService::new(state.db);
    let product = service
        .create(guard.team_id(), current_user.0.user_id, &input)
        .await?;
    Ok(Json(product))
}

pub async fn update_product(
    State(state): State<AppState>,
    WithRejection(Path(product_id), _): WithRejection<Path<Uuid>, AppError>,
    guard: RequireRoute<ProductsRoute>,
    WithRejection(Json(input), _): WithRejection<Json<ProductInput>, AppError>,
) -> AppResult<Json<ProductWithStock>> {
    input.validate()?;

    let service = ProductService::new(state.db);
    Ok(Json(service.update(guard.team_id(), product_id, &input).await?))
}

pub async fn delete_product(
    State(state): State<AppState>,
    WithRejection(Path(product_id), _): WithRejection<Path<Uuid>, AppError>,
    guard: RequireRoute<ProductsRoute>,
) -> AppResult<Json<serde_json::Value>> {
    let service = ProductService::new(state.db);
    service.delete(guard.team_id(), product_id).await?;
    Ok(Json(json!({ "success": true })))
}

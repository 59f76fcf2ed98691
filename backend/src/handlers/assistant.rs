//! Stock assistant handlers

use axum::{extract::State, Json};
use axum_extra::extract::WithRejection;

use crate::error::{AppError, AppResult};
use crate::middleware::team::AiRoute;
use crate::middleware::RequireRoute;
use crate::services::assistant::{ChatRequest, ChatResponse, Preset, SuggestionRequest};
use crate::services::{AssistantService, StockService};
use crate::AppState;

fn service(state: AppState) -> AssistantService {
    let stock = StockService::new(state.db.clone(), state.stock_policy());
    AssistantService::new(state.db, state.assistant, stock)
}

/// Free-form question about the team's stock
pub async fn chat(
    State(state): State<AppState>,
    guard: RequireRoute<AiRoute>,
    WithRejection(Json(input), _): WithRejection<Json<ChatRequest>, AppError>,
) -> AppResult<Json<ChatResponse>> {
    let response = service(state).chat(guard.team_id(), &input).await?;
    Ok(Json(response))
}

/// Replenishment suggestions
pub async fn suggest_replenishment(
    State(state): State<AppState>,
    guard: RequireRoute<AiRoute>,
    WithRejection(Json(input), _): WithRejection<Json<SuggestionRequest>, AppError>,
) -> AppResult<Json<ChatResponse>> {
    let response = service(state)
        .suggest(guard.team_id(), Preset::Replenishment, input.model.as_deref())
        .await?;
    Ok(Json(response))
}

/// Demand prediction from the movement history
pub async fn predict_demand(
    State(state): State<AppState>,
    guard: RequireRoute<AiRoute>,
    WithRejection(Json(input), _): WithRejection<Json<SuggestionRequest>, AppError>,
) -> AppResult<Json<ChatResponse>> {
    let response = service(state)
        .suggest(guard.team_id(), Preset::DemandPrediction, input.model.as_deref())
        .await?;
    Ok(Json(response))
}

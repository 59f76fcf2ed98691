//! Notification preference handlers

use axum::{extract::State, Json};
use axum_extra::extract::WithRejection;
use shared::{CreatePreferencesRequest, UpdatePreferencesRequest, UserPreferences};
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::middleware::CurrentUser;
use crate::services::PreferencesService;
use crate::AppState;

pub async fn get_preferences(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<UserPreferences>> {
    let service = PreferencesService::new(state.db);
    Ok(Json(service.get(current_user.0.user_id).await?))
}

pub async fn create_preferences(
    State(state): State<AppState>,
    current_user: CurrentUser,
    WithRejection(Json(input), _): WithRejection<Json<CreatePreferencesRequest>, AppError>,
) -> AppResult<Json<UserPreferences>> {
    input.validate()?;

    let service = PreferencesService::new(state.db);
    Ok(Json(service.create(current_user.0.user_id, &input).await?))
}

pub async fn update_preferences(
    State(state): State<AppState>,
    current_user: CurrentUser,
    WithRejection(Json(input), _): WithRejection<Json<UpdatePreferencesRequest>, AppError>,
) -> AppResult<Json<UserPreferences>> {
    input.validate()?;

    let service = PreferencesService::new(state.db);
    Ok(Json(service.update(current_user.0.user_id, &input).await?))
}

//! User profile HTTP handlers

use axum::{
    extract::{Path, State},
    Json,
};
use axum_extra::extract::WithRejection;
use shared::{CreateProfileRequest, PublicProfile, UpdateProfileRequest, UserProfile};
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::middleware::CurrentUser;
use crate::services::ProfileService;
use crate::AppState;

/// Get the caller's profile
pub async fn get_profile(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<UserProfile>> {
    let service = ProfileService::new(state.db);
    let profile = service
        .get(current_user.0.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Profile".to_string()))?;
    Ok(Json(profile))
}

/// Create the caller's profile, or return the existing one
pub async fn create_profile(
    State(state): State<AppState>,
    current_user: CurrentUser,
    WithRejection(Json(input), _): WithRejection<Json<CreateProfileRequest>, AppError>,
) -> AppResult<Json<UserProfile>> {
    input.validate()?;

    let service = ProfileService::new(state.db);
    let profile = service
        .get_or_create(
            &current_user.0,
            input.custom_id.as_deref(),
            input.display_name.as_deref(),
        )
        .await?;
    Ok(Json(profile))
}

/// Update the caller's display name
pub async fn update_profile(
    State(state): State<AppState>,
    current_user: CurrentUser,
    WithRejection(Json(input), _): WithRejection<Json<UpdateProfileRequest>, AppError>,
) -> AppResult<Json<UserProfile>> {
    input.validate()?;

    let service = ProfileService::new(state.db);
    let profile = service
        .update_display_name(current_user.0.user_id, input.display_name.as_deref())
        .await?;
    Ok(Json(profile))
}

/// Resolve a custom ID to a user
pub async fn lookup_user(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(custom_id): Path<String>,
) -> AppResult<Json<PublicProfile>> {
    let service = ProfileService::new(state.db);
    let profile = service.lookup(&custom_id).await?;
    Ok(Json(profile))
}

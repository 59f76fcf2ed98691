//! Team and membership HTTP handlers

use axum::{
    extract::{Path, State},
    Json,
};
use axum_extra::extract::WithRejection;
use shared::{
    ActiveTeamInfo, AddMemberRequest, CreateTeamRequest, JoinTeamRequest, JoinTeamResponse,
    SetAllowedRoutesRequest, Team, TeamMember, TeamMemberWithProfile, TeamWithRole,
};
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::middleware::{ActiveTeam, CurrentUser};
use crate::services::TeamService;
use crate::AppState;

/// Teams the caller belongs to
pub async fn list_teams(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<Vec<TeamWithRole>>> {
    let service = TeamService::new(state.db);
    Ok(Json(service.list_for_user(current_user.0.user_id).await?))
}

/// Create a team owned by the caller
pub async fn create_team(
    State(state): State<AppState>,
    current_user: CurrentUser,
    WithRejection(Json(input), _): WithRejection<Json<CreateTeamRequest>, AppError>,
) -> AppResult<Json<Team>> {
    input.validate()?;
    shared::validate_team_name(&input.name).map_err(|m| AppError::InvalidInput(m.to_string()))?;

    let service = TeamService::new(state.db);
    Ok(Json(service.create_team(current_user.0.user_id, &input.name).await?))
}

/// The team this request resolves to; `null` for callers without a team
pub async fn get_active_team(
    State(state): State<AppState>,
    active: ActiveTeam,
) -> AppResult<Json<Option<ActiveTeamInfo>>> {
    let Some(context) = active.0 else {
        return Ok(Json(None));
    };

    let service = TeamService::new(state.db);
    Ok(Json(Some(service.active_team_info(context.member).await?)))
}

/// Add a user to a team (owner only)
pub async fn add_member(
    State(state): State<AppState>,
    WithRejection(Path(team_id), _): WithRejection<Path<Uuid>, AppError>,
    current_user: CurrentUser,
    WithRejection(Json(input), _): WithRejection<Json<AddMemberRequest>, AppError>,
) -> AppResult<Json<TeamMember>> {
    let service = TeamService::new(state.db);
    let member = service
        .add_member(current_user.0.user_id, team_id, input.user_id)
        .await?;
    Ok(Json(member))
}

/// Members of a team with their profiles
pub async fn list_members(
    State(state): State<AppState>,
    WithRejection(Path(team_id), _): WithRejection<Path<Uuid>, AppError>,
    current_user: CurrentUser,
) -> AppResult<Json<Vec<TeamMemberWithProfile>>> {
    let service = TeamService::new(state.db);
    Ok(Json(service.list_members(current_user.0.user_id, team_id).await?))
}

/// Restrict or unrestrict the sections a member may open (owner only)
pub async fn set_member_routes(
    State(state): State<AppState>,
    WithRejection(Path((team_id, member_id)), _): WithRejection<Path<(Uuid, Uuid)>, AppError>,
    current_user: CurrentUser,
    WithRejection(Json(input), _): WithRejection<Json<SetAllowedRoutesRequest>, AppError>,
) -> AppResult<Json<TeamMember>> {
    let service = TeamService::new(state.db);
    let member = service
        .set_allowed_routes(
            current_user.0.user_id,
            team_id,
            member_id,
            input.allowed_routes.as_deref(),
        )
        .await?;
    Ok(Json(member))
}

/// Join the team of the user behind a custom ID
pub async fn join_team(
    State(state): State<AppState>,
    current_user: CurrentUser,
    WithRejection(Json(input), _): WithRejection<Json<JoinTeamRequest>, AppError>,
) -> AppResult<Json<JoinTeamResponse>> {
    if input.owner_custom_id.trim().is_empty() {
        return Err(AppError::InvalidInput("A custom ID is required".to_string()));
    }

    let service = TeamService::new(state.db);
    let joined = service
        .join_by_custom_id(current_user.0.user_id, &input.owner_custom_id)
        .await?;
    Ok(Json(joined))
}

//! Team scoping extractors
//!
//! `ActiveTeam` resolves which team a request operates on, honouring an
//! optional `X-Team-Id` header. `RequireRoute<R>` additionally checks the
//! member's route allow-list for the section `R` guards.

use std::marker::PhantomData;

use axum::{extract::FromRequestParts, http::request::Parts};
use shared::{RouteKey, TeamMember};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::services::TeamService;
use crate::AppState;

/// Header selecting the active team
pub const TEAM_ID_HEADER: &str = "x-team-id";

/// The resolved team and the caller's membership in it
#[derive(Debug, Clone)]
pub struct TeamContext {
    pub team_id: Uuid,
    pub member: TeamMember,
}

/// Active team of the request; `None` when the caller belongs to no team
#[derive(Debug, Clone)]
pub struct ActiveTeam(pub Option<TeamContext>);

impl ActiveTeam {
    /// The team, or `NoTeam` for callers without one
    pub fn require(self) -> AppResult<TeamContext> {
        self.0.ok_or(AppError::NoTeam)
    }
}

/// Parse the `X-Team-Id` header, if present
pub fn requested_team_id(parts: &Parts) -> AppResult<Option<Uuid>> {
    let Some(value) = parts.headers.get(TEAM_ID_HEADER) else {
        return Ok(None);
    };

    let value = value
        .to_str()
        .map_err(|_| AppError::InvalidInput("X-Team-Id header contains invalid characters".into()))?;

    Uuid::parse_str(value.trim())
        .map(Some)
        .map_err(|_| AppError::InvalidInput("X-Team-Id header is not a valid UUID".into()))
}

#[axum::async_trait]
impl FromRequestParts<AppState> for ActiveTeam {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        if let Some(resolved) = parts.extensions.get::<ActiveTeam>() {
            return Ok(resolved.clone());
        }

        let user = parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or(AppError::MissingToken)?;
        let requested = requested_team_id(parts)?;

        let member = TeamService::new(state.db.clone())
            .resolve_active(user.user_id, requested)
            .await?;

        let active = ActiveTeam(member.map(|member| TeamContext {
            team_id: member.team_id,
            member,
        }));
        parts.extensions.insert(active.clone());

        Ok(active)
    }
}

/// A section of the application guarded by the route allow-list
pub trait RouteGuard: Send + Sync + 'static {
    /// Access to any one of these routes is enough
    const ROUTES: &'static [RouteKey];
}

pub struct ProductsRoute;
impl RouteGuard for ProductsRoute {
    const ROUTES: &'static [RouteKey] = &[RouteKey::Products];
}

/// Movements are registered from both the stock and the movements pages
pub struct StockRoute;
impl RouteGuard for StockRoute {
    const ROUTES: &'static [RouteKey] = &[RouteKey::Stock, RouteKey::Movements];
}

pub struct ReportsRoute;
impl RouteGuard for ReportsRoute {
    const ROUTES: &'static [RouteKey] = &[RouteKey::Reports];
}

pub struct AiRoute;
impl RouteGuard for AiRoute {
    const ROUTES: &'static [RouteKey] = &[RouteKey::Ai];
}

/// Active team whose membership may open the section `R`
pub struct RequireRoute<R>(pub TeamContext, pub PhantomData<R>);

impl<R> RequireRoute<R> {
    pub fn team_id(&self) -> Uuid {
        self.0.team_id
    }
}

/// Whether the member may open at least one of `routes`
pub fn member_may_access(member: &TeamMember, routes: &[RouteKey]) -> bool {
    routes.iter().any(|route| member.can_access(*route))
}

#[axum::async_trait]
impl<R: RouteGuard> FromRequestParts<AppState> for RequireRoute<R> {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let team = ActiveTeam::from_request_parts(parts, state).await?.require()?;

        if !member_may_access(&team.member, R::ROUTES) {
            let names: Vec<&str> = R::ROUTES.iter().map(|r| r.as_str()).collect();
            tracing::debug!(user_id = %team.member.user_id, routes = ?names, "Route denied");
            return Err(AppError::Forbidden(format!(
                "You do not have access to the '{}' section",
                names.join("' or '")
            )));
        }

        Ok(RequireRoute(team, PhantomData))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;
    use chrono::Utc;
    use shared::MemberRole;

    fn parts_with(header: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/api/products");
        if let Some(value) = header {
            builder = builder.header(TEAM_ID_HEADER, value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    fn member(role: MemberRole, routes: Option<Vec<&str>>) -> TeamMember {
        TeamMember {
            id: Uuid::new_v4(),
            seq: 1,
            team_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            role,
            allowed_routes: routes.map(|r| r.into_iter().map(String::from).collect()),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_requested_team_id() {
        let id = Uuid::new_v4();
        assert_eq!(requested_team_id(&parts_with(None)).unwrap(), None);
        assert_eq!(
            requested_team_id(&parts_with(Some(&id.to_string()))).unwrap(),
            Some(id)
        );
        assert!(matches!(
            requested_team_id(&parts_with(Some("team-1"))),
            Err(AppError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_stock_guard_accepts_movements_page() {
        let restricted = member(MemberRole::Member, Some(vec!["movements"]));
        assert!(member_may_access(&restricted, StockRoute::ROUTES));
        assert!(!member_may_access(&restricted, ProductsRoute::ROUTES));
    }

    #[test]
    fn test_owner_passes_every_guard() {
        let owner = member(MemberRole::Owner, Some(vec![]));
        assert!(member_may_access(&owner, ReportsRoute::ROUTES));
        assert!(member_may_access(&owner, AiRoute::ROUTES));
    }
}

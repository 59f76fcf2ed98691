//! Team and membership models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::access::{is_route_allowed, parse_route_keys, MemberRole, RouteKey};

/// A tenancy boundary owning products and stock
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Team {
    pub id: Uuid,
    pub name: String,
    pub owner_user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A team as seen by one of its members
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct TeamWithRole {
    #[serde(flatten)]
    #[cfg_attr(feature = "sqlx", sqlx(flatten))]
    pub team: Team,
    pub role: MemberRole,
    pub member_seq: i64,
}

/// Membership of a user in a team
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct TeamMember {
    pub id: Uuid,
    pub seq: i64,
    pub team_id: Uuid,
    pub user_id: Uuid,
    pub role: MemberRole,
    /// `None` grants every section
    pub allowed_routes: Option<Vec<String>>,
    pub created_at: DateTime<Utc>,
}

impl TeamMember {
    /// Parsed allow-list; unknown keys stored by older clients are skipped
    pub fn allowed_route_keys(&self) -> Option<Vec<RouteKey>> {
        self.allowed_routes
            .as_ref()
            .map(|routes| parse_route_keys(routes.iter().map(String::as_str)))
    }

    pub fn can_access(&self, route: RouteKey) -> bool {
        let allowed = self.allowed_route_keys();
        is_route_allowed(self.role, allowed.as_deref(), route)
    }

    /// Every section this member may open, in navigation order
    pub fn effective_routes(&self) -> Vec<RouteKey> {
        RouteKey::ALL
            .iter()
            .copied()
            .filter(|route| self.can_access(*route))
            .collect()
    }
}

/// Member row enriched with the public profile fields
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct TeamMemberWithProfile {
    #[serde(flatten)]
    #[cfg_attr(feature = "sqlx", sqlx(flatten))]
    pub member: TeamMember,
    pub custom_id: Option<String>,
    pub display_name: Option<String>,
}

/// The team a request operates on, with the caller's membership
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActiveTeamInfo {
    pub team: Team,
    pub membership: TeamMember,
    pub effective_routes: Vec<RouteKey>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateTeamRequest {
    #[validate(length(min = 1, max = 100, message = "Team name must be between 1 and 100 characters"))]
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AddMemberRequest {
    pub user_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinTeamRequest {
    #[serde(alias = "custom_id")]
    pub owner_custom_id: String,
}

/// Response of a successful join
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinTeamResponse {
    pub team_id: Uuid,
    pub team_name: String,
    pub owner_display_name: Option<String>,
}

/// `null` restores full access
#[derive(Debug, Clone, Deserialize)]
pub struct SetAllowedRoutesRequest {
    pub allowed_routes: Option<Vec<String>>,
}

#[cfg(test)]
mod tests {
    use super::*;

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
    fn test_restricted_member_effective_routes() {
        let m = member(MemberRole::Member, Some(vec!["products", "stock"]));
        assert_eq!(
            m.effective_routes(),
            vec![RouteKey::Products, RouteKey::Stock, RouteKey::Settings]
        );
    }

    #[test]
    fn test_unknown_stored_route_is_ignored() {
        let m = member(MemberRole::Member, Some(vec!["/products", "legacy"]));
        assert!(m.can_access(RouteKey::Products));
        assert!(!m.can_access(RouteKey::Reports));
    }

    #[test]
    fn test_owner_sees_everything() {
        let m = member(MemberRole::Owner, Some(vec![]));
        assert_eq!(m.effective_routes().len(), RouteKey::ALL.len());
    }
}

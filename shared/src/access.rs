//! Team scoping and per-member route restrictions
//!
//! These rules are evaluated both by the API (to gate requests) and by the
//! single-page app (to hide navigation entries), so they live here without
//! any I/O.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

/// Application sections a member can be granted
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteKey {
    Dashboard,
    Products,
    Stock,
    Movements,
    Reports,
    Teams,
    Ai,
    Settings,
}

impl RouteKey {
    pub const ALL: [RouteKey; 8] = [
        RouteKey::Dashboard,
        RouteKey::Products,
        RouteKey::Stock,
        RouteKey::Movements,
        RouteKey::Reports,
        RouteKey::Teams,
        RouteKey::Ai,
        RouteKey::Settings,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RouteKey::Dashboard => "dashboard",
            RouteKey::Products => "products",
            RouteKey::Stock => "stock",
            RouteKey::Movements => "movements",
            RouteKey::Reports => "reports",
            RouteKey::Teams => "teams",
            RouteKey::Ai => "ai",
            RouteKey::Settings => "settings",
        }
    }

    /// Path of the section in the single-page app
    pub fn path(&self) -> &'static str {
        match self {
            RouteKey::Dashboard => "/dashboard",
            RouteKey::Products => "/products",
            RouteKey::Stock => "/stock",
            RouteKey::Movements => "/movements",
            RouteKey::Reports => "/reports",
            RouteKey::Teams => "/teams",
            RouteKey::Ai => "/ai",
            RouteKey::Settings => "/settings",
        }
    }

    /// Section owning a page path, e.g. `/products/42/edit` -> `Products`.
    /// The root path is the dashboard.
    pub fn from_path(path: &str) -> Option<RouteKey> {
        let first = path
            .trim()
            .trim_start_matches('/')
            .split(['/', '?', '#'])
            .next()
            .unwrap_or("");

        if first.is_empty() {
            return Some(RouteKey::Dashboard);
        }

        first.parse().ok()
    }
}

impl fmt::Display for RouteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RouteKey {
    type Err = DomainError;

    /// Accepts both `products` and `/products`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().trim_start_matches('/').to_lowercase();
        RouteKey::ALL
            .iter()
            .copied()
            .find(|route| route.as_str() == key)
            .ok_or_else(|| DomainError::UnknownRoute(s.to_string()))
    }
}

/// Role of a user inside a team
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(type_name = "member_role", rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum MemberRole {
    Owner,
    Member,
}

impl MemberRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MemberRole::Owner => "owner",
            MemberRole::Member => "member",
        }
    }
}

impl FromStr for MemberRole {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "owner" => Ok(MemberRole::Owner),
            "member" => Ok(MemberRole::Member),
            other => Err(DomainError::UnknownRole(other.to_string())),
        }
    }
}

/// Whether a member may open a section.
///
/// Owners and unrestricted members (`None`) see everything. Settings is
/// always reachable so a restricted member can still manage their account.
pub fn is_route_allowed(role: MemberRole, allowed: Option<&[RouteKey]>, route: RouteKey) -> bool {
    if role == MemberRole::Owner {
        return true;
    }

    match allowed {
        None => true,
        Some(_) if route == RouteKey::Settings => true,
        Some(routes) => routes.contains(&route),
    }
}

/// Parse stored route keys, dropping the ones this build does not know
pub fn parse_route_keys<'a>(raw: impl IntoIterator<Item = &'a str>) -> Vec<RouteKey> {
    raw.into_iter().filter_map(|s| s.parse().ok()).collect()
}

/// Canonical storage form of an allow-list.
///
/// Duplicates are removed and keys sorted. A list covering every section
/// (settings being implicit) collapses to `None`, so full access has a
/// single representation and stays full when sections are added later.
pub fn normalize_allowed_routes(routes: Option<Vec<RouteKey>>) -> Option<Vec<RouteKey>> {
    let routes = routes?;
    let mut set: BTreeSet<RouteKey> = routes.into_iter().collect();
    set.insert(RouteKey::Settings);

    if set.len() == RouteKey::ALL.len() {
        return None;
    }

    set.remove(&RouteKey::Settings);
    Some(set.into_iter().collect())
}

/// Strictly parse an allow-list sent by a client
pub fn parse_allowed_routes(raw: Option<&[String]>) -> Result<Option<Vec<RouteKey>>, DomainError> {
    raw.map(|routes| {
        routes
            .iter()
            .map(|route| route.parse::<RouteKey>())
            .collect::<Result<Vec<_>, _>>()
    })
    .transpose()
}

/// A user's membership as needed for active team resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Membership {
    pub team_id: Uuid,
    pub owner_user_id: Uuid,
    /// Membership insertion order
    pub seq: i64,
}

/// Pick the team a request operates on.
///
/// A requested team wins when the user belongs to it. Otherwise the oldest
/// owned team, else the oldest membership. `None` means the user has no team,
/// which callers treat as "no data" rather than an error.
pub fn resolve_active_team(
    user_id: Uuid,
    memberships: &[Membership],
    requested: Option<Uuid>,
) -> Option<Uuid> {
    if let Some(requested) = requested {
        if memberships.iter().any(|m| m.team_id == requested) {
            return Some(requested);
        }
    }

    memberships
        .iter()
        .filter(|m| m.owner_user_id == user_id)
        .min_by_key(|m| m.seq)
        .or_else(|| memberships.iter().min_by_key(|m| m.seq))
        .map(|m| m.team_id)
}

/// Check a join-by-custom-ID request before touching storage.
///
/// `owner_team` is the team owned by the user behind the custom ID and
/// `joiner_team_ids` the teams the joiner already belongs to.
pub fn evaluate_join(
    joiner_user_id: Uuid,
    owner_user_id: Uuid,
    owner_team: Option<Uuid>,
    joiner_team_ids: &[Uuid],
) -> Result<Uuid, DomainError> {
    if joiner_user_id == owner_user_id {
        return Err(DomainError::SelfJoin);
    }

    let team_id = owner_team.ok_or(DomainError::NoTeam)?;

    if joiner_team_ids.contains(&team_id) {
        return Err(DomainError::AlreadyMember);
    }

    Ok(team_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_key_parsing() {
        assert_eq!("products".parse::<RouteKey>(), Ok(RouteKey::Products));
        assert_eq!("/Stock".parse::<RouteKey>(), Ok(RouteKey::Stock));
        assert!("billing".parse::<RouteKey>().is_err());
    }

    #[test]
    fn test_route_key_from_path() {
        assert_eq!(RouteKey::from_path("/"), Some(RouteKey::Dashboard));
        assert_eq!(RouteKey::from_path("/products/42/edit"), Some(RouteKey::Products));
        assert_eq!(RouteKey::from_path("/ai?x=1"), Some(RouteKey::Ai));
        assert_eq!(RouteKey::from_path("/login"), None);
    }

    #[test]
    fn test_restricted_member() {
        let allowed = [RouteKey::Products, RouteKey::Stock];
        let check = |r| is_route_allowed(MemberRole::Member, Some(&allowed), r);

        assert!(check(RouteKey::Products));
        assert!(check(RouteKey::Stock));
        assert!(check(RouteKey::Settings));
        assert!(!check(RouteKey::Reports));
    }

    #[test]
    fn test_full_list_normalizes_to_none() {
        let all = RouteKey::ALL.to_vec();
        assert_eq!(normalize_allowed_routes(Some(all)), None);

        let without_settings: Vec<_> = RouteKey::ALL
            .iter()
            .copied()
            .filter(|r| *r != RouteKey::Settings)
            .collect();
        assert_eq!(normalize_allowed_routes(Some(without_settings)), None);
    }

    #[test]
    fn test_normalize_dedupes() {
        let routes = vec![RouteKey::Stock, RouteKey::Products, RouteKey::Stock];
        assert_eq!(
            normalize_allowed_routes(Some(routes)),
            Some(vec![RouteKey::Products, RouteKey::Stock])
        );
        assert_eq!(normalize_allowed_routes(Some(vec![])), Some(vec![]));
    }

    #[test]
    fn test_resolve_prefers_owned_team() {
        let me = Uuid::new_v4();
        let other = Uuid::new_v4();
        let joined = Membership { team_id: Uuid::new_v4(), owner_user_id: other, seq: 1 };
        let owned = Membership { team_id: Uuid::new_v4(), owner_user_id: me, seq: 2 };

        assert_eq!(resolve_active_team(me, &[joined, owned], None), Some(owned.team_id));
        assert_eq!(
            resolve_active_team(me, &[joined, owned], Some(joined.team_id)),
            Some(joined.team_id)
        );
        // A team the user is not in is ignored
        assert_eq!(
            resolve_active_team(me, &[joined, owned], Some(Uuid::new_v4())),
            Some(owned.team_id)
        );
        assert_eq!(resolve_active_team(me, &[], None), None);
    }

    #[test]
    fn test_join_rejections() {
        let me = Uuid::new_v4();
        let owner = Uuid::new_v4();
        let team = Uuid::new_v4();

        assert_eq!(evaluate_join(me, me, Some(team), &[]), Err(DomainError::SelfJoin));
        assert_eq!(evaluate_join(me, owner, None, &[]), Err(DomainError::NoTeam));
        assert_eq!(
            evaluate_join(me, owner, Some(team), &[team]),
            Err(DomainError::AlreadyMember)
        );
        assert_eq!(evaluate_join(me, owner, Some(team), &[]), Ok(team));
    }
}

//! Team management service: teams, memberships and route restrictions

use shared::{
    evaluate_join, normalize_allowed_routes, parse_allowed_routes, resolve_active_team,
    ActiveTeamInfo, JoinTeamResponse, MemberRole, Membership, Team, TeamMember,
    TeamMemberWithProfile, TeamWithRole,
};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{is_unique_violation, AppError, AppResult};

/// Team service for tenancy and membership management
#[derive(Clone)]
pub struct TeamService {
    db: PgPool,
}

/// A membership row together with the owner of its team
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MembershipRow {
    #[sqlx(flatten)]
    pub member: TeamMember,
    pub owner_user_id: Uuid,
}

impl MembershipRow {
    fn as_membership(&self) -> Membership {
        Membership {
            team_id: self.member.team_id,
            owner_user_id: self.owner_user_id,
            seq: self.member.seq,
        }
    }
}

const MEMBER_COLUMNS: &str =
    "tm.id, tm.seq, tm.team_id, tm.user_id, tm.role, tm.allowed_routes, tm.created_at";

impl TeamService {
    /// Create a new TeamService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Teams the user belongs to, in membership order
    pub async fn list_for_user(&self, user_id: Uuid) -> AppResult<Vec<TeamWithRole>> {
        let teams = sqlx::query_as::<_, TeamWithRole>(
            r#"
            SELECT t.id, t.name, t.owner_user_id, t.created_at, t.updated_at,
                   tm.role, tm.seq AS member_seq
            FROM teams t
            JOIN team_members tm ON tm.team_id = t.id
            WHERE tm.user_id = $1
            ORDER BY tm.seq ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await?;

        Ok(teams)
    }

    /// All memberships of a user with their team owners
    pub async fn memberships(&self, user_id: Uuid) -> AppResult<Vec<MembershipRow>> {
        let rows = sqlx::query_as::<_, MembershipRow>(&format!(
            r#"
            SELECT {MEMBER_COLUMNS}, t.owner_user_id
            FROM team_members tm
            JOIN teams t ON t.id = tm.team_id
            WHERE tm.user_id = $1
            ORDER BY tm.seq ASC
            "#
        ))
        .bind(user_id)
        .fetch_all(&self.db)
        .await?;

        Ok(rows)
    }

    /// Resolve the team a request operates on, with the caller's membership
    pub async fn resolve_active(
        &self,
        user_id: Uuid,
        requested: Option<Uuid>,
    ) -> AppResult<Option<TeamMember>> {
        let rows = self.memberships(user_id).await?;
        let memberships: Vec<Membership> = rows.iter().map(MembershipRow::as_membership).collect();

        if let Some(requested) = requested {
            if !memberships.iter().any(|m| m.team_id == requested) {
                tracing::warn!(%user_id, team_id = %requested, "Requested team ignored: not a member");
            }
        }

        let active = resolve_active_team(user_id, &memberships, requested);
        Ok(active.and_then(|team_id| {
            rows.into_iter()
                .find(|row| row.member.team_id == team_id)
                .map(|row| row.member)
        }))
    }

    /// Get a team by ID
    pub async fn get_team(&self, team_id: Uuid) -> AppResult<Team> {
        sqlx::query_as::<_, Team>(
            "SELECT id, name, owner_user_id, created_at, updated_at FROM teams WHERE id = $1",
        )
        .bind(team_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Team".to_string()))
    }

    /// Active team view for the route guard of the single-page app
    pub async fn active_team_info(&self, member: TeamMember) -> AppResult<ActiveTeamInfo> {
        let team = self.get_team(member.team_id).await?;
        let effective_routes = member.effective_routes();
        Ok(ActiveTeamInfo {
            team,
            membership: member,
            effective_routes,
        })
    }

    /// Create a team owned by the caller
    pub async fn create_team(&self, owner_user_id: Uuid, name: &str) -> AppResult<Team> {
        let mut tx = self.db.begin().await?;

        let team = sqlx::query_as::<_, Team>(
            r#"
            INSERT INTO teams (name, owner_user_id)
            VALUES ($1, $2)
            RETURNING id, name, owner_user_id, created_at, updated_at
            "#,
        )
        .bind(name.trim())
        .bind(owner_user_id)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("INSERT INTO team_members (team_id, user_id, role) VALUES ($1, $2, $3)")
            .bind(team.id)
            .bind(owner_user_id)
            .bind(MemberRole::Owner)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!(team_id = %team.id, %owner_user_id, "Team created");
        Ok(team)
    }

    /// Add a user to a team; only the owner may do this
    pub async fn add_member(
        &self,
        caller_id: Uuid,
        team_id: Uuid,
        target_user_id: Uuid,
    ) -> AppResult<TeamMember> {
        let team = self.get_team(team_id).await?;
        if team.owner_user_id != caller_id {
            return Err(AppError::Forbidden(
                "Only the team owner can add members".to_string(),
            ));
        }

        self.insert_member(team_id, target_user_id)
            .await
            .map_err(|e| match e {
                AppError::DatabaseError(ref db) if is_unique_violation(db, None) => {
                    AppError::Conflict("User is already a member".to_string())
                }
                other => other,
            })
    }

    /// Join the team owned by the user behind `owner_custom_id`
    pub async fn join_by_custom_id(
        &self,
        user_id: Uuid,
        owner_custom_id: &str,
    ) -> AppResult<JoinTeamResponse> {
        let owner = sqlx::query_as::<_, (Uuid, Option<String>)>(
            "SELECT user_id, display_name FROM user_profiles WHERE custom_id = $1",
        )
        .bind(owner_custom_id.trim().to_uppercase())
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("User with this ID".to_string()))?;
        let (owner_user_id, owner_display_name) = owner;

        let owner_team = sqlx::query_as::<_, Team>(
            r#"
            SELECT id, name, owner_user_id, created_at, updated_at
            FROM teams
            WHERE owner_user_id = $1
            ORDER BY created_at ASC
            LIMIT 1
            "#,
        )
        .bind(owner_user_id)
        .fetch_optional(&self.db)
        .await?;

        let joined: Vec<Uuid> = self
            .memberships(user_id)
            .await?
            .into_iter()
            .map(|row| row.member.team_id)
            .collect();

        let team_id = evaluate_join(
            user_id,
            owner_user_id,
            owner_team.as_ref().map(|t| t.id),
            &joined,
        )?;

        self.insert_member(team_id, user_id).await.map_err(|e| match e {
            // Lost a race with a concurrent join of the same user
            AppError::DatabaseError(ref db) if is_unique_violation(db, None) => {
                AppError::Domain(shared::DomainError::AlreadyMember)
            }
            other => other,
        })?;

        tracing::info!(%user_id, %team_id, "User joined team");

        Ok(JoinTeamResponse {
            team_id,
            team_name: owner_team.map(|t| t.name).unwrap_or_default(),
            owner_display_name,
        })
    }

    /// Members of a team with their public profile; the caller must belong to it
    pub async fn list_members(
        &self,
        caller_id: Uuid,
        team_id: Uuid,
    ) -> AppResult<Vec<TeamMemberWithProfile>> {
        self.require_member(caller_id, team_id).await?;

        let members = sqlx::query_as::<_, TeamMemberWithProfile>(&format!(
            r#"
            SELECT {MEMBER_COLUMNS}, up.custom_id, up.display_name
            FROM team_members tm
            LEFT JOIN user_profiles up ON up.user_id = tm.user_id
            WHERE tm.team_id = $1
            ORDER BY tm.seq ASC
            "#
        ))
        .bind(team_id)
        .fetch_all(&self.db)
        .await?;

        Ok(members)
    }

    /// Restrict (or unrestrict with `None`) the sections a member may open
    pub async fn set_allowed_routes(
        &self,
        caller_id: Uuid,
        team_id: Uuid,
        member_id: Uuid,
        routes: Option<&[String]>,
    ) -> AppResult<TeamMember> {
        let team = self.get_team(team_id).await?;
        if team.owner_user_id != caller_id {
            return Err(AppError::Forbidden(
                "Only the team owner can change member permissions".to_string(),
            ));
        }

        let member = self.get_member(team_id, member_id).await?;
        if member.role == MemberRole::Owner {
            return Err(AppError::InvalidInput(
                "The team owner always has full access".to_string(),
            ));
        }

        let parsed = parse_allowed_routes(routes)?;
        let stored: Option<Vec<String>> = normalize_allowed_routes(parsed)
            .map(|keys| keys.iter().map(|k| k.as_str().to_string()).collect());

        let updated = sqlx::query_as::<_, TeamMember>(
            r#"
            UPDATE team_members
            SET allowed_routes = $3
            WHERE id = $1 AND team_id = $2
            RETURNING id, seq, team_id, user_id, role, allowed_routes, created_at
            "#,
        )
        .bind(member_id)
        .bind(team_id)
        .bind(&stored)
        .fetch_one(&self.db)
        .await?;

        tracing::info!(%team_id, %member_id, restricted = stored.is_some(), "Member routes updated");
        Ok(updated)
    }

    async fn get_member(&self, team_id: Uuid, member_id: Uuid) -> AppResult<TeamMember> {
        sqlx::query_as::<_, TeamMember>(&format!(
            "SELECT {MEMBER_COLUMNS} FROM team_members tm WHERE tm.id = $1 AND tm.team_id = $2"
        ))
        .bind(member_id)
        .bind(team_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Team member".to_string()))
    }

    async fn require_member(&self, user_id: Uuid, team_id: Uuid) -> AppResult<()> {
        let is_member = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM team_members WHERE team_id = $1 AND user_id = $2)",
        )
        .bind(team_id)
        .bind(user_id)
        .fetch_one(&self.db)
        .await?;

        if !is_member {
            return Err(AppError::Forbidden("You are not a member of this team".to_string()));
        }
        Ok(())
    }

    async fn insert_member(&self, team_id: Uuid, user_id: Uuid) -> AppResult<TeamMember> {
        let member = sqlx::query_as::<_, TeamMember>(
            r#"
            INSERT INTO team_members (team_id, user_id, role)
            VALUES ($1, $2, $3)
            RETURNING id, seq, team_id, user_id, role, allowed_routes, created_at
            "#,
        )
        .bind(team_id)
        .bind(user_id)
        .bind(MemberRole::Member)
        .fetch_one(&self.db)
        .await?;

        Ok(member)
    }
}

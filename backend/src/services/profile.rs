//! User profile service: shareable custom IDs and display names

use shared::{generate_custom_id, normalize_custom_id, PublicProfile, UserProfile};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{is_unique_violation, AppError, AppResult};
use crate::middleware::AuthUser;

/// Attempts at generating an unused custom ID before giving up
pub const CUSTOM_ID_ATTEMPTS: usize = 5;

const USER_ID_CONSTRAINT: &str = "user_profiles_user_id_key";
const CUSTOM_ID_CONSTRAINT: &str = "user_profiles_custom_id_key";

/// Profile service
#[derive(Clone)]
pub struct ProfileService {
    db: PgPool,
}

const PROFILE_COLUMNS: &str = "id, user_id, custom_id, display_name, created_at, updated_at";

impl ProfileService {
    /// Create a new ProfileService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Get the caller's profile
    pub async fn get(&self, user_id: Uuid) -> AppResult<Option<UserProfile>> {
        let profile = sqlx::query_as::<_, UserProfile>(&format!(
            "SELECT {PROFILE_COLUMNS} FROM user_profiles WHERE user_id = $1"
        ))
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?;

        Ok(profile)
    }

    /// Return the caller's profile, creating it if absent.
    ///
    /// A supplied custom ID is validated and used as is; otherwise one is
    /// generated, retrying on collisions. When a concurrent request creates
    /// the profile first, its row is returned.
    pub async fn get_or_create(
        &self,
        user: &AuthUser,
        requested_custom_id: Option<&str>,
        display_name: Option<&str>,
    ) -> AppResult<UserProfile> {
        self.touch_user(user).await?;

        if let Some(existing) = self.get(user.user_id).await? {
            return Ok(existing);
        }

        let requested = requested_custom_id
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(normalize_custom_id)
            .transpose()?;

        let display_name = display_name.map(str::trim).filter(|n| !n.is_empty());

        for attempt in 1..=CUSTOM_ID_ATTEMPTS {
            let custom_id = requested.clone().unwrap_or_else(generate_custom_id);

            match self.insert(user.user_id, &custom_id, display_name).await {
                Ok(profile) => {
                    tracing::info!(user_id = %user.user_id, %custom_id, "Profile created");
                    return Ok(profile);
                }
                Err(e) if is_unique_violation(&e, Some(USER_ID_CONSTRAINT)) => {
                    tracing::debug!(user_id = %user.user_id, "Profile created concurrently, re-reading");
                    return self
                        .get(user.user_id)
                        .await?
                        .ok_or_else(|| AppError::StorageError("Profile vanished after conflict".into()));
                }
                Err(e) if is_unique_violation(&e, Some(CUSTOM_ID_CONSTRAINT)) => {
                    if requested.is_some() {
                        return Err(AppError::Conflict("This custom ID is already taken".to_string()));
                    }
                    tracing::warn!(attempt, %custom_id, "Custom ID collision, regenerating");
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(AppError::StorageError(format!(
            "Could not allocate a unique custom ID after {} attempts",
            CUSTOM_ID_ATTEMPTS
        )))
    }

    /// Update the caller's display name
    pub async fn update_display_name(
        &self,
        user_id: Uuid,
        display_name: Option<&str>,
    ) -> AppResult<UserProfile> {
        let display_name = display_name.map(str::trim).filter(|n| !n.is_empty());

        sqlx::query_as::<_, UserProfile>(&format!(
            r#"
            UPDATE user_profiles
            SET display_name = $2, updated_at = NOW()
            WHERE user_id = $1
            RETURNING {PROFILE_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(display_name)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Profile".to_string()))
    }

    /// Resolve a custom ID to the public part of a profile
    pub async fn lookup(&self, custom_id: &str) -> AppResult<PublicProfile> {
        let custom_id = custom_id.trim().to_uppercase();

        sqlx::query_as::<_, PublicProfile>(
            "SELECT user_id, custom_id, display_name FROM user_profiles WHERE custom_id = $1",
        )
        .bind(&custom_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("User".to_string()))
    }

    async fn insert(
        &self,
        user_id: Uuid,
        custom_id: &str,
        display_name: Option<&str>,
    ) -> Result<UserProfile, sqlx::Error> {
        sqlx::query_as::<_, UserProfile>(&format!(
            r#"
            INSERT INTO user_profiles (user_id, custom_id, display_name)
            VALUES ($1, $2, $3)
            RETURNING {PROFILE_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(custom_id)
        .bind(display_name)
        .fetch_one(&self.db)
        .await
    }

    /// Record the user and when they were last seen
    async fn touch_user(&self, user: &AuthUser) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO users (id, email, last_seen_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (id) DO UPDATE
            SET last_seen_at = NOW(), email = COALESCE(EXCLUDED.email, users.email)
            "#,
        )
        .bind(user.user_id)
        .bind(&user.email)
        .execute(&self.db)
        .await?;

        Ok(())
    }
}

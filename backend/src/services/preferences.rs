//! Notification preference service

use shared::{
    CreatePreferencesRequest, UpdatePreferencesRequest, UserPreferences, DEFAULT_ALERT_EXPIRY_DAYS,
};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{is_unique_violation, AppError, AppResult};

#[derive(Clone)]
pub struct PreferencesService {
    db: PgPool,
}

const PREFERENCE_COLUMNS: &str = "id, user_id, alert_low_stock, alert_expiry, alert_expiry_days, \
     alert_ai_suggestions, created_at, updated_at";

impl PreferencesService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn get(&self, user_id: Uuid) -> AppResult<UserPreferences> {
        self.find(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Preferences".to_string()))
    }

    pub async fn find(&self, user_id: Uuid) -> AppResult<Option<UserPreferences>> {
        let prefs = sqlx::query_as::<_, UserPreferences>(&format!(
            "SELECT {PREFERENCE_COLUMNS} FROM user_preferences WHERE user_id = $1"
        ))
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?;

        Ok(prefs)
    }

    /// Create preferences from defaults merged with `input`; returns the
    /// existing row when the user already has one
    pub async fn create(
        &self,
        user_id: Uuid,
        input: &CreatePreferencesRequest,
    ) -> AppResult<UserPreferences> {
        let result = sqlx::query_as::<_, UserPreferences>(&format!(
            r#"
            INSERT INTO user_preferences
                (user_id, alert_low_stock, alert_expiry, alert_expiry_days, alert_ai_suggestions)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {PREFERENCE_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(input.alert_low_stock.unwrap_or(true))
        .bind(input.alert_expiry.unwrap_or(true))
        .bind(input.alert_expiry_days.unwrap_or(DEFAULT_ALERT_EXPIRY_DAYS))
        .bind(input.alert_ai_suggestions.unwrap_or(true))
        .fetch_one(&self.db)
        .await;

        match result {
            Ok(prefs) => Ok(prefs),
            Err(e) if is_unique_violation(&e, None) => self.get(user_id).await,
            Err(e) => Err(e.into()),
        }
    }

    /// Update only the supplied fields
    pub async fn update(
        &self,
        user_id: Uuid,
        input: &UpdatePreferencesRequest,
    ) -> AppResult<UserPreferences> {
        if input.is_empty() {
            return Err(AppError::InvalidInput("No fields to update".to_string()));
        }

        sqlx::query_as::<_, UserPreferences>(&format!(
            r#"
            UPDATE user_preferences SET
                alert_low_stock = COALESCE($2, alert_low_stock),
                alert_expiry = COALESCE($3, alert_expiry),
                alert_expiry_days = COALESCE($4, alert_expiry_days),
                alert_ai_suggestions = COALESCE($5, alert_ai_suggestions),
                updated_at = NOW()
            WHERE user_id = $1
            RETURNING {PREFERENCE_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(input.alert_low_stock)
        .bind(input.alert_expiry)
        .bind(input.alert_expiry_days)
        .bind(input.alert_ai_suggestions)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Preferences".to_string()))
    }
}

//! User profile and preference models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Maps an authenticated user to a shareable custom ID
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct UserProfile {
    pub id: Uuid,
    pub user_id: Uuid,
    pub custom_id: String,
    pub display_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// What other users may learn from a custom ID lookup
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct PublicProfile {
    pub user_id: Uuid,
    pub custom_id: String,
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct CreateProfileRequest {
    /// Generated server-side when absent
    pub custom_id: Option<String>,

    #[validate(length(max = 80, message = "Display name must be at most 80 characters"))]
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(max = 80, message = "Display name must be at most 80 characters"))]
    pub display_name: Option<String>,
}

/// Notification preferences
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct UserPreferences {
    pub id: Uuid,
    pub user_id: Uuid,
    pub alert_low_stock: bool,
    pub alert_expiry: bool,
    pub alert_expiry_days: i32,
    pub alert_ai_suggestions: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub const DEFAULT_ALERT_EXPIRY_DAYS: i32 = 7;

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct CreatePreferencesRequest {
    pub alert_low_stock: Option<bool>,
    pub alert_expiry: Option<bool>,
    #[validate(range(min = 1, max = 365, message = "Expiry alert window must be between 1 and 365 days"))]
    pub alert_expiry_days: Option<i32>,
    pub alert_ai_suggestions: Option<bool>,
}

/// Partial update; absent fields are left untouched
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdatePreferencesRequest {
    pub alert_low_stock: Option<bool>,
    pub alert_expiry: Option<bool>,
    #[validate(range(min = 1, max = 365, message = "Expiry alert window must be between 1 and 365 days"))]
    pub alert_expiry_days: Option<i32>,
    pub alert_ai_suggestions: Option<bool>,
}

impl UpdatePreferencesRequest {
    pub fn is_empty(&self) -> bool {
        self.alert_low_stock.is_none()
            && self.alert_expiry.is_none()
            && self.alert_expiry_days.is_none()
            && self.alert_ai_suggestions.is_none()
    }
}

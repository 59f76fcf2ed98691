//! Product catalog models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::StockSnapshot;

/// A product tracked by a team
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Product {
    pub id: Uuid,
    pub team_id: Uuid,
    pub created_by: Option<Uuid>,
    pub name: String,
    pub category: String,
    pub unit: String,
    /// Reorder threshold; zero disables the low-stock alert
    pub min_stock_level: Decimal,
    pub expiry_tracking: bool,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A product joined with its current stock snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductWithStock {
    #[serde(flatten)]
    pub product: Product,
    pub stock: StockSnapshot,
}

impl ProductWithStock {
    pub fn quantity(&self) -> Decimal {
        self.stock.quantity
    }
}

/// Input for creating or replacing a product
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ProductInput {
    #[validate(length(min = 1, max = 120, message = "Product name must be between 1 and 120 characters"))]
    pub name: String,

    #[validate(length(min = 1, max = 60, message = "Category is required"))]
    pub category: String,

    #[validate(length(min = 1, max = 30, message = "Unit is required"))]
    pub unit: String,

    #[serde(default)]
    pub min_stock_level: Option<Decimal>,

    #[serde(default)]
    pub expiry_tracking: bool,

    #[validate(length(max = 1000, message = "Notes must be at most 1000 characters"))]
    pub notes: Option<String>,
}

impl ProductInput {
    pub fn min_stock_level_or_default(&self) -> Decimal {
        self.min_stock_level.unwrap_or(Decimal::ZERO)
    }
}

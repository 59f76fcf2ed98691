//! Reporting service for stock and movement reports
//! Rows are flat so the same data serves JSON and CSV export

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use shared::catalog::{label_of, movement_reasons, PRODUCT_CATEGORIES, PRODUCT_UNITS};
use shared::{ledger, DateRange, Direction, MovementType};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::ProductService;

/// Reporting service
#[derive(Clone)]
pub struct ReportingService {
    db: PgPool,
}

/// Stock level of one product
#[derive(Debug, Serialize)]
pub struct StockReportRow {
    pub product_id: Uuid,
    pub product_name: String,
    pub category: String,
    pub unit: String,
    pub quantity: Decimal,
    pub min_stock_level: Decimal,
    pub low_stock: bool,
    pub updated_at: Option<DateTime<Utc>>,
}

/// One ledger entry in a movement report
#[derive(Debug, Serialize)]
pub struct MovementReportRow {
    pub created_at: DateTime<Utc>,
    pub product_name: String,
    #[serde(rename = "type")]
    pub movement_type: MovementType,
    pub direction: Direction,
    pub quantity: Decimal,
    pub signed_quantity: Decimal,
    pub reason: Option<String>,
    pub expiry_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

#[derive(Debug, sqlx::FromRow)]
struct MovementReportRecord {
    created_at: DateTime<Utc>,
    product_name: String,
    movement_type: MovementType,
    direction: Direction,
    quantity: Decimal,
    reason: Option<String>,
    expiry_date: Option<NaiveDate>,
    notes: Option<String>,
}

impl From<MovementReportRecord> for MovementReportRow {
    fn from(record: MovementReportRecord) -> Self {
        let reason = record
            .reason
            .map(|r| label_of(movement_reasons(record.movement_type), &r));
        Self {
            created_at: record.created_at,
            product_name: record.product_name,
            movement_type: record.movement_type,
            direction: record.direction,
            quantity: record.quantity,
            signed_quantity: record.direction.apply_sign(record.quantity),
            reason,
            expiry_date: record.expiry_date,
            notes: record.notes,
        }
    }
}

impl ReportingService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Current stock of every product of the team, with catalog labels
    pub async fn stock_report(&self, team_id: Uuid) -> AppResult<Vec<StockReportRow>> {
        let products = ProductService::new(self.db.clone())
            .list_with_stock(team_id)
            .await?;

        Ok(products
            .into_iter()
            .map(|p| {
                let quantity = p.quantity();
                StockReportRow {
                    product_id: p.product.id,
                    category: label_of(PRODUCT_CATEGORIES, &p.product.category),
                    unit: label_of(PRODUCT_UNITS, &p.product.unit),
                    low_stock: ledger::is_low_stock(quantity, p.product.min_stock_level),
                    min_stock_level: p.product.min_stock_level,
                    updated_at: p.stock.updated_at,
                    product_name: p.product.name,
                    quantity,
                }
            })
            .collect())
    }

    /// Movements of the team within an inclusive date range, oldest first
    pub async fn movement_report(
        &self,
        team_id: Uuid,
        range: &DateRange,
    ) -> AppResult<Vec<MovementReportRow>> {
        if !range.is_valid() {
            return Err(AppError::InvalidInput(
                "start_date must not be after end_date".to_string(),
            ));
        }

        let records = sqlx::query_as::<_, MovementReportRecord>(
            r#"
            SELECT m.created_at, p.name AS product_name, m.type AS movement_type,
                   m.direction, m.quantity, m.reason, m.expiry_date, m.notes
            FROM stock_movements m
            JOIN products p ON p.id = m.product_id
            WHERE p.team_id = $1
              AND ($2::date IS NULL OR m.created_at::date >= $2)
              AND ($3::date IS NULL OR m.created_at::date <= $3)
            ORDER BY m.created_at ASC, m.seq ASC
            "#,
        )
        .bind(team_id)
        .bind(range.start)
        .bind(range.end)
        .fetch_all(&self.db)
        .await?;

        Ok(records.into_iter().map(MovementReportRow::from).collect())
    }

    /// Export report data as CSV
    pub fn export_to_csv<T: Serialize>(data: &[T]) -> AppResult<String> {
        let mut wtr = csv::Writer::from_writer(vec![]);
        for record in data {
            wtr.serialize(record)
                .map_err(|e| AppError::Internal(format!("CSV serialization error: {}", e)))?;
        }
        let bytes = wtr
            .into_inner()
            .map_err(|e| AppError::Internal(format!("CSV writer error: {}", e)))?;
        String::from_utf8(bytes)
            .map_err(|e| AppError::Internal(format!("UTF-8 conversion error: {}", e)))
    }
}

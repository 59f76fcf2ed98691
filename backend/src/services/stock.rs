//! Stock mutation and ledger reader service
//!
//! The snapshot in `stock` is written only here, and always in the same
//! transaction as the movement that explains the change. Concurrent
//! registrations on one product serialize on the snapshot row lock.

use rust_decimal::Decimal;
use shared::catalog::STOCK_COUNT_REASON;
use shared::{
    ledger, validate_expiry_date, Movement, MovementDraft, MovementWithProduct,
    NegativeStockPolicy, Reconciliation, StockAlerts, StockCountItem, StockCountResult,
    StockSummary,
};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::ProductService;

/// Stock service
#[derive(Clone)]
pub struct StockService {
    db: PgPool,
    policy: NegativeStockPolicy,
}

const MOVEMENT_COLUMNS: &str = "m.id, m.seq, m.product_id, m.type AS movement_type, m.direction, \
     m.quantity, m.reason, m.expiry_date, m.notes, m.created_by, m.created_at";

/// Product fields the mutation path needs
#[derive(Debug, sqlx::FromRow)]
struct ProductGuard {
    name: String,
    expiry_tracking: bool,
}

impl StockService {
    /// Create a new StockService instance
    pub fn new(db: PgPool, policy: NegativeStockPolicy) -> Self {
        Self { db, policy }
    }

    /// Record one movement and apply it to the snapshot, atomically
    pub async fn register_movement(
        &self,
        team_id: Uuid,
        user_id: Uuid,
        draft: &MovementDraft,
    ) -> AppResult<Movement> {
        let mut tx = self.db.begin().await?;

        let movement = self.apply_movement(&mut *tx, team_id, user_id, draft).await?;

        tx.commit()
            .await
            .map_err(|e| AppError::StorageError(format!("Movement commit failed: {}", e)))?;

        tracing::info!(
            movement_id = %movement.id,
            product_id = %movement.product_id,
            movement_type = %movement.movement_type,
            delta = %movement.signed_quantity(),
            "Stock movement registered"
        );

        Ok(movement)
    }

    /// Ledger insert plus snapshot update on an open transaction
    async fn apply_movement(
        &self,
        conn: &mut PgConnection,
        team_id: Uuid,
        user_id: Uuid,
        draft: &MovementDraft,
    ) -> AppResult<Movement> {
        // Products of other teams are reported as missing
        let product = sqlx::query_as::<_, ProductGuard>(
            "SELECT name, expiry_tracking FROM products WHERE id = $1 AND team_id = $2",
        )
        .bind(draft.product_id)
        .bind(team_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| AppError::NotFound("Product".to_string()))?;

        validate_expiry_date(draft.movement_type, product.expiry_tracking, draft.expiry_date)
            .map_err(|m| AppError::InvalidInput(m.to_string()))?;

        let current = lock_snapshot(&mut *conn, draft.product_id).await?;

        let delta = draft.delta();
        if let Err(e) = ledger::apply(current, delta, self.policy) {
            tracing::debug!(product = %product.name, %current, %delta, "Movement rejected");
            return Err(e.into());
        }

        let movement = sqlx::query_as::<_, Movement>(
            r#"
            INSERT INTO stock_movements
                (product_id, type, direction, quantity, reason, expiry_date, notes, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, seq, product_id, type AS movement_type, direction, quantity,
                      reason, expiry_date, notes, created_by, created_at
            "#,
        )
        .bind(draft.product_id)
        .bind(draft.movement_type)
        .bind(draft.direction)
        .bind(draft.quantity.value())
        .bind(&draft.reason)
        .bind(draft.expiry_date)
        .bind(&draft.notes)
        .bind(user_id)
        .fetch_one(&mut *conn)
        .await?;

        sqlx::query(
            "UPDATE stock SET quantity = quantity + $2, updated_at = NOW() WHERE product_id = $1",
        )
        .bind(draft.product_id)
        .bind(delta)
        .execute(&mut *conn)
        .await?;

        Ok(movement)
    }

    /// Most recent movements of the team, newest first
    pub async fn movement_history(
        &self,
        team_id: Uuid,
        limit: i64,
        product_id: Option<Uuid>,
    ) -> AppResult<Vec<MovementWithProduct>> {
        let movements = sqlx::query_as::<_, MovementWithProduct>(&format!(
            r#"
            SELECT {MOVEMENT_COLUMNS}, p.name AS product_name
            FROM stock_movements m
            JOIN products p ON p.id = m.product_id
            WHERE p.team_id = $1
              AND ($2::uuid IS NULL OR m.product_id = $2)
            ORDER BY m.created_at DESC, m.seq DESC
            LIMIT $3
            "#
        ))
        .bind(team_id)
        .bind(product_id)
        .bind(limit)
        .fetch_all(&self.db)
        .await?;

        Ok(movements)
    }

    /// Low-stock list plus dashboard counters
    pub async fn alerts(&self, team_id: Uuid, expiry_days: i64) -> AppResult<StockAlerts> {
        let products = ProductService::new(self.db.clone())
            .list_with_stock(team_id)
            .await?;
        let low_stock = ledger::low_stock(&products);

        // Both counters read the database clock
        let expiring_soon_count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(DISTINCT m.product_id)
            FROM stock_movements m
            JOIN products p ON p.id = m.product_id
            JOIN stock s ON s.product_id = m.product_id
            WHERE p.team_id = $1
              AND m.type = 'entrada'
              AND m.expiry_date BETWEEN CURRENT_DATE AND CURRENT_DATE + $2::int
              AND s.quantity > 0
            "#,
        )
        .bind(team_id)
        .bind(expiry_days.clamp(0, 365) as i32)
        .fetch_one(&self.db)
        .await?;

        let total_movements_today = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM stock_movements m
            JOIN products p ON p.id = m.product_id
            WHERE p.team_id = $1 AND m.created_at >= CURRENT_DATE
            "#,
        )
        .bind(team_id)
        .fetch_one(&self.db)
        .await?;

        let summary = StockSummary {
            total_products: products.len() as i64,
            low_stock_count: low_stock.len() as i64,
            expiring_soon_count,
            total_movements_today,
        };

        Ok(StockAlerts { low_stock, summary })
    }

    /// Replay a product's ledger and compare it with the snapshot
    pub async fn reconcile(&self, team_id: Uuid, product_id: Uuid) -> AppResult<Reconciliation> {
        let snapshot = sqlx::query_scalar::<_, Option<Decimal>>(
            r#"
            SELECT s.quantity
            FROM products p
            LEFT JOIN stock s ON s.product_id = p.id
            WHERE p.id = $1 AND p.team_id = $2
            "#,
        )
        .bind(product_id)
        .bind(team_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Product".to_string()))?;

        let movements = sqlx::query_as::<_, Movement>(&format!(
            "SELECT {MOVEMENT_COLUMNS} FROM stock_movements m WHERE m.product_id = $1 ORDER BY m.seq ASC"
        ))
        .bind(product_id)
        .fetch_all(&self.db)
        .await?;

        let report = ledger::reconcile(product_id, snapshot.unwrap_or(Decimal::ZERO), &movements);
        if !report.consistent {
            tracing::error!(
                %product_id,
                snapshot = %report.snapshot_quantity,
                ledger = %report.ledger_quantity,
                "Stock snapshot diverged from its ledger"
            );
        }

        Ok(report)
    }

    /// Apply a physical count: one adjustment per product whose count
    /// differs from the snapshot, all in one transaction
    pub async fn apply_stock_count(
        &self,
        team_id: Uuid,
        user_id: Uuid,
        items: &[StockCountItem],
        notes: Option<&str>,
    ) -> AppResult<StockCountResult> {
        if items.is_empty() {
            return Err(AppError::InvalidInput("No products counted".to_string()));
        }

        // Lock snapshots in a fixed order so overlapping counts cannot deadlock
        let mut ordered: Vec<&StockCountItem> = items.iter().collect();
        ordered.sort_by_key(|item| item.product_id);

        let mut tx = self.db.begin().await?;
        let mut adjustments = Vec::new();
        let mut unchanged = 0;

        for item in ordered {
            ensure_team_product(&mut *tx, team_id, item.product_id).await?;
            let registered = lock_snapshot(&mut *tx, item.product_id).await?;

            let Some(adjustment) = ledger::stock_count_adjustment(registered, item.counted_quantity)
                .map_err(|e| AppError::InvalidInput(e.to_string()))?
            else {
                unchanged += 1;
                continue;
            };

            let draft = MovementDraft::new(
                item.product_id,
                adjustment.movement_type,
                Some(adjustment.direction),
                adjustment.quantity,
                Some(STOCK_COUNT_REASON.to_string()),
                None,
                notes.map(str::to_string),
            )?;

            adjustments.push(self.apply_movement(&mut *tx, team_id, user_id, &draft).await?);
        }

        tx.commit()
            .await
            .map_err(|e| AppError::StorageError(format!("Stock count commit failed: {}", e)))?;

        tracing::info!(%team_id, adjusted = adjustments.len(), unchanged, "Stock count applied");

        Ok(StockCountResult {
            adjustments,
            unchanged,
        })
    }
}

/// 404 unless the product belongs to the team
async fn ensure_team_product(
    conn: &mut PgConnection,
    team_id: Uuid,
    product_id: Uuid,
) -> AppResult<()> {
    let exists = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS (SELECT 1 FROM products WHERE id = $1 AND team_id = $2)",
    )
    .bind(product_id)
    .bind(team_id)
    .fetch_one(&mut *conn)
    .await?;

    if !exists {
        return Err(AppError::NotFound("Product".to_string()));
    }
    Ok(())
}

/// Lock the product's snapshot row for the rest of the transaction and
/// return its quantity. A missing row is created at zero first.
async fn lock_snapshot(conn: &mut PgConnection, product_id: Uuid) -> AppResult<Decimal> {
    sqlx::query(
        "INSERT INTO stock (product_id, quantity) VALUES ($1, 0) ON CONFLICT (product_id) DO NOTHING",
    )
    .bind(product_id)
    .execute(&mut *conn)
    .await?;

    let quantity = sqlx::query_scalar::<_, Decimal>(
        "SELECT quantity FROM stock WHERE product_id = $1 FOR UPDATE",
    )
    .bind(product_id)
    .fetch_one(&mut *conn)
    .await?;

    Ok(quantity)
}

//! Product catalog service, scoped to a team

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use shared::{validate_product_input, Product, ProductInput, ProductWithStock, StockSnapshot};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// Product service
#[derive(Clone)]
pub struct ProductService {
    db: PgPool,
}

/// Product joined with its snapshot; the snapshot columns are nullable
/// because of the LEFT JOIN
#[derive(Debug, sqlx::FromRow)]
struct ProductStockRow {
    #[sqlx(flatten)]
    product: Product,
    stock_quantity: Option<Decimal>,
    stock_updated_at: Option<DateTime<Utc>>,
}

impl From<ProductStockRow> for ProductWithStock {
    fn from(row: ProductStockRow) -> Self {
        let stock = StockSnapshot {
            product_id: row.product.id,
            quantity: row.stock_quantity.unwrap_or(Decimal::ZERO),
            updated_at: row.stock_updated_at,
        };
        ProductWithStock {
            product: row.product,
            stock,
        }
    }
}

const PRODUCT_COLUMNS: &str = "p.id, p.team_id, p.created_by, p.name, p.category, p.unit, \
     p.min_stock_level, p.expiry_tracking, p.notes, p.created_at, p.updated_at";

impl ProductService {
    /// Create a new ProductService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// All products of a team with their current stock, by name.
    /// A missing snapshot row reads as zero.
    pub async fn list_with_stock(&self, team_id: Uuid) -> AppResult<Vec<ProductWithStock>> {
        let rows = sqlx::query_as::<_, ProductStockRow>(&format!(
            r#"
            SELECT {PRODUCT_COLUMNS},
                   s.quantity AS stock_quantity, s.updated_at AS stock_updated_at
            FROM products p
            LEFT JOIN stock s ON s.product_id = p.id
            WHERE p.team_id = $1
            ORDER BY p.name ASC
            "#
        ))
        .bind(team_id)
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(ProductWithStock::from).collect())
    }

    /// One product of the team with its stock
    pub async fn get(&self, team_id: Uuid, product_id: Uuid) -> AppResult<ProductWithStock> {
        let row = sqlx::query_as::<_, ProductStockRow>(&format!(
            r#"
            SELECT {PRODUCT_COLUMNS},
                   s.quantity AS stock_quantity, s.updated_at AS stock_updated_at
            FROM products p
            LEFT JOIN stock s ON s.product_id = p.id
            WHERE p.id = $1 AND p.team_id = $2
            "#
        ))
        .bind(product_id)
        .bind(team_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Product".to_string()))?;

        Ok(row.into())
    }

    /// Create a product and its zero snapshot in one transaction
    pub async fn create(
        &self,
        team_id: Uuid,
        user_id: Uuid,
        input: &ProductInput,
    ) -> AppResult<ProductWithStock> {
        validate_product_input(input).map_err(|m| AppError::InvalidInput(m.to_string()))?;

        let mut tx = self.db.begin().await?;

        let product = sqlx::query_as::<_, Product>(
            r#"
            INSERT INTO products
                (team_id, created_by, name, category, unit, min_stock_level, expiry_tracking, notes)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, team_id, created_by, name, category, unit,
                      min_stock_level, expiry_tracking, notes, created_at, updated_at
            "#,
        )
        .bind(team_id)
        .bind(user_id)
        .bind(input.name.trim())
        .bind(&input.category)
        .bind(&input.unit)
        .bind(input.min_stock_level_or_default())
        .bind(input.expiry_tracking)
        .bind(&input.notes)
        .fetch_one(&mut *tx)
        .await?;

        let updated_at = sqlx::query_scalar::<_, DateTime<Utc>>(
            "INSERT INTO stock (product_id, quantity) VALUES ($1, 0) RETURNING updated_at",
        )
        .bind(product.id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(product_id = %product.id, %team_id, "Product created");

        let stock = StockSnapshot {
            product_id: product.id,
            quantity: Decimal::ZERO,
            updated_at: Some(updated_at),
        };
        Ok(ProductWithStock { product, stock })
    }

    /// Replace a product's editable fields
    pub async fn update(
        &self,
        team_id: Uuid,
        product_id: Uuid,
        input: &ProductInput,
    ) -> AppResult<ProductWithStock> {
        validate_product_input(input).map_err(|m| AppError::InvalidInput(m.to_string()))?;
        self.ensure_owned_by(team_id, product_id).await?;

        sqlx::query(
            r#"
            UPDATE products
            SET name = $2, category = $3, unit = $4, min_stock_level = $5,
                expiry_tracking = $6, notes = $7, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(product_id)
        .bind(input.name.trim())
        .bind(&input.category)
        .bind(&input.unit)
        .bind(input.min_stock_level_or_default())
        .bind(input.expiry_tracking)
        .bind(&input.notes)
        .execute(&self.db)
        .await?;

        self.get(team_id, product_id).await
    }

    /// Delete a product; its snapshot and movements go with it
    pub async fn delete(&self, team_id: Uuid, product_id: Uuid) -> AppResult<()> {
        self.ensure_owned_by(team_id, product_id).await?;

        sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(product_id)
            .execute(&self.db)
            .await?;

        tracing::info!(%product_id, %team_id, "Product deleted");
        Ok(())
    }

    /// 404 for an unknown product, 403 for a product of another team
    async fn ensure_owned_by(&self, team_id: Uuid, product_id: Uuid) -> AppResult<()> {
        let owner = sqlx::query_scalar::<_, Uuid>("SELECT team_id FROM products WHERE id = $1")
            .bind(product_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Product".to_string()))?;

        if owner != team_id {
            return Err(AppError::Forbidden(
                "This product belongs to another team".to_string(),
            ));
        }
        Ok(())
    }
}

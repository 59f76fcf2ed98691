//! Stock ledger arithmetic
//!
//! A product's snapshot quantity is the signed sum of its movements. The
//! functions here are the single definition of that sum and of the derived
//! views (low stock, stock counts), used by the backend mutation service and
//! by the tests that check snapshot/ledger consistency.

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::error::DomainError;
use crate::models::{
    fits_stock_column, Direction, LowStockProduct, Movement, MovementType, ProductWithStock,
    Quantity, Reconciliation,
};

/// Whether a movement may take the snapshot below zero
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NegativeStockPolicy {
    #[default]
    Reject,
    Allow,
}

impl NegativeStockPolicy {
    pub fn from_allow_negative(allow_negative: bool) -> Self {
        if allow_negative {
            NegativeStockPolicy::Allow
        } else {
            NegativeStockPolicy::Reject
        }
    }
}

/// Sum of signed deltas of a ledger
pub fn replay<'a>(movements: impl IntoIterator<Item = &'a Movement>) -> Decimal {
    movements
        .into_iter()
        .map(Movement::signed_quantity)
        .sum()
}

/// Quantity after applying `delta` to `current`.
///
/// Under `Reject`, only decreases are checked: an entry onto an already
/// negative snapshot is still accepted. A result the stock column cannot
/// hold is rejected.
pub fn apply(current: Decimal, delta: Decimal, policy: NegativeStockPolicy) -> Result<Decimal, DomainError> {
    let next = current
        .checked_add(delta)
        .filter(|next| fits_stock_column(*next))
        .ok_or(DomainError::StockLimitExceeded)?;

    if policy == NegativeStockPolicy::Reject && delta < Decimal::ZERO && next < Decimal::ZERO {
        return Err(DomainError::InsufficientStock {
            available: current,
            requested: -delta,
        });
    }

    Ok(next)
}

/// A threshold of zero disables the alert
pub fn is_low_stock(quantity: Decimal, min_stock_level: Decimal) -> bool {
    min_stock_level > Decimal::ZERO && quantity <= min_stock_level
}

/// Products at or below their threshold, lowest quantity first
pub fn low_stock(products: &[ProductWithStock]) -> Vec<LowStockProduct> {
    let mut low: Vec<LowStockProduct> = products
        .iter()
        .filter(|p| is_low_stock(p.quantity(), p.product.min_stock_level))
        .map(|p| LowStockProduct {
            product_id: p.product.id,
            product_name: p.product.name.clone(),
            category: p.product.category.clone(),
            unit: p.product.unit.clone(),
            current_quantity: p.quantity(),
            min_stock_level: p.product.min_stock_level,
        })
        .collect();

    low.sort_by(|a, b| {
        a.current_quantity
            .cmp(&b.current_quantity)
            .then_with(|| a.product_name.cmp(&b.product_name))
    });
    low
}

/// Compare a stored snapshot with the replayed ledger
pub fn reconcile(product_id: Uuid, snapshot_quantity: Decimal, movements: &[Movement]) -> Reconciliation {
    let ledger_quantity = replay(movements);
    Reconciliation {
        product_id,
        snapshot_quantity,
        ledger_quantity,
        movement_count: movements.len() as i64,
        consistent: snapshot_quantity == ledger_quantity,
    }
}

/// Movement that brings a registered quantity down to a physical count
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountAdjustment {
    pub movement_type: MovementType,
    pub direction: Direction,
    pub quantity: Quantity,
}

/// Adjustment needed after a stock count.
///
/// Counts only ever reveal missing stock: a count above the registered
/// quantity must be recorded as an entry instead. Returns `None` when the
/// count matches.
pub fn stock_count_adjustment(
    registered: Decimal,
    counted: Decimal,
) -> Result<Option<CountAdjustment>, DomainError> {
    if counted < Decimal::ZERO {
        return Err(DomainError::NegativeCount);
    }
    if !fits_stock_column(counted) {
        return Err(DomainError::InvalidQuantity);
    }
    if counted > registered {
        return Err(DomainError::CountExceedsRegistered { counted, registered });
    }
    if counted == registered {
        return Ok(None);
    }

    Ok(Some(CountAdjustment {
        movement_type: MovementType::Ajuste,
        direction: Direction::Out,
        quantity: Quantity::new(registered - counted)?,
    }))
}

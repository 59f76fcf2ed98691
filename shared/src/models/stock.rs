//! Stock snapshot and movement ledger models

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::catalog;
use crate::error::DomainError;

/// Kind of stock movement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(type_name = "movement_type", rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum MovementType {
    /// Goods received
    Entrada,
    /// Goods consumed or sold
    Saida,
    /// Breakage, expiry, theft
    Perda,
    /// Inventory correction in either direction
    Ajuste,
}

impl MovementType {
    pub const ALL: [MovementType; 4] = [
        MovementType::Entrada,
        MovementType::Saida,
        MovementType::Perda,
        MovementType::Ajuste,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MovementType::Entrada => "entrada",
            MovementType::Saida => "saida",
            MovementType::Perda => "perda",
            MovementType::Ajuste => "ajuste",
        }
    }

    /// Direction implied by the type, `None` for adjustments
    pub fn fixed_direction(&self) -> Option<Direction> {
        match self {
            MovementType::Entrada => Some(Direction::In),
            MovementType::Saida | MovementType::Perda => Some(Direction::Out),
            MovementType::Ajuste => None,
        }
    }

    /// Resolve the direction of a movement of this type.
    ///
    /// Entries, exits and losses ignore the requested direction; adjustments
    /// must state one.
    pub fn resolve_direction(&self, requested: Option<Direction>) -> Result<Direction, DomainError> {
        match self.fixed_direction() {
            Some(direction) => Ok(direction),
            None => requested.ok_or(DomainError::MissingDirection),
        }
    }
}

impl fmt::Display for MovementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MovementType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "entrada" => Ok(MovementType::Entrada),
            "saida" => Ok(MovementType::Saida),
            "perda" => Ok(MovementType::Perda),
            "ajuste" => Ok(MovementType::Ajuste),
            other => Err(DomainError::UnknownMovementType(other.to_string())),
        }
    }
}

/// Direction of a movement relative to the stock level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(type_name = "movement_direction", rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    In,
    Out,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::In => "in",
            Direction::Out => "out",
        }
    }

    /// Apply the direction's sign to an unsigned magnitude
    pub fn apply_sign(&self, magnitude: Decimal) -> Decimal {
        match self {
            Direction::In => magnitude,
            Direction::Out => -magnitude,
        }
    }
}

/// Decimal places kept by the `NUMERIC(14, 3)` stock columns
pub const QUANTITY_SCALE: u32 = 3;

/// Integer digits kept by the `NUMERIC(14, 3)` stock columns
const QUANTITY_INTEGER_DIGITS: u32 = 11;

/// Exclusive bound on the magnitude of any stored stock quantity (10^11)
pub fn max_stock_quantity() -> Decimal {
    Decimal::from(10_i64.pow(QUANTITY_INTEGER_DIGITS))
}

/// Whether Postgres stores `value` in a stock column without rounding or
/// overflowing. Trailing zeros do not count against the scale.
pub fn fits_stock_column(value: Decimal) -> bool {
    value.normalize().scale() <= QUANTITY_SCALE && value.abs() < max_stock_quantity()
}

/// A strictly positive movement magnitude
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Quantity(Decimal);

impl Quantity {
    pub fn new(value: Decimal) -> Result<Self, DomainError> {
        if value <= Decimal::ZERO || !fits_stock_column(value) {
            return Err(DomainError::InvalidQuantity);
        }
        Ok(Self(value))
    }

    /// Parse a JSON value that should hold a positive number.
    ///
    /// Numeric strings are accepted because HTML form inputs submit them.
    pub fn from_json(value: &serde_json::Value) -> Result<Self, DomainError> {
        let parsed = match value {
            serde_json::Value::Number(n) => Decimal::from_str(&n.to_string())
                .or_else(|_| Decimal::from_scientific(&n.to_string())),
            serde_json::Value::String(s) => Decimal::from_str(s.trim()),
            _ => return Err(DomainError::InvalidQuantity),
        };

        parsed
            .map_err(|_| DomainError::InvalidQuantity)
            .and_then(Self::new)
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

/// A validated movement that has not yet been written to the ledger
#[derive(Debug, Clone, PartialEq)]
pub struct MovementDraft {
    pub product_id: Uuid,
    pub movement_type: MovementType,
    pub direction: Direction,
    pub quantity: Quantity,
    pub reason: Option<String>,
    pub expiry_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

impl MovementDraft {
    /// Validate a movement request.
    ///
    /// The expiry date is kept only on entries; it has no meaning for stock
    /// leaving the shelf.
    pub fn new(
        product_id: Uuid,
        movement_type: MovementType,
        direction: Option<Direction>,
        quantity: Quantity,
        reason: Option<String>,
        expiry_date: Option<NaiveDate>,
        notes: Option<String>,
    ) -> Result<Self, DomainError> {
        let direction = movement_type.resolve_direction(direction)?;

        let reason = reason
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty());
        if let Some(reason) = &reason {
            if !catalog::is_valid_reason(movement_type, reason) {
                return Err(DomainError::InvalidReason {
                    movement_type: movement_type.to_string(),
                    reason: reason.clone(),
                });
            }
        }

        let expiry_date = match movement_type {
            MovementType::Entrada => expiry_date,
            _ => None,
        };

        let notes = notes
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());

        Ok(Self {
            product_id,
            movement_type,
            direction,
            quantity,
            reason,
            expiry_date,
            notes,
        })
    }

    /// Signed change this movement applies to the snapshot
    pub fn delta(&self) -> Decimal {
        self.direction.apply_sign(self.quantity.value())
    }
}

/// An immutable ledger entry
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Movement {
    pub id: Uuid,
    /// Insertion order, used to break timestamp ties
    pub seq: i64,
    pub product_id: Uuid,
    #[serde(rename = "type")]
    pub movement_type: MovementType,
    pub direction: Direction,
    /// Unsigned magnitude
    pub quantity: Decimal,
    pub reason: Option<String>,
    pub expiry_date: Option<NaiveDate>,
    pub notes: Option<String>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl Movement {
    pub fn signed_quantity(&self) -> Decimal {
        self.direction.apply_sign(self.quantity)
    }
}

/// A ledger entry with the name of its product, for history views
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct MovementWithProduct {
    #[serde(flatten)]
    #[cfg_attr(feature = "sqlx", sqlx(flatten))]
    pub movement: Movement,
    pub product_name: String,
}

/// Current quantity of a product
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StockSnapshot {
    pub product_id: Uuid,
    pub quantity: Decimal,
    pub updated_at: Option<DateTime<Utc>>,
}

impl StockSnapshot {
    /// Placeholder for a product whose snapshot row is missing
    pub fn empty(product_id: Uuid) -> Self {
        Self {
            product_id,
            quantity: Decimal::ZERO,
            updated_at: None,
        }
    }
}

/// A product at or below its reorder threshold
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LowStockProduct {
    pub product_id: Uuid,
    pub product_name: String,
    pub category: String,
    pub unit: String,
    pub current_quantity: Decimal,
    pub min_stock_level: Decimal,
}

/// Aggregate counters for the dashboard
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct StockSummary {
    pub total_products: i64,
    pub low_stock_count: i64,
    pub expiring_soon_count: i64,
    pub total_movements_today: i64,
}

/// Low-stock list together with the summary counters
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StockAlerts {
    pub low_stock: Vec<LowStockProduct>,
    pub summary: StockSummary,
}

/// Result of replaying a product's ledger against its snapshot
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Reconciliation {
    pub product_id: Uuid,
    pub snapshot_quantity: Decimal,
    pub ledger_quantity: Decimal,
    pub movement_count: i64,
    pub consistent: bool,
}

/// Body of a movement registration.
///
/// The type and quantity arrive loosely typed so that a bad value is
/// reported with the ledger's own error instead of a generic body rejection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterMovementRequest {
    pub product_id: Uuid,
    #[serde(rename = "type")]
    pub movement_type: String,
    pub direction: Option<Direction>,
    pub quantity: serde_json::Value,
    pub reason: Option<String>,
    pub expiry_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

impl RegisterMovementRequest {
    pub fn into_draft(self) -> Result<MovementDraft, DomainError> {
        let movement_type = self.movement_type.parse::<MovementType>()?;
        let quantity = Quantity::from_json(&self.quantity)?;
        MovementDraft::new(
            self.product_id,
            movement_type,
            self.direction,
            quantity,
            self.reason,
            self.expiry_date,
            self.notes,
        )
    }
}

/// One counted product of a stock count
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockCountItem {
    pub product_id: Uuid,
    pub counted_quantity: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockCountRequest {
    pub items: Vec<StockCountItem>,
    pub notes: Option<String>,
}

/// Outcome of a stock count: the adjustments written and how many
/// products already matched
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockCountResult {
    pub adjustments: Vec<Movement>,
    pub unchanged: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_fixed_directions() {
        assert_eq!(MovementType::Entrada.fixed_direction(), Some(Direction::In));
        assert_eq!(MovementType::Saida.fixed_direction(), Some(Direction::Out));
        assert_eq!(MovementType::Perda.fixed_direction(), Some(Direction::Out));
        assert_eq!(MovementType::Ajuste.fixed_direction(), None);
    }

    #[test]
    fn test_adjustment_requires_direction() {
        assert_eq!(
            MovementType::Ajuste.resolve_direction(None),
            Err(DomainError::MissingDirection)
        );
        assert_eq!(
            MovementType::Ajuste.resolve_direction(Some(Direction::Out)),
            Ok(Direction::Out)
        );
        // Exits never become entries, whatever the caller asks for
        assert_eq!(
            MovementType::Saida.resolve_direction(Some(Direction::In)),
            Ok(Direction::Out)
        );
    }

    #[test]
    fn test_quantity_from_json() {
        assert_eq!(
            Quantity::from_json(&json!(20)).unwrap().value(),
            Decimal::from(20)
        );
        assert_eq!(
            Quantity::from_json(&json!("1.5")).unwrap().value(),
            Decimal::new(15, 1)
        );
        assert!(Quantity::from_json(&json!(0)).is_err());
        assert!(Quantity::from_json(&json!(-3)).is_err());
        assert!(Quantity::from_json(&json!("abc")).is_err());
        assert!(Quantity::from_json(&json!(null)).is_err());
        assert!(Quantity::from_json(&json!([1])).is_err());
    }

    #[test]
    fn test_quantity_precision_matches_column() {
        assert_eq!(
            Quantity::from_json(&json!("0.001")).unwrap().value(),
            Decimal::new(1, 3)
        );
        // Trailing zeros are not extra precision
        assert!(Quantity::from_json(&json!("2.5000")).is_ok());

        assert_eq!(Quantity::from_json(&json!(0.0005)), Err(DomainError::InvalidQuantity));
        assert_eq!(Quantity::from_json(&json!("0.0004")), Err(DomainError::InvalidQuantity));
        assert_eq!(Quantity::from_json(&json!("1.2345")), Err(DomainError::InvalidQuantity));
    }

    #[test]
    fn test_quantity_magnitude_matches_column() {
        assert!(Quantity::from_json(&json!("99999999999.999")).is_ok());
        assert_eq!(
            Quantity::from_json(&json!("100000000000")),
            Err(DomainError::InvalidQuantity)
        );
        assert_eq!(Quantity::from_json(&json!(1e12)), Err(DomainError::InvalidQuantity));
        assert_eq!(
            Quantity::from_json(&json!("79228162514264337593543950335")),
            Err(DomainError::InvalidQuantity)
        );
    }

    #[test]
    fn test_draft_drops_expiry_on_exit() {
        let date = NaiveDate::from_ymd_opt(2030, 1, 1);
        let draft = MovementDraft::new(
            Uuid::new_v4(),
            MovementType::Saida,
            None,
            Quantity::new(Decimal::ONE).unwrap(),
            Some("venda".into()),
            date,
            None,
        )
        .unwrap();

        assert_eq!(draft.expiry_date, None);
        assert_eq!(draft.delta(), Decimal::NEGATIVE_ONE);
    }

    #[test]
    fn test_draft_rejects_reason_of_other_type() {
        let result = MovementDraft::new(
            Uuid::new_v4(),
            MovementType::Entrada,
            None,
            Quantity::new(Decimal::ONE).unwrap(),
            Some("quebra".into()),
            None,
            None,
        );

        assert!(matches!(result, Err(DomainError::InvalidReason { .. })));
    }

    #[test]
    fn test_request_into_draft() {
        let request: RegisterMovementRequest = serde_json::from_value(json!({
            "product_id": Uuid::nil(),
            "type": "ajuste",
            "direction": "in",
            "quantity": "2.5",
            "reason": "inventario"
        }))
        .unwrap();

        let draft = request.into_draft().unwrap();
        assert_eq!(draft.movement_type, MovementType::Ajuste);
        assert_eq!(draft.delta(), Decimal::new(25, 1));
    }

    #[test]
    fn test_request_rejects_unknown_type() {
        let request: RegisterMovementRequest = serde_json::from_value(json!({
            "product_id": Uuid::nil(),
            "type": "transfer",
            "quantity": 1
        }))
        .unwrap();

        assert!(matches!(
            request.into_draft(),
            Err(DomainError::UnknownMovementType(_))
        ));
    }

    #[test]
    fn test_movement_type_parse() {
        assert_eq!("SAIDA".parse::<MovementType>(), Ok(MovementType::Saida));
        assert!("transfer".parse::<MovementType>().is_err());
    }

    #[test]
    fn test_movement_serializes_type_field() {
        let movement = Movement {
            id: Uuid::nil(),
            seq: 1,
            product_id: Uuid::nil(),
            movement_type: MovementType::Perda,
            direction: Direction::Out,
            quantity: Decimal::ONE,
            reason: None,
            expiry_date: None,
            notes: None,
            created_by: None,
            created_at: Utc::now(),
        };

        let value = serde_json::to_value(&movement).unwrap();
        assert_eq!(value["type"], "perda");
        assert_eq!(value["direction"], "out");
    }
}

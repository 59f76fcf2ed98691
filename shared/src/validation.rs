//! Validation utilities for the Bar Stock Manager

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::catalog;
use crate::models::{fits_stock_column, MovementType, ProductInput};

// ============================================================================
// Product Validations
// ============================================================================

/// Validate product name (trimmed, 1-120 characters)
pub fn validate_product_name(name: &str) -> Result<(), &'static str> {
    let name = name.trim();
    if name.is_empty() {
        return Err("Product name is required");
    }
    if name.chars().count() > 120 {
        return Err("Product name must be at most 120 characters");
    }
    Ok(())
}

/// Validate reorder threshold is not negative and fits the stock column
pub fn validate_min_stock_level(level: Decimal) -> Result<(), &'static str> {
    if level < Decimal::ZERO {
        return Err("Minimum stock level cannot be negative");
    }
    if !fits_stock_column(level) {
        return Err("Minimum stock level must have at most 3 decimal places and be below 100000000000");
    }
    Ok(())
}

pub fn validate_category(category: &str) -> Result<(), &'static str> {
    if !catalog::is_valid_category(category) {
        return Err("Unknown product category");
    }
    Ok(())
}

pub fn validate_unit(unit: &str) -> Result<(), &'static str> {
    if !catalog::is_valid_unit(unit) {
        return Err("Unknown unit of measure");
    }
    Ok(())
}

/// Business rules on a product form beyond field lengths
pub fn validate_product_input(input: &ProductInput) -> Result<(), &'static str> {
    validate_product_name(&input.name)?;
    validate_category(&input.category)?;
    validate_unit(&input.unit)?;
    validate_min_stock_level(input.min_stock_level_or_default())?;
    Ok(())
}

// ============================================================================
// Movement Validations
// ============================================================================

/// Expiry dates only make sense on entries of products that track them
pub fn validate_expiry_date(
    movement_type: MovementType,
    expiry_tracking: bool,
    expiry_date: Option<NaiveDate>,
) -> Result<(), &'static str> {
    if expiry_date.is_some() && movement_type == MovementType::Entrada && !expiry_tracking {
        return Err("This product does not track expiry dates");
    }
    Ok(())
}

// ============================================================================
// Team & Profile Validations
// ============================================================================

/// Validate team name (trimmed, 1-100 characters)
pub fn validate_team_name(name: &str) -> Result<(), &'static str> {
    let name = name.trim();
    if name.is_empty() {
        return Err("Team name is required");
    }
    if name.chars().count() > 100 {
        return Err("Team name must be at most 100 characters");
    }
    Ok(())
}

pub fn validate_display_name(name: &str) -> Result<(), &'static str> {
    if name.trim().chars().count() > 80 {
        return Err("Display name must be at most 80 characters");
    }
    Ok(())
}

/// Validate expiry alert window (1-365 days)
pub fn validate_expiry_alert_days(days: i32) -> Result<(), &'static str> {
    if !(1..=365).contains(&days) {
        return Err("Expiry alert window must be between 1 and 365 days");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(name: &str, category: &str, unit: &str, min: i64) -> ProductInput {
        ProductInput {
            name: name.to_string(),
            category: category.to_string(),
            unit: unit.to_string(),
            min_stock_level: Some(Decimal::from(min)),
            expiry_tracking: false,
            notes: None,
        }
    }

    #[test]
    fn test_validate_product_input_valid() {
        let vodka = input("Vodka 1L", "bebidas-destiladas", "garrafa", 5);
        assert!(validate_product_input(&vodka).is_ok());
    }

    #[test]
    fn test_validate_product_input_invalid() {
        assert!(validate_product_input(&input("   ", "vinhos", "garrafa", 0)).is_err());
        assert!(validate_product_input(&input("Gin", "cafe", "garrafa", 0)).is_err());
        assert!(validate_product_input(&input("Gin", "vinhos", "barril", 0)).is_err());
        assert!(validate_product_input(&input("Gin", "vinhos", "garrafa", -1)).is_err());
    }

    #[test]
    fn test_validate_min_stock_level_bounds() {
        assert!(validate_min_stock_level(Decimal::new(2500, 3)).is_ok());
        assert!(validate_min_stock_level(Decimal::new(99_999_999_999_999, 3)).is_ok());
        assert!(validate_min_stock_level(Decimal::new(5, 4)).is_err());
        assert!(validate_min_stock_level(Decimal::from(100_000_000_000_i64)).is_err());
    }

    #[test]
    fn test_validate_expiry_date() {
        let date = NaiveDate::from_ymd_opt(2030, 6, 1);
        assert!(validate_expiry_date(MovementType::Entrada, true, date).is_ok());
        assert!(validate_expiry_date(MovementType::Entrada, false, date).is_err());
        assert!(validate_expiry_date(MovementType::Entrada, false, None).is_ok());
    }

    #[test]
    fn test_validate_team_name() {
        assert!(validate_team_name("Bar do Zé").is_ok());
        assert!(validate_team_name("").is_err());
        assert!(validate_team_name(&"x".repeat(101)).is_err());
    }

    #[test]
    fn test_validate_expiry_alert_days() {
        assert!(validate_expiry_alert_days(1).is_ok());
        assert!(validate_expiry_alert_days(365).is_ok());
        assert!(validate_expiry_alert_days(0).is_err());
        assert!(validate_expiry_alert_days(366).is_err());
    }
}

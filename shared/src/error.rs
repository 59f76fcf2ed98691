//! Errors raised by the pure domain rules

use rust_decimal::Decimal;
use thiserror::Error;

/// A domain rule was violated. The backend maps each variant to an HTTP status.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    #[error("Quantity must be a positive number with at most 3 decimal places, below 100000000000")]
    InvalidQuantity,

    #[error("Resulting stock would exceed the storable quantity")]
    StockLimitExceeded,

    #[error("Unknown movement type: {0}")]
    UnknownMovementType(String),

    #[error("Adjustment movements require a direction (in or out)")]
    MissingDirection,

    #[error("Reason '{reason}' is not valid for {movement_type} movements")]
    InvalidReason {
        movement_type: String,
        reason: String,
    },

    #[error("Insufficient stock: {available} available, {requested} requested")]
    InsufficientStock {
        available: Decimal,
        requested: Decimal,
    },

    #[error("Counted quantity cannot be negative")]
    NegativeCount,

    #[error("Counted quantity {counted} exceeds the registered quantity {registered}")]
    CountExceedsRegistered {
        counted: Decimal,
        registered: Decimal,
    },

    #[error("Unknown route key: {0}")]
    UnknownRoute(String),

    #[error("Unknown member role: {0}")]
    UnknownRole(String),

    #[error("Invalid custom id: {0}")]
    InvalidCustomId(String),

    #[error("You cannot join your own team")]
    SelfJoin,

    #[error("This user does not have a team")]
    NoTeam,

    #[error("You are already a member of this team")]
    AlreadyMember,
}

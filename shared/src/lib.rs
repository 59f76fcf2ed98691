//! Shared types and rules for the Bar Stock Manager
//!
//! This crate contains the domain model and the pure stock/access rules shared
//! between the backend, the API client and the WASM bindings used by the
//! single-page app.

pub mod access;
pub mod catalog;
pub mod custom_id;
pub mod error;
pub mod ledger;
pub mod models;
pub mod types;
pub mod validation;

pub use access::*;
pub use custom_id::*;
pub use error::DomainError;
pub use ledger::*;
pub use models::*;
pub use types::*;
pub use validation::*;

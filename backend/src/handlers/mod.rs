//! HTTP handlers

pub mod assistant;
pub mod catalog;
pub mod health;
pub mod preferences;
pub mod product;
pub mod profile;
pub mod reporting;
pub mod stock;
pub mod team;

pub use assistant::*;
pub use catalog::*;
pub use health::*;
pub use preferences::*;
pub use product::*;
pub use profile::*;
pub use reporting::*;
pub use stock::*;
pub use team::*;

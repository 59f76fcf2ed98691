//! Domain models for the Bar Stock Manager

mod product;
mod stock;
mod team;
mod user;

pub use product::*;
pub use stock::*;
pub use team::*;
pub use user::*;

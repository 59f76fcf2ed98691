//! Rust client for the Bar Stock Manager API
//!
//! Adds the bearer token and the active team to every request, refreshes an
//! expired token once per request (concurrent refreshes collapse into one)
//! and bootstraps the caller's profile after sign-in.

pub mod api;
pub mod error;
pub mod profile;
pub mod token;

pub use api::ApiClient;
pub use error::{ClientError, ClientResult};
pub use token::{Token, TokenManager, TokenProvider};

//! Request middleware and extractors

pub mod auth;
pub mod team;

pub use auth::{auth_middleware, AuthUser, CurrentUser, TokenVerifier};
pub use team::{ActiveTeam, RequireRoute, TeamContext};

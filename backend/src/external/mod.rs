//! External API integrations

pub mod gemini;
pub mod jwks;

pub use gemini::GeminiClient;
pub use jwks::JwksCache;

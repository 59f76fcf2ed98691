//! Client error types

use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

/// Error codes the server uses for a bearer token worth refreshing
pub const REFRESHABLE_CODES: &[&str] = &["TOKEN_EXPIRED", "INVALID_TOKEN"];

#[derive(Error, Debug)]
pub enum ClientError {
    /// Non-2xx response; `message` is the server's `error` text
    #[error("{message}")]
    Api {
        status: StatusCode,
        code: Option<String>,
        message: String,
    },

    #[error("Request timed out")]
    Timeout,

    #[error("Token provider error: {0}")]
    Token(String),

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Unexpected response body: {0}")]
    Decode(String),
}

pub type ClientResult<T> = Result<T, ClientError>;

/// Error body returned by the API
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
    code: Option<String>,
}

impl ClientError {
    /// Build the error for a non-2xx response from its raw body
    pub fn from_response(status: StatusCode, body: &str) -> Self {
        match serde_json::from_str::<ErrorBody>(body) {
            Ok(parsed) => ClientError::Api {
                status,
                code: parsed.code,
                message: parsed.error,
            },
            Err(_) => ClientError::Api {
                status,
                code: None,
                message: if body.trim().is_empty() {
                    status.canonical_reason().unwrap_or("Request failed").to_string()
                } else {
                    body.trim().to_string()
                },
            },
        }
    }

    /// A 401 that a fresh token may fix
    pub fn is_refreshable(&self) -> bool {
        match self {
            ClientError::Api {
                status,
                code: Some(code),
                ..
            } => *status == StatusCode::UNAUTHORIZED && REFRESHABLE_CODES.contains(&code.as_str()),
            _ => false,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ClientError::Api { status, .. } if *status == StatusCode::NOT_FOUND)
    }
}

//! Bearer token cache with deduplicated refresh
//!
//! Every token handed out carries the generation it belongs to. A caller
//! that got a 401 asks for a refresh of *its* generation; if another caller
//! already refreshed past it, the newer token is returned without asking the
//! provider again. The mutex is held across the provider call, so at most one
//! refresh is in flight and everyone else queues behind it.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::error::ClientResult;

/// Source of access tokens, typically the identity provider's SDK session
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// The current access token
    async fn access_token(&self) -> ClientResult<String>;

    /// Obtain a new access token, invalidating the previous one
    async fn refresh_token(&self) -> ClientResult<String>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub value: String,
    pub generation: u64,
}

#[derive(Default)]
struct TokenState {
    value: Option<String>,
    generation: u64,
}

pub struct TokenManager {
    provider: Arc<dyn TokenProvider>,
    state: Mutex<TokenState>,
}

impl TokenManager {
    pub fn new(provider: Arc<dyn TokenProvider>) -> Self {
        Self {
            provider,
            state: Mutex::new(TokenState::default()),
        }
    }

    /// The cached token, fetched from the provider on first use
    pub async fn current(&self) -> ClientResult<Token> {
        let mut state = self.state.lock().await;

        if let Some(value) = &state.value {
            return Ok(Token {
                value: value.clone(),
                generation: state.generation,
            });
        }

        let value = self.provider.access_token().await?;
        state.value = Some(value.clone());
        Ok(Token {
            value,
            generation: state.generation,
        })
    }

    /// Replace the token of generation `stale`.
    ///
    /// Returns the already refreshed token when another caller got there first.
    pub async fn refresh(&self, stale: u64) -> ClientResult<Token> {
        let mut state = self.state.lock().await;

        if state.generation != stale {
            if let Some(value) = &state.value {
                tracing::debug!(generation = state.generation, "Reusing refreshed token");
                return Ok(Token {
                    value: value.clone(),
                    generation: state.generation,
                });
            }
        }

        tracing::debug!(stale, "Refreshing access token");
        let value = self.provider.refresh_token().await?;
        state.value = Some(value.clone());
        state.generation += 1;

        Ok(Token {
            value,
            generation: state.generation,
        })
    }

    /// Drop the cached token, e.g. after sign-out
    pub async fn clear(&self) {
        let mut state = self.state.lock().await;
        state.value = None;
        state.generation += 1;
    }
}

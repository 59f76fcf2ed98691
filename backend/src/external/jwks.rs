//! JSON Web Key Set client with an in-memory cache
//!
//! Keys are fetched from the identity provider and reused until the TTL runs
//! out or a verification failure forces a refetch. Forced refetches for
//! unknown key ids happen at most once per `MIN_REFETCH_INTERVAL`.

use std::sync::Arc;
use std::time::{Duration, Instant};

use jsonwebtoken::jwk::{Jwk, JwkSet};
use reqwest::Client;
use tokio::sync::RwLock;

use crate::error::{AppError, AppResult};

/// Minimum time between refetches triggered by an unknown `kid`
pub const MIN_REFETCH_INTERVAL: Duration = Duration::from_secs(30);

/// Fetched key set and when it was fetched
struct CachedKeys {
    keys: Arc<JwkSet>,
    fetched_at: Instant,
}

/// Cached JWKS for one issuer
pub struct JwksCache {
    client: Client,
    url: String,
    ttl: Duration,
    refetch_interval: Duration,
    cached: RwLock<Option<CachedKeys>>,
}

impl JwksCache {
    /// Create a new cache for the key set at `url`
    pub fn new(url: String, ttl: Duration) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(10))
                .build()
                .unwrap_or_default(),
            url,
            ttl,
            refetch_interval: MIN_REFETCH_INTERVAL,
            cached: RwLock::new(None),
        }
    }

    /// Create a cache pre-loaded with keys that never expire (for testing)
    pub fn with_keys(keys: JwkSet) -> Self {
        Self {
            client: Client::new(),
            url: String::new(),
            ttl: Duration::MAX,
            refetch_interval: MIN_REFETCH_INTERVAL,
            cached: RwLock::new(Some(CachedKeys {
                keys: Arc::new(keys),
                fetched_at: Instant::now(),
            })),
        }
    }

    pub fn with_refetch_interval(mut self, interval: Duration) -> Self {
        self.refetch_interval = interval;
        self
    }

    /// Current key set, refetched when stale or invalidated
    pub async fn keys(&self) -> AppResult<Arc<JwkSet>> {
        {
            let cached = self.cached.read().await;
            if let Some(entry) = cached.as_ref().filter(|c| self.is_fresh(c)) {
                return Ok(entry.keys.clone());
            }
        }

        let mut cached = self.cached.write().await;
        // Another request may have refreshed while we waited for the lock
        if let Some(entry) = cached.as_ref().filter(|c| self.is_fresh(c)) {
            return Ok(entry.keys.clone());
        }

        let keys = Arc::new(self.fetch().await?);
        *cached = Some(CachedKeys {
            keys: keys.clone(),
            fetched_at: Instant::now(),
        });
        Ok(keys)
    }

    /// Find the key with `kid`, refetching once if the cached set lacks it
    pub async fn find_key(&self, kid: &str) -> AppResult<Option<Jwk>> {
        let keys = self.keys().await?;
        if let Some(jwk) = keys.find(kid) {
            return Ok(Some(jwk.clone()));
        }

        if self.url.is_empty() || self.fetched_recently(&*self.cached.read().await) {
            return Ok(None);
        }

        let mut cached = self.cached.write().await;
        // Another request may have refetched while we waited for the lock
        if let Some(entry) = cached.as_ref() {
            if let Some(jwk) = entry.keys.find(kid) {
                return Ok(Some(jwk.clone()));
            }
        }
        if self.fetched_recently(&cached) {
            return Ok(None);
        }

        tracing::debug!(kid, "Key not in cached JWKS, refetching");
        let keys = Arc::new(self.fetch().await?);
        *cached = Some(CachedKeys {
            keys: keys.clone(),
            fetched_at: Instant::now(),
        });
        Ok(keys.find(kid).cloned())
    }

    fn fetched_recently(&self, cached: &Option<CachedKeys>) -> bool {
        cached
            .as_ref()
            .is_some_and(|entry| entry.fetched_at.elapsed() < self.refetch_interval)
    }

    /// Drop the cached set so the next access refetches
    pub async fn invalidate(&self) {
        *self.cached.write().await = None;
    }

    fn is_fresh(&self, entry: &CachedKeys) -> bool {
        entry.fetched_at.elapsed() < self.ttl
    }

    async fn fetch(&self) -> AppResult<JwkSet> {
        tracing::info!(url = %self.url, "Fetching JWKS");

        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| AppError::ExternalService(format!("JWKS request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::ExternalService(format!(
                "JWKS endpoint returned {}",
                response.status()
            )));
        }

        response
            .json::<JwkSet>()
            .await
            .map_err(|e| AppError::ExternalService(format!("Failed to parse JWKS: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{routing::get, Json, Router};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn key_set(kid: &str) -> JwkSet {
        serde_json::from_value(serde_json::json!({
            "keys": [{
                "kty": "EC",
                "crv": "P-256",
                "alg": "ES256",
                "use": "sig",
                "kid": kid,
                "x": "f83OJ3D2xF1Bg8vub9tLe1gHMzV76e8Tus9uPHvRVEU",
                "y": "x_FEzRu9m36HLN_tue659LNpXW6pCyStikYjKIWI5a0"
            }]
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_preloaded_keys() {
        let cache = JwksCache::with_keys(key_set("k1"));
        assert!(cache.find_key("k1").await.unwrap().is_some());
        assert!(cache.find_key("k2").await.unwrap().is_none());
    }

    /// Serves `key_set("k1")` and counts the requests it receives
    async fn spawn_jwks_server(hits: Arc<AtomicUsize>) -> String {
        let app = Router::new().route(
            "/jwks",
            get(move || {
                let hits = hits.clone();
                async move {
                    hits.fetch_add(1, Ordering::SeqCst);
                    Json(key_set("k1"))
                }
            }),
        );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}/jwks", addr)
    }

    #[tokio::test]
    async fn test_unknown_kids_share_one_fetch() {
        let hits = Arc::new(AtomicUsize::new(0));
        let url = spawn_jwks_server(hits.clone()).await;
        let cache = JwksCache::new(url, Duration::from_secs(300));

        for i in 0..20 {
            let forged = format!("forged-{}", i);
            assert!(cache.find_key(&forged).await.unwrap().is_none());
        }
        assert!(cache.find_key("k1").await.unwrap().is_some());
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unknown_kid_refetches_after_interval() {
        let hits = Arc::new(AtomicUsize::new(0));
        let url = spawn_jwks_server(hits.clone()).await;
        let cache = JwksCache::new(url, Duration::from_secs(300)).with_refetch_interval(Duration::ZERO);

        assert!(cache.find_key("k1").await.unwrap().is_some());
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        assert!(cache.find_key("rotated").await.unwrap().is_none());
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_external_error() {
        let cache = JwksCache::new("http://127.0.0.1:9/jwks".into(), Duration::from_secs(60));
        let result = cache.keys().await;
        assert!(matches!(result, Err(AppError::ExternalService(_))));
    }
}

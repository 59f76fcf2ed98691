//! Authenticated JSON client for the Bar Stock Manager API

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, Method};
use serde::{de::DeserializeOwned, Serialize};
use shared::{
    JoinTeamRequest, JoinTeamResponse, Movement, MovementWithProduct, ProductWithStock,
    RegisterMovementRequest, StockAlerts,
};
use uuid::Uuid;

use crate::error::{ClientError, ClientResult};
use crate::token::{TokenManager, TokenProvider};

/// Header selecting the active team
pub const TEAM_ID_HEADER: &str = "X-Team-Id";

/// Default bound on the profile get-or-create flow
pub const DEFAULT_PROFILE_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    tokens: Arc<TokenManager>,
    team_id: Option<Uuid>,
    pub(crate) profile_timeout: Duration,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, provider: Arc<dyn TokenProvider>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            tokens: Arc::new(TokenManager::new(provider)),
            team_id: None,
            profile_timeout: DEFAULT_PROFILE_TIMEOUT,
        }
    }

    /// Send `X-Team-Id` with every request
    pub fn with_team(mut self, team_id: Option<Uuid>) -> Self {
        self.team_id = team_id;
        self
    }

    pub fn with_profile_timeout(mut self, timeout: Duration) -> Self {
        self.profile_timeout = timeout;
        self
    }

    pub fn team_id(&self) -> Option<Uuid> {
        self.team_id
    }

    pub fn tokens(&self) -> &TokenManager {
        &self.tokens
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        self.request::<T, ()>(Method::GET, path, None).await
    }

    pub async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(&self, path: &str, body: &B) -> ClientResult<T> {
        self.request(Method::POST, path, Some(body)).await
    }

    pub async fn put<T: DeserializeOwned, B: Serialize + ?Sized>(&self, path: &str, body: &B) -> ClientResult<T> {
        self.request(Method::PUT, path, Some(body)).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        self.request::<T, ()>(Method::DELETE, path, None).await
    }

    /// Send with the cached token; on a refreshable 401, refresh once and retry
    async fn request<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> ClientResult<T> {
        let token = self.tokens.current().await?;

        match self.send(method.clone(), path, body, &token.value).await {
            Err(err) if err.is_refreshable() => {
                tracing::debug!(%path, generation = token.generation, "Token rejected, retrying once");
                let fresh = self.tokens.refresh(token.generation).await?;
                self.send(method, path, body, &fresh.value).await
            }
            result => result,
        }
    }

    async fn send<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        token: &str,
    ) -> ClientResult<T> {
        let url = format!("{}{}", self.base_url, path);
        let mut builder = self.http.request(method, &url).bearer_auth(token);

        if let Some(team_id) = self.team_id {
            builder = builder.header(TEAM_ID_HEADER, team_id.to_string());
        }
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(ClientError::from_response(status, &text));
        }

        serde_json::from_str(&text).map_err(|e| ClientError::Decode(e.to_string()))
    }

    pub async fn list_products(&self) -> ClientResult<Vec<ProductWithStock>> {
        self.get("/api/products").await
    }

    pub async fn register_movement(
        &self,
        request: &RegisterMovementRequest,
    ) -> ClientResult<Movement> {
        self.post("/api/stock/movement", request).await
    }

    pub async fn recent_movements(&self, limit: i64) -> ClientResult<Vec<MovementWithProduct>> {
        self.get(&format!("/api/stock/movements?limit={}", limit)).await
    }

    pub async fn stock_alerts(&self) -> ClientResult<StockAlerts> {
        self.get("/api/stock/alerts").await
    }

    pub async fn join_team(&self, owner_custom_id: &str) -> ClientResult<JoinTeamResponse> {
        let request = JoinTeamRequest {
            owner_custom_id: owner_custom_id.to_string(),
        };
        self.post("/api/teams/join", &request).await
    }
}

//! Authentication middleware
//!
//! Verifies provider-issued bearer tokens against the cached JWKS and puts
//! the authenticated user into the request extensions.

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{decode, decode_header, errors::ErrorKind, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::error::{AppError, AppResult};
use crate::external::JwksCache;
use crate::AppState;

/// Authenticated user information extracted from the token
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub email: Option<String>,
}

/// JWT claims we rely on
#[derive(Debug, Deserialize)]
struct Claims {
    sub: String,
    email: Option<String>,
}

/// Verifies bearer tokens for one identity provider
pub struct TokenVerifier {
    jwks: JwksCache,
    issuer: Option<String>,
    audience: Option<String>,
}

impl TokenVerifier {
    pub fn new(jwks: JwksCache, config: &AuthConfig) -> Self {
        Self {
            jwks,
            issuer: config.issuer.clone(),
            audience: config.audience.clone(),
        }
    }

    /// Verifier with fixed keys and no issuer/audience checks (for testing)
    pub fn with_jwks(jwks: JwksCache) -> Self {
        Self {
            jwks,
            issuer: None,
            audience: None,
        }
    }

    /// Verify a token and return the user it was issued to.
    ///
    /// Expiry is reported as `TokenExpired` so clients can refresh; every
    /// other failure is `InvalidToken`.
    pub async fn verify(&self, token: &str) -> AppResult<AuthUser> {
        let header = decode_header(token).map_err(|e| AppError::InvalidToken(e.to_string()))?;

        // Symmetric algorithms have no place in a public key set
        if matches!(header.alg, Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512) {
            return Err(AppError::InvalidToken("unsupported algorithm".into()));
        }

        let kid = header
            .kid
            .as_deref()
            .ok_or_else(|| AppError::InvalidToken("missing kid".into()))?;

        let jwk = match self.jwks.find_key(kid).await {
            Ok(Some(jwk)) => jwk,
            Ok(None) => return Err(AppError::InvalidToken(format!("unknown kid {}", kid))),
            Err(e) => {
                // Force a refetch on the next request instead of serving a broken cache
                self.jwks.invalidate().await;
                return Err(e);
            }
        };

        let key = DecodingKey::from_jwk(&jwk).map_err(|e| AppError::InvalidToken(e.to_string()))?;

        let mut validation = Validation::new(header.alg);
        if let Some(issuer) = &self.issuer {
            validation.set_issuer(&[issuer]);
        }
        match &self.audience {
            Some(audience) => validation.set_audience(&[audience]),
            None => validation.validate_aud = false,
        }

        let data = decode::<Claims>(token, &key, &validation).map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => AppError::TokenExpired,
            _ => AppError::InvalidToken(e.to_string()),
        })?;

        let user_id = Uuid::parse_str(&data.claims.sub)
            .map_err(|_| AppError::InvalidToken("subject is not a UUID".into()))?;

        Ok(AuthUser {
            user_id,
            email: data.claims.email,
        })
    }
}

/// Extract the token from an `Authorization: Bearer <token>` header value
pub fn bearer_token(header: Option<&str>) -> Option<&str> {
    let value = header?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() {
        return None;
    }
    Some(token)
}

/// Authentication middleware that validates bearer tokens
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let token = bearer_token(header).ok_or(AppError::MissingToken)?;

    let auth_user = state.verifier.verify(token).await.map_err(|e| {
        tracing::warn!("Token verification failed: {}", e);
        e
    })?;

    tracing::debug!(user_id = %auth_user.user_id, "Authenticated request");
    request.extensions_mut().insert(auth_user);

    Ok(next.run(request).await)
}

/// Extractor for authenticated user
/// Use this in handlers to get the current user
#[derive(Clone, Debug)]
pub struct CurrentUser(pub AuthUser);

#[axum::async_trait]
impl<S> axum::extract::FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .map(CurrentUser)
            .ok_or(AppError::MissingToken)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bearer_token() {
        assert_eq!(bearer_token(Some("Bearer abc.def")), Some("abc.def"));
        assert_eq!(bearer_token(Some("bearer abc")), Some("abc"));
        assert_eq!(bearer_token(Some("Basic abc")), None);
        assert_eq!(bearer_token(Some("Bearer ")), None);
        assert_eq!(bearer_token(Some("Bearer")), None);
        assert_eq!(bearer_token(None), None);
    }

    #[tokio::test]
    async fn test_garbage_token_is_invalid() {
        let verifier = TokenVerifier::with_jwks(JwksCache::with_keys(jsonwebtoken::jwk::JwkSet { keys: vec![] }));
        let result = verifier.verify("not-a-jwt").await;
        assert!(matches!(result, Err(AppError::InvalidToken(_))));
    }
}

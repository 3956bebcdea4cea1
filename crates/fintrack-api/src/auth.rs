//! Authentication gate
//!
//! Resolves the bearer token of a request to a user id before any
//! transaction route runs. Handlers take the owner from `AuthUser` only.

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use fintrack_config::AuthConfig;
use std::collections::HashMap;

use crate::error::ApiError;
use crate::AppState;

/// The authenticated identity, inserted into request extensions
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub user_id: String,
}

/// Maps a presented credential to a user id
pub trait Authenticator: Send + Sync {
    fn authenticate(&self, token: &str) -> Option<AuthUser>;
}

/// Fixed token table from configuration
#[derive(Debug, Default)]
pub struct StaticTokenAuthenticator {
    tokens: HashMap<String, String>,
}

impl StaticTokenAuthenticator {
    pub fn from_config(config: &AuthConfig) -> Self {
        Self {
            tokens: config
                .tokens
                .iter()
                .map(|e| (e.token.clone(), e.user_id.clone()))
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

impl Authenticator for StaticTokenAuthenticator {
    fn authenticate(&self, token: &str) -> Option<AuthUser> {
        self.tokens
            .get(token)
            .map(|user_id| AuthUser { user_id: user_id.clone() })
    }
}

pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::unauthorized("missing Authorization header"))?;

    let token = auth
        .strip_prefix("Bearer ")
        .ok_or_else(|| ApiError::unauthorized("invalid Authorization scheme"))?;

    let user = state
        .auth
        .authenticate(token.trim())
        .ok_or_else(|| ApiError::unauthorized("unknown token"))?;

    req.extensions_mut().insert(user);

    Ok(next.run(req).await)
}

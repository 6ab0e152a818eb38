//! Bearer-token authentication for the HTTP transport.
//!
//! Applied to the MCP endpoint only; `/healthz` stays open for load balancers.
//! Rejections use the same `{ok: false, error}` envelope as the tools.

use crate::models::{ToolError, ToolResponse};
use axum::{
    Json,
    body::Body,
    extract::State,
    http::{Request, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::collections::HashSet;
use std::sync::Arc;
use subtle::ConstantTimeEq;
use tracing::warn;

/// Accepted bearer tokens. Auth is enabled when at least one token is configured.
#[derive(Debug, Clone, Default)]
pub struct AuthConfig {
    tokens: HashSet<String>,
}

impl AuthConfig {
    /// Build from configured tokens. Blank entries are a configuration error.
    pub fn from_tokens(tokens: Vec<String>) -> Result<Self, String> {
        let mut accepted = HashSet::new();
        for token in tokens {
            let trimmed = token.trim();
            if trimmed.is_empty() {
                return Err("Empty token value in MCP_AUTH_TOKENS".to_string());
            }
            accepted.insert(trimmed.to_string());
        }
        Ok(Self { tokens: accepted })
    }

    pub fn is_enabled(&self) -> bool {
        !self.tokens.is_empty()
    }

    pub fn token_count(&self) -> usize {
        self.tokens.len()
    }

    /// Compare against every configured token without short-circuiting.
    pub fn verify(&self, provided: &str) -> bool {
        self.tokens.iter().fold(false, |found, expected| {
            found | bool::from(provided.as_bytes().ct_eq(expected.as_bytes()))
        })
    }
}

/// Authentication middleware for HTTP requests.
pub async fn auth_middleware(
    State(auth): State<Arc<AuthConfig>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    match bearer_token(&request) {
        Ok(token) if auth.verify(token) => next.run(request).await,
        Ok(token) => {
            warn!(token_prefix = %mask_token(token), "Authentication failed: invalid token");
            unauthorized("Invalid bearer token.")
        }
        Err(reason) => {
            warn!(reason, "Authentication failed");
            unauthorized(reason)
        }
    }
}

fn bearer_token(request: &Request<Body>) -> Result<&str, &'static str> {
    let value = request
        .headers()
        .get(header::AUTHORIZATION)
        .ok_or("Missing Authorization header.")?
        .to_str()
        .map_err(|_| "Authorization header contains invalid characters.")?;

    let (scheme, token) = value
        .split_once(' ')
        .ok_or("Expected 'Authorization: Bearer <token>'.")?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err("Expected 'Authorization: Bearer <token>'.");
    }
    let token = token.trim();
    if token.is_empty() {
        return Err("Bearer token is empty.");
    }
    Ok(token)
}

fn mask_token(token: &str) -> String {
    let prefix: String = token.chars().take(3).collect();
    if token.chars().count() <= 3 {
        "***".to_string()
    } else {
        format!("{prefix}***")
    }
}

fn unauthorized(details: &str) -> Response {
    let body: ToolResponse<()> = ToolResponse::failure(
        ToolError::with_details("Unauthorized.", details).with_code("unauthorized"),
    );
    (StatusCode::UNAUTHORIZED, Json(body)).into_response()
}

//! Authentication extractor.

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};

use crate::error::AppError;
use crate::state::AppState;

/// Guard for API routes.
///
/// Passes every request when no API token is configured. Otherwise the
/// request must carry `Authorization: Bearer <token>` with the configured
/// token, or it is rejected with 401 `UNAUTHORIZED`.
#[derive(Debug, Clone, Copy)]
pub struct RequireToken;

impl FromRequestParts<AppState> for RequireToken {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(expected) = state.config.api_token.as_deref() else {
            return Ok(RequireToken);
        };

        match bearer_token(&parts.headers) {
            Some(token) if token == expected => Ok(RequireToken),
            Some(_) => {
                tracing::warn!("Rejected request to {} with a wrong token", parts.uri.path());
                Err(AppError::Unauthorized)
            }
            None => Err(AppError::Unauthorized),
        }
    }
}

/// Token from an `Authorization: Bearer <token>` header
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

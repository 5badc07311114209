// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Bearer token authentication middleware.

use crate::error::AppError;
use crate::models::User;
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

/// Authenticated user attached to the request by [`require_auth`].
///
/// Credential fields are already stripped.
#[derive(Debug, Clone)]
pub struct AuthUser(pub User);

/// Extract the token from an `Authorization: Bearer <token>` header.
fn bearer_token(request: &Request) -> Option<&str> {
    request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
}

/// Middleware that requires a valid access token for a stored user.
///
/// Rejections are 401 with one of the `Unauthorized: ...` messages and never
/// reach the handler.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    // The request body is not Sync, so nothing borrowed from it may cross an await
    let token = bearer_token(&request).map(str::to_string);
    let path = request.uri().path().to_string();

    let user = state
        .identity
        .resolve_token(token.as_deref())
        .await
        .map_err(|e| {
            tracing::debug!(reason = %e, path = %path, "Request rejected");
            AppError::from(e)
        })?;

    request.extensions_mut().insert(AuthUser(user));

    Ok(next.run(request).await)
}

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Authentication routes: password login, registration, current user and
//! Google sign-in.

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    response::Redirect,
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use super::json_body;
use crate::error::{AppError, Result};
use crate::services::IdentityError;
use crate::middleware::auth::AuthUser;
use crate::models::User;
use crate::AppState;

/// Public auth routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/create-account", post(create_account))
        .route("/auth/google", get(google_start))
        .route("/auth/google/callback", get(google_callback))
}

/// Auth routes behind the bearer-token gate.
pub fn protected_routes() -> Router<Arc<AppState>> {
    Router::new().route("/auth/current-user", get(current_user))
}

/// Password login body. `login` is an email or a username.
#[derive(Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(required, length(min = 1))]
    login: Option<String>,
    #[validate(required, length(min = 1))]
    password: Option<String>,
}

/// Registration body. Missing fields are reported by the identity service.
#[derive(Deserialize)]
pub struct CreateAccountRequest {
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    password: Option<String>,
}

/// Signed-in user with a freshly issued token.
#[derive(Debug, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SessionResponse {
    pub email: String,
    pub username: String,
    pub token: String,
}

#[derive(Debug, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct TokenResponse {
    pub token: String,
}

fn session_for(state: &AppState, user: User) -> Result<Json<SessionResponse>> {
    let token = state.identity.issue_token(&user)?;
    Ok(Json(SessionResponse {
        email: user.email,
        username: user.username,
        token,
    }))
}

/// Exchange a login and password for a token.
async fn login(
    State(state): State<Arc<AppState>>,
    body: std::result::Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<SessionResponse>> {
    // Any unusable body fails exactly like a bad password
    let body = json_body(body, || AppError::InvalidCredentials)?;
    if body.validate().is_err() {
        return Err(AppError::InvalidCredentials);
    }
    let login = body.login.unwrap_or_default();
    let password = body.password.unwrap_or_default();

    let user = state.identity.login(&login, &password).await?;
    tracing::info!(user_id = %user.id, "Password login");

    session_for(&state, user)
}

/// Register a password account.
async fn create_account(
    State(state): State<Arc<AppState>>,
    body: std::result::Result<Json<CreateAccountRequest>, JsonRejection>,
) -> Result<Json<TokenResponse>> {
    let body = json_body(body, || IdentityError::Validation.into())?;
    let token = state
        .identity
        .create_account(
            body.email.as_deref().unwrap_or_default(),
            body.username.as_deref().unwrap_or_default(),
            body.password.as_deref().unwrap_or_default(),
        )
        .await?;

    Ok(Json(TokenResponse { token }))
}

/// Current user, with a new token extending the session.
async fn current_user(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(user)): Extension<AuthUser>,
) -> Result<Json<SessionResponse>> {
    session_for(&state, user)
}

/// Start Google sign-in.
async fn google_start(State(state): State<Arc<AppState>>) -> Result<Redirect> {
    let url = state.google.authorization_url()?;
    tracing::info!("Starting Google sign-in, redirecting to Google");
    Ok(Redirect::temporary(&url))
}

#[derive(Deserialize)]
pub struct CallbackParams {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

fn login_error_redirect(frontend_url: &str, error: &str) -> Redirect {
    Redirect::temporary(&format!(
        "{}/pages/login?error={}",
        frontend_url,
        urlencoding::encode(error)
    ))
}

/// Google redirect target: resolve the account and hand a token to the frontend.
///
/// Every outcome is a redirect; failures carry an `error` query parameter.
async fn google_callback(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CallbackParams>,
) -> Redirect {
    let frontend_url = state.config.frontend_url.trim_end_matches('/');

    if let Some(error) = params.error {
        tracing::warn!(error = %error, "OAuth error from Google");
        return login_error_redirect(frontend_url, "auth_failed");
    }

    let state_ok = params
        .state
        .as_deref()
        .is_some_and(|s| state.google.verify_state(s));
    if !state_ok {
        tracing::warn!("Invalid or expired OAuth state parameter");
        return login_error_redirect(frontend_url, "auth_failed");
    }

    let Some(code) = params.code.filter(|c| !c.is_empty()) else {
        return login_error_redirect(frontend_url, "auth_failed");
    };

    let profile = match state.google.exchange_code(&code).await {
        Ok(profile) => profile,
        Err(e) => {
            tracing::error!(error = %e, "Google code exchange failed");
            return login_error_redirect(frontend_url, "auth_failed");
        }
    };

    let user = match state.identity.resolve_federated(&profile).await {
        Ok(user) => user,
        Err(e) => {
            tracing::warn!(error = %e, "Could not resolve Google account");
            return login_error_redirect(frontend_url, "auth_failed");
        }
    };

    match state.identity.issue_token(&user) {
        Ok(token) => {
            tracing::info!(user_id = %user.id, "Google sign-in successful");
            Redirect::temporary(&format!(
                "{}/pages/login-success?token={}",
                frontend_url,
                urlencoding::encode(&token)
            ))
        }
        Err(e) => {
            tracing::error!(error = %e, "Token generation failed");
            login_error_redirect(frontend_url, "token_generation_failed")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_request_validation() {
        let ok: LoginRequest =
            serde_json::from_value(serde_json::json!({"login": "a", "password": "p"})).unwrap();
        assert!(ok.validate().is_ok());

        let missing: LoginRequest =
            serde_json::from_value(serde_json::json!({"login": "a"})).unwrap();
        assert!(missing.validate().is_err());

        let empty: LoginRequest =
            serde_json::from_value(serde_json::json!({"login": "", "password": "p"})).unwrap();
        assert!(empty.validate().is_err());
    }

    #[test]
    fn test_login_error_redirect_encodes() {
        let redirect = login_error_redirect("http://localhost:3000", "auth failed");
        let response = axum::response::IntoResponse::into_response(redirect);
        assert_eq!(
            response.headers().get("location").unwrap(),
            "http://localhost:3000/pages/login?error=auth%20failed"
        );
    }
}

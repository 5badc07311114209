// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! HTTP route handlers.

pub mod auth;
pub mod exercises;
pub mod saved;
pub mod workouts;

use crate::error::AppError;
use crate::middleware::auth::require_auth;
use crate::AppState;
use axum::extract::rejection::JsonRejection;
use axum::http::{header, Method};
use axum::{middleware, routing::get, Json, Router};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::{Validate, ValidationErrors};

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct HealthResponse {
    pub status: String,
    pub build_id: String,
}

/// Health check response
async fn health_check() -> Json<HealthResponse> {
    let build_id = option_env!("BUILD_ID").unwrap_or("unknown").to_string();
    Json(HealthResponse {
        status: "ok".to_string(),
        build_id,
    })
}

/// Message for bodies that are not JSON or do not fit the request type.
pub(crate) const INVALID_BODY: &str = "Invalid request body";

/// Unwrap a JSON body extractor, answering a rejection with `on_reject`.
///
/// Axum's own rejections are plain text with their own status codes, so
/// handlers take `Result<Json<T>, JsonRejection>` and route failures here.
pub(crate) fn json_body<T>(
    body: Result<Json<T>, JsonRejection>,
    on_reject: impl FnOnce() -> AppError,
) -> Result<T, AppError> {
    body.map(|Json(value)| value).map_err(|rejection| {
        tracing::debug!(
            status = %rejection.status(),
            error = %rejection.body_text(),
            "Request body rejected"
        );
        on_reject()
    })
}

/// First message attached to a failed validation rule.
fn first_message(errors: &ValidationErrors) -> String {
    errors
        .field_errors()
        .into_values()
        .flat_map(|errs| errs.iter())
        .find_map(|e| e.message.as_ref().map(|m| m.to_string()))
        .unwrap_or_else(|| INVALID_BODY.to_string())
}

/// Validate a request body, turning failures into a 400 with the rule's message.
pub(crate) fn reject_invalid<T: Validate>(body: &T) -> Result<(), AppError> {
    body.validate()
        .map_err(|errors| AppError::BadRequest(first_message(&errors)))
}

/// Build the complete router with all routes.
pub fn create_router(state: Arc<AppState>) -> Router {
    // CORS layer - allow requests from frontend URL and localhost (for dev)
    let frontend_url = state.config.frontend_url.clone();
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::AllowOrigin::predicate(
            move |origin: &axum::http::HeaderValue, _request_parts: &axum::http::request::Parts| {
                let origin_str = origin.to_str().unwrap_or("");
                origin_str == frontend_url
                    || origin_str.starts_with("http://localhost")
                    || origin_str.starts_with("http://127.0.0.1")
            },
        ))
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT]);

    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/health", get(health_check))
        .merge(auth::routes())
        .merge(exercises::routes());

    // Protected routes (bearer token required)
    let protected_routes = Router::new()
        .merge(auth::protected_routes())
        .merge(saved::routes())
        .merge(workouts::routes())
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(middleware::from_fn(
            crate::middleware::security::add_security_headers,
        ))
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state)
}

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Saved exercise routes (authenticated).

use super::{json_body, reject_invalid, INVALID_BODY};
use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{ExerciseRef, User};
use crate::AppState;
use axum::{
    extract::{rejection::JsonRejection, State},
    routing::get,
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route(
        "/saved-exercises",
        get(list_saved).post(save_exercise).delete(remove_saved),
    )
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedExercisesResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
    pub saved_exercises: Vec<ExerciseRef>,
}

/// Body for saving an exercise. Only the ID is required.
#[derive(Debug, Deserialize, Validate)]
pub struct SaveExerciseRequest {
    #[validate(
        required(message = "Missing exercise id"),
        length(min = 1, message = "Missing exercise id")
    )]
    id: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    equipment: Option<String>,
    #[serde(default)]
    target: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RemoveSavedRequest {
    #[validate(
        required(message = "Missing exerciseId"),
        length(min = 1, message = "Missing exerciseId")
    )]
    id: Option<String>,
}

async fn list_saved(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(user)): Extension<AuthUser>,
) -> Result<Json<SavedExercisesResponse>> {
    // Re-read so the list reflects writes made after the gate ran
    let user = state
        .db
        .get_user(&user.id)
        .await?
        .ok_or_else(AppError::user_not_found)?;

    Ok(Json(SavedExercisesResponse {
        message: None,
        saved_exercises: user.saved_exercises,
    }))
}

async fn save_exercise(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    body: std::result::Result<Json<SaveExerciseRequest>, JsonRejection>,
) -> Result<Json<SavedExercisesResponse>> {
    let body = json_body(body, || AppError::BadRequest(INVALID_BODY.to_string()))?;
    reject_invalid(&body)?;

    let exercise = ExerciseRef {
        id: body.id.unwrap_or_default(),
        name: body.name.unwrap_or_default(),
        equipment: body.equipment.unwrap_or_default(),
        target: body.target.unwrap_or_default(),
    };

    let updated = state
        .db
        .update_user(&user.id, &|u: &mut User| u.save_exercise(exercise.clone()))
        .await?
        .ok_or_else(AppError::user_not_found)?;

    tracing::debug!(user_id = %updated.id, exercise_id = %exercise.id, "Exercise saved");

    Ok(Json(SavedExercisesResponse {
        message: Some("Exercise saved"),
        saved_exercises: updated.saved_exercises,
    }))
}

async fn remove_saved(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    body: std::result::Result<Json<RemoveSavedRequest>, JsonRejection>,
) -> Result<Json<SavedExercisesResponse>> {
    let body = json_body(body, || AppError::BadRequest(INVALID_BODY.to_string()))?;
    reject_invalid(&body)?;
    let exercise_id = body.id.unwrap_or_default();

    let updated = state
        .db
        .update_user(&user.id, &|u: &mut User| {
            u.unsave_exercise(&exercise_id);
            Ok(())
        })
        .await?
        .ok_or_else(AppError::user_not_found)?;

    Ok(Json(SavedExercisesResponse {
        message: Some("Exercise removed"),
        saved_exercises: updated.saved_exercises,
    }))
}

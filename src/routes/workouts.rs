// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Workout plan routes (authenticated).

use super::{json_body, reject_invalid, INVALID_BODY};
use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{ExerciseRef, User, WorkoutDay};
use crate::AppState;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::{delete, get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/workout-days", get(list_days).post(add_day))
        .route("/workout-days/{day}/exercises", post(add_exercise))
        .route(
            "/workout-days/{day}/exercises/{exercise_id}",
            delete(remove_exercise),
        )
        .route("/workout/{day}", delete(remove_day))
}

#[derive(Debug, Deserialize, Validate)]
pub struct AddDayRequest {
    #[validate(
        required(message = "Day name is required"),
        length(min = 1, message = "Day name is required")
    )]
    day: Option<String>,
}

#[derive(Serialize)]
pub struct AddDayResponse {
    pub message: &'static str,
    pub day: String,
}

/// Body for adding an exercise to a day. Every field is required.
#[derive(Debug, Deserialize, Validate)]
pub struct AddExerciseRequest {
    #[validate(
        required(message = "All exercise details are required"),
        length(min = 1, message = "All exercise details are required")
    )]
    id: Option<String>,
    #[validate(
        required(message = "All exercise details are required"),
        length(min = 1, message = "All exercise details are required")
    )]
    name: Option<String>,
    #[validate(
        required(message = "All exercise details are required"),
        length(min = 1, message = "All exercise details are required")
    )]
    equipment: Option<String>,
    #[validate(
        required(message = "All exercise details are required"),
        length(min = 1, message = "All exercise details are required")
    )]
    target: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutPlanResponse {
    pub message: &'static str,
    pub workout_plan: Vec<WorkoutDay>,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

async fn list_days(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(user)): Extension<AuthUser>,
) -> Result<Json<Vec<WorkoutDay>>> {
    let user = state
        .db
        .get_user(&user.id)
        .await?
        .ok_or_else(AppError::user_not_found)?;

    Ok(Json(user.workout_plan))
}

async fn add_day(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    body: std::result::Result<Json<AddDayRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<AddDayResponse>)> {
    let body = json_body(body, || AppError::BadRequest(INVALID_BODY.to_string()))?;
    reject_invalid(&body)?;
    let day = body.day.unwrap_or_default();

    state
        .db
        .update_user(&user.id, &|u: &mut User| u.add_workout_day(&day))
        .await?
        .ok_or_else(AppError::user_not_found)?;

    tracing::debug!(user_id = %user.id, day = %day, "Workout day added");

    Ok((
        StatusCode::CREATED,
        Json(AddDayResponse {
            message: "Workout day added successfully",
            day,
        }),
    ))
}

async fn add_exercise(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Path(day): Path<String>,
    body: std::result::Result<Json<AddExerciseRequest>, JsonRejection>,
) -> Result<Json<WorkoutPlanResponse>> {
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
        .update_user(&user.id, &|u: &mut User| {
            u.add_workout_exercise(&day, exercise.clone())
        })
        .await?
        .ok_or_else(AppError::user_not_found)?;

    Ok(Json(WorkoutPlanResponse {
        message: "Exercise added successfully",
        workout_plan: updated.workout_plan,
    }))
}

async fn remove_exercise(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Path((day, exercise_id)): Path<(String, String)>,
) -> Result<Json<WorkoutPlanResponse>> {
    let updated = state
        .db
        .update_user(&user.id, &|u: &mut User| {
            u.remove_workout_exercise(&day, &exercise_id)
        })
        .await?
        .ok_or_else(AppError::user_not_found)?;

    Ok(Json(WorkoutPlanResponse {
        message: "Exercise removed successfully",
        workout_plan: updated.workout_plan,
    }))
}

async fn remove_day(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Path(day): Path<String>,
) -> Result<Json<MessageResponse>> {
    state
        .db
        .update_user(&user.id, &|u: &mut User| {
            u.remove_workout_day(&day);
            Ok(())
        })
        .await?
        .ok_or_else(AppError::user_not_found)?;

    Ok(Json(MessageResponse {
        message: "Workout day deleted successfully",
    }))
}

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User model for storage and API.

use crate::error::AppError;
use serde::{Deserialize, Serialize};

/// Exercise reference embedded in saved lists and workout days.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseRef {
    pub id: String,
    pub name: String,
    pub equipment: String,
    pub target: String,
}

/// One named day of a workout plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutDay {
    pub day: String,
    #[serde(default)]
    pub exercises: Vec<ExerciseRef>,
}

/// User account stored in Firestore.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Opaque user ID (also used as document ID)
    pub id: String,
    /// Email address, stored lower-cased
    pub email: String,
    pub username: String,
    /// Google account subject, for federated accounts
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub google_id: Option<String>,
    /// Hex-encoded PBKDF2 salt (password accounts only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub salt: Option<String>,
    /// Hex-encoded PBKDF2 hash (password accounts only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
    #[serde(default)]
    pub saved_exercises: Vec<ExerciseRef>,
    #[serde(default)]
    pub workout_plan: Vec<WorkoutDay>,
    pub created_at: String,
}

impl User {
    /// New account with a fresh ID and no credentials or plan.
    ///
    /// Surrounding whitespace is dropped from both the email and the username.
    pub fn new(email: &str, username: &str) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            email: normalize_email(email),
            username: username.trim().to_string(),
            google_id: None,
            salt: None,
            hash: None,
            saved_exercises: Vec::new(),
            workout_plan: Vec::new(),
            created_at: crate::time_utils::format_utc_rfc3339(chrono::Utc::now()),
        }
    }

    /// Drop credential material before handing the record to request handlers.
    pub fn without_credentials(mut self) -> Self {
        self.salt = None;
        self.hash = None;
        self
    }

    pub fn has_password(&self) -> bool {
        self.salt.is_some() && self.hash.is_some()
    }

    // ─── Saved Exercises ─────────────────────────────────────────

    /// Add an exercise to the saved list, rejecting duplicates by ID.
    pub fn save_exercise(&mut self, exercise: ExerciseRef) -> Result<(), AppError> {
        if self.saved_exercises.iter().any(|e| e.id == exercise.id) {
            return Err(AppError::BadRequest("Exercise already saved".to_string()));
        }
        self.saved_exercises.push(exercise);
        Ok(())
    }

    /// Remove a saved exercise. Removing an unknown ID is a no-op.
    pub fn unsave_exercise(&mut self, exercise_id: &str) {
        self.saved_exercises.retain(|e| e.id != exercise_id);
    }

    // ─── Workout Plan ────────────────────────────────────────────

    pub fn add_workout_day(&mut self, day: &str) -> Result<(), AppError> {
        if self.workout_plan.iter().any(|d| d.day == day) {
            return Err(AppError::BadRequest("Day already exists".to_string()));
        }
        self.workout_plan.push(WorkoutDay {
            day: day.to_string(),
            exercises: Vec::new(),
        });
        Ok(())
    }

    pub fn remove_workout_day(&mut self, day: &str) {
        self.workout_plan.retain(|d| d.day != day);
    }

    /// Append an exercise to a day. Repeats within a day are allowed.
    pub fn add_workout_exercise(
        &mut self,
        day: &str,
        exercise: ExerciseRef,
    ) -> Result<(), AppError> {
        self.workout_day_mut(day)?.exercises.push(exercise);
        Ok(())
    }

    /// Remove every occurrence of an exercise from a day.
    pub fn remove_workout_exercise(&mut self, day: &str, exercise_id: &str) -> Result<(), AppError> {
        self.workout_day_mut(day)?
            .exercises
            .retain(|e| e.id != exercise_id);
        Ok(())
    }

    fn workout_day_mut(&mut self, day: &str) -> Result<&mut WorkoutDay, AppError> {
        self.workout_plan
            .iter_mut()
            .find(|d| d.day == day)
            .ok_or_else(|| AppError::NotFound("Workout day not found".to_string()))
    }
}

/// Emails are unique case-insensitively, so they are stored and looked up lower-cased.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

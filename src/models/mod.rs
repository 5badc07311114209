// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Data models for the application.

pub mod exercise;
pub mod user;

pub use exercise::{Category, CategoryKind, Exercise, ExerciseFilter};
pub use user::{ExerciseRef, User, WorkoutDay};

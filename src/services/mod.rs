// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod catalog;
pub mod exercise_db;
pub mod google_oauth;
pub mod identity;
pub mod password;
pub mod token;

pub use catalog::{CatalogService, ExercisePage};
pub use exercise_db::ExerciseDbClient;
pub use google_oauth::GoogleOAuthClient;
pub use identity::{FederatedProfile, IdentityError, IdentityService};
pub use token::{Claims, TokenError, TokenService};

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Database layer.
//!
//! Handlers and services talk to storage through the [`Repository`] trait.
//! [`FirestoreDb`] backs production; [`MemoryDb`] backs tests and local runs.

pub mod firestore;
pub mod memory;

pub use firestore::FirestoreDb;
pub use memory::MemoryDb;

use crate::error::AppError;
use crate::models::{Category, CategoryKind, Exercise, ExerciseFilter, User};
use async_trait::async_trait;

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
    /// Unique-claim documents (keyed by normalized value, holding the owning user ID)
    pub const USER_EMAILS: &str = "user_emails";
    pub const USER_USERNAMES: &str = "user_usernames";
    pub const USER_GOOGLE_IDS: &str = "user_google_ids";
    pub const EXERCISES: &str = "exercises";
    pub const MUSCLE_CATEGORIES: &str = "muscle_categories";
    pub const EQUIPMENT_CATEGORIES: &str = "equipment_categories";
}

/// Message used for every registration uniqueness violation.
pub const DUPLICATE_ACCOUNT: &str = "Email or username is already in use";

/// In-place change applied to a stored user under the store's write guard.
///
/// May run more than once if the store retries, so it must not have side effects
/// beyond the user it is handed.
pub type UserMutation<'a> = &'a (dyn Fn(&mut User) -> Result<(), AppError> + Send + Sync);

/// Persistence for user accounts.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a new user.
    ///
    /// Email, username and Google ID uniqueness is enforced atomically by the
    /// store; a violation returns [`AppError::Conflict`] and writes nothing.
    async fn insert_user(&self, user: &User) -> Result<(), AppError>;

    async fn get_user(&self, user_id: &str) -> Result<Option<User>, AppError>;

    /// Case-insensitive lookup by email.
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, AppError>;

    async fn find_user_by_google_id(&self, google_id: &str) -> Result<Option<User>, AppError>;

    /// Atomically apply `mutate` to a user and persist the result.
    ///
    /// Returns the updated user, or `None` if no such user exists. An error from
    /// `mutate` aborts the update and is returned unchanged.
    async fn update_user(
        &self,
        user_id: &str,
        mutate: UserMutation<'_>,
    ) -> Result<Option<User>, AppError>;
}

/// Persistence for the mirrored exercise catalog.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Insert an exercise unless one with the same ID exists. Returns whether it was inserted.
    async fn insert_exercise_if_absent(&self, exercise: &Exercise) -> Result<bool, AppError>;

    /// All exercises matching `filter`, ordered by ID.
    async fn list_exercises(&self, filter: &ExerciseFilter) -> Result<Vec<Exercise>, AppError>;

    /// Store a category name unless it already exists, returning the stored category.
    async fn ensure_category(&self, kind: CategoryKind, name: &str)
        -> Result<Category, AppError>;

    /// All categories of one kind, ordered by name.
    async fn list_categories(&self, kind: CategoryKind) -> Result<Vec<Category>, AppError>;
}

/// Everything the API needs from storage.
pub trait Repository: UserStore + CatalogStore {}

impl<T: UserStore + CatalogStore> Repository for T {}

/// Resolve a login string against email first, then username.
pub async fn find_user_by_login(
    store: &(impl UserStore + ?Sized),
    login: &str,
) -> Result<Option<User>, AppError> {
    if let Some(user) = store.find_user_by_email(login).await? {
        return Ok(Some(user));
    }
    store.find_user_by_username(login.trim()).await
}

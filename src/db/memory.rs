// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-memory store used by tests and `STORAGE=memory` local runs.
//!
//! Uniqueness is enforced through DashMap entries, which lock their shard
//! while the claim is decided, so two racing registrations cannot both win.

use super::{CatalogStore, UserMutation, UserStore, DUPLICATE_ACCOUNT};
use crate::error::AppError;
use crate::models::user::normalize_email;
use crate::models::{Category, CategoryKind, Exercise, ExerciseFilter, User};
use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;

/// DashMap-backed store. Clones share the same data.
#[derive(Default, Clone)]
pub struct MemoryDb {
    users: Arc<DashMap<String, User>>,
    by_email: Arc<DashMap<String, String>>,
    by_username: Arc<DashMap<String, String>>,
    by_google_id: Arc<DashMap<String, String>>,
    exercises: Arc<DashMap<String, Exercise>>,
    muscle_categories: Arc<DashMap<String, Category>>,
    equipment_categories: Arc<DashMap<String, Category>>,
}

impl MemoryDb {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored users.
    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    fn lookup(&self, index: &DashMap<String, String>, key: &str) -> Option<User> {
        index
            .get(key)
            .and_then(|id| self.users.get(id.value()).map(|u| u.value().clone()))
    }

    fn categories(&self, kind: CategoryKind) -> &DashMap<String, Category> {
        match kind {
            CategoryKind::Muscle => &self.muscle_categories,
            CategoryKind::Equipment => &self.equipment_categories,
        }
    }
}

/// Claim `key` for `user_id`. Returns false if someone else holds it.
fn claim(index: &DashMap<String, String>, key: &str, user_id: &str) -> bool {
    match index.entry(key.to_string()) {
        Entry::Occupied(_) => false,
        Entry::Vacant(slot) => {
            slot.insert(user_id.to_string());
            true
        }
    }
}

#[async_trait]
impl UserStore for MemoryDb {
    async fn insert_user(&self, user: &User) -> Result<(), AppError> {
        let conflict = || AppError::Conflict(DUPLICATE_ACCOUNT.to_string());

        if !claim(&self.by_email, &user.email, &user.id) {
            return Err(conflict());
        }
        if !claim(&self.by_username, &user.username, &user.id) {
            self.by_email.remove(&user.email);
            return Err(conflict());
        }
        if let Some(google_id) = &user.google_id {
            if !claim(&self.by_google_id, google_id, &user.id) {
                self.by_email.remove(&user.email);
                self.by_username.remove(&user.username);
                return Err(conflict());
            }
        }

        self.users.insert(user.id.clone(), user.clone());
        Ok(())
    }

    async fn get_user(&self, user_id: &str) -> Result<Option<User>, AppError> {
        Ok(self.users.get(user_id).map(|u| u.value().clone()))
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        Ok(self.lookup(&self.by_email, &normalize_email(email)))
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        Ok(self.lookup(&self.by_username, username))
    }

    async fn find_user_by_google_id(&self, google_id: &str) -> Result<Option<User>, AppError> {
        Ok(self.lookup(&self.by_google_id, google_id))
    }

    async fn update_user(
        &self,
        user_id: &str,
        mutate: UserMutation<'_>,
    ) -> Result<Option<User>, AppError> {
        let Some(mut entry) = self.users.get_mut(user_id) else {
            return Ok(None);
        };

        // Mutate a copy so a rejected change leaves the stored user untouched
        let mut updated = entry.value().clone();
        mutate(&mut updated)?;
        *entry = updated.clone();

        Ok(Some(updated))
    }
}

#[async_trait]
impl CatalogStore for MemoryDb {
    async fn insert_exercise_if_absent(&self, exercise: &Exercise) -> Result<bool, AppError> {
        match self.exercises.entry(exercise.id.clone()) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(slot) => {
                slot.insert(exercise.clone());
                Ok(true)
            }
        }
    }

    async fn list_exercises(&self, filter: &ExerciseFilter) -> Result<Vec<Exercise>, AppError> {
        let mut exercises: Vec<Exercise> = self
            .exercises
            .iter()
            .filter(|e| filter.matches(e.value()))
            .map(|e| e.value().clone())
            .collect();
        exercises.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(exercises)
    }

    async fn ensure_category(
        &self,
        kind: CategoryKind,
        name: &str,
    ) -> Result<Category, AppError> {
        let category = self
            .categories(kind)
            .entry(name.to_string())
            .or_insert_with(|| Category {
                name: name.to_string(),
            })
            .value()
            .clone();
        Ok(category)
    }

    async fn list_categories(&self, kind: CategoryKind) -> Result<Vec<Category>, AppError> {
        let mut categories: Vec<Category> = self
            .categories(kind)
            .iter()
            .map(|c| c.value().clone())
            .collect();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }
}

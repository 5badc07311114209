// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Exercise catalog: mirroring from ExerciseDB and paginated browsing.

use crate::db::Repository;
use crate::error::AppError;
use crate::models::{Category, CategoryKind, Exercise, ExerciseFilter};
use crate::services::exercise_db::ExerciseDbClient;
use futures_util::{stream, StreamExt};
use serde::Serialize;
use std::sync::Arc;

/// Maximum concurrent store writes while mirroring.
const MAX_CONCURRENT_DB_OPS: usize = 32;

/// Exercises per catalog page.
pub const PER_PAGE: usize = 15;

/// One page of the filtered catalog.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExercisePage {
    pub exercises: Vec<Exercise>,
    pub current_page: usize,
    pub total_pages: usize,
    pub total_exercises: usize,
}

/// Slice `exercises` into the 1-based `page`.
///
/// Pages past the end are empty rather than an error.
pub fn paginate(exercises: Vec<Exercise>, page: usize) -> Result<ExercisePage, AppError> {
    if page == 0 {
        return Err(AppError::BadRequest("Page must be at least 1".to_string()));
    }

    let total_exercises = exercises.len();
    let total_pages = total_exercises.div_ceil(PER_PAGE);
    let exercises = exercises
        .into_iter()
        .skip((page - 1).saturating_mul(PER_PAGE))
        .take(PER_PAGE)
        .collect();

    Ok(ExercisePage {
        exercises,
        current_page: page,
        total_pages,
        total_exercises,
    })
}

/// Catalog service over the store and the upstream API.
#[derive(Clone)]
pub struct CatalogService {
    db: Arc<dyn Repository>,
    upstream: ExerciseDbClient,
}

impl CatalogService {
    pub fn new(db: Arc<dyn Repository>, upstream: ExerciseDbClient) -> Self {
        Self { db, upstream }
    }

    /// Pull the upstream exercise list and store the ones we lack.
    pub async fn mirror_exercises(&self) -> Result<Vec<Exercise>, AppError> {
        let exercises = self.upstream.list_exercises().await?;
        store_exercises(self.db.as_ref(), exercises).await
    }

    /// Pull one upstream category list and store missing names.
    pub async fn mirror_categories(&self, kind: CategoryKind) -> Result<Vec<Category>, AppError> {
        let names = match kind {
            CategoryKind::Muscle => self.upstream.list_target_muscles().await?,
            CategoryKind::Equipment => self.upstream.list_equipment().await?,
        };
        store_categories(self.db.as_ref(), kind, names).await
    }

    pub async fn categories(&self, kind: CategoryKind) -> Result<Vec<Category>, AppError> {
        self.db.list_categories(kind).await
    }

    pub async fn browse(
        &self,
        filter: &ExerciseFilter,
        page: usize,
    ) -> Result<ExercisePage, AppError> {
        let exercises = self.db.list_exercises(filter).await?;
        paginate(exercises, page)
    }
}

/// Insert each exercise not already stored. Returns the newly inserted ones.
pub async fn store_exercises(
    db: &dyn Repository,
    exercises: Vec<Exercise>,
) -> Result<Vec<Exercise>, AppError> {
    let fetched = exercises.len();

    let results: Vec<Result<Option<Exercise>, AppError>> = stream::iter(exercises)
        .map(|exercise| async move {
            let inserted = db.insert_exercise_if_absent(&exercise).await?;
            Ok::<_, AppError>(inserted.then_some(exercise))
        })
        .buffer_unordered(MAX_CONCURRENT_DB_OPS)
        .collect()
        .await;

    let mut inserted = results
        .into_iter()
        .filter_map(Result::transpose)
        .collect::<Result<Vec<_>, _>>()?;
    inserted.sort_by(|a, b| a.id.cmp(&b.id));

    tracing::info!(fetched, inserted = inserted.len(), "Mirrored exercises");
    Ok(inserted)
}

/// Ensure each category name is stored, returning the stored categories.
pub async fn store_categories(
    db: &dyn Repository,
    kind: CategoryKind,
    names: Vec<String>,
) -> Result<Vec<Category>, AppError> {
    let results: Vec<Result<Category, AppError>> = stream::iter(names)
        .map(|name| async move { db.ensure_category(kind, &name).await })
        .buffer_unordered(MAX_CONCURRENT_DB_OPS)
        .collect()
        .await;

    let mut categories = results.into_iter().collect::<Result<Vec<_>, _>>()?;
    categories.sort_by(|a, b| a.name.cmp(&b.name));

    tracing::info!(?kind, count = categories.len(), "Mirrored categories");
    Ok(categories)
}

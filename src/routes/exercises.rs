// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Exercise catalog routes (public).

use crate::error::{AppError, Result};
use crate::models::{Category, CategoryKind, Exercise, ExerciseFilter};
use crate::services::ExercisePage;
use crate::AppState;
use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/exercises-from-api", get(mirror_exercises))
        .route("/api/muscleCategories-from-api", get(mirror_muscle_categories))
        .route(
            "/api/equipmentCategories-from-api",
            get(mirror_equipment_categories),
        )
        .route("/muscle-categories", get(muscle_categories))
        .route("/equipment-categories", get(equipment_categories))
        .route("/all-exercises", get(all_exercises))
}

// ─── Mirroring ───────────────────────────────────────────────

#[derive(Serialize)]
pub struct MirrorExercisesResponse {
    pub message: &'static str,
    /// Only the exercises inserted by this call
    pub exercises: Vec<Exercise>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MirrorMuscleCategoriesResponse {
    pub message: &'static str,
    pub muscle_categories: Vec<Category>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MirrorEquipmentCategoriesResponse {
    pub message: &'static str,
    pub equipment_categories: Vec<Category>,
}

async fn mirror_exercises(
    State(state): State<Arc<AppState>>,
) -> Result<Json<MirrorExercisesResponse>> {
    let exercises = state.catalog.mirror_exercises().await?;
    Ok(Json(MirrorExercisesResponse {
        message: "Exercises fetched and stored successfully",
        exercises,
    }))
}

async fn mirror_muscle_categories(
    State(state): State<Arc<AppState>>,
) -> Result<Json<MirrorMuscleCategoriesResponse>> {
    let muscle_categories = state.catalog.mirror_categories(CategoryKind::Muscle).await?;
    Ok(Json(MirrorMuscleCategoriesResponse {
        message: "Muscle categories fetched and stored successfully",
        muscle_categories,
    }))
}

async fn mirror_equipment_categories(
    State(state): State<Arc<AppState>>,
) -> Result<Json<MirrorEquipmentCategoriesResponse>> {
    let equipment_categories = state
        .catalog
        .mirror_categories(CategoryKind::Equipment)
        .await?;
    Ok(Json(MirrorEquipmentCategoriesResponse {
        message: "Equipment categories fetched and stored successfully",
        equipment_categories,
    }))
}

// ─── Browsing ────────────────────────────────────────────────

async fn muscle_categories(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Category>>> {
    Ok(Json(state.catalog.categories(CategoryKind::Muscle).await?))
}

async fn equipment_categories(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Category>>> {
    Ok(Json(state.catalog.categories(CategoryKind::Equipment).await?))
}

/// Query parameters for the catalog listing.
#[derive(Debug, Deserialize)]
pub struct CatalogQuery {
    #[serde(default)]
    muscle: Option<String>,
    #[serde(default)]
    equipment: Option<String>,
    /// Kept as text so a bad value gets our 400 instead of the extractor's
    #[serde(default)]
    page: Option<String>,
}

fn parse_page(page: Option<&str>) -> Result<usize> {
    match page.map(str::trim) {
        None | Some("") => Ok(1),
        Some(value) => value
            .parse()
            .map_err(|_| AppError::BadRequest("Page must be a positive integer".to_string())),
    }
}

async fn all_exercises(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CatalogQuery>,
) -> Result<Json<ExercisePage>> {
    let page = parse_page(params.page.as_deref())?;
    let filter = ExerciseFilter::from_query(params.muscle.as_deref(), params.equipment.as_deref());

    Ok(Json(state.catalog.browse(&filter, page).await?))
}

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Exercise catalog models mirrored from ExerciseDB.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Catalog exercise, keyed by its ExerciseDB ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Exercise {
    pub id: String,
    pub name: String,
    pub equipment: String,
    /// Primary target muscle
    pub target: String,
    #[serde(default)]
    pub gif_url: Option<String>,
}

/// Muscle or equipment category name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Category {
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CategoryKind {
    Muscle,
    Equipment,
}

/// Filter for catalog listings. `None` matches everything.
#[derive(Debug, Clone, Default)]
pub struct ExerciseFilter {
    pub muscle: Option<String>,
    pub equipment: Option<String>,
}

impl ExerciseFilter {
    /// Build a filter from query values, where `All` or empty means no filter.
    pub fn from_query(muscle: Option<&str>, equipment: Option<&str>) -> Self {
        fn normalize(value: Option<&str>) -> Option<String> {
            value
                .map(str::trim)
                .filter(|v| !v.is_empty() && *v != "All")
                .map(str::to_string)
        }

        Self {
            muscle: normalize(muscle),
            equipment: normalize(equipment),
        }
    }

    pub fn matches(&self, exercise: &Exercise) -> bool {
        self.muscle.as_deref().map_or(true, |m| exercise.target == m)
            && self
                .equipment
                .as_deref()
                .map_or(true, |e| exercise.equipment == e)
    }
}

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! ExerciseDB (RapidAPI) client.
//!
//! Read-only: the full exercise list plus the target-muscle and equipment
//! category lists.

use crate::config::Config;
use crate::error::AppError;
use crate::models::Exercise;
use serde::Deserialize;
use std::time::Duration;

/// Full catalog downloads can be slow.
const HTTP_TIMEOUT: Duration = Duration::from_secs(60);

/// ExerciseDB API client.
#[derive(Clone)]
pub struct ExerciseDbClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    api_host: String,
}

impl ExerciseDbClient {
    pub fn new(config: &Config) -> Self {
        let http = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Falling back to default ExerciseDB HTTP client");
                reqwest::Client::new()
            });

        Self {
            http,
            base_url: format!("https://{}", config.rapidapi_host),
            api_key: config.rapidapi_key.clone(),
            api_host: config.rapidapi_host.clone(),
        }
    }

    /// Every exercise in the upstream catalog (`limit=0` disables paging).
    pub async fn list_exercises(&self) -> Result<Vec<Exercise>, AppError> {
        self.get_json("/exercises", &[("limit", "0")]).await
    }

    /// Target muscle names.
    pub async fn list_target_muscles(&self) -> Result<Vec<String>, AppError> {
        self.get_json("/exercises/targetList", &[]).await
    }

    /// Equipment names.
    pub async fn list_equipment(&self) -> Result<Vec<String>, AppError> {
        self.get_json("/exercises/equipmentList", &[]).await
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Generic GET request with JSON response.
    async fn get_json<T: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, AppError> {
        let response = self
            .http
            .get(self.url(path))
            .header("x-rapidapi-key", &self.api_key)
            .header("x-rapidapi-host", &self.api_host)
            .query(query)
            .send()
            .await
            .map_err(|e| AppError::ExerciseApi(e.to_string()))?;

        self.check_response_json(response).await
    }

    /// Check response and parse JSON body.
    async fn check_response_json<T: for<'de> Deserialize<'de>>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, AppError> {
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();

            if status.as_u16() == 429 {
                tracing::warn!("ExerciseDB rate limit hit (429)");
            }

            return Err(AppError::ExerciseApi(format!("HTTP {}: {}", status, body)));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::ExerciseApi(format!("JSON parse error: {}", e)))
    }
}

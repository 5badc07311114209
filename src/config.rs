// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! Everything is read once at startup. The token secret in particular must
//! stay fixed for the lifetime of the process, or previously issued tokens
//! stop verifying.

use std::env;

/// Signing secret used when running outside production without `TOKEN_SECRET`.
const DEV_TOKEN_SECRET: &str = "gym-guru-development-token-secret";

/// Deployment environment, selected by `APP_ENV`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Production,
    Development,
}

impl Environment {
    fn from_env_value(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some(v) if v.eq_ignore_ascii_case("production") => Environment::Production,
            _ => Environment::Development,
        }
    }
}

/// Which user/catalog store backs the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Firestore,
    Memory,
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub environment: Environment,
    /// Public base URL of this API (used to build the OAuth callback)
    pub api_base_url: String,
    /// Frontend URL for CORS and OAuth redirects
    pub frontend_url: String,
    /// GCP project ID (Firestore)
    pub gcp_project_id: String,
    pub storage: StorageBackend,
    /// Server port
    pub port: u16,

    /// Google OAuth client ID (public)
    pub google_client_id: String,
    /// Google OAuth client secret
    pub google_client_secret: String,
    /// HMAC key for the OAuth `state` parameter (raw bytes)
    pub oauth_state_key: Vec<u8>,

    /// JWT signing key for access tokens (raw bytes)
    pub token_secret: Vec<u8>,

    /// RapidAPI credentials for ExerciseDB
    pub rapidapi_key: String,
    pub rapidapi_host: String,
}

impl Config {
    /// Default config for testing only.
    pub fn test_default() -> Self {
        Self {
            environment: Environment::Development,
            api_base_url: "http://localhost:8080".to_string(),
            frontend_url: "http://localhost:3000".to_string(),
            gcp_project_id: "test-project".to_string(),
            storage: StorageBackend::Memory,
            port: 8080,
            google_client_id: "test_google_client_id".to_string(),
            google_client_secret: "test_google_secret".to_string(),
            oauth_state_key: b"test_oauth_state_key_32_bytes!!!".to_vec(),
            token_secret: b"test_token_secret_32_bytes_long!".to_vec(),
            rapidapi_key: "test_rapidapi_key".to_string(),
            rapidapi_host: "exercisedb.p.rapidapi.com".to_string(),
        }
    }

    /// Load configuration from environment variables.
    ///
    /// A `.env` file is honored for local development.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let environment = Environment::from_env_value(env::var("APP_ENV").ok().as_deref());

        let token_secret = match env::var("TOKEN_SECRET") {
            Ok(secret) if !secret.trim().is_empty() => secret.trim().as_bytes().to_vec(),
            _ if environment == Environment::Production => {
                return Err(ConfigError::Missing("TOKEN_SECRET"))
            }
            _ => {
                tracing::warn!("TOKEN_SECRET not set, using the development signing secret");
                DEV_TOKEN_SECRET.as_bytes().to_vec()
            }
        };

        let oauth_state_key = env::var("OAUTH_STATE_KEY")
            .map(|v| v.trim().as_bytes().to_vec())
            .unwrap_or_else(|_| token_secret.clone());

        let storage = match env::var("STORAGE").ok().as_deref().map(str::trim) {
            None | Some("firestore") => StorageBackend::Firestore,
            Some("memory") => StorageBackend::Memory,
            Some(_) => return Err(ConfigError::Invalid("STORAGE")),
        };

        let port = match env::var("PORT") {
            Ok(v) => v.trim().parse().map_err(|_| ConfigError::Invalid("PORT"))?,
            Err(_) => 8080,
        };

        Ok(Self {
            environment,
            api_base_url: env::var("API_BASE_URL")
                .unwrap_or_else(|_| format!("http://localhost:{}", port)),
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            gcp_project_id: env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string()),
            storage,
            port,
            google_client_id: env::var("GOOGLE_CLIENT_ID")
                .map_err(|_| ConfigError::Missing("GOOGLE_CLIENT_ID"))?,
            google_client_secret: env::var("GOOGLE_CLIENT_SECRET")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("GOOGLE_CLIENT_SECRET"))?,
            oauth_state_key,
            token_secret,
            rapidapi_key: env::var("RAPIDAPI_KEY")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("RAPIDAPI_KEY"))?,
            rapidapi_host: env::var("RAPIDAPI_HOST")
                .unwrap_or_else(|_| "exercisedb.p.rapidapi.com".to_string()),
        })
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_env() {
        // Set required env vars for test
        env::set_var("GOOGLE_CLIENT_ID", "test_id");
        env::set_var("GOOGLE_CLIENT_SECRET", "test_secret");
        env::set_var("RAPIDAPI_KEY", "test_key");
        env::set_var("TOKEN_SECRET", "test_token_secret");
        env::set_var("STORAGE", "memory");

        let config = Config::from_env().expect("Config should load");

        assert_eq!(config.google_client_id, "test_id");
        assert_eq!(config.google_client_secret, "test_secret");
        assert_eq!(config.token_secret, b"test_token_secret".to_vec());
        assert_eq!(config.oauth_state_key, config.token_secret);
        assert_eq!(config.storage, StorageBackend::Memory);
    }

    #[test]
    fn test_environment_parsing() {
        assert_eq!(
            Environment::from_env_value(Some("production")),
            Environment::Production
        );
        assert_eq!(
            Environment::from_env_value(Some("PRODUCTION")),
            Environment::Production
        );
        assert_eq!(
            Environment::from_env_value(Some("test")),
            Environment::Development
        );
        assert_eq!(Environment::from_env_value(None), Environment::Development);
    }
}

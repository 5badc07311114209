// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Gym Guru: exercise catalog and workout planning API
//!
//! This crate provides the backend API for browsing a catalog mirrored from
//! ExerciseDB, saving exercises, and building a per-user workout plan, with
//! password and Google sign-in authentication.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::Repository;
use services::{
    CatalogService, ExerciseDbClient, GoogleOAuthClient, IdentityService, TokenService,
};
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: Arc<dyn Repository>,
    pub identity: IdentityService,
    pub google: GoogleOAuthClient,
    pub catalog: CatalogService,
}

impl AppState {
    /// Wire services around a store.
    pub fn new(config: Config, db: Arc<dyn Repository>) -> anyhow::Result<Self> {
        let tokens = TokenService::new(&config.token_secret);
        let identity = IdentityService::new(db.clone(), tokens);
        let google = GoogleOAuthClient::new(&config)?;
        let catalog = CatalogService::new(db.clone(), ExerciseDbClient::new(&config));

        Ok(Self {
            config,
            db,
            identity,
            google,
            catalog,
        })
    }
}

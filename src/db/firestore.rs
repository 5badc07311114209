// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Users (accounts, saved exercises, workout plans)
//! - Unique claims (email / username / Google ID → user ID)
//! - Exercises and categories (mirrored ExerciseDB catalog)

use super::{collections, CatalogStore, UserMutation, UserStore, DUPLICATE_ACCOUNT};
use crate::error::AppError;
use crate::models::user::normalize_email;
use crate::models::{Category, CategoryKind, Exercise, ExerciseFilter, User};
use async_trait::async_trait;
use firestore::errors::FirestoreError;
use firestore::FirestoreConsistencySelector;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Attempts at a contended read-modify-write before giving up.
const MAX_TRANSACTION_ATTEMPTS: u32 = 8;

/// Outcome of one transactional update attempt.
enum UpdateAttempt {
    Done(Option<User>),
    /// The transaction failed in Firestore and may succeed on a fresh attempt.
    Contended(FirestoreError),
}

/// Document in one of the unique-claim collections.
///
/// Firestore has no unique indexes, so each unique value gets its own document
/// created with insert semantics. A second insert of the same ID fails, which is
/// the atomic uniqueness check.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct UniqueClaim {
    user_id: String,
}

/// Map an arbitrary value to a valid Firestore document ID.
///
/// IDs may not contain `/`, be `.` or `..`, or match `__.*__`. Percent-encoding
/// `.` and `_` on top of the URL encoding rules out all three.
fn claim_doc_id(value: &str) -> String {
    urlencoding::encode(value)
        .replace('.', "%2E")
        .replace('_', "%5F")
}

fn category_collection(kind: CategoryKind) -> &'static str {
    match kind {
        CategoryKind::Muscle => collections::MUSCLE_CATEGORIES,
        CategoryKind::Equipment => collections::EQUIPMENT_CATEGORIES,
    }
}

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: firestore::FirestoreDb,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self { client })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        // The emulator accepts any bearer token, so hand it an unsigned one
        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(project = project_id, "Connected to Firestore emulator");

        Ok(Self { client })
    }

    // ─── Unique Claims ───────────────────────────────────────────

    /// Create the claim document for `value`, failing with `Conflict` if it exists.
    async fn claim(&self, collection: &str, value: &str, user_id: &str) -> Result<(), AppError> {
        let claim = UniqueClaim {
            user_id: user_id.to_string(),
        };

        let result: Result<UniqueClaim, FirestoreError> = self
            .client
            .fluent()
            .insert()
            .into(collection)
            .document_id(claim_doc_id(value))
            .object(&claim)
            .execute()
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(FirestoreError::DataConflictError(_)) => {
                Err(AppError::Conflict(DUPLICATE_ACCOUNT.to_string()))
            }
            Err(e) => Err(AppError::Database(e.to_string())),
        }
    }

    /// Best-effort removal of claims taken by a failed insert.
    async fn release_claims(&self, claims: &[(&'static str, String)]) {
        for (collection, value) in claims {
            let result = self
                .client
                .fluent()
                .delete()
                .from(*collection)
                .document_id(claim_doc_id(value))
                .execute()
                .await;

            if let Err(e) = result {
                tracing::error!(
                    collection = *collection,
                    error = %e,
                    "Failed to release unique claim after aborted insert"
                );
            }
        }
    }

    /// Follow a claim document to the user it points at.
    async fn find_by_claim(&self, collection: &str, value: &str) -> Result<Option<User>, AppError> {
        let claim: Option<UniqueClaim> = self
            .client
            .fluent()
            .select()
            .by_id_in(collection)
            .obj()
            .one(&claim_doc_id(value))
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        match claim {
            Some(claim) => self.get_user(&claim.user_id).await,
            None => Ok(None),
        }
    }

    // ─── Transactions ────────────────────────────────────────────

    /// One read-modify-write of a user inside a single transaction.
    ///
    /// The read goes through the transaction, so a concurrent commit to the same
    /// document makes this commit fail instead of overwriting it.
    async fn try_update_user(
        &self,
        user_id: &str,
        mutate: UserMutation<'_>,
    ) -> Result<UpdateAttempt, AppError> {
        let mut transaction = self
            .client
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        let reader = self
            .client
            .clone_with_consistency_selector(FirestoreConsistencySelector::Transaction(
                transaction.transaction_id().clone(),
            ));

        let current: Result<Option<User>, FirestoreError> = reader
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(user_id)
            .await;

        let mut user = match current {
            Ok(Some(user)) => user,
            Ok(None) => {
                let _ = transaction.rollback().await;
                return Ok(UpdateAttempt::Done(None));
            }
            Err(e) => {
                let _ = transaction.rollback().await;
                return Ok(UpdateAttempt::Contended(e));
            }
        };

        if let Err(e) = mutate(&mut user) {
            let _ = transaction.rollback().await;
            return Err(e);
        }

        self.client
            .fluent()
            .update()
            .in_col(collections::USERS)
            .document_id(user_id)
            .object(&user)
            .add_to_transaction(&mut transaction)
            .map_err(|e| AppError::Database(format!("Failed to add user to transaction: {}", e)))?;

        match transaction.commit().await {
            Ok(_) => Ok(UpdateAttempt::Done(Some(user))),
            Err(e) => Ok(UpdateAttempt::Contended(e)),
        }
    }
}

#[async_trait]
impl UserStore for FirestoreDb {
    async fn insert_user(&self, user: &User) -> Result<(), AppError> {
        let mut wanted: Vec<(&'static str, String)> = vec![
            (collections::USER_EMAILS, user.email.clone()),
            (collections::USER_USERNAMES, user.username.clone()),
        ];
        if let Some(google_id) = &user.google_id {
            wanted.push((collections::USER_GOOGLE_IDS, google_id.clone()));
        }

        let mut taken = Vec::with_capacity(wanted.len());
        for (collection, value) in wanted {
            if let Err(e) = self.claim(collection, &value, &user.id).await {
                self.release_claims(&taken).await;
                return Err(e);
            }
            taken.push((collection, value));
        }

        let result: Result<User, FirestoreError> = self
            .client
            .fluent()
            .insert()
            .into(collections::USERS)
            .document_id(&user.id)
            .object(user)
            .execute()
            .await;

        if let Err(e) = result {
            self.release_claims(&taken).await;
            return Err(AppError::Database(e.to_string()));
        }

        tracing::debug!(user_id = %user.id, "User inserted");
        Ok(())
    }

    async fn get_user(&self, user_id: &str) -> Result<Option<User>, AppError> {
        self.client
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(user_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        self.find_by_claim(collections::USER_EMAILS, &normalize_email(email))
            .await
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        self.find_by_claim(collections::USER_USERNAMES, username)
            .await
    }

    async fn find_user_by_google_id(&self, google_id: &str) -> Result<Option<User>, AppError> {
        self.find_by_claim(collections::USER_GOOGLE_IDS, google_id)
            .await
    }

    async fn update_user(
        &self,
        user_id: &str,
        mutate: UserMutation<'_>,
    ) -> Result<Option<User>, AppError> {
        let mut attempt = 1;
        loop {
            match self.try_update_user(user_id, mutate).await? {
                UpdateAttempt::Done(user) => return Ok(user),
                UpdateAttempt::Contended(e) if attempt < MAX_TRANSACTION_ATTEMPTS => {
                    tracing::debug!(user_id, attempt, error = %e, "User update contended, retrying");
                    tokio::time::sleep(Duration::from_millis(25 << attempt.min(5))).await;
                    attempt += 1;
                }
                UpdateAttempt::Contended(e) => {
                    return Err(AppError::Database(format!(
                        "User update failed after {} attempts: {}",
                        attempt, e
                    )))
                }
            }
        }
    }
}

#[async_trait]
impl CatalogStore for FirestoreDb {
    async fn insert_exercise_if_absent(&self, exercise: &Exercise) -> Result<bool, AppError> {
        let result: Result<Exercise, FirestoreError> = self
            .client
            .fluent()
            .insert()
            .into(collections::EXERCISES)
            .document_id(claim_doc_id(&exercise.id))
            .object(exercise)
            .execute()
            .await;

        match result {
            Ok(_) => Ok(true),
            Err(FirestoreError::DataConflictError(_)) => Ok(false),
            Err(e) => Err(AppError::Database(e.to_string())),
        }
    }

    async fn list_exercises(&self, filter: &ExerciseFilter) -> Result<Vec<Exercise>, AppError> {
        let muscle = filter.muscle.clone();
        let equipment = filter.equipment.clone();

        let mut exercises: Vec<Exercise> = self
            .client
            .fluent()
            .select()
            .from(collections::EXERCISES)
            .filter(move |q| {
                q.for_all([
                    muscle
                        .as_ref()
                        .and_then(|m| q.field("target").eq(m.clone())),
                    equipment
                        .as_ref()
                        .and_then(|e| q.field("equipment").eq(e.clone())),
                ])
            })
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        // Sorted here rather than in the query to avoid a composite index per filter
        exercises.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(exercises)
    }

    async fn ensure_category(
        &self,
        kind: CategoryKind,
        name: &str,
    ) -> Result<Category, AppError> {
        let category = Category {
            name: name.to_string(),
        };

        let result: Result<Category, FirestoreError> = self
            .client
            .fluent()
            .insert()
            .into(category_collection(kind))
            .document_id(claim_doc_id(name))
            .object(&category)
            .execute()
            .await;

        match result {
            Ok(stored) => Ok(stored),
            Err(FirestoreError::DataConflictError(_)) => Ok(category),
            Err(e) => Err(AppError::Database(e.to_string())),
        }
    }

    async fn list_categories(&self, kind: CategoryKind) -> Result<Vec<Category>, AppError> {
        let mut categories: Vec<Category> = self
            .client
            .fluent()
            .select()
            .from(category_collection(kind))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }
}

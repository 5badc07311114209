// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Salted password hashing (PBKDF2-HMAC-SHA512).
//!
//! The parameters below are shared by every stored credential. Changing any of
//! them makes existing hashes unverifiable, so a change needs a versioned
//! migration rather than an edit here.
//!
//! The salt is stored hex-encoded and the *hex text* is what feeds the KDF,
//! which keeps hashes compatible with accounts created before this service.

use crate::error::AppError;
use crate::models::User;
use ring::pbkdf2;
use ring::rand::{SecureRandom, SystemRandom};
use std::num::NonZeroU32;

static PBKDF2_ALG: pbkdf2::Algorithm = pbkdf2::PBKDF2_HMAC_SHA512;

const PBKDF2_ITERATIONS: NonZeroU32 = match NonZeroU32::new(1000) {
    Some(n) => n,
    None => panic!("iteration count must be non-zero"),
};

/// Random salt length in bytes (before hex encoding).
pub const SALT_LEN: usize = 16;

/// Derived hash length in bytes (before hex encoding).
pub const HASH_LEN: usize = 64;

/// Generate a fresh salt and store the derived hash on `user`.
///
/// Overwrites any credential material already present.
pub fn set_password(user: &mut User, password: &str) -> Result<(), AppError> {
    let mut salt_bytes = [0u8; SALT_LEN];
    SystemRandom::new()
        .fill(&mut salt_bytes)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("Failed to generate password salt")))?;
    let salt = hex::encode(salt_bytes);

    let mut hash = [0u8; HASH_LEN];
    pbkdf2::derive(
        PBKDF2_ALG,
        PBKDF2_ITERATIONS,
        salt.as_bytes(),
        password.as_bytes(),
        &mut hash,
    );

    user.salt = Some(salt);
    user.hash = Some(hex::encode(hash));
    Ok(())
}

/// Check `candidate` against the stored credential material.
///
/// Accounts without a salt or hash (Google sign-in) never validate.
pub fn validate_password(user: &User, candidate: &str) -> bool {
    let (Some(salt), Some(hash)) = (user.salt.as_deref(), user.hash.as_deref()) else {
        return false;
    };

    let Ok(expected) = hex::decode(hash) else {
        tracing::warn!(user_id = %user.id, "Stored password hash is not valid hex");
        return false;
    };

    // Constant-time comparison inside ring
    pbkdf2::verify(
        PBKDF2_ALG,
        PBKDF2_ITERATIONS,
        salt.as_bytes(),
        candidate.as_bytes(),
        &expected,
    )
    .is_ok()
}

/// [`set_password`] on the blocking pool, so the KDF does not stall the runtime.
pub async fn set_password_blocking(mut user: User, password: String) -> Result<User, AppError> {
    tokio::task::spawn_blocking(move || {
        set_password(&mut user, &password)?;
        Ok(user)
    })
    .await
    .map_err(|e| AppError::Internal(anyhow::anyhow!("Password hashing task failed: {}", e)))?
}

/// [`validate_password`] on the blocking pool. Returns the user alongside the result.
pub async fn validate_password_blocking(
    user: User,
    candidate: String,
) -> Result<(User, bool), AppError> {
    tokio::task::spawn_blocking(move || {
        let valid = validate_password(&user, &candidate);
        (user, valid)
    })
    .await
    .map_err(|e| AppError::Internal(anyhow::anyhow!("Password check task failed: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_user() -> User {
        User::new("a@x.com", "a")
    }

    #[test]
    fn test_validate_after_set() {
        let mut user = test_user();
        set_password(&mut user, "correct horse").unwrap();

        assert!(validate_password(&user, "correct horse"));
        assert!(!validate_password(&user, "correct horse "));
        assert!(!validate_password(&user, "Correct horse"));
        assert!(!validate_password(&user, ""));
    }

    #[test]
    fn test_salt_and_hash_lengths() {
        let mut user = test_user();
        set_password(&mut user, "p").unwrap();

        assert_eq!(user.salt.as_ref().unwrap().len(), SALT_LEN * 2);
        assert_eq!(user.hash.as_ref().unwrap().len(), HASH_LEN * 2);
    }

    #[test]
    fn test_same_password_gets_distinct_salts() {
        let mut first = test_user();
        let mut second = test_user();
        set_password(&mut first, "same").unwrap();
        set_password(&mut second, "same").unwrap();

        assert_ne!(first.salt, second.salt);
        assert_ne!(first.hash, second.hash);
    }

    #[test]
    fn test_reset_overwrites_old_password() {
        let mut user = test_user();
        set_password(&mut user, "old").unwrap();
        set_password(&mut user, "new").unwrap();

        assert!(validate_password(&user, "new"));
        assert!(!validate_password(&user, "old"));
    }

    #[test]
    fn test_missing_credentials_never_validate() {
        let user = test_user();
        assert!(!validate_password(&user, ""));
        assert!(!validate_password(&user, "anything"));
    }

    #[test]
    fn test_corrupt_hash_does_not_validate() {
        let mut user = test_user();
        set_password(&mut user, "p").unwrap();
        user.hash = Some("not-hex".to_string());
        assert!(!validate_password(&user, "p"));
    }

    #[test]
    fn test_salt_text_feeds_kdf() {
        // Stored records derive over the hex salt text, not the decoded bytes
        let mut user = test_user();
        user.salt = Some("00112233445566778899aabbccddeeff".to_string());
        let mut hash = [0u8; HASH_LEN];
        pbkdf2::derive(
            PBKDF2_ALG,
            PBKDF2_ITERATIONS,
            b"00112233445566778899aabbccddeeff",
            b"hunter2",
            &mut hash,
        );
        user.hash = Some(hex::encode(hash));

        assert!(validate_password(&user, "hunter2"));
    }

    #[tokio::test]
    async fn test_blocking_wrappers() {
        let user = set_password_blocking(test_user(), "p".to_string())
            .await
            .unwrap();
        let (_, valid) = validate_password_blocking(user, "p".to_string())
            .await
            .unwrap();
        assert!(valid);
    }
}

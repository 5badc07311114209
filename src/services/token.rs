// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Access token issuance and verification (HS256 JWT).

use crate::models::User;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Token lifetime: one hour from issue.
pub const TOKEN_TTL_SECS: u64 = 60 * 60;

/// JWT claims structure.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// Issued at (Unix timestamp)
    pub iat: u64,
    /// Expiration time (Unix timestamp)
    pub exp: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    /// Bad signature, malformed structure, or past `exp`.
    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Failed to sign token: {0}")]
    Signing(String),
}

/// Issues and verifies access tokens with a process-wide secret.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenService {
    pub fn new(secret: &[u8]) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
        }
    }

    /// Issue a token whose subject is the user's ID.
    pub fn issue(&self, user: &User) -> Result<String, TokenError> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| TokenError::Signing(format!("System time error: {}", e)))?
            .as_secs();
        self.issue_at(&user.id, now)
    }

    fn issue_at(&self, subject: &str, issued_at: u64) -> Result<String, TokenError> {
        let claims = Claims {
            sub: subject.to_string(),
            iat: issued_at,
            exp: issued_at + TOKEN_TTL_SECS,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    /// Verify signature, structure and expiry, returning the claims.
    pub fn decode(&self, token: &str) -> Result<Claims, TokenError> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
            tracing::debug!(error = %e, "Token rejected");
            TokenError::InvalidToken
        })?;

        if data.claims.sub.is_empty() {
            return Err(TokenError::InvalidToken);
        }

        Ok(data.claims)
    }
}

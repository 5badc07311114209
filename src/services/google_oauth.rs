// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Google OAuth 2.0 authorization-code flow.
//!
//! Handles:
//! - Authorization URL construction with an HMAC-signed `state`
//! - Code exchange and userinfo lookup
//! - Conversion of the Google profile into a [`FederatedProfile`]

use crate::config::Config;
use crate::services::identity::FederatedProfile;
use anyhow::Context;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

type HmacSha256 = Hmac<Sha256>;

const AUTHORIZE_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const USERINFO_URL: &str = "https://openidconnect.googleapis.com/v1/userinfo";
const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// How long a signed `state` stays acceptable.
pub const STATE_MAX_AGE: Duration = Duration::from_secs(10 * 60);

/// Callback path registered with Google.
pub const CALLBACK_PATH: &str = "/auth/google/callback";

/// Google OAuth client.
#[derive(Clone)]
pub struct GoogleOAuthClient {
    http: reqwest::Client,
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    state_key: Vec<u8>,
}

impl GoogleOAuthClient {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .context("failed building Google OAuth HTTP client")?;

        Ok(Self {
            http,
            client_id: config.google_client_id.clone(),
            client_secret: config.google_client_secret.clone(),
            redirect_uri: format!(
                "{}{}",
                config.api_base_url.trim_end_matches('/'),
                CALLBACK_PATH
            ),
            state_key: config.oauth_state_key.clone(),
        })
    }

    /// URL to send the browser to, with a freshly signed state.
    pub fn authorization_url(&self) -> anyhow::Result<String> {
        let state = sign_state(&self.state_key, now_millis()?)?;

        Ok(format!(
            "{}?client_id={}&redirect_uri={}&response_type=code&scope={}&state={}",
            AUTHORIZE_URL,
            urlencoding::encode(&self.client_id),
            urlencoding::encode(&self.redirect_uri),
            urlencoding::encode("openid profile email"),
            state
        ))
    }

    /// Check a `state` returned on the callback.
    pub fn verify_state(&self, state: &str) -> bool {
        match now_millis() {
            Ok(now) => verify_state(&self.state_key, state, now),
            Err(_) => false,
        }
    }

    /// Exchange an authorization code for the signed-in user's profile.
    pub async fn exchange_code(&self, code: &str) -> anyhow::Result<FederatedProfile> {
        let response = self
            .http
            .post(TOKEN_URL)
            .form(&[
                ("code", code),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await
            .context("token exchange request failed")?;

        let tokens: TokenResponse = check_json(response)
            .await
            .context("token exchange rejected")?;

        let response = self
            .http
            .get(USERINFO_URL)
            .bearer_auth(&tokens.access_token)
            .send()
            .await
            .context("userinfo request failed")?;

        let info: UserInfo = check_json(response)
            .await
            .context("userinfo request rejected")?;

        info.into_profile()
    }
}

/// Token endpoint response (only the field we use).
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// OpenID Connect userinfo response.
#[derive(Debug, Deserialize)]
struct UserInfo {
    sub: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    email: Option<String>,
}

impl UserInfo {
    fn into_profile(self) -> anyhow::Result<FederatedProfile> {
        let email = self
            .email
            .filter(|e| !e.is_empty())
            .context("Google profile has no email address")?;

        let display_name = self
            .name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| email.split('@').next().unwrap_or_default().to_string());

        Ok(FederatedProfile {
            provider_id: self.sub,
            display_name,
            email,
        })
    }
}

async fn check_json<T: for<'de> Deserialize<'de>>(response: reqwest::Response) -> anyhow::Result<T> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        anyhow::bail!("HTTP {}: {}", status, body);
    }
    response.json().await.context("JSON parse error")
}

fn now_millis() -> anyhow::Result<u128> {
    Ok(SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .context("System time error")?
        .as_millis())
}

/// Build `base64url("timestamp_hex|signature_hex")`.
fn sign_state(key: &[u8], timestamp_ms: u128) -> anyhow::Result<String> {
    let payload = format!("{:x}", timestamp_ms);

    let mut mac = HmacSha256::new_from_slice(key)
        .map_err(|e| anyhow::anyhow!("HMAC init failed: {}", e))?;
    mac.update(payload.as_bytes());
    let signature = hex::encode(mac.finalize().into_bytes());

    Ok(URL_SAFE_NO_PAD.encode(format!("{}|{}", payload, signature)))
}

/// Verify signature and age of a state produced by [`sign_state`].
fn verify_state(key: &[u8], state: &str, now_ms: u128) -> bool {
    let Some(state_str) = URL_SAFE_NO_PAD
        .decode(state)
        .ok()
        .and_then(|bytes| String::from_utf8(bytes).ok())
    else {
        return false;
    };

    let Some((payload, signature_hex)) = state_str.split_once('|') else {
        return false;
    };
    let Ok(signature) = hex::decode(signature_hex) else {
        return false;
    };

    let Ok(mut mac) = HmacSha256::new_from_slice(key) else {
        return false;
    };
    mac.update(payload.as_bytes());
    if mac.verify_slice(&signature).is_err() {
        tracing::warn!("OAuth state signature mismatch");
        return false;
    }

    let Ok(issued_ms) = u128::from_str_radix(payload, 16) else {
        return false;
    };
    issued_ms <= now_ms && now_ms - issued_ms <= STATE_MAX_AGE.as_millis()
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &[u8] = b"secret_key";
    const NOW: u128 = 1_700_000_000_000;

    #[test]
    fn test_state_roundtrip() {
        let state = sign_state(KEY, NOW).unwrap();
        assert!(verify_state(KEY, &state, NOW + 1_000));
    }

    #[test]
    fn test_state_is_url_safe() {
        let state = sign_state(KEY, NOW).unwrap();
        assert!(!state.contains('+'));
        assert!(!state.contains('/'));
        assert!(!state.contains('='));
    }

    #[test]
    fn test_state_wrong_key() {
        let state = sign_state(KEY, NOW).unwrap();
        assert!(!verify_state(b"wrong_key", &state, NOW));
    }

    #[test]
    fn test_state_expired() {
        let state = sign_state(KEY, NOW).unwrap();
        let late = NOW + STATE_MAX_AGE.as_millis() + 1;
        assert!(!verify_state(KEY, &state, late));
    }

    #[test]
    fn test_state_from_future_rejected() {
        let state = sign_state(KEY, NOW + 60_000).unwrap();
        assert!(!verify_state(KEY, &state, NOW));
    }

    #[test]
    fn test_state_tampered_timestamp() {
        let state = sign_state(KEY, NOW).unwrap();
        let decoded = String::from_utf8(URL_SAFE_NO_PAD.decode(&state).unwrap()).unwrap();
        let (_, signature) = decoded.split_once('|').unwrap();
        let forged = URL_SAFE_NO_PAD.encode(format!("{:x}|{}", NOW + 5, signature));
        assert!(!verify_state(KEY, &forged, NOW + 10));
    }

    #[test]
    fn test_state_malformed() {
        assert!(!verify_state(KEY, "not-valid-base64!!!", NOW));
        assert!(!verify_state(KEY, &URL_SAFE_NO_PAD.encode("no-separator"), NOW));
        assert!(!verify_state(KEY, &URL_SAFE_NO_PAD.encode("abc|zz"), NOW));
        assert!(!verify_state(KEY, "", NOW));
    }

    #[test]
    fn test_authorization_url() {
        let client = GoogleOAuthClient::new(&Config::test_default()).unwrap();
        let url = client.authorization_url().unwrap();

        assert!(url.starts_with(AUTHORIZE_URL));
        assert!(url.contains("client_id=test_google_client_id"));
        assert!(url.contains(&format!(
            "redirect_uri={}",
            urlencoding::encode("http://localhost:8080/auth/google/callback")
        )));
        assert!(url.contains("response_type=code"));

        let state = url.split("state=").nth(1).unwrap();
        assert!(client.verify_state(state));
    }

    #[test]
    fn test_userinfo_into_profile() {
        let info: UserInfo = serde_json::from_value(serde_json::json!({
            "sub": "1234567890",
            "name": "Jane Lifter",
            "email": "jane@example.com",
            "email_verified": true
        }))
        .unwrap();

        let profile = info.into_profile().unwrap();
        assert_eq!(profile.provider_id, "1234567890");
        assert_eq!(profile.display_name, "Jane Lifter");
        assert_eq!(profile.email, "jane@example.com");
    }

    #[test]
    fn test_userinfo_without_name_uses_email_local_part() {
        let info = UserInfo {
            sub: "1".to_string(),
            name: None,
            email: Some("jane@example.com".to_string()),
        };
        assert_eq!(info.into_profile().unwrap().display_name, "jane");
    }

    #[test]
    fn test_userinfo_without_email_fails() {
        let info = UserInfo {
            sub: "1".to_string(),
            name: Some("Jane".to_string()),
            email: None,
        };
        assert!(info.into_profile().is_err());
    }
}

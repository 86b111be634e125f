//! Session gate: who owns the garden right now.
//!
//! Against a configured Supabase project this wraps the auth REST API
//! (password sign-in, sign-up, sign-out, token refresh) and caches the
//! session in ~/.leaflink/session.json. Without one, leaflink runs as a
//! fixed demo identity and none of the auth calls are available.
//!
//! Identity changes (sign-in/sign-out) are published on a broadcast
//! channel so a running shell can reload the garden when the user changes.

use crate::config::Config;
use crate::logging;
use crate::storage;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::sync::broadcast;

/// Sentinel owner used when no auth backend is configured.
pub const DEMO_USER: &str = "demo-user";

/// Cached auth session, one per device.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredSession {
    pub email: String,
    pub access_token: String,
    pub refresh_token: String,
    /// Unix millis; access token is stale at or past this instant.
    pub expires_at: i64,
}

impl StoredSession {
    pub fn is_expired(&self, now_ms: i64) -> bool {
        self.expires_at <= now_ms
    }
}

fn session_path() -> Result<PathBuf> {
    Ok(storage::leaflink_dir()?.join("session.json"))
}

pub fn load_session() -> Result<StoredSession> {
    let path = session_path()?;
    storage::read_json(&path).with_context(|| "No stored session")
}

fn save_session(session: &StoredSession) -> Result<()> {
    storage::write_json(&session_path()?, session)
}

fn clear_session() {
    if let Ok(path) = session_path() {
        let _ = std::fs::remove_file(path);
    }
}

/// Auth token response, shared by the password, refresh and signup grants.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    refresh_token: Option<String>,
    expires_in: Option<i64>,
    user: Option<AuthUser>,
}

#[derive(Debug, Deserialize)]
struct AuthUser {
    email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AuthError {
    #[serde(default)]
    error_description: Option<String>,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl AuthError {
    fn into_message(self, status: reqwest::StatusCode) -> String {
        self.error_description
            .or(self.msg)
            .or(self.message)
            .unwrap_or_else(|| format!("auth request failed with status {}", status))
    }
}

pub struct SessionGate {
    client: reqwest::Client,
    base_url: Option<String>,
    anon_key: Option<String>,
    changes: broadcast::Sender<Option<String>>,
}

impl SessionGate {
    pub fn new(config: &Config) -> Self {
        let (changes, _) = broadcast::channel(16);
        let configured = config.supabase.is_configured();
        Self {
            client: reqwest::Client::new(),
            base_url: configured
                .then(|| config.supabase.url.clone().unwrap_or_default())
                .map(|u| u.trim_end_matches('/').to_string()),
            anon_key: configured
                .then(|| config.supabase.anon_key.clone().unwrap_or_default()),
            changes,
        }
    }

    /// Whether an auth backend exists at all. False means demo mode.
    pub fn is_configured(&self) -> bool {
        self.base_url.is_some()
    }

    /// Subscribe to identity changes: `Some(email)` after sign-in,
    /// `None` after sign-out.
    pub fn subscribe(&self) -> broadcast::Receiver<Option<String>> {
        self.changes.subscribe()
    }

    /// The current owner identity: the demo sentinel in demo mode, the
    /// signed-in user's email when a usable session exists, else None
    /// (sign-in required). Refreshes an expired access token in place.
    pub async fn current_identity(&self) -> Option<String> {
        if !self.is_configured() {
            return Some(DEMO_USER.to_string());
        }

        let session = load_session().ok()?;
        let now_ms = chrono::Utc::now().timestamp_millis();
        if !session.is_expired(now_ms) {
            return Some(session.email);
        }

        match self.refresh(&session).await {
            Ok(refreshed) => Some(refreshed.email),
            Err(e) => {
                logging::warn(&format!("Session refresh failed: {}", e));
                None
            }
        }
    }

    /// The current session's access token, for authenticating store calls.
    pub async fn access_token(&self) -> Option<String> {
        if !self.is_configured() {
            return None;
        }
        let session = load_session().ok()?;
        let now_ms = chrono::Utc::now().timestamp_millis();
        if !session.is_expired(now_ms) {
            return Some(session.access_token);
        }
        self.refresh(&session).await.ok().map(|s| s.access_token)
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<String> {
        let (url, key) = self.endpoint("token?grant_type=password")?;
        let resp = self
            .client
            .post(&url)
            .header("apikey", &key)
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await?;

        let tokens = Self::parse_token_response(resp).await?;
        let session = self.store_tokens(email, tokens)?;
        let _ = self.changes.send(Some(session.email.clone()));
        Ok(session.email)
    }

    /// Create an account. Supabase may withhold the session until the email
    /// is confirmed; in that case no session is stored and the caller should
    /// tell the user to check their inbox.
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<Option<String>> {
        let (url, key) = self.endpoint("signup")?;
        let resp = self
            .client
            .post(&url)
            .header("apikey", &key)
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await?;

        let tokens = Self::parse_token_response(resp).await?;
        if tokens.access_token.is_none() {
            return Ok(None);
        }
        let session = self.store_tokens(email, tokens)?;
        let _ = self.changes.send(Some(session.email.clone()));
        Ok(Some(session.email))
    }

    pub async fn sign_out(&self) -> Result<()> {
        if let Ok(session) = load_session() {
            if let Ok((url, key)) = self.endpoint("logout") {
                let result = self
                    .client
                    .post(&url)
                    .header("apikey", &key)
                    .header("Authorization", format!("Bearer {}", session.access_token))
                    .send()
                    .await;
                if let Err(e) = result {
                    // Local sign-out still proceeds
                    logging::warn(&format!("Remote logout failed: {}", e));
                }
            }
        }
        clear_session();
        let _ = self.changes.send(None);
        Ok(())
    }

    async fn refresh(&self, session: &StoredSession) -> Result<StoredSession> {
        let (url, key) = self.endpoint("token?grant_type=refresh_token")?;
        let resp = self
            .client
            .post(&url)
            .header("apikey", &key)
            .json(&serde_json::json!({ "refresh_token": session.refresh_token }))
            .send()
            .await?;

        let tokens = Self::parse_token_response(resp).await?;
        self.store_tokens(&session.email, tokens)
    }

    fn endpoint(&self, path: &str) -> Result<(String, String)> {
        let base = self
            .base_url
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("No auth backend configured (demo mode)"))?;
        let key = self.anon_key.clone().unwrap_or_default();
        Ok((format!("{}/auth/v1/{}", base, path), key))
    }

    async fn parse_token_response(resp: reqwest::Response) -> Result<TokenResponse> {
        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            let err: AuthError = serde_json::from_str(&body).unwrap_or(AuthError {
                error_description: None,
                msg: None,
                message: None,
            });
            anyhow::bail!("{}", err.into_message(status));
        }
        Ok(serde_json::from_str(&body)?)
    }

    fn store_tokens(&self, fallback_email: &str, tokens: TokenResponse) -> Result<StoredSession> {
        let access_token = tokens
            .access_token
            .ok_or_else(|| anyhow::anyhow!("Auth response carried no access token"))?;
        let expires_in = tokens.expires_in.unwrap_or(3600);
        let email = tokens
            .user
            .and_then(|u| u.email)
            .unwrap_or_else(|| fallback_email.to_string());

        let session = StoredSession {
            email,
            access_token,
            refresh_token: tokens.refresh_token.unwrap_or_default(),
            expires_at: chrono::Utc::now().timestamp_millis() + expires_in * 1000,
        };
        save_session(&session)?;
        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_demo_identity_when_unconfigured() {
        let gate = SessionGate::new(&Config::default());
        assert!(!gate.is_configured());
        assert_eq!(gate.current_identity().await.as_deref(), Some(DEMO_USER));
        assert!(gate.access_token().await.is_none());
        // Auth calls are refused outright in demo mode
        assert!(gate.sign_in("a@x.io", "pw").await.is_err());
    }

    #[test]
    fn test_stored_session_expiry() {
        let session = StoredSession {
            email: "fern@example.com".to_string(),
            access_token: "at".to_string(),
            refresh_token: "rt".to_string(),
            expires_at: 1_000,
        };
        assert!(!session.is_expired(999));
        assert!(session.is_expired(1_000));
        assert!(session.is_expired(1_001));
    }

    #[test]
    fn test_parse_token_response_shape() {
        let body = r#"{
            "access_token": "jwt",
            "token_type": "bearer",
            "expires_in": 3600,
            "refresh_token": "refresh",
            "user": { "id": "u1", "email": "fern@example.com" }
        }"#;
        let tokens: TokenResponse = serde_json::from_str(body).unwrap();
        assert_eq!(tokens.access_token.as_deref(), Some("jwt"));
        assert_eq!(tokens.expires_in, Some(3600));
        assert_eq!(
            tokens.user.unwrap().email.as_deref(),
            Some("fern@example.com")
        );
    }

    #[test]
    fn test_auth_error_message_precedence() {
        let err: AuthError =
            serde_json::from_str(r#"{"error_description":"Invalid login credentials"}"#).unwrap();
        assert_eq!(
            err.into_message(reqwest::StatusCode::BAD_REQUEST),
            "Invalid login credentials"
        );

        let err: AuthError = serde_json::from_str(r#"{"msg":"User already registered"}"#).unwrap();
        assert_eq!(
            err.into_message(reqwest::StatusCode::UNPROCESSABLE_ENTITY),
            "User already registered"
        );

        let err: AuthError = serde_json::from_str("{}").unwrap();
        assert_eq!(
            err.into_message(reqwest::StatusCode::BAD_REQUEST),
            "auth request failed with status 400 Bad Request"
        );
    }
}

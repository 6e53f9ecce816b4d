//! Session creation and refresh against the PDS
//!
//! A [`Session`] is obtained from [`SessionManager::create_session`] and
//! replaced wholesale by [`SessionManager::refresh_session`]. The manager
//! keeps no state of its own; persisting sessions is the job of a
//! [`SessionStore`](crate::store::SessionStore).

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::error::{Result, XrpcError};
use crate::xrpc::{RawResponse, XrpcClient, CREATE_SESSION, REFRESH_SESSION};

/// Tokens and identity returned by `createSession` / `refreshSession`
///
/// Field names on the wire (and in the stored file) follow the auth
/// response: `accessJwt`, `refreshJwt`, `handle`, `did`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    #[serde(rename = "accessJwt")]
    pub access_token: String,
    #[serde(rename = "refreshJwt")]
    pub refresh_token: String,
    pub handle: String,
    pub did: String,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .field("handle", &self.handle)
            .field("did", &self.did)
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Access token not known to be expired
    Active,
    /// Access token `exp` is in the past; refresh before posting
    Expired,
}

#[derive(Debug, Deserialize)]
struct JwtClaims {
    exp: Option<i64>,
}

impl Session {
    /// Expiry of the access token, read from its JWT `exp` claim
    ///
    /// `None` when the token is not a decodable JWT or carries no `exp`.
    pub fn access_expires_at(&self) -> Option<DateTime<Utc>> {
        let payload = self.access_token.split('.').nth(1)?;
        let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
        let claims: JwtClaims = serde_json::from_slice(&bytes).ok()?;
        DateTime::from_timestamp(claims.exp?, 0)
    }

    /// Classify the session at `now`
    ///
    /// Tokens without a readable expiry count as active; the server stays
    /// the authority on whether they are accepted.
    pub fn state(&self, now: DateTime<Utc>) -> SessionState {
        match self.access_expires_at() {
            Some(expires_at) if expires_at <= now => SessionState::Expired,
            _ => SessionState::Active,
        }
    }
}

/// Login identifier and app password
pub struct Credentials {
    pub identifier: String,
    pub password: SecretString,
}

impl Credentials {
    pub fn new(identifier: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            identifier: normalize_handle(&identifier.into()).to_string(),
            password: SecretString::from(password.into()),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("identifier", &self.identifier)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

#[derive(Serialize)]
struct CreateSessionInput<'a> {
    identifier: &'a str,
    password: &'a str,
}

/// Strip a leading `@` from a user-supplied handle
pub fn normalize_handle(handle: &str) -> &str {
    handle.trim().trim_start_matches('@')
}

#[derive(Debug, Clone)]
pub struct SessionManager {
    client: XrpcClient,
}

impl SessionManager {
    pub fn new(client: XrpcClient) -> Self {
        Self { client }
    }

    /// Log in with an identifier and app password
    ///
    /// # Errors
    ///
    /// - `XrpcError::Auth` with the status and raw body when the server
    ///   answers with anything but a 2xx
    /// - `XrpcError::Transport` / `XrpcError::Decode` for network or body
    ///   failures
    pub async fn create_session(&self, credentials: &Credentials) -> Result<Session> {
        let url = self.client.endpoint(CREATE_SESSION)?;
        tracing::debug!("Creating session for {}", credentials.identifier);

        let input = CreateSessionInput {
            identifier: &credentials.identifier,
            password: credentials.password.expose_secret(),
        };
        let response = self
            .client
            .http()
            .post(url)
            .json(&input)
            .send()
            .await
            .map_err(XrpcError::from)?;
        let raw = RawResponse::read(response).await?;

        if !raw.status.is_success() {
            tracing::warn!(
                "Error response. Status Code: {} ({})",
                raw.status.as_u16(),
                raw.error_summary().unwrap_or_else(|| "no XRPC error body".to_string())
            );
            return Err(raw.status_error("create session").into());
        }

        let session: Session = raw.json()?;
        tracing::debug!("Session created for {} ({})", session.handle, session.did);
        Ok(session)
    }

    /// Exchange a refresh token for a fresh pair of tokens
    ///
    /// # Errors
    ///
    /// `XrpcError::Auth` carrying the status and body verbatim for any
    /// non-200 answer, `XrpcError::Transport` / `XrpcError::Decode` otherwise.
    pub async fn refresh_session(&self, refresh_token: &str) -> Result<Session> {
        let url = self.client.endpoint(REFRESH_SESSION)?;
        tracing::debug!("Refreshing session");

        let response = self
            .client
            .http()
            .post(url)
            .bearer_auth(refresh_token)
            .send()
            .await
            .map_err(XrpcError::from)?;
        let raw = RawResponse::read(response).await?;

        if raw.status != StatusCode::OK {
            return Err(raw.status_error("refresh session").into());
        }

        let session: Session = raw.json()?;
        tracing::debug!("Session refreshed for {}", session.handle);
        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn jwt_with_exp(exp: i64) -> String {
        let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"ES256K","typ":"at+jwt"}"#);
        let payload = URL_SAFE_NO_PAD.encode(format!(r#"{{"scope":"com.atproto.access","exp":{}}}"#, exp));
        format!("{}.{}.c2lnbmF0dXJl", header, payload)
    }

    fn session_with_access(access_token: String) -> Session {
        Session {
            access_token,
            refresh_token: "refresh-token-value".to_string(),
            handle: "alice.bsky.social".to_string(),
            did: "did:plc:abc123".to_string(),
        }
    }

    #[test]
    fn test_session_wire_field_names() {
        let session = session_with_access("access".to_string());
        let value = serde_json::to_value(&session).unwrap();

        assert_eq!(value["accessJwt"], "access");
        assert_eq!(value["refreshJwt"], "refresh-token-value");
        assert_eq!(value["handle"], "alice.bsky.social");
        assert_eq!(value["did"], "did:plc:abc123");
    }

    #[test]
    fn test_session_ignores_extra_response_fields() {
        let body = r#"{
            "accessJwt": "a",
            "refreshJwt": "r",
            "handle": "alice.bsky.social",
            "did": "did:plc:abc123",
            "email": "alice@example.com",
            "active": true
        }"#;
        let session: Session = serde_json::from_str(body).unwrap();
        assert_eq!(session.did, "did:plc:abc123");
    }

    #[test]
    fn test_session_debug_redacts_tokens() {
        let session = session_with_access("secret-access".to_string());
        let debug = format!("{:?}", session);

        assert!(!debug.contains("secret-access"));
        assert!(!debug.contains("refresh-token-value"));
        assert!(debug.contains("alice.bsky.social"));
    }

    #[test]
    fn test_access_expiry_decoded_from_jwt() {
        let session = session_with_access(jwt_with_exp(1_700_000_000));
        let expires_at = session.access_expires_at().unwrap();
        assert_eq!(expires_at.timestamp(), 1_700_000_000);
    }

    #[test]
    fn test_state_active_and_expired() {
        let now = Utc::now();
        let future = session_with_access(jwt_with_exp((now + Duration::hours(2)).timestamp()));
        let past = session_with_access(jwt_with_exp((now - Duration::minutes(1)).timestamp()));

        assert_eq!(future.state(now), SessionState::Active);
        assert_eq!(past.state(now), SessionState::Expired);
    }

    #[test]
    fn test_opaque_token_counts_as_active() {
        let session = session_with_access("not-a-jwt".to_string());
        assert_eq!(session.access_expires_at(), None);
        assert_eq!(session.state(Utc::now()), SessionState::Active);
    }

    #[test]
    fn test_credentials_normalize_and_redact() {
        let credentials = Credentials::new("@alice.bsky.social", "app-pass-word");
        assert_eq!(credentials.identifier, "alice.bsky.social");
        assert_eq!(credentials.password.expose_secret(), "app-pass-word");
        assert!(!format!("{:?}", credentials).contains("app-pass-word"));
    }

    #[test]
    fn test_normalize_handle() {
        assert_eq!(normalize_handle("@bob.test"), "bob.test");
        assert_eq!(normalize_handle(" bob.test "), "bob.test");
        assert_eq!(normalize_handle("bob.test"), "bob.test");
    }
}

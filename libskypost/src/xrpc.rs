//! Thin XRPC transport over `reqwest`
//!
//! Every call is a single request/response exchange. There is no retry and
//! no backoff; the only policy applied is the request timeout from
//! [`ServiceConfig`].

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use url::Url;

use crate::config::ServiceConfig;
use crate::error::{ConfigError, Result, XrpcError};

pub const CREATE_SESSION: &str = "com.atproto.server.createSession";
pub const REFRESH_SESSION: &str = "com.atproto.server.refreshSession";
pub const RESOLVE_HANDLE: &str = "com.atproto.identity.resolveHandle";
pub const CREATE_RECORD: &str = "com.atproto.repo.createRecord";

#[derive(Debug, Clone)]
pub struct XrpcClient {
    http: reqwest::Client,
    base_url: Url,
}

impl XrpcClient {
    /// Create a client rooted at `base_url`
    ///
    /// # Errors
    ///
    /// `ConfigError::InvalidValue` if the URL does not parse, or
    /// `XrpcError::Transport` if the HTTP client cannot be built.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let mut base_url = Url::parse(base_url).map_err(|e| ConfigError::InvalidValue {
            field: "service.pds_url".to_string(),
            reason: e.to_string(),
        })?;

        // Url::join replaces the last path segment unless the path ends in '/'
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("skypost/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(XrpcError::from)?;

        Ok(Self { http, base_url })
    }

    pub fn from_config(config: &ServiceConfig) -> Result<Self> {
        Self::new(&config.pds_url, config.timeout())
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Full URL of an XRPC method, e.g. `https://bsky.social/xrpc/<nsid>`
    pub fn endpoint(&self, nsid: &str) -> Result<Url> {
        self.base_url
            .join(&format!("xrpc/{}", nsid))
            .map_err(|e| {
                ConfigError::InvalidValue {
                    field: "xrpc method".to_string(),
                    reason: format!("{}: {}", nsid, e),
                }
                .into()
            })
    }
}

/// Status and body of a finished exchange
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: StatusCode,
    pub body: String,
}

/// Error envelope XRPC servers return alongside non-2xx statuses
#[derive(Debug, Clone, Deserialize)]
pub struct XrpcErrorBody {
    pub error: Option<String>,
    pub message: Option<String>,
}

impl RawResponse {
    /// Drain the body of `response`
    pub async fn read(response: reqwest::Response) -> std::result::Result<Self, XrpcError> {
        let status = response.status();
        let body = response.text().await?;
        Ok(Self { status, body })
    }

    pub fn json<T: DeserializeOwned>(&self) -> std::result::Result<T, XrpcError> {
        serde_json::from_str(&self.body).map_err(|e| XrpcError::Decode(e.to_string()))
    }

    /// `error: message` from an XRPC error body, if the body is one
    pub fn error_summary(&self) -> Option<String> {
        let parsed: XrpcErrorBody = serde_json::from_str(&self.body).ok()?;
        match (parsed.error, parsed.message) {
            (Some(error), Some(message)) => Some(format!("{}: {}", error, message)),
            (Some(error), None) => Some(error),
            (None, Some(message)) => Some(message),
            (None, None) => None,
        }
    }

    /// Turn a status into `XrpcError::Auth` for `operation`
    pub fn status_error(&self, operation: &str) -> XrpcError {
        XrpcError::Auth {
            operation: operation.to_string(),
            status: self.status.as_u16(),
            body: self.body.clone(),
        }
    }
}

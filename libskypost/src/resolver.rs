//! Handle to DID resolution

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::{Result, XrpcError};
use crate::xrpc::{RawResponse, XrpcClient, RESOLVE_HANDLE};

/// Maps a handle such as `alice.bsky.social` to a stable account DID
///
/// Implementations must not cache or retry; each call stands alone.
#[async_trait]
pub trait HandleResolver: Send + Sync {
    /// Resolve `handle` (without a leading `@`) to a DID
    ///
    /// # Errors
    ///
    /// `XrpcError::Resolution` when the lookup answers with a non-200 status,
    /// a body that is not JSON, or no `did`; `XrpcError::Transport` for
    /// network failures.
    async fn resolve(&self, handle: &str) -> Result<String>;
}

#[derive(Debug, Deserialize)]
struct ResolveHandleOutput {
    did: Option<String>,
}

/// Resolver backed by `com.atproto.identity.resolveHandle`
#[derive(Debug, Clone)]
pub struct XrpcHandleResolver {
    client: XrpcClient,
}

impl XrpcHandleResolver {
    pub fn new(client: XrpcClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HandleResolver for XrpcHandleResolver {
    async fn resolve(&self, handle: &str) -> Result<String> {
        let url = self.client.endpoint(RESOLVE_HANDLE)?;
        tracing::debug!("Resolving handle: {}", handle);

        let response = self
            .client
            .http()
            .get(url)
            .query(&[("handle", handle)])
            .send()
            .await
            .map_err(XrpcError::from)?;
        let raw = RawResponse::read(response).await?;

        if raw.status != reqwest::StatusCode::OK {
            return Err(XrpcError::Resolution(format!(
                "{} returned status {} for handle {}",
                RESOLVE_HANDLE, raw.status, handle
            ))
            .into());
        }

        let output: ResolveHandleOutput = raw.json().map_err(|e| {
            XrpcError::Resolution(format!("Malformed response for handle {}: {}", handle, e))
        })?;
        let did = output.did.ok_or_else(|| {
            XrpcError::Resolution(format!("DID not found in response for handle {}", handle))
        })?;

        tracing::debug!("Resolved {} to {}", handle, did);
        Ok(did)
    }
}

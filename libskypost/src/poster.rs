//! Post assembly and submission

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SkypostError, XrpcError};
use crate::resolver::HandleResolver;
use crate::richtext::{self, Facet};
use crate::session::Session;
use crate::xrpc::{RawResponse, XrpcClient, CREATE_RECORD};

pub const POST_COLLECTION: &str = "app.bsky.feed.post";

/// Bluesky rejects posts over 300 characters
pub const MAX_POST_CHARS: usize = 300;

/// The `app.bsky.feed.post` record sent to `createRecord`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostRecord {
    #[serde(rename = "$type")]
    pub record_type: String,
    pub text: String,
    #[serde(rename = "createdAt")]
    pub created_at: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub facets: Vec<Facet>,
}

impl PostRecord {
    pub fn new(text: impl Into<String>, created_at: DateTime<Utc>, facets: Vec<Facet>) -> Self {
        Self {
            record_type: POST_COLLECTION.to_string(),
            text: text.into(),
            created_at: format_timestamp(created_at),
            facets,
        }
    }
}

#[derive(Serialize)]
struct CreateRecordInput<'a> {
    repo: &'a str,
    collection: &'a str,
    record: &'a PostRecord,
}

#[derive(Deserialize)]
struct CreateRecordOutput {
    uri: Option<String>,
    cid: Option<String>,
}

/// What the PDS answered to a `createRecord` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostOutcome {
    pub status: u16,
    pub body: String,
    /// `at://` URI of the new record, when the body carried one
    pub uri: Option<String>,
    pub cid: Option<String>,
}

impl PostOutcome {
    fn from_response(raw: &RawResponse) -> Self {
        let (uri, cid) = match raw.json::<CreateRecordOutput>() {
            Ok(output) if raw.status.is_success() => (output.uri, output.cid),
            _ => (None, None),
        };
        Self {
            status: raw.status.as_u16(),
            body: raw.body.clone(),
            uri,
            cid,
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Into a `Result`, turning a non-2xx answer into `XrpcError::Rejected`
    pub fn into_result(self) -> Result<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(XrpcError::Rejected {
                operation: "create record".to_string(),
                status: self.status,
                body: self.body,
            }
            .into())
        }
    }
}

/// UTC timestamp with a literal `Z`, e.g. `2024-11-18T09:30:00Z`
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

/// Reject content the network would refuse anyway
pub fn validate_content(text: &str) -> Result<()> {
    if text.trim().is_empty() {
        return Err(SkypostError::InvalidInput(
            "Content cannot be empty".to_string(),
        ));
    }

    let chars = text.chars().count();
    if chars > MAX_POST_CHARS {
        return Err(SkypostError::InvalidInput(format!(
            "Content exceeds Bluesky's {} character limit (current: {} characters)",
            MAX_POST_CHARS, chars
        )));
    }

    Ok(())
}

/// Builds post records and sends them to `createRecord`
#[derive(Debug, Clone)]
pub struct PostSubmitter<R> {
    client: XrpcClient,
    resolver: R,
}

impl<R: HandleResolver> PostSubmitter<R> {
    pub fn new(client: XrpcClient, resolver: R) -> Self {
        Self { client, resolver }
    }

    pub fn resolver(&self) -> &R {
        &self.resolver
    }

    /// Validate `text` and compute its facets
    ///
    /// Failed mention lookups and rejected links only drop their facet.
    pub async fn build_record(&self, text: &str, now: DateTime<Utc>) -> Result<PostRecord> {
        validate_content(text)?;
        let facets = richtext::detect_facets(text, &self.resolver).await;
        Ok(PostRecord::new(text, now, facets))
    }

    /// Build a record for `text` stamped with the current time and send it
    pub async fn submit(&self, text: &str, session: &Session) -> Result<PostOutcome> {
        let record = self.build_record(text, Utc::now()).await?;
        self.submit_record(&record, session).await
    }

    /// Send an already-built record on behalf of `session`
    ///
    /// Any HTTP answer, successful or not, comes back as a [`PostOutcome`];
    /// only transport failures are errors here.
    pub async fn submit_record(&self, record: &PostRecord, session: &Session) -> Result<PostOutcome> {
        let url = self.client.endpoint(CREATE_RECORD)?;
        tracing::debug!(
            "Posting to {} as {}: {} characters, {} facets",
            url,
            session.did,
            record.text.chars().count(),
            record.facets.len()
        );

        let input = CreateRecordInput {
            repo: &session.did,
            collection: POST_COLLECTION,
            record,
        };
        let response = self
            .client
            .http()
            .post(url)
            .bearer_auth(&session.access_token)
            .json(&input)
            .send()
            .await
            .map_err(XrpcError::from)?;
        let raw = RawResponse::read(response).await?;

        tracing::info!("Response Status: {}", raw.status);
        tracing::info!("Response Body: {}", raw.body);

        Ok(PostOutcome::from_response(&raw))
    }
}

//! Span detection for mentions, links and hashtags
//!
//! The three scans are independent. Their results are never merged or
//! de-duplicated, so a `#fragment` inside a URL shows up both as part of a
//! link span and as a tag span.

use regex::Regex;
use std::ops::Range;
use std::sync::LazyLock;

use crate::error::XrpcError;

// Handle syntax mirrors DNS names: labels of 1-63 alphanumerics with inner
// hyphens, and a final label starting with a letter. Boundaries are ASCII
// only, so non-Latin text may sit directly against a mention or link.
static MENTION_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?m)(?:^|[^a-zA-Z0-9_])@(?P<handle>(?:[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?\.)+[a-zA-Z](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)",
    )
    .unwrap()
});

static URL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?m)(?:^|[^a-zA-Z0-9_])(?P<url>https?://(?:www\.)?[-a-zA-Z0-9@:%._+~#=]{1,256}\.[a-zA-Z0-9()]{1,6}(?-u:\b)[-a-zA-Z0-9()@:%_+.~#?&/=]*)",
    )
    .unwrap()
});

static TAG_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"#[a-zA-Z0-9_]+").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpanKind {
    Mention,
    Link,
    Tag,
}

/// A matched region of post text
///
/// Offsets index the UTF-8 bytes of the text and are half-open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub byte_start: usize,
    pub byte_end: usize,
    pub kind: SpanKind,
    /// Handle without `@`, full URL, or tag with its leading `#`
    pub payload: String,
}

impl Span {
    pub fn new(range: Range<usize>, kind: SpanKind, payload: impl Into<String>) -> Self {
        Self {
            byte_start: range.start,
            byte_end: range.end,
            kind,
            payload: payload.into(),
        }
    }

    pub fn range(&self) -> Range<usize> {
        self.byte_start..self.byte_end
    }

    /// Whether the span is non-empty and fits inside a text of `len` bytes
    pub fn fits(&self, len: usize) -> bool {
        self.byte_start < self.byte_end && self.byte_end <= len
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanResult {
    pub mentions: Vec<Span>,
    pub links: Vec<Span>,
    pub tags: Vec<Span>,
}

impl ScanResult {
    pub fn is_empty(&self) -> bool {
        self.mentions.is_empty() && self.links.is_empty() && self.tags.is_empty()
    }

    pub fn len(&self) -> usize {
        self.mentions.len() + self.links.len() + self.tags.len()
    }
}

/// Run all three scans over `text`
pub fn scan(text: &str) -> ScanResult {
    ScanResult {
        mentions: scan_mentions(text),
        links: scan_links(text),
        tags: scan_tags(text),
    }
}

/// `@handle` mentions; the recorded range and payload exclude the `@`
pub fn scan_mentions(text: &str) -> Vec<Span> {
    MENTION_REGEX
        .captures_iter(text)
        .filter_map(|cap| cap.name("handle"))
        .map(|handle| Span::new(handle.range(), SpanKind::Mention, handle.as_str()))
        .collect()
}

/// `http(s)://` links that also parse as absolute URLs
///
/// Matches the URL parser rejects are logged and skipped.
pub fn scan_links(text: &str) -> Vec<Span> {
    let mut spans = Vec::new();

    for cap in URL_REGEX.captures_iter(text) {
        let Some(url_match) = cap.name("url") else {
            continue;
        };
        let candidate = url_match.as_str();

        match validate_link(candidate) {
            Ok(_) => spans.push(Span::new(url_match.range(), SpanKind::Link, candidate)),
            Err(e) => tracing::warn!("Dropping link {}: {}", candidate, e),
        }
    }

    spans
}

/// Parse a link candidate, requiring an absolute URL with a host
pub fn validate_link(candidate: &str) -> Result<url::Url, XrpcError> {
    let parsed = url::Url::parse(candidate)
        .map_err(|e| XrpcError::Validation(format!("{}: {}", candidate, e)))?;
    if !parsed.has_host() {
        return Err(XrpcError::Validation(format!("{}: missing host", candidate)));
    }
    Ok(parsed)
}

/// `#tag` runs of ASCII letters, digits and underscores, `#` included
pub fn scan_tags(text: &str) -> Vec<Span> {
    TAG_REGEX
        .find_iter(text)
        .map(|m| Span::new(m.range(), SpanKind::Tag, m.as_str()))
        .collect()
}

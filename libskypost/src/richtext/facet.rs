//! Facet records and the builder that turns spans into them

use serde::{Deserialize, Serialize};
use std::ops::Range;

use crate::resolver::HandleResolver;
use crate::richtext::scanner::{ScanResult, Span};

/// Byte range a facet applies to, `[byteStart, byteEnd)` over UTF-8 bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ByteSlice {
    #[serde(rename = "byteStart")]
    pub byte_start: usize,
    #[serde(rename = "byteEnd")]
    pub byte_end: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "$type")]
pub enum FacetFeature {
    #[serde(rename = "app.bsky.richtext.facet#mention")]
    Mention { did: String },
    #[serde(rename = "app.bsky.richtext.facet#link")]
    Link { uri: String },
    #[serde(rename = "app.bsky.richtext.facet#tag")]
    Tag { tag: String },
}

/// Rich text annotation embedded in a post record
///
/// Facets built here always carry exactly one feature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Facet {
    pub index: ByteSlice,
    pub features: Vec<FacetFeature>,
}

impl Facet {
    pub fn new(range: Range<usize>, feature: FacetFeature) -> Self {
        Self {
            index: ByteSlice {
                byte_start: range.start,
                byte_end: range.end,
            },
            features: vec![feature],
        }
    }

    pub fn byte_range(&self) -> Range<usize> {
        self.index.byte_start..self.index.byte_end
    }

    pub fn feature(&self) -> Option<&FacetFeature> {
        self.features.first()
    }
}

/// Convert scanned spans into facets
///
/// Output order is all mentions, then all links, then all tags, each in scan
/// order. Mentions are resolved one at a time; a mention whose handle does
/// not resolve is dropped, as is any span that falls outside `text`. This
/// never fails as a whole.
pub async fn build<R>(text: &str, scan: &ScanResult, resolver: &R) -> Vec<Facet>
where
    R: HandleResolver + ?Sized,
{
    let mut facets = Vec::with_capacity(scan.len());

    for span in &scan.mentions {
        if !in_bounds(text, span) {
            continue;
        }
        match resolver.resolve(&span.payload).await {
            Ok(did) => facets.push(Facet::new(span.range(), FacetFeature::Mention { did })),
            Err(e) => {
                tracing::warn!("Error resolving handle {}: {}", span.payload, e);
            }
        }
    }

    for span in &scan.links {
        if in_bounds(text, span) {
            let uri = span.payload.clone();
            facets.push(Facet::new(span.range(), FacetFeature::Link { uri }));
        }
    }

    for span in &scan.tags {
        if in_bounds(text, span) {
            let tag = span.payload.clone();
            facets.push(Facet::new(span.range(), FacetFeature::Tag { tag }));
        }
    }

    facets
}

fn in_bounds(text: &str, span: &Span) -> bool {
    if span.fits(text.len()) {
        return true;
    }
    tracing::warn!(
        "Dropping {:?} span with invalid indices: start={}, end={}, textLength={}",
        span.kind,
        span.byte_start,
        span.byte_end,
        text.len()
    );
    false
}

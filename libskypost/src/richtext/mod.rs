//! Rich text facets for posts
//!
//! Post text is scanned for `@handle` mentions, `http(s)://` links and
//! `#tags`; the resulting spans become facets carrying byte offsets into the
//! UTF-8 encoding of the text.
//!
//! ```no_run
//! use libskypost::mock::MockResolver;
//! use libskypost::richtext;
//!
//! # async fn example() {
//! let resolver = MockResolver::new().with("alice.bsky.social", "did:plc:abc123");
//! let facets = richtext::detect_facets("hi @alice.bsky.social #rust", &resolver).await;
//! assert_eq!(facets.len(), 2);
//! # }
//! ```

pub mod facet;
pub mod scanner;


pub use facet::{build, ByteSlice, Facet, FacetFeature};
pub use scanner::{scan, ScanResult, Span, SpanKind};

use crate::resolver::HandleResolver;

/// Scan `text` and build its facets in one go
pub async fn detect_facets<R>(text: &str, resolver: &R) -> Vec<Facet>
where
    R: HandleResolver + ?Sized,
{
    let spans = scan(text);
    tracing::debug!(
        mentions = spans.mentions.len(),
        links = spans.links.len(),
        tags = spans.tags.len(),
        "Scanned post text"
    );
    build(text, &spans, resolver).await
}

//! Skypost - post to Bluesky from the command line
//!
//! This library provides session management, rich text facet detection and
//! record submission against an AT Protocol PDS.

pub mod config;
pub mod error;
pub mod logging;
pub mod mock;
pub mod poster;
pub mod resolver;
pub mod richtext;
pub mod session;
pub mod store;
pub mod xrpc;

// Re-export commonly used types
pub use config::Config;
pub use error::{Result, SkypostError};
pub use poster::{PostOutcome, PostRecord, PostSubmitter};
pub use resolver::{HandleResolver, XrpcHandleResolver};
pub use richtext::{Facet, FacetFeature, ScanResult, Span, SpanKind};
pub use session::{Credentials, Session, SessionManager, SessionState};
pub use store::{FileSessionStore, SessionStore};
pub use xrpc::XrpcClient;

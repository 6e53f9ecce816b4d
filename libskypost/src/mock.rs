//! Mock handle resolver for testing
//!
//! Available in all builds so integration tests and downstream crates can
//! exercise facet building without network access.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::error::{Result, XrpcError};
use crate::resolver::HandleResolver;

/// Resolver answering from a fixed handle → DID table
///
/// Unknown handles fail with `XrpcError::Resolution`. Every lookup is
/// recorded, in order, so tests can check which handles were queried.
#[derive(Debug, Clone, Default)]
pub struct MockResolver {
    entries: HashMap<String, String>,
    fail_all: bool,
    calls: Arc<Mutex<Vec<String>>>,
}

impl MockResolver {
    /// A resolver that knows no handles
    pub fn new() -> Self {
        Self::default()
    }

    /// A resolver that fails every lookup, even for handles added with
    /// [`with`](Self::with)
    pub fn failing() -> Self {
        Self {
            fail_all: true,
            ..Self::default()
        }
    }

    /// Add a handle → DID entry
    pub fn with(mut self, handle: &str, did: &str) -> Self {
        self.entries.insert(handle.to_string(), did.to_string());
        self
    }

    /// Handles looked up so far
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|c| c.len()).unwrap_or_default()
    }
}

#[async_trait]
impl HandleResolver for MockResolver {
    async fn resolve(&self, handle: &str) -> Result<String> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(handle.to_string());
        }

        if self.fail_all {
            return Err(
                XrpcError::Resolution(format!("mock set to fail lookup of {}", handle)).into(),
            );
        }

        self.entries.get(handle).cloned().ok_or_else(|| {
            XrpcError::Resolution(format!("mock has no entry for handle {}", handle)).into()
        })
    }
}

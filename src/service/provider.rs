//! Search provider trait and types
//!
//! Defines the common interface for all question search backends.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::Question;

/// Error types for search operations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SearchError {
    /// Backend not reachable (connection refused, DNS, timeout)
    Unavailable(String),
    /// Request reached the backend but failed (non-2xx, mid-flight transport error)
    RequestFailed(String),
    /// Response body could not be parsed
    InvalidResponse(String),
    /// Bearer token missing or rejected
    AuthenticationFailed(String),
}

impl fmt::Display for SearchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchError::Unavailable(msg) => write!(f, "Backend unavailable: {}", msg),
            SearchError::RequestFailed(msg) => write!(f, "Request failed: {}", msg),
            SearchError::InvalidResponse(msg) => write!(f, "Invalid response: {}", msg),
            SearchError::AuthenticationFailed(msg) => write!(f, "Authentication failed: {}", msg),
        }
    }
}

impl std::error::Error for SearchError {}

/// The trait that all search backends implement.
///
/// `search` is the only call the pipeline issues; the status fetches
/// exist for analytics views that consume a result set wholesale.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Provider name for logs (e.g. "http", "mock")
    fn provider_name(&self) -> &'static str;

    /// Cheap reachability probe against the backend.
    async fn check_connection(&self) -> Result<(), SearchError>;

    /// Fetch records matching a settled query.
    async fn search(&self, query: &str) -> Result<Vec<Question>, SearchError>;

    /// Fetch records filtered by solved status.
    async fn fetch_by_status(&self, solved: bool) -> Result<Vec<Question>, SearchError>;
}

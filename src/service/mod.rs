//! Search service boundary
//!
//! Defines the common interface to the question backend plus the HTTP
//! implementation used in production. The pipeline only ever sees the
//! trait, so tests inject mock providers.

pub mod http;
pub mod provider;

pub use http::{HttpProviderConfig, HttpQuestionProvider};
pub use provider::{SearchError, SearchProvider};

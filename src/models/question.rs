//! Question records served by the help desk API

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A question as consumed by the aggregation pipeline.
///
/// Instances are parsed and validated at the service boundary before
/// they reach the classifier; `created_at` is always UTC by the time a
/// record lands here. `is_solved` drives the fallback classification
/// for records no rule matches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub user_id: Option<i64>,
    pub category_id: Option<i64>,
    pub language: Option<String>,
    pub created_at: DateTime<Utc>,
    pub is_solved: bool,
}

impl Question {
    /// Builds a minimal record; the remaining fields take the values the
    /// backend omits on its plain listing endpoint.
    pub fn new(id: i64, title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            description: description.into(),
            user_id: None,
            category_id: None,
            language: None,
            created_at: Utc::now(),
            is_solved: false,
        }
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn with_user(mut self, user_id: i64) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn with_solved(mut self, is_solved: bool) -> Self {
        self.is_solved = is_solved;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_defaults_match_listing_endpoint() {
        let q = Question::new(7, "App crash on login", "stack trace attached");

        assert_eq!(q.id, 7);
        assert_eq!(q.title, "App crash on login");
        assert!(q.user_id.is_none());
        assert!(q.language.is_none());
        assert!(!q.is_solved);
    }

    #[test]
    fn builder_helpers_set_optional_fields() {
        let q = Question::new(1, "Slow query", "")
            .with_language("Python")
            .with_user(42)
            .with_solved(true);

        assert_eq!(q.language.as_deref(), Some("Python"));
        assert_eq!(q.user_id, Some(42));
        assert!(q.is_solved);
    }
}

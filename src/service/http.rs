//! HTTP question provider
//!
//! Connects to a MoringaDesk-style REST backend (default: localhost:5000)

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use log::warn;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Deserialize;

use crate::models::Question;
use crate::service::provider::{SearchError, SearchProvider};

/// Question JSON as served by the backend.
///
/// The plain listing endpoint omits `is_solved`; only the solved and
/// unsolved listings include it.
#[derive(Debug, Deserialize)]
struct QuestionRecord {
    id: i64,
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    user_id: Option<i64>,
    #[serde(default)]
    category_id: Option<i64>,
    #[serde(default)]
    language: Option<String>,
    #[serde(default)]
    created_at: String,
    #[serde(default)]
    is_solved: bool,
}

impl QuestionRecord {
    /// Validates a wire record into a domain `Question`.
    fn into_question(self) -> Result<Question, String> {
        if self.title.trim().is_empty() {
            return Err(format!("question {} has an empty title", self.id));
        }

        let created_at = parse_timestamp(&self.created_at).ok_or_else(|| {
            format!(
                "question {} has unparseable created_at '{}'",
                self.id, self.created_at
            )
        })?;

        Ok(Question {
            id: self.id,
            title: self.title,
            description: self.description,
            user_id: self.user_id,
            category_id: self.category_id,
            language: self.language,
            created_at,
            is_solved: self.is_solved,
        })
    }
}

/// The backend emits ISO-8601 timestamps from its API layer, but routes
/// that hand a datetime straight to Flask's jsonify produce RFC 2822
/// ("Fri, 15 Mar 2024 10:30:00 GMT") or a naive ISO string. Accept all
/// three; naive timestamps are taken as UTC.
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    raw.parse::<NaiveDateTime>()
        .ok()
        .map(|naive| DateTime::from_naive_utc_and_offset(naive, Utc))
}

/// Converts wire records, skipping ones that fail validation. A skipped
/// record is logged and does not fail the whole response.
fn validate_records(records: Vec<QuestionRecord>) -> Vec<Question> {
    let total = records.len();
    let mut questions = Vec::with_capacity(total);

    for record in records {
        match record.into_question() {
            Ok(question) => questions.push(question),
            Err(reason) => warn!("Skipping invalid record: {}", reason),
        }
    }

    if questions.len() < total {
        warn!(
            "Dropped {} of {} records during validation",
            total - questions.len(),
            total
        );
    }

    questions
}

/// HTTP provider configuration
#[derive(Debug, Clone)]
pub struct HttpProviderConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    /// Bearer token attached to every request when present.
    pub bearer_token: Option<String>,
}

impl Default for HttpProviderConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            timeout_secs: 15,
            bearer_token: None,
        }
    }
}

/// HTTP search provider
pub struct HttpQuestionProvider {
    config: HttpProviderConfig,
    client: Client,
}

impl HttpQuestionProvider {
    pub fn new(config: HttpProviderConfig) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self { config, client }
    }

    pub fn with_default_config() -> Self {
        Self::new(HttpProviderConfig::default())
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url, path)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.config.bearer_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn fetch_records(
        &self,
        url: String,
        query: Option<(&str, &str)>,
    ) -> Result<Vec<Question>, SearchError> {
        let mut request = self.client.get(&url);
        if let Some((key, value)) = query {
            request = request.query(&[(key, value)]);
        }

        let response = self.authorize(request).send().await.map_err(|e| {
            if e.is_connect() || e.is_timeout() {
                SearchError::Unavailable(format!("Cannot connect to backend: {}", e))
            } else {
                SearchError::RequestFailed(format!("Request failed: {}", e))
            }
        })?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(SearchError::AuthenticationFailed(format!(
                "Backend rejected credentials: {}",
                status
            )));
        }
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(SearchError::RequestFailed(format!(
                "Backend returned {}: {}",
                status, error_text
            )));
        }

        let records: Vec<QuestionRecord> = response
            .json()
            .await
            .map_err(|e| SearchError::InvalidResponse(format!("Invalid response body: {}", e)))?;

        Ok(validate_records(records))
    }
}

#[async_trait]
impl SearchProvider for HttpQuestionProvider {
    fn provider_name(&self) -> &'static str {
        "http"
    }

    async fn check_connection(&self) -> Result<(), SearchError> {
        let url = self.url("/api/questions");

        let response = self
            .authorize(self.client.get(&url))
            .send()
            .await
            .map_err(|e| SearchError::Unavailable(format!("Cannot connect to backend: {}", e)))?;

        if !response.status().is_success() {
            return Err(SearchError::Unavailable(format!(
                "Backend returned {}",
                response.status()
            )));
        }

        Ok(())
    }

    async fn search(&self, query: &str) -> Result<Vec<Question>, SearchError> {
        // Servers without a search parameter return the full listing;
        // the pipeline still works, just unfiltered.
        self.fetch_records(self.url("/api/questions"), Some(("q", query)))
            .await
    }

    async fn fetch_by_status(&self, solved: bool) -> Result<Vec<Question>, SearchError> {
        let path = if solved {
            "/api/questions/is_solved"
        } else {
            "/api/questions/is_unsolved"
        };
        self.fetch_records(self.url(path), None).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults_point_at_local_backend() {
        let config = HttpProviderConfig::default();
        assert_eq!(config.base_url, "http://localhost:5000");
        assert_eq!(config.timeout_secs, 15);
        assert!(config.bearer_token.is_none());
    }

    #[test]
    fn timestamp_accepts_rfc3339() {
        let parsed = parse_timestamp("2024-03-15T10:30:00Z").unwrap();
        assert_eq!(parsed.to_rfc3339(), "2024-03-15T10:30:00+00:00");

        let offset = parse_timestamp("2024-03-15T13:30:00+03:00").unwrap();
        assert_eq!(offset, parsed);
    }

    #[test]
    fn timestamp_accepts_rfc2822() {
        let parsed = parse_timestamp("Fri, 15 Mar 2024 10:30:00 GMT").unwrap();
        assert_eq!(parsed.to_rfc3339(), "2024-03-15T10:30:00+00:00");
    }

    #[test]
    fn timestamp_accepts_naive_iso_as_utc() {
        let parsed = parse_timestamp("2024-03-15T10:30:00").unwrap();
        assert_eq!(parsed.to_rfc3339(), "2024-03-15T10:30:00+00:00");
    }

    #[test]
    fn timestamp_rejects_garbage() {
        assert!(parse_timestamp("").is_none());
        assert!(parse_timestamp("yesterday").is_none());
    }

    #[test]
    fn listing_record_defaults_is_solved_to_false() {
        // The plain listing endpoint omits is_solved entirely.
        let json = r#"{
            "id": 3,
            "title": "Build fails on CI",
            "description": "works locally",
            "user_id": 9,
            "category_id": 2,
            "language": "Rust",
            "created_at": "2024-03-15T10:30:00Z"
        }"#;

        let record: QuestionRecord = serde_json::from_str(json).unwrap();
        let question = record.into_question().unwrap();

        assert!(!question.is_solved);
        assert_eq!(question.user_id, Some(9));
        assert_eq!(question.language.as_deref(), Some("Rust"));
    }

    #[test]
    fn validation_skips_bad_records_and_keeps_good_ones() {
        let json = r#"[
            {"id": 1, "title": "Memory leak", "description": "", "created_at": "2024-03-15T10:30:00Z"},
            {"id": 2, "title": "   ", "description": "no title", "created_at": "2024-03-15T10:30:00Z"},
            {"id": 3, "title": "API timeout", "description": "", "created_at": "not a date"}
        ]"#;

        let records: Vec<QuestionRecord> = serde_json::from_str(json).unwrap();
        let questions = validate_records(records);

        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].id, 1);
    }

    #[test]
    fn solved_listing_carries_the_flag_through() {
        let json = r#"[
            {"id": 5, "title": "Login error", "description": "", "created_at": "Fri, 15 Mar 2024 10:30:00 GMT", "is_solved": true}
        ]"#;

        let records: Vec<QuestionRecord> = serde_json::from_str(json).unwrap();
        let questions = validate_records(records);

        assert_eq!(questions.len(), 1);
        assert!(questions[0].is_solved);
    }
}

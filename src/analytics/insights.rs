//! Result-set analytics
//!
//! Derived views over an accepted result set, mirroring the help desk's
//! admin analytics: language distribution, top contributors, and
//! repeated questions. All share the tally sort/truncate semantics.

use serde::{Deserialize, Serialize};

use crate::analytics::facets::FacetDefinition;
use crate::analytics::tally::{aggregate_problems, Tally, TallyBuilder};
use crate::models::Question;

/// Missing, empty, or whitespace-only languages count under this label.
const UNKNOWN_LANGUAGE: &str = "Unknown";

fn capitalize_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

fn language_of(question: &Question) -> &str {
    question
        .language
        .as_deref()
        .map(str::trim)
        .filter(|lang| !lang.is_empty())
        .unwrap_or(UNKNOWN_LANGUAGE)
}

/// Questions per language. Counting happens on the trimmed, lowercased
/// name so "Python" and " python " merge; display re-capitalizes the
/// first letter.
pub fn language_tally(records: &[Question], limit: usize) -> Tally {
    let mut builder = TallyBuilder::default();

    for question in records {
        builder.add(&language_of(question).to_lowercase());
    }

    builder.finish(limit).map_labels(capitalize_first)
}

/// Questions per contributor. Records without a user id are skipped;
/// labels are the decimal user id (name resolution is presentation
/// work, not aggregation).
pub fn contributor_tally(records: &[Question], limit: usize) -> Tally {
    let mut builder = TallyBuilder::default();

    for question in records {
        if let Some(user_id) = question.user_id {
            builder.add(&user_id.to_string());
        }
    }

    builder.finish(limit)
}

/// Repeats of the same question per language, keyed as
/// "language - title". Counting is case-insensitive over the whole key;
/// display re-capitalizes the language segment only.
pub fn top_question_tally(records: &[Question], limit: usize) -> Tally {
    let mut builder = TallyBuilder::default();

    for question in records {
        let key = format!("{} - {}", language_of(question), question.title).to_lowercase();
        builder.add(&key);
    }

    builder.finish(limit).map_labels(|key| match key.split_once(" - ") {
        Some((language, title)) => format!("{} - {}", capitalize_first(language), title),
        None => capitalize_first(key),
    })
}

/// The full analytics bundle one admin view consumes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsReport {
    pub problems: Tally,
    pub languages: Tally,
    pub contributors: Tally,
    pub top_questions: Tally,
}

/// Builds every tally over one record set in a single call.
pub fn build_report(records: &[Question], facets: &FacetDefinition, limit: usize) -> AnalyticsReport {
    AnalyticsReport {
        problems: aggregate_problems(records, facets, limit),
        languages: language_tally(records, limit),
        contributors: contributor_tally(records, limit),
        top_questions: top_question_tally(records, limit),
    }
}

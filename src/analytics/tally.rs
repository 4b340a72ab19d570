//! Tally aggregation
//!
//! Deterministic count-per-label aggregation with display truncation.
//! Encounter order is tracked so ties sort stably: the label seen first
//! wins the tie, independent of hash ordering.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::analytics::facets::FacetDefinition;
use crate::models::Question;

/// One label's count in a tally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TallyEntry {
    pub label: String,
    pub count: u64,
}

/// Aggregated counts, sorted descending with ties in first-encountered
/// order and truncated to a display limit.
///
/// The truncation is lossy by design: the displayed counts need not sum
/// to the full record count. `classified_total` keeps the pre-truncation
/// sum so the loss stays observable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Tally {
    entries: Vec<TallyEntry>,
    classified_total: u64,
    fallback_total: u64,
}

impl Tally {
    /// Displayed entries, highest count first.
    pub fn entries(&self) -> &[TallyEntry] {
        &self.entries
    }

    /// Count for one displayed label, if it survived truncation.
    pub fn get(&self, label: &str) -> Option<u64> {
        self.entries
            .iter()
            .find(|entry| entry.label == label)
            .map(|entry| entry.count)
    }

    /// Number of displayed labels.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum over the displayed entries only.
    pub fn displayed_total(&self) -> u64 {
        self.entries.iter().map(|entry| entry.count).sum()
    }

    /// Records classified before truncation. Always equals the input
    /// record count for problem tallies.
    pub fn classified_total(&self) -> u64 {
        self.classified_total
    }

    /// Records that fell through to a fallback label rather than a rule.
    pub fn fallback_total(&self) -> u64 {
        self.fallback_total
    }

    /// Rewrites display labels in place. Used by tallies that count
    /// under a normalized key but present a prettier form.
    pub(crate) fn map_labels(mut self, f: impl Fn(&str) -> String) -> Tally {
        for entry in &mut self.entries {
            entry.label = f(&entry.label);
        }
        self
    }
}

/// Accumulates counts while remembering first-encounter order.
#[derive(Debug, Default)]
pub(crate) struct TallyBuilder {
    index: HashMap<String, usize>,
    entries: Vec<TallyEntry>,
    fallback_total: u64,
}

impl TallyBuilder {
    pub(crate) fn add(&mut self, label: &str) {
        match self.index.get(label) {
            Some(&at) => self.entries[at].count += 1,
            None => {
                self.index.insert(label.to_string(), self.entries.len());
                self.entries.push(TallyEntry {
                    label: label.to_string(),
                    count: 1,
                });
            }
        }
    }

    pub(crate) fn add_fallback(&mut self, label: &str) {
        self.fallback_total += 1;
        self.add(label);
    }

    pub(crate) fn finish(self, limit: usize) -> Tally {
        let classified_total = self.entries.iter().map(|entry| entry.count).sum();

        let mut entries = self.entries;
        // Stable sort: equal counts keep their insertion order.
        entries.sort_by(|a, b| b.count.cmp(&a.count));
        entries.truncate(limit);

        Tally {
            entries,
            classified_total,
            fallback_total: self.fallback_total,
        }
    }
}

/// Classifies every record against the facet rules and tallies the
/// labels. Pure: deterministic given (records, facets, limit), no I/O.
pub fn aggregate_problems(
    records: &[Question],
    facets: &FacetDefinition,
    limit: usize,
) -> Tally {
    let mut builder = TallyBuilder::default();

    for question in records {
        let matched = facets.classify(question);
        if matched.is_fallback() {
            builder.add_fallback(matched.label());
        } else {
            builder.add(matched.label());
        }
    }

    builder.finish(limit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::facets::FacetDefinition;

    fn q(id: i64, title: &str, solved: bool) -> Question {
        Question::new(id, title, "").with_solved(solved)
    }

    #[test]
    fn concrete_scenario_from_the_help_desk() {
        let records = vec![
            q(1, "App crash on login", false),
            q(2, "Slow query", true),
            q(3, "Random topic", true),
        ];
        let facets = FacetDefinition::default_problems();

        let tally = aggregate_problems(&records, &facets, 10);

        assert_eq!(tally.get("Crash Issues"), Some(1));
        assert_eq!(tally.get("Performance Issues"), Some(1));
        assert_eq!(tally.get("Solved - Other Issues"), Some(1));
        assert_eq!(tally.len(), 3);
        assert_eq!(tally.fallback_total(), 1);
    }

    #[test]
    fn counts_sum_to_record_count_before_truncation() {
        let records: Vec<Question> = (0..25)
            .map(|i| q(i, &format!("topic {}", i), i % 2 == 0))
            .collect();
        let facets = FacetDefinition::default_problems();

        let tally = aggregate_problems(&records, &facets, 10);

        assert_eq!(tally.classified_total(), 25);
        assert_eq!(tally.displayed_total(), tally.classified_total());
    }

    #[test]
    fn truncation_is_lossy_but_classified_total_is_not() {
        // 12 distinct single-count labels against a limit of 10.
        let records: Vec<Question> = vec![
            q(1, "error", false),
            q(2, "exception", false),
            q(3, "not working", false),
            q(4, "install", false),
            q(5, "slow", false),
            q(6, "version", false),
            q(7, "syntax", false),
            q(8, "import", false),
            q(9, "api", false),
            q(10, "null", false),
            q(11, "crash", false),
            q(12, "memory", false),
        ];
        let facets = FacetDefinition::default_problems();

        let tally = aggregate_problems(&records, &facets, 10);

        assert_eq!(tally.len(), 10);
        assert_eq!(tally.classified_total(), 12);
        assert!(tally.displayed_total() < tally.classified_total());
        assert!(tally.displayed_total() <= records.len() as u64);
    }

    #[test]
    fn sorted_descending_with_first_encounter_tie_break() {
        let records = vec![
            q(1, "syntax problem", false),
            q(2, "app crash", false),
            q(3, "another crash", false),
            q(4, "memory spike", false),
        ];
        let facets = FacetDefinition::default_problems();

        let tally = aggregate_problems(&records, &facets, 10);
        let labels: Vec<&str> = tally.entries().iter().map(|e| e.label.as_str()).collect();

        // Crash Issues leads on count; Syntax Issues and Memory Issues
        // tie at 1 and keep their encounter order.
        assert_eq!(labels, vec!["Crash Issues", "Syntax Issues", "Memory Issues"]);
    }

    #[test]
    fn empty_record_set_yields_empty_tally() {
        let facets = FacetDefinition::default_problems();
        let tally = aggregate_problems(&[], &facets, 10);

        assert!(tally.is_empty());
        assert_eq!(tally.classified_total(), 0);
        assert_eq!(tally.fallback_total(), 0);
    }
}

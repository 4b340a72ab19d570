//! Facet classification rules
//!
//! An ordered rule list mapping question text to a problem category.
//! Rule order encodes priority: the first matching rule wins, so more
//! specific categories must precede catch-alls ("database error" lands
//! in Database Issues only while the database rule sits above the
//! generic error rule).

use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};

use crate::models::Question;

/// Default problem rules in priority order. The label boundaries are
/// product-defined; callers with a different taxonomy supply their own
/// `FacetDefinition` instead of editing this table.
static DEFAULT_PROBLEM_RULES: &[(&str, &str)] = &[
    ("error", "Errors"),
    ("exception", "Exceptions"),
    ("not working|not function", "Functionality Issues"),
    ("install|setup", "Installation/Setup"),
    ("performance|slow|lag", "Performance Issues"),
    ("compatib|version", "Compatibility Issues"),
    ("syntax|parse", "Syntax Issues"),
    ("import|export", "Import/Export Issues"),
    ("api|endpoint", "API Issues"),
    ("undefined|null", "Null/Undefined Issues"),
    ("crash|break", "Crash Issues"),
    ("memory|leak", "Memory Issues"),
    ("network|request|fetch", "Network Issues"),
    ("database|db|query", "Database Issues"),
    ("authentication|auth|login", "Auth Issues"),
    ("permission|access", "Permission Issues"),
    ("security|vulnerability", "Security Issues"),
    ("dependency|package", "Dependency Issues"),
    ("build|compile", "Build Issues"),
    ("deploy|server", "Deployment Issues"),
];

static DEFAULT_PROBLEMS: Lazy<FacetDefinition> = Lazy::new(|| {
    let rules = DEFAULT_PROBLEM_RULES
        .iter()
        .map(|&(pattern, label)| FacetRule::new(pattern, label).expect("Invalid default rule"))
        .collect();

    FacetDefinition::new(rules, "Solved - Other Issues", "Unsolved - Other Issues")
});

/// A single classification rule: pattern plus the label it assigns.
/// Patterns match case-insensitively.
#[derive(Debug, Clone)]
pub struct FacetRule {
    pattern: Regex,
    label: String,
}

impl FacetRule {
    pub fn new(pattern: &str, label: impl Into<String>) -> Result<Self, regex::Error> {
        let pattern = RegexBuilder::new(pattern).case_insensitive(true).build()?;
        Ok(Self {
            pattern,
            label: label.into(),
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    fn matches(&self, question: &Question) -> bool {
        self.pattern.is_match(&question.title) || self.pattern.is_match(&question.description)
    }
}

/// How a record was classified: by an ordered rule, or through the
/// fallback because no rule matched. Keeping the distinction visible
/// lets tests tell a genuine rule match from a classification gap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FacetMatch {
    /// Matched the rule at `index` in definition order.
    Rule { index: usize, label: String },
    /// No rule matched; the label was chosen from the solved flag.
    Fallback { solved: bool, label: String },
}

impl FacetMatch {
    pub fn label(&self) -> &str {
        match self {
            FacetMatch::Rule { label, .. } => label,
            FacetMatch::Fallback { label, .. } => label,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, FacetMatch::Fallback { .. })
    }
}

/// Ordered rule list plus the two fallback labels applied when nothing
/// matches. Static configuration: built once, never mutated at runtime.
#[derive(Debug, Clone)]
pub struct FacetDefinition {
    rules: Vec<FacetRule>,
    solved_fallback: String,
    unsolved_fallback: String,
}

impl FacetDefinition {
    pub fn new(
        rules: Vec<FacetRule>,
        solved_fallback: impl Into<String>,
        unsolved_fallback: impl Into<String>,
    ) -> Self {
        Self {
            rules,
            solved_fallback: solved_fallback.into(),
            unsolved_fallback: unsolved_fallback.into(),
        }
    }

    /// The rule set the original help desk shipped with.
    pub fn default_problems() -> Self {
        DEFAULT_PROBLEMS.clone()
    }

    pub fn rules(&self) -> &[FacetRule] {
        &self.rules
    }

    /// Classifies a question into exactly one category. Total by
    /// construction: when no rule matches, the solved flag picks one of
    /// the two fallback labels.
    pub fn classify(&self, question: &Question) -> FacetMatch {
        for (index, rule) in self.rules.iter().enumerate() {
            if rule.matches(question) {
                return FacetMatch::Rule {
                    index,
                    label: rule.label.clone(),
                };
            }
        }

        if question.is_solved {
            FacetMatch::Fallback {
                solved: true,
                label: self.solved_fallback.clone(),
            }
        } else {
            FacetMatch::Fallback {
                solved: false,
                label: self.unsolved_fallback.clone(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn q(title: &str) -> Question {
        Question::new(1, title, "")
    }

    #[test]
    fn first_matching_rule_wins() {
        // "database error" matches both the database and error rules;
        // with database first, it must classify as Database Issues.
        let facets = FacetDefinition::new(
            vec![
                FacetRule::new("database", "Database Issues").unwrap(),
                FacetRule::new("error", "Errors").unwrap(),
            ],
            "Solved - Other Issues",
            "Unsolved - Other Issues",
        );

        let matched = facets.classify(&q("database error"));
        assert_eq!(matched.label(), "Database Issues");
        assert!(matches!(matched, FacetMatch::Rule { index: 0, .. }));
    }

    #[test]
    fn default_rules_put_error_above_database() {
        // The shipped taxonomy orders the generic error rule first, so
        // "database error" classifies as Errors there.
        let facets = FacetDefinition::default_problems();
        let matched = facets.classify(&q("database error"));
        assert_eq!(matched.label(), "Errors");
    }

    #[test]
    fn matching_is_case_insensitive_and_covers_description() {
        let facets = FacetDefinition::default_problems();

        assert_eq!(facets.classify(&q("APP CRASH ON LOGIN")).label(), "Crash Issues");

        let by_description = Question::new(2, "Weird behaviour", "the app is very slow today");
        assert_eq!(facets.classify(&by_description).label(), "Performance Issues");
    }

    #[test]
    fn fallback_branches_on_solved_flag() {
        let facets = FacetDefinition::default_problems();

        let solved = facets.classify(&q("Random topic").with_solved(true));
        assert_eq!(solved.label(), "Solved - Other Issues");
        assert!(matches!(solved, FacetMatch::Fallback { solved: true, .. }));

        let unsolved = facets.classify(&q("Random topic"));
        assert_eq!(unsolved.label(), "Unsolved - Other Issues");
        assert!(unsolved.is_fallback());
    }

    #[test]
    fn fallback_is_distinguishable_from_rule_match() {
        // A rule whose label equals a fallback label must still be
        // reported as a rule match.
        let facets = FacetDefinition::new(
            vec![FacetRule::new("other", "Solved - Other Issues").unwrap()],
            "Solved - Other Issues",
            "Unsolved - Other Issues",
        );

        let matched = facets.classify(&q("other issues here").with_solved(true));
        assert_eq!(matched.label(), "Solved - Other Issues");
        assert!(!matched.is_fallback());
    }

    #[test]
    fn default_rule_table_compiles_in_order() {
        let facets = FacetDefinition::default_problems();
        assert_eq!(facets.rules().len(), 20);
        assert_eq!(facets.rules()[0].label(), "Errors");
        assert_eq!(facets.rules()[19].label(), "Deployment Issues");
    }
}

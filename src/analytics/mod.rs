//! Result-set aggregation
//!
//! Pure classification and tally derivation over accepted search
//! results. Nothing here performs I/O; the pipeline calls in with an
//! owned record set and ships the output to the presentation sink.

pub mod facets;
pub mod insights;
pub mod tally;

// Re-export main types
pub use facets::{FacetDefinition, FacetMatch, FacetRule};
pub use insights::{
    build_report, contributor_tally, language_tally, top_question_tally, AnalyticsReport,
};
pub use tally::{aggregate_problems, Tally, TallyEntry};

// desk-search - Debounced incremental search client for a Q&A help desk
//
// The crate covers the client-side search path end to end:
// - Debounce/dispatch controller with epoch-based stale suppression
// - HTTP question provider against the help desk API
// - Pattern-based problem classification and tally aggregation

// Performance logging macros - exported for use by other modules
#[macro_use]
pub mod macros;

// Core modules
pub mod analytics;
pub mod models;
pub mod pipeline;
pub mod service;

// Re-export main types
pub use analytics::{
    aggregate_problems, build_report, AnalyticsReport, FacetDefinition, FacetMatch, FacetRule,
    Tally, TallyEntry,
};
pub use models::Question;
pub use pipeline::{PipelineConfig, PipelineMetrics, QueryEpoch, QueryPipeline, SinkEvent};
pub use service::{HttpProviderConfig, HttpQuestionProvider, SearchError, SearchProvider};

/// Initializes env_logger to output to stderr (reads RUST_LOG env var).
/// Safe to call more than once; later calls are no-ops.
pub fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .try_init();
}

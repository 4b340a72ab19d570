// Query pipeline module
//
// Turns a stream of raw query edits into debounced, epoch-tagged
// searches and delivers classified tallies to a presentation sink.
// Stale responses are dropped by epoch comparison inside the
// controller loop.

pub mod controller;
mod dispatcher;
pub mod types;

// Re-export main types
pub use controller::{PipelineConfig, QueryPipeline};
pub use types::{PipelineMetrics, QueryEpoch, SinkEvent};

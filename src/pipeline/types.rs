//! Pipeline event and shared types

use std::fmt;
use std::sync::atomic::AtomicU64;

use serde::{Deserialize, Serialize};

use crate::analytics::Tally;
use crate::models::Question;
use crate::service::SearchError;

/// Freshness tag for dispatched queries.
///
/// Strictly increasing and never reused; an outcome is applied only when
/// its epoch equals the highest epoch the controller has issued, which
/// is what drops slow out-of-order responses on the floor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct QueryEpoch(u64);

impl QueryEpoch {
    pub const ZERO: QueryEpoch = QueryEpoch(0);

    pub fn value(self) -> u64 {
        self.0
    }

    pub(crate) fn next(self) -> QueryEpoch {
        QueryEpoch(self.0 + 1)
    }
}

impl fmt::Display for QueryEpoch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Outcome of one dispatched search, tagged with its epoch.
#[derive(Debug)]
pub(crate) enum DispatchOutcome {
    Resolved {
        epoch: QueryEpoch,
        records: Vec<Question>,
    },
    Failed {
        epoch: QueryEpoch,
        error: SearchError,
    },
}

impl DispatchOutcome {
    pub(crate) fn epoch(&self) -> QueryEpoch {
        match self {
            DispatchOutcome::Resolved { epoch, .. } => *epoch,
            DispatchOutcome::Failed { epoch, .. } => *epoch,
        }
    }
}

/// Events delivered to the presentation sink.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SinkEvent {
    /// A settled query resolved at the current epoch; this tally
    /// replaces any previous one wholesale.
    TallyUpdated { epoch: QueryEpoch, tally: Tally },
    /// The query fell below the significance threshold; any displayed
    /// tally should be dropped.
    Cleared { epoch: QueryEpoch },
    /// The current epoch's search failed. Surfaced once, not retried;
    /// a previously displayed tally stays valid.
    SearchFailed { epoch: QueryEpoch, error: SearchError },
}

impl SinkEvent {
    pub fn epoch(&self) -> QueryEpoch {
        match self {
            SinkEvent::TallyUpdated { epoch, .. } => *epoch,
            SinkEvent::Cleared { epoch } => *epoch,
            SinkEvent::SearchFailed { epoch, .. } => *epoch,
        }
    }
}

/// Counters shared by the controller loop and its dispatch tasks.
///
/// Stale drops are internal signals: countable here and visible in
/// logs, never delivered to the sink.
#[derive(Debug, Default)]
pub struct PipelineMetrics {
    /// Settled queries actually dispatched to the provider.
    pub dispatched: AtomicU64,
    /// Outcomes dropped because a newer epoch superseded them.
    pub stale_dropped: AtomicU64,
    /// Failed outcomes surfaced to the sink.
    pub failures: AtomicU64,
    /// Clears emitted for sub-threshold queries.
    pub clears: AtomicU64,
}

//! Search dispatch
//!
//! Spawns one task per settled query and tags the outcome with the
//! query's epoch, so the controller loop can drop superseded responses
//! no matter which order the backend resolves them in.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use log::debug;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::types::{DispatchOutcome, PipelineMetrics, QueryEpoch};
use crate::service::SearchProvider;

pub(crate) struct SearchDispatcher {
    provider: Arc<dyn SearchProvider>,
    outcome_tx: mpsc::UnboundedSender<DispatchOutcome>,
    cancel: CancellationToken,
    metrics: Arc<PipelineMetrics>,
}

impl SearchDispatcher {
    pub(crate) fn new(
        provider: Arc<dyn SearchProvider>,
        outcome_tx: mpsc::UnboundedSender<DispatchOutcome>,
        cancel: CancellationToken,
        metrics: Arc<PipelineMetrics>,
    ) -> Self {
        Self {
            provider,
            outcome_tx,
            cancel,
            metrics,
        }
    }

    /// Fires one search for a settled query. Never blocks the caller;
    /// the outcome arrives on the outcome channel tagged with `epoch`.
    pub(crate) fn dispatch(&self, query: String, epoch: QueryEpoch) {
        self.metrics.dispatched.fetch_add(1, Ordering::SeqCst);

        let provider = Arc::clone(&self.provider);
        let outcome_tx = self.outcome_tx.clone();
        let cancel = self.cancel.child_token();

        debug!(
            "Dispatching search for epoch {} via {} ({} chars)",
            epoch,
            provider.provider_name(),
            query.len()
        );

        tokio::spawn(async move {
            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!("Dispatch for epoch {} cancelled before completion", epoch);
                    return;
                }
                result = provider.search(&query) => match result {
                    Ok(records) => DispatchOutcome::Resolved { epoch, records },
                    Err(error) => DispatchOutcome::Failed { epoch, error },
                },
            };

            // The loop may already be gone during teardown.
            let _ = outcome_tx.send(outcome);
        });
    }
}

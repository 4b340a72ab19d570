//! Query pipeline controller
//!
//! Handles lifecycle of the debounce/dispatch loop: raw edits come in
//! over a channel, settled queries go out through the dispatcher, and
//! accepted results are classified and delivered to the presentation
//! sink. All mutable pipeline state lives inside the loop task, so no
//! locking is involved anywhere.

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use log::{debug, error, info, warn};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use super::dispatcher::SearchDispatcher;
use super::types::{DispatchOutcome, PipelineMetrics, QueryEpoch, SinkEvent};
use crate::analytics::{aggregate_problems, FacetDefinition};
use crate::service::SearchProvider;

/// Tuning knobs for the query pipeline.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// How long a query must sit unchanged before it is dispatched.
    pub debounce: Duration,
    /// Queries with fewer non-whitespace characters than this emit an
    /// immediate clear instead of scheduling a search.
    pub min_significant_chars: usize,
    /// Tally entries kept after sorting. The cut is display-only and
    /// lossy; the tally keeps its pre-truncation total.
    pub max_tally_entries: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(500),
            min_significant_chars: 4,
            max_tally_entries: 10,
        }
    }
}

/// Handle to a running query pipeline.
///
/// Every collaborator is injected at spawn time; there is no
/// process-wide state behind this. Dropping the handle cancels the loop
/// the same way an explicit teardown does.
pub struct QueryPipeline {
    edit_tx: Option<mpsc::UnboundedSender<String>>,
    loop_handle: Option<JoinHandle<()>>,
    cancel: CancellationToken,
    metrics: Arc<PipelineMetrics>,
}

impl QueryPipeline {
    /// Spawns the controller loop.
    pub fn spawn(
        config: PipelineConfig,
        provider: Arc<dyn SearchProvider>,
        facets: Arc<FacetDefinition>,
        sink: mpsc::UnboundedSender<SinkEvent>,
    ) -> Self {
        let cancel = CancellationToken::new();
        let metrics = Arc::new(PipelineMetrics::default());

        let (edit_tx, edit_rx) = mpsc::unbounded_channel();
        let (outcome_tx, outcome_rx) = mpsc::unbounded_channel();

        let dispatcher = SearchDispatcher::new(
            provider,
            outcome_tx,
            cancel.clone(),
            Arc::clone(&metrics),
        );

        info!(
            "Query pipeline started (debounce {:?}, threshold {} chars, top {})",
            config.debounce, config.min_significant_chars, config.max_tally_entries
        );

        let controller = ControllerLoop {
            config,
            facets,
            sink,
            dispatcher,
            edit_rx,
            outcome_rx,
            cancel: cancel.clone(),
            metrics: Arc::clone(&metrics),
            current_epoch: QueryEpoch::ZERO,
            pending: None,
        };

        let loop_handle = tokio::spawn(controller.run());

        Self {
            edit_tx: Some(edit_tx),
            loop_handle: Some(loop_handle),
            cancel,
            metrics,
        }
    }

    /// Feeds one raw edit into the pipeline. Never blocks; debouncing
    /// happens inside the controller loop.
    pub fn on_query_changed(&self, raw: impl Into<String>) {
        if let Some(tx) = &self.edit_tx {
            if tx.send(raw.into()).is_err() {
                warn!("Query edit dropped: controller loop already stopped");
            }
        }
    }

    /// Counters for dispatched, stale-dropped, failed and cleared
    /// events. Stale drops are observable only here and in logs.
    pub fn metrics(&self) -> Arc<PipelineMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Stops the loop and aborts in-flight dispatches. No sink event of
    /// any kind is emitted after this returns.
    pub async fn teardown(&mut self) -> Result<()> {
        self.cancel.cancel();
        self.edit_tx = None;

        if let Some(handle) = self.loop_handle.take() {
            if let Err(e) = handle.await {
                error!("Controller loop task failed: {}", e);
            }
        }

        Ok(())
    }
}

impl Drop for QueryPipeline {
    fn drop(&mut self) {
        // Covers handles dropped without an explicit teardown.
        self.cancel.cancel();
    }
}

/// A query waiting out its debounce interval.
struct PendingQuery {
    query: String,
    deadline: Instant,
}

/// The single task owning all mutable pipeline state.
struct ControllerLoop {
    config: PipelineConfig,
    facets: Arc<FacetDefinition>,
    sink: mpsc::UnboundedSender<SinkEvent>,
    dispatcher: SearchDispatcher,
    edit_rx: mpsc::UnboundedReceiver<String>,
    outcome_rx: mpsc::UnboundedReceiver<DispatchOutcome>,
    cancel: CancellationToken,
    metrics: Arc<PipelineMetrics>,
    current_epoch: QueryEpoch,
    pending: Option<PendingQuery>,
}

impl ControllerLoop {
    async fn run(mut self) {
        debug!("Controller loop running");

        loop {
            let deadline = self.pending.as_ref().map(|p| p.deadline);
            // The sleep arm is disabled while nothing is pending; the
            // placeholder instant is never polled.
            let sleep_target =
                deadline.unwrap_or_else(|| Instant::now() + Duration::from_secs(3600));

            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    debug!("Controller loop cancelled");
                    break;
                }
                edit = self.edit_rx.recv() => match edit {
                    Some(raw) => self.handle_edit(raw),
                    None => {
                        debug!("Edit channel closed; stopping controller loop");
                        break;
                    }
                },
                Some(outcome) = self.outcome_rx.recv() => self.handle_outcome(outcome),
                _ = tokio::time::sleep_until(sleep_target), if deadline.is_some() => {
                    self.handle_settled();
                }
            }
        }

        debug!("Controller loop stopped");
    }

    /// Every edit restarts the debounce deadline; sub-threshold edits
    /// cancel the pending query outright and clear instead.
    fn handle_edit(&mut self, raw: String) {
        let significant = raw.chars().filter(|c| !c.is_whitespace()).count();

        if significant < self.config.min_significant_chars {
            self.pending = None;
            // Consuming an epoch here makes any in-flight dispatch
            // stale under the same comparison that drops out-of-order
            // responses.
            self.current_epoch = self.current_epoch.next();
            self.metrics.clears.fetch_add(1, Ordering::SeqCst);
            perf_debug!(
                "Query below threshold ({} significant chars); clearing at epoch {}",
                significant,
                self.current_epoch
            );
            self.emit(SinkEvent::Cleared {
                epoch: self.current_epoch,
            });
            return;
        }

        perf_trace!(
            "Edit re-armed debounce ({} chars, {:?} until settle)",
            raw.len(),
            self.config.debounce
        );
        self.pending = Some(PendingQuery {
            query: raw,
            deadline: Instant::now() + self.config.debounce,
        });
    }

    /// The debounce deadline elapsed with no further edit: the pending
    /// query is settled, gets the next epoch, and goes out.
    fn handle_settled(&mut self) {
        let Some(pending) = self.pending.take() else {
            return;
        };

        self.current_epoch = self.current_epoch.next();
        debug!("Query settled at epoch {}; dispatching", self.current_epoch);
        self.dispatcher.dispatch(pending.query, self.current_epoch);
    }

    fn handle_outcome(&mut self, outcome: DispatchOutcome) {
        let epoch = outcome.epoch();

        if epoch != self.current_epoch {
            // A newer edit superseded this dispatch while it was in
            // flight. Internal signal only; never reaches the sink.
            self.metrics.stale_dropped.fetch_add(1, Ordering::SeqCst);
            debug!(
                "Dropping stale outcome for epoch {} (current {})",
                epoch, self.current_epoch
            );
            return;
        }

        match outcome {
            DispatchOutcome::Resolved { records, .. } => {
                let tally =
                    aggregate_problems(&records, &self.facets, self.config.max_tally_entries);
                debug!(
                    "Epoch {} resolved: {} records into {} categories ({} via fallback)",
                    epoch,
                    records.len(),
                    tally.len(),
                    tally.fallback_total()
                );
                self.emit(SinkEvent::TallyUpdated { epoch, tally });
            }
            DispatchOutcome::Failed { error, .. } => {
                self.metrics.failures.fetch_add(1, Ordering::SeqCst);
                warn!("Search failed at epoch {}: {}", epoch, error);
                // Prior tally stays displayed; stale-but-valid beats
                // blank.
                self.emit(SinkEvent::SearchFailed { epoch, error });
            }
        }
    }

    fn emit(&self, event: SinkEvent) {
        if self.sink.send(event).is_err() {
            debug!("Presentation sink dropped; event discarded");
        }
    }
}

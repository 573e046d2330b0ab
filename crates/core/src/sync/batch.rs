//! Batch sync coordinator
//!
//! Drives the orchestrator over many appointments with bounded concurrency
//! and partial-failure isolation: one item's failure never aborts the rest.

use std::sync::Arc;

use agendasync_domain::{
    constants::DEFAULT_BATCH_CONCURRENCY, AppointmentSnapshot, BatchItemResult, BatchStatus,
    SyncOutcome,
};
use futures::stream::{self, StreamExt};
use tracing::{info, instrument};

use super::orchestrator::SyncOrchestrator;

/// Fans appointments out to the orchestrator with a worker-pool limit so
/// provider rate limits are respected.
pub struct BatchCoordinator {
    orchestrator: Arc<SyncOrchestrator>,
    concurrency: usize,
}

impl BatchCoordinator {
    /// Create a coordinator with the default concurrency limit.
    pub fn new(orchestrator: Arc<SyncOrchestrator>) -> Self {
        Self { orchestrator, concurrency: DEFAULT_BATCH_CONCURRENCY }
    }

    /// Override the worker-pool limit.
    #[must_use]
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Synchronize every appointment, returning one report entry per item in
    /// input order so the caller can retry only the failed subset.
    ///
    /// Never raises: fatal per-item errors (store failures included) are
    /// captured in the item's entry.
    #[instrument(skip(self, appointments), fields(count = appointments.len()))]
    pub async fn sync_many(&self, appointments: &[AppointmentSnapshot]) -> Vec<BatchItemResult> {
        let mut indexed: Vec<(usize, BatchItemResult)> = stream::iter(
            appointments.iter().enumerate().map(|(index, snapshot)| {
                let orchestrator = Arc::clone(&self.orchestrator);
                async move {
                    let item = match orchestrator.sync_appointment(snapshot).await {
                        Ok(outcome) => item_from_outcome(outcome),
                        Err(err) => BatchItemResult {
                            appointment_id: snapshot.appointment_id.clone(),
                            result: BatchStatus::Error,
                            detail: Some(format!("{}: {err}", err.code())),
                        },
                    };
                    (index, item)
                }
            }),
        )
        .buffer_unordered(self.concurrency)
        .collect()
        .await;

        indexed.sort_by_key(|(index, _)| *index);
        let results: Vec<BatchItemResult> = indexed.into_iter().map(|(_, item)| item).collect();

        let failed = results.iter().filter(|r| r.result == BatchStatus::Error).count();
        info!(total = results.len(), failed, "batch sync completed");
        results
    }
}

fn item_from_outcome(outcome: SyncOutcome) -> BatchItemResult {
    match outcome.error {
        None => BatchItemResult {
            appointment_id: outcome.appointment_id,
            result: BatchStatus::Ok,
            detail: None,
        },
        Some(failure) => BatchItemResult {
            appointment_id: outcome.appointment_id,
            result: BatchStatus::Error,
            detail: Some(format!("{}: {}", failure.code, failure.message)),
        },
    }
}

use crate::{MessageClientError, StopReason};
use serde::Serialize;
use std::time::Duration;
use uuid::Uuid;

/// Outcome of one consumption run. Built once when the run ends.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConsumptionReport {
    pub run_id: Uuid,
    pub queue: String,
    pub messages_consumed: u64,
    pub messages_failed: u64,
    pub elapsed: Duration,
    pub stop_reason: StopReason,
}

/// A run aborted by the queue client. Carries whatever was consumed before the
/// failure so callers can still report it.
#[derive(Debug, thiserror::Error)]
#[error(
    "consumption of queue {} aborted after {} messages: {source}",
    .report.queue,
    .report.messages_consumed
)]
pub struct ConsumptionError {
    pub report: ConsumptionReport,
    #[source]
    pub source: MessageClientError,
}

impl ConsumptionError {
    pub fn report(&self) -> &ConsumptionReport {
        &self.report
    }

    pub fn into_report(self) -> ConsumptionReport {
        self.report
    }
}

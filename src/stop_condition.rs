use crate::ConsumptionConfig;
use serde::Serialize;
use std::fmt;
use tokio::time::Instant;

/// Why a consumption run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum StopReason {
    TimeLimit,
    CountLimit,
    EmptyQueue,
    Cancelled,
    FatalError,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StopReason::TimeLimit => "time-limit",
            StopReason::CountLimit => "count-limit",
            StopReason::EmptyQueue => "empty-queue",
            StopReason::Cancelled => "cancelled",
            StopReason::FatalError => "fatal-error",
        };
        f.write_str(s)
    }
}

/// Mutable bookkeeping of a single run. Only the worker touches it.
#[derive(Debug, Clone)]
pub(crate) struct ConsumptionState {
    pub(crate) started_at: Instant,
    pub(crate) messages_consumed: u64,
    pub(crate) messages_failed: u64,
}

impl ConsumptionState {
    pub(crate) fn start(started_at: Instant) -> Self {
        Self {
            started_at,
            messages_consumed: 0,
            messages_failed: 0,
        }
    }

    pub(crate) fn deadline(&self, config: &ConsumptionConfig) -> Option<Instant> {
        config.max_runtime().map(|max| self.started_at + max)
    }
}

/// Pre-fetch gate: `None` means the run may continue. Time is checked before
/// count, so a run that reaches both limits on the same iteration reports
/// `TimeLimit`.
pub(crate) fn evaluate(
    config: &ConsumptionConfig,
    state: &ConsumptionState,
    now: Instant,
) -> Option<StopReason> {
    if let Some(max_runtime) = config.max_runtime() {
        if now.saturating_duration_since(state.started_at) >= max_runtime {
            return Some(StopReason::TimeLimit);
        }
    }

    if let Some(max) = config.max_consumed_messages() {
        if state.messages_consumed >= max {
            return Some(StopReason::CountLimit);
        }
    }

    None
}

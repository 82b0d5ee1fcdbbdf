use crate::ConsumptionReport;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

pub const METRIC_NAMESPACE_MESSAGE_QUEUE: &str = "MessageQueue";
pub const METRIC_NAME_CONSUMER_MESSAGES_CONSUMED: &str = "ConsumerMessagesConsumed";
pub const METRIC_NAME_CONSUMER_RUNTIME: &str = "ConsumerRuntime";
pub const DIMENSION_QUEUE_NAME: &str = "QueueName";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MetricUnit {
    Count,
    Seconds,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metric {
    pub namespace: String,
    pub name: String,
    pub dimensions: BTreeMap<String, String>,
    pub value: f64,
    pub unit: MetricUnit,
    pub timestamp: DateTime<Utc>,
}

impl Metric {
    pub fn new(
        namespace: impl Into<String>,
        name: impl Into<String>,
        dimensions: BTreeMap<String, String>,
        value: f64,
        unit: MetricUnit,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
            dimensions,
            value,
            unit,
            timestamp: Utc::now(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum MetricPublisherError {
    #[error("metrics backend unavailable: {0}")]
    Unavailable(String),

    #[error("failed to encode metric: {0}")]
    Encoding(#[from] serde_json::Error),
}

#[async_trait]
pub trait MetricPublisher: Send + Sync {
    async fn publish(&self, metrics: Vec<Metric>) -> Result<(), MetricPublisherError>;
}

/// Writes each metric as a JSON line to the `metrics` log target, for log
/// pipelines that extract metrics from structured logs.
#[derive(Debug, Default, Clone)]
pub struct LogMetricPublisher;

#[async_trait]
impl MetricPublisher for LogMetricPublisher {
    async fn publish(&self, metrics: Vec<Metric>) -> Result<(), MetricPublisherError> {
        for metric in &metrics {
            let line = serde_json::to_string(metric)?;
            log::info!(target: "metrics", "{line}");
        }
        Ok(())
    }
}

/// Message count and runtime of a run, tagged with the physical queue name.
pub fn metrics_for_report(report: &ConsumptionReport, resolved_queue_name: &str) -> Vec<Metric> {
    let dimensions = BTreeMap::from([(
        DIMENSION_QUEUE_NAME.to_string(),
        resolved_queue_name.to_string(),
    )]);
    let runtime_seconds = (report.elapsed.as_secs_f64() * 100.0).round() / 100.0;

    vec![
        Metric::new(
            METRIC_NAMESPACE_MESSAGE_QUEUE,
            METRIC_NAME_CONSUMER_MESSAGES_CONSUMED,
            dimensions.clone(),
            report.messages_consumed as f64,
            MetricUnit::Count,
        ),
        Metric::new(
            METRIC_NAMESPACE_MESSAGE_QUEUE,
            METRIC_NAME_CONSUMER_RUNTIME,
            dimensions,
            runtime_seconds,
            MetricUnit::Seconds,
        ),
    ]
}

/// Fire-and-forget: a failing publisher is logged and otherwise ignored.
pub async fn report_metrics(
    publisher: &dyn MetricPublisher,
    report: &ConsumptionReport,
    resolved_queue_name: &str,
) {
    let metrics = metrics_for_report(report, resolved_queue_name);
    if let Err(e) = publisher.publish(metrics).await {
        log::warn!(
            "Failed to publish metrics for run {} on queue {resolved_queue_name}: {e}",
            report.run_id
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::MockMetricPublisher;
    use crate::StopReason;
    use std::time::Duration;
    use uuid::Uuid;

    fn report() -> ConsumptionReport {
        ConsumptionReport {
            run_id: Uuid::new_v4(),
            queue: "jobs".to_string(),
            messages_consumed: 42,
            messages_failed: 1,
            elapsed: Duration::from_millis(12_346),
            stop_reason: StopReason::EmptyQueue,
        }
    }

    #[test]
    fn test_metrics_for_report() {
        let metrics = metrics_for_report(&report(), "prod-jobs");

        assert_eq!(metrics.len(), 2);
        assert_eq!(metrics[0].name, METRIC_NAME_CONSUMER_MESSAGES_CONSUMED);
        assert_eq!(metrics[0].value, 42.0);
        assert_eq!(metrics[0].unit, MetricUnit::Count);
        assert_eq!(metrics[1].name, METRIC_NAME_CONSUMER_RUNTIME);
        assert_eq!(metrics[1].value, 12.35);
        assert_eq!(metrics[1].unit, MetricUnit::Seconds);
        for metric in &metrics {
            assert_eq!(metric.namespace, METRIC_NAMESPACE_MESSAGE_QUEUE);
            assert_eq!(
                metric.dimensions.get(DIMENSION_QUEUE_NAME).map(String::as_str),
                Some("prod-jobs")
            );
        }
    }

    #[tokio::test]
    async fn test_report_metrics_publishes() {
        // given
        let publisher = MockMetricPublisher::new();

        // when
        report_metrics(&publisher, &report(), "prod-jobs").await;

        // then
        assert_eq!(publisher.published().len(), 2);
    }

    #[tokio::test]
    async fn test_report_metrics_swallows_publisher_failure() {
        // given
        let publisher = MockMetricPublisher::failing();

        // when
        report_metrics(&publisher, &report(), "prod-jobs").await;

        // then
        assert!(publisher.published().is_empty());
    }

    #[tokio::test]
    async fn test_log_publisher_accepts_metrics() {
        let res = LogMetricPublisher
            .publish(metrics_for_report(&report(), "prod-jobs"))
            .await;

        assert!(res.is_ok());
    }
}

mod backoff;
mod cancellation;
mod client;
pub mod command;
mod config;
mod consumer;
mod message;
pub mod metrics;
mod report;
mod resolver;
mod stop_condition;
mod worker;

pub mod impls;

#[cfg(test)]
mod test_utils;

pub use cancellation::Cancellation;
pub use client::{MessageClientError, MessageSubClient, WaitPolicy};
pub use command::{CommandError, ConsumeCommand};
pub use config::{ConfigError, ConsumptionConfig, ConsumptionOptions, WorkerSettings};
pub use consumer::{MessageConsumer, MessageConsumptionError, MessageConsumptionOutcome};
pub use message::Message;
pub use metrics::{LogMetricPublisher, Metric, MetricPublisher, MetricPublisherError, MetricUnit};
pub use report::{ConsumptionError, ConsumptionReport};
pub use resolver::{LogicalQueue, PrefixQueueNameResolver, QueueNameResolver, ResolveError};
pub use stop_condition::StopReason;
pub use worker::Worker;

use crate::metrics::{report_metrics, MetricPublisher};
use crate::{
    ConfigError, ConsumptionConfig, ConsumptionError, ConsumptionOptions, ConsumptionReport,
    MessageClientError, QueueNameResolver, ResolveError, Worker,
};
use std::future::Future;
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("invalid consumption limits: {0}")]
    Config(#[from] ConfigError),

    #[error("failed to resolve queue name: {0}")]
    Resolve(#[from] ResolveError),

    #[error("failed to start queue client: {0}")]
    Client(#[from] MessageClientError),

    #[error(transparent)]
    Consumption(#[from] ConsumptionError),
}

impl CommandError {
    /// A run that started and then hit a fatal client error is still a
    /// graceful stop: its report was published and the error logged.
    pub fn exit_code(&self) -> u8 {
        match self {
            CommandError::Config(_) => 2,
            CommandError::Resolve(_) | CommandError::Client(_) => 1,
            CommandError::Consumption(_) => 0,
        }
    }
}

pub struct ConsumeCommand {
    resolver: Arc<dyn QueueNameResolver>,
    publisher: Arc<dyn MetricPublisher>,
}

impl ConsumeCommand {
    pub fn new(resolver: Arc<dyn QueueNameResolver>, publisher: Arc<dyn MetricPublisher>) -> Self {
        Self {
            resolver,
            publisher,
        }
    }

    /// `build_worker` receives the resolved physical queue name, so queue
    /// clients bound to a concrete resource can be created for this run.
    pub async fn execute<F, Fut>(
        &self,
        options: ConsumptionOptions,
        build_worker: F,
    ) -> Result<ConsumptionReport, CommandError>
    where
        F: FnOnce(String) -> Fut,
        Fut: Future<Output = Result<Worker, MessageClientError>>,
    {
        let config = ConsumptionConfig::try_from(options)?;
        let resolved = self.resolver.resolve(config.queue())?;
        log::debug!("Queue {} resolved to {resolved}", config.queue());

        let worker = build_worker(resolved.clone()).await?;

        match worker.consume(&config).await {
            Ok(report) => {
                report_metrics(self.publisher.as_ref(), &report, &resolved).await;
                Ok(report)
            }
            Err(e) => {
                report_metrics(self.publisher.as_ref(), e.report(), &resolved).await;
                Err(e.into())
            }
        }
    }
}

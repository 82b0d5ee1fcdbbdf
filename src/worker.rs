use crate::backoff::Backoff;
use crate::stop_condition::{self, ConsumptionState};
use crate::{
    Cancellation, ConsumptionConfig, ConsumptionError, ConsumptionReport, Message,
    MessageClientError, MessageConsumer, MessageConsumptionError, MessageConsumptionOutcome,
    MessageSubClient, StopReason, WorkerSettings,
};
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::time::Instant;
use uuid::Uuid;

pub struct Worker {
    message_client: Arc<dyn MessageSubClient>,
    message_consumer: Arc<dyn MessageConsumer>,
    settings: WorkerSettings,
    cancellation: Cancellation,
}

impl Worker {
    pub fn new(
        message_client: Arc<dyn MessageSubClient>,
        message_consumer: Arc<dyn MessageConsumer>,
    ) -> Self {
        Self {
            message_client,
            message_consumer,
            settings: WorkerSettings::default(),
            cancellation: Cancellation::new(),
        }
    }

    pub fn with_settings(mut self, settings: WorkerSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_cancellation(mut self, cancellation: Cancellation) -> Self {
        self.cancellation = cancellation;
        self
    }

    /// Handle that stops this worker gracefully at its next gate.
    pub fn cancellation(&self) -> Cancellation {
        self.cancellation.clone()
    }

    /// Consumes messages from `config.queue()` one at a time until a limit is
    /// reached, the queue runs dry (if asked to stop then), the run is
    /// cancelled, or the queue client fails fatally.
    ///
    /// Only fatal client errors are returned as `Err`, and they carry the
    /// partial report.
    pub async fn consume(
        &self,
        config: &ConsumptionConfig,
    ) -> Result<ConsumptionReport, ConsumptionError> {
        let run_id = Uuid::new_v4();
        let mut state = ConsumptionState::start(Instant::now());
        log::info!(
            "Starting consumption run {run_id} on queue {} \
             (max runtime: {:?}, max messages: {:?}, until empty: {})",
            config.queue(),
            config.max_runtime(),
            config.max_consumed_messages(),
            config.consume_until_empty()
        );

        let outcome = self.run_loop(config, &mut state).await;
        let stop_reason = match &outcome {
            Ok(reason) => *reason,
            Err(_) => StopReason::FatalError,
        };
        let report = ConsumptionReport {
            run_id,
            queue: config.queue().to_string(),
            messages_consumed: state.messages_consumed,
            messages_failed: state.messages_failed,
            elapsed: state.started_at.elapsed(),
            stop_reason,
        };

        match outcome {
            Ok(_) => {
                log::info!(
                    "Consumption run {run_id} stopped ({stop_reason}) after {} messages in {:?}",
                    report.messages_consumed,
                    report.elapsed
                );
                Ok(report)
            }
            Err(source) => {
                log::error!(
                    "Consumption run {run_id} aborted after {} messages: {source}",
                    report.messages_consumed
                );
                Err(ConsumptionError { report, source })
            }
        }
    }

    async fn run_loop(
        &self,
        config: &ConsumptionConfig,
        state: &mut ConsumptionState,
    ) -> Result<StopReason, MessageClientError> {
        let mut backoff = Backoff::new(&self.settings);

        loop {
            if let Some(reason) = self.gate(config, state) {
                return Ok(reason);
            }

            match self
                .message_client
                .fetch_message(config.queue(), self.settings.wait_policy)
                .await
            {
                Ok(Some(message)) => {
                    backoff.reset();
                    self.process_message(state, message).await?;
                }
                Ok(None) if config.consume_until_empty() => {
                    log::debug!("Queue {} is empty. Stopping.", config.queue());
                    return Ok(StopReason::EmptyQueue);
                }
                Ok(None) => {
                    self.pause(&mut backoff, state.deadline(config)).await;
                }
                Err(e) if !e.is_fatal() => {
                    log::warn!("Failed to fetch from queue {}: {e}. Retrying.", config.queue());
                    self.pause(&mut backoff, state.deadline(config)).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    // time and count come first so limits reached together stay deterministic
    fn gate(&self, config: &ConsumptionConfig, state: &ConsumptionState) -> Option<StopReason> {
        stop_condition::evaluate(config, state, Instant::now()).or_else(|| {
            self.cancellation
                .is_cancelled()
                .then_some(StopReason::Cancelled)
        })
    }

    // sleeps past neither the run's deadline nor a cancellation request
    async fn pause(&self, backoff: &mut Backoff, deadline: Option<Instant>) {
        let mut wake_at = Instant::now() + backoff.next_delay();
        if let Some(deadline) = deadline {
            wake_at = wake_at.min(deadline);
        }

        tokio::select! {
            _ = tokio::time::sleep_until(wake_at) => {}
            _ = self.cancellation.cancelled() => {}
        }
    }

    async fn process_message(
        &self,
        state: &mut ConsumptionState,
        message: Message,
    ) -> Result<(), MessageClientError> {
        let message_id = message.id().to_string();
        match self.dispatch(&message).await {
            Ok(outcome) => {
                match outcome {
                    MessageConsumptionOutcome::Succeeded => {
                        log::debug!("Successfully processed message {message_id}. Acknowledging.")
                    }
                    MessageConsumptionOutcome::Ignored => {
                        log::debug!("Ignoring message {message_id}. Acknowledging.")
                    }
                }
                match self.message_client.acknowledge(&message).await {
                    Ok(()) => state.messages_consumed += 1,
                    Err(e) if !e.is_fatal() => log::warn!(
                        "Failed to acknowledge message {message_id}: {e}. It will be redelivered."
                    ),
                    Err(e) => return Err(e),
                }
            }
            Err(reason) => {
                log::warn!("Failed to process message {message_id}: {reason}");
                state.messages_failed += 1;
                match self
                    .message_client
                    .negative_acknowledge(&message, &reason)
                    .await
                {
                    Ok(()) => {}
                    Err(e) if !e.is_fatal() => log::warn!(
                        "Failed to negatively acknowledge message {message_id}: {e}"
                    ),
                    Err(e) => return Err(e),
                }
            }
        }
        Ok(())
    }

    // a panicking consumer fails its message, not the run
    async fn dispatch(
        &self,
        message: &Message,
    ) -> Result<MessageConsumptionOutcome, MessageConsumptionError> {
        AssertUnwindSafe(self.message_consumer.consume(message))
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| {
                Err(MessageConsumptionError::Unrecoverable(format!(
                    "consumer panicked: {}",
                    panic_message(panic.as_ref())
                )))
            })
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.as_str()
    } else {
        "unknown panic payload"
    }
}

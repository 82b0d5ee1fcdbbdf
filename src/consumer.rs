use crate::Message;
use async_trait::async_trait;

/// Distinguishing between messages that were actually processed vs ignored
/// can be helpful for tracing and reporting. Both are acknowledged and both
/// count as consumed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageConsumptionOutcome {
    Succeeded,
    Ignored,
}

/// Depending on the error, a message might be retryable. The queue client
/// receives the error on negative acknowledgment and picks the disposal.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MessageConsumptionError {
    // can be retried in a bit, like a network issue, so it will go back on the queue
    #[error("transient processing failure: {0}")]
    Transient(String),

    // requires human intervention, like a malformed payload, so it will go on the DLQ
    #[error("unrecoverable processing failure: {0}")]
    Unrecoverable(String),
}

#[async_trait]
pub trait MessageConsumer: Send + Sync {
    async fn consume(
        &self,
        message: &Message,
    ) -> Result<MessageConsumptionOutcome, MessageConsumptionError>;
}

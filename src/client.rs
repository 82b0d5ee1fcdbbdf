use crate::{Message, MessageConsumptionError};
use async_trait::async_trait;
use std::time::Duration;

#[derive(Debug, Clone, thiserror::Error)]
pub enum MessageClientError {
    // can be retried in a bit, like a throttled request
    #[error("transient queue client error: {0}")]
    Transient(String),

    // the broker can't be reached at all
    #[error("queue connection failed: {0}")]
    Connection(String),

    // requires human intervention, like a queue that was never created
    #[error("queue resource not found: {0}")]
    ResourceNotFound(String),
}

impl MessageClientError {
    /// Fatal errors end a consumption run, transient ones are retried.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, MessageClientError::Transient(_))
    }
}

/// How long a single fetch may block waiting for a message to arrive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitPolicy {
    pub timeout: Duration,
}

impl WaitPolicy {
    pub fn no_wait() -> Self {
        Self {
            timeout: Duration::ZERO,
        }
    }

    pub fn wait_up_to(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for WaitPolicy {
    fn default() -> Self {
        Self::wait_up_to(Duration::from_secs(1))
    }
}

// This trait abstracts away message retrieval and disposal.
// Implementations will need to know the concrete queue API, including how it
// redelivers messages that were negatively acknowledged.
#[async_trait]
pub trait MessageSubClient: Send + Sync {
    /// Returns `Ok(None)` when no message became available within the wait policy.
    async fn fetch_message(
        &self,
        queue: &str,
        wait: WaitPolicy,
    ) -> Result<Option<Message>, MessageClientError>;

    async fn acknowledge(&self, message: &Message) -> Result<(), MessageClientError>;

    // the client decides whether the message is requeued or dead-lettered
    async fn negative_acknowledge(
        &self,
        message: &Message,
        reason: &MessageConsumptionError,
    ) -> Result<(), MessageClientError>;
}

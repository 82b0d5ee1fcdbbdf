use crate::WaitPolicy;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("max runtime must not be negative, got {0} seconds")]
    NegativeMaxRuntime(i64),

    #[error("max consumed messages must not be negative, got {0}")]
    NegativeMaxConsumedMessages(i64),

    #[error("queue identifier must not be empty")]
    EmptyQueue,
}

/// Limits as they arrive from the command line, before validation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConsumptionOptions {
    pub queue: String,
    pub max_runtime_secs: Option<i64>,
    pub max_consumed_messages: Option<i64>,
    pub consume_until_empty: bool,
}

/// Validated stop limits for one consumption run. With every limit unset the
/// run lasts until it is cancelled or the queue client fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsumptionConfig {
    queue: String,
    max_runtime: Option<Duration>,
    max_consumed_messages: Option<u64>,
    consume_until_empty: bool,
}

impl ConsumptionConfig {
    pub fn new(queue: impl Into<String>) -> Self {
        Self {
            queue: queue.into(),
            max_runtime: None,
            max_consumed_messages: None,
            consume_until_empty: false,
        }
    }

    pub fn with_max_runtime(mut self, max_runtime: Duration) -> Self {
        self.max_runtime = Some(max_runtime);
        self
    }

    pub fn with_max_consumed_messages(mut self, max: u64) -> Self {
        self.max_consumed_messages = Some(max);
        self
    }

    pub fn with_consume_until_empty(mut self, consume_until_empty: bool) -> Self {
        self.consume_until_empty = consume_until_empty;
        self
    }

    pub fn queue(&self) -> &str {
        &self.queue
    }

    pub fn max_runtime(&self) -> Option<Duration> {
        self.max_runtime
    }

    pub fn max_consumed_messages(&self) -> Option<u64> {
        self.max_consumed_messages
    }

    pub fn consume_until_empty(&self) -> bool {
        self.consume_until_empty
    }
}

impl TryFrom<ConsumptionOptions> for ConsumptionConfig {
    type Error = ConfigError;

    fn try_from(options: ConsumptionOptions) -> Result<Self, Self::Error> {
        if options.queue.trim().is_empty() {
            return Err(ConfigError::EmptyQueue);
        }

        let mut config = ConsumptionConfig::new(options.queue)
            .with_consume_until_empty(options.consume_until_empty);

        if let Some(secs) = options.max_runtime_secs {
            let secs = u64::try_from(secs).map_err(|_| ConfigError::NegativeMaxRuntime(secs))?;
            config = config.with_max_runtime(Duration::from_secs(secs));
        }

        if let Some(max) = options.max_consumed_messages {
            let max =
                u64::try_from(max).map_err(|_| ConfigError::NegativeMaxConsumedMessages(max))?;
            config = config.with_max_consumed_messages(max);
        }

        Ok(config)
    }
}

/// Tuning for the fetch loop, independent of any single run's limits.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkerSettings {
    /// How long one fetch may block waiting for a message.
    /// Default: 1 second
    pub wait_policy: WaitPolicy,
    /// First pause after an empty fetch or a transient client error.
    /// Default: 100 milliseconds
    pub initial_backoff: Duration,
    /// Upper bound for the pause between retries.
    /// Default: 5 seconds
    pub max_backoff: Duration,
    /// Growth factor applied to the pause after every consecutive empty fetch.
    /// Default: 2.0
    pub backoff_multiplier: f64,
}

impl Default for WorkerSettings {
    fn default() -> Self {
        Self {
            wait_policy: WaitPolicy::default(),
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_secs(5),
            backoff_multiplier: 2.0,
        }
    }
}

impl WorkerSettings {
    pub fn with_wait_policy(mut self, wait_policy: WaitPolicy) -> Self {
        self.wait_policy = wait_policy;
        self
    }

    pub fn with_initial_backoff(mut self, backoff: Duration) -> Self {
        self.initial_backoff = backoff;
        self
    }

    pub fn with_max_backoff(mut self, backoff: Duration) -> Self {
        self.max_backoff = backoff;
        self
    }

    pub fn with_backoff_multiplier(mut self, multiplier: f64) -> Self {
        self.backoff_multiplier = multiplier;
        self
    }
}

use std::fmt;

/// The logical queues this service knows how to consume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum LogicalQueue {
    Jobs,
    Notifications,
    Webhooks,
}

impl LogicalQueue {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogicalQueue::Jobs => "jobs",
            LogicalQueue::Notifications => "notifications",
            LogicalQueue::Webhooks => "webhooks",
        }
    }
}

impl fmt::Display for LogicalQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    #[error("queue name must not be empty")]
    EmptyName,
}

/// Maps a caller-facing queue identifier to the physical name used by the
/// queue client and metric dimensions.
pub trait QueueNameResolver: Send + Sync {
    fn resolve(&self, queue: &str) -> Result<String, ResolveError>;
}

/// Prepends a fixed prefix, usually the environment (`prod-`, `staging-`).
#[derive(Debug, Clone, Default)]
pub struct PrefixQueueNameResolver {
    prefix: String,
}

impl PrefixQueueNameResolver {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl QueueNameResolver for PrefixQueueNameResolver {
    fn resolve(&self, queue: &str) -> Result<String, ResolveError> {
        let queue = queue.trim();
        if queue.is_empty() {
            return Err(ResolveError::EmptyName);
        }
        Ok(format!("{}{queue}", self.prefix))
    }
}

use std::fmt::Debug;

/// A single message fetched from a queue. The body is opaque to the worker;
/// the receipt is whatever the queue client needs to acknowledge it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    id: String,
    content: String,
    receipt: Option<String>,
}

impl Message {
    pub fn new(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            receipt: None,
        }
    }

    // some technologies (like SQS) acknowledge by a handle that differs from the message id
    pub fn with_receipt(mut self, receipt: impl Into<String>) -> Self {
        self.receipt = Some(receipt.into());
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn receipt(&self) -> &str {
        self.receipt.as_deref().unwrap_or(&self.id)
    }
}

use crate::{
    Message, MessageClientError, MessageConsumer, MessageConsumptionError,
    MessageConsumptionOutcome, MessageSubClient, Metric, MetricPublisher, MetricPublisherError,
    WaitPolicy,
};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

/// One scripted answer of the mock client to a fetch.
#[derive(Debug, Clone)]
pub(crate) enum Fetch {
    Message(Message),
    Empty,
    Fail(MessageClientError),
}

pub(crate) struct MockMessageSubClient {
    script: Mutex<VecDeque<Fetch>>,
    endless: bool,
    fetch_latency: Option<Duration>,
    ack_error: Option<MessageClientError>,
    nack_error: Option<MessageClientError>,
    fetches: Mutex<usize>,
    acknowledged: Mutex<Vec<String>>,
    nacked: Mutex<Vec<(String, MessageConsumptionError)>>,
}

impl MockMessageSubClient {
    /// Answers fetches from `script`, then reports an empty queue forever.
    pub(crate) fn new(script: Vec<Fetch>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            endless: false,
            fetch_latency: None,
            ack_error: None,
            nack_error: None,
            fetches: Mutex::new(0),
            acknowledged: Mutex::new(Vec::new()),
            nacked: Mutex::new(Vec::new()),
        }
    }

    /// Always has another message.
    pub(crate) fn endless() -> Self {
        Self {
            endless: true,
            ..Self::new(Vec::new())
        }
    }

    pub(crate) fn with_fetch_latency(mut self, latency: Duration) -> Self {
        self.fetch_latency = Some(latency);
        self
    }

    pub(crate) fn fail_ack_with(mut self, err: MessageClientError) -> Self {
        self.ack_error = Some(err);
        self
    }

    /// Records every negative acknowledgment, then fails it.
    pub(crate) fn fail_nack_with(mut self, err: MessageClientError) -> Self {
        self.nack_error = Some(err);
        self
    }

    pub(crate) fn fetches(&self) -> usize {
        *self.fetches.lock().unwrap()
    }

    pub(crate) fn acknowledged(&self) -> Vec<String> {
        self.acknowledged.lock().unwrap().clone()
    }

    pub(crate) fn nacked(&self) -> Vec<String> {
        self.nacked
            .lock()
            .unwrap()
            .iter()
            .map(|(id, _)| id.clone())
            .collect()
    }

    pub(crate) fn nack_reasons(&self) -> Vec<MessageConsumptionError> {
        self.nacked
            .lock()
            .unwrap()
            .iter()
            .map(|(_, reason)| reason.clone())
            .collect()
    }
}

#[async_trait]
impl MessageSubClient for MockMessageSubClient {
    async fn fetch_message(
        &self,
        _queue: &str,
        _wait: WaitPolicy,
    ) -> Result<Option<Message>, MessageClientError> {
        let fetch_no = {
            let mut fetches = self.fetches.lock().unwrap();
            *fetches += 1;
            *fetches
        };
        if let Some(latency) = self.fetch_latency {
            tokio::time::sleep(latency).await;
        }

        if self.endless {
            return Ok(Some(Message::new(format!("msg-{fetch_no}"), "body")));
        }

        match self.script.lock().unwrap().pop_front() {
            Some(Fetch::Message(message)) => Ok(Some(message)),
            Some(Fetch::Fail(err)) => Err(err),
            Some(Fetch::Empty) | None => Ok(None),
        }
    }

    async fn acknowledge(&self, message: &Message) -> Result<(), MessageClientError> {
        if let Some(err) = &self.ack_error {
            return Err(err.clone());
        }
        self.acknowledged
            .lock()
            .unwrap()
            .push(message.id().to_string());
        Ok(())
    }

    async fn negative_acknowledge(
        &self,
        message: &Message,
        reason: &MessageConsumptionError,
    ) -> Result<(), MessageClientError> {
        self.nacked
            .lock()
            .unwrap()
            .push((message.id().to_string(), reason.clone()));
        match &self.nack_error {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

enum Behaviour {
    Ok(MessageConsumptionOutcome),
    FailFor(String, MessageConsumptionError),
    PanicFor(String),
}

pub(crate) struct MockMessageConsumer {
    behaviour: Behaviour,
}

impl MockMessageConsumer {
    pub(crate) fn return_ok(ok: MessageConsumptionOutcome) -> Self {
        Self {
            behaviour: Behaviour::Ok(ok),
        }
    }

    /// Fails the message with the given id and succeeds for every other one.
    pub(crate) fn fail_for(message_id: &str, err: MessageConsumptionError) -> Self {
        Self {
            behaviour: Behaviour::FailFor(message_id.to_string(), err),
        }
    }

    pub(crate) fn panic_for(message_id: &str) -> Self {
        Self {
            behaviour: Behaviour::PanicFor(message_id.to_string()),
        }
    }
}

#[async_trait]
impl MessageConsumer for MockMessageConsumer {
    async fn consume(
        &self,
        message: &Message,
    ) -> Result<MessageConsumptionOutcome, MessageConsumptionError> {
        match &self.behaviour {
            Behaviour::Ok(ok) => Ok(ok.clone()),
            Behaviour::FailFor(id, err) if id == message.id() => Err(err.clone()),
            Behaviour::PanicFor(id) if id == message.id() => panic!("cannot handle {id}"),
            _ => Ok(MessageConsumptionOutcome::Succeeded),
        }
    }
}

pub(crate) struct MockMetricPublisher {
    should_err: bool,
    published: Mutex<Vec<Metric>>,
}

impl MockMetricPublisher {
    pub(crate) fn new() -> Self {
        Self {
            should_err: false,
            published: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn failing() -> Self {
        Self {
            should_err: true,
            ..Self::new()
        }
    }

    pub(crate) fn published(&self) -> Vec<Metric> {
        self.published.lock().unwrap().clone()
    }
}

#[async_trait]
impl MetricPublisher for MockMetricPublisher {
    async fn publish(&self, metrics: Vec<Metric>) -> Result<(), MetricPublisherError> {
        if self.should_err {
            return Err(MetricPublisherError::Unavailable("backend down".into()));
        }
        self.published.lock().unwrap().extend(metrics);
        Ok(())
    }
}

use crate::{Message, MessageClientError, MessageConsumptionError, MessageSubClient, WaitPolicy};
use async_trait::async_trait;
use aws_sdk_sqs::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_sqs::operation::change_message_visibility::ChangeMessageVisibilityError;
use aws_sdk_sqs::operation::delete_message::DeleteMessageError;
use aws_sdk_sqs::operation::get_queue_url::GetQueueUrlError;
use aws_sdk_sqs::operation::receive_message::ReceiveMessageError;
use aws_sdk_sqs::operation::send_message::SendMessageError;
use aws_sdk_sqs::Client;

// SQS rejects long polling beyond this
const MAX_WAIT_TIME_SECONDS: u64 = 20;

pub struct MessageClientImplSqs {
    sqs_client: Client,
    queue_url: String,
    dlq_url: Option<String>,
}

impl MessageClientImplSqs {
    /// Looks up the queue (and dead-letter queue, if any) by name. A missing
    /// queue is reported as `ResourceNotFound`.
    pub async fn init(
        queue_name: &str,
        dlq_name: Option<&str>,
    ) -> Result<Self, MessageClientError> {
        let config = aws_config::load_from_env().await;
        let sqs_client = Client::new(&config);

        let queue_url = lookup_queue_url(&sqs_client, queue_name).await?;
        let dlq_url = match dlq_name {
            Some(name) => Some(lookup_queue_url(&sqs_client, name).await?),
            None => None,
        };

        Ok(Self {
            sqs_client,
            queue_url,
            dlq_url,
        })
    }

    async fn release(&self, message: &Message) -> Result<(), MessageClientError> {
        self.sqs_client
            .change_message_visibility()
            .queue_url(&self.queue_url)
            .receipt_handle(message.receipt())
            .visibility_timeout(0)
            .send()
            .await
            .map_err(client_error)?;
        Ok(())
    }
}

async fn lookup_queue_url(
    client: &Client,
    queue_name: &str,
) -> Result<String, MessageClientError> {
    let output = client
        .get_queue_url()
        .queue_name(queue_name)
        .send()
        .await
        .map_err(|e| match client_error(e) {
            MessageClientError::ResourceNotFound(_) => {
                MessageClientError::ResourceNotFound(queue_name.to_string())
            }
            other => other,
        })?;
    output
        .queue_url
        .ok_or_else(|| MessageClientError::ResourceNotFound(queue_name.to_string()))
}

// error codes SQS answers with when the caller's credentials are refused
const ACCESS_ERROR_CODES: &[&str] = &[
    "AccessDenied",
    "AccessDeniedException",
    "InvalidClientTokenId",
    "UnrecognizedClientException",
    "ExpiredToken",
    "SignatureDoesNotMatch",
    "InvalidSecurity",
];

/// Operation errors that can tell the queue they were sent to is gone.
trait QueueErrorKind {
    fn is_missing_queue(&self) -> bool;
}

impl QueueErrorKind for GetQueueUrlError {
    fn is_missing_queue(&self) -> bool {
        matches!(self, GetQueueUrlError::QueueDoesNotExist(_))
    }
}

impl QueueErrorKind for ReceiveMessageError {
    fn is_missing_queue(&self) -> bool {
        matches!(self, ReceiveMessageError::QueueDoesNotExist(_))
    }
}

impl QueueErrorKind for DeleteMessageError {
    fn is_missing_queue(&self) -> bool {
        matches!(self, DeleteMessageError::QueueDoesNotExist(_))
    }
}

impl QueueErrorKind for ChangeMessageVisibilityError {
    fn is_missing_queue(&self) -> bool {
        matches!(self, ChangeMessageVisibilityError::QueueDoesNotExist(_))
    }
}

impl QueueErrorKind for SendMessageError {
    fn is_missing_queue(&self) -> bool {
        matches!(self, SendMessageError::QueueDoesNotExist(_))
    }
}

// a missing queue, refused credentials or a request that never reached SQS end the run;
// anything else SQS answered is worth a retry
fn client_error<E, R>(err: SdkError<E, R>) -> MessageClientError
where
    E: QueueErrorKind + ProvideErrorMetadata + std::error::Error + 'static,
    R: std::fmt::Debug,
{
    let description = DisplayErrorContext(&err).to_string();
    match &err {
        SdkError::DispatchFailure(_)
        | SdkError::TimeoutError(_)
        | SdkError::ConstructionFailure(_) => MessageClientError::Connection(description),
        SdkError::ServiceError(ctx) if ctx.err().is_missing_queue() => {
            MessageClientError::ResourceNotFound(description)
        }
        SdkError::ServiceError(ctx)
            if ctx
                .err()
                .code()
                .is_some_and(|code| ACCESS_ERROR_CODES.contains(&code)) =>
        {
            MessageClientError::Connection(description)
        }
        _ => MessageClientError::Transient(description),
    }
}

#[async_trait]
impl MessageSubClient for MessageClientImplSqs {
    // the client is bound to one queue url at init
    async fn fetch_message(
        &self,
        _queue: &str,
        wait: WaitPolicy,
    ) -> Result<Option<Message>, MessageClientError> {
        let wait_time_seconds = wait.timeout.as_secs().min(MAX_WAIT_TIME_SECONDS) as i32;
        let message = self
            .sqs_client
            .receive_message()
            .queue_url(&self.queue_url)
            .max_number_of_messages(1)
            .wait_time_seconds(wait_time_seconds)
            .send()
            .await
            .map_err(client_error)?
            .messages
            .unwrap_or_default()
            .into_iter()
            .next()
            .map(Message::from);
        Ok(message)
    }

    async fn acknowledge(&self, message: &Message) -> Result<(), MessageClientError> {
        self.sqs_client
            .delete_message()
            .queue_url(&self.queue_url)
            .receipt_handle(message.receipt())
            .send()
            .await
            .map_err(client_error)?;
        Ok(())
    }

    async fn negative_acknowledge(
        &self,
        message: &Message,
        reason: &MessageConsumptionError,
    ) -> Result<(), MessageClientError> {
        match (reason, &self.dlq_url) {
            (MessageConsumptionError::Transient(_), _) => self.release(message).await,
            (MessageConsumptionError::Unrecoverable(_), Some(dlq_url)) => {
                self.sqs_client
                    .send_message()
                    .queue_url(dlq_url)
                    .message_body(message.content())
                    .send()
                    .await
                    .map_err(client_error)?;
                self.acknowledge(message).await
            }
            (MessageConsumptionError::Unrecoverable(_), None) => {
                // without a DLQ of our own, the queue's redrive policy takes over once the
                // visibility timeout expires
                log::debug!(
                    "No dead letter queue configured for message {}. Leaving it invisible.",
                    message.id()
                );
                Ok(())
            }
        }
    }
}

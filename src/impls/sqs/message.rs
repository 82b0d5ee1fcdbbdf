use crate::Message;
use aws_sdk_sqs::types::Message as SqsMessage;

impl From<SqsMessage> for Message {
    fn from(value: SqsMessage) -> Self {
        let message = Message::new(
            value.message_id.unwrap_or_default(),
            value.body.unwrap_or_default(),
        );
        match value.receipt_handle {
            Some(handle) => message.with_receipt(handle),
            None => message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_receipt_handle_is_used_for_acknowledgment() {
        let sqs = SqsMessage::builder()
            .message_id("id-1")
            .receipt_handle("handle-1")
            .body("{}")
            .build();

        let msg = Message::from(sqs);

        assert_eq!(msg.id(), "id-1");
        assert_eq!(msg.receipt(), "handle-1");
        assert_eq!(msg.content(), "{}");
    }
}

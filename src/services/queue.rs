//! Work queue client
//!
//! Thin wrapper over SQS at-least-once delivery: the producer enqueues one
//! message per created product and replicated workers long-poll the shared
//! queue. A message is only deleted after its product has been fully
//! processed and committed; everything else is left to expire back into
//! visibility for redelivery.

use crate::error::{AppError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// A received queue message: the product to enhance plus the lease token
/// used to acknowledge it
#[derive(Debug, Clone)]
pub struct QueueMessage {
    pub product_id: i64,
    pub receipt: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct MessageBody {
    product_id: i64,
}

#[async_trait]
pub trait EnhancementQueue: Send + Sync {
    /// Enqueue a product for enhancement
    async fn send(&self, product_id: i64) -> Result<()>;

    /// Long-poll for up to `max_messages`, waiting at most `wait_time_secs`
    /// when the queue is empty. Returns an empty list on timeout.
    async fn receive(&self, max_messages: i32, wait_time_secs: i32) -> Result<Vec<QueueMessage>>;

    /// Acknowledge a message so it is never redelivered
    async fn delete(&self, receipt: &str) -> Result<()>;
}

/// SQS-backed enhancement queue
pub struct SqsQueue {
    client: aws_sdk_sqs::Client,
    queue_url: String,
}

impl SqsQueue {
    pub fn new(client: aws_sdk_sqs::Client, queue_url: String) -> Self {
        info!(queue_url = %queue_url, "SQS queue client initialized");
        Self { client, queue_url }
    }
}

#[async_trait]
impl EnhancementQueue for SqsQueue {
    async fn send(&self, product_id: i64) -> Result<()> {
        let body = serde_json::to_string(&MessageBody { product_id })?;

        self.client
            .send_message()
            .queue_url(&self.queue_url)
            .message_body(body)
            .send()
            .await
            .map_err(|e| AppError::Queue(format!("Failed to send message: {e}")))?;

        info!(product_id, "Enqueued product for image enhancement");
        Ok(())
    }

    async fn receive(&self, max_messages: i32, wait_time_secs: i32) -> Result<Vec<QueueMessage>> {
        let response = self
            .client
            .receive_message()
            .queue_url(&self.queue_url)
            .max_number_of_messages(max_messages)
            .wait_time_seconds(wait_time_secs)
            .send()
            .await
            .map_err(|e| AppError::Queue(format!("Failed to receive messages: {e}")))?;

        let mut messages = Vec::new();
        for message in response.messages.unwrap_or_default() {
            let Some(receipt) = message.receipt_handle else {
                warn!("Received SQS message without receipt handle, skipping");
                continue;
            };

            match message
                .body
                .as_deref()
                .ok_or_else(|| AppError::Queue("empty message body".to_string()))
                .and_then(|body| {
                    serde_json::from_str::<MessageBody>(body)
                        .map_err(|e| AppError::Queue(format!("invalid message body: {e}")))
                }) {
                Ok(body) => messages.push(QueueMessage {
                    product_id: body.product_id,
                    receipt,
                }),
                Err(e) => {
                    // Redelivery cannot fix a malformed message; drop it for good.
                    warn!(error = %e, "Discarding malformed queue message");
                    self.delete(&receipt).await?;
                }
            }
        }

        Ok(messages)
    }

    async fn delete(&self, receipt: &str) -> Result<()> {
        self.client
            .delete_message()
            .queue_url(&self.queue_url)
            .receipt_handle(receipt)
            .send()
            .await
            .map_err(|e| AppError::Queue(format!("Failed to delete message: {e}")))?;

        Ok(())
    }
}

/// Initialize an AWS SQS client, sharing the same credential/region handling
/// as the S3 client
pub async fn sqs_client(config: &crate::config::S3Config) -> aws_sdk_sqs::Client {
    use aws_sdk_sqs::config::Region;

    let mut builder = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(Region::new(config.region.clone()));

    if let (Some(access_key_id), Some(secret_access_key)) =
        (&config.access_key_id, &config.secret_access_key)
    {
        use aws_sdk_sqs::config::Credentials;

        let credentials = Credentials::new(
            access_key_id,
            secret_access_key,
            None,
            None,
            "catalog_service_sqs",
        );
        builder = builder.credentials_provider(credentials);
    }

    let aws_config = builder.load().await;
    aws_sdk_sqs::Client::new(&aws_config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_body_round_trip() {
        let body = serde_json::to_string(&MessageBody { product_id: 42 }).unwrap();
        assert_eq!(body, r#"{"product_id":42}"#);

        let parsed: MessageBody = serde_json::from_str(&body).unwrap();
        assert_eq!(parsed.product_id, 42);
    }

    #[test]
    fn malformed_body_is_rejected() {
        assert!(serde_json::from_str::<MessageBody>(r#"{"id": "x"}"#).is_err());
    }
}

use lapin::{
    BasicProperties, Channel, Connection, ConnectionProperties,
    options::{BasicAckOptions, BasicGetOptions, BasicPublishOptions, BasicQosOptions, QueueDeclareOptions},
    types::FieldTable,
};
use tracing::{debug, info};

use crate::{
    clients::{DeadLetterStore, DurableQueue, ReceivedMessage},
    config::Config,
    error::AppError,
    models::envelope::{DlqMessage, QueueEnvelope},
};

/// Durable queue transport. Three durable queues: the retry queue holding
/// deferred envelopes, the dead-letter queue for exhausted payloads, and a
/// drain-signal queue carrying best-effort wake-up messages for the drainer
/// schedule.
pub struct RabbitMqClient {
    channel: Channel,
    retry_queue_name: String,
    dead_letter_queue_name: String,
    drain_signal_queue_name: String,
}

impl RabbitMqClient {
    pub async fn connect(config: &Config) -> Result<Self, AppError> {
        info!("Connecting to RabbitMQ...");

        let connection = Connection::connect(&config.rabbitmq_url, ConnectionProperties::default())
            .await
            .map_err(|e| AppError::Infrastructure(format!("failed to connect to RabbitMQ: {e}")))?;

        let channel = connection.create_channel().await.map_err(|e| {
            AppError::Infrastructure(format!("RabbitMQ channel creation failed: {e}"))
        })?;

        channel
            .basic_qos(config.prefetch_count, BasicQosOptions::default())
            .await
            .map_err(|e| AppError::Infrastructure(format!("failed to set up QoS: {e}")))?;

        for queue_name in [
            &config.retry_queue_name,
            &config.dead_letter_queue_name,
            &config.drain_signal_queue_name,
        ] {
            channel
                .queue_declare(
                    queue_name,
                    QueueDeclareOptions {
                        durable: true,
                        ..Default::default()
                    },
                    FieldTable::default(),
                )
                .await
                .map_err(|e| {
                    AppError::Infrastructure(format!("failed to declare queue '{queue_name}': {e}"))
                })?;
        }

        info!(
            retry_queue = %config.retry_queue_name,
            dead_letter_queue = %config.dead_letter_queue_name,
            "RabbitMQ queues declared"
        );

        Ok(Self {
            channel,
            retry_queue_name: config.retry_queue_name.clone(),
            dead_letter_queue_name: config.dead_letter_queue_name.clone(),
            drain_signal_queue_name: config.drain_signal_queue_name.clone(),
        })
    }

    async fn publish(&self, queue_name: &str, body: &[u8]) -> Result<(), AppError> {
        self.channel
            .basic_publish(
                "",
                queue_name,
                BasicPublishOptions::default(),
                body,
                BasicProperties::default().with_delivery_mode(2),
            )
            .await
            .map_err(|e| {
                AppError::Infrastructure(format!("failed to publish to '{queue_name}': {e}"))
            })?;

        Ok(())
    }
}

impl DurableQueue for RabbitMqClient {
    async fn enqueue(&self, envelope: &QueueEnvelope) -> Result<(), AppError> {
        let body = serde_json::to_vec(envelope)
            .map_err(|e| AppError::DataProcessing(format!("failed to serialize envelope: {e}")))?;

        self.publish(&self.retry_queue_name, &body).await?;

        debug!(
            message_id = %envelope.payload.header.id,
            intentos = envelope.intentos,
            "Envelope enqueued"
        );

        Ok(())
    }

    async fn receive_batch(&self, max_messages: usize) -> Result<Vec<ReceivedMessage>, AppError> {
        let mut batch = Vec::new();

        while batch.len() < max_messages {
            let message = self
                .channel
                .basic_get(&self.retry_queue_name, BasicGetOptions::default())
                .await
                .map_err(|e| {
                    AppError::Infrastructure(format!("failed to receive from retry queue: {e}"))
                })?;

            match message {
                Some(message) => {
                    batch.push(ReceivedMessage {
                        receipt: message.delivery.delivery_tag,
                        body: message.delivery.data,
                    });
                }
                // Queue reports empty; the batch ends here.
                None => break,
            }
        }

        Ok(batch)
    }

    async fn ack(&self, receipt: u64) -> Result<(), AppError> {
        self.channel
            .basic_ack(receipt, BasicAckOptions::default())
            .await
            .map_err(|e| AppError::Infrastructure(format!("failed to acknowledge message: {e}")))?;

        Ok(())
    }

    async fn signal_drain(&self) -> Result<(), AppError> {
        self.publish(&self.drain_signal_queue_name, b"{}").await?;

        debug!("Drain signal published");

        Ok(())
    }
}

impl DeadLetterStore for RabbitMqClient {
    async fn deposit(&self, record: &DlqMessage) -> Result<(), AppError> {
        let body = serde_json::to_vec(record).map_err(|e| {
            AppError::DataProcessing(format!("failed to serialize dead-letter record: {e}"))
        })?;

        self.publish(&self.dead_letter_queue_name, &body).await?;

        info!(
            message_id = %record.payload.header.id,
            reason = %record.failure_reason,
            "Payload deposited to dead-letter queue"
        );

        Ok(())
    }
}

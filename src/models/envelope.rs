use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::models::payload::NotificationPayload;

/// Durable-queue wrapper around a payload. `intentos` counts failed
/// re-delivery attempts by the drainer; the correlation id inside the payload
/// stays fixed across the whole lineage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueEnvelope {
    pub payload: NotificationPayload,
    pub intentos: u32,
    pub enqueued_at: DateTime<Utc>,
}

impl QueueEnvelope {
    /// First deferral of a freshly built payload.
    pub fn new(payload: NotificationPayload) -> Self {
        Self {
            payload,
            intentos: 0,
            enqueued_at: Utc::now(),
        }
    }

    /// Copy re-enqueued after a failed delivery attempt.
    pub fn incremented(&self) -> Self {
        Self {
            payload: self.payload.clone(),
            intentos: self.intentos + 1,
            enqueued_at: Utc::now(),
        }
    }
}

/// Terminal record deposited for manual inspection once the retry budget is
/// spent. Attempt history is summarized into `failure_reason`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DlqMessage {
    pub payload: NotificationPayload,
    pub failure_reason: String,
    pub failed_at: String,
}

impl DlqMessage {
    pub fn exhausted(envelope: &QueueEnvelope, max_retries: u32) -> Self {
        Self {
            payload: envelope.payload.clone(),
            failure_reason: format!(
                "retry budget exhausted after {} of {} attempts",
                envelope.intentos, max_retries
            ),
            failed_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        }
    }
}

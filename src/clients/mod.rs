pub mod auth;
pub mod health;
pub mod notifier;
pub mod params;
pub mod queue;

use crate::{
    error::AppError,
    models::{
        envelope::{DlqMessage, QueueEnvelope},
        outcome::SendOutcome,
        payload::NotificationPayload,
    },
};

/// One message pulled off the durable queue. The body stays raw bytes so the
/// drainer can classify a malformed envelope itself instead of losing the
/// whole batch to a parse error.
#[derive(Debug, Clone)]
pub struct ReceivedMessage {
    pub body: Vec<u8>,
    pub receipt: u64,
}

/// Operator-controlled circuit breaker. Read fresh on every dispatch; a read
/// failure is a configuration error, never a silent default.
#[allow(async_fn_in_trait)]
pub trait MaintenanceGate {
    async fn is_maintenance_mode(&self) -> Result<bool, AppError>;

    /// Flip the gate to active after a failed synchronous send so subsequent
    /// traffic short-circuits to the queue path.
    async fn activate(&self) -> Result<(), AppError>;
}

#[allow(async_fn_in_trait)]
pub trait DurableQueue {
    async fn enqueue(&self, envelope: &QueueEnvelope) -> Result<(), AppError>;

    /// Bounded batch receive; an empty batch means the queue reports empty.
    async fn receive_batch(&self, max_messages: usize) -> Result<Vec<ReceivedMessage>, AppError>;

    /// Acknowledge a processed message. Un-acked messages are redelivered by
    /// the broker.
    async fn ack(&self, receipt: u64) -> Result<(), AppError>;

    /// Best-effort, fire-and-forget trigger of an out-of-band drain cycle.
    async fn signal_drain(&self) -> Result<(), AppError>;
}

#[allow(async_fn_in_trait)]
pub trait DeadLetterStore {
    async fn deposit(&self, record: &DlqMessage) -> Result<(), AppError>;
}

/// Wrapper around the synchronous notifier call. Failures come back as
/// explicit outcomes, not errors, so the queue-vs-fail decision is a match.
#[allow(async_fn_in_trait)]
pub trait Notifier {
    async fn send(&self, payload: &NotificationPayload, token: Option<&str>) -> SendOutcome;
}

#[allow(async_fn_in_trait)]
pub trait TokenSource {
    /// `None` when the notifier does not require authentication.
    async fn bearer_token(&self) -> Result<Option<String>, AppError>;
}

use std::fmt::{Display, Formatter, Result};

use serde::{Deserialize, Serialize};

/// Final disposition of one dispatch or drain step for a single notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryOutcome {
    Sent,
    Queued,
    QueuedAfterFailure,
    DeadLettered,
    RejectedInvalid,
}

impl Display for DeliveryOutcome {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            DeliveryOutcome::Sent => write!(f, "sent"),
            DeliveryOutcome::Queued => write!(f, "queued"),
            DeliveryOutcome::QueuedAfterFailure => write!(f, "queued_after_failure"),
            DeliveryOutcome::DeadLettered => write!(f, "dead_lettered"),
            DeliveryOutcome::RejectedInvalid => write!(f, "rejected_invalid"),
        }
    }
}

/// Result of one HTTP attempt against the notifier, returned by the call
/// wrapper instead of being raised, so the queue-vs-fail decision is a plain
/// match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    Sent,
    Timeout,
    ConnectionFailed,
    HttpError(u16),
}

impl SendOutcome {
    /// Server errors the session-level retry is allowed to re-attempt before
    /// the outcome is handed to the dispatcher.
    pub fn is_transient_server_error(&self) -> bool {
        matches!(self, SendOutcome::HttpError(500 | 502 | 503 | 504))
    }

    /// A failed synchronous attempt that suggests the notifier itself is down,
    /// which is what trips the maintenance gate. A timeout stays ambiguous
    /// (the request may have been accepted) and does not trip it.
    pub fn indicates_notifier_down(&self) -> bool {
        matches!(
            self,
            SendOutcome::ConnectionFailed | SendOutcome::HttpError(_)
        )
    }
}

impl Display for SendOutcome {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            SendOutcome::Sent => write!(f, "sent"),
            SendOutcome::Timeout => write!(f, "timeout"),
            SendOutcome::ConnectionFailed => write!(f, "connection_failed"),
            SendOutcome::HttpError(status) => write!(f, "http_error({status})"),
        }
    }
}

use serde::Serialize;

use crate::{
    error::{AppError, CODE_VALIDATION, FieldError},
    models::outcome::DeliveryOutcome,
    utils::process_timestamp,
};

pub const CODE_SENT: u32 = 0;
pub const CODE_QUEUED: u32 = 10;
pub const CODE_QUEUED_AFTER_FAILURE: u32 = 69;

/// Response body of the ingress endpoint. Field names follow the legacy
/// contract so existing callers keep working; the numeric code, not the
/// message text, is the programmatic discriminator.
#[derive(Debug, Clone, Serialize)]
pub struct DispatchResponse {
    #[serde(rename = "codigoError")]
    pub code: u32,

    pub message: String,

    #[serde(rename = "messageId")]
    pub message_id: String,

    pub timestamp: String,
}

impl DispatchResponse {
    pub fn for_outcome(outcome: DeliveryOutcome, message_id: &str) -> Self {
        let (code, message) = match outcome {
            DeliveryOutcome::Sent => (CODE_SENT, "notification delivered"),
            DeliveryOutcome::Queued => (CODE_QUEUED, "notification queued for deferred delivery"),
            DeliveryOutcome::QueuedAfterFailure => (
                CODE_QUEUED_AFTER_FAILURE,
                "delivery failed, notification queued for retry",
            ),
            DeliveryOutcome::DeadLettered => {
                (CODE_QUEUED_AFTER_FAILURE, "notification dead-lettered")
            }
            DeliveryOutcome::RejectedInvalid => (CODE_VALIDATION, "notification rejected"),
        };

        Self {
            code,
            message: message.to_string(),
            message_id: message_id.to_string(),
            timestamp: process_timestamp(),
        }
    }

    pub fn for_error(error: &AppError) -> Self {
        Self {
            code: error.code(),
            message: error.to_string(),
            message_id: String::new(),
            timestamp: process_timestamp(),
        }
    }
}

/// 400 body for structurally invalid events: a short error plus the full
/// field-level detail list.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationResponse {
    pub error: String,
    pub message: Vec<FieldError>,
}

impl ValidationResponse {
    pub fn new(errors: Vec<FieldError>) -> Self {
        Self {
            error: "request validation failed".to_string(),
            message: errors,
        }
    }
}

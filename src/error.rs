use serde::Serialize;
use thiserror::Error;

pub const CODE_VALIDATION: u32 = 7001;
pub const CODE_CONFIGURATION: u32 = 7011;
pub const CODE_INFRASTRUCTURE: u32 = 7021;
pub const CODE_DATA_PROCESSING: u32 = 7031;

/// A single field-level validation failure, surfaced in the 400 response body.
#[derive(Debug, Clone, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    /// Required configuration, secret or reference parameter is missing or
    /// malformed. Fatal for the invocation; nothing has been enqueued yet.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The inbound event failed structural checks. Never reaches the
    /// dispatcher.
    #[error("request validation failed ({} field(s))", .0.len())]
    Validation(Vec<FieldError>),

    /// Upstream data could not be interpreted, e.g. a token exchange response
    /// without an `access_token`.
    #[error("data processing error: {0}")]
    DataProcessing(String),

    /// The queue or parameter store is unreachable. There is no fallback tier
    /// below the durable queue, so this propagates to the caller.
    #[error("infrastructure error: {0}")]
    Infrastructure(String),
}

impl AppError {
    /// Numeric code carried in every response body so callers can classify
    /// failures without parsing message text.
    pub fn code(&self) -> u32 {
        match self {
            AppError::Configuration(_) => CODE_CONFIGURATION,
            AppError::Validation(_) => CODE_VALIDATION,
            AppError::DataProcessing(_) => CODE_DATA_PROCESSING,
            AppError::Infrastructure(_) => CODE_INFRASTRUCTURE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_distinct_per_variant() {
        let errors = [
            AppError::Configuration("x".into()),
            AppError::Validation(vec![]),
            AppError::DataProcessing("x".into()),
            AppError::Infrastructure("x".into()),
        ];

        let mut codes: Vec<u32> = errors.iter().map(|e| e.code()).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), 4);
    }
}

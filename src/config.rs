use dotenvy::dotenv;
use serde::Deserialize;

use crate::{error::AppError, models::retry::RetryConfig};

#[derive(Clone, Deserialize, Debug)]
pub struct Config {
    pub rabbitmq_url: String,
    pub retry_queue_name: String,
    pub dead_letter_queue_name: String,
    pub drain_signal_queue_name: String,
    pub prefetch_count: u16,

    pub redis_url: String,
    pub maintenance_flag_key: String,
    pub reference_params_key: String,

    pub notifier_url: String,
    pub notifier_timeout_seconds: u64,

    pub auth_url: Option<String>,
    pub auth_credentials_key: Option<String>,
    pub auth_scope: Option<String>,

    pub max_retries: u32,

    pub session_retry_attempts: u32,
    pub session_initial_delay_ms: u64,
    pub session_max_delay_ms: u64,
    pub session_backoff_multiplier: u64,

    pub receive_batch_size: usize,

    pub environment: String,

    pub server_port: u16,
}

impl Config {
    pub fn load() -> Result<Self, AppError> {
        dotenv().ok();

        let config = envy::from_env::<Self>().map_err(|e| {
            AppError::Configuration(format!("invalid or missing environment variable: {e}"))
        })?;

        config.validate()?;

        Ok(config)
    }

    /// Cross-field checks envy cannot express: bearer auth needs a credential
    /// reference, and the notifier timeout must be non-zero so an invocation
    /// cannot hang on the synchronous call.
    fn validate(&self) -> Result<(), AppError> {
        if self.auth_url.is_some() && self.auth_credentials_key.is_none() {
            return Err(AppError::Configuration(
                "auth_url is set but auth_credentials_key is missing".to_string(),
            ));
        }

        if self.notifier_timeout_seconds == 0 {
            return Err(AppError::Configuration(
                "notifier_timeout_seconds must be greater than zero".to_string(),
            ));
        }

        if self.receive_batch_size == 0 {
            return Err(AppError::Configuration(
                "receive_batch_size must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }

    /// Bounded retry for transient 5xx responses inside one synchronous call,
    /// applied by the notifier session.
    pub fn session_retry_config(&self) -> RetryConfig {
        RetryConfig {
            max_attempts: self.session_retry_attempts,
            initial_delay_ms: self.session_initial_delay_ms,
            max_delay_ms: self.session_max_delay_ms,
            backoff_multiplier: self.session_backoff_multiplier,
        }
    }
}

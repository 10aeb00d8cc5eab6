use std::time::Duration;

use reqwest::Client;
use tracing::{debug, info, warn};

use crate::{
    clients::Notifier,
    config::Config,
    error::AppError,
    models::{outcome::SendOutcome, payload::NotificationPayload, retry::RetryConfig},
    utils::retry_with_backoff,
};

/// HTTP session for the notifier gateway: a bounded per-call timeout plus
/// bounded automatic retry for transient 5xx responses. Timeouts and
/// connection errors are not retried here; the durable queue is their
/// recovery path.
pub struct NotifierClient {
    http_client: Client,
    notifier_url: String,
    session_retry: RetryConfig,
}

impl NotifierClient {
    pub fn new(config: &Config) -> Result<Self, AppError> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.notifier_timeout_seconds))
            .build()
            .map_err(|e| {
                AppError::Configuration(format!("failed to build notifier HTTP client: {e}"))
            })?;

        info!(notifier_url = %config.notifier_url, "Notifier client initialized");

        Ok(Self {
            http_client,
            notifier_url: config.notifier_url.clone(),
            session_retry: config.session_retry_config(),
        })
    }

    async fn send_once(&self, payload: &NotificationPayload, token: Option<&str>) -> SendOutcome {
        let mut request = self.http_client.post(&self.notifier_url).json(payload);

        if let Some(token) = token {
            request = request.bearer_auth(token);
        }

        match request.send().await {
            Ok(response) => {
                let status = response.status();

                if status.is_success() {
                    SendOutcome::Sent
                } else {
                    debug!(
                        message_id = %payload.header.id,
                        status = status.as_u16(),
                        "Notifier rejected the request"
                    );
                    SendOutcome::HttpError(status.as_u16())
                }
            }
            Err(e) if e.is_timeout() => {
                debug!(message_id = %payload.header.id, "Notifier call timed out");
                SendOutcome::Timeout
            }
            Err(e) => {
                debug!(message_id = %payload.header.id, error = %e, "Notifier call failed");
                SendOutcome::ConnectionFailed
            }
        }
    }
}

impl Notifier for NotifierClient {
    async fn send(&self, payload: &NotificationPayload, token: Option<&str>) -> SendOutcome {
        let outcome = retry_with_backoff(&self.session_retry, || async {
            match self.send_once(payload, token).await {
                o if o.is_transient_server_error() => Err(o),
                o => Ok(o),
            }
        })
        .await
        .unwrap_or_else(|exhausted| exhausted);

        match outcome {
            SendOutcome::Sent => {
                info!(message_id = %payload.header.id, "Notification sent to notifier")
            }
            other => {
                warn!(message_id = %payload.header.id, outcome = %other, "Notifier delivery failed")
            }
        }

        outcome
    }
}

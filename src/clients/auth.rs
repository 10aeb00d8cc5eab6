use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::{
    clients::{TokenSource, params::ParameterStore},
    config::Config,
    error::AppError,
};

/// Client id/secret pair stored as a JSON secret in the parameter store.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientCredentials {
    pub client_id: String,
    pub client_secret: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: Option<String>,
}

/// Client-credentials exchange against the auth endpoint: form-encoded POST
/// with Basic-auth framing of the client id/secret and an optional scope.
/// A successful exchange must yield a non-empty `access_token`.
pub async fn exchange_client_credentials(
    http_client: &Client,
    auth_url: &str,
    credentials: &ClientCredentials,
    scope: Option<&str>,
) -> Result<String, AppError> {
    let mut form = vec![("grant_type", "client_credentials".to_string())];

    if let Some(scope) = scope {
        form.push(("scope", scope.to_string()));
    }

    let response = http_client
        .post(auth_url)
        .basic_auth(&credentials.client_id, Some(&credentials.client_secret))
        .form(&form)
        .send()
        .await
        .map_err(|e| AppError::Infrastructure(format!("token exchange failed: {e}")))?;

    let status = response.status();

    if !status.is_success() {
        return Err(AppError::DataProcessing(format!(
            "token exchange returned status {}",
            status.as_u16()
        )));
    }

    let body: TokenResponse = response.json().await.map_err(|e| {
        AppError::DataProcessing(format!("token exchange response is not valid JSON: {e}"))
    })?;

    match body.access_token {
        Some(token) if !token.is_empty() => Ok(token),
        _ => Err(AppError::DataProcessing(
            "token exchange response has no access_token".to_string(),
        )),
    }
}

/// Token provider for outbound notifier calls. Credentials live in the
/// parameter store; each invocation re-authenticates, so a rotated credential
/// takes effect immediately.
pub struct TokenProvider {
    http_client: Client,
    params: ParameterStore,
    auth_url: Option<String>,
    credentials_key: Option<String>,
    scope: Option<String>,
}

impl TokenProvider {
    pub fn new(config: &Config, params: ParameterStore) -> Result<Self, AppError> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.notifier_timeout_seconds))
            .build()
            .map_err(|e| {
                AppError::Configuration(format!("failed to build auth HTTP client: {e}"))
            })?;

        Ok(Self {
            http_client,
            params,
            auth_url: config.auth_url.clone(),
            credentials_key: config.auth_credentials_key.clone(),
            scope: config.auth_scope.clone(),
        })
    }

    async fn load_credentials(&self, credentials_key: &str) -> Result<ClientCredentials, AppError> {
        let secret = self
            .params
            .get_string(credentials_key)
            .await?
            .ok_or_else(|| {
                AppError::Configuration(format!(
                    "auth credential secret '{credentials_key}' is not set"
                ))
            })?;

        serde_json::from_str(&secret).map_err(|e| {
            AppError::Configuration(format!("auth credential secret is malformed: {e}"))
        })
    }
}

impl TokenSource for TokenProvider {
    async fn bearer_token(&self) -> Result<Option<String>, AppError> {
        let Some(auth_url) = &self.auth_url else {
            return Ok(None);
        };

        let credentials_key = self.credentials_key.as_ref().ok_or_else(|| {
            AppError::Configuration("auth credential reference is not configured".to_string())
        })?;

        let credentials = self.load_credentials(credentials_key).await?;

        let token = exchange_client_credentials(
            &self.http_client,
            auth_url,
            &credentials,
            self.scope.as_deref(),
        )
        .await?;

        debug!("Bearer token obtained");

        Ok(Some(token))
    }
}

use std::collections::HashMap;

use redis::{AsyncCommands, Client, aio::MultiplexedConnection};
use tracing::{info, warn};

use crate::{clients::MaintenanceGate, config::Config, error::AppError};

/// Key-value parameter store backed by Redis. Holds the operator-controlled
/// maintenance flag, the reference-parameter hash (business-unit labels) and
/// the auth credential secret. Every read goes to the store; nothing is
/// cached in-process.
#[derive(Clone)]
pub struct ParameterStore {
    connection: MultiplexedConnection,
    maintenance_flag_key: String,
    reference_params_key: String,
}

/// The legacy flag is stored as text; comparison happens here at the loading
/// boundary, never inside the dispatcher.
pub fn normalize_flag(raw: &str) -> bool {
    matches!(raw.trim().to_ascii_lowercase().as_str(), "true" | "1")
}

impl ParameterStore {
    pub async fn connect(config: &Config) -> Result<Self, AppError> {
        let client = Client::open(config.redis_url.as_str())
            .map_err(|e| AppError::Configuration(format!("invalid redis url: {e}")))?;

        let connection = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| {
                AppError::Infrastructure(format!("failed to connect to parameter store: {e}"))
            })?;

        info!("Parameter store connection established");

        Ok(Self {
            connection,
            maintenance_flag_key: config.maintenance_flag_key.clone(),
            reference_params_key: config.reference_params_key.clone(),
        })
    }

    pub async fn get_string(&self, key: &str) -> Result<Option<String>, AppError> {
        let mut conn = self.connection.clone();

        conn.get(key).await.map_err(|e| {
            AppError::Infrastructure(format!("parameter store read failed for '{key}': {e}"))
        })
    }

    /// Named reference parameters (display names, default message labels)
    /// supplied to the payload builder.
    pub async fn reference_params(&self) -> Result<HashMap<String, String>, AppError> {
        let mut conn = self.connection.clone();

        let params: HashMap<String, String> =
            conn.hgetall(&self.reference_params_key).await.map_err(|e| {
                AppError::Infrastructure(format!("failed to read reference parameters: {e}"))
            })?;

        Ok(params)
    }
}

impl MaintenanceGate for ParameterStore {
    async fn is_maintenance_mode(&self) -> Result<bool, AppError> {
        let raw = self
            .get_string(&self.maintenance_flag_key)
            .await?
            .ok_or_else(|| {
                AppError::Configuration(format!(
                    "maintenance flag '{}' is not set",
                    self.maintenance_flag_key
                ))
            })?;

        let active = normalize_flag(&raw);

        if active {
            warn!("Maintenance mode is active, notifier traffic is deferred");
        }

        Ok(active)
    }

    async fn activate(&self) -> Result<(), AppError> {
        let mut conn = self.connection.clone();

        conn.set::<_, _, ()>(&self.maintenance_flag_key, "true")
            .await
            .map_err(|e| {
                AppError::Infrastructure(format!("failed to activate maintenance flag: {e}"))
            })?;

        warn!("Maintenance flag activated after a failed synchronous delivery");

        Ok(())
    }
}

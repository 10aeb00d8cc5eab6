use std::collections::HashMap;

use chrono::Utc;
use uuid::Uuid;

use crate::{
    error::AppError,
    models::{
        event::InboundEvent,
        payload::{NotificationPayload, PayloadHeader, PayloadInfo},
    },
};

pub const PARAM_REF_COMPANY: &str = "ref_company";
pub const PARAM_LOGIN_ENTERPRISE: &str = "login_enterprise";
pub const PARAM_REF_CONTRACT: &str = "ref_contract";
pub const PARAM_DEFAULT_MSG_LABEL: &str = "default_msg_label";

/// Correlation identifier: 3-character channel code, timestamp to seconds,
/// opaque 8-character suffix. Uniqueness is the requirement, not
/// unpredictability. The identifier is generated once per logical
/// notification and travels unchanged through every retry.
pub fn correlation_id(channel: &str) -> String {
    let code: String = channel.trim().chars().take(3).collect();
    let timestamp = Utc::now().format("%Y%m%d%H%M%S");
    let suffix = Uuid::new_v4().simple().to_string();

    format!("{code:0>3}{timestamp}{}", &suffix[..8])
}

/// Maps a validated event plus the reference parameters from the parameter
/// store into the notifier wire format. Pure; no I/O beyond identifier
/// generation. A missing required reference parameter aborts the build so the
/// caller never dispatches a partially built payload.
pub fn build_payload(
    event: &InboundEvent,
    reference_params: &HashMap<String, String>,
) -> Result<NotificationPayload, AppError> {
    let ref_company = required_param(reference_params, PARAM_REF_COMPANY)?;
    let login_enterprise = required_param(reference_params, PARAM_LOGIN_ENTERPRISE)?;
    let ref_contract = required_param(reference_params, PARAM_REF_CONTRACT)?;

    let ref_msg_label = match &event.ref_msg_label {
        Some(label) if !label.trim().is_empty() => label.clone(),
        _ => required_param(reference_params, PARAM_DEFAULT_MSG_LABEL)?,
    };

    Ok(NotificationPayload {
        header: PayloadHeader {
            id: correlation_id(&event.channel),
            ref_company,
            ref_service: event.ref_service.clone(),
            key_value: event.key_value.clone(),
            channels: event.channel.clone(),
            ref_msg_label,
        },
        info: PayloadInfo {
            login_enterprise,
            ref_contract,
        },
        data: event.data.clone(),
        addresses: event.addresses.clone(),
        contents: event.contents.clone(),
    })
}

fn required_param(
    reference_params: &HashMap<String, String>,
    name: &str,
) -> Result<String, AppError> {
    reference_params
        .get(name)
        .filter(|value| !value.trim().is_empty())
        .cloned()
        .ok_or_else(|| {
            AppError::Configuration(format!("required reference parameter '{name}' is missing"))
        })
}

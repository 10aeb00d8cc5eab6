use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{
    error::{AppError, FieldError},
    models::payload::{Address, Content},
};

pub const ADDRESS_TYPE_EMAIL: &str = "email";
pub const ADDRESS_TYPE_PHONE: &str = "phone";

/// Inbound card event as received on the ingress endpoint. One event maps to
/// one notification; the schema/business validation of the source record has
/// already happened upstream, so only structural checks remain here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundEvent {
    /// Delivery channel identifier (e.g. "APP", "WEB").
    pub channel: String,

    /// Service/event mnemonic the notifier uses to pick a message template.
    pub ref_service: String,

    /// Customer or entity reference keying the notification.
    pub key_value: String,

    /// Optional override for the default message label from the parameter
    /// store.
    #[serde(default)]
    pub ref_msg_label: Option<String>,

    /// Event-specific fields (masked card number, amount, dates, merchant).
    #[serde(default)]
    pub data: HashMap<String, serde_json::Value>,

    pub addresses: Vec<Address>,

    #[serde(default)]
    pub contents: Vec<Content>,
}

/// Collects every structural problem instead of stopping at the first, so the
/// caller gets the full field-level list in one round trip.
pub fn validate_event(event: &InboundEvent) -> Result<(), AppError> {
    let mut errors = Vec::new();

    if event.channel.trim().is_empty() {
        errors.push(FieldError::new("channel", "channel identifier is required"));
    }

    if event.ref_service.trim().is_empty() {
        errors.push(FieldError::new(
            "ref_service",
            "service reference code is required",
        ));
    }

    if event.key_value.trim().is_empty() {
        errors.push(FieldError::new("key_value", "keying value is required"));
    }

    if event.addresses.is_empty() {
        errors.push(FieldError::new(
            "addresses",
            "at least one delivery address is required",
        ));
    }

    for (index, address) in event.addresses.iter().enumerate() {
        if address.class_name.trim().is_empty() {
            errors.push(FieldError::new(
                format!("addresses[{index}].className"),
                "className is required",
            ));
        }

        if address.address_type != ADDRESS_TYPE_EMAIL && address.address_type != ADDRESS_TYPE_PHONE
        {
            errors.push(FieldError::new(
                format!("addresses[{index}].type"),
                format!(
                    "type must be '{ADDRESS_TYPE_EMAIL}' or '{ADDRESS_TYPE_PHONE}', got '{}'",
                    address.address_type
                ),
            ));
        }

        if address.destination.trim().is_empty() {
            errors.push(FieldError::new(
                format!("addresses[{index}].ref"),
                "destination value is required",
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(errors))
    }
}

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Wire-format message accepted by the notifier gateway. Field names follow
/// the gateway contract, so every struct here serializes in camelCase.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationPayload {
    pub header: PayloadHeader,
    pub info: PayloadInfo,
    pub data: HashMap<String, serde_json::Value>,
    pub addresses: Vec<Address>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub contents: Vec<Content>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayloadHeader {
    /// Correlation identifier, stable across retries of the same logical
    /// notification so downstream deduplication can suppress duplicates.
    pub id: String,
    pub ref_company: String,
    pub ref_service: String,
    pub key_value: String,
    pub channels: String,
    pub ref_msg_label: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayloadInfo {
    pub login_enterprise: String,
    pub ref_contract: String,
}

/// A typed delivery destination (email or phone).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub class_name: String,

    #[serde(rename = "type")]
    pub address_type: String,

    #[serde(rename = "ref")]
    pub destination: String,
}

/// Optional textual or binary attachment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Content {
    pub value: String,

    #[serde(rename = "type")]
    pub content_type: String,

    pub encoding: String,
    pub name: String,
}

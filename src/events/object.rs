//! Object event payloads emitted by the storage module.

use serde::Deserialize;

use super::de;

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct CreateObject {
    #[serde(deserialize_with = "de::address")]
    pub creator: String,
    #[serde(deserialize_with = "de::address")]
    pub owner: String,
    pub bucket_name: String,
    pub object_name: String,
    #[serde(deserialize_with = "de::ledger_id")]
    pub bucket_id: String,
    #[serde(deserialize_with = "de::ledger_id")]
    pub object_id: String,
    #[serde(deserialize_with = "de::number")]
    pub create_at: i64,
    #[serde(default, deserialize_with = "de::stored_u64")]
    pub payload_size: i64,
    #[serde(default)]
    pub visibility: String,
    #[serde(default)]
    pub content_type: String,
    pub status: String,
    #[serde(default)]
    pub redundancy_type: String,
    #[serde(default)]
    pub source_type: String,
    #[serde(default, deserialize_with = "de::checksums")]
    pub checksums: Vec<String>,
    #[serde(default, deserialize_with = "de::number")]
    pub local_virtual_group_id: u32,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct SealObject {
    #[serde(default, deserialize_with = "de::address")]
    pub operator: String,
    pub bucket_name: String,
    pub object_name: String,
    #[serde(deserialize_with = "de::ledger_id")]
    pub object_id: String,
    pub status: String,
    #[serde(default, deserialize_with = "de::number")]
    pub local_virtual_group_id: u32,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct CancelCreateObject {
    #[serde(default, deserialize_with = "de::address")]
    pub operator: String,
    pub bucket_name: String,
    pub object_name: String,
    #[serde(deserialize_with = "de::ledger_id")]
    pub object_id: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct CopyObject {
    #[serde(default, deserialize_with = "de::address")]
    pub operator: String,
    pub dst_bucket_name: String,
    pub dst_object_name: String,
    #[serde(deserialize_with = "de::ledger_id")]
    pub src_object_id: String,
    #[serde(deserialize_with = "de::ledger_id")]
    pub dst_object_id: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct DeleteObject {
    pub bucket_name: String,
    pub object_name: String,
    #[serde(deserialize_with = "de::ledger_id")]
    pub object_id: String,
    #[serde(default, deserialize_with = "de::number")]
    pub local_virtual_group_id: u32,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct RejectSealObject {
    #[serde(default, deserialize_with = "de::address")]
    pub operator: String,
    pub bucket_name: String,
    pub object_name: String,
    #[serde(deserialize_with = "de::ledger_id")]
    pub object_id: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct DiscontinueObject {
    pub bucket_name: String,
    #[serde(deserialize_with = "de::ledger_id")]
    pub object_id: String,
    #[serde(default, deserialize_with = "de::number")]
    pub delete_at: i64,
    #[serde(default)]
    pub reason: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct UpdateObjectInfo {
    #[serde(default, deserialize_with = "de::address")]
    pub operator: String,
    pub bucket_name: String,
    pub object_name: String,
    #[serde(deserialize_with = "de::ledger_id")]
    pub object_id: String,
    #[serde(default)]
    pub visibility: String,
}

/// Start of a content update. Carries no content type.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct UpdateObjectContent {
    #[serde(deserialize_with = "de::address")]
    pub operator: String,
    #[serde(deserialize_with = "de::ledger_id")]
    pub object_id: String,
    pub bucket_name: String,
    pub object_name: String,
    #[serde(default, deserialize_with = "de::stored_u64")]
    pub payload_size: i64,
    #[serde(default, deserialize_with = "de::checksums")]
    pub checksums: Vec<String>,
    #[serde(default, deserialize_with = "de::number")]
    pub version: i64,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct UpdateObjectContentSuccess {
    #[serde(deserialize_with = "de::address")]
    pub operator: String,
    #[serde(deserialize_with = "de::ledger_id")]
    pub object_id: String,
    pub bucket_name: String,
    pub object_name: String,
    #[serde(default)]
    pub content_type: String,
    #[serde(default, deserialize_with = "de::stored_u64")]
    pub new_payload_size: i64,
    #[serde(default, deserialize_with = "de::checksums")]
    pub new_checksums: Vec<String>,
    #[serde(default, deserialize_with = "de::number")]
    pub version: i64,
    #[serde(default, deserialize_with = "de::number")]
    pub updated_at: i64,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct CancelUpdateObjectContent {
    pub bucket_name: String,
    pub object_name: String,
    #[serde(deserialize_with = "de::ledger_id")]
    pub object_id: String,
}

/// Cross-chain mirror request. Carries no source chain id.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct MirrorObject {
    pub bucket_name: String,
    pub object_name: String,
    #[serde(deserialize_with = "de::ledger_id")]
    pub object_id: String,
    #[serde(deserialize_with = "de::number")]
    pub dest_chain_id: u32,
}

/// Cross-chain mirror acknowledgement. `status == 0` means success.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct MirrorObjectResult {
    #[serde(default, deserialize_with = "de::number")]
    pub status: u32,
    pub bucket_name: String,
    pub object_name: String,
    #[serde(deserialize_with = "de::ledger_id")]
    pub object_id: String,
    #[serde(deserialize_with = "de::number")]
    pub dest_chain_id: u32,
}

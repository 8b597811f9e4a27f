//! Bucket event payloads emitted by the storage module.

use serde::Deserialize;

use super::de;

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct CreateBucket {
    #[serde(deserialize_with = "de::address")]
    pub owner: String,
    pub bucket_name: String,
    #[serde(default)]
    pub visibility: String,
    #[serde(deserialize_with = "de::number")]
    pub create_at: i64,
    #[serde(deserialize_with = "de::ledger_id")]
    pub bucket_id: String,
    #[serde(default)]
    pub source_type: String,
    #[serde(default, deserialize_with = "de::stored_u64")]
    pub charged_read_quota: i64,
    #[serde(deserialize_with = "de::address")]
    pub payment_address: String,
    #[serde(default, deserialize_with = "de::number")]
    pub global_virtual_group_family_id: u32,
    pub status: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct DeleteBucket {
    pub bucket_name: String,
    #[serde(deserialize_with = "de::ledger_id")]
    pub bucket_id: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct UpdateBucketInfo {
    pub bucket_name: String,
    #[serde(deserialize_with = "de::ledger_id")]
    pub bucket_id: String,
    #[serde(default, deserialize_with = "de::stored_u64")]
    pub charged_read_quota: i64,
    #[serde(deserialize_with = "de::address")]
    pub payment_address: String,
    #[serde(default)]
    pub visibility: String,
    #[serde(default, deserialize_with = "de::number")]
    pub global_virtual_group_family_id: u32,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct DiscontinueBucket {
    #[serde(deserialize_with = "de::ledger_id")]
    pub bucket_id: String,
    pub bucket_name: String,
    #[serde(default)]
    pub reason: String,
    #[serde(default, deserialize_with = "de::number")]
    pub delete_at: i64,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct MigrationBucket {
    pub bucket_name: String,
    #[serde(deserialize_with = "de::ledger_id")]
    pub bucket_id: String,
    #[serde(deserialize_with = "de::number")]
    pub dst_primary_sp_id: u32,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct CompleteMigrationBucket {
    pub bucket_name: String,
    #[serde(deserialize_with = "de::ledger_id")]
    pub bucket_id: String,
    #[serde(default, deserialize_with = "de::number")]
    pub global_virtual_group_family_id: u32,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct CancelMigrationBucket {
    pub bucket_name: String,
    #[serde(deserialize_with = "de::ledger_id")]
    pub bucket_id: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct RejectMigrateBucket {
    pub bucket_name: String,
    #[serde(deserialize_with = "de::ledger_id")]
    pub bucket_id: String,
}

//! Represents an object stored in a bucket, as materialized from the ledger.

use serde::Serialize;
use sqlx::FromRow;

use super::patch::{Field, UpdateStamp};

pub const OBJECT_STATUS_CREATED: &str = "OBJECT_STATUS_CREATED";
pub const OBJECT_STATUS_SEALED: &str = "OBJECT_STATUS_SEALED";
pub const OBJECT_STATUS_DISCONTINUED: &str = "OBJECT_STATUS_DISCONTINUED";

pub const MIRROR_STATUS_PENDING: &str = "pending";
pub const MIRROR_STATUS_SUCCESS: &str = "success";
pub const MIRROR_STATUS_FAILED: &str = "failed";

/// Placeholder failure reason. The mirror result event only carries a status
/// code; replace once the ledger reports a real reason.
pub const MIRROR_FAILED_REASON: &str = "Mirror operation failed on destination chain";

/// The all-zero address, written when an updater is cleared.
pub const ZERO_ADDRESS: &str = "0x0000000000000000000000000000000000000000";

/// An object record.
///
/// The record holds metadata only; payload bytes live with the storage
/// providers. `object_id` never changes after creation.
#[derive(Serialize, Clone, FromRow, Debug, PartialEq, Eq)]
pub struct Object {
    /// Ledger object id as a 32-byte `0x` hash.
    pub object_id: String,
    pub bucket_id: String,
    pub bucket_name: String,
    pub object_name: String,

    pub creator: String,
    pub owner: String,
    pub operator: String,
    pub updater: String,

    pub payload_size: i64,
    /// Base64-encoded piece checksums, stored as a JSON array.
    #[sqlx(json)]
    pub checksums: Vec<String>,
    pub content_type: String,
    pub version: i64,
    pub redundancy_type: String,
    pub visibility: String,
    pub source_type: String,

    pub status: String,
    /// Soft-delete marker. Once set it is never cleared.
    pub removed: bool,
    pub local_virtual_group_id: u32,
    pub sealed_tx_hash: String,
    pub delete_reason: String,
    pub delete_at: i64,

    /// True while a content update is pending on the storage providers.
    pub is_updating: bool,
    pub content_updated_time: i64,

    pub mirror_status: String,
    pub mirror_fail_reason: String,
    pub dest_chain_id: u32,
    pub source_chain_id: u32,

    pub create_at: i64,
    pub create_tx_hash: String,
    pub create_time: i64,
    pub update_at: i64,
    pub update_tx_hash: String,
    pub update_time: i64,
}

/// Partial update of an [`Object`].
///
/// `removed` follows the same one-way rule as [`super::bucket::BucketPatch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectPatch {
    pub operator: Field<String>,
    pub updater: Field<String>,
    pub payload_size: Field<i64>,
    pub checksums: Field<Vec<String>>,
    pub content_type: Field<String>,
    pub version: Field<i64>,
    pub visibility: Field<String>,
    pub status: Field<String>,
    pub removed: bool,
    pub local_virtual_group_id: Field<u32>,
    pub sealed_tx_hash: Field<String>,
    pub delete_reason: Field<String>,
    pub delete_at: Field<i64>,
    pub is_updating: Field<bool>,
    pub content_updated_time: Field<i64>,
    pub mirror_status: Field<String>,
    pub mirror_fail_reason: Field<String>,
    pub dest_chain_id: Field<u32>,
    pub source_chain_id: Field<u32>,
    pub stamp: UpdateStamp,
}

impl ObjectPatch {
    pub fn new(stamp: UpdateStamp) -> Self {
        Self {
            operator: Field::Unset,
            updater: Field::Unset,
            payload_size: Field::Unset,
            checksums: Field::Unset,
            content_type: Field::Unset,
            version: Field::Unset,
            visibility: Field::Unset,
            status: Field::Unset,
            removed: false,
            local_virtual_group_id: Field::Unset,
            sealed_tx_hash: Field::Unset,
            delete_reason: Field::Unset,
            delete_at: Field::Unset,
            is_updating: Field::Unset,
            content_updated_time: Field::Unset,
            mirror_status: Field::Unset,
            mirror_fail_reason: Field::Unset,
            dest_chain_id: Field::Unset,
            source_chain_id: Field::Unset,
            stamp,
        }
    }

    pub fn columns(&self) -> Vec<&'static str> {
        let mut columns = Vec::new();
        let optional = [
            ("operator", self.operator.is_set()),
            ("updater", self.updater.is_set()),
            ("payload_size", self.payload_size.is_set()),
            ("checksums", self.checksums.is_set()),
            ("content_type", self.content_type.is_set()),
            ("version", self.version.is_set()),
            ("visibility", self.visibility.is_set()),
            ("status", self.status.is_set()),
            ("removed", self.removed),
            ("local_virtual_group_id", self.local_virtual_group_id.is_set()),
            ("sealed_tx_hash", self.sealed_tx_hash.is_set()),
            ("delete_reason", self.delete_reason.is_set()),
            ("delete_at", self.delete_at.is_set()),
            ("is_updating", self.is_updating.is_set()),
            ("content_updated_time", self.content_updated_time.is_set()),
            ("mirror_status", self.mirror_status.is_set()),
            ("mirror_fail_reason", self.mirror_fail_reason.is_set()),
            ("dest_chain_id", self.dest_chain_id.is_set()),
            ("source_chain_id", self.source_chain_id.is_set()),
        ];
        columns.extend(optional.iter().filter(|(_, set)| *set).map(|(c, _)| *c));
        columns.extend(["update_at", "update_tx_hash", "update_time"]);
        columns
    }
}

#[cfg(test)]
impl Object {
    pub fn apply(&mut self, patch: &ObjectPatch) {
        patch.operator.apply_to(&mut self.operator);
        patch.updater.apply_to(&mut self.updater);
        patch.payload_size.apply_to(&mut self.payload_size);
        patch.checksums.apply_to(&mut self.checksums);
        patch.content_type.apply_to(&mut self.content_type);
        patch.version.apply_to(&mut self.version);
        patch.visibility.apply_to(&mut self.visibility);
        patch.status.apply_to(&mut self.status);
        if patch.removed {
            self.removed = true;
        }
        patch
            .local_virtual_group_id
            .apply_to(&mut self.local_virtual_group_id);
        patch.sealed_tx_hash.apply_to(&mut self.sealed_tx_hash);
        patch.delete_reason.apply_to(&mut self.delete_reason);
        patch.delete_at.apply_to(&mut self.delete_at);
        patch.is_updating.apply_to(&mut self.is_updating);
        patch
            .content_updated_time
            .apply_to(&mut self.content_updated_time);
        patch.mirror_status.apply_to(&mut self.mirror_status);
        patch.mirror_fail_reason.apply_to(&mut self.mirror_fail_reason);
        patch.dest_chain_id.apply_to(&mut self.dest_chain_id);
        patch.source_chain_id.apply_to(&mut self.source_chain_id);
        self.update_at = patch.stamp.update_at;
        self.update_tx_hash = patch.stamp.update_tx_hash.clone();
        self.update_time = patch.stamp.update_time;
    }
}

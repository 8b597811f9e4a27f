//! Represents a bucket as materialized from the ledger's storage module.

use serde::Serialize;
use sqlx::FromRow;

use super::patch::{Field, UpdateStamp};

pub const BUCKET_STATUS_CREATED: &str = "BUCKET_STATUS_CREATED";
pub const BUCKET_STATUS_DISCONTINUED: &str = "BUCKET_STATUS_DISCONTINUED";
pub const BUCKET_STATUS_MIGRATING: &str = "BUCKET_STATUS_MIGRATING";

/// Recorded when a migration is rejected. The ledger event carries no reason.
pub const MIGRATION_REJECTED_REASON: &str = "Migration rejected";

/// A bucket record.
///
/// Created once from `EventCreateBucket` and afterwards only changed through
/// [`BucketPatch`] merges. `bucket_id` and `bucket_name` never change.
#[derive(Serialize, Clone, FromRow, Debug, PartialEq, Eq)]
pub struct Bucket {
    /// Ledger bucket id as a 32-byte `0x` hash.
    pub bucket_id: String,
    pub bucket_name: String,

    pub owner: String,
    pub payment_address: String,
    pub operator: String,
    pub global_virtual_group_family_id: u32,
    pub charged_read_quota: i64,
    pub visibility: String,
    pub source_type: String,

    pub status: String,
    /// Soft-delete marker. Once set it is never cleared.
    pub removed: bool,
    pub delete_reason: String,
    pub delete_at: i64,

    /// Migration bookkeeping. At most one of in-progress (start time and
    /// destination SP), completed, or rejected is populated.
    pub migration_start_time: Option<i64>,
    pub dest_primary_sp_id: String,
    pub migration_complete_time: Option<i64>,
    pub migration_reject_reason: String,

    pub create_at: i64,
    pub create_tx_hash: String,
    pub create_time: i64,
    pub update_at: i64,
    pub update_tx_hash: String,
    pub update_time: i64,
}

/// Partial update of a [`Bucket`].
///
/// Identity columns are deliberately absent. `removed` is a one-way request:
/// `true` soft-deletes the bucket, `false` leaves the column untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketPatch {
    pub payment_address: Field<String>,
    pub global_virtual_group_family_id: Field<u32>,
    pub charged_read_quota: Field<i64>,
    pub visibility: Field<String>,
    pub status: Field<String>,
    pub removed: bool,
    pub delete_reason: Field<String>,
    pub delete_at: Field<i64>,
    pub migration_start_time: Field<Option<i64>>,
    pub dest_primary_sp_id: Field<String>,
    pub migration_complete_time: Field<Option<i64>>,
    pub migration_reject_reason: Field<String>,
    pub stamp: UpdateStamp,
}

impl BucketPatch {
    /// An empty patch that only refreshes the update audit columns.
    pub fn new(stamp: UpdateStamp) -> Self {
        Self {
            payment_address: Field::Unset,
            global_virtual_group_family_id: Field::Unset,
            charged_read_quota: Field::Unset,
            visibility: Field::Unset,
            status: Field::Unset,
            removed: false,
            delete_reason: Field::Unset,
            delete_at: Field::Unset,
            migration_start_time: Field::Unset,
            dest_primary_sp_id: Field::Unset,
            migration_complete_time: Field::Unset,
            migration_reject_reason: Field::Unset,
            stamp,
        }
    }

    /// Names of the columns this patch writes, audit columns included.
    pub fn columns(&self) -> Vec<&'static str> {
        let mut columns = Vec::new();
        let optional = [
            ("payment_address", self.payment_address.is_set()),
            (
                "global_virtual_group_family_id",
                self.global_virtual_group_family_id.is_set(),
            ),
            ("charged_read_quota", self.charged_read_quota.is_set()),
            ("visibility", self.visibility.is_set()),
            ("status", self.status.is_set()),
            ("removed", self.removed),
            ("delete_reason", self.delete_reason.is_set()),
            ("delete_at", self.delete_at.is_set()),
            ("migration_start_time", self.migration_start_time.is_set()),
            ("dest_primary_sp_id", self.dest_primary_sp_id.is_set()),
            (
                "migration_complete_time",
                self.migration_complete_time.is_set(),
            ),
            (
                "migration_reject_reason",
                self.migration_reject_reason.is_set(),
            ),
        ];
        columns.extend(optional.iter().filter(|(_, set)| *set).map(|(c, _)| *c));
        columns.extend(["update_at", "update_tx_hash", "update_time"]);
        columns
    }
}

#[cfg(test)]
impl Bucket {
    /// In-memory equivalent of a store merge.
    pub fn apply(&mut self, patch: &BucketPatch) {
        patch.payment_address.apply_to(&mut self.payment_address);
        patch
            .global_virtual_group_family_id
            .apply_to(&mut self.global_virtual_group_family_id);
        patch.charged_read_quota.apply_to(&mut self.charged_read_quota);
        patch.visibility.apply_to(&mut self.visibility);
        patch.status.apply_to(&mut self.status);
        if patch.removed {
            self.removed = true;
        }
        patch.delete_reason.apply_to(&mut self.delete_reason);
        patch.delete_at.apply_to(&mut self.delete_at);
        patch
            .migration_start_time
            .apply_to(&mut self.migration_start_time);
        patch.dest_primary_sp_id.apply_to(&mut self.dest_primary_sp_id);
        patch
            .migration_complete_time
            .apply_to(&mut self.migration_complete_time);
        patch
            .migration_reject_reason
            .apply_to(&mut self.migration_reject_reason);
        self.update_at = patch.stamp.update_at;
        self.update_tx_hash = patch.stamp.update_tx_hash.clone();
        self.update_time = patch.stamp.update_time;
    }
}

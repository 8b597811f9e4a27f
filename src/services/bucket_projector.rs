//! Bucket events to bucket writes.
//!
//! Each function states exactly which columns it sets. Anything a function
//! does not set is left alone by the merge, so an info update never touches
//! migration bookkeeping and a migration transition never touches quota.

use super::Write;
use crate::events::{LedgerContext, bucket as ev};
use crate::models::bucket::{
    BUCKET_STATUS_CREATED, BUCKET_STATUS_DISCONTINUED, BUCKET_STATUS_MIGRATING, Bucket,
    BucketPatch, MIGRATION_REJECTED_REASON,
};
use crate::models::patch::Field;

fn merge(bucket_id: &str, patch: BucketPatch) -> Write {
    Write::MergeBucket {
        bucket_id: bucket_id.to_string(),
        patch,
    }
}

/// Full record; the only bucket write that uses `create`.
pub fn create_bucket(ctx: &LedgerContext, e: &ev::CreateBucket) -> Write {
    Write::CreateBucket(Bucket {
        bucket_id: e.bucket_id.clone(),
        bucket_name: e.bucket_name.clone(),
        owner: e.owner.clone(),
        payment_address: e.payment_address.clone(),
        operator: e.owner.clone(),
        global_virtual_group_family_id: e.global_virtual_group_family_id,
        charged_read_quota: e.charged_read_quota,
        visibility: e.visibility.clone(),
        source_type: e.source_type.clone(),
        status: e.status.clone(),
        removed: false,
        delete_reason: String::new(),
        delete_at: 0,
        migration_start_time: None,
        dest_primary_sp_id: String::new(),
        migration_complete_time: None,
        migration_reject_reason: String::new(),
        create_at: ctx.height,
        create_tx_hash: ctx.tx_hash.clone(),
        create_time: e.create_at,
        update_at: ctx.height,
        update_tx_hash: ctx.tx_hash.clone(),
        update_time: ctx.block_unix(),
    })
}

pub fn delete_bucket(ctx: &LedgerContext, e: &ev::DeleteBucket) -> Write {
    let mut patch = BucketPatch::new(ctx.stamp());
    patch.removed = true;
    merge(&e.bucket_id, patch)
}

/// Quota, payment and visibility only. Status is not part of the patch.
pub fn update_bucket_info(ctx: &LedgerContext, e: &ev::UpdateBucketInfo) -> Write {
    let mut patch = BucketPatch::new(ctx.stamp());
    patch.charged_read_quota = Field::Set(e.charged_read_quota);
    patch.payment_address = Field::Set(e.payment_address.clone());
    patch.visibility = Field::Set(e.visibility.clone());
    patch.global_virtual_group_family_id = Field::Set(e.global_virtual_group_family_id);
    merge(&e.bucket_id, patch)
}

pub fn discontinue_bucket(ctx: &LedgerContext, e: &ev::DiscontinueBucket) -> Write {
    let mut patch = BucketPatch::new(ctx.stamp());
    patch.status = Field::Set(BUCKET_STATUS_DISCONTINUED.to_string());
    patch.delete_reason = Field::Set(e.reason.clone());
    patch.delete_at = Field::Set(e.delete_at);
    merge(&e.bucket_id, patch)
}

/// Enter MIGRATING. Leftovers of an earlier completed or rejected migration
/// are cleared.
pub fn migration_bucket(ctx: &LedgerContext, e: &ev::MigrationBucket) -> Write {
    let mut patch = BucketPatch::new(ctx.stamp());
    patch.status = Field::Set(BUCKET_STATUS_MIGRATING.to_string());
    patch.migration_start_time = Field::Set(Some(ctx.block_unix()));
    patch.dest_primary_sp_id = Field::Set(e.dst_primary_sp_id.to_string());
    patch.migration_complete_time = Field::Set(None);
    patch.migration_reject_reason = Field::Set(String::new());
    merge(&e.bucket_id, patch)
}

/// Back to CREATED on the new family; only the completion time survives.
pub fn complete_migration_bucket(ctx: &LedgerContext, e: &ev::CompleteMigrationBucket) -> Write {
    let mut patch = BucketPatch::new(ctx.stamp());
    patch.status = Field::Set(BUCKET_STATUS_CREATED.to_string());
    patch.global_virtual_group_family_id = Field::Set(e.global_virtual_group_family_id);
    patch.migration_complete_time = Field::Set(Some(ctx.block_unix()));
    patch.migration_start_time = Field::Set(None);
    patch.dest_primary_sp_id = Field::Set(String::new());
    patch.migration_reject_reason = Field::Set(String::new());
    merge(&e.bucket_id, patch)
}

pub fn cancel_migration_bucket(ctx: &LedgerContext, e: &ev::CancelMigrationBucket) -> Write {
    let mut patch = BucketPatch::new(ctx.stamp());
    patch.status = Field::Set(BUCKET_STATUS_CREATED.to_string());
    patch.migration_start_time = Field::Set(None);
    patch.dest_primary_sp_id = Field::Set(String::new());
    patch.migration_complete_time = Field::Set(None);
    patch.migration_reject_reason = Field::Set(String::new());
    merge(&e.bucket_id, patch)
}

pub fn reject_migrate_bucket(ctx: &LedgerContext, e: &ev::RejectMigrateBucket) -> Write {
    let mut patch = BucketPatch::new(ctx.stamp());
    patch.status = Field::Set(BUCKET_STATUS_CREATED.to_string());
    patch.migration_reject_reason = Field::Set(MIGRATION_REJECTED_REASON.to_string());
    patch.migration_start_time = Field::Set(None);
    patch.dest_primary_sp_id = Field::Set(String::new());
    patch.migration_complete_time = Field::Set(None);
    merge(&e.bucket_id, patch)
}

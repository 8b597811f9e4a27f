//! Object events to object writes.
//!
//! Content updates run through a pending window:
//!
//! ```text
//! Sealed(is_updating=false) --UpdateObjectContent(size>0)--> Sealed(is_updating=true)
//! Sealed(is_updating=true)  --Success | Cancel-------------> Sealed(is_updating=false)
//! ```
//!
//! A zero-size update is applied by the ledger at once, so it skips the
//! pending state and writes the new metadata directly.

use super::Write;
use crate::events::{LedgerContext, object as ev};
use crate::models::object::{
    MIRROR_FAILED_REASON, MIRROR_STATUS_FAILED, MIRROR_STATUS_PENDING, MIRROR_STATUS_SUCCESS,
    OBJECT_STATUS_CREATED, OBJECT_STATUS_DISCONTINUED, OBJECT_STATUS_SEALED, Object, ObjectPatch,
    ZERO_ADDRESS,
};
use crate::models::patch::Field;

fn merge(object_id: &str, patch: ObjectPatch) -> Write {
    Write::MergeObject {
        object_id: object_id.to_string(),
        patch,
    }
}

pub fn create_object(ctx: &LedgerContext, e: &ev::CreateObject) -> Write {
    Write::CreateObject(Object {
        object_id: e.object_id.clone(),
        bucket_id: e.bucket_id.clone(),
        bucket_name: e.bucket_name.clone(),
        object_name: e.object_name.clone(),
        creator: e.creator.clone(),
        owner: e.owner.clone(),
        operator: ZERO_ADDRESS.to_string(),
        updater: ZERO_ADDRESS.to_string(),
        payload_size: e.payload_size,
        checksums: e.checksums.clone(),
        content_type: e.content_type.clone(),
        version: 0,
        redundancy_type: e.redundancy_type.clone(),
        visibility: e.visibility.clone(),
        source_type: e.source_type.clone(),
        status: e.status.clone(),
        removed: false,
        local_virtual_group_id: e.local_virtual_group_id,
        sealed_tx_hash: String::new(),
        delete_reason: String::new(),
        delete_at: 0,
        is_updating: false,
        content_updated_time: 0,
        mirror_status: String::new(),
        mirror_fail_reason: String::new(),
        dest_chain_id: 0,
        source_chain_id: 0,
        create_at: ctx.height,
        create_tx_hash: ctx.tx_hash.clone(),
        create_time: e.create_at,
        update_at: ctx.height,
        update_tx_hash: ctx.tx_hash.clone(),
        update_time: ctx.block_unix(),
    })
}

pub fn seal_object(ctx: &LedgerContext, e: &ev::SealObject) -> Write {
    let mut patch = ObjectPatch::new(ctx.stamp());
    patch.status = Field::Set(e.status.clone());
    patch.operator = Field::Set(e.operator.clone());
    patch.local_virtual_group_id = Field::Set(e.local_virtual_group_id);
    patch.sealed_tx_hash = Field::Set(ctx.tx_hash.clone());
    merge(&e.object_id, patch)
}

pub fn cancel_create_object(ctx: &LedgerContext, e: &ev::CancelCreateObject) -> Write {
    let mut patch = ObjectPatch::new(ctx.stamp());
    patch.operator = Field::Set(e.operator.clone());
    patch.removed = true;
    merge(&e.object_id, patch)
}

/// Clone `source` under the destination identity.
///
/// The copy starts its own life-cycle: unsealed, not updating, not mirrored,
/// with fresh audit columns. Content metadata is inherited.
pub fn copy_object(
    ctx: &LedgerContext,
    e: &ev::CopyObject,
    source: Object,
    dst_bucket_id: String,
) -> Write {
    Write::CreateObject(Object {
        object_id: e.dst_object_id.clone(),
        bucket_id: dst_bucket_id,
        bucket_name: e.dst_bucket_name.clone(),
        object_name: e.dst_object_name.clone(),
        operator: e.operator.clone(),
        updater: ZERO_ADDRESS.to_string(),
        status: OBJECT_STATUS_CREATED.to_string(),
        removed: false,
        sealed_tx_hash: String::new(),
        delete_reason: String::new(),
        delete_at: 0,
        is_updating: false,
        content_updated_time: 0,
        mirror_status: String::new(),
        mirror_fail_reason: String::new(),
        dest_chain_id: 0,
        source_chain_id: 0,
        create_at: ctx.height,
        create_tx_hash: ctx.tx_hash.clone(),
        create_time: ctx.block_unix(),
        update_at: ctx.height,
        update_tx_hash: ctx.tx_hash.clone(),
        update_time: ctx.block_unix(),
        ..source
    })
}

pub fn delete_object(ctx: &LedgerContext, e: &ev::DeleteObject) -> Write {
    let mut patch = ObjectPatch::new(ctx.stamp());
    patch.local_virtual_group_id = Field::Set(e.local_virtual_group_id);
    patch.removed = true;
    merge(&e.object_id, patch)
}

/// The ledger drops a rejected object without emitting a delete event, so
/// the rejection itself is projected as the soft-delete.
pub fn reject_seal_object(ctx: &LedgerContext, e: &ev::RejectSealObject) -> Write {
    let mut patch = ObjectPatch::new(ctx.stamp());
    patch.operator = Field::Set(e.operator.clone());
    patch.removed = true;
    merge(&e.object_id, patch)
}

pub fn discontinue_object(ctx: &LedgerContext, e: &ev::DiscontinueObject) -> Write {
    let mut patch = ObjectPatch::new(ctx.stamp());
    patch.status = Field::Set(OBJECT_STATUS_DISCONTINUED.to_string());
    patch.delete_reason = Field::Set(e.reason.clone());
    patch.delete_at = Field::Set(e.delete_at);
    merge(&e.object_id, patch)
}

/// Visibility only. Status is omitted so sealing and updating state survive.
pub fn update_object_info(ctx: &LedgerContext, e: &ev::UpdateObjectInfo) -> Write {
    let mut patch = ObjectPatch::new(ctx.stamp());
    patch.operator = Field::Set(e.operator.clone());
    patch.visibility = Field::Set(e.visibility.clone());
    merge(&e.object_id, patch)
}

/// Opens the pending window, or applies a zero-size update immediately.
///
/// The event has no content type, so the stored one is kept either way.
pub fn update_object_content(ctx: &LedgerContext, e: &ev::UpdateObjectContent) -> Write {
    let mut patch = ObjectPatch::new(ctx.stamp());
    patch.updater = Field::Set(e.operator.clone());
    if e.payload_size == 0 {
        patch.status = Field::Set(OBJECT_STATUS_SEALED.to_string());
        patch.payload_size = Field::Set(0);
        patch.checksums = Field::Set(e.checksums.clone());
        patch.version = Field::Set(e.version);
        patch.content_updated_time = Field::Set(ctx.block_unix());
        patch.is_updating = Field::Set(false);
    } else {
        patch.is_updating = Field::Set(true);
    }
    merge(&e.object_id, patch)
}

/// Closes the pending window with the new content metadata.
pub fn update_object_content_success(
    ctx: &LedgerContext,
    e: &ev::UpdateObjectContentSuccess,
) -> Write {
    let updated_at = if e.updated_at != 0 {
        e.updated_at
    } else {
        ctx.block_unix()
    };

    let mut patch = ObjectPatch::new(ctx.stamp());
    patch.status = Field::Set(OBJECT_STATUS_SEALED.to_string());
    patch.is_updating = Field::Set(false);
    patch.payload_size = Field::Set(e.new_payload_size);
    patch.checksums = Field::Set(e.new_checksums.clone());
    patch.content_type = Field::Set(e.content_type.clone());
    patch.version = Field::Set(e.version);
    patch.updater = Field::Set(e.operator.clone());
    patch.content_updated_time = Field::Set(updated_at);
    merge(&e.object_id, patch)
}

/// Closes the pending window without touching content metadata.
pub fn cancel_update_object_content(
    ctx: &LedgerContext,
    e: &ev::CancelUpdateObjectContent,
) -> Write {
    let mut patch = ObjectPatch::new(ctx.stamp());
    patch.status = Field::Set(OBJECT_STATUS_SEALED.to_string());
    patch.is_updating = Field::Set(false);
    patch.updater = Field::Set(ZERO_ADDRESS.to_string());
    merge(&e.object_id, patch)
}

/// Marks a mirror as pending. `source_chain_id` is the local chain's
/// cross-chain id when configured; the event does not carry it.
pub fn mirror_object(
    ctx: &LedgerContext,
    e: &ev::MirrorObject,
    source_chain_id: Option<u32>,
) -> Write {
    let mut patch = ObjectPatch::new(ctx.stamp());
    patch.mirror_status = Field::Set(MIRROR_STATUS_PENDING.to_string());
    patch.mirror_fail_reason = Field::Set(String::new());
    patch.dest_chain_id = Field::Set(e.dest_chain_id);
    if let Some(chain_id) = source_chain_id {
        patch.source_chain_id = Field::Set(chain_id);
    }
    merge(&e.object_id, patch)
}

pub fn mirror_object_result(ctx: &LedgerContext, e: &ev::MirrorObjectResult) -> Write {
    let (status, reason) = if e.status == 0 {
        (MIRROR_STATUS_SUCCESS, "")
    } else {
        (MIRROR_STATUS_FAILED, MIRROR_FAILED_REASON)
    };

    let mut patch = ObjectPatch::new(ctx.stamp());
    patch.mirror_status = Field::Set(status.to_string());
    patch.mirror_fail_reason = Field::Set(reason.to_string());
    patch.dest_chain_id = Field::Set(e.dest_chain_id);
    merge(&e.object_id, patch)
}

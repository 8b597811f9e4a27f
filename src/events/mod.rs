//! Typed storage-module events and the ledger context they arrive with.
//!
//! Events reach the indexer in the ABCI shape: a type tag naming the proto
//! message plus a list of attributes whose values are JSON-encoded fields.
//! [`StorageEvent::decode`] turns that into one variant of a closed enum.

pub mod bucket;
pub mod de;
pub mod object;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::models::patch::UpdateStamp;

pub const EVENT_CREATE_BUCKET: &str = "greenfield.storage.EventCreateBucket";
pub const EVENT_DELETE_BUCKET: &str = "greenfield.storage.EventDeleteBucket";
pub const EVENT_UPDATE_BUCKET_INFO: &str = "greenfield.storage.EventUpdateBucketInfo";
pub const EVENT_DISCONTINUE_BUCKET: &str = "greenfield.storage.EventDiscontinueBucket";
pub const EVENT_MIGRATION_BUCKET: &str = "greenfield.storage.EventMigrationBucket";
pub const EVENT_COMPLETE_MIGRATION_BUCKET: &str =
    "greenfield.storage.EventCompleteMigrationBucket";
pub const EVENT_CANCEL_MIGRATION_BUCKET: &str = "greenfield.storage.EventCancelMigrationBucket";
pub const EVENT_REJECT_MIGRATE_BUCKET: &str = "greenfield.storage.EventRejectMigrateBucket";

pub const EVENT_CREATE_OBJECT: &str = "greenfield.storage.EventCreateObject";
pub const EVENT_CANCEL_CREATE_OBJECT: &str = "greenfield.storage.EventCancelCreateObject";
pub const EVENT_SEAL_OBJECT: &str = "greenfield.storage.EventSealObject";
pub const EVENT_COPY_OBJECT: &str = "greenfield.storage.EventCopyObject";
pub const EVENT_DELETE_OBJECT: &str = "greenfield.storage.EventDeleteObject";
pub const EVENT_REJECT_SEAL_OBJECT: &str = "greenfield.storage.EventRejectSealObject";
pub const EVENT_DISCONTINUE_OBJECT: &str = "greenfield.storage.EventDiscontinueObject";
pub const EVENT_UPDATE_OBJECT_INFO: &str = "greenfield.storage.EventUpdateObjectInfo";
pub const EVENT_UPDATE_OBJECT_CONTENT: &str = "greenfield.storage.EventUpdateObjectContent";
pub const EVENT_UPDATE_OBJECT_CONTENT_SUCCESS: &str =
    "greenfield.storage.EventUpdateObjectContentSuccess";
pub const EVENT_CANCEL_UPDATE_OBJECT_CONTENT: &str =
    "greenfield.storage.EventCancelUpdateObjectContent";
pub const EVENT_MIRROR_OBJECT: &str = "greenfield.storage.EventMirrorObject";
pub const EVENT_MIRROR_OBJECT_RESULT: &str = "greenfield.storage.EventMirrorObjectResult";

#[derive(Debug, Error)]
pub enum EventError {
    #[error("malformed `{event_type}` event: {reason}")]
    Malformed { event_type: String, reason: String },
}

/// Block and transaction the event was emitted in.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct LedgerContext {
    pub height: i64,
    pub block_time: DateTime<Utc>,
    pub tx_hash: String,
}

impl LedgerContext {
    /// Block time in unix seconds, the unit every `*_time` column uses.
    pub fn block_unix(&self) -> i64 {
        self.block_time.timestamp()
    }

    pub fn stamp(&self) -> UpdateStamp {
        UpdateStamp {
            update_at: self.height,
            update_tx_hash: self.tx_hash.clone(),
            update_time: self.block_unix(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventAttribute {
    pub key: String,
    /// JSON encoding of the field value.
    pub value: String,
}

/// An undecoded event as emitted by the ledger.
#[derive(Debug, Clone, Deserialize)]
pub struct RawEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(default)]
    pub attributes: Vec<EventAttribute>,
}

/// Every storage event the indexer projects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageEvent {
    CreateBucket(bucket::CreateBucket),
    DeleteBucket(bucket::DeleteBucket),
    UpdateBucketInfo(bucket::UpdateBucketInfo),
    DiscontinueBucket(bucket::DiscontinueBucket),
    MigrationBucket(bucket::MigrationBucket),
    CompleteMigrationBucket(bucket::CompleteMigrationBucket),
    CancelMigrationBucket(bucket::CancelMigrationBucket),
    RejectMigrateBucket(bucket::RejectMigrateBucket),

    CreateObject(object::CreateObject),
    CancelCreateObject(object::CancelCreateObject),
    SealObject(object::SealObject),
    CopyObject(object::CopyObject),
    DeleteObject(object::DeleteObject),
    RejectSealObject(object::RejectSealObject),
    DiscontinueObject(object::DiscontinueObject),
    UpdateObjectInfo(object::UpdateObjectInfo),
    UpdateObjectContent(object::UpdateObjectContent),
    UpdateObjectContentSuccess(object::UpdateObjectContentSuccess),
    CancelUpdateObjectContent(object::CancelUpdateObjectContent),
    MirrorObject(object::MirrorObject),
    MirrorObjectResult(object::MirrorObjectResult),
}

impl StorageEvent {
    /// Decode a raw event.
    ///
    /// Returns `Ok(None)` for event types outside the storage module's bucket
    /// and object life-cycles.
    pub fn decode(raw: &RawEvent) -> Result<Option<Self>, EventError> {
        let tag = raw.event_type.as_str();
        let event = match tag {
            EVENT_CREATE_BUCKET => Self::CreateBucket(parse(raw)?),
            EVENT_DELETE_BUCKET => Self::DeleteBucket(parse(raw)?),
            EVENT_UPDATE_BUCKET_INFO => Self::UpdateBucketInfo(parse(raw)?),
            EVENT_DISCONTINUE_BUCKET => Self::DiscontinueBucket(parse(raw)?),
            EVENT_MIGRATION_BUCKET => Self::MigrationBucket(parse(raw)?),
            EVENT_COMPLETE_MIGRATION_BUCKET => Self::CompleteMigrationBucket(parse(raw)?),
            EVENT_CANCEL_MIGRATION_BUCKET => Self::CancelMigrationBucket(parse(raw)?),
            EVENT_REJECT_MIGRATE_BUCKET => Self::RejectMigrateBucket(parse(raw)?),

            EVENT_CREATE_OBJECT => Self::CreateObject(parse(raw)?),
            EVENT_CANCEL_CREATE_OBJECT => Self::CancelCreateObject(parse(raw)?),
            EVENT_SEAL_OBJECT => Self::SealObject(parse(raw)?),
            EVENT_COPY_OBJECT => Self::CopyObject(parse(raw)?),
            EVENT_DELETE_OBJECT => Self::DeleteObject(parse(raw)?),
            EVENT_REJECT_SEAL_OBJECT => Self::RejectSealObject(parse(raw)?),
            EVENT_DISCONTINUE_OBJECT => Self::DiscontinueObject(parse(raw)?),
            EVENT_UPDATE_OBJECT_INFO => Self::UpdateObjectInfo(parse(raw)?),
            EVENT_UPDATE_OBJECT_CONTENT => Self::UpdateObjectContent(parse(raw)?),
            EVENT_UPDATE_OBJECT_CONTENT_SUCCESS => Self::UpdateObjectContentSuccess(parse(raw)?),
            EVENT_CANCEL_UPDATE_OBJECT_CONTENT => Self::CancelUpdateObjectContent(parse(raw)?),
            EVENT_MIRROR_OBJECT => Self::MirrorObject(parse(raw)?),
            EVENT_MIRROR_OBJECT_RESULT => Self::MirrorObjectResult(parse(raw)?),
            _ => return Ok(None),
        };
        Ok(Some(event))
    }

    /// The proto message name this variant was decoded from.
    pub fn type_tag(&self) -> &'static str {
        match self {
            Self::CreateBucket(_) => EVENT_CREATE_BUCKET,
            Self::DeleteBucket(_) => EVENT_DELETE_BUCKET,
            Self::UpdateBucketInfo(_) => EVENT_UPDATE_BUCKET_INFO,
            Self::DiscontinueBucket(_) => EVENT_DISCONTINUE_BUCKET,
            Self::MigrationBucket(_) => EVENT_MIGRATION_BUCKET,
            Self::CompleteMigrationBucket(_) => EVENT_COMPLETE_MIGRATION_BUCKET,
            Self::CancelMigrationBucket(_) => EVENT_CANCEL_MIGRATION_BUCKET,
            Self::RejectMigrateBucket(_) => EVENT_REJECT_MIGRATE_BUCKET,
            Self::CreateObject(_) => EVENT_CREATE_OBJECT,
            Self::CancelCreateObject(_) => EVENT_CANCEL_CREATE_OBJECT,
            Self::SealObject(_) => EVENT_SEAL_OBJECT,
            Self::CopyObject(_) => EVENT_COPY_OBJECT,
            Self::DeleteObject(_) => EVENT_DELETE_OBJECT,
            Self::RejectSealObject(_) => EVENT_REJECT_SEAL_OBJECT,
            Self::DiscontinueObject(_) => EVENT_DISCONTINUE_OBJECT,
            Self::UpdateObjectInfo(_) => EVENT_UPDATE_OBJECT_INFO,
            Self::UpdateObjectContent(_) => EVENT_UPDATE_OBJECT_CONTENT,
            Self::UpdateObjectContentSuccess(_) => EVENT_UPDATE_OBJECT_CONTENT_SUCCESS,
            Self::CancelUpdateObjectContent(_) => EVENT_CANCEL_UPDATE_OBJECT_CONTENT,
            Self::MirrorObject(_) => EVENT_MIRROR_OBJECT,
            Self::MirrorObjectResult(_) => EVENT_MIRROR_OBJECT_RESULT,
        }
    }

    /// Human-readable resource path for logs: `bucket` or `bucket/object`.
    pub fn resource(&self) -> String {
        let bucket_object = |bucket: &str, object: &str| format!("{}/{}", bucket, object);
        match self {
            Self::CreateBucket(e) => e.bucket_name.clone(),
            Self::DeleteBucket(e) => e.bucket_name.clone(),
            Self::UpdateBucketInfo(e) => e.bucket_name.clone(),
            Self::DiscontinueBucket(e) => e.bucket_name.clone(),
            Self::MigrationBucket(e) => e.bucket_name.clone(),
            Self::CompleteMigrationBucket(e) => e.bucket_name.clone(),
            Self::CancelMigrationBucket(e) => e.bucket_name.clone(),
            Self::RejectMigrateBucket(e) => e.bucket_name.clone(),
            Self::CreateObject(e) => bucket_object(&e.bucket_name, &e.object_name),
            Self::CancelCreateObject(e) => bucket_object(&e.bucket_name, &e.object_name),
            Self::SealObject(e) => bucket_object(&e.bucket_name, &e.object_name),
            Self::CopyObject(e) => bucket_object(&e.dst_bucket_name, &e.dst_object_name),
            Self::DeleteObject(e) => bucket_object(&e.bucket_name, &e.object_name),
            Self::RejectSealObject(e) => bucket_object(&e.bucket_name, &e.object_name),
            Self::DiscontinueObject(e) => bucket_object(&e.bucket_name, &e.object_id),
            Self::UpdateObjectInfo(e) => bucket_object(&e.bucket_name, &e.object_name),
            Self::UpdateObjectContent(e) => bucket_object(&e.bucket_name, &e.object_name),
            Self::UpdateObjectContentSuccess(e) => bucket_object(&e.bucket_name, &e.object_name),
            Self::CancelUpdateObjectContent(e) => bucket_object(&e.bucket_name, &e.object_name),
            Self::MirrorObject(e) => bucket_object(&e.bucket_name, &e.object_name),
            Self::MirrorObjectResult(e) => bucket_object(&e.bucket_name, &e.object_name),
        }
    }
}

/// Reassemble the attribute list into one JSON object and deserialize it.
fn parse<T: DeserializeOwned>(raw: &RawEvent) -> Result<T, EventError> {
    let malformed = |reason: String| EventError::Malformed {
        event_type: raw.event_type.clone(),
        reason,
    };

    let mut fields = Map::with_capacity(raw.attributes.len());
    for attr in &raw.attributes {
        let value: Value = serde_json::from_str(&attr.value)
            .map_err(|err| malformed(format!("attribute `{}`: {}", attr.key, err)))?;
        fields.insert(attr.key.clone(), value);
    }

    serde_json::from_value(Value::Object(fields)).map_err(|err| malformed(err.to_string()))
}

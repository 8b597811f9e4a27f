//! Projection of storage events onto the metadata store.
//!
//! The projectors are pure: each turns one event (plus its ledger context)
//! into a [`Write`]. The indexer applies writes inside a
//! [`metadata_store::StoreTx`].

pub mod bucket_projector;
pub mod indexer;
pub mod metadata_store;
pub mod object_projector;

use crate::models::{
    bucket::{Bucket, BucketPatch},
    object::{Object, ObjectPatch},
};
use metadata_store::{StoreResult, StoreTx};

/// A single store mutation produced by a projector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Write {
    CreateBucket(Bucket),
    MergeBucket { bucket_id: String, patch: BucketPatch },
    CreateObject(Object),
    MergeObject { object_id: String, patch: ObjectPatch },
}

impl Write {
    pub async fn apply(&self, tx: &mut StoreTx) -> StoreResult<()> {
        match self {
            Write::CreateBucket(bucket) => tx.create_bucket(bucket).await,
            Write::MergeBucket { bucket_id, patch } => tx.merge_bucket(bucket_id, patch).await,
            Write::CreateObject(object) => tx.create_object(object).await,
            Write::MergeObject { object_id, patch } => tx.merge_object(object_id, patch).await,
        }
    }

    /// Key of the record this write targets.
    pub fn key(&self) -> &str {
        match self {
            Write::CreateBucket(bucket) => &bucket.bucket_id,
            Write::MergeBucket { bucket_id, .. } => bucket_id,
            Write::CreateObject(object) => &object.object_id,
            Write::MergeObject { object_id, .. } => object_id,
        }
    }

    /// Columns written by a merge; empty for creates, which write every column.
    pub fn columns(&self) -> Vec<&'static str> {
        match self {
            Write::MergeBucket { patch, .. } => patch.columns(),
            Write::MergeObject { patch, .. } => patch.columns(),
            Write::CreateBucket(_) | Write::CreateObject(_) => Vec::new(),
        }
    }
}

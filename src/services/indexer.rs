//! Event router: decodes raw ledger events and applies their projections.
//!
//! Events are handled strictly one at a time in the order given. The only
//! read-before-write is `CopyObject`, which needs the source record.
//!
//! A block is all-or-nothing: its writes share one store transaction, so a
//! failed block leaves no trace and the same block can be delivered again.

use super::{
    Write, bucket_projector,
    metadata_store::{MetadataStore, StoreError, StoreTx},
    object_projector,
};
use crate::events::{EventError, LedgerContext, RawEvent, StorageEvent, object as ev};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum IndexerError {
    #[error(transparent)]
    Event(#[from] EventError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type IndexerResult<T> = Result<T, IndexerError>;

/// What happened to a single raw event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Applied,
    /// Not a bucket or object event.
    Ignored,
}

/// Per-block tally returned by [`Indexer::handle_block`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BlockSummary {
    pub received: usize,
    pub applied: usize,
    pub ignored: usize,
}

#[derive(Clone)]
pub struct Indexer {
    store: MetadataStore,
    /// Cross-chain id of the indexed ledger, recorded on mirror requests.
    source_chain_id: Option<u32>,
}

impl Indexer {
    pub fn new(store: MetadataStore, source_chain_id: Option<u32>) -> Self {
        Self {
            store,
            source_chain_id,
        }
    }

    pub fn store(&self) -> &MetadataStore {
        &self.store
    }

    /// Decode and project one event in its own transaction.
    pub async fn handle_event(&self, ctx: &LedgerContext, raw: &RawEvent) -> IndexerResult<Outcome> {
        let mut tx = self.store.begin().await?;
        let outcome = self.handle_event_in(&mut tx, ctx, raw).await?;
        tx.commit().await?;
        Ok(outcome)
    }

    async fn handle_event_in(
        &self,
        tx: &mut StoreTx,
        ctx: &LedgerContext,
        raw: &RawEvent,
    ) -> IndexerResult<Outcome> {
        let event = match StorageEvent::decode(raw) {
            Ok(Some(event)) => event,
            Ok(None) => return Ok(Outcome::Ignored),
            Err(err) => {
                error!(
                    height = ctx.height,
                    tx_hash = %ctx.tx_hash,
                    event_type = %raw.event_type,
                    error = %err,
                    "failed to decode storage event"
                );
                return Err(err.into());
            }
        };

        self.apply(tx, ctx, event).await?;
        Ok(Outcome::Applied)
    }

    /// Project an already decoded event inside `tx`.
    pub async fn apply(
        &self,
        tx: &mut StoreTx,
        ctx: &LedgerContext,
        event: StorageEvent,
    ) -> IndexerResult<()> {
        let event_type = event.type_tag();
        let resource = event.resource();
        let write = self.project(tx, ctx, event).await?;

        if let Err(err) = write.apply(tx).await {
            warn!(
                height = ctx.height,
                event_type,
                resource = %resource,
                key = write.key(),
                error = %err,
                "failed to apply storage event"
            );
            return Err(err.into());
        }

        debug!(
            height = ctx.height,
            event_type,
            resource = %resource,
            key = write.key(),
            columns = ?write.columns(),
            "applied storage event"
        );
        Ok(())
    }

    async fn project(
        &self,
        tx: &mut StoreTx,
        ctx: &LedgerContext,
        event: StorageEvent,
    ) -> IndexerResult<Write> {
        let write = match event {
            StorageEvent::CreateBucket(e) => bucket_projector::create_bucket(ctx, &e),
            StorageEvent::DeleteBucket(e) => bucket_projector::delete_bucket(ctx, &e),
            StorageEvent::UpdateBucketInfo(e) => bucket_projector::update_bucket_info(ctx, &e),
            StorageEvent::DiscontinueBucket(e) => bucket_projector::discontinue_bucket(ctx, &e),
            StorageEvent::MigrationBucket(e) => bucket_projector::migration_bucket(ctx, &e),
            StorageEvent::CompleteMigrationBucket(e) => {
                bucket_projector::complete_migration_bucket(ctx, &e)
            }
            StorageEvent::CancelMigrationBucket(e) => {
                bucket_projector::cancel_migration_bucket(ctx, &e)
            }
            StorageEvent::RejectMigrateBucket(e) => {
                bucket_projector::reject_migrate_bucket(ctx, &e)
            }

            StorageEvent::CreateObject(e) => object_projector::create_object(ctx, &e),
            StorageEvent::CancelCreateObject(e) => object_projector::cancel_create_object(ctx, &e),
            StorageEvent::SealObject(e) => object_projector::seal_object(ctx, &e),
            StorageEvent::CopyObject(e) => Self::project_copy(tx, ctx, &e).await?,
            StorageEvent::DeleteObject(e) => object_projector::delete_object(ctx, &e),
            StorageEvent::RejectSealObject(e) => object_projector::reject_seal_object(ctx, &e),
            StorageEvent::DiscontinueObject(e) => object_projector::discontinue_object(ctx, &e),
            StorageEvent::UpdateObjectInfo(e) => object_projector::update_object_info(ctx, &e),
            StorageEvent::UpdateObjectContent(e) => {
                object_projector::update_object_content(ctx, &e)
            }
            StorageEvent::UpdateObjectContentSuccess(e) => {
                object_projector::update_object_content_success(ctx, &e)
            }
            StorageEvent::CancelUpdateObjectContent(e) => {
                object_projector::cancel_update_object_content(ctx, &e)
            }
            StorageEvent::MirrorObject(e) => {
                object_projector::mirror_object(ctx, &e, self.source_chain_id)
            }
            StorageEvent::MirrorObjectResult(e) => {
                object_projector::mirror_object_result(ctx, &e)
            }
        };
        Ok(write)
    }

    /// Read the source record and resolve the destination bucket id. Reads go
    /// through `tx` so records created earlier in the same block are visible.
    async fn project_copy(
        tx: &mut StoreTx,
        ctx: &LedgerContext,
        e: &ev::CopyObject,
    ) -> IndexerResult<Write> {
        let source = tx.get_object(&e.src_object_id).await?;

        let dst_bucket_id = if source.bucket_name == e.dst_bucket_name {
            source.bucket_id.clone()
        } else {
            match tx.get_bucket_by_name(&e.dst_bucket_name).await {
                Ok(bucket) => bucket.bucket_id,
                Err(StoreError::BucketNotFound(_)) => {
                    warn!(
                        bucket = %e.dst_bucket_name,
                        "copy destination bucket is not indexed; leaving bucket id empty"
                    );
                    String::new()
                }
                Err(err) => return Err(err.into()),
            }
        };

        Ok(object_projector::copy_object(ctx, e, source, dst_bucket_id))
    }

    /// Apply a block's events in order as one transaction.
    ///
    /// The first failure aborts the block and rolls back every write made for
    /// it, so the caller can re-deliver the same block.
    pub async fn handle_block(
        &self,
        ctx: &LedgerContext,
        events: &[RawEvent],
    ) -> IndexerResult<BlockSummary> {
        let batch_id = Uuid::new_v4();
        let mut summary = BlockSummary {
            received: events.len(),
            ..BlockSummary::default()
        };

        let mut tx = self.store.begin().await?;
        for (index, raw) in events.iter().enumerate() {
            match self.handle_event_in(&mut tx, ctx, raw).await {
                Ok(Outcome::Applied) => summary.applied += 1,
                Ok(Outcome::Ignored) => summary.ignored += 1,
                Err(err) => {
                    warn!(
                        %batch_id,
                        height = ctx.height,
                        index,
                        "rolling back block at failed event"
                    );
                    return Err(err);
                }
            }
        }
        tx.commit().await?;

        info!(
            %batch_id,
            height = ctx.height,
            tx_hash = %ctx.tx_hash,
            received = summary.received,
            applied = summary.applied,
            ignored = summary.ignored,
            "indexed events"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::fixtures::{create_bucket, create_object, ctx, raw, seal_object};
    use crate::events::*;
    use crate::models::bucket::{BUCKET_STATUS_CREATED, BUCKET_STATUS_MIGRATING, MIGRATION_REJECTED_REASON};
    use crate::models::object::{
        MIRROR_FAILED_REASON, OBJECT_STATUS_CREATED, OBJECT_STATUS_DISCONTINUED,
        OBJECT_STATUS_SEALED, ZERO_ADDRESS,
    };
    use crate::services::metadata_store::in_memory_store;
    use serde_json::json;

    const BUCKET: u64 = 0x1234;
    const OBJECT: u64 = 1001;
    const OPERATOR: &str = "0x00000000000000000000000000000000000000dd";

    fn hash(id: u64) -> String {
        de::ledger_hash(&id.to_string()).unwrap()
    }

    async fn indexer() -> Indexer {
        Indexer::new(in_memory_store().await, None)
    }

    async fn run(indexer: &Indexer, height: i64, event: RawEvent) {
        let outcome = indexer.handle_event(&ctx(height), &event).await.unwrap();
        assert_eq!(outcome, Outcome::Applied);
    }

    fn bucket_event(tag: &str, extra: serde_json::Value) -> RawEvent {
        let mut fields = json!({
            "bucket_name": "test-bucket",
            "bucket_id": BUCKET.to_string(),
            "operator": OPERATOR,
        });
        let map = fields.as_object_mut().unwrap();
        for (k, v) in extra.as_object().unwrap() {
            map.insert(k.clone(), v.clone());
        }
        raw(tag, fields)
    }

    fn object_event(tag: &str, extra: serde_json::Value) -> RawEvent {
        let mut fields = json!({
            "bucket_name": "test-bucket",
            "object_name": "a.txt",
            "object_id": OBJECT.to_string(),
            "operator": OPERATOR,
        });
        let map = fields.as_object_mut().unwrap();
        for (k, v) in extra.as_object().unwrap() {
            map.insert(k.clone(), v.clone());
        }
        raw(tag, fields)
    }

    async fn sealed_object(indexer: &Indexer, payload: u64) {
        run(indexer, 1, create_bucket(BUCKET, "test-bucket")).await;
        run(indexer, 2, create_object(BUCKET, OBJECT, "a.txt", payload)).await;
        run(indexer, 3, seal_object(OBJECT, "a.txt")).await;
    }

    #[tokio::test]
    async fn migration_completion_clears_pending_fields() {
        let indexer = indexer().await;
        run(&indexer, 1, create_bucket(BUCKET, "test-bucket")).await;
        run(
            &indexer,
            2,
            bucket_event(EVENT_MIGRATION_BUCKET, json!({ "dst_primary_sp_id": 300 })),
        )
        .await;

        let migrating = indexer.store().get_bucket(&hash(BUCKET)).await.unwrap();
        assert_eq!(migrating.status, BUCKET_STATUS_MIGRATING);
        assert_eq!(migrating.dest_primary_sp_id, "300");
        assert_eq!(migrating.migration_start_time, Some(ctx(2).block_unix()));

        run(
            &indexer,
            3,
            bucket_event(
                EVENT_COMPLETE_MIGRATION_BUCKET,
                json!({ "global_virtual_group_family_id": 12, "src_primary_sp_id": 1 }),
            ),
        )
        .await;

        let done = indexer.store().get_bucket(&hash(BUCKET)).await.unwrap();
        assert_eq!(done.status, BUCKET_STATUS_CREATED);
        assert_eq!(done.migration_complete_time, Some(ctx(3).block_unix()));
        assert_eq!(done.migration_start_time, None);
        assert_eq!(done.dest_primary_sp_id, "");
        assert_eq!(done.migration_reject_reason, "");
        assert_eq!(done.global_virtual_group_family_id, 12);
        assert_eq!(done.update_at, 3);
    }

    #[tokio::test]
    async fn info_update_mid_migration_preserves_migration_state() {
        let indexer = indexer().await;
        run(&indexer, 1, create_bucket(BUCKET, "test-bucket")).await;
        run(
            &indexer,
            2,
            bucket_event(EVENT_MIGRATION_BUCKET, json!({ "dst_primary_sp_id": 300 })),
        )
        .await;
        let before = indexer.store().get_bucket(&hash(BUCKET)).await.unwrap();

        run(
            &indexer,
            3,
            bucket_event(
                EVENT_UPDATE_BUCKET_INFO,
                json!({
                    "charged_read_quota": "0",
                    "payment_address": "0x00000000000000000000000000000000000000EE",
                    "visibility": "VISIBILITY_TYPE_PUBLIC_READ",
                    "global_virtual_group_family_id": 7
                }),
            ),
        )
        .await;

        let after = indexer.store().get_bucket(&hash(BUCKET)).await.unwrap();
        assert_eq!(after.charged_read_quota, 0);
        assert_eq!(after.visibility, "VISIBILITY_TYPE_PUBLIC_READ");
        assert_eq!(after.status, before.status);
        assert_eq!(after.migration_start_time, before.migration_start_time);
        assert_eq!(after.dest_primary_sp_id, before.dest_primary_sp_id);
        assert_eq!(after.migration_complete_time, before.migration_complete_time);
        assert_eq!(after.migration_reject_reason, before.migration_reject_reason);
    }

    #[tokio::test]
    async fn cancel_and_reject_restore_created() {
        let indexer = indexer().await;
        run(&indexer, 1, create_bucket(BUCKET, "test-bucket")).await;
        run(
            &indexer,
            2,
            bucket_event(EVENT_MIGRATION_BUCKET, json!({ "dst_primary_sp_id": 300 })),
        )
        .await;
        run(&indexer, 3, bucket_event(EVENT_REJECT_MIGRATE_BUCKET, json!({}))).await;

        let rejected = indexer.store().get_bucket(&hash(BUCKET)).await.unwrap();
        assert_eq!(rejected.status, BUCKET_STATUS_CREATED);
        assert_eq!(rejected.migration_reject_reason, MIGRATION_REJECTED_REASON);
        assert_eq!(rejected.migration_start_time, None);
        assert_eq!(rejected.dest_primary_sp_id, "");

        // A new migration clears the earlier rejection.
        run(
            &indexer,
            4,
            bucket_event(EVENT_MIGRATION_BUCKET, json!({ "dst_primary_sp_id": 301 })),
        )
        .await;
        let retry = indexer.store().get_bucket(&hash(BUCKET)).await.unwrap();
        assert_eq!(retry.migration_reject_reason, "");

        run(&indexer, 5, bucket_event(EVENT_CANCEL_MIGRATION_BUCKET, json!({}))).await;
        let cancelled = indexer.store().get_bucket(&hash(BUCKET)).await.unwrap();
        assert_eq!(cancelled.status, BUCKET_STATUS_CREATED);
        assert_eq!(cancelled.migration_start_time, None);
        assert_eq!(cancelled.migration_complete_time, None);
        assert_eq!(cancelled.dest_primary_sp_id, "");
        assert_eq!(cancelled.migration_reject_reason, "");
    }

    #[tokio::test]
    async fn content_update_pending_window() {
        let indexer = indexer().await;
        sealed_object(&indexer, 100).await;

        run(
            &indexer,
            4,
            object_event(
                EVENT_UPDATE_OBJECT_CONTENT,
                json!({ "payload_size": "200", "checksums": ["AQID"], "version": 1 }),
            ),
        )
        .await;
        let pending = indexer.store().get_object(&hash(OBJECT)).await.unwrap();
        assert!(pending.is_updating);
        assert_eq!(pending.payload_size, 100);
        assert_eq!(pending.status, OBJECT_STATUS_SEALED);
        assert_eq!(pending.updater, OPERATOR);

        run(
            &indexer,
            5,
            object_event(
                EVENT_UPDATE_OBJECT_CONTENT_SUCCESS,
                json!({
                    "content_type": "application/json",
                    "prev_payload_size": "100",
                    "new_payload_size": "200",
                    "new_checksums": ["AQID", "BAUG"],
                    "version": 1,
                    "updated_at": "1700000099"
                }),
            ),
        )
        .await;
        let done = indexer.store().get_object(&hash(OBJECT)).await.unwrap();
        assert!(!done.is_updating);
        assert_eq!(done.payload_size, 200);
        assert_eq!(done.content_type, "application/json");
        assert_eq!(done.checksums, vec!["AQID".to_string(), "BAUG".to_string()]);
        assert_eq!(done.version, 1);
        assert_eq!(done.content_updated_time, 1_700_000_099);
        assert_eq!(done.status, OBJECT_STATUS_SEALED);
    }

    #[tokio::test]
    async fn zero_payload_update_skips_pending_state() {
        let indexer = indexer().await;
        sealed_object(&indexer, 50).await;

        run(
            &indexer,
            4,
            object_event(
                EVENT_UPDATE_OBJECT_CONTENT,
                json!({ "payload_size": "0", "checksums": [], "version": 1 }),
            ),
        )
        .await;
        let stored = indexer.store().get_object(&hash(OBJECT)).await.unwrap();
        assert!(!stored.is_updating);
        assert_eq!(stored.payload_size, 0);
        assert!(stored.checksums.is_empty());
        assert_eq!(stored.updater, OPERATOR);
        assert_eq!(stored.content_updated_time, ctx(4).block_unix());
        assert_eq!(stored.content_type, "text/plain");
    }

    #[tokio::test]
    async fn cancel_update_clears_updater() {
        let indexer = indexer().await;
        sealed_object(&indexer, 100).await;
        run(
            &indexer,
            4,
            object_event(EVENT_UPDATE_OBJECT_CONTENT, json!({ "payload_size": "10" })),
        )
        .await;
        run(&indexer, 5, object_event(EVENT_CANCEL_UPDATE_OBJECT_CONTENT, json!({}))).await;

        let stored = indexer.store().get_object(&hash(OBJECT)).await.unwrap();
        assert!(!stored.is_updating);
        assert_eq!(stored.updater, ZERO_ADDRESS);
        assert_eq!(stored.payload_size, 100);
    }

    #[tokio::test]
    async fn events_leave_unmentioned_fields_untouched() {
        let indexer = indexer().await;
        sealed_object(&indexer, 100).await;
        run(
            &indexer,
            4,
            object_event(EVENT_UPDATE_OBJECT_CONTENT, json!({ "payload_size": "10" })),
        )
        .await;

        let steps = [
            object_event(EVENT_MIRROR_OBJECT, json!({ "dest_chain_id": 97 })),
            object_event(
                EVENT_MIRROR_OBJECT_RESULT,
                json!({ "status": 1, "dest_chain_id": 97 }),
            ),
            object_event(
                EVENT_UPDATE_OBJECT_INFO,
                json!({ "visibility": "VISIBILITY_TYPE_PUBLIC_READ" }),
            ),
            object_event(
                EVENT_DISCONTINUE_OBJECT,
                json!({ "reason": "policy", "delete_at": "1800000000" }),
            ),
            object_event(EVENT_DELETE_OBJECT, json!({ "local_virtual_group_id": 9 })),
        ];

        for (offset, event) in steps.into_iter().enumerate() {
            let height = 5 + offset as i64;
            let before = indexer.store().get_object(&hash(OBJECT)).await.unwrap();
            let context = ctx(height);
            let decoded = StorageEvent::decode(&event).unwrap().unwrap();
            let mut tx = indexer.store().begin().await.unwrap();
            let write = indexer.project(&mut tx, &context, decoded).await.unwrap();
            write.apply(&mut tx).await.unwrap();
            tx.commit().await.unwrap();
            let after = indexer.store().get_object(&hash(OBJECT)).await.unwrap();

            let Write::MergeObject { patch, .. } = write else {
                panic!("expected a merge");
            };
            let mut expected = before.clone();
            expected.apply(&patch);
            assert_eq!(after, expected, "step {}", offset);
            // The pending content update is never touched by these events.
            assert!(after.is_updating);
        }

        let last = indexer.store().get_object(&hash(OBJECT)).await.unwrap();
        assert!(last.removed);
        assert_eq!(last.status, OBJECT_STATUS_DISCONTINUED);
        assert_eq!(last.mirror_fail_reason, MIRROR_FAILED_REASON);
        assert_eq!(last.visibility, "VISIBILITY_TYPE_PUBLIC_READ");
    }

    #[tokio::test]
    async fn removed_is_never_reset() {
        let indexer = indexer().await;
        sealed_object(&indexer, 100).await;
        run(&indexer, 4, object_event(EVENT_REJECT_SEAL_OBJECT, json!({}))).await;
        run(&indexer, 5, seal_object(OBJECT, "a.txt")).await;
        run(
            &indexer,
            6,
            object_event(
                EVENT_DISCONTINUE_OBJECT,
                json!({ "reason": "r", "delete_at": 1 }),
            ),
        )
        .await;

        assert!(indexer.store().get_object(&hash(OBJECT)).await.unwrap().removed);

        run(&indexer, 1, create_bucket(7, "other")).await;
        run(&indexer, 2, raw(EVENT_DELETE_BUCKET, json!({ "bucket_name": "other", "bucket_id": "7" }))).await;
        run(
            &indexer,
            3,
            raw(
                EVENT_DISCONTINUE_BUCKET,
                json!({ "bucket_name": "other", "bucket_id": "7", "reason": "r", "delete_at": 1 }),
            ),
        )
        .await;
        assert!(indexer.store().get_bucket(&hash(7)).await.unwrap().removed);
    }

    #[tokio::test]
    async fn copy_clones_source_under_new_identity() {
        let indexer = indexer().await;
        sealed_object(&indexer, 100).await;
        run(&indexer, 4, create_bucket(88, "dst-bucket")).await;

        run(
            &indexer,
            5,
            raw(
                EVENT_COPY_OBJECT,
                json!({
                    "operator": OPERATOR,
                    "src_bucket_name": "test-bucket",
                    "dst_bucket_name": "dst-bucket",
                    "src_object_name": "a.txt",
                    "dst_object_name": "b.txt",
                    "src_object_id": OBJECT.to_string(),
                    "dst_object_id": "2002"
                }),
            ),
        )
        .await;

        let source = indexer.store().get_object(&hash(OBJECT)).await.unwrap();
        let copy = indexer.store().get_object(&hash(2002)).await.unwrap();
        assert_eq!(copy.object_name, "b.txt");
        assert_eq!(copy.bucket_name, "dst-bucket");
        assert_eq!(copy.bucket_id, hash(88));
        assert_eq!(copy.operator, OPERATOR);
        assert_eq!(copy.status, OBJECT_STATUS_CREATED);
        assert_eq!(copy.payload_size, source.payload_size);
        assert_eq!(copy.checksums, source.checksums);
        assert_eq!(copy.create_at, 5);
        assert_eq!(copy.create_tx_hash, ctx(5).tx_hash);
        assert_eq!(copy.sealed_tx_hash, "");
        assert!(!copy.removed);
        // The source is not modified.
        assert_eq!(source.update_at, 3);
    }

    #[tokio::test]
    async fn copy_of_unknown_source_is_not_found_and_writes_nothing() {
        let indexer = indexer().await;
        let event = raw(
            EVENT_COPY_OBJECT,
            json!({
                "operator": OPERATOR,
                "dst_bucket_name": "test-bucket",
                "dst_object_name": "b.txt",
                "src_object_id": "404",
                "dst_object_id": "2002"
            }),
        );

        let err = indexer.handle_event(&ctx(1), &event).await.unwrap_err();
        assert!(matches!(err, IndexerError::Store(StoreError::ObjectNotFound(_))));
        assert!(matches!(
            indexer.store().get_object(&hash(2002)).await.unwrap_err(),
            StoreError::ObjectNotFound(_)
        ));
    }

    #[tokio::test]
    async fn merge_before_create_is_not_found() {
        let indexer = indexer().await;
        let err = indexer
            .handle_event(&ctx(1), &seal_object(OBJECT, "a.txt"))
            .await
            .unwrap_err();
        assert!(matches!(err, IndexerError::Store(StoreError::ObjectNotFound(_))));
    }

    #[tokio::test]
    async fn replayed_create_is_already_exists() {
        let indexer = indexer().await;
        run(&indexer, 1, create_bucket(BUCKET, "test-bucket")).await;
        let err = indexer
            .handle_event(&ctx(1), &create_bucket(BUCKET, "test-bucket"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            IndexerError::Store(StoreError::BucketAlreadyExists(_))
        ));
    }

    #[tokio::test]
    async fn replayed_merge_is_idempotent() {
        let indexer = indexer().await;
        run(&indexer, 1, create_bucket(BUCKET, "test-bucket")).await;
        let migrate = bucket_event(EVENT_MIGRATION_BUCKET, json!({ "dst_primary_sp_id": 300 }));

        run(&indexer, 2, migrate.clone()).await;
        let first = indexer.store().get_bucket(&hash(BUCKET)).await.unwrap();
        run(&indexer, 2, migrate).await;
        let second = indexer.store().get_bucket(&hash(BUCKET)).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn malformed_event_is_rejected_without_writes() {
        let indexer = indexer().await;
        run(&indexer, 1, create_bucket(BUCKET, "test-bucket")).await;
        let before = indexer.store().get_bucket(&hash(BUCKET)).await.unwrap();

        let event = bucket_event(
            EVENT_MIGRATION_BUCKET,
            json!({ "dst_primary_sp_id": "not-a-number" }),
        );
        let err = indexer.handle_event(&ctx(2), &event).await.unwrap_err();
        assert!(matches!(err, IndexerError::Event(EventError::Malformed { .. })));
        assert_eq!(
            indexer.store().get_bucket(&hash(BUCKET)).await.unwrap(),
            before
        );
    }

    #[tokio::test]
    async fn block_counts_applied_and_ignored_events() {
        let indexer = Indexer::new(in_memory_store().await, Some(1017));
        let events = vec![
            create_bucket(BUCKET, "test-bucket"),
            raw("greenfield.payment.EventStreamRecordUpdate", json!({ "rate": "1" })),
            create_object(BUCKET, OBJECT, "a.txt", 10),
            object_event(EVENT_MIRROR_OBJECT, json!({ "dest_chain_id": 97 })),
        ];

        let summary = indexer.handle_block(&ctx(1), &events).await.unwrap();
        assert_eq!(
            summary,
            BlockSummary {
                received: 4,
                applied: 3,
                ignored: 1
            }
        );
        let object = indexer.store().get_object(&hash(OBJECT)).await.unwrap();
        assert_eq!(object.source_chain_id, 1017);
        assert_eq!(object.dest_chain_id, 97);
    }

    #[tokio::test]
    async fn seal_records_status_lvg_and_sealing_tx() {
        let indexer = indexer().await;
        sealed_object(&indexer, 100).await;

        let sealed = indexer.store().get_object(&hash(OBJECT)).await.unwrap();
        assert_eq!(sealed.status, OBJECT_STATUS_SEALED);
        assert_eq!(sealed.sealed_tx_hash, ctx(3).tx_hash);
        assert_eq!(sealed.local_virtual_group_id, 9);
        assert_eq!(
            sealed.operator,
            "0x00000000000000000000000000000000000000cc"
        );
        assert_eq!(sealed.update_at, 3);
        // Creation columns still describe the create transaction.
        assert_eq!(sealed.create_tx_hash, ctx(2).tx_hash);
    }

    #[tokio::test]
    async fn cancel_create_soft_deletes_and_keeps_content() {
        let indexer = indexer().await;
        run(&indexer, 1, create_bucket(BUCKET, "test-bucket")).await;
        run(&indexer, 2, create_object(BUCKET, OBJECT, "a.txt", 100)).await;
        let before = indexer.store().get_object(&hash(OBJECT)).await.unwrap();
        assert!(!before.removed);

        run(&indexer, 3, object_event(EVENT_CANCEL_CREATE_OBJECT, json!({}))).await;

        let cancelled = indexer.store().get_object(&hash(OBJECT)).await.unwrap();
        assert!(cancelled.removed);
        assert_eq!(cancelled.operator, OPERATOR);
        assert_eq!(cancelled.status, before.status);
        assert_eq!(cancelled.payload_size, before.payload_size);
        assert_eq!(cancelled.checksums, before.checksums);
        assert_eq!(cancelled.content_type, before.content_type);
        assert_eq!(cancelled.sealed_tx_hash, "");
        assert_eq!(cancelled.update_at, 3);
        assert_eq!(cancelled.update_tx_hash, ctx(3).tx_hash);
    }

    #[tokio::test]
    async fn failed_block_rolls_back_and_can_be_redelivered() {
        let indexer = indexer().await;
        let block = vec![
            create_bucket(BUCKET, "test-bucket"),
            create_object(BUCKET, OBJECT, "a.txt", 10),
            // Not created yet, so the merge fails.
            seal_object(5, "missing.txt"),
        ];

        let err = indexer.handle_block(&ctx(1), &block).await.unwrap_err();
        assert!(matches!(err, IndexerError::Store(StoreError::ObjectNotFound(_))));
        assert!(matches!(
            indexer.store().get_bucket(&hash(BUCKET)).await.unwrap_err(),
            StoreError::BucketNotFound(_)
        ));
        assert!(matches!(
            indexer.store().get_object(&hash(OBJECT)).await.unwrap_err(),
            StoreError::ObjectNotFound(_)
        ));

        // Re-delivery with the missing record now in place applies cleanly.
        let mut fixed = block.clone();
        fixed.insert(2, create_object(BUCKET, 5, "missing.txt", 0));
        let summary = indexer.handle_block(&ctx(1), &fixed).await.unwrap();
        assert_eq!(summary.applied, 4);
        assert_eq!(
            indexer.store().get_object(&hash(5)).await.unwrap().status,
            OBJECT_STATUS_SEALED
        );
        assert_eq!(
            indexer.store().get_bucket(&hash(BUCKET)).await.unwrap().create_at,
            1
        );
    }

    #[tokio::test]
    async fn same_block_failure_after_success_is_retryable_unchanged() {
        let indexer = indexer().await;
        run(&indexer, 1, create_bucket(BUCKET, "test-bucket")).await;
        let block = vec![
            bucket_event(EVENT_MIGRATION_BUCKET, json!({ "dst_primary_sp_id": 300 })),
            bucket_event(
                EVENT_MIGRATION_BUCKET,
                json!({ "dst_primary_sp_id": "not-a-number" }),
            ),
        ];

        assert!(indexer.handle_block(&ctx(2), &block).await.is_err());
        let untouched = indexer.store().get_bucket(&hash(BUCKET)).await.unwrap();
        assert_eq!(untouched.status, BUCKET_STATUS_CREATED);
        assert_eq!(untouched.update_at, 1);

        assert!(indexer.handle_block(&ctx(2), &block[..1]).await.is_ok());
        let migrating = indexer.store().get_bucket(&hash(BUCKET)).await.unwrap();
        assert_eq!(migrating.status, BUCKET_STATUS_MIGRATING);
    }

    #[tokio::test]
    async fn copy_sees_source_created_earlier_in_the_block() {
        let indexer = indexer().await;
        let block = vec![
            create_bucket(BUCKET, "test-bucket"),
            create_object(BUCKET, OBJECT, "a.txt", 10),
            raw(
                EVENT_COPY_OBJECT,
                json!({
                    "operator": OPERATOR,
                    "dst_bucket_name": "test-bucket",
                    "dst_object_name": "b.txt",
                    "src_object_id": OBJECT.to_string(),
                    "dst_object_id": "2002"
                }),
            ),
        ];

        indexer.handle_block(&ctx(1), &block).await.unwrap();
        let copy = indexer.store().get_object(&hash(2002)).await.unwrap();
        assert_eq!(copy.bucket_id, hash(BUCKET));
        assert_eq!(copy.payload_size, 10);
    }
}

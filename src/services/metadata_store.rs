//! src/services/metadata_store.rs
//!
//! MetadataStore: the keyed record store behind the indexer. Buckets and
//! objects live in two SQLite tables keyed by their ledger ids. After a
//! record is created it is only ever changed by `merge_*`, which writes the
//! columns a patch marks as set and nothing else.
//!
//! Writes go through a [`StoreTx`] so that a whole block of events commits
//! or rolls back together.

use crate::models::{
    bucket::{Bucket, BucketPatch},
    object::{Object, ObjectPatch},
    patch::Field,
};
use sqlx::{
    Encode, QueryBuilder, SqliteConnection, SqlitePool, Transaction, Type,
    query_builder::Separated,
    sqlite::{Sqlite, SqlitePoolOptions},
    types::Json,
};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

const INIT_SQL: &str = include_str!("../../migrations/0001_init.sql");

const BUCKET_COLUMNS: &str = "bucket_id, bucket_name, owner, payment_address, operator, \
     global_virtual_group_family_id, charged_read_quota, visibility, source_type, status, \
     removed, delete_reason, delete_at, migration_start_time, dest_primary_sp_id, \
     migration_complete_time, migration_reject_reason, create_at, create_tx_hash, \
     create_time, update_at, update_tx_hash, update_time";

const OBJECT_COLUMNS: &str = "object_id, bucket_id, bucket_name, object_name, creator, owner, \
     operator, updater, payload_size, checksums, content_type, version, redundancy_type, \
     visibility, source_type, status, removed, local_virtual_group_id, sealed_tx_hash, \
     delete_reason, delete_at, is_updating, content_updated_time, mirror_status, \
     mirror_fail_reason, dest_chain_id, source_chain_id, create_at, create_tx_hash, \
     create_time, update_at, update_tx_hash, update_time";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("bucket `{0}` not found")]
    BucketNotFound(String),
    #[error("bucket `{0}` already exists")]
    BucketAlreadyExists(String),
    #[error("object `{0}` not found")]
    ObjectNotFound(String),
    #[error("object `{0}` already exists")]
    ObjectAlreadyExists(String),
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Create / merge / get access to bucket and object records.
#[derive(Clone)]
pub struct MetadataStore {
    /// Shared SQLite connection pool.
    pub db: Arc<SqlitePool>,
}

impl MetadataStore {
    pub fn new(db: Arc<SqlitePool>) -> Self {
        Self { db }
    }

    /// Apply the embedded schema. Every statement is idempotent.
    pub async fn migrate(&self) -> StoreResult<()> {
        let statements = INIT_SQL
            .split(';')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>();

        debug!("running {} migration statements", statements.len());
        for stmt in statements {
            sqlx::query(stmt).execute(&*self.db).await?;
        }
        Ok(())
    }

    /// Lightweight connectivity probe.
    pub async fn ping(&self) -> StoreResult<()> {
        sqlx::query_scalar::<_, i64>("SELECT 1")
            .fetch_one(&*self.db)
            .await?;
        Ok(())
    }

    /// Open a unit of work. Nothing it writes is visible until
    /// [`StoreTx::commit`]; dropping it rolls everything back.
    pub async fn begin(&self) -> StoreResult<StoreTx> {
        Ok(StoreTx {
            tx: self.db.begin().await?,
        })
    }

    pub async fn get_bucket(&self, bucket_id: &str) -> StoreResult<Bucket> {
        let mut conn = self.db.acquire().await?;
        select_bucket(&mut conn, bucket_id).await
    }

    pub async fn get_object(&self, object_id: &str) -> StoreResult<Object> {
        let mut conn = self.db.acquire().await?;
        select_object(&mut conn, object_id).await
    }
}

/// Pool-level writes, each committed on its own.
#[cfg(test)]
impl MetadataStore {
    pub async fn create_bucket(&self, bucket: &Bucket) -> StoreResult<()> {
        let mut conn = self.db.acquire().await?;
        insert_bucket(&mut conn, bucket).await
    }

    pub async fn merge_bucket(&self, bucket_id: &str, patch: &BucketPatch) -> StoreResult<()> {
        let mut conn = self.db.acquire().await?;
        update_bucket(&mut conn, bucket_id, patch).await
    }

    pub async fn get_bucket_by_name(&self, name: &str) -> StoreResult<Bucket> {
        let mut conn = self.db.acquire().await?;
        select_live_bucket_by_name(&mut conn, name).await
    }

    pub async fn create_object(&self, object: &Object) -> StoreResult<()> {
        let mut conn = self.db.acquire().await?;
        insert_object(&mut conn, object).await
    }

    pub async fn merge_object(&self, object_id: &str, patch: &ObjectPatch) -> StoreResult<()> {
        let mut conn = self.db.acquire().await?;
        update_object(&mut conn, object_id, patch).await
    }
}

/// Reads and writes inside one SQLite transaction.
pub struct StoreTx {
    tx: Transaction<'static, Sqlite>,
}

impl StoreTx {
    pub async fn commit(self) -> StoreResult<()> {
        self.tx.commit().await?;
        Ok(())
    }

    /// Insert a full bucket record. Fails if the id is already present.
    pub async fn create_bucket(&mut self, bucket: &Bucket) -> StoreResult<()> {
        insert_bucket(&mut self.tx, bucket).await
    }

    /// Write the set columns of `patch` onto an existing bucket.
    pub async fn merge_bucket(&mut self, bucket_id: &str, patch: &BucketPatch) -> StoreResult<()> {
        update_bucket(&mut self.tx, bucket_id, patch).await
    }

    /// Look up the live (not removed) bucket currently holding `name`.
    pub async fn get_bucket_by_name(&mut self, name: &str) -> StoreResult<Bucket> {
        select_live_bucket_by_name(&mut self.tx, name).await
    }

    /// Insert a full object record. Fails if the id is already present.
    pub async fn create_object(&mut self, object: &Object) -> StoreResult<()> {
        insert_object(&mut self.tx, object).await
    }

    /// Write the set columns of `patch` onto an existing object.
    pub async fn merge_object(&mut self, object_id: &str, patch: &ObjectPatch) -> StoreResult<()> {
        update_object(&mut self.tx, object_id, patch).await
    }

    pub async fn get_object(&mut self, object_id: &str) -> StoreResult<Object> {
        select_object(&mut self.tx, object_id).await
    }
}

async fn insert_bucket(conn: &mut SqliteConnection, bucket: &Bucket) -> StoreResult<()> {
    let sql = format!(
        "INSERT INTO buckets ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        BUCKET_COLUMNS
    );
    let result = sqlx::query(&sql)
        .bind(&bucket.bucket_id)
        .bind(&bucket.bucket_name)
        .bind(&bucket.owner)
        .bind(&bucket.payment_address)
        .bind(&bucket.operator)
        .bind(bucket.global_virtual_group_family_id)
        .bind(bucket.charged_read_quota)
        .bind(&bucket.visibility)
        .bind(&bucket.source_type)
        .bind(&bucket.status)
        .bind(bucket.removed)
        .bind(&bucket.delete_reason)
        .bind(bucket.delete_at)
        .bind(bucket.migration_start_time)
        .bind(&bucket.dest_primary_sp_id)
        .bind(bucket.migration_complete_time)
        .bind(&bucket.migration_reject_reason)
        .bind(bucket.create_at)
        .bind(&bucket.create_tx_hash)
        .bind(bucket.create_time)
        .bind(bucket.update_at)
        .bind(&bucket.update_tx_hash)
        .bind(bucket.update_time)
        .execute(&mut *conn)
        .await;

    match result {
        Ok(_) => Ok(()),
        Err(err) if is_unique_violation(&err) => {
            Err(StoreError::BucketAlreadyExists(bucket.bucket_id.clone()))
        }
        Err(err) => Err(StoreError::Sqlx(err)),
    }
}

async fn update_bucket(
    conn: &mut SqliteConnection,
    bucket_id: &str,
    patch: &BucketPatch,
) -> StoreResult<()> {
    let mut builder = QueryBuilder::<Sqlite>::new("UPDATE buckets SET ");
    let mut set = builder.separated(", ");
    push_field(&mut set, "payment_address", &patch.payment_address);
    push_field(
        &mut set,
        "global_virtual_group_family_id",
        &patch.global_virtual_group_family_id,
    );
    push_field(&mut set, "charged_read_quota", &patch.charged_read_quota);
    push_field(&mut set, "visibility", &patch.visibility);
    push_field(&mut set, "status", &patch.status);
    if patch.removed {
        set.push("removed = 1");
    }
    push_field(&mut set, "delete_reason", &patch.delete_reason);
    push_field(&mut set, "delete_at", &patch.delete_at);
    push_field(&mut set, "migration_start_time", &patch.migration_start_time);
    push_field(&mut set, "dest_primary_sp_id", &patch.dest_primary_sp_id);
    push_field(
        &mut set,
        "migration_complete_time",
        &patch.migration_complete_time,
    );
    push_field(
        &mut set,
        "migration_reject_reason",
        &patch.migration_reject_reason,
    );
    set.push("update_at = ")
        .push_bind_unseparated(patch.stamp.update_at);
    set.push("update_tx_hash = ")
        .push_bind_unseparated(patch.stamp.update_tx_hash.clone());
    set.push("update_time = ")
        .push_bind_unseparated(patch.stamp.update_time);
    builder.push(" WHERE bucket_id = ");
    builder.push_bind(bucket_id.to_string());

    let result = builder.build().execute(&mut *conn).await?;
    if result.rows_affected() == 0 {
        return Err(StoreError::BucketNotFound(bucket_id.to_string()));
    }
    Ok(())
}

async fn select_bucket(conn: &mut SqliteConnection, bucket_id: &str) -> StoreResult<Bucket> {
    let sql = format!("SELECT {} FROM buckets WHERE bucket_id = ?", BUCKET_COLUMNS);
    sqlx::query_as::<_, Bucket>(&sql)
        .bind(bucket_id)
        .fetch_one(&mut *conn)
        .await
        .map_err(|err| match err {
            sqlx::Error::RowNotFound => StoreError::BucketNotFound(bucket_id.to_string()),
            other => StoreError::Sqlx(other),
        })
}

async fn select_live_bucket_by_name(conn: &mut SqliteConnection, name: &str) -> StoreResult<Bucket> {
    let sql = format!(
        "SELECT {} FROM buckets WHERE bucket_name = ? AND removed = 0
         ORDER BY create_at DESC LIMIT 1",
        BUCKET_COLUMNS
    );
    sqlx::query_as::<_, Bucket>(&sql)
        .bind(name)
        .fetch_one(&mut *conn)
        .await
        .map_err(|err| match err {
            sqlx::Error::RowNotFound => StoreError::BucketNotFound(name.to_string()),
            other => StoreError::Sqlx(other),
        })
}

async fn insert_object(conn: &mut SqliteConnection, object: &Object) -> StoreResult<()> {
    let sql = format!(
        "INSERT INTO objects ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        OBJECT_COLUMNS
    );
    let result = sqlx::query(&sql)
        .bind(&object.object_id)
        .bind(&object.bucket_id)
        .bind(&object.bucket_name)
        .bind(&object.object_name)
        .bind(&object.creator)
        .bind(&object.owner)
        .bind(&object.operator)
        .bind(&object.updater)
        .bind(object.payload_size)
        .bind(Json(&object.checksums))
        .bind(&object.content_type)
        .bind(object.version)
        .bind(&object.redundancy_type)
        .bind(&object.visibility)
        .bind(&object.source_type)
        .bind(&object.status)
        .bind(object.removed)
        .bind(object.local_virtual_group_id)
        .bind(&object.sealed_tx_hash)
        .bind(&object.delete_reason)
        .bind(object.delete_at)
        .bind(object.is_updating)
        .bind(object.content_updated_time)
        .bind(&object.mirror_status)
        .bind(&object.mirror_fail_reason)
        .bind(object.dest_chain_id)
        .bind(object.source_chain_id)
        .bind(object.create_at)
        .bind(&object.create_tx_hash)
        .bind(object.create_time)
        .bind(object.update_at)
        .bind(&object.update_tx_hash)
        .bind(object.update_time)
        .execute(&mut *conn)
        .await;

    match result {
        Ok(_) => Ok(()),
        Err(err) if is_unique_violation(&err) => {
            Err(StoreError::ObjectAlreadyExists(object.object_id.clone()))
        }
        Err(err) => Err(StoreError::Sqlx(err)),
    }
}

async fn update_object(
    conn: &mut SqliteConnection,
    object_id: &str,
    patch: &ObjectPatch,
) -> StoreResult<()> {
    let mut builder = QueryBuilder::<Sqlite>::new("UPDATE objects SET ");
    let mut set = builder.separated(", ");
    push_field(&mut set, "operator", &patch.operator);
    push_field(&mut set, "updater", &patch.updater);
    push_field(&mut set, "payload_size", &patch.payload_size);
    if let Some(checksums) = patch.checksums.as_set() {
        set.push("checksums = ")
            .push_bind_unseparated(Json(checksums.clone()));
    }
    push_field(&mut set, "content_type", &patch.content_type);
    push_field(&mut set, "version", &patch.version);
    push_field(&mut set, "visibility", &patch.visibility);
    push_field(&mut set, "status", &patch.status);
    if patch.removed {
        set.push("removed = 1");
    }
    push_field(
        &mut set,
        "local_virtual_group_id",
        &patch.local_virtual_group_id,
    );
    push_field(&mut set, "sealed_tx_hash", &patch.sealed_tx_hash);
    push_field(&mut set, "delete_reason", &patch.delete_reason);
    push_field(&mut set, "delete_at", &patch.delete_at);
    push_field(&mut set, "is_updating", &patch.is_updating);
    push_field(&mut set, "content_updated_time", &patch.content_updated_time);
    push_field(&mut set, "mirror_status", &patch.mirror_status);
    push_field(&mut set, "mirror_fail_reason", &patch.mirror_fail_reason);
    push_field(&mut set, "dest_chain_id", &patch.dest_chain_id);
    push_field(&mut set, "source_chain_id", &patch.source_chain_id);
    set.push("update_at = ")
        .push_bind_unseparated(patch.stamp.update_at);
    set.push("update_tx_hash = ")
        .push_bind_unseparated(patch.stamp.update_tx_hash.clone());
    set.push("update_time = ")
        .push_bind_unseparated(patch.stamp.update_time);
    builder.push(" WHERE object_id = ");
    builder.push_bind(object_id.to_string());

    let result = builder.build().execute(&mut *conn).await?;
    if result.rows_affected() == 0 {
        return Err(StoreError::ObjectNotFound(object_id.to_string()));
    }
    Ok(())
}

async fn select_object(conn: &mut SqliteConnection, object_id: &str) -> StoreResult<Object> {
    let sql = format!("SELECT {} FROM objects WHERE object_id = ?", OBJECT_COLUMNS);
    sqlx::query_as::<_, Object>(&sql)
        .bind(object_id)
        .fetch_one(&mut *conn)
        .await
        .map_err(|err| match err {
            sqlx::Error::RowNotFound => StoreError::ObjectNotFound(object_id.to_string()),
            other => StoreError::Sqlx(other),
        })
}

/// Append `column = ?` when the field is set.
fn push_field<'args, T>(
    set: &mut Separated<'_, 'args, Sqlite, &'static str>,
    column: &str,
    field: &Field<T>,
) where
    T: Clone + 'args + Encode<'args, Sqlite> + Type<Sqlite>,
{
    if let Some(value) = field.as_set() {
        set.push(format!("{} = ", column))
            .push_bind_unseparated(value.clone());
    }
}

/// Return true if SQLx error indicates a unique constraint violation.
fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(
        err,
        sqlx::Error::Database(db_err) if db_err.message().to_ascii_lowercase().contains("unique")
    )
}

/// Single-connection in-memory store with the schema applied.
#[cfg(test)]
pub async fn in_memory_store() -> MetadataStore {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory sqlite");
    let store = MetadataStore::new(Arc::new(pool));
    store.migrate().await.expect("schema");
    store
}

/// Open (creating if needed) the SQLite database at `url`.
pub async fn connect(url: &str, max_connections: u32) -> StoreResult<SqlitePool> {
    let options = url
        .parse::<sqlx::sqlite::SqliteConnectOptions>()?
        .create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await?;
    Ok(pool)
}

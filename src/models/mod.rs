//! Materialized entities maintained by the indexer.
//!
//! [`bucket::Bucket`] and [`object::Object`] are full records as stored in
//! SQLite (`sqlx::FromRow`) and served as JSON (`serde`). Every change after
//! creation goes through the matching patch type built on [`patch::Field`].

pub mod bucket;
pub mod object;
pub mod patch;

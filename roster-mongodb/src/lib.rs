//! MongoDB backend implementation for roster.
//!
//! Implements `StoreBackend` over the official async MongoDB driver:
//! filters translate to native query documents, sort/skip/limit map onto
//! find options, the grouping average runs as an aggregation pipeline with
//! server-side rounding, and unique `employee_id` enforcement is a unique
//! index whose E11000 rejections surface as
//! [`StoreError::DuplicateKey`](roster_core::error::StoreError).
//!
//! # Connection
//!
//! ```ignore
//! use roster_core::backend::StoreBackendBuilder;
//! use roster_mongodb::MongoStore;
//!
//! # async fn example() -> roster_core::error::StoreResult<()> {
//! let store = MongoStore::builder("mongodb://localhost:27017", "roster")
//!     .build()
//!     .await?;
//! # Ok(()) }
//! ```

#[allow(unused_extern_crates)]
extern crate self as roster_mongodb;

pub mod query;
pub mod store;

pub use store::{MongoStore, MongoStoreBuilder};

//! In-memory document storage backend for roster.
//!
//! A thread-safe implementation of `StoreBackend` using async-aware
//! read-write locks. Ideal for development and tests: it supports the full
//! query surface (filtering, sorting, pagination, counting, grouping
//! averages) and enforces unique indexes atomically, so duplicate-key
//! behavior matches the persistent backends.
//!
//! ```ignore
//! use roster_core::backend::StoreBackend;
//! use roster_memory::InMemoryStore;
//! use bson::doc;
//!
//! # async fn example() -> roster_core::error::StoreResult<()> {
//! let store = InMemoryStore::new();
//! let id = store
//!     .insert_one(doc! { "employee_id": "EMP001", "name": "Alice" }, "employees")
//!     .await?;
//! assert!(store.fetch(&id, "employees").await?.is_some());
//! # Ok(()) }
//! ```

#[allow(unused_extern_crates)]
extern crate self as roster_memory;

pub mod evaluator;
pub mod store;

pub use store::{InMemoryStore, InMemoryStoreBuilder};

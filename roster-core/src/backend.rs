//! Storage backend abstraction for the document store.
//!
//! [`StoreBackend`] is the single contract the rest of the system depends on.
//! It covers document lifecycle (insert, point lookup, filtered update and
//! delete), structured queries with sort and pagination, counting, a grouping
//! aggregation, and unique index management. Any engine satisfying the trait
//! is pluggable; the workspace ships an in-memory and a MongoDB
//! implementation.
//!
//! Implementations must be thread-safe (`Send + Sync`) and support concurrent
//! access from multiple async tasks. Uniqueness enforcement in particular
//! must be atomic with the insert: two concurrent inserts colliding on a
//! unique field must yield exactly one success and one
//! [`StoreError`](crate::error::StoreError)`::DuplicateKey`.

use async_trait::async_trait;
use bson::{Bson, Document as BsonDocument};
use std::fmt::Debug;

use crate::{
    error::StoreResult,
    query::{Expr, Query},
};

/// One bucket of a grouping aggregation: the group key and the mean of the
/// aggregated field across the bucket, rounded to two decimal places.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupAverage {
    pub key: Bson,
    pub average: f64,
}

/// Abstract interface over a document collection engine.
///
/// The trait is object-safe: `shutdown` borrows rather than consumes, so a
/// backend can also live behind `Arc<dyn StoreBackend>` when a caller needs
/// runtime selection.
#[async_trait]
pub trait StoreBackend: Send + Sync + Debug {
    /// Inserts a single document and returns the id the store assigned to it.
    ///
    /// The id is opaque to callers; its format is backend-specific. Fails
    /// with `DuplicateKey` when a unique index rejects the write.
    async fn insert_one(&self, document: BsonDocument, collection: &str) -> StoreResult<String>;

    /// Point lookup by storage-assigned id. Unknown ids yield `None`.
    async fn fetch(&self, id: &str, collection: &str) -> StoreResult<Option<BsonDocument>>;

    /// Returns the first document matching `filter`, if any.
    async fn find_one(&self, filter: Expr, collection: &str)
    -> StoreResult<Option<BsonDocument>>;

    /// Replaces the named fields on the first document matching `filter`,
    /// leaving every other field untouched. Returns the matched count (0 or
    /// 1).
    async fn update_one(
        &self,
        filter: Expr,
        fields: BsonDocument,
        collection: &str,
    ) -> StoreResult<u64>;

    /// Deletes the first document matching `filter`. Returns the deleted
    /// count (0 or 1).
    async fn delete_one(&self, filter: Expr, collection: &str) -> StoreResult<u64>;

    /// Runs a structured query: filter, then sort, then skip/limit.
    async fn find(&self, query: Query, collection: &str) -> StoreResult<Vec<BsonDocument>>;

    /// Counts documents matching `filter`, all documents when `None`.
    /// Unaffected by any pagination bounds.
    async fn count(&self, filter: Option<Expr>, collection: &str) -> StoreResult<u64>;

    /// Groups documents by `group_by` and averages `average` within each
    /// group. Documents missing either field do not contribute, so empty
    /// groups never appear.
    async fn group_average(
        &self,
        group_by: &str,
        average: &str,
        collection: &str,
    ) -> StoreResult<Vec<GroupAverage>>;

    /// Creates a unique index on `field`, the store-side guarantee behind
    /// duplicate-key rejection. Idempotent.
    async fn create_unique_index(&self, collection: &str, field: &str) -> StoreResult<()>;

    /// Releases connections and other engine resources.
    async fn shutdown(&self) -> StoreResult<()>;
}

/// Factory trait for constructing backend instances.
#[async_trait]
pub trait StoreBackendBuilder {
    type Backend: StoreBackend;

    async fn build(self) -> StoreResult<Self::Backend>;
}

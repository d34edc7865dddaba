//! Collection handles binding a backend to a named collection.
//!
//! Two tiers are provided: [`Collection`] works with raw BSON documents,
//! [`TypedCollection`] layers record types on top. Typed reads run through
//! [`Document::from_stored`], which is where raw stored documents are
//! normalized into the record shape.

use bson::{Document as BsonDocument, ser::serialize_to_bson};
use serde::Serialize;
use std::marker::PhantomData;

use crate::{
    backend::{GroupAverage, StoreBackend},
    document::Document,
    error::{StoreError, StoreResult},
    query::{Expr, Query},
};

/// An untyped collection handle over raw BSON documents.
#[derive(Debug)]
pub struct Collection<'a, B: StoreBackend> {
    name: String,
    backend: &'a B,
}

impl<'a, B: StoreBackend> Collection<'a, B> {
    pub(crate) fn new(name: String, backend: &'a B) -> Self {
        Self { name, backend }
    }

    /// Returns the name of this collection.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Inserts a document and returns the id the store assigned.
    pub async fn insert_one(&self, document: BsonDocument) -> StoreResult<String> {
        self.backend
            .insert_one(document, self.name())
            .await
    }

    /// Point lookup by storage-assigned id.
    pub async fn fetch(&self, id: &str) -> StoreResult<Option<BsonDocument>> {
        self.backend.fetch(id, self.name()).await
    }

    /// Returns the first document matching `filter`, if any.
    pub async fn find_one(&self, filter: Expr) -> StoreResult<Option<BsonDocument>> {
        self.backend
            .find_one(filter, self.name())
            .await
    }

    /// Replaces the named fields on the first matching document. Returns the
    /// matched count (0 or 1).
    pub async fn update_one(&self, filter: Expr, fields: BsonDocument) -> StoreResult<u64> {
        self.backend
            .update_one(filter, fields, self.name())
            .await
    }

    /// Deletes the first matching document. Returns the deleted count (0 or 1).
    pub async fn delete_one(&self, filter: Expr) -> StoreResult<u64> {
        self.backend
            .delete_one(filter, self.name())
            .await
    }

    /// Runs a structured query against the collection.
    pub async fn find(&self, query: Query) -> StoreResult<Vec<BsonDocument>> {
        self.backend.find(query, self.name()).await
    }

    /// Counts matching documents, unaffected by pagination.
    pub async fn count(&self, filter: Option<Expr>) -> StoreResult<u64> {
        self.backend.count(filter, self.name()).await
    }

    /// Groups by `group_by` and averages `average` within each group.
    pub async fn group_average(
        &self,
        group_by: &str,
        average: &str,
    ) -> StoreResult<Vec<GroupAverage>> {
        self.backend
            .group_average(group_by, average, self.name())
            .await
    }
}

/// A typed collection handle for a specific record type.
#[derive(Debug)]
pub struct TypedCollection<'a, B: StoreBackend, D: Document> {
    name: String,
    backend: &'a B,
    _marker: PhantomData<D>,
}

impl<'a, B: StoreBackend, D: Document> TypedCollection<'a, B, D> {
    pub(crate) fn new(name: String, backend: &'a B) -> Self {
        Self { name, backend, _marker: PhantomData }
    }

    /// Returns the name of this collection.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Inserts a candidate record and returns the id the store assigned.
    ///
    /// The candidate type is deliberately independent of `D`: what goes in
    /// lacks the storage id that every record coming out carries.
    pub async fn insert<N>(&self, record: &N) -> StoreResult<String>
    where
        N: Serialize + Sync,
    {
        let document = serialize_to_bson(record)?
            .as_document()
            .cloned()
            .ok_or_else(|| {
                StoreError::Serialization("record did not serialize to a document".into())
            })?;

        self.backend
            .insert_one(document, self.name())
            .await
    }

    /// Point lookup by storage-assigned id, normalized into `D`.
    pub async fn fetch(&self, id: &str) -> StoreResult<Option<D>> {
        self.backend
            .fetch(id, self.name())
            .await?
            .map(D::from_stored)
            .transpose()
    }

    /// Returns the first matching record, if any.
    pub async fn find_one(&self, filter: Expr) -> StoreResult<Option<D>> {
        self.backend
            .find_one(filter, self.name())
            .await?
            .map(D::from_stored)
            .transpose()
    }

    /// Replaces the named fields on the first matching record. Returns the
    /// matched count (0 or 1).
    pub async fn update_one(&self, filter: Expr, fields: BsonDocument) -> StoreResult<u64> {
        self.backend
            .update_one(filter, fields, self.name())
            .await
    }

    /// Deletes the first matching record. Returns the deleted count (0 or 1).
    pub async fn delete_one(&self, filter: Expr) -> StoreResult<u64> {
        self.backend
            .delete_one(filter, self.name())
            .await
    }

    /// Runs a structured query and normalizes every hit into `D`.
    pub async fn find(&self, query: Query) -> StoreResult<Vec<D>> {
        self.backend
            .find(query, self.name())
            .await?
            .into_iter()
            .map(D::from_stored)
            .collect()
    }

    /// Counts matching records, unaffected by pagination.
    pub async fn count(&self, filter: Option<Expr>) -> StoreResult<u64> {
        self.backend.count(filter, self.name()).await
    }

    /// Groups by `group_by` and averages `average` within each group.
    pub async fn group_average(
        &self,
        group_by: &str,
        average: &str,
    ) -> StoreResult<Vec<GroupAverage>> {
        self.backend
            .group_average(group_by, average, self.name())
            .await
    }
}

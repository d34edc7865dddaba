//! In-memory storage backend.
//!
//! Documents live in per-collection HashMaps behind an async read-write
//! lock. Unique index checks run under the same write lock as the insert, so
//! two concurrent inserts colliding on a unique field cannot both pass.

use std::{collections::HashMap, sync::Arc};
use async_trait::async_trait;
use bson::{Bson, Document as BsonDocument};
use mea::rwlock::RwLock;
use uuid::Uuid;

use roster_core::{
    backend::{GroupAverage, StoreBackend, StoreBackendBuilder},
    error::{StoreError, StoreResult},
    query::{Expr, Query, SortDirection},
};

use crate::evaluator::{Comparable, DocumentEvaluator};

#[derive(Default, Debug)]
struct StoredCollection {
    /// document id -> document (stored without the id field)
    documents: HashMap<String, BsonDocument>,
    /// Fields with a registered unique index.
    unique_fields: Vec<String>,
}

type StoreMap = HashMap<String, StoredCollection>;

/// Thread-safe in-memory document storage backend.
///
/// `InMemoryStore` is cloneable and uses an `Arc`-wrapped internal state, so
/// clones share the same underlying data across async tasks. Queries scan
/// every document in a collection; fine for development and tests, use a
/// persistent backend for anything bigger.
#[derive(Default, Clone, Debug)]
pub struct InMemoryStore {
    store: Arc<RwLock<StoreMap>>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory document store.
    pub fn new() -> Self {
        Self {
            store: Arc::new(RwLock::new(StoreMap::new())),
        }
    }

    /// Creates a builder for constructing an `InMemoryStore`.
    pub fn builder() -> InMemoryStoreBuilder {
        InMemoryStoreBuilder::default()
    }
}

/// Returns a copy of `document` with the storage id exposed under `id`.
fn with_id(id: &str, document: &BsonDocument) -> BsonDocument {
    let mut doc = document.clone();
    doc.insert("id", id);
    doc
}

fn as_number(value: &Bson) -> Option<f64> {
    match value {
        Bson::Int32(v) => Some(*v as f64),
        Bson::Int64(v) => Some(*v as f64),
        Bson::Double(v) => Some(*v),
        _ => None,
    }
}

fn round_two(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[async_trait]
impl StoreBackend for InMemoryStore {
    async fn insert_one(&self, document: BsonDocument, collection: &str) -> StoreResult<String> {
        let mut store = self.store.write().await;
        let col = store
            .entry(collection.to_string())
            .or_default();

        for field in &col.unique_fields {
            if let Some(value) = document.get(field) {
                let clash = col
                    .documents
                    .values()
                    .any(|existing| existing.get(field) == Some(value));

                if clash {
                    return Err(StoreError::DuplicateKey(format!(
                        "{field} already holds {value} in collection {collection}"
                    )));
                }
            }
        }

        let id = Uuid::new_v4().simple().to_string();
        col.documents.insert(id.clone(), document);

        Ok(id)
    }

    async fn fetch(&self, id: &str, collection: &str) -> StoreResult<Option<BsonDocument>> {
        let store = self.store.read().await;

        Ok(store
            .get(collection)
            .and_then(|col| col.documents.get(id))
            .map(|doc| with_id(id, doc)))
    }

    async fn find_one(
        &self,
        filter: Expr,
        collection: &str,
    ) -> StoreResult<Option<BsonDocument>> {
        let store = self.store.read().await;
        let col = match store.get(collection) {
            Some(col) => col,
            None => return Ok(None),
        };

        Ok(col
            .documents
            .iter()
            .find(|&(_, doc)| DocumentEvaluator::matches(doc, &filter))
            .map(|(id, doc)| with_id(id, doc)))
    }

    async fn update_one(
        &self,
        filter: Expr,
        fields: BsonDocument,
        collection: &str,
    ) -> StoreResult<u64> {
        let mut store = self.store.write().await;
        let col = match store.get_mut(collection) {
            Some(col) => col,
            None => return Ok(0),
        };

        let target = col
            .documents
            .iter()
            .find(|&(_, doc)| DocumentEvaluator::matches(doc, &filter))
            .map(|(id, _)| id.clone());

        let Some(id) = target else {
            return Ok(0);
        };

        // Updates must uphold unique indexes just like inserts do.
        for field in &col.unique_fields {
            if let Some(value) = fields.get(field) {
                let clash = col
                    .documents
                    .iter()
                    .any(|(other, doc)| *other != id && doc.get(field) == Some(value));

                if clash {
                    return Err(StoreError::DuplicateKey(format!(
                        "{field} already holds {value} in collection {collection}"
                    )));
                }
            }
        }

        if let Some(doc) = col.documents.get_mut(&id) {
            for (key, value) in fields {
                doc.insert(key, value);
            }
        }

        Ok(1)
    }

    async fn delete_one(&self, filter: Expr, collection: &str) -> StoreResult<u64> {
        let mut store = self.store.write().await;
        let col = match store.get_mut(collection) {
            Some(col) => col,
            None => return Ok(0),
        };

        let target = col
            .documents
            .iter()
            .find(|&(_, doc)| DocumentEvaluator::matches(doc, &filter))
            .map(|(id, _)| id.clone());

        match target {
            Some(id) => {
                col.documents.remove(&id);
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn find(&self, query: Query, collection: &str) -> StoreResult<Vec<BsonDocument>> {
        let store = self.store.read().await;
        let col = match store.get(collection) {
            Some(col) => col,
            None => return Ok(vec![]),
        };

        let mut docs = col
            .documents
            .iter()
            .filter(|&(_, doc)| match &query.filter {
                Some(filter) => DocumentEvaluator::matches(doc, filter),
                None => true,
            })
            .map(|(id, doc)| with_id(id, doc))
            .collect::<Vec<_>>();

        if let Some(sort) = &query.sort {
            docs.sort_by(|a, b| {
                let left = a
                    .get(&sort.field)
                    .map(Comparable::from)
                    .unwrap_or(Comparable::Null);
                let right = b
                    .get(&sort.field)
                    .map(Comparable::from)
                    .unwrap_or(Comparable::Null);

                match sort.direction {
                    SortDirection::Asc => left.cmp_for_sort(&right),
                    SortDirection::Desc => right.cmp_for_sort(&left),
                }
            });
        }

        Ok(docs
            .into_iter()
            .skip(query.skip.unwrap_or(0))
            .take(query.limit.unwrap_or(usize::MAX))
            .collect())
    }

    async fn count(&self, filter: Option<Expr>, collection: &str) -> StoreResult<u64> {
        let store = self.store.read().await;
        let col = match store.get(collection) {
            Some(col) => col,
            None => return Ok(0),
        };

        let count = col
            .documents
            .values()
            .filter(|&doc| match &filter {
                Some(filter) => DocumentEvaluator::matches(doc, filter),
                None => true,
            })
            .count();

        Ok(count as u64)
    }

    async fn group_average(
        &self,
        group_by: &str,
        average: &str,
        collection: &str,
    ) -> StoreResult<Vec<GroupAverage>> {
        let store = self.store.read().await;
        let col = match store.get(collection) {
            Some(col) => col,
            None => return Ok(vec![]),
        };

        // Linear bucket scan; Bson is not hashable and collections here are small.
        let mut buckets: Vec<(Bson, f64, u64)> = Vec::new();

        for doc in col.documents.values() {
            let Some(key) = doc.get(group_by) else { continue };
            let Some(value) = doc.get(average).and_then(as_number) else { continue };

            match buckets
                .iter_mut()
                .find(|(existing, _, _)| existing == key)
            {
                Some((_, sum, count)) => {
                    *sum += value;
                    *count += 1;
                }
                None => buckets.push((key.clone(), value, 1)),
            }
        }

        Ok(buckets
            .into_iter()
            .map(|(key, sum, count)| GroupAverage {
                key,
                average: round_two(sum / count as f64),
            })
            .collect())
    }

    async fn create_unique_index(&self, collection: &str, field: &str) -> StoreResult<()> {
        let mut store = self.store.write().await;
        let col = store
            .entry(collection.to_string())
            .or_default();

        if col.unique_fields.iter().any(|f| f == field) {
            return Ok(());
        }

        // Refuse to register an index the existing data already violates.
        let mut seen: Vec<&Bson> = Vec::new();
        for doc in col.documents.values() {
            if let Some(value) = doc.get(field) {
                if seen.contains(&value) {
                    return Err(StoreError::DuplicateKey(format!(
                        "existing documents collide on {field} in collection {collection}"
                    )));
                }
                seen.push(value);
            }
        }

        col.unique_fields.push(field.to_string());

        Ok(())
    }

    async fn shutdown(&self) -> StoreResult<()> {
        Ok(())
    }
}

/// Builder for constructing [`InMemoryStore`] instances.
#[derive(Default)]
pub struct InMemoryStoreBuilder;

#[async_trait]
impl StoreBackendBuilder for InMemoryStoreBuilder {
    type Backend = InMemoryStore;

    async fn build(self) -> StoreResult<Self::Backend> {
        Ok(InMemoryStore::new())
    }
}

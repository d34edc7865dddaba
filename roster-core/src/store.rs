//! The document store handle.
//!
//! [`DocumentStore`] owns a backend and hands out collection handles. It is
//! constructed once at startup with an explicitly built backend, passed down
//! to whatever owns the domain logic, and shut down when the process stops.

use crate::{
    backend::StoreBackend,
    collection::{Collection, TypedCollection},
    document::Document,
    error::StoreResult,
};

/// A document store bound to a specific backend implementation.
#[derive(Debug)]
pub struct DocumentStore<B: StoreBackend> {
    backend: B,
}

impl<B: StoreBackend> DocumentStore<B> {
    /// Creates a new document store over the given backend.
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    /// Gets a typed collection for the record type `D`.
    ///
    /// The collection name comes from `D::collection_name()`.
    pub fn typed_collection<'a, D: Document>(&'a self) -> TypedCollection<'a, B, D> {
        TypedCollection::new(D::collection_name().to_string(), &self.backend)
    }

    /// Gets an untyped collection with the given name.
    pub fn collection<'a>(&'a self, name: &str) -> Collection<'a, B> {
        Collection::new(name.to_string(), &self.backend)
    }

    /// Creates a unique index on `field` in `collection`.
    ///
    /// Run once at startup, before the first write that relies on it.
    pub async fn create_unique_index(&self, collection: &str, field: &str) -> StoreResult<()> {
        self.backend
            .create_unique_index(collection, field)
            .await
    }

    /// Shuts down the backend and releases its resources.
    pub async fn shutdown(&self) -> StoreResult<()> {
        self.backend.shutdown().await
    }
}

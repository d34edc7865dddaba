use async_trait::async_trait;
use bson::{Bson, Document, doc, oid::ObjectId};
use futures::TryStreamExt;
use mongodb::{
    Client, Collection as MongoCollection, IndexModel,
    error::{Error as MongoError, ErrorKind, WriteFailure},
    options::{ClientOptions, FindOptions, IndexOptions},
};

use roster_core::{
    backend::{GroupAverage, StoreBackend, StoreBackendBuilder},
    error::{StoreError, StoreResult},
    query::{Expr, Query, QueryVisitor, SortDirection},
};

use crate::query::MongoQueryTranslator;

#[derive(Debug)]
pub struct MongoStore {
    client: Client,
    database: String,
}

impl MongoStore {
    pub fn new(client: Client, database: String) -> Self {
        Self { client, database }
    }

    pub fn builder(dsn: &str, database: &str) -> MongoStoreBuilder {
        MongoStoreBuilder::new(dsn, database)
    }

    fn collection(&self, name: &str) -> MongoCollection<Document> {
        self.client
            .database(&self.database)
            .collection(name)
    }

    // `_id` is a driver detail; callers see it as an opaque `id` string.
    fn restore_document(&self, mut document: Document) -> Document {
        if let Some(id) = document.remove("_id") {
            document.insert("id", render_id(id));
        }

        document
    }
}

fn render_id(id: Bson) -> String {
    match id {
        Bson::ObjectId(oid) => oid.to_hex(),
        Bson::String(s) => s,
        other => other.to_string(),
    }
}

fn map_error(err: MongoError) -> StoreError {
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(write)) if write.code == 11000 => {
            StoreError::DuplicateKey(write.message.clone())
        }
        _ => StoreError::Backend(err.to_string()),
    }
}

fn as_number(value: Option<&Bson>) -> Option<f64> {
    match value {
        Some(Bson::Double(v)) => Some(*v),
        Some(Bson::Int32(v)) => Some(*v as f64),
        Some(Bson::Int64(v)) => Some(*v as f64),
        _ => None,
    }
}

#[async_trait]
impl StoreBackend for MongoStore {
    async fn insert_one(&self, document: Document, collection: &str) -> StoreResult<String> {
        let result = self
            .collection(collection)
            .insert_one(document)
            .await
            .map_err(map_error)?;

        Ok(render_id(result.inserted_id))
    }

    async fn fetch(&self, id: &str, collection: &str) -> StoreResult<Option<Document>> {
        // Ids that do not parse as ObjectIds cannot name a stored document.
        let Ok(oid) = ObjectId::parse_str(id) else {
            return Ok(None);
        };

        Ok(self
            .collection(collection)
            .find_one(doc! { "_id": oid })
            .await
            .map_err(map_error)?
            .map(|document| self.restore_document(document)))
    }

    async fn find_one(
        &self,
        filter: Expr,
        collection: &str,
    ) -> StoreResult<Option<Document>> {
        Ok(self
            .collection(collection)
            .find_one(MongoQueryTranslator.visit_expr(&filter)?)
            .await
            .map_err(map_error)?
            .map(|document| self.restore_document(document)))
    }

    async fn update_one(
        &self,
        filter: Expr,
        fields: Document,
        collection: &str,
    ) -> StoreResult<u64> {
        let result = self
            .collection(collection)
            .update_one(
                MongoQueryTranslator.visit_expr(&filter)?,
                doc! { "$set": fields },
            )
            .await
            .map_err(map_error)?;

        Ok(result.matched_count)
    }

    async fn delete_one(
        &self,
        filter: Expr,
        collection: &str,
    ) -> StoreResult<u64> {
        let result = self
            .collection(collection)
            .delete_one(MongoQueryTranslator.visit_expr(&filter)?)
            .await
            .map_err(map_error)?;

        Ok(result.deleted_count)
    }

    async fn find(&self, query: Query, collection: &str) -> StoreResult<Vec<Document>> {
        let mut options = FindOptions::default();

        if let Some(limit) = query.limit {
            options.limit = Some(limit as i64);
        }
        if let Some(skip) = query.skip {
            options.skip = Some(skip as u64);
        }
        if let Some(sort) = &query.sort {
            options.sort = Some(doc! {
                sort.field.clone(): match sort.direction {
                    SortDirection::Asc => 1,
                    SortDirection::Desc => -1,
                }
            })
        }

        Ok(self
            .collection(collection)
            .find(
                if let Some(expr) = &query.filter {
                    MongoQueryTranslator.visit_expr(expr)?
                } else {
                    doc! {}
                },
            )
            .with_options(options)
            .await
            .map_err(map_error)?
            .try_collect::<Vec<Document>>()
            .await
            .map_err(map_error)?
            .into_iter()
            .map(|document| self.restore_document(document))
            .collect())
    }

    async fn count(
        &self,
        filter: Option<Expr>,
        collection: &str,
    ) -> StoreResult<u64> {
        self.collection(collection)
            .count_documents(match &filter {
                Some(expr) => MongoQueryTranslator.visit_expr(expr)?,
                None => doc! {},
            })
            .await
            .map_err(map_error)
    }

    async fn group_average(
        &self,
        group_by: &str,
        average: &str,
        collection: &str,
    ) -> StoreResult<Vec<GroupAverage>> {
        let pipeline = [
            doc! { "$group": {
                "_id": format!("${group_by}"),
                "average": { "$avg": format!("${average}") },
            } },
            doc! { "$project": {
                "_id": 0,
                "key": "$_id",
                "average": { "$round": ["$average", 2] },
            } },
        ];

        let rows = self
            .collection(collection)
            .aggregate(pipeline)
            .await
            .map_err(map_error)?
            .try_collect::<Vec<Document>>()
            .await
            .map_err(map_error)?;

        rows.into_iter()
            .map(|row| {
                let average = as_number(row.get("average")).ok_or_else(|| {
                    StoreError::InvalidDocument("aggregation row without numeric average".into())
                })?;

                Ok(GroupAverage {
                    key: row.get("key").cloned().unwrap_or(Bson::Null),
                    average,
                })
            })
            .collect()
    }

    async fn create_unique_index(&self, collection: &str, field: &str) -> StoreResult<()> {
        self.collection(collection)
            .create_index(
                IndexModel::builder()
                    .keys(doc! { field: 1 })
                    .options(
                        IndexOptions::builder()
                            .unique(true)
                            .build(),
                    )
                    .build(),
            )
            .await
            .map_err(map_error)?;

        Ok(())
    }

    async fn shutdown(&self) -> StoreResult<()> {
        // Client handles are reference-counted; shutting down a clone shuts
        // down the shared connection pool.
        self.client.clone().shutdown().await;

        Ok(())
    }
}

pub struct MongoStoreBuilder {
    dsn: String,
    database: String,
}

impl MongoStoreBuilder {
    pub fn new(dsn: &str, database: &str) -> Self {
        Self {
            dsn: dsn.to_string(),
            database: database.to_string(),
        }
    }
}

#[async_trait]
impl StoreBackendBuilder for MongoStoreBuilder {
    type Backend = MongoStore;

    async fn build(self) -> StoreResult<Self::Backend> {
        Ok(MongoStore::new(
            Client::with_options(
                ClientOptions::parse(&self.dsn)
                    .await
                    .map_err(|e| StoreError::Initialization(e.to_string()))?,
            )
            .map_err(|e| StoreError::Initialization(e.to_string()))?,
            self.database,
        ))
    }
}

//! The record trait binding a type to its stored representation.

use bson::Document as BsonDocument;

use crate::error::StoreResult;

/// A record type bound to a named collection.
///
/// Backends hand raw stored documents (with the storage-assigned id exposed
/// under the `id` key) to [`Document::from_stored`], which normalizes them
/// into the record shape. Implementations decide how tolerant to be of
/// loosely-typed or legacy field representations; a lossy normalization that
/// degrades a bad field to a default is legitimate, silently fabricating a
/// whole record is not.
///
/// # Example
///
/// ```ignore
/// use roster_core::document::Document;
///
/// #[derive(Debug, Clone)]
/// pub struct User {
///     pub id: String,
///     pub name: String,
/// }
///
/// impl Document for User {
///     fn collection_name() -> &'static str {
///         "users"
///     }
///
///     fn from_stored(document: bson::Document) -> roster_core::error::StoreResult<Self> {
///         Ok(User {
///             id: document.get_str("id")?.to_string(),
///             name: document.get_str("name")?.to_string(),
///         })
///     }
/// }
/// ```
pub trait Document: Send + Sync + Sized + 'static {
    /// Collection this record type lives in.
    ///
    /// A static, lowercase identifier (e.g. "employees"). Backends create the
    /// collection on first use if it does not exist.
    fn collection_name() -> &'static str;

    /// Builds the record from a raw stored document.
    fn from_stored(document: BsonDocument) -> StoreResult<Self>;
}

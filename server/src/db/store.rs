use async_trait::async_trait;
use mongodb::bson::{oid::ObjectId, Document};

use crate::error::Result;
use crate::query::{Predicate, QueryPlan};

/// Database capability every repository runs against.
///
/// Collections are addressed by name and hold plain BSON documents; typed
/// models live one layer up in the repositories.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Short backend name reported by `/health`.
    fn backend(&self) -> &'static str;

    /// Inserts `document`, assigning an `_id` when it has none.
    async fn insert(&self, collection: &str, document: Document) -> Result<ObjectId>;

    /// Runs a full plan: predicate, then sort, then the skip/limit window.
    async fn find(&self, collection: &str, plan: &QueryPlan) -> Result<Vec<Document>>;

    async fn find_one(&self, collection: &str, predicate: &Predicate) -> Result<Option<Document>>;

    /// `$set`s the fields of `set` on the first match and returns the
    /// document as it is after the update.
    async fn find_one_and_update(
        &self,
        collection: &str,
        predicate: &Predicate,
        set: Document,
    ) -> Result<Option<Document>>;

    /// Counts every match, independent of any page window.
    async fn count(&self, collection: &str, predicate: &Predicate) -> Result<u64>;

    async fn ensure_unique_index(&self, collection: &str, field: &str) -> Result<()>;
}

use async_trait::async_trait;
use futures_util::stream::TryStreamExt;
use mongodb::{
    bson::{doc, oid::ObjectId, Document},
    error::{ErrorKind, WriteFailure},
    options::{IndexOptions, ReturnDocument},
    Client, Collection, Database, IndexModel,
};

use super::store::DocumentStore;
use crate::error::{CanteenError, Result};
use crate::query::{Predicate, QueryPlan};

const DUPLICATE_KEY_CODE: i32 = 11000;

/// [`DocumentStore`] over a MongoDB database.
#[derive(Clone)]
pub struct MongoStore {
    db: Database,
}

impl MongoStore {
    pub fn new(client: Client, database_name: &str) -> Self {
        Self {
            db: client.database(database_name),
        }
    }

    pub async fn connect(uri: &str, database_name: &str) -> Result<Self> {
        let client = Client::with_uri_str(uri).await?;
        Ok(Self::new(client, database_name))
    }

    fn collection(&self, name: &str) -> Collection<Document> {
        self.db.collection(name)
    }
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(write_error))
            if write_error.code == DUPLICATE_KEY_CODE
    )
}

#[async_trait]
impl DocumentStore for MongoStore {
    fn backend(&self) -> &'static str {
        "mongodb"
    }

    async fn insert(&self, collection: &str, document: Document) -> Result<ObjectId> {
        let result = self
            .collection(collection)
            .insert_one(document)
            .await
            .map_err(|err| {
                if is_duplicate_key(&err) {
                    CanteenError::conflict(format!("Duplicate value in {collection}"))
                } else {
                    CanteenError::from(err)
                }
            })?;

        result.inserted_id.as_object_id().ok_or_else(|| {
            CanteenError::Internal(format!("{collection} insert returned a non-ObjectId id"))
        })
    }

    async fn find(&self, collection: &str, plan: &QueryPlan) -> Result<Vec<Document>> {
        let filter = plan.predicate.to_document();
        log::debug!(
            "find {} filter={} sort={} skip={} limit={}",
            collection,
            filter,
            plan.sort.to_document(),
            plan.skip,
            plan.limit
        );

        let cursor = self
            .collection(collection)
            .find(filter)
            .sort(plan.sort.to_document())
            .skip(plan.skip)
            .limit(i64::try_from(plan.limit).unwrap_or(i64::MAX))
            .await?;

        let documents: Vec<Document> = cursor.try_collect().await?;
        Ok(documents)
    }

    async fn find_one(&self, collection: &str, predicate: &Predicate) -> Result<Option<Document>> {
        Ok(self
            .collection(collection)
            .find_one(predicate.to_document())
            .await?)
    }

    async fn find_one_and_update(
        &self,
        collection: &str,
        predicate: &Predicate,
        set: Document,
    ) -> Result<Option<Document>> {
        Ok(self
            .collection(collection)
            .find_one_and_update(predicate.to_document(), doc! { "$set": set })
            .return_document(ReturnDocument::After)
            .await?)
    }

    async fn count(&self, collection: &str, predicate: &Predicate) -> Result<u64> {
        Ok(self
            .collection(collection)
            .count_documents(predicate.to_document())
            .await?)
    }

    async fn ensure_unique_index(&self, collection: &str, field: &str) -> Result<()> {
        let mut keys = Document::new();
        keys.insert(field, 1);

        let index = IndexModel::builder()
            .keys(keys)
            .options(IndexOptions::builder().unique(true).build())
            .build();

        self.collection(collection).create_index(index).await?;
        log::info!("Unique index ensured on {}.{}", collection, field);
        Ok(())
    }
}

//! Persistence: the document store capability, its MongoDB and in-memory
//! backends, and one repository per collection.

pub mod feedback;
pub mod meals;
pub mod memory;
pub mod models;
pub mod mongo;
pub mod raw_items;
pub mod store;
pub mod users;

use std::sync::Arc;

use mongodb::bson::{self, Document};
use protocol::Page;
use serde::de::DeserializeOwned;

use crate::error::Result;
use crate::query::{build_plan, ListParams, ResourceFields};

pub use feedback::FeedbackRepository;
pub use meals::MealRepository;
pub use memory::MemoryStore;
pub use mongo::MongoStore;
pub use raw_items::RawItemRepository;
pub use store::DocumentStore;
pub use users::UserRepository;

/// Shared handle to the configured store; hands out repositories.
#[derive(Clone)]
pub struct DbContext {
    store: Arc<dyn DocumentStore>,
}

impl DbContext {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    pub fn backend(&self) -> &'static str {
        self.store.backend()
    }

    pub fn raw_items(&self) -> RawItemRepository {
        RawItemRepository::new(self.store.clone())
    }

    pub fn meals(&self) -> MealRepository {
        MealRepository::new(self.store.clone())
    }

    pub fn feedback(&self) -> FeedbackRepository {
        FeedbackRepository::new(self.store.clone())
    }

    pub fn users(&self) -> UserRepository {
        UserRepository::new(self.store.clone())
    }

    /// Declares the unique indexes backing the read-then-write uniqueness checks.
    pub async fn init_indexes(&self) -> Result<()> {
        self.store
            .ensure_unique_index(users::COLLECTION, "email")
            .await?;
        self.store
            .ensure_unique_index(meals::COLLECTION, "name")
            .await?;

        log::info!("Database indexes created successfully");
        Ok(())
    }
}

/// Runs one list request against `collection`: the page of matches plus the
/// total match count over the same predicate.
pub(crate) async fn fetch_page<T: DeserializeOwned>(
    store: &dyn DocumentStore,
    collection: &str,
    fields: &ResourceFields,
    params: &ListParams,
) -> Result<Page<T>> {
    let plan = build_plan(fields, params)?;
    log::debug!("{} query plan: {:?}", collection, plan);

    let documents = store.find(collection, &plan).await?;
    let total = store.count(collection, &plan.predicate).await?;

    let data = decode_all(documents)?;
    Ok(Page::new(
        params.pagination.page(),
        params.pagination.limit(),
        total,
        data,
    ))
}

pub(crate) fn decode_all<T: DeserializeOwned>(documents: Vec<Document>) -> Result<Vec<T>> {
    let decoded = documents
        .into_iter()
        .map(bson::from_document)
        .collect::<std::result::Result<Vec<T>, _>>()?;
    Ok(decoded)
}

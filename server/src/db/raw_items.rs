use std::sync::Arc;

use mongodb::bson::{self, oid::ObjectId};
use protocol::Page;

use super::models::{
    parse_object_id, timestamp_now, CreatedSummary, NewRawItem, RawItem, RawItemPatch,
    UpdatedSummary,
};
use super::{fetch_page, DocumentStore};
use crate::error::{CanteenError, Result};
use crate::query::{FieldSpec, ListParams, Predicate, ResourceFields};

pub const COLLECTION: &str = "raw_items";

pub const FIELDS: ResourceFields = ResourceFields {
    searchable: &["title", "details", "addedBy"],
    filterable: &[
        FieldSpec::text("addedBy"),
        FieldSpec::numeric("price"),
        FieldSpec::numeric("quantity"),
        FieldSpec::date("createdAt"),
    ],
};

#[derive(Clone)]
pub struct RawItemRepository {
    store: Arc<dyn DocumentStore>,
}

impl RawItemRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub async fn create(&self, item: NewRawItem) -> Result<CreatedSummary> {
        let record = item.into_record(timestamp_now())?;
        let id = self
            .store
            .insert(COLLECTION, bson::to_document(&record)?)
            .await?;

        log::info!("Raw item created: {} ({})", record.title, id);
        Ok(CreatedSummary {
            id: id.to_hex(),
            title: record.title,
            created_at: record.created_at,
        })
    }

    pub async fn fetch(&self, params: &ListParams) -> Result<Page<RawItem>> {
        fetch_page(self.store.as_ref(), COLLECTION, &FIELDS, params).await
    }

    pub async fn find_by_id(&self, id: ObjectId) -> Result<Option<RawItem>> {
        self.store
            .find_one(COLLECTION, &Predicate::by_id(id))
            .await?
            .map(bson::from_document)
            .transpose()
            .map_err(CanteenError::from)
    }

    /// Applies only the fields present in `patch` and stamps `updatedAt`.
    pub async fn update(&self, id: &str, patch: RawItemPatch) -> Result<UpdatedSummary> {
        let id = parse_object_id(id)?;
        patch.validate()?;
        let updated_at = timestamp_now();

        let mut set = bson::to_document(&patch)?;
        set.insert("updatedAt", updated_at.clone());

        let updated = self
            .store
            .find_one_and_update(COLLECTION, &Predicate::by_id(id), set)
            .await?
            .ok_or_else(|| CanteenError::not_found("Raw item not found"))?;
        let updated: RawItem = bson::from_document(updated)?;

        log::info!("Raw item updated: {}", id);
        Ok(UpdatedSummary {
            id: id.to_hex(),
            title: updated.title,
            updated_at,
        })
    }
}

use std::sync::Arc;

use mongodb::bson;
use protocol::Page;

use super::models::{parse_object_id, timestamp_now, CreatedSummary, Meal, NewMeal, PopulatedMeal};
use super::raw_items::RawItemRepository;
use super::{fetch_page, DocumentStore};
use crate::error::{CanteenError, Result};
use crate::query::{Clause, FieldSpec, ListParams, Predicate, ResourceFields};

pub const COLLECTION: &str = "meals";

pub const FIELDS: ResourceFields = ResourceFields {
    searchable: &["name"],
    filterable: &[
        FieldSpec::text("rawItem"),
        FieldSpec::numeric("price"),
        FieldSpec::date("createdAt"),
    ],
};

#[derive(Clone)]
pub struct MealRepository {
    store: Arc<dyn DocumentStore>,
    raw_items: RawItemRepository,
}

impl MealRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            raw_items: RawItemRepository::new(store.clone()),
            store,
        }
    }

    /// Rejects a duplicate name, then any `rawItem` entry that is malformed
    /// or points at no raw item, before writing anything.
    pub async fn create(&self, meal: NewMeal) -> Result<CreatedSummary> {
        let record = meal.into_record(timestamp_now())?;

        let existing = self
            .store
            .find_one(COLLECTION, &Predicate::with(Clause::equals("name", record.name.as_str())))
            .await?;
        if existing.is_some() {
            return Err(CanteenError::conflict(format!(
                "A meal with the name '{}' already exists.",
                record.name
            )));
        }

        for raw_item_id in &record.raw_item {
            let id = parse_object_id(raw_item_id).map_err(|_| {
                CanteenError::validation(format!("Invalid rawItem id: {raw_item_id}"))
            })?;
            if self.raw_items.find_by_id(id).await?.is_none() {
                return Err(CanteenError::reference(format!(
                    "Raw item with id {raw_item_id} does not exist."
                )));
            }
        }

        let id = self
            .store
            .insert(COLLECTION, bson::to_document(&record)?)
            .await?;

        log::info!("Meal created: {} ({})", record.name, id);
        Ok(CreatedSummary {
            id: id.to_hex(),
            title: record.name,
            created_at: record.created_at,
        })
    }

    pub async fn fetch(&self, params: &ListParams) -> Result<Page<PopulatedMeal>> {
        let page: Page<Meal> = fetch_page(self.store.as_ref(), COLLECTION, &FIELDS, params).await?;

        let mut data = Vec::with_capacity(page.data.len());
        for meal in page.data {
            data.push(self.populate(meal).await?);
        }

        Ok(Page {
            meta: page.meta,
            data,
        })
    }

    /// Resolves `rawItem` ids into raw items. Ids that no longer parse or
    /// resolve are dropped.
    async fn populate(&self, meal: Meal) -> Result<PopulatedMeal> {
        let mut raw_items = Vec::with_capacity(meal.raw_item.len());
        for raw_item_id in &meal.raw_item {
            let Ok(id) = parse_object_id(raw_item_id) else {
                continue;
            };
            if let Some(item) = self.raw_items.find_by_id(id).await? {
                raw_items.push(item);
            }
        }

        let dropped = meal.raw_item.len() - raw_items.len();
        if dropped > 0 {
            log::warn!(
                "Meal {} references {} raw item(s) that could not be resolved",
                meal.name,
                dropped
            );
        }

        Ok(PopulatedMeal {
            id: meal.id,
            name: meal.name,
            raw_item: raw_items,
            price: meal.price,
            created_at: meal.created_at,
        })
    }
}

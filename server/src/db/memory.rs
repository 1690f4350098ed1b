use std::cmp::Ordering;
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use mongodb::bson::{oid::ObjectId, Bson, Document};

use super::store::DocumentStore;
use crate::error::{CanteenError, Result};
use crate::query::{compare_values, Predicate, QueryPlan, Sort, SortDirection};

/// Process-local [`DocumentStore`] for tests and development.
///
/// Each collection is a vector in insertion order. Unique indexes are
/// enforced on insert the way MongoDB would.
#[derive(Clone, Default)]
pub struct MemoryStore {
    collections: Arc<DashMap<String, Vec<Document>>>,
    unique_fields: Arc<DashMap<String, Vec<String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self, collection: &str) -> usize {
        self.collections
            .get(collection)
            .map(|entry| entry.len())
            .unwrap_or_default()
    }

    pub fn is_empty(&self, collection: &str) -> bool {
        self.len(collection) == 0
    }

    fn violates_unique(
        &self,
        collection: &str,
        existing: &[Document],
        candidate: &Document,
    ) -> Option<String> {
        let fields = self.unique_fields.get(collection)?;
        let violated = fields.iter().find(|field| {
            candidate
                .get(field.as_str())
                .is_some_and(|value| existing.iter().any(|doc| doc.get(field.as_str()) == Some(value)))
        });
        violated.cloned()
    }
}

/// Rank of a value's type in MongoDB's cross-type sort order. Missing fields
/// sort as null.
fn type_rank(value: Option<&Bson>) -> u8 {
    match value {
        None | Some(Bson::Null) => 0,
        Some(Bson::Int32(_) | Bson::Int64(_) | Bson::Double(_)) => 1,
        Some(Bson::String(_)) => 2,
        Some(Bson::Document(_)) => 3,
        Some(Bson::Array(_)) => 4,
        Some(Bson::ObjectId(_)) => 5,
        Some(Bson::Boolean(_)) => 6,
        Some(Bson::DateTime(_)) => 7,
        Some(_) => 8,
    }
}

fn compare_by(sort: &Sort, left: &Document, right: &Document) -> Ordering {
    let a = left.get(&sort.field);
    let b = right.get(&sort.field);

    let ordering = match (a, b) {
        (Some(a), Some(b)) => compare_values(a, b),
        _ => None,
    }
    .unwrap_or_else(|| type_rank(a).cmp(&type_rank(b)));

    match sort.direction {
        SortDirection::Ascending => ordering,
        SortDirection::Descending => ordering.reverse(),
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn insert(&self, collection: &str, mut document: Document) -> Result<ObjectId> {
        let id = match document.get("_id") {
            Some(Bson::ObjectId(id)) => *id,
            _ => {
                let id = ObjectId::new();
                document.insert("_id", id);
                id
            }
        };

        let mut docs = self.collections.entry(collection.to_string()).or_default();
        if docs.iter().any(|doc| doc.get("_id") == Some(&Bson::ObjectId(id))) {
            return Err(CanteenError::conflict(format!("Duplicate value in {collection}")));
        }
        if let Some(field) = self.violates_unique(collection, &docs, &document) {
            return Err(CanteenError::conflict(format!(
                "Duplicate value in {collection}.{field}"
            )));
        }

        docs.push(document);
        Ok(id)
    }

    async fn find(&self, collection: &str, plan: &QueryPlan) -> Result<Vec<Document>> {
        let mut matched: Vec<Document> = match self.collections.get(collection) {
            Some(docs) => docs
                .iter()
                .filter(|doc| plan.predicate.matches(doc))
                .cloned()
                .collect(),
            None => Vec::new(),
        };

        matched.sort_by(|a, b| compare_by(&plan.sort, a, b));

        let skip = usize::try_from(plan.skip).unwrap_or(usize::MAX);
        let limit = usize::try_from(plan.limit).unwrap_or(usize::MAX);
        Ok(matched.into_iter().skip(skip).take(limit).collect())
    }

    async fn find_one(&self, collection: &str, predicate: &Predicate) -> Result<Option<Document>> {
        Ok(self.collections.get(collection).and_then(|docs| {
            docs.iter()
                .find(|doc| predicate.matches(doc))
                .cloned()
        }))
    }

    async fn find_one_and_update(
        &self,
        collection: &str,
        predicate: &Predicate,
        set: Document,
    ) -> Result<Option<Document>> {
        let Some(mut docs) = self.collections.get_mut(collection) else {
            return Ok(None);
        };

        Ok(docs
            .iter_mut()
            .find(|doc| predicate.matches(doc))
            .map(|doc| {
                for (key, value) in set {
                    doc.insert(key, value);
                }
                doc.clone()
            }))
    }

    async fn count(&self, collection: &str, predicate: &Predicate) -> Result<u64> {
        let matched = self
            .collections
            .get(collection)
            .map(|docs| docs.iter().filter(|doc| predicate.matches(doc)).count())
            .unwrap_or_default();
        Ok(matched as u64)
    }

    async fn ensure_unique_index(&self, collection: &str, field: &str) -> Result<()> {
        let mut fields = self.unique_fields.entry(collection.to_string()).or_default();
        if !fields.iter().any(|existing| existing == field) {
            fields.push(field.to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{Clause, Pagination};
    use mongodb::bson::doc;

    fn plan(predicate: Predicate, sort: Sort, pagination: Pagination) -> QueryPlan {
        QueryPlan {
            predicate,
            sort,
            skip: pagination.offset(),
            limit: pagination.limit(),
        }
    }

    async fn seeded() -> MemoryStore {
        let store = MemoryStore::new();
        for (title, price) in [("Rice", 40), ("Dal", 25), ("Paneer", 90), ("Roti", 5)] {
            store
                .insert("raw_items", doc! { "title": title, "price": price })
                .await
                .unwrap();
        }
        store
    }

    #[tokio::test]
    async fn insert_assigns_object_id() {
        let store = MemoryStore::new();
        let id = store.insert("meals", doc! { "name": "Thali" }).await.unwrap();

        let found = store
            .find_one("meals", &Predicate::by_id(id))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.get_object_id("_id").unwrap(), id);
        assert_eq!(store.len("meals"), 1);
    }

    #[tokio::test]
    async fn find_sorts_and_windows() {
        let store = seeded().await;
        let ascending = Sort::new("price", SortDirection::Ascending);

        let first = store
            .find(
                "raw_items",
                &plan(Predicate::all(), ascending.clone(), Pagination::new(1, 3).unwrap()),
            )
            .await
            .unwrap();
        let titles: Vec<&str> = first.iter().map(|d| d.get_str("title").unwrap()).collect();
        assert_eq!(titles, ["Roti", "Dal", "Rice"]);

        let second = store
            .find(
                "raw_items",
                &plan(Predicate::all(), ascending, Pagination::new(2, 3).unwrap()),
            )
            .await
            .unwrap();
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].get_str("title").unwrap(), "Paneer");
    }

    #[tokio::test]
    async fn missing_sort_field_sorts_first_ascending() {
        let store = seeded().await;
        store.insert("raw_items", doc! { "title": "Salt" }).await.unwrap();

        let docs = store
            .find(
                "raw_items",
                &plan(
                    Predicate::all(),
                    Sort::new("price", SortDirection::Ascending),
                    Pagination::new(1, 10).unwrap(),
                ),
            )
            .await
            .unwrap();
        assert_eq!(docs[0].get_str("title").unwrap(), "Salt");
    }

    #[tokio::test]
    async fn count_ignores_window() {
        let store = seeded().await;
        let predicate = Predicate::with(Clause::any_contains(&["title"], "r"));
        assert_eq!(store.count("raw_items", &predicate).await.unwrap(), 3);
        assert_eq!(store.count("missing", &predicate).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn update_sets_only_given_fields() {
        let store = seeded().await;
        let predicate = Predicate::with(Clause::equals("title", "Dal"));

        let updated = store
            .find_one_and_update("raw_items", &predicate, doc! { "price": 30 })
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.get_i32("price").unwrap(), 30);
        assert_eq!(updated.get_str("title").unwrap(), "Dal");

        let none = store
            .find_one_and_update(
                "raw_items",
                &Predicate::with(Clause::equals("title", "Ghee")),
                doc! { "price": 1 },
            )
            .await
            .unwrap();
        assert!(none.is_none());
    }

    #[tokio::test]
    async fn unique_index_rejects_duplicates() {
        let store = MemoryStore::new();
        store.ensure_unique_index("users", "email").await.unwrap();
        store
            .insert("users", doc! { "email": "a@canteen.test" })
            .await
            .unwrap();

        let err = store
            .insert("users", doc! { "email": "a@canteen.test" })
            .await
            .unwrap_err();
        assert!(matches!(err, CanteenError::Conflict(_)));
        assert_eq!(store.len("users"), 1);
    }
}

use std::sync::Arc;

use mongodb::bson;
use protocol::Page;

use super::models::{parse_object_id, timestamp_now, Feedback, FeedbackSummary};
use super::{fetch_page, meals, users, DocumentStore};
use crate::error::{CanteenError, Result};
use crate::query::{FieldSpec, ListParams, Predicate, ResourceFields};

pub const COLLECTION: &str = "feedback";

pub const FIELDS: ResourceFields = ResourceFields {
    searchable: &["comment", "suggestions", "complaints"],
    filterable: &[
        FieldSpec::text("userId"),
        FieldSpec::text("mealId"),
        FieldSpec::text("visitFrequency"),
        FieldSpec::text("preferredMeals"),
        FieldSpec::text("improvementAreas"),
        FieldSpec::numeric("foodQuality"),
        FieldSpec::numeric("taste"),
        FieldSpec::numeric("portionSize"),
        FieldSpec::numeric("hygiene"),
        FieldSpec::numeric("serviceSpeed"),
        FieldSpec::numeric("staffBehaviour"),
        FieldSpec::numeric("valueForMoney"),
        FieldSpec::numeric("overallSatisfaction"),
        FieldSpec::numeric("rating"),
        FieldSpec::date("createdAt"),
    ],
};

#[derive(Clone)]
pub struct FeedbackRepository {
    store: Arc<dyn DocumentStore>,
}

impl FeedbackRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Checks that `userId`, and `mealId` when given, reference existing
    /// documents before inserting.
    pub async fn create(&self, mut feedback: Feedback) -> Result<FeedbackSummary> {
        let user_id = parse_object_id(&feedback.user_id)
            .map_err(|_| CanteenError::validation("Invalid userId. Must be a valid ObjectId."))?;
        if self
            .store
            .find_one(users::COLLECTION, &Predicate::by_id(user_id))
            .await?
            .is_none()
        {
            return Err(CanteenError::reference(
                "User with the given userId does not exist.",
            ));
        }

        if let Some(meal_id) = feedback.meal_id.as_deref() {
            let meal_id = parse_object_id(meal_id).map_err(|_| {
                CanteenError::validation("Invalid mealId. Must be a valid ObjectId.")
            })?;
            if self
                .store
                .find_one(meals::COLLECTION, &Predicate::by_id(meal_id))
                .await?
                .is_none()
            {
                return Err(CanteenError::reference(
                    "Meal with the given mealId does not exist.",
                ));
            }
        }

        feedback.id = None;
        feedback.created_at = timestamp_now();

        let id = self
            .store
            .insert(COLLECTION, bson::to_document(&feedback)?)
            .await?;

        log::info!("Feedback {} recorded for user {}", id, feedback.user_id);
        Ok(FeedbackSummary {
            id: id.to_hex(),
            user_id: feedback.user_id,
            created_at: feedback.created_at,
        })
    }

    pub async fn fetch(&self, params: &ListParams) -> Result<Page<Feedback>> {
        fetch_page(self.store.as_ref(), COLLECTION, &FIELDS, params).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use crate::query::{END_DATE_KEY, START_DATE_KEY};
    use mongodb::bson::{doc, oid::ObjectId};

    async fn store_with_user() -> (FeedbackRepository, MemoryStore, String) {
        let store = MemoryStore::new();
        let user_id = store
            .insert(users::COLLECTION, doc! { "email": "diner@canteen.test" })
            .await
            .unwrap();
        (
            FeedbackRepository::new(Arc::new(store.clone())),
            store,
            user_id.to_hex(),
        )
    }

    fn feedback_from(user_id: &str) -> Feedback {
        Feedback {
            user_id: user_id.to_string(),
            taste: Some(4),
            rating: Some(5),
            preferred_meals: vec!["Veg Thali".to_string(), "Dosa".to_string()],
            comment: Some("Great sambar".to_string()),
            terms_accepted: true,
            ..Feedback::default()
        }
    }

    async fn insert_dated(store: &MemoryStore, user_id: &str, created_at: &str) {
        store
            .insert(
                COLLECTION,
                doc! {
                    "userId": user_id,
                    "preferredMeals": [],
                    "improvementAreas": [],
                    "termsAccepted": false,
                    "createdAt": created_at,
                },
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn create_returns_summary_for_known_user() {
        let (repo, store, user_id) = store_with_user().await;
        let summary = repo.create(feedback_from(&user_id)).await.unwrap();

        assert_eq!(summary.user_id, user_id);
        assert!(!summary.created_at.is_empty());
        assert_eq!(store.len(COLLECTION), 1);
    }

    #[tokio::test]
    async fn unknown_user_is_a_reference_error_and_not_inserted() {
        let (repo, store, _) = store_with_user().await;
        let err = repo
            .create(feedback_from(&ObjectId::new().to_hex()))
            .await
            .unwrap_err();

        assert!(matches!(err, CanteenError::Reference(_)));
        assert!(store.is_empty(COLLECTION));
    }

    #[tokio::test]
    async fn malformed_user_id_is_a_validation_error() {
        let (repo, _, _) = store_with_user().await;
        let err = repo.create(feedback_from("user-1")).await.unwrap_err();
        assert!(matches!(err, CanteenError::Validation(_)));
    }

    #[tokio::test]
    async fn unknown_meal_is_a_reference_error() {
        let (repo, store, user_id) = store_with_user().await;
        let mut feedback = feedback_from(&user_id);
        feedback.meal_id = Some(ObjectId::new().to_hex());

        let err = repo.create(feedback).await.unwrap_err();
        assert!(matches!(err, CanteenError::Reference(_)));
        assert!(store.is_empty(COLLECTION));
    }

    #[tokio::test]
    async fn known_meal_is_accepted() {
        let (repo, store, user_id) = store_with_user().await;
        let meal_id = store
            .insert(meals::COLLECTION, doc! { "name": "Dosa" })
            .await
            .unwrap();
        let mut feedback = feedback_from(&user_id);
        feedback.meal_id = Some(meal_id.to_hex());

        repo.create(feedback).await.unwrap();
        assert_eq!(store.len(COLLECTION), 1);
    }

    #[tokio::test]
    async fn date_range_is_inclusive_of_both_days() {
        let (repo, store, user_id) = store_with_user().await;
        insert_dated(&store, &user_id, "2023-12-31T23:59:59.999999").await;
        insert_dated(&store, &user_id, "2024-01-01T00:00:00.000000").await;
        insert_dated(&store, &user_id, "2024-01-15T12:00:00.000000").await;
        insert_dated(&store, &user_id, "2024-01-31T23:59:59.000000").await;
        insert_dated(&store, &user_id, "2024-01-31T23:59:59.999999").await;
        insert_dated(&store, &user_id, "2024-02-01T00:00:00.000000").await;

        let params = ListParams::default()
            .filter(START_DATE_KEY, "01/01/2024")
            .filter(END_DATE_KEY, "01/31/2024")
            .sorted_by("createdAt", "asc");
        let page = repo.fetch(&params).await.unwrap();

        let stamps: Vec<&str> = page.data.iter().map(|f| f.created_at.as_str()).collect();
        assert_eq!(
            stamps,
            [
                "2024-01-01T00:00:00.000000",
                "2024-01-15T12:00:00.000000",
                "2024-01-31T23:59:59.000000",
                "2024-01-31T23:59:59.999999",
            ]
        );
        assert_eq!(page.meta.total, 4);
    }

    #[tokio::test]
    async fn list_fields_filter_by_membership_and_ratings_by_value() {
        let (repo, _, user_id) = store_with_user().await;
        repo.create(feedback_from(&user_id)).await.unwrap();
        let mut other = feedback_from(&user_id);
        other.preferred_meals = vec!["Idli".to_string()];
        other.taste = Some(2);
        repo.create(other).await.unwrap();

        let by_meal = repo
            .fetch(&ListParams::default().filter("preferredMeals", "Dosa"))
            .await
            .unwrap();
        assert_eq!(by_meal.meta.total, 1);

        let by_taste = repo
            .fetch(&ListParams::default().filter("taste", "2"))
            .await
            .unwrap();
        assert_eq!(by_taste.meta.total, 1);
        assert_eq!(by_taste.data[0].preferred_meals, ["Idli"]);
    }
}

use std::sync::Arc;

use mongodb::bson::{self, oid::ObjectId, Bson};
use protocol::Page;

use super::models::{User, UserProfile};
use super::{fetch_page, DocumentStore};
use crate::error::{CanteenError, Result};
use crate::query::{Clause, FieldSpec, ListParams, Predicate, ResourceFields};

pub const COLLECTION: &str = "users";

pub const FIELDS: ResourceFields = ResourceFields {
    searchable: &["name", "email", "designation", "department"],
    filterable: &[
        FieldSpec::text("designation"),
        FieldSpec::text("department"),
        FieldSpec::text("category"),
        FieldSpec::numeric("member_serial_number"),
        FieldSpec::date("createdAt"),
    ],
};

pub const DUPLICATE_EMAIL_MESSAGE: &str = "A user with this email already exists.";

#[derive(Clone)]
pub struct UserRepository {
    store: Arc<dyn DocumentStore>,
}

impl UserRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub async fn ensure_email_available(&self, email: &str) -> Result<()> {
        if self.find_by_field("email", email).await?.is_some() {
            return Err(CanteenError::conflict(DUPLICATE_EMAIL_MESSAGE));
        }
        Ok(())
    }

    /// Inserts a user whose password is already hashed. Callers check the
    /// email with [`Self::ensure_email_available`] first; the unique index on
    /// `email` turns a concurrent duplicate into the same Conflict.
    pub async fn create(&self, user: User) -> Result<ObjectId> {
        let id = self
            .store
            .insert(COLLECTION, bson::to_document(&user)?)
            .await
            .map_err(|err| match err {
                CanteenError::Conflict(_) => CanteenError::conflict(DUPLICATE_EMAIL_MESSAGE),
                other => other,
            })?;

        log::info!("User created: {} ({})", user.email, id);
        Ok(id)
    }

    pub async fn find_by_id(&self, id: ObjectId) -> Result<Option<User>> {
        self.find_one(&Predicate::by_id(id)).await
    }

    /// Exact-match lookup on a single stored field.
    pub async fn find_by_field(
        &self,
        field: &str,
        value: impl Into<Bson>,
    ) -> Result<Option<User>> {
        self.find_one(&Predicate::with(Clause::equals(field, value)))
            .await
    }

    pub async fn fetch(&self, params: &ListParams) -> Result<Page<UserProfile>> {
        let page: Page<User> = fetch_page(self.store.as_ref(), COLLECTION, &FIELDS, params).await?;
        Ok(page.map(UserProfile::from))
    }

    async fn find_one(&self, predicate: &Predicate) -> Result<Option<User>> {
        self.store
            .find_one(COLLECTION, predicate)
            .await?
            .map(bson::from_document)
            .transpose()
            .map_err(CanteenError::from)
    }
}

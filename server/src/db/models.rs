use chrono::Utc;
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize, Serializer};

use crate::error::{CanteenError, Result};

pub const INVALID_ID_MESSAGE: &str = "Invalid id";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

/// Current UTC wall clock as a sortable ISO-8601 string with microseconds.
pub fn timestamp_now() -> String {
    Utc::now().format(TIMESTAMP_FORMAT).to_string()
}

pub fn parse_object_id(raw: &str) -> Result<ObjectId> {
    ObjectId::parse_str(raw).map_err(|_| CanteenError::validation(INVALID_ID_MESSAGE))
}

/// Renders `_id` as its 24-hex string on the wire. Stored documents are only
/// serialized to BSON before insert, when the id is still unset and skipped.
fn serialize_hex_id<S>(id: &Option<ObjectId>, serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match id {
        Some(id) => serializer.serialize_str(&id.to_hex()),
        None => serializer.serialize_none(),
    }
}

fn require(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(CanteenError::validation(format!("{field} is required")));
    }
    Ok(())
}

fn require_present(field: &str, value: Option<String>) -> Result<String> {
    match value {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(CanteenError::validation(format!("{field} is required"))),
    }
}

// Raw items

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawItem {
    #[serde(
        rename = "_id",
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_hex_id"
    )]
    pub id: Option<ObjectId>,
    pub title: String,
    #[serde(default)]
    pub details: Option<String>,
    pub price: i64,
    pub quantity: i64,
    pub added_by: String,
    pub created_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRawItem {
    pub title: String,
    #[serde(default)]
    pub details: Option<String>,
    pub price: i64,
    pub quantity: i64,
    pub added_by: String,
}

impl NewRawItem {
    pub fn into_record(self, created_at: String) -> Result<RawItem> {
        require("title", &self.title)?;
        require("addedBy", &self.added_by)?;

        Ok(RawItem {
            id: None,
            title: self.title,
            details: self.details,
            price: self.price,
            quantity: self.quantity,
            added_by: self.added_by,
            created_at,
            updated_at: None,
        })
    }
}

/// Partial update body. Absent fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawItemPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub added_by: Option<String>,
}

impl RawItemPatch {
    /// Required fields may be left out of a patch but not blanked by it.
    pub fn validate(&self) -> Result<()> {
        if let Some(title) = &self.title {
            require("title", title)?;
        }
        if let Some(added_by) = &self.added_by {
            require("addedBy", added_by)?;
        }
        Ok(())
    }
}

/// Summary returned by create endpoints: `{_id, title, createdAt}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedSummary {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatedSummary {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub updated_at: String,
}

// Meals

/// Stored meal. `raw_item` holds RawItem id strings in insertion order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Meal {
    #[serde(
        rename = "_id",
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_hex_id"
    )]
    pub id: Option<ObjectId>,
    pub name: String,
    #[serde(default)]
    pub raw_item: Vec<String>,
    pub price: i64,
    pub created_at: String,
}

/// Meal as listed, with `rawItem` resolved into the referenced raw items.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PopulatedMeal {
    #[serde(rename = "_id", serialize_with = "serialize_hex_id")]
    pub id: Option<ObjectId>,
    pub name: String,
    pub raw_item: Vec<RawItem>,
    pub price: i64,
    pub created_at: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMeal {
    pub name: String,
    #[serde(default)]
    pub raw_item: Vec<String>,
    pub price: i64,
}

impl NewMeal {
    pub fn into_record(self, created_at: String) -> Result<Meal> {
        require("name", &self.name)?;

        Ok(Meal {
            id: None,
            name: self.name,
            raw_item: self.raw_item,
            price: self.price,
            created_at,
        })
    }
}

// Feedback

/// One feedback submission. Ratings are on a small positive scale whose
/// meaning belongs to the client.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Feedback {
    #[serde(
        rename = "_id",
        default,
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_hex_id"
    )]
    pub id: Option<ObjectId>,
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meal_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub food_quality: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub taste: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub portion_size: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hygiene: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_speed: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub staff_behaviour: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_for_money: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overall_satisfaction: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visit_frequency: Option<String>,
    #[serde(default)]
    pub preferred_meals: Vec<String>,
    #[serde(default)]
    pub improvement_areas: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestions: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub complaints: Option<String>,

    #[serde(default)]
    pub terms_accepted: bool,
    /// Stamped by the repository; any client-supplied value is replaced.
    #[serde(default)]
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackSummary {
    #[serde(rename = "_id")]
    pub id: String,
    pub user_id: String,
    pub created_at: String,
}

// Users

/// Stored user, password hash included. Never rendered directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub member_serial_number: i64,
    pub name: String,
    pub designation: String,
    pub department: String,
    pub email: String,
    pub phone1: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone2: Option<String>,
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub password: String,
    #[serde(rename = "createdAt")]
    pub created_at: String,
}

/// A user as the API shows it: everything but the password hash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(rename = "_id")]
    pub id: String,
    pub member_serial_number: i64,
    pub name: String,
    pub designation: String,
    pub department: String,
    pub email: String,
    pub phone1: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone2: Option<String>,
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(rename = "createdAt")]
    pub created_at: String,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self {
            id: user.id.map(|id| id.to_hex()).unwrap_or_default(),
            member_serial_number: user.member_serial_number,
            name: user.name,
            designation: user.designation,
            department: user.department,
            email: user.email,
            phone1: user.phone1,
            phone2: user.phone2,
            address: user.address,
            category: user.category,
            created_at: user.created_at,
        }
    }
}

/// Registration body. Every field is optional on the wire so that a missing
/// required field is reported by name rather than as a parse failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewUser {
    #[serde(default)]
    pub member_serial_number: Option<i64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub designation: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone1: Option<String>,
    #[serde(default)]
    pub phone2: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// A registration whose required fields are all present and non-empty.
/// The password is still plaintext here.
#[derive(Debug, Clone)]
pub struct ValidatedUser {
    pub member_serial_number: i64,
    pub name: String,
    pub designation: String,
    pub department: String,
    pub email: String,
    pub phone1: String,
    pub phone2: Option<String>,
    pub address: String,
    pub category: Option<String>,
    pub password: String,
}

impl NewUser {
    pub fn validate(self) -> Result<ValidatedUser> {
        let member_serial_number = self
            .member_serial_number
            .ok_or_else(|| CanteenError::validation("member_serial_number is required"))?;

        Ok(ValidatedUser {
            member_serial_number,
            name: require_present("name", self.name)?,
            designation: require_present("designation", self.designation)?,
            department: require_present("department", self.department)?,
            email: require_present("email", self.email)?,
            phone1: require_present("phone1", self.phone1)?,
            phone2: self.phone2.filter(|phone| !phone.trim().is_empty()),
            address: require_present("address", self.address)?,
            category: self.category.filter(|category| !category.trim().is_empty()),
            password: require_present("password", self.password)?,
        })
    }
}

impl ValidatedUser {
    pub fn into_record(self, password_hash: String, created_at: String) -> User {
        User {
            id: None,
            member_serial_number: self.member_serial_number,
            name: self.name,
            designation: self.designation,
            department: self.department,
            email: self.email,
            phone1: self.phone1,
            phone2: self.phone2,
            address: self.address,
            category: self.category,
            password: password_hash,
            created_at,
        }
    }
}

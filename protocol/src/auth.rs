use serde::{Deserialize, Serialize};

/// Email/password login body. Both fields are optional on the wire so the
/// server can answer a missing field with a validation error instead of a
/// parse failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// Login body for the identifier variant: the first present identifier in
/// the order serial number, email, phone1, phone2 is used.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IdentifierLoginRequest {
    #[serde(default)]
    pub member_serial_number: Option<i64>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone1: Option<String>,
    #[serde(default)]
    pub phone2: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub designation: String,
}

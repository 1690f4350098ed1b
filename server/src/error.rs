use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use protocol::ApiResponse;

use crate::auth::token::AuthTokenError;

pub const UNEXPECTED_ERROR_MESSAGE: &str = "An unexpected error occurred.";

#[derive(Debug, thiserror::Error)]
pub enum CanteenError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Reference(String),

    #[error("{0}")]
    NotFound(String),

    /// Deliberately the same text whether the identifier or the password was wrong.
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token has expired")]
    TokenExpired,

    #[error("Authentication required")]
    Unauthorized,

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("Database error: {0}")]
    Database(#[from] mongodb::error::Error),

    #[error("Password hashing error: {0}")]
    PasswordHash(#[from] bcrypt::BcryptError),

    #[error("Document encoding error: {0}")]
    BsonSerialize(#[from] mongodb::bson::ser::Error),

    #[error("Document decoding error: {0}")]
    BsonDeserialize(#[from] mongodb::bson::de::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal server error")]
    Internal(String),
}

impl CanteenError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    pub fn reference(message: impl Into<String>) -> Self {
        Self::Reference(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Whether the error is a recognised domain failure whose text may be
    /// shown to the caller.
    pub fn is_domain(&self) -> bool {
        matches!(
            self,
            CanteenError::Validation(_)
                | CanteenError::Conflict(_)
                | CanteenError::Reference(_)
                | CanteenError::NotFound(_)
                | CanteenError::InvalidCredentials
                | CanteenError::InvalidToken
                | CanteenError::TokenExpired
                | CanteenError::Unauthorized
                | CanteenError::RateLimitExceeded
        )
    }
}

impl From<AuthTokenError> for CanteenError {
    fn from(err: AuthTokenError) -> Self {
        match err {
            AuthTokenError::Expired => CanteenError::TokenExpired,
            AuthTokenError::SecretTooShort => CanteenError::Config(err.to_string()),
            _ => CanteenError::InvalidToken,
        }
    }
}

impl ResponseError for CanteenError {
    fn status_code(&self) -> StatusCode {
        match self {
            CanteenError::Validation(_) => StatusCode::BAD_REQUEST,
            CanteenError::Conflict(_) => StatusCode::CONFLICT,
            CanteenError::Reference(_) => StatusCode::UNPROCESSABLE_ENTITY,
            CanteenError::NotFound(_) => StatusCode::NOT_FOUND,
            CanteenError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            CanteenError::InvalidToken => StatusCode::UNAUTHORIZED,
            CanteenError::TokenExpired => StatusCode::UNAUTHORIZED,
            CanteenError::Unauthorized => StatusCode::UNAUTHORIZED,
            CanteenError::RateLimitExceeded => StatusCode::TOO_MANY_REQUESTS,
            CanteenError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            CanteenError::PasswordHash(_) => StatusCode::INTERNAL_SERVER_ERROR,
            CanteenError::BsonSerialize(_) => StatusCode::INTERNAL_SERVER_ERROR,
            CanteenError::BsonDeserialize(_) => StatusCode::INTERNAL_SERVER_ERROR,
            CanteenError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            CanteenError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let message = if self.is_domain() {
            self.to_string()
        } else {
            log::error!("Request failed: {}", self);
            UNEXPECTED_ERROR_MESSAGE.to_string()
        };

        HttpResponse::build(status).json(ApiResponse::<()>::error(status.as_u16(), message))
    }
}

pub type Result<T> = std::result::Result<T, CanteenError>;

use serde::{Deserialize, Serialize};

/// Outcome marker carried by every API response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResponseStatus {
    Ok,
    Error,
}

/// Uniform body wrapping every response the API produces.
///
/// `data` is `null` on errors, except for request-validation failures where it
/// carries the parser's error list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub status: ResponseStatus,
    pub status_code: u16,
    pub message: String,
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn ok(status_code: u16, message: impl Into<String>, data: T) -> Self {
        Self {
            status: ResponseStatus::Ok,
            status_code,
            message: message.into(),
            data: Some(data),
        }
    }

    pub fn error(status_code: u16, message: impl Into<String>) -> Self {
        Self {
            status: ResponseStatus::Error,
            status_code,
            message: message.into(),
            data: None,
        }
    }

    pub fn error_with(status_code: u16, message: impl Into<String>, data: T) -> Self {
        Self {
            status: ResponseStatus::Error,
            status_code,
            message: message.into(),
            data: Some(data),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == ResponseStatus::Ok
    }
}

//! Wire types shared between the canteen API server and its clients.

pub mod auth;
pub mod envelope;
pub mod paging;

pub use auth::{IdentifierLoginRequest, LoginRequest, TokenResponse};
pub use envelope::{ApiResponse, ResponseStatus};
pub use paging::{
    Page, PageMeta, DEFAULT_LIMIT, DEFAULT_PAGE, DEFAULT_SORT_BY, DEFAULT_SORT_ORDER,
    RESERVED_LIST_KEYS,
};

/// Returns the protocol crate version string.
pub fn protocol_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

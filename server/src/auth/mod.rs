pub mod password;
pub mod service;
pub mod token;

pub use password::PasswordHasher;
pub use service::{bearer_token, AuthService};
pub use token::{AuthTokenError, AuthTokenService, SessionClaims};

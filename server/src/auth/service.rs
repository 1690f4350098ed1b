use protocol::{IdentifierLoginRequest, LoginRequest, TokenResponse};

use super::password::PasswordHasher;
use super::token::{now_secs, AuthTokenService, SessionClaims};
use crate::db::models::{parse_object_id, timestamp_now, NewUser, User, UserProfile};
use crate::db::UserRepository;
use crate::error::{CanteenError, Result};

pub const INVALID_HEADER_MESSAGE: &str = "Invalid authorization header format";

const BEARER_PREFIX: &str = "Bearer ";

/// Registration, login and session resolution over the user collection.
#[derive(Clone)]
pub struct AuthService {
    users: UserRepository,
    hasher: PasswordHasher,
    tokens: AuthTokenService,
}

impl AuthService {
    pub fn new(users: UserRepository, hasher: PasswordHasher, tokens: AuthTokenService) -> Self {
        Self {
            users,
            hasher,
            tokens,
        }
    }

    pub fn tokens(&self) -> &AuthTokenService {
        &self.tokens
    }

    pub async fn register(&self, request: NewUser) -> Result<TokenResponse> {
        let user = request.validate()?;
        self.users.ensure_email_available(&user.email).await?;

        let password_hash = self.hasher.hash(&user.password)?;
        let record = user.into_record(password_hash, timestamp_now());
        let id = self.users.create(record.clone()).await?;

        self.issue_for(&User {
            id: Some(id),
            ..record
        })
    }

    pub async fn login(&self, request: LoginRequest) -> Result<TokenResponse> {
        let (Some(email), Some(password)) = (non_empty(request.email), non_empty(request.password))
        else {
            return Err(CanteenError::validation("Email and password are required"));
        };

        let user = self.users.find_by_field("email", email.as_str()).await?;
        self.authenticate(user, &password, &email)
    }

    /// Logs in by the first identifier present, in the order serial number,
    /// email, phone1, phone2.
    pub async fn login_with_identifier(
        &self,
        request: IdentifierLoginRequest,
    ) -> Result<TokenResponse> {
        let password = non_empty(request.password)
            .ok_or_else(|| CanteenError::validation("Password is required"))?;

        let user = if let Some(serial) = request.member_serial_number {
            self.users
                .find_by_field("member_serial_number", serial)
                .await?
        } else if let Some(email) = non_empty(request.email) {
            self.users.find_by_field("email", email).await?
        } else if let Some(phone1) = non_empty(request.phone1) {
            self.users.find_by_field("phone1", phone1).await?
        } else if let Some(phone2) = non_empty(request.phone2) {
            self.users.find_by_field("phone2", phone2).await?
        } else {
            return Err(CanteenError::validation(
                "One of member_serial_number, email, phone1 or phone2 is required",
            ));
        };

        self.authenticate(user, &password, "identifier login")
    }

    pub fn verify_token(&self, token: &str) -> Result<SessionClaims> {
        Ok(self.tokens.verify(token, now_secs())?)
    }

    pub async fn resolve_session(&self, token: &str) -> Result<UserProfile> {
        let claims = self.verify_token(token)?;
        self.current_user(&claims).await
    }

    /// Loads the user a verified token was issued to, without the password hash.
    pub async fn current_user(&self, claims: &SessionClaims) -> Result<UserProfile> {
        let id = parse_object_id(&claims.sub).map_err(|_| CanteenError::InvalidToken)?;
        self.users
            .find_by_id(id)
            .await?
            .map(UserProfile::from)
            .ok_or_else(|| CanteenError::not_found("User not found"))
    }

    fn authenticate(
        &self,
        user: Option<User>,
        password: &str,
        attempted: &str,
    ) -> Result<TokenResponse> {
        let verified = match &user {
            Some(user) => self.hasher.verify(password, &user.password),
            None => self.hasher.verify_absent(password),
        };

        match user {
            Some(user) if verified => {
                log::info!("Successful login for user: {}", user.email);
                self.issue_for(&user)
            }
            _ => {
                log::warn!("Failed login attempt ({})", attempted);
                Err(CanteenError::InvalidCredentials)
            }
        }
    }

    fn issue_for(&self, user: &User) -> Result<TokenResponse> {
        let subject = user
            .id
            .map(|id| id.to_hex())
            .ok_or_else(|| CanteenError::Internal("user has no id".to_string()))?;

        let access_token = self.tokens.issue_session_token(
            subject,
            user.email.clone(),
            user.designation.clone(),
            now_secs(),
        )?;

        Ok(TokenResponse {
            access_token,
            designation: user.designation.clone(),
        })
    }
}

/// Extracts the token from an `Authorization: Bearer <token>` header value.
pub fn bearer_token(header: &str) -> Result<&str> {
    match header.strip_prefix(BEARER_PREFIX) {
        Some(token) if !token.is_empty() && !token.contains(' ') => Ok(token),
        _ => Err(CanteenError::validation(INVALID_HEADER_MESSAGE)),
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

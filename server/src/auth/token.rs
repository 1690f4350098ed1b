use std::sync::Arc;
use std::time::Duration;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

pub const MIN_SECRET_LEN: usize = 32;
pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(24 * 60 * 60);

const TOKEN_ALGORITHM: &str = "HS256";
const TOKEN_TYPE: &str = "JWT";

#[derive(Debug, thiserror::Error)]
pub enum AuthTokenError {
    #[error("auth token secret is too short (min {MIN_SECRET_LEN} bytes)")]
    SecretTooShort,

    #[error("invalid auth token format")]
    InvalidFormat,

    #[error("auth token signature is invalid")]
    InvalidSignature,

    #[error("auth token is expired")]
    Expired,

    #[error("failed to decode auth token payload")]
    PayloadDecode,

    #[error("failed to parse auth token payload")]
    PayloadParse,
}

#[derive(Debug, Serialize, Deserialize)]
struct TokenHeader {
    alg: String,
    typ: String,
}

/// Identity facts embedded in a session token. Timestamps are unix seconds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionClaims {
    /// Hex id of the user the token was issued to.
    pub sub: String,
    pub email: String,
    pub designation: String,
    pub iat: i64,
    pub exp: i64,
}

impl SessionClaims {
    pub fn is_expired(&self, reference_secs: i64) -> bool {
        reference_secs >= self.exp
    }
}

/// Issues and verifies compact `header.payload.signature` tokens signed with
/// HMAC-SHA256 over a single process-wide secret.
#[derive(Clone)]
pub struct AuthTokenService {
    secret: Arc<[u8]>,
    ttl: Duration,
}

impl AuthTokenService {
    pub fn new(secret: Vec<u8>, ttl: Duration) -> Result<Self, AuthTokenError> {
        if secret.len() < MIN_SECRET_LEN {
            return Err(AuthTokenError::SecretTooShort);
        }

        Ok(Self {
            secret: Arc::<[u8]>::from(secret),
            ttl,
        })
    }

    pub fn issue_session_token(
        &self,
        subject_id: String,
        email: String,
        designation: String,
        issued_at_secs: i64,
    ) -> Result<String, AuthTokenError> {
        let ttl_secs = i64::try_from(self.ttl.as_secs()).unwrap_or(i64::MAX);
        let claims = SessionClaims {
            sub: subject_id,
            email,
            designation,
            iat: issued_at_secs,
            exp: issued_at_secs.saturating_add(ttl_secs),
        };
        self.issue(&claims)
    }

    pub fn issue(&self, claims: &SessionClaims) -> Result<String, AuthTokenError> {
        let header = TokenHeader {
            alg: TOKEN_ALGORITHM.to_string(),
            typ: TOKEN_TYPE.to_string(),
        };
        let header_json = serde_json::to_vec(&header).map_err(|_| AuthTokenError::PayloadParse)?;
        let payload_json = serde_json::to_vec(claims).map_err(|_| AuthTokenError::PayloadParse)?;

        let signing_input = format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(header_json),
            URL_SAFE_NO_PAD.encode(payload_json)
        );
        let signature = self.sign(signing_input.as_bytes())?;
        Ok(format!(
            "{signing_input}.{}",
            URL_SAFE_NO_PAD.encode(signature)
        ))
    }

    /// Checks the signature first, then the header, then expiry against
    /// `reference_secs`.
    pub fn verify(
        &self,
        token: &str,
        reference_secs: i64,
    ) -> Result<SessionClaims, AuthTokenError> {
        let (signing_input, signature_b64) = token
            .rsplit_once('.')
            .ok_or(AuthTokenError::InvalidFormat)?;
        let (header_b64, payload_b64) = signing_input
            .split_once('.')
            .ok_or(AuthTokenError::InvalidFormat)?;
        if payload_b64.contains('.') {
            return Err(AuthTokenError::InvalidFormat);
        }

        let signature = URL_SAFE_NO_PAD
            .decode(signature_b64)
            .map_err(|_| AuthTokenError::InvalidFormat)?;

        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .map_err(|_| AuthTokenError::InvalidSignature)?;
        mac.update(signing_input.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| AuthTokenError::InvalidSignature)?;

        let header_bytes = URL_SAFE_NO_PAD
            .decode(header_b64)
            .map_err(|_| AuthTokenError::InvalidFormat)?;
        let header: TokenHeader =
            serde_json::from_slice(&header_bytes).map_err(|_| AuthTokenError::InvalidFormat)?;
        if header.alg != TOKEN_ALGORITHM {
            return Err(AuthTokenError::InvalidFormat);
        }

        let payload = URL_SAFE_NO_PAD
            .decode(payload_b64)
            .map_err(|_| AuthTokenError::PayloadDecode)?;

        let claims: SessionClaims =
            serde_json::from_slice(&payload).map_err(|_| AuthTokenError::PayloadParse)?;

        if claims.sub.is_empty() {
            return Err(AuthTokenError::PayloadParse);
        }
        if claims.is_expired(reference_secs) {
            return Err(AuthTokenError::Expired);
        }

        Ok(claims)
    }

    fn sign(&self, bytes: &[u8]) -> Result<Vec<u8>, AuthTokenError> {
        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .map_err(|_| AuthTokenError::InvalidSignature)?;
        mac.update(bytes);
        Ok(mac.finalize().into_bytes().to_vec())
    }
}

pub fn now_secs() -> i64 {
    chrono::Utc::now().timestamp()
}

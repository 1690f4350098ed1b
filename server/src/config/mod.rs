use std::fmt;
use std::time::Duration;

use actix_cors::Cors;
use actix_web::http::Uri;
use config::{Config, ConfigBuilder, Environment, File, FileFormat};
use serde::Deserialize;

use crate::auth::{AuthTokenService, PasswordHasher};
use crate::error::{CanteenError, Result};
use crate::middleware::RateLimiter;

pub const DEFAULT_CONFIG_PATH: &str = "server/config/canteen.toml";
pub const DEFAULT_CORS_ORIGIN: &str = "http://localhost:3000";

const CORS_MAX_AGE_SECS: usize = 3600;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Mongodb,
    Memory,
}

/// Process configuration. Later sources win: built-in defaults, then the
/// optional TOML file, then environment variables.
#[derive(Clone, Deserialize)]
pub struct AppConfig {
    pub server_host: String,
    pub server_port: u16,
    pub store_backend: StoreBackend,
    pub mongodb_uri: String,
    pub database_name: String,
    #[serde(default)]
    pub secret_key: String,
    pub token_ttl_hours: u64,
    pub bcrypt_cost: u32,
    pub login_rate_limit: usize,
    pub login_rate_window_secs: u64,
    /// Browser origins allowed to call the API with credentials. `*` allows any.
    pub cors_origins: Vec<String>,
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("server_host", &self.server_host)
            .field("server_port", &self.server_port)
            .field("store_backend", &self.store_backend)
            .field("mongodb_uri", &self.mongodb_uri)
            .field("database_name", &self.database_name)
            .field("secret_key", &"<redacted>")
            .field("token_ttl_hours", &self.token_ttl_hours)
            .field("bcrypt_cost", &self.bcrypt_cost)
            .field("login_rate_limit", &self.login_rate_limit)
            .field("login_rate_window_secs", &self.login_rate_window_secs)
            .field("cors_origins", &self.cors_origins)
            .finish()
    }
}

fn with_defaults() -> Result<ConfigBuilder<config::builder::DefaultState>> {
    Config::builder()
        .set_default("server_host", "0.0.0.0")
        .and_then(|b| b.set_default("server_port", 8080))
        .and_then(|b| b.set_default("store_backend", "mongodb"))
        .and_then(|b| b.set_default("mongodb_uri", "mongodb://localhost:27017"))
        .and_then(|b| b.set_default("database_name", "canteen"))
        .and_then(|b| b.set_default("token_ttl_hours", 24))
        .and_then(|b| b.set_default("bcrypt_cost", i64::from(bcrypt::DEFAULT_COST)))
        .and_then(|b| b.set_default("login_rate_limit", 10))
        .and_then(|b| b.set_default("login_rate_window_secs", 60))
        .and_then(|b| b.set_default("cors_origins", vec![DEFAULT_CORS_ORIGIN]))
        .map_err(config_error)
}

fn config_error(err: config::ConfigError) -> CanteenError {
    CanteenError::Config(err.to_string())
}

impl AppConfig {
    /// Loads from `CONFIG_PATH` (default `server/config/canteen.toml`, optional)
    /// and the environment.
    pub fn load() -> Result<Self> {
        let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load_from(Some(&path))
    }

    pub fn load_from(path: Option<&str>) -> Result<Self> {
        let mut builder = with_defaults()?;
        if let Some(path) = path {
            builder = builder.add_source(File::with_name(path).required(false));
        }

        let config: Self = builder
            .add_source(
                Environment::default()
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("cors_origins"),
            )
            .build()
            .and_then(|config| config.try_deserialize())
            .map_err(config_error)?;
        config.validated()
    }

    /// Parses a TOML document over the defaults, ignoring the environment.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = with_defaults()?
            .add_source(File::from_str(content, FileFormat::Toml))
            .build()
            .and_then(|config| config.try_deserialize())
            .map_err(config_error)?;
        config.validated()
    }

    fn validated(self) -> Result<Self> {
        for origin in &self.cors_origins {
            if origin != "*" && !is_origin(origin) {
                return Err(CanteenError::Config(format!(
                    "Invalid CORS origin: {origin}"
                )));
            }
        }
        Ok(self)
    }

    pub fn bind_address(&self) -> (String, u16) {
        (self.server_host.clone(), self.server_port)
    }

    pub fn token_ttl(&self) -> Duration {
        Duration::from_secs(self.token_ttl_hours.saturating_mul(60 * 60))
    }

    /// Fails when `SECRET_KEY` is unset or shorter than the minimum length.
    pub fn token_service(&self) -> Result<AuthTokenService> {
        if self.secret_key.is_empty() {
            return Err(CanteenError::Config(
                "SECRET_KEY is not set in the environment variables.".to_string(),
            ));
        }
        Ok(AuthTokenService::new(
            self.secret_key.as_bytes().to_vec(),
            self.token_ttl(),
        )?)
    }

    pub fn password_hasher(&self) -> PasswordHasher {
        PasswordHasher::new(self.bcrypt_cost)
    }

    /// CORS policy for the configured origins: any method, any header and
    /// credentials.
    pub fn cors(&self) -> Cors {
        let base = Cors::default()
            .allow_any_method()
            .allow_any_header()
            .supports_credentials()
            .max_age(CORS_MAX_AGE_SECS);

        self.cors_origins.iter().fold(base, |cors, origin| {
            if origin == "*" {
                cors.allow_any_origin()
            } else {
                cors.allowed_origin(origin)
            }
        })
    }

    pub fn login_rate_limiter(&self) -> RateLimiter {
        RateLimiter::with_limit(
            self.login_rate_limit,
            Duration::from_secs(self.login_rate_window_secs),
        )
    }
}

fn is_origin(value: &str) -> bool {
    value
        .parse::<Uri>()
        .map(|uri| uri.scheme().is_some() && uri.authority().is_some() && uri.path() == "/")
        .unwrap_or(false)
}

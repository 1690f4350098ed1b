use std::sync::Arc;

use actix_web::{middleware as actix_middleware, web, App, HttpServer};
use anyhow::Context;

use server::auth::AuthService;
use server::config::{AppConfig, StoreBackend};
use server::db::{DbContext, DocumentStore, MemoryStore, MongoStore};
use server::handlers;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if it exists (for development)
    // Try loading from current directory first, then from server/ directory
    if dotenvy::dotenv().is_err() {
        dotenvy::from_filename("server/.env").ok();
    }

    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    log::info!("Starting canteen server...");
    log::info!("Protocol version: {}", protocol::protocol_version());

    let config = AppConfig::load().context("failed to load configuration")?;
    log::debug!("Configuration: {:?}", config);

    let token_service = config
        .token_service()
        .context("SECRET_KEY must be set to at least 32 bytes")?;
    log::info!("Session tokens expire after {} hours", config.token_ttl_hours);

    let store: Arc<dyn DocumentStore> = match config.store_backend {
        StoreBackend::Mongodb => {
            log::info!("Connecting to MongoDB at {}...", config.mongodb_uri);
            let store = MongoStore::connect(&config.mongodb_uri, &config.database_name)
                .await
                .context("failed to connect to MongoDB")?;
            Arc::new(store)
        }
        StoreBackend::Memory => {
            log::warn!("Using the in-memory store; data is lost on shutdown");
            Arc::new(MemoryStore::new())
        }
    };

    let db = DbContext::new(store);
    log::info!("Initializing database indexes...");
    db.init_indexes()
        .await
        .context("failed to initialize database indexes")?;

    let auth = AuthService::new(db.users(), config.password_hasher(), token_service);
    let login_limiter = config.login_rate_limiter();

    let (host, port) = config.bind_address();
    log::info!("Starting HTTP server at {}:{}...", host, port);

    log::info!("Allowing CORS origins: {:?}", config.cors_origins);

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(db.clone()))
            .app_data(web::Data::new(auth.clone()))
            .app_data(web::Data::new(login_limiter.clone()))
            .wrap(actix_middleware::Logger::default())
            .wrap(actix_middleware::Compress::default())
            .wrap(config.cors())
            .configure(handlers::configure)
    })
    .bind((host, port))?
    .run()
    .await?;

    Ok(())
}

use actix_web::{get, web, HttpResponse};
use protocol::ApiResponse;
use serde::Serialize;

use crate::{db::DbContext, error::Result};

#[derive(Debug, Serialize)]
pub struct HealthCheckResponse {
    pub status: String,
    pub store_backend: String,
    pub protocol_version: String,
}

#[get("/health")]
pub async fn health_check(db: web::Data<DbContext>) -> Result<HttpResponse> {
    let response = HealthCheckResponse {
        status: "healthy".to_string(),
        store_backend: db.backend().to_string(),
        protocol_version: protocol::protocol_version().to_string(),
    };

    Ok(HttpResponse::Ok().json(ApiResponse::ok(200, "Service is healthy", response)))
}

pub mod feedback;
pub mod health;
pub mod meals;
pub mod raw_items;
pub mod users;

use actix_web::{
    error::{InternalError, JsonPayloadError, QueryPayloadError},
    middleware::from_fn,
    web, HttpRequest, HttpResponse,
};
use protocol::ApiResponse;
use serde_json::json;

use crate::middleware::{auth_middleware, rate_limit_middleware};

pub use feedback::{create_feedback, list_feedback};
pub use health::health_check;
pub use meals::{create_meal, list_meals};
pub use raw_items::{create_raw_item, list_raw_items, update_raw_item};
pub use users::{current_user, list_users, login, login_with_identifier, register};

pub const VALIDATION_ERROR_MESSAGE: &str = "Validation error";

fn validation_failure(detail: String) -> HttpResponse {
    HttpResponse::UnprocessableEntity().json(ApiResponse::error_with(
        422,
        VALIDATION_ERROR_MESSAGE,
        json!({ "errors": [detail] }),
    ))
}

fn json_error(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    let response = validation_failure(err.to_string());
    InternalError::from_response(err, response).into()
}

fn query_error(err: QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
    let response = validation_failure(err.to_string());
    InternalError::from_response(err, response).into()
}

/// Body and query extractors that answer malformed input with the 422
/// validation envelope.
pub fn extractor_configs(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(json_error))
        .app_data(web::QueryConfig::default().error_handler(query_error));
}

/// Registers every route. Expects `DbContext`, `AuthService` and
/// `RateLimiter` as app data.
pub fn configure(cfg: &mut web::ServiceConfig) {
    extractor_configs(cfg);

    cfg.service(health_check)
        .service(create_raw_item)
        .service(list_raw_items)
        .service(update_raw_item)
        .service(create_meal)
        .service(list_meals)
        .service(create_feedback)
        .service(list_feedback)
        .service(register)
        .service(list_users)
        .service(
            web::scope("/login")
                .wrap(from_fn(rate_limit_middleware))
                .service(login)
                .service(login_with_identifier),
        )
        .service(
            web::scope("/me")
                .wrap(from_fn(auth_middleware))
                .service(current_user),
        );
}

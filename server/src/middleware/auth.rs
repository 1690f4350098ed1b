use actix_web::{
    body::MessageBody,
    dev::{ServiceRequest, ServiceResponse},
    http::header::AUTHORIZATION,
    middleware::Next,
    web, HttpMessage, ResponseError,
};

use crate::auth::service::INVALID_HEADER_MESSAGE;
use crate::auth::{bearer_token, AuthService, SessionClaims};
use crate::error::CanteenError;

/// Verifies `Authorization: Bearer <token>` and stores the token's
/// [`SessionClaims`] in the request extensions.
pub async fn auth_middleware(
    req: ServiceRequest,
    next: Next<impl MessageBody + 'static>,
) -> Result<ServiceResponse<impl MessageBody>, actix_web::Error> {
    let claims = match authorize(&req) {
        Ok(claims) => claims,
        Err(err) => return Ok(req.into_response(err.error_response()).map_into_right_body()),
    };
    req.extensions_mut().insert(claims);

    next.call(req).await.map(ServiceResponse::map_into_left_body)
}

fn authorize(req: &ServiceRequest) -> Result<SessionClaims, CanteenError> {
    let header = req
        .headers()
        .get(AUTHORIZATION)
        .ok_or(CanteenError::Unauthorized)?
        .to_str()
        .map_err(|_| CanteenError::validation(INVALID_HEADER_MESSAGE))?;
    let token = bearer_token(header)?;

    let auth = req
        .app_data::<web::Data<AuthService>>()
        .ok_or_else(|| CanteenError::Internal("Auth service not available".to_string()))?;

    auth.verify_token(token)
}

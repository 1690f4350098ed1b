use std::collections::HashMap;

use actix_web::{get, post, web, HttpResponse};
use protocol::{ApiResponse, IdentifierLoginRequest, LoginRequest};

use crate::{
    auth::{AuthService, SessionClaims},
    db::{models::NewUser, DbContext},
    error::Result,
    query::ListParams,
};

#[post("/new/user")]
pub async fn register(
    body: web::Json<NewUser>,
    auth: web::Data<AuthService>,
) -> Result<HttpResponse> {
    let tokens = auth.register(body.into_inner()).await?;

    Ok(HttpResponse::Created().json(ApiResponse::ok(
        201,
        "User created successfully",
        tokens,
    )))
}

#[get("/users")]
pub async fn list_users(
    query: web::Query<HashMap<String, String>>,
    db: web::Data<DbContext>,
) -> Result<HttpResponse> {
    let params = ListParams::from_query(query.into_inner())?;
    let page = db.users().fetch(&params).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok(200, "Users fetched successfully", page)))
}

// Mounted under the rate-limited `/login` scope.
#[post("")]
pub async fn login(
    body: web::Json<LoginRequest>,
    auth: web::Data<AuthService>,
) -> Result<HttpResponse> {
    let tokens = auth.login(body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(200, "Login successful", tokens)))
}

#[post("/identifier")]
pub async fn login_with_identifier(
    body: web::Json<IdentifierLoginRequest>,
    auth: web::Data<AuthService>,
) -> Result<HttpResponse> {
    let tokens = auth.login_with_identifier(body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(200, "Login successful", tokens)))
}

// Mounted under the `/me` scope behind the bearer-token middleware.
#[get("")]
pub async fn current_user(
    claims: web::ReqData<SessionClaims>,
    auth: web::Data<AuthService>,
) -> Result<HttpResponse> {
    let profile = auth.current_user(&claims.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(200, "User fetched successfully", profile)))
}

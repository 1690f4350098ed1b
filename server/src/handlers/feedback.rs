use std::collections::HashMap;

use actix_web::{get, post, web, HttpResponse};
use protocol::ApiResponse;

use crate::{
    db::{models::Feedback, DbContext},
    error::Result,
    query::ListParams,
};

#[post("/new/feedback")]
pub async fn create_feedback(
    body: web::Json<Feedback>,
    db: web::Data<DbContext>,
) -> Result<HttpResponse> {
    let summary = db.feedback().create(body.into_inner()).await?;

    Ok(HttpResponse::Created().json(ApiResponse::ok(
        201,
        "Feedback created successfully",
        summary,
    )))
}

#[get("/feedback")]
pub async fn list_feedback(
    query: web::Query<HashMap<String, String>>,
    db: web::Data<DbContext>,
) -> Result<HttpResponse> {
    let params = ListParams::from_query(query.into_inner())?;
    let page = db.feedback().fetch(&params).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok(
        200,
        "Feedback fetched successfully",
        page,
    )))
}

use std::collections::HashMap;

use actix_web::{get, patch, post, web, HttpResponse};
use protocol::ApiResponse;

use crate::{
    db::{
        models::{NewRawItem, RawItemPatch},
        DbContext,
    },
    error::Result,
    query::ListParams,
};

#[post("/new/raw-item")]
pub async fn create_raw_item(
    body: web::Json<NewRawItem>,
    db: web::Data<DbContext>,
) -> Result<HttpResponse> {
    let summary = db.raw_items().create(body.into_inner()).await?;

    Ok(HttpResponse::Created().json(ApiResponse::ok(
        201,
        "Raw item created successfully",
        summary,
    )))
}

#[get("/raw-items")]
pub async fn list_raw_items(
    query: web::Query<HashMap<String, String>>,
    db: web::Data<DbContext>,
) -> Result<HttpResponse> {
    let params = ListParams::from_query(query.into_inner())?;
    let page = db.raw_items().fetch(&params).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok(
        200,
        "Raw items fetched successfully",
        page,
    )))
}

#[patch("/raw-item/{id}")]
pub async fn update_raw_item(
    path: web::Path<String>,
    body: web::Json<RawItemPatch>,
    db: web::Data<DbContext>,
) -> Result<HttpResponse> {
    let summary = db
        .raw_items()
        .update(&path.into_inner(), body.into_inner())
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok(
        200,
        "Raw item updated successfully",
        summary,
    )))
}

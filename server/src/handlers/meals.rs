use std::collections::HashMap;

use actix_web::{get, post, web, HttpResponse};
use protocol::ApiResponse;

use crate::{
    db::{models::NewMeal, DbContext},
    error::Result,
    query::ListParams,
};

#[post("/new/meals")]
pub async fn create_meal(
    body: web::Json<NewMeal>,
    db: web::Data<DbContext>,
) -> Result<HttpResponse> {
    let summary = db.meals().create(body.into_inner()).await?;

    Ok(HttpResponse::Created().json(ApiResponse::ok(
        201,
        "Meal created successfully",
        summary,
    )))
}

#[get("/meals")]
pub async fn list_meals(
    query: web::Query<HashMap<String, String>>,
    db: web::Data<DbContext>,
) -> Result<HttpResponse> {
    let params = ListParams::from_query(query.into_inner())?;
    let page = db.meals().fetch(&params).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok(200, "Meals fetched successfully", page)))
}

use actix_web::{test, web, App};
use server::db::DbContext;
use server::handlers;

#[actix_web::test]
async fn test_health_check() {
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(DbContext::in_memory()))
            .service(handlers::health_check),
    )
    .await;

    let req = test::TestRequest::get().uri("/health").to_request();
    let resp = test::call_service(&app, req).await;

    assert!(resp.status().is_success());

    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "Ok");
    assert_eq!(body["status_code"], 200);
    assert_eq!(body["data"]["status"], "healthy");
    assert_eq!(body["data"]["store_backend"], "memory");
    assert_eq!(body["data"]["protocol_version"], protocol::protocol_version());
}

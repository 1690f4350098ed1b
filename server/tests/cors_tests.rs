use std::time::Duration;

use actix_web::{
    http::{header, Method, StatusCode},
    test, web, App,
};
use server::auth::{AuthService, AuthTokenService, PasswordHasher};
use server::config::{AppConfig, DEFAULT_CORS_ORIGIN};
use server::db::DbContext;
use server::handlers;
use server::middleware::RateLimiter;

const SECRET: &[u8] = b"cors-test-secret-cors-test-secret";

macro_rules! app_with {
    ($config:expr) => {{
        let db = DbContext::in_memory();
        let tokens = AuthTokenService::new(SECRET.to_vec(), Duration::from_secs(3600))
            .expect("token service");
        let auth = AuthService::new(db.users(), PasswordHasher::new(4), tokens);
        test::init_service(
            App::new()
                .app_data(web::Data::new(db))
                .app_data(web::Data::new(auth))
                .app_data(web::Data::new(RateLimiter::new()))
                .wrap($config.cors())
                .configure(handlers::configure),
        )
        .await
    }};
}

#[actix_web::test]
async fn test_allowed_origin_is_echoed_with_credentials() {
    let config = AppConfig::from_toml_str("").expect("config");
    let app = app_with!(config);

    let req = test::TestRequest::get()
        .uri("/raw-items")
        .insert_header((header::ORIGIN, DEFAULT_CORS_ORIGIN))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    let headers = resp.headers();
    assert_eq!(
        headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        DEFAULT_CORS_ORIGIN
    );
    assert_eq!(
        headers.get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS).unwrap(),
        "true"
    );
}

#[actix_web::test]
async fn test_preflight_allows_any_method_and_header() {
    let config = AppConfig::from_toml_str("").expect("config");
    let app = app_with!(config);

    let req = test::TestRequest::default()
        .method(Method::OPTIONS)
        .uri("/raw-item/65a1b2c3d4e5f60718293a4b")
        .insert_header((header::ORIGIN, DEFAULT_CORS_ORIGIN))
        .insert_header((header::ACCESS_CONTROL_REQUEST_METHOD, "PATCH"))
        .insert_header((header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type, authorization"))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    let headers = resp.headers();
    assert_eq!(
        headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        DEFAULT_CORS_ORIGIN
    );
    let methods = headers
        .get(header::ACCESS_CONTROL_ALLOW_METHODS)
        .unwrap()
        .to_str()
        .unwrap();
    assert!(methods.contains("PATCH"));
}

#[actix_web::test]
async fn test_other_origins_get_no_allow_header() {
    let config = AppConfig::from_toml_str("").expect("config");
    let app = app_with!(config);

    let req = test::TestRequest::get()
        .uri("/health")
        .insert_header((header::ORIGIN, "http://evil.test"))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert!(resp
        .headers()
        .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
        .is_none());
}

#[actix_web::test]
async fn test_configured_origin_replaces_default() {
    let config = AppConfig::from_toml_str("cors_origins = [\"https://canteen.example\"]")
        .expect("config");
    let app = app_with!(config);

    let req = test::TestRequest::get()
        .uri("/health")
        .insert_header((header::ORIGIN, "https://canteen.example"))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(
        resp.headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .unwrap(),
        "https://canteen.example"
    );
}

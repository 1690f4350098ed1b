use protocol::{
    ApiResponse, IdentifierLoginRequest, LoginRequest, Page, ResponseStatus, TokenResponse,
    RESERVED_LIST_KEYS,
};
use serde_json::{json, Value};

#[test]
fn ok_envelope_shape() {
    let response = ApiResponse::ok(201, "Raw item created successfully", json!({ "title": "Rice" }));
    let value = serde_json::to_value(&response).unwrap();

    assert_eq!(
        value,
        json!({
            "status": "Ok",
            "status_code": 201,
            "message": "Raw item created successfully",
            "data": { "title": "Rice" },
        })
    );
    assert!(response.is_ok());
}

#[test]
fn error_envelope_has_null_data() {
    let response = ApiResponse::<Value>::error(404, "Raw item not found");
    let value = serde_json::to_value(&response).unwrap();

    assert_eq!(value["status"], "Error");
    assert_eq!(value["status_code"], 404);
    assert!(value["data"].is_null());
    assert!(!response.is_ok());
}

#[test]
fn page_nests_meta_and_data() {
    let page = Page::new(2, 5, 11, vec!["a", "b"]);
    let value = serde_json::to_value(&page).unwrap();

    assert_eq!(
        value,
        json!({ "meta": { "page": 2, "limit": 5, "total": 11 }, "data": ["a", "b"] })
    );
}

#[test]
fn page_map_keeps_meta() {
    let page = Page::new(1, 10, 3, vec![1, 2, 3]).map(|n| n * 10);
    assert_eq!(page.meta.total, 3);
    assert_eq!(page.data, vec![10, 20, 30]);
}

#[test]
fn login_fields_are_optional_on_the_wire() {
    let request: LoginRequest = serde_json::from_value(json!({ "email": "a@canteen.test" })).unwrap();
    assert_eq!(request.email.as_deref(), Some("a@canteen.test"));
    assert!(request.password.is_none());

    let request: IdentifierLoginRequest =
        serde_json::from_value(json!({ "member_serial_number": 42, "password": "pw" })).unwrap();
    assert_eq!(request.member_serial_number, Some(42));
    assert!(request.email.is_none());
}

#[test]
fn token_response_field_names() {
    let value = serde_json::to_value(TokenResponse {
        access_token: "a.b.c".to_string(),
        designation: "Chef".to_string(),
    })
    .unwrap();
    assert_eq!(value, json!({ "access_token": "a.b.c", "designation": "Chef" }));
}

#[test]
fn status_round_trips_as_plain_strings() {
    let status: ResponseStatus = serde_json::from_str("\"Error\"").unwrap();
    assert_eq!(status, ResponseStatus::Error);
}

#[test]
fn reserved_keys_cover_list_controls() {
    for key in ["search_term", "page", "limit", "sort_by", "sort_order"] {
        assert!(RESERVED_LIST_KEYS.contains(&key));
    }
}

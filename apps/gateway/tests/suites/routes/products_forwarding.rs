use actix_web::http::StatusCode;
use actix_web::test;
use gateway::auth::Role;
use gateway_test_support::envelope::assert_envelope;
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

use crate::support::tokens::{bearer, token_for};
use crate::support::{create_test_app, Upstreams};

#[actix_web::test]
async fn listing_is_public_and_filters_query() {
    let upstreams = Upstreams::start().await;
    Mock::given(method("GET"))
        .and(path("/api/products"))
        .and(query_param("search", "lamp"))
        .and(query_param("minPrice", "10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"products": []})))
        .expect(1)
        .mount(&upstreams.products)
        .await;

    let app = create_test_app(upstreams.state().await).build().await;
    let req = test::TestRequest::get()
        .uri("/api/products?search=lamp&minPrice=10&category=&debug=1")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let received = upstreams.products.received_requests().await.unwrap();
    let query = received[0].url.query().unwrap_or_default().to_string();
    assert!(!query.contains("debug"), "unexpected query: {query}");
    assert!(!query.contains("category"), "unexpected query: {query}");
    assert!(received[0].headers.get("x-user-id").is_none());
}

#[actix_web::test]
async fn listing_ignores_an_unusable_token() {
    let upstreams = Upstreams::start().await;
    Mock::given(method("GET"))
        .and(path("/api/products"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"products": []})))
        .expect(1)
        .mount(&upstreams.products)
        .await;

    let app = create_test_app(upstreams.state().await).build().await;
    let req = test::TestRequest::get()
        .uri("/api/products")
        .insert_header(bearer("garbage"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let received = upstreams.products.received_requests().await.unwrap();
    assert!(received[0].headers.get("authorization").is_none());
}

#[actix_web::test]
async fn detail_passes_through_upstream_not_found() {
    let upstreams = Upstreams::start().await;
    Mock::given(method("GET"))
        .and(path("/api/products/p-404"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "success": false, "message": "Product not found"
        })))
        .mount(&upstreams.products)
        .await;

    let app = create_test_app(upstreams.state().await).build().await;
    let req = test::TestRequest::get()
        .uri("/api/products/p-404")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "Product not found");
}

#[actix_web::test]
async fn writes_need_admin() {
    let upstreams = Upstreams::start().await;
    let app = create_test_app(upstreams.state().await).build().await;

    let req = test::TestRequest::post()
        .uri("/api/products")
        .insert_header(bearer(&token_for("u-1", Role::User)))
        .set_json(json!({"name": "Lamp", "price": 10}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_envelope(resp, StatusCode::FORBIDDEN, "Access denied").await;

    let req = test::TestRequest::delete().uri("/api/products/p-1").to_request();
    let resp = test::call_service(&app, req).await;
    assert_envelope(resp, StatusCode::UNAUTHORIZED, "No token provided").await;

    let received = upstreams.products.received_requests().await.unwrap_or_default();
    assert!(received.is_empty());
}

#[actix_web::test]
async fn admin_create_forwards_role_and_answers_created() {
    let upstreams = Upstreams::start().await;
    Mock::given(method("POST"))
        .and(path("/api/products"))
        .and(header("x-user-id", "root"))
        .and(header("x-user-role", "admin"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "p-9"})))
        .expect(1)
        .mount(&upstreams.products)
        .await;

    let app = create_test_app(upstreams.state().await).build().await;
    let req = test::TestRequest::post()
        .uri("/api/products")
        .insert_header(bearer(&token_for("root", Role::Admin)))
        .set_json(json!({"name": "Lamp", "price": 10}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
}

#[actix_web::test]
async fn detail_forwards_escaped_ids_once_encoded() {
    let upstreams = Upstreams::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "a+b"})))
        .expect(1)
        .mount(&upstreams.products)
        .await;

    let app = create_test_app(upstreams.state().await).build().await;
    let req = test::TestRequest::get()
        .uri("/api/products/a%2Bb")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let received = upstreams.products.received_requests().await.unwrap();
    assert_eq!(received[0].url.path(), "/api/products/a+b");
}

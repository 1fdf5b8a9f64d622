use actix_web::http::StatusCode;
use actix_web::test;
use gateway::auth::Role;
use gateway_test_support::envelope::assert_envelope;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, ResponseTemplate};

use crate::support::tokens::{bearer, token_for};
use crate::support::{create_test_app, Upstreams};

#[actix_web::test]
async fn orders_require_a_token_and_never_reach_the_service() {
    let upstreams = Upstreams::start().await;
    let app = create_test_app(upstreams.state().await).build().await;

    let req = test::TestRequest::get().uri("/api/orders").to_request();
    let resp = test::call_service(&app, req).await;
    assert_envelope(resp, StatusCode::UNAUTHORIZED, "No token provided").await;

    let received = upstreams.orders.received_requests().await.unwrap_or_default();
    assert!(received.is_empty(), "order service must not be called");
}

#[actix_web::test]
async fn list_forwards_user_id_and_drops_authorization() {
    let upstreams = Upstreams::start().await;
    Mock::given(method("GET"))
        .and(path("/api/orders"))
        .and(header("x-user-id", "u-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"orders": []})))
        .expect(1)
        .mount(&upstreams.orders)
        .await;

    let app = create_test_app(upstreams.state().await).build().await;
    let req = test::TestRequest::get()
        .uri("/api/orders")
        .insert_header(bearer(&token_for("u-1", Role::User)))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let request_id = resp
        .headers()
        .get("x-request-id")
        .expect("x-request-id header")
        .to_str()
        .unwrap()
        .to_string();
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body, json!({"orders": []}));

    let received = upstreams.orders.received_requests().await.unwrap();
    assert_eq!(received.len(), 1);
    let forwarded = &received[0];
    assert!(forwarded.headers.get("authorization").is_none());
    assert_eq!(
        forwarded.headers.get("x-request-id").unwrap().to_str().unwrap(),
        request_id
    );
    assert!(forwarded.headers.get("x-user-email").is_none());
}

#[actix_web::test]
async fn create_forwards_body_and_email_and_answers_created() {
    let upstreams = Upstreams::start().await;
    let order = json!({"items": [{"productId": "p1", "quantity": 2}]});
    Mock::given(method("POST"))
        .and(path("/api/orders"))
        .and(header("x-user-id", "u-2"))
        .and(header("x-user-email", "u-2@example.test"))
        .and(body_json(order.clone()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "o-1"})))
        .expect(1)
        .mount(&upstreams.orders)
        .await;

    let app = create_test_app(upstreams.state().await).build().await;
    let req = test::TestRequest::post()
        .uri("/api/orders")
        .insert_header(bearer(&token_for("u-2", Role::User)))
        .set_json(order)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["id"], "o-1");
}

#[actix_web::test]
async fn cancel_uses_encoded_id() {
    let upstreams = Upstreams::start().await;
    Mock::given(method("PATCH"))
        .and(path("/api/orders/o%201/cancel"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "cancelled"})))
        .expect(1)
        .mount(&upstreams.orders)
        .await;

    let app = create_test_app(upstreams.state().await).build().await;
    let req = test::TestRequest::patch()
        .uri("/api/orders/o%201/cancel")
        .insert_header(bearer(&token_for("u-3", Role::User)))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_web::test]
async fn dot_segment_ids_are_rejected_locally() {
    let upstreams = Upstreams::start().await;
    let app = create_test_app(upstreams.state().await).build().await;

    let req = test::TestRequest::get()
        .uri("/api/orders/..")
        .insert_header(bearer(&token_for("u-4", Role::User)))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_envelope(resp, StatusCode::BAD_REQUEST, "Invalid ID format").await;

    let received = upstreams.orders.received_requests().await.unwrap_or_default();
    assert!(received.is_empty());
}

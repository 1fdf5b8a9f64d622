use std::time::Duration;

use actix_web::http::StatusCode;
use actix_web::test;
use gateway::auth::Role;
use gateway::config::ServiceUrls;
use gateway_test_support::envelope::assert_envelope;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

use crate::support::test_state::state_from;
use crate::support::tokens::{bearer, token_for};
use crate::support::{create_test_app, Upstreams};

#[actix_web::test]
async fn conflict_from_order_service_passes_through() {
    let upstreams = Upstreams::start().await;
    Mock::given(method("PATCH"))
        .and(path("/api/orders/o-1/cancel"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "success": false, "message": "Order already shipped"
        })))
        .mount(&upstreams.orders)
        .await;

    let app = create_test_app(upstreams.state().await).build().await;
    let req = test::TestRequest::patch()
        .uri("/api/orders/o-1/cancel")
        .insert_header(bearer(&token_for("u-1", Role::User)))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_envelope(resp, StatusCode::CONFLICT, "Order already shipped").await;
}

#[actix_web::test]
async fn unreachable_collaborator_is_bad_gateway() {
    let upstreams = Upstreams::start().await;
    let mut config = upstreams.config();
    config.services = ServiceUrls::new(
        upstreams.users.uri(),
        "http://127.0.0.1:1",
        upstreams.orders.uri(),
    );
    let app = create_test_app(state_from(config).await).build().await;

    let req = test::TestRequest::get().uri("/api/products").to_request();
    let resp = test::call_service(&app, req).await;
    assert_envelope(resp, StatusCode::BAD_GATEWAY, "Service unavailable").await;
}

#[actix_web::test]
async fn slow_collaborator_is_bad_gateway() {
    let upstreams = Upstreams::start().await;
    Mock::given(method("GET"))
        .and(path("/api/orders"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"orders": []}))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&upstreams.orders)
        .await;

    let app = create_test_app(upstreams.state().await).build().await;
    let req = test::TestRequest::get()
        .uri("/api/orders")
        .insert_header(bearer(&token_for("u-1", Role::User)))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_envelope(resp, StatusCode::BAD_GATEWAY, "Service unavailable").await;
}

#[actix_web::test]
async fn user_service_outage_during_login_is_bad_gateway() {
    let upstreams = Upstreams::start().await;
    let mut config = upstreams.config();
    config.services = ServiceUrls::new(
        "http://127.0.0.1:1",
        upstreams.products.uri(),
        upstreams.orders.uri(),
    );
    let app = create_test_app(state_from(config).await).build().await;

    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({"email": "a@x.com", "password": "pw"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_envelope(resp, StatusCode::BAD_GATEWAY, "Service unavailable").await;
}

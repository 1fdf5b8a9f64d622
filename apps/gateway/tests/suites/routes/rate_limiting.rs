use std::net::SocketAddr;
use std::time::Duration;

use actix_web::http::{header, StatusCode};
use actix_web::test;
use gateway::rate_limit::{RateClass, RateLimitPolicy};
use gateway_test_support::envelope::assert_envelope;
use gateway_test_support::unique_helpers::unique_client_ip;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

use crate::support::test_state::state_from;
use crate::support::{create_test_app, Upstreams};

fn peer(ip: &str) -> SocketAddr {
    SocketAddr::new(ip.parse().expect("test ip"), 40_000)
}

fn bad_registration(client: SocketAddr) -> actix_http::Request {
    test::TestRequest::post()
        .uri("/api/auth/register")
        .peer_addr(client)
        .set_json(json!({"name": "", "email": "x", "password": ""}))
        .to_request()
}

#[actix_web::test]
async fn twenty_first_auth_attempt_is_rejected() {
    let upstreams = Upstreams::start().await;
    let app = create_test_app(upstreams.state().await).build().await;
    let client = peer(&unique_client_ip());

    for attempt in 1..=20 {
        let resp = test::call_service(&app, bad_registration(client)).await;
        assert_eq!(
            resp.status(),
            StatusCode::BAD_REQUEST,
            "attempt {attempt} should reach validation"
        );
    }

    let resp = test::call_service(&app, bad_registration(client)).await;
    // Five-minute window, 210s in.
    assert_eq!(resp.headers().get(header::RETRY_AFTER).unwrap(), "90");
    assert_envelope(
        resp,
        StatusCode::TOO_MANY_REQUESTS,
        "Too many authentication attempts, please try again later.",
    )
    .await;

    // Another client still has its full budget.
    let resp = test::call_service(&app, bad_registration(peer(&unique_client_ip()))).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn rotating_forwarded_for_does_not_reset_the_budget() {
    let upstreams = Upstreams::start().await;
    let app = create_test_app(upstreams.state().await).build().await;
    let client = peer("10.9.9.9");

    let mut statuses = Vec::new();
    for _ in 0..25 {
        let req = test::TestRequest::post()
            .uri("/api/auth/login")
            .peer_addr(client)
            .insert_header(("X-Forwarded-For", unique_client_ip()))
            .set_json(json!({"email": "x", "password": ""}))
            .to_request();
        statuses.push(test::call_service(&app, req).await.status());
    }

    assert!(statuses[..20].iter().all(|s| *s == StatusCode::BAD_REQUEST));
    assert!(statuses[20..]
        .iter()
        .all(|s| *s == StatusCode::TOO_MANY_REQUESTS));
}

#[actix_web::test]
async fn search_budget_is_tighter_than_api_budget() {
    let upstreams = Upstreams::start().await;
    Mock::given(method("GET"))
        .and(path("/api/products"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"products": []})))
        .expect(2)
        .mount(&upstreams.products)
        .await;

    let mut config = upstreams.config();
    config
        .rate_limits
        .set(RateClass::Search, RateLimitPolicy::new(Duration::from_secs(60), 2));
    let app = create_test_app(state_from(config).await).build().await;

    for remaining in ["1", "0"] {
        let req = test::TestRequest::get().uri("/api/products").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers().get("x-ratelimit-limit").unwrap(), "2");
        assert_eq!(resp.headers().get("x-ratelimit-remaining").unwrap(), remaining);
    }

    let req = test::TestRequest::get().uri("/api/products").to_request();
    let resp = test::call_service(&app, req).await;
    assert_envelope(
        resp,
        StatusCode::TOO_MANY_REQUESTS,
        "Too many search requests, please slow down.",
    )
    .await;
}

#[actix_web::test]
async fn rejected_requests_never_reach_the_collaborator() {
    let upstreams = Upstreams::start().await;
    Mock::given(method("GET"))
        .and(path("/api/products/p-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "p-1"})))
        .expect(1)
        .mount(&upstreams.products)
        .await;

    let mut config = upstreams.config();
    config
        .rate_limits
        .set(RateClass::Api, RateLimitPolicy::new(Duration::from_secs(60), 1));
    let app = create_test_app(state_from(config).await).build().await;

    let req = test::TestRequest::get().uri("/api/products/p-1").to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

    let req = test::TestRequest::get().uri("/api/products/p-1").to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::TOO_MANY_REQUESTS
    );
}

#[actix_web::test]
async fn health_is_not_rate_limited() {
    let upstreams = Upstreams::start().await;
    let mut config = upstreams.config();
    config
        .rate_limits
        .set(RateClass::Api, RateLimitPolicy::new(Duration::from_secs(60), 1));
    let app = create_test_app(state_from(config).await).build().await;

    for _ in 0..5 {
        let req = test::TestRequest::get().uri("/health").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(resp.headers().get("x-ratelimit-limit").is_none());
    }
}

use actix_web::http::StatusCode;
use actix_web::test;

use crate::support::{create_test_app, Upstreams};

#[actix_web::test]
async fn health_reports_service_and_timestamp() {
    let upstreams = Upstreams::start().await;
    let app = create_test_app(upstreams.state().await).build().await;

    let req = test::TestRequest::get().uri("/health").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "api-gateway");
    let timestamp = body["timestamp"].as_str().expect("timestamp string");
    assert!(
        time::OffsetDateTime::parse(timestamp, &time::format_description::well_known::Rfc3339)
            .is_ok(),
        "timestamp should be RFC 3339: {timestamp}"
    );
}

#[actix_web::test]
async fn health_needs_no_token_and_touches_no_collaborator() {
    let upstreams = Upstreams::start().await;
    let app = create_test_app(upstreams.state().await).build().await;

    let req = test::TestRequest::get()
        .uri("/health")
        .insert_header(("Authorization", "Bearer not-a-token"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    for server in [&upstreams.users, &upstreams.products, &upstreams.orders] {
        let received = server.received_requests().await.unwrap_or_default();
        assert!(received.is_empty());
    }
}

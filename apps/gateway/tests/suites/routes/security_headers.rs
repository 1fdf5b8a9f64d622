use actix_web::http::StatusCode;
use actix_web::test;

use crate::support::{create_test_app, Upstreams};

#[actix_web::test]
async fn success_and_error_responses_carry_security_headers() {
    let upstreams = Upstreams::start().await;
    let app = create_test_app(upstreams.state().await).build().await;

    for uri in ["/health", "/api/nowhere"] {
        let req = test::TestRequest::get().uri(uri).to_request();
        let resp = test::call_service(&app, req).await;
        let headers = resp.headers();
        assert_eq!(headers.get("x-content-type-options").unwrap(), "nosniff");
        assert_eq!(headers.get("cache-control").unwrap(), "no-store");
        assert!(headers.get("x-frame-options").is_some());
    }
}

#[actix_web::test]
async fn preflight_from_allowed_origin_succeeds() {
    let upstreams = Upstreams::start().await;
    let mut config = upstreams.config();
    config.cors_origins = vec!["https://shop.example".to_string()];
    let app = create_test_app(crate::support::test_state::state_from(config).await)
        .build()
        .await;

    let req = test::TestRequest::default()
        .method(actix_web::http::Method::OPTIONS)
        .uri("/api/orders")
        .insert_header(("Origin", "https://shop.example"))
        .insert_header(("Access-Control-Request-Method", "POST"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers().get("access-control-allow-origin").unwrap(),
        "https://shop.example"
    );
}

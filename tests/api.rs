mod common;

use actix_web::{
    http::{header, StatusCode},
    test,
};
use pretty_assertions::assert_eq;
use serde_json::json;

use common::{register, send, spawn_app, spawn_app_with, test_config};

#[actix_rt::test]
async fn test_health_needs_no_token() {
    let app = spawn_app().await;
    let (status, body) = send(&app, test::TestRequest::get().uri("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({ "ok": true, "name": "devbase-api", "env": "development" })
    );
}

#[actix_rt::test]
async fn test_health_reports_configured_env() {
    let app = spawn_app_with(test_config(&[("APP_ENV", "production")])).await;
    let (_, body) = send(&app, test::TestRequest::get().uri("/health")).await;
    assert_eq!(body["env"], "production");
}

#[actix_rt::test]
async fn test_security_headers_on_every_response() {
    let app = spawn_app().await;

    for uri in ["/health", "/api/projects", "/api/nothing-here"] {
        let req = test::TestRequest::get().uri(uri);
        let resp = test::call_service(&app, common::request(req)).await;
        let headers = resp.headers();
        assert_eq!(
            headers.get("x-content-type-options").and_then(|v| v.to_str().ok()),
            Some("nosniff"),
            "{}",
            uri
        );
        assert_eq!(
            headers.get("x-frame-options").and_then(|v| v.to_str().ok()),
            Some("SAMEORIGIN"),
            "{}",
            uri
        );
        assert!(headers.contains_key("strict-transport-security"), "{}", uri);
    }
}

#[actix_rt::test]
async fn test_unknown_route_uses_envelope() {
    let app = spawn_app().await;
    let (status, body) = send(&app, test::TestRequest::get().uri("/api/nothing-here")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(
        body,
        json!({ "error": { "code": "NOT_FOUND", "message": "Route not found: GET /api/nothing-here" } })
    );
}

#[actix_rt::test]
async fn test_protected_routes_reject_bad_credentials() {
    let app = spawn_app().await;
    let session = register(&app, "a@x.com").await;

    let cases: [(Option<String>, &str); 4] = [
        (None, "Missing Authorization header"),
        (
            Some(format!("Basic {}", session.access_token)),
            "Invalid Authorization format. Use Bearer <token>",
        ),
        (
            Some("Bearer".to_string()),
            "Invalid Authorization format. Use Bearer <token>",
        ),
        (
            Some(format!("Bearer {}x", session.access_token)),
            "Invalid or expired token",
        ),
    ];

    for uri in ["/api/projects", "/api/tasks"] {
        for (value, message) in &cases {
            let mut req = test::TestRequest::get().uri(uri);
            if let Some(value) = value {
                req = req.insert_header((header::AUTHORIZATION, value.clone()));
            }
            let (status, body) = send(&app, req).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED, "{} {:?}", uri, value);
            assert_eq!(
                body,
                json!({ "error": { "code": "UNAUTHORIZED", "message": message } })
            );
        }
    }
}

#[actix_rt::test]
async fn test_expired_access_token_is_rejected() {
    let app = spawn_app_with(test_config(&[("JWT_ACCESS_EXPIRES_IN", "0s")])).await;
    let session = register(&app, "a@x.com").await;

    let req = test::TestRequest::get()
        .uri("/api/projects")
        .insert_header(session.bearer());
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["message"], "Invalid or expired token");
}

#[actix_rt::test]
async fn test_disallowed_origin_is_forbidden() {
    let app = spawn_app_with(test_config(&[("CORS_ORIGIN", "https://app.example.com")])).await;

    let req = test::TestRequest::get()
        .uri("/health")
        .insert_header((header::ORIGIN, "https://evil.example.com"));
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "CORS_FORBIDDEN");

    let req = test::TestRequest::get()
        .uri("/health")
        .insert_header((header::ORIGIN, "https://app.example.com"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .and_then(|v| v.to_str().ok()),
        Some("https://app.example.com")
    );

    let (status, _) = send(&app, test::TestRequest::get().uri("/health")).await;
    assert_eq!(status, StatusCode::OK);
}

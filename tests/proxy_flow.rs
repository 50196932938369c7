//! Real-mode flows against a fake backend.

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use docgate::http::HttpServer;
use serde_json::json;
use tower::ServiceExt;

mod common;

#[tokio::test]
async fn test_wrapped_response_is_unwrapped_and_credential_forwarded() {
    let upstream = common::start_fixed_upstream(
        200,
        r#"{"success":true,"data":{"count":5},"timestamp":"2025-01-01T00:00:00Z"}"#,
    )
    .await;
    let server = common::real_server(&upstream.base_url());

    let response = server
        .router()
        .oneshot(common::authed("GET", "/api/notifications/unread-count", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["x-mode"], "real");
    assert_eq!(common::body_json(response).await, json!({"count": 5}));

    let seen = upstream.requests();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].method, "GET");
    assert_eq!(seen[0].target, "/api/notifications/unread-count");
    assert_eq!(seen[0].header("authorization"), Some("Bearer test-token"));
    assert!(seen[0].header("x-request-id").is_some());
}

#[tokio::test]
async fn test_upstream_error_passes_through() {
    let upstream = common::start_fixed_upstream(404, r#"{"message":"not found"}"#).await;
    let server = common::real_server(&upstream.base_url());

    let response = server
        .router()
        .oneshot(common::authed("GET", "/api/reader/organizations/org-404", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(common::body_json(response).await, json!({"message": "not found"}));
}

#[tokio::test]
async fn test_scalar_upstream_body_is_rejected() {
    let upstream = common::start_fixed_upstream(200, "42").await;
    let server = common::real_server(&upstream.base_url());

    let response = server
        .router()
        .oneshot(common::authed("GET", "/api/notifications", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body = common::body_json(response).await;
    assert_eq!(body["dialog"]["title"], "Something went wrong");
}

#[tokio::test]
async fn test_unreachable_upstream_renders_dialog() {
    let addr = common::unreachable_addr().await;
    let server = common::real_server(&format!("http://{addr}"));

    let response = server
        .router()
        .oneshot(common::authed("PATCH", "/api/notifications/read-all", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(response.headers()["x-mode"], "real");
    let body = common::body_json(response).await;
    assert!(body["error"].as_str().unwrap().starts_with("Upstream request failed"));
    assert_eq!(body["dialog"]["variant"], "error");
    assert_eq!(body["dialog"]["primaryActionLabel"], "OK");
}

#[tokio::test]
async fn test_fallback_serves_fixtures_when_enabled() {
    let addr = common::unreachable_addr().await;
    let mut config = common::real_config(&format!("http://{addr}"));
    config.upstream.fallback_to_fixtures = true;
    let server = HttpServer::new(config).unwrap();

    let response = server
        .router()
        .oneshot(common::authed("GET", "/api/notifications/unread-count", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["x-mode"], "fallback");
    assert_eq!(common::body_json(response).await, json!({"count": 7}));
}

#[tokio::test]
async fn test_missing_credential_never_reaches_upstream() {
    let upstream = common::start_fixed_upstream(200, r#"{"count":1}"#).await;
    let server = common::real_server(&upstream.base_url());

    let response = server
        .router()
        .oneshot(common::get("/api/notifications/unread-count"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(common::body_json(response).await, json!({"error": "Unauthorized"}));
    assert!(upstream.requests().is_empty());
}

#[tokio::test]
async fn test_multipart_forwarded_byte_for_byte() {
    let upstream = common::start_fixed_upstream(
        201,
        r#"{"data":{"userId":"u-1","status":"PENDING_EMAIL_VERIFY"}}"#,
    )
    .await;
    let server = common::real_server(&upstream.base_url());

    let data = json!({
        "email": "rev@example.com",
        "password": "secret123",
        "fullName": "Rev Iewer",
        "dateOfBirth": "1990-01-01",
        "educationLevel": "PHD",
        "organizationName": "Uni",
        "organizationEmail": "uni@example.com",
        "domainIds": ["d1"],
        "specializationIds": ["s1"]
    });
    let form = format!(
        "--XyZ\r\nContent-Disposition: form-data; name=\"data\"\r\n\r\n{data}\r\n\
         --XyZ\r\nContent-Disposition: form-data; name=\"credentialFiles\"; filename=\"cv.pdf\"\r\n\
         Content-Type: application/pdf\r\n\r\n%PDF-1.4 binary\r\n--XyZ--\r\n"
    );

    let request = Request::builder()
        .method("POST")
        .uri("/api/auth/register/reviewer")
        .header(header::CONTENT_TYPE, "multipart/form-data; boundary=XyZ")
        .body(Body::from(form.clone()))
        .unwrap();
    let response = server.router().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body["userId"], "u-1");

    let seen = upstream.requests();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].body, form.as_bytes());
    assert_eq!(
        seen[0].header("content-type"),
        Some("multipart/form-data; boundary=XyZ")
    );
}

#[tokio::test]
async fn test_query_is_forwarded_to_upstream() {
    let upstream = common::start_fixed_upstream(200, r#"{"tags":[],"total":0}"#).await;
    let server = common::real_server(&upstream.base_url());

    let response = server
        .router()
        .oneshot(common::authed("GET", "/api/business-admin/tags?page=2&search=rust", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let seen = upstream.requests();
    assert!(seen[0].target.starts_with("/api/admin/tags?"));
    assert!(seen[0].target.contains("search=rust"));
}

#[tokio::test]
async fn test_plain_text_command_replies_become_messages() {
    let upstream = common::start_programmable_upstream(|request| async move {
        let text = if request.target.ends_with("/leave") {
            "Successfully left the organization"
        } else {
            "Invitation accepted successfully"
        };
        (200, text.to_string())
    })
    .await;
    let server = common::real_server(&upstream.base_url());
    let router = server.router();

    let response = router
        .clone()
        .oneshot(common::authed(
            "POST",
            "/api/reader/enrollments/enr-7",
            Some(json!({"action": "accept"})),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["x-mode"], "real");
    assert_eq!(
        common::body_json(response).await,
        json!({"message": "Invitation accepted successfully"})
    );

    let response = router
        .oneshot(common::authed("POST", "/api/reader/organizations/org-1/leave", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        common::body_json(response).await,
        json!({"message": "Successfully left the organization"})
    );

    let seen = upstream.requests();
    assert_eq!(seen[0].target, "/api/reader/enrollments/enr-7/accept");
    assert_eq!(seen[1].target, "/api/reader/enrollments/organizations/org-1/leave");
}

#[tokio::test]
async fn test_organization_detail_is_picked_from_joined_list() {
    let upstream = common::start_fixed_upstream(
        200,
        r#"{"success":true,"data":{"content":[{"organizationId":"org-1","organizationName":"Uni"}],"totalElements":1},"timestamp":"t"}"#,
    )
    .await;
    let server = common::real_server(&upstream.base_url());
    let router = server.router();

    let response = router
        .clone()
        .oneshot(common::authed("GET", "/api/reader/organizations/org-1", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(common::body_json(response).await["organizationName"], "Uni");

    let response = router
        .oneshot(common::authed("GET", "/api/reader/organizations/org-2", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        common::body_json(response).await,
        json!({"error": "Organization not found"})
    );

    let seen = upstream.requests();
    assert!(seen[0]
        .target
        .starts_with("/api/reader/enrollments/organizations?"));
}

mod common;

use appgate::models::AccessToken;
use appgate::platform::webhooks::{sign_delivery, HMAC_HEADER};
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use chrono::Utc;
use common::*;
use mockito::{Matcher, Server};
use tower::ServiceExt;

const DEFAULT_ADMIN: &str = "https://{shop}/admin";

#[tokio::test]
async fn protected_routes_without_session_redirect() {
    let (app, _store) = build_app(test_config(DEFAULT_ADMIN));

    for (method, path) in [
        (Method::POST, "/webhooks/products/create"),
        (Method::GET, "/graphql"),
        (Method::POST, "/graphql"),
        (Method::GET, "/verify_token?shop=shop1.example"),
        (Method::DELETE, "/verify_token"),
    ] {
        let response = app
            .clone()
            .oneshot(request(method.clone(), path))
            .await
            .expect("request should complete");

        assert_eq!(
            response.status(),
            StatusCode::FOUND,
            "{} {} should redirect",
            method,
            path
        );
        assert!(location(&response).starts_with("/auth"));
        let body = body_json(response).await;
        assert_ne!(body["status"], "ok");
    }
}

#[tokio::test]
async fn invalid_session_tokens_redirect() {
    let (app, store) = build_app(test_config(DEFAULT_ADMIN));
    store
        .put(&shop("shop1.example"), AccessToken::new("abc123"))
        .await
        .unwrap();

    let expired = session_token_with("shop1.example", API_SECRET, Utc::now().timestamp() - 120);
    let forged = session_token_with("shop1.example", "not-the-secret", Utc::now().timestamp() + 60);

    for token in [expired, forged, "garbage".to_string()] {
        let response = app
            .clone()
            .oneshot(request_with_bearer(
                Method::POST,
                "/graphql?shop=shop1.example",
                &token,
                Body::from(r#"{"query": "{ shop { name } }"}"#),
            ))
            .await
            .expect("request should complete");

        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(location(&response), "/auth?shop=shop1.example");
        let body = body_json(response).await;
        assert_eq!(body["status"], "invalid_token");
    }
}

#[tokio::test]
async fn unregistered_paths_bypass_the_gate() {
    let (app, _store) = build_app(test_config(DEFAULT_ADMIN));

    for path in ["/", "/?shop=shop1.example", "/products/new", "/_next/static/app.js"] {
        let response = app
            .clone()
            .oneshot(request(Method::GET, path))
            .await
            .expect("request should complete");
        assert_eq!(response.status(), StatusCode::OK, "GET {} should render", path);
    }

    let response = app
        .clone()
        .oneshot(request(Method::GET, "/health"))
        .await
        .expect("request should complete");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_bytes(response).await, b"OK");
}

#[tokio::test]
async fn unknown_non_get_is_method_not_allowed() {
    let (app, _store) = build_app(test_config(DEFAULT_ADMIN));
    let response = app
        .oneshot(request(Method::POST, "/products/new"))
        .await
        .expect("request should complete");
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn webhook_path_with_other_methods_behaves_like_pages() {
    let (app, _store) = build_app(test_config(DEFAULT_ADMIN));

    for method in [Method::PUT, Method::DELETE, Method::PATCH] {
        let response = app
            .clone()
            .oneshot(request(method.clone(), "/webhooks/products/create"))
            .await
            .expect("request should complete");
        assert_eq!(
            response.status(),
            StatusCode::METHOD_NOT_ALLOWED,
            "{} on the webhook path",
            method
        );
    }

    let response = app
        .oneshot(request(Method::GET, "/webhooks/products/create?shop=shop1.example"))
        .await
        .expect("request should complete");

    assert_eq!(response.status(), StatusCode::OK);
    let html = String::from_utf8(body_bytes(response).await).unwrap();
    assert!(html.contains("data-shop=\"shop1.example\""));
    assert!(html.contains(&format!("data-api-key=\"{}\"", API_KEY)));
}

#[tokio::test]
async fn verify_token_without_durable_token_is_not_ok() {
    let (app, _store) = build_app(test_config(DEFAULT_ADMIN));
    let token = session_token("shop1.example");

    let response = app
        .oneshot(request(
            Method::GET,
            &format!("/verify_token?shop=shop1.example&token={}", token),
        ))
        .await
        .expect("request should complete");

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response), "/auth?shop=shop1.example");
    let body = body_json(response).await;
    assert_eq!(body["status"], "not_installed");
}

#[tokio::test]
async fn verify_token_with_durable_token_is_ok() {
    let (app, store) = build_app(test_config(DEFAULT_ADMIN));
    store
        .put(&shop("shop1.example"), AccessToken::new("abc123"))
        .await
        .unwrap();
    let token = session_token("shop1.example");

    // Token in the query string, as the front-end sends it.
    let response = app
        .clone()
        .oneshot(request(
            Method::GET,
            &format!("/verify_token?shop=shop1.example&token={}", token),
        ))
        .await
        .expect("request should complete");
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["shop"], "shop1.example");

    // Token in the Authorization header works the same way.
    let response = app
        .oneshot(request_with_bearer(
            Method::GET,
            "/verify_token",
            &token,
            Body::empty(),
        ))
        .await
        .expect("request should complete");
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn verify_token_for_another_shop_is_rejected() {
    let (app, store) = build_app(test_config(DEFAULT_ADMIN));
    store
        .put(&shop("shop1.example"), AccessToken::new("abc123"))
        .await
        .unwrap();
    let token = session_token("shop1.example");

    let response = app
        .oneshot(request(
            Method::GET,
            &format!("/verify_token?shop=shop2.example&token={}", token),
        ))
        .await
        .expect("request should complete");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = body_json(response).await;
    assert_eq!(body["status"], "shop_mismatch");
}

#[tokio::test]
async fn charge_redirects_without_token_check() {
    let (app, _store) = build_app(test_config(DEFAULT_ADMIN));

    let response = app
        .oneshot(request(Method::GET, "/charge?shop=shop1.example&charge_id=99"))
        .await
        .expect("request should complete");

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(
        location(&response),
        format!("https://shop1.example/admin/apps/{}", API_KEY)
    );
}

#[tokio::test]
async fn charge_without_valid_shop_is_bad_request() {
    let (app, _store) = build_app(test_config(DEFAULT_ADMIN));

    for path in ["/charge?charge_id=99", "/charge?shop=evil.example%2F%2Fphish"] {
        let response = app
            .clone()
            .oneshot(request(Method::GET, path))
            .await
            .expect("request should complete");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{}", path);
    }
}

#[tokio::test]
async fn graphql_is_forwarded_with_durable_token() {
    let mut server = Server::new_async().await;
    let upstream = server
        .mock("POST", "/shop1.example/admin/api/2020-07/graphql.json")
        .match_header("authorization", "Bearer abc123")
        .match_header("content-type", "application/json")
        .match_body(Matcher::JsonString(
            r#"{"query": "{ shop { name } }"}"#.to_string(),
        ))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_header("x-request-id", "upstream-1")
        .with_body(r#"{"data": {"shop": {"name": "Shop One"}}}"#)
        .create_async()
        .await;

    let (app, store) = build_app(test_config(&mock_admin_url(&server.url())));
    store
        .put(&shop("shop1.example"), AccessToken::new("abc123"))
        .await
        .unwrap();

    let response = app
        .oneshot(request_with_bearer(
            Method::POST,
            "/graphql",
            &session_token("shop1.example"),
            Body::from(r#"{"query": "{ shop { name } }"}"#),
        ))
        .await
        .expect("request should complete");

    upstream.assert_async().await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers().get("x-request-id").unwrap(), "upstream-1");
    let body = body_json(response).await;
    assert_eq!(body["data"]["shop"]["name"], "Shop One");
}

#[tokio::test]
async fn graphql_upstream_status_passes_through() {
    let mut server = Server::new_async().await;
    let upstream = server
        .mock("POST", "/shop1.example/admin/api/2020-07/graphql.json")
        .with_status(429)
        .with_body(r#"{"errors": "Throttled"}"#)
        .create_async()
        .await;

    let (app, store) = build_app(test_config(&mock_admin_url(&server.url())));
    store
        .put(&shop("shop1.example"), AccessToken::new("abc123"))
        .await
        .unwrap();

    let response = app
        .oneshot(request_with_bearer(
            Method::POST,
            "/graphql",
            &session_token("shop1.example"),
            Body::from("{}"),
        ))
        .await
        .expect("request should complete");

    upstream.assert_async().await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn graphql_upstream_failure_is_bad_gateway() {
    // Nothing listens on port 9 locally.
    let (app, store) = build_app(test_config("http://127.0.0.1:9/{shop}/admin"));
    store
        .put(&shop("shop1.example"), AccessToken::new("abc123"))
        .await
        .unwrap();

    let response = app
        .oneshot(request_with_bearer(
            Method::POST,
            "/graphql",
            &session_token("shop1.example"),
            Body::from("{}"),
        ))
        .await
        .expect("request should complete");

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn webhook_delivery_requires_signature() {
    let (app, store) = build_app(test_config(DEFAULT_ADMIN));
    store
        .put(&shop("shop1.example"), AccessToken::new("abc123"))
        .await
        .unwrap();
    let token = session_token("shop1.example");
    let payload = r#"{"id": 1, "title": "Hat"}"#;

    let signed = Request::builder()
        .method(Method::POST)
        .uri("/webhooks/products/create")
        .header("Authorization", format!("Bearer {}", token))
        .header(HMAC_HEADER, sign_delivery(payload.as_bytes(), API_SECRET).unwrap())
        .header("x-platform-topic", "products/create")
        .body(Body::from(payload))
        .unwrap();
    let response = app.clone().oneshot(signed).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let unsigned = Request::builder()
        .method(Method::POST)
        .uri("/webhooks/products/create")
        .header("Authorization", format!("Bearer {}", token))
        .header(HMAC_HEADER, sign_delivery(payload.as_bytes(), "wrong").unwrap())
        .body(Body::from(payload))
        .unwrap();
    let response = app.oneshot(unsigned).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

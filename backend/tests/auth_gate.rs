//! Drives the auth gate through its per-request state machine without a
//! database: valid, malformed, and expired access tokens, and every refresh
//! outcome including revocation by supersession.

mod support;

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    middleware as axum_middleware,
    routing::get,
    Extension, Json, Router,
};
use chrono::{Duration, Utc};
use serde_json::{json, Value};
use tower::ServiceExt;

use storekeeper_backend::{
    middleware,
    middleware::auth::AuthUser,
    services::revocation::{refresh_token_key, InMemoryRevocationCache, RevocationCache},
    state::AppState,
    utils::jwt::{sign_access_token, sign_refresh_token, AccessClaims, RefreshClaims},
};
use support::{test_state, TEST_SECRET};

async fn whoami(Extension(user): Extension<AuthUser>) -> Json<Value> {
    Json(json!({ "id": user.id, "email": user.email, "role": user.role }))
}

fn app(state: AppState) -> Router {
    let user_routes = Router::new()
        .route("/protected", get(whoami))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::auth,
        ));
    let admin_routes = Router::new()
        .route("/admin", get(whoami))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::auth_admin,
        ));
    Router::new()
        .merge(user_routes)
        .merge(admin_routes)
        .with_state(state)
}

fn fresh_access(role: Option<&str>) -> String {
    let claims = AccessClaims::new(
        7,
        "clerk@example.com".into(),
        role.map(str::to_string),
        15,
    );
    sign_access_token(&claims, TEST_SECRET).expect("sign access")
}

fn expired_access() -> String {
    let mut claims = AccessClaims::new(7, "clerk@example.com".into(), Some("user".into()), 15);
    claims.exp = (Utc::now() - Duration::hours(2)).timestamp();
    sign_access_token(&claims, TEST_SECRET).expect("sign access")
}

fn fresh_refresh() -> String {
    let claims = RefreshClaims::new(7, "clerk@example.com".into(), 7);
    sign_refresh_token(&claims, TEST_SECRET).expect("sign refresh")
}

fn expired_refresh() -> String {
    let mut claims = RefreshClaims::new(7, "clerk@example.com".into(), 7);
    claims.exp = (Utc::now() - Duration::hours(2)).timestamp();
    sign_refresh_token(&claims, TEST_SECRET).expect("sign refresh")
}

async fn send(app: Router, path: &str, cookie: Option<String>, bearer: Option<&str>) -> axum::response::Response {
    let mut builder = Request::builder().uri(path).method("GET");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    if let Some(token) = bearer {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    app.oneshot(builder.body(Body::empty()).expect("request"))
        .await
        .expect("response")
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("json")
}

#[tokio::test]
async fn no_tokens_is_unauthorized() {
    let state = test_state(Arc::new(InMemoryRevocationCache::new()));
    let response = send(app(state), "/protected", None, None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let json = body_json(response).await;
    assert_eq!(json["code"], "MISSING_CREDENTIALS");
}

#[tokio::test]
async fn malformed_access_token_is_terminal() {
    let state = test_state(Arc::new(InMemoryRevocationCache::new()));
    let response = send(
        app(state),
        "/protected",
        Some("accessToken=not-a-jwt".into()),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let json = body_json(response).await;
    assert_eq!(json["code"], "TOKEN_INVALID");
}

#[tokio::test]
async fn valid_access_cookie_proceeds() {
    let state = test_state(Arc::new(InMemoryRevocationCache::new()));
    let cookie = format!("accessToken={}", fresh_access(Some("user")));
    let response = send(app(state), "/protected", Some(cookie), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["email"], "clerk@example.com");
    assert_eq!(json["role"], "user");
}

#[tokio::test]
async fn valid_bearer_token_proceeds() {
    let state = test_state(Arc::new(InMemoryRevocationCache::new()));
    let token = fresh_access(Some("user"));
    let response = send(app(state), "/protected", None, Some(&token)).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn expired_access_without_refresh_is_terminal() {
    let state = test_state(Arc::new(InMemoryRevocationCache::new()));
    let cookie = format!("accessToken={}", expired_access());
    let response = send(app(state), "/protected", Some(cookie), None).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let json = body_json(response).await;
    assert_eq!(json["code"], "TOKEN_EXPIRED");
}

#[tokio::test]
async fn matching_refresh_renews_the_access_cookie() {
    let cache = Arc::new(InMemoryRevocationCache::new());
    let refresh = fresh_refresh();
    cache
        .set(&refresh_token_key("clerk@example.com"), &refresh, None)
        .await
        .unwrap();

    let state = test_state(cache);
    let cookie = format!("accessToken={}; refreshToken={}", expired_access(), refresh);
    let response = send(app(state), "/protected", Some(cookie), None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .expect("renewed access cookie")
        .to_str()
        .unwrap()
        .to_string();
    assert!(set_cookie.starts_with("accessToken="));
    assert!(set_cookie.contains("HttpOnly"));

    // The refresh path only authorizes {id, email}; no role survives.
    let json = body_json(response).await;
    assert_eq!(json["email"], "clerk@example.com");
    assert_eq!(json["role"], Value::Null);
}

#[tokio::test]
async fn missing_access_with_valid_refresh_also_renews() {
    let cache = Arc::new(InMemoryRevocationCache::new());
    let refresh = fresh_refresh();
    cache
        .set(&refresh_token_key("clerk@example.com"), &refresh, None)
        .await
        .unwrap();

    let state = test_state(cache);
    let cookie = format!("refreshToken={}", refresh);
    let response = send(app(state), "/protected", Some(cookie), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get(header::SET_COOKIE).is_some());
}

#[tokio::test]
async fn superseded_refresh_token_is_revoked() {
    // The cache trusts R2; an older, still-unexpired R1 must fail.
    let cache = Arc::new(InMemoryRevocationCache::new());
    let old_refresh = fresh_refresh();
    let new_refresh = fresh_refresh();
    assert_ne!(old_refresh, new_refresh);
    cache
        .set(&refresh_token_key("clerk@example.com"), &new_refresh, None)
        .await
        .unwrap();

    let state = test_state(cache);
    let cookie = format!(
        "accessToken={}; refreshToken={}",
        expired_access(),
        old_refresh
    );
    let response = send(app(state), "/protected", Some(cookie), None).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let json = body_json(response).await;
    assert_eq!(json["code"], "TOKEN_REVOKED");
}

#[tokio::test]
async fn unknown_refresh_token_is_revoked() {
    let state = test_state(Arc::new(InMemoryRevocationCache::new()));
    let cookie = format!(
        "accessToken={}; refreshToken={}",
        expired_access(),
        fresh_refresh()
    );
    let response = send(app(state), "/protected", Some(cookie), None).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let json = body_json(response).await;
    assert_eq!(json["code"], "TOKEN_REVOKED");
}

#[tokio::test]
async fn expired_refresh_token_is_terminal_even_when_cached() {
    let cache = Arc::new(InMemoryRevocationCache::new());
    let refresh = expired_refresh();
    cache
        .set(&refresh_token_key("clerk@example.com"), &refresh, None)
        .await
        .unwrap();

    let state = test_state(cache);
    let cookie = format!("accessToken={}; refreshToken={}", expired_access(), refresh);
    let response = send(app(state), "/protected", Some(cookie), None).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let json = body_json(response).await;
    assert_eq!(json["code"], "TOKEN_EXPIRED");
}

#[tokio::test]
async fn admin_route_requires_the_admin_role() {
    let state = test_state(Arc::new(InMemoryRevocationCache::new()));
    let admin_cookie = format!("accessToken={}", fresh_access(Some("admin")));
    let response = send(app(state.clone()), "/admin", Some(admin_cookie), None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let user_cookie = format!("accessToken={}", fresh_access(Some("user")));
    let response = send(app(state), "/admin", Some(user_cookie), None).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let json = body_json(response).await;
    assert_eq!(json["code"], "FORBIDDEN");
}

#[tokio::test]
async fn refreshed_request_cannot_pass_the_admin_gate() {
    let cache = Arc::new(InMemoryRevocationCache::new());
    let refresh = fresh_refresh();
    cache
        .set(&refresh_token_key("clerk@example.com"), &refresh, None)
        .await
        .unwrap();

    let state = test_state(cache);
    let cookie = format!("accessToken={}; refreshToken={}", expired_access(), refresh);
    let response = send(app(state), "/admin", Some(cookie), None).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

//! Bearer-token guard, token verification and the Google login redirect.

mod common;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use catering_service::services::store::UserRepository;
use common::TestApp;

#[tokio::test]
async fn api_rejects_missing_token() {
    let app = TestApp::spawn().await;
    let request = Request::get("/api/quotes").body(Body::empty()).unwrap();

    let response = app.send(request).await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.body["message"], "No token provided");
}

#[tokio::test]
async fn api_rejects_invalid_token() {
    let app = TestApp::spawn().await;
    let request = Request::get("/api/recipes")
        .header(header::AUTHORIZATION, "Bearer not-a-jwt")
        .body(Body::empty())
        .unwrap();

    let response = app.send(request).await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.body["valid"], false);
    assert_eq!(response.body["message"], "Invalid token");
}

#[tokio::test]
async fn api_accepts_valid_token() {
    let app = TestApp::spawn().await;

    let response = app.get("/api/recipes").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body.as_array().map(Vec::len), Some(4));
}

#[tokio::test]
async fn api_is_open_when_auth_disabled() {
    let mut app = TestApp::spawn().await;
    let mut state = app.state.clone();
    state.config.security.require_auth = false;
    app.router = catering_service::build_router(state);

    let request = Request::get("/api/clients").body(Body::empty()).unwrap();
    let response = app.send(request).await;

    assert_eq!(response.status, StatusCode::OK);
}

#[tokio::test]
async fn verify_returns_claims_for_valid_token() {
    let app = TestApp::spawn().await;
    let request = Request::get("/auth/verify")
        .header(header::AUTHORIZATION, format!("Bearer {}", app.token))
        .body(Body::empty())
        .unwrap();

    let response = app.send(request).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["valid"], true);
    assert_eq!(response.body["user"]["email"], "chef@example.com");
    assert_eq!(response.body["user"]["name"], "Test Chef");
}

#[tokio::test]
async fn verify_rejects_missing_and_invalid_tokens() {
    let app = TestApp::spawn().await;

    let missing = app
        .send(Request::get("/auth/verify").body(Body::empty()).unwrap())
        .await;
    assert_eq!(missing.status, StatusCode::UNAUTHORIZED);
    assert_eq!(missing.body["message"], "No token provided");

    let invalid = app
        .send(
            Request::get("/auth/verify")
                .header(header::AUTHORIZATION, "Bearer garbage")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(invalid.status, StatusCode::UNAUTHORIZED);
    assert_eq!(invalid.body["valid"], false);
}

#[tokio::test]
async fn token_from_another_secret_is_rejected() {
    let app = TestApp::spawn().await;
    let mut config = common::test_config();
    config.jwt.secret = "some-other-secret".to_string();
    let other = catering_service::services::JwtService::new(&config.jwt).unwrap();
    let user = catering_service::models::User::new(
        "g-9".to_string(),
        "intruder@example.com".to_string(),
        None,
        None,
    );
    let forged = other.issue(&user).unwrap();

    let response = app
        .send(
            Request::get("/api/quotes")
                .header(header::AUTHORIZATION, format!("Bearer {}", forged))
                .body(Body::empty())
                .unwrap(),
        )
        .await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn auth_failure_returns_401() {
    let app = TestApp::spawn().await;

    let response = app
        .send(Request::get("/auth/failure").body(Body::empty()).unwrap())
        .await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.body["success"], false);
    assert_eq!(response.body["message"], "Authentication failed");
}

#[tokio::test]
async fn google_login_redirects_with_pkce_and_state_cookies() {
    let app = TestApp::spawn().await;

    let response = app
        .send(Request::get("/auth/google").body(Body::empty()).unwrap())
        .await;

    assert_eq!(response.status, StatusCode::SEE_OTHER);
    let location = response.headers[header::LOCATION].to_str().unwrap();
    assert!(location.starts_with("https://accounts.google.com/o/oauth2/v2/auth?"));
    assert!(location.contains("client_id=test-client-id"));
    assert!(location.contains("code_challenge_method=S256"));

    let cookies: Vec<&str> = response
        .headers
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .collect();
    assert!(cookies.iter().any(|c| c.starts_with("oauth_state=") && c.contains("HttpOnly")));
    assert!(cookies.iter().any(|c| c.starts_with("code_verifier=") && c.contains("Max-Age=300")));
}

#[tokio::test]
async fn google_callback_with_provider_error_redirects_to_failure() {
    let app = TestApp::spawn().await;

    let response = app
        .send(
            Request::get("/auth/google/callback?error=access_denied")
                .body(Body::empty())
                .unwrap(),
        )
        .await;

    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.headers[header::LOCATION], "/auth/failure");
}

#[tokio::test]
async fn google_callback_rejects_state_mismatch() {
    let app = TestApp::spawn().await;

    let response = app
        .send(
            Request::get("/auth/google/callback?code=abc&state=forged")
                .header(header::COOKIE, "oauth_state=expected; code_verifier=v")
                .body(Body::empty())
                .unwrap(),
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["message"], "Invalid OAuth state");
}

#[tokio::test]
async fn google_callback_fails_closed_when_provider_unreachable() {
    let app = TestApp::spawn().await;

    let response = app
        .send(
            Request::get("/auth/google/callback?code=abc&state=s1")
                .header(header::COOKIE, "oauth_state=s1; code_verifier=v")
                .body(Body::empty())
                .unwrap(),
        )
        .await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.body["message"], "Authentication failed");
}

#[tokio::test]
async fn google_users_are_upserted_by_google_id() {
    let app = TestApp::empty().await;

    let first = app
        .state
        .store
        .upsert_google_user("g-1", "old@example.com", Some("Old"), None)
        .await
        .unwrap();
    let second = app
        .state
        .store
        .upsert_google_user("g-1", "new@example.com", Some("New"), Some("pic"))
        .await
        .unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(second.email, "new@example.com");
    assert_eq!(second.picture.as_deref(), Some("pic"));
}

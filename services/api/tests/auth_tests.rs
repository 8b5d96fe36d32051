//! Integration tests for the OAuth login endpoints against a mocked provider.

mod common;

use axum::http::StatusCode;
use common::TestApp;
use serde_json::{json, Value};
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mock_token(server: &MockServer, access_token: &str) {
    Mock::given(method("POST"))
        .and(path("/oauth2/token"))
        .and(body_string_contains("grant_type=authorization_code"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": access_token,
            "refresh_token": "refresh-1",
            "token_type": "Bearer",
            "expires_in": 604800
        })))
        .mount(server)
        .await;
}

async fn mock_profile(server: &MockServer, access_token: &str, username: &str) {
    Mock::given(method("GET"))
        .and(path("/users/@me"))
        .and(header("authorization", format!("Bearer {}", access_token).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "80351110224678912",
            "username": username,
            "email": "faye@bebop.test",
            "avatar": "8342729096ea3675442027381ff50dfe"
        })))
        .mount(server)
        .await;
}

async fn issue_state(app: &TestApp) -> String {
    let body: Value = app.server().get("/api/auth/login").await.json();
    body["state"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_login_builds_provider_url() {
    let app = TestApp::new().await;

    let response = app.server().get("/api/auth/login").await;

    response.assert_status_ok();
    let body: Value = response.json();
    let auth_url = body["auth_url"].as_str().unwrap();
    let state = body["state"].as_str().unwrap();
    assert!(auth_url.starts_with(&format!("{}/oauth2/authorize?", app.discord.uri())));
    assert!(auth_url.contains("client_id=test-client"));
    assert!(auth_url.contains("response_type=code"));
    assert!(auth_url.contains(&format!("state={}", state)));
    assert_eq!(state.len(), 22);
}

#[tokio::test]
async fn test_callback_creates_user_and_hides_tokens_from_profile() {
    let app = TestApp::new().await;
    mock_token(&app.discord, "access-1").await;
    mock_profile(&app.discord, "access-1", "faye").await;
    let state = issue_state(&app).await;

    let response = app
        .server()
        .get("/api/auth/callback")
        .add_query_param("code", "code-1")
        .add_query_param("state", &state)
        .await;

    response.assert_status_ok();
    let session: Value = response.json();
    assert_eq!(session["username"], "faye");
    assert_eq!(session["email"], "faye@bebop.test");
    assert_eq!(session["access_token"], "access-1");
    assert_eq!(
        session["avatar"],
        "https://cdn.discordapp.com/avatars/80351110224678912/8342729096ea3675442027381ff50dfe.png"
    );

    let user_id = session["user_id"].as_str().unwrap();
    let profile = app.server().get(&format!("/api/auth/user/{}", user_id)).await;
    profile.assert_status_ok();
    let profile: Value = profile.json();
    assert_eq!(profile["username"], "faye");
    assert_eq!(profile["provider_subject_id"], "80351110224678912");
    assert!(profile.get("access_token").is_none());
    assert!(profile.get("refresh_token").is_none());
}

#[tokio::test]
async fn test_repeat_login_refreshes_existing_user() {
    let app = TestApp::new().await;
    mock_token(&app.discord, "access-1").await;
    mock_profile(&app.discord, "access-1", "faye").await;
    let state = issue_state(&app).await;
    let first: Value = app
        .server()
        .get("/api/auth/callback")
        .add_query_param("code", "code-1")
        .add_query_param("state", &state)
        .await
        .json();

    app.discord.reset().await;
    mock_token(&app.discord, "access-2").await;
    mock_profile(&app.discord, "access-2", "faye_valentine").await;
    let state = issue_state(&app).await;
    let second: Value = app
        .server()
        .get("/api/auth/callback")
        .add_query_param("code", "code-2")
        .add_query_param("state", &state)
        .await
        .json();

    assert_eq!(first["user_id"], second["user_id"]);
    assert_eq!(second["access_token"], "access-2");

    let profile: Value = app
        .server()
        .get(&format!("/api/auth/user/{}", second["user_id"].as_str().unwrap()))
        .await
        .json();
    assert_eq!(profile["username"], "faye_valentine");
}

#[tokio::test]
async fn test_state_is_single_use() {
    let app = TestApp::new().await;
    mock_token(&app.discord, "access-1").await;
    mock_profile(&app.discord, "access-1", "faye").await;
    let state = issue_state(&app).await;

    app.server()
        .get("/api/auth/callback")
        .add_query_param("code", "code-1")
        .add_query_param("state", &state)
        .await
        .assert_status_ok();

    let replay = app
        .server()
        .get("/api/auth/callback")
        .add_query_param("code", "code-1")
        .add_query_param("state", &state)
        .await;
    replay.assert_status_bad_request();
    assert_eq!(replay.json::<Value>()["error"], "auth_error");
}

#[tokio::test]
async fn test_unknown_or_missing_state_is_rejected() {
    let app = TestApp::new().await;
    mock_token(&app.discord, "access-1").await;
    mock_profile(&app.discord, "access-1", "faye").await;

    app.server()
        .get("/api/auth/callback")
        .add_query_param("code", "code-1")
        .add_query_param("state", "forged")
        .await
        .assert_status_bad_request();
    app.server()
        .get("/api/auth/callback")
        .add_query_param("code", "code-1")
        .await
        .assert_status_bad_request();
}

#[tokio::test]
async fn test_state_ignored_when_verification_disabled() {
    let app = TestApp::with_vars(&[("OAUTH_VERIFY_STATE", "false")]).await;
    mock_token(&app.discord, "access-1").await;
    mock_profile(&app.discord, "access-1", "faye").await;

    let response = app
        .server()
        .get("/api/auth/callback")
        .add_query_param("code", "code-1")
        .await;

    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["username"], "faye");
}

#[tokio::test]
async fn test_rejected_code_is_bad_request() {
    let app = TestApp::new().await;
    Mock::given(method("POST"))
        .and(path("/oauth2/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({ "error": "invalid_grant" })))
        .mount(&app.discord)
        .await;
    let state = issue_state(&app).await;

    let response = app
        .server()
        .get("/api/auth/callback")
        .add_query_param("code", "expired")
        .add_query_param("state", &state)
        .await;

    response.assert_status_bad_request();
    let body: Value = response.json();
    assert_eq!(body["detail"], "Failed to get access token");
}

#[tokio::test]
async fn test_profile_failure_is_bad_request() {
    let app = TestApp::new().await;
    mock_token(&app.discord, "access-1").await;
    Mock::given(method("GET"))
        .and(path("/users/@me"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&app.discord)
        .await;
    let state = issue_state(&app).await;

    let response = app
        .server()
        .get("/api/auth/callback")
        .add_query_param("code", "code-1")
        .add_query_param("state", &state)
        .await;

    response.assert_status_bad_request();
    assert_eq!(response.json::<Value>()["detail"], "Failed to get user info");
}

#[tokio::test]
async fn test_callback_without_code_is_unprocessable() {
    let app = TestApp::new().await;

    app.server()
        .get("/api/auth/callback")
        .await
        .assert_status(StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_unknown_user_is_not_found() {
    let app = TestApp::new().await;

    app.server()
        .get(&format!("/api/auth/user/{}", uuid::Uuid::new_v4()))
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

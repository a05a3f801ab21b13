mod common;

use common::{spawn_app, LOGIN, PASSWORD};
use reqwest::Client;
use serde_json::{json, Value};

fn cookie_less_client() -> Client {
    Client::new()
}

async fn refresh_with_body(app: &common::TestApp, refresh_token: &str) -> reqwest::Response {
    cookie_less_client()
        .post(app.url("/api/v1/users/auth/refresh"))
        .json(&json!({ "refresh_token": refresh_token }))
        .send()
        .await
        .expect("Failed to execute request.")
}

// --- Sign up ---

#[tokio::test]
async fn sign_up_returns_200_for_valid_credentials() {
    let app = spawn_app();

    let response = app.sign_up(LOGIN, PASSWORD).await;

    assert_eq!(200, response.status().as_u16());
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "OK");
}

#[tokio::test]
async fn sign_up_returns_409_for_taken_login() {
    let app = spawn_app();
    app.sign_up(LOGIN, PASSWORD).await;

    let response = app.sign_up(LOGIN, "another-pw1!").await;

    assert_eq!(409, response.status().as_u16());
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "USER_EXISTS");
}

#[tokio::test]
async fn sign_up_returns_400_for_invalid_input() {
    let app = spawn_app();
    let test_cases = vec![
        ("abc", PASSWORD, "login too short"),
        (LOGIN, "short!", "password too short"),
        (LOGIN, "nospecialchars1", "password without special character"),
        ("", PASSWORD, "empty login"),
    ];

    for (login, password, description) in test_cases {
        let response = app.sign_up(login, password).await;
        assert_eq!(
            400,
            response.status().as_u16(),
            "The API did not fail with 400 Bad Request for {}.",
            description
        );
    }
}

#[tokio::test]
async fn malformed_json_returns_400() {
    let app = spawn_app();

    let response = app
        .client
        .post(app.url("/api/v1/users/auth/signup"))
        .header("Content-Type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();

    assert_eq!(400, response.status().as_u16());
}

// --- Sign in ---

#[tokio::test]
async fn sign_in_returns_tokens_and_sets_cookie() {
    let app = spawn_app();
    app.sign_up(LOGIN, PASSWORD).await;

    let response = app.sign_in(LOGIN, PASSWORD).await;

    assert_eq!(200, response.status().as_u16());
    let cookie = response
        .cookies()
        .find(|c| c.name() == "refreshToken")
        .expect("refresh cookie not set");
    assert!(cookie.http_only());
    assert_eq!(cookie.path(), Some("/api/v1/users/auth"));
    let cookie_value = cookie.value().to_string();

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "OK");
    assert!(body["accessToken"].as_str().is_some());
    assert_eq!(body["refreshToken"].as_str().unwrap(), cookie_value);
}

#[tokio::test]
async fn sign_in_failures_are_indistinguishable() {
    let app = spawn_app();
    app.sign_up(LOGIN, PASSWORD).await;

    let unknown = app.sign_in("mallory", PASSWORD).await;
    let wrong = app.sign_in(LOGIN, "longpw124!").await;

    assert_eq!(401, unknown.status().as_u16());
    assert_eq!(401, wrong.status().as_u16());

    let unknown: Value = unknown.json().await.unwrap();
    let wrong: Value = wrong.json().await.unwrap();
    assert_eq!(unknown["code"], wrong["code"]);
    assert_eq!(unknown["message"], wrong["message"]);
}

// --- Refresh / logout ---

#[tokio::test]
async fn refresh_via_cookie_rotates_tokens() {
    let app = spawn_app();
    app.sign_up(LOGIN, PASSWORD).await;
    let first: Value = app.sign_in(LOGIN, PASSWORD).await.json().await.unwrap();

    let response = app
        .client
        .post(app.url("/api/v1/users/auth/refresh"))
        .send()
        .await
        .unwrap();

    assert_eq!(200, response.status().as_u16());
    let second: Value = response.json().await.unwrap();
    assert_ne!(first["refreshToken"], second["refreshToken"]);

    let replay = refresh_with_body(&app, first["refreshToken"].as_str().unwrap()).await;
    assert_eq!(401, replay.status().as_u16());
}

#[tokio::test]
async fn refresh_without_token_returns_401() {
    let app = spawn_app();

    let response = cookie_less_client()
        .post(app.url("/api/v1/users/auth/refresh"))
        .send()
        .await
        .unwrap();

    assert_eq!(401, response.status().as_u16());
}

#[tokio::test]
async fn logout_is_idempotent() {
    let app = spawn_app();
    app.sign_up(LOGIN, PASSWORD).await;
    let tokens: Value = app.sign_in(LOGIN, PASSWORD).await.json().await.unwrap();
    let refresh_token = tokens["refreshToken"].as_str().unwrap();

    for _ in 0..2 {
        let response = cookie_less_client()
            .post(app.url("/api/v1/users/auth/logout"))
            .json(&json!({ "refresh_token": refresh_token }))
            .send()
            .await
            .unwrap();
        assert_eq!(200, response.status().as_u16());
    }
}

#[tokio::test]
async fn full_session_scenario() {
    let app = spawn_app();

    assert_eq!(200, app.sign_up(LOGIN, PASSWORD).await.status().as_u16());
    assert_eq!(409, app.sign_up(LOGIN, "another-pw1!").await.status().as_u16());

    let tokens: Value = app.sign_in(LOGIN, PASSWORD).await.json().await.unwrap();
    let old_refresh = tokens["refreshToken"].as_str().unwrap().to_string();

    let refreshed = refresh_with_body(&app, &old_refresh).await;
    assert_eq!(200, refreshed.status().as_u16());
    let new_tokens: Value = refreshed.json().await.unwrap();
    let new_refresh = new_tokens["refreshToken"].as_str().unwrap().to_string();

    assert_eq!(401, refresh_with_body(&app, &old_refresh).await.status().as_u16());

    let logout = cookie_less_client()
        .post(app.url("/api/v1/users/auth/logout"))
        .json(&json!({ "refresh_token": new_refresh }))
        .send()
        .await
        .unwrap();
    assert_eq!(200, logout.status().as_u16());

    let after_logout = refresh_with_body(&app, &new_refresh).await;
    assert_eq!(401, after_logout.status().as_u16());
    let body: Value = after_logout.json().await.unwrap();
    assert_eq!(body["code"], "INVALID_SESSION");
}

#[tokio::test]
async fn sixth_sign_in_evicts_the_oldest_session() {
    let app = spawn_app();
    app.sign_up(LOGIN, PASSWORD).await;

    let mut refresh_tokens = Vec::new();
    for _ in 0..6 {
        let tokens: Value = app.sign_in(LOGIN, PASSWORD).await.json().await.unwrap();
        refresh_tokens.push(tokens["refreshToken"].as_str().unwrap().to_string());
    }

    assert_eq!(401, refresh_with_body(&app, &refresh_tokens[0]).await.status().as_u16());
    for token in &refresh_tokens[1..] {
        assert_eq!(200, refresh_with_body(&app, token).await.status().as_u16());
    }
}

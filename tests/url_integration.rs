mod common;

use common::spawn_app;
use reqwest::{redirect::Policy, Client};
use serde_json::{json, Value};

async fn save_url(app: &common::TestApp, token: &str, body: Value) -> reqwest::Response {
    app.client
        .post(app.url("/api/v1/urls"))
        .bearer_auth(token)
        .json(&body)
        .send()
        .await
        .expect("Failed to execute request.")
}

fn no_redirect_client() -> Client {
    Client::builder().redirect(Policy::none()).build().unwrap()
}

#[tokio::test]
async fn protected_routes_require_a_bearer_token() {
    let app = spawn_app();

    let missing = app
        .client
        .post(app.url("/api/v1/urls"))
        .json(&json!({ "url": "https://example.com" }))
        .send()
        .await
        .unwrap();
    assert_eq!(401, missing.status().as_u16());

    let invalid = app
        .client
        .get(app.url("/api/v1/urls"))
        .bearer_auth("not-a-token")
        .send()
        .await
        .unwrap();
    assert_eq!(401, invalid.status().as_u16());

    let delete = app
        .client
        .delete(app.url("/api/v1/urls/anything"))
        .send()
        .await
        .unwrap();
    assert_eq!(401, delete.status().as_u16());
}

#[tokio::test]
async fn saved_alias_redirects_publicly() {
    let app = spawn_app();
    let token = app.signed_in_user().await;

    let response = save_url(
        &app,
        &token,
        json!({ "url": "https://example.com/page", "alias": "ex" }),
    )
    .await;
    assert_eq!(200, response.status().as_u16());
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["alias"], "ex");

    let redirect = no_redirect_client()
        .get(app.url("/api/v1/urls/ex"))
        .send()
        .await
        .unwrap();
    assert_eq!(302, redirect.status().as_u16());
    assert_eq!(
        redirect.headers().get("location").unwrap(),
        "https://example.com/page"
    );
}

#[tokio::test]
async fn alias_is_generated_when_missing() {
    let app = spawn_app();
    let token = app.signed_in_user().await;

    let response = save_url(&app, &token, json!({ "url": "https://example.com" })).await;

    assert_eq!(200, response.status().as_u16());
    let body: Value = response.json().await.unwrap();
    let alias = body["alias"].as_str().unwrap();
    assert_eq!(alias.len(), 6);
    assert!(alias.chars().all(|c| c.is_ascii_alphanumeric()));
}

#[tokio::test]
async fn invalid_url_returns_400() {
    let app = spawn_app();
    let token = app.signed_in_user().await;

    for url in ["", "example.com", "ftp://example.com"] {
        let response = save_url(&app, &token, json!({ "url": url })).await;
        assert_eq!(400, response.status().as_u16(), "accepted url {:?}", url);
    }
}

#[tokio::test]
async fn duplicate_alias_returns_409() {
    let app = spawn_app();
    let token = app.signed_in_user().await;

    save_url(&app, &token, json!({ "url": "https://a.example", "alias": "dup" })).await;
    let response =
        save_url(&app, &token, json!({ "url": "https://b.example", "alias": "dup" })).await;

    assert_eq!(409, response.status().as_u16());
}

#[tokio::test]
async fn unknown_alias_returns_404() {
    let app = spawn_app();

    let response = no_redirect_client()
        .get(app.url("/api/v1/urls/missing"))
        .send()
        .await
        .unwrap();

    assert_eq!(404, response.status().as_u16());
}

#[tokio::test]
async fn list_returns_only_own_urls() {
    let app = spawn_app();
    let token = app.signed_in_user().await;

    let empty: Value = app
        .client
        .get(app.url("/api/v1/urls"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(empty["urls"], json!({}));

    save_url(&app, &token, json!({ "url": "https://a.example", "alias": "a" })).await;
    save_url(&app, &token, json!({ "url": "https://b.example", "alias": "b" })).await;

    let listed: Value = app
        .client
        .get(app.url("/api/v1/urls"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(
        listed["urls"],
        json!({ "a": "https://a.example", "b": "https://b.example" })
    );
}

#[tokio::test]
async fn only_the_owner_can_delete() {
    let app = spawn_app();
    let owner = app.signed_in_user().await;
    save_url(&app, &owner, json!({ "url": "https://example.com", "alias": "mine" })).await;

    app.sign_up("bobby", "bobby-pw1!").await;
    let other: Value = app.sign_in("bobby", "bobby-pw1!").await.json().await.unwrap();
    let other = other["accessToken"].as_str().unwrap();

    let response = app
        .client
        .delete(app.url("/api/v1/urls/mine"))
        .bearer_auth(other)
        .send()
        .await
        .unwrap();
    assert_eq!(404, response.status().as_u16());

    let response = app
        .client
        .delete(app.url("/api/v1/urls/mine"))
        .bearer_auth(&owner)
        .send()
        .await
        .unwrap();
    assert_eq!(200, response.status().as_u16());

    let gone = no_redirect_client()
        .get(app.url("/api/v1/urls/mine"))
        .send()
        .await
        .unwrap();
    assert_eq!(404, gone.status().as_u16());
}

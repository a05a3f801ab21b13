#![allow(dead_code)]

use reqwest::{Client, Response};
use serde_json::{json, Value};
use std::net::TcpListener;
use url_shortener::configuration::{
    ApplicationSettings, DatabaseSettings, JwtSettings, SessionSettings, Settings, StorageBackend,
    StorageSettings,
};
use url_shortener::startup::{run, Services};

pub const LOGIN: &str = "alice";
pub const PASSWORD: &str = "longpw123!";

/// Lowest cost bcrypt accepts.
const TEST_COST: u32 = 4;

pub struct TestApp {
    pub address: String,
    /// Client with a cookie jar, so the refresh cookie round-trips like a browser.
    pub client: Client,
}

fn test_settings() -> Settings {
    Settings {
        database: DatabaseSettings {
            username: "postgres".to_string(),
            password: "password".to_string(),
            port: 5432,
            host: "localhost".to_string(),
            database_name: "unused".to_string(),
        },
        application: ApplicationSettings {
            port: 0,
            host: "127.0.0.1".to_string(),
        },
        jwt: JwtSettings {
            secret: "integration-test-secret-at-least-32-chars".to_string(),
            access_token_expiry: 900,
            refresh_token_expiry: 604800,
        },
        session: SessionSettings {
            max_sessions: 5,
            password_cost: TEST_COST,
        },
        storage: StorageSettings {
            backend: StorageBackend::Memory,
        },
    }
}

pub fn spawn_app() -> TestApp {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();

    let services = Services::in_memory(&test_settings());
    let server = run(listener, services).expect("Failed to create server");
    let _ = tokio::spawn(server);

    TestApp {
        address: format!("http://127.0.0.1:{}", port),
        client: Client::builder()
            .cookie_store(true)
            .build()
            .expect("Failed to build client"),
    }
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    pub async fn post_json(&self, path: &str, body: Value) -> Response {
        self.client
            .post(self.url(path))
            .json(&body)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn sign_up(&self, login: &str, password: &str) -> Response {
        self.post_json(
            "/api/v1/users/auth/signup",
            json!({ "login": login, "password": password }),
        )
        .await
    }

    pub async fn sign_in(&self, login: &str, password: &str) -> Response {
        self.post_json(
            "/api/v1/users/auth/signin",
            json!({ "login": login, "password": password }),
        )
        .await
    }

    /// Signs `LOGIN` up and in, returning the access token.
    pub async fn signed_in_user(&self) -> String {
        assert_eq!(200, self.sign_up(LOGIN, PASSWORD).await.status().as_u16());
        let response = self.sign_in(LOGIN, PASSWORD).await;
        assert_eq!(200, response.status().as_u16());

        let body: Value = response.json().await.expect("Failed to parse response");
        body["accessToken"].as_str().unwrap().to_string()
    }
}

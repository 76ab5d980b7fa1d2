//! Shared setup for catering-service integration tests.
//!
//! Every test gets its own router over an in-memory store, so tests run
//! without MongoDB or network access.

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use catering_service::{
    build_router,
    config::{
        CateringConfig, GoogleOAuthConfig, JwtConfig, MongoConfig, PricingConfig, SecurityConfig,
        StoreBackend, StoreConfig,
    },
    models::User,
    services::{seed::demo_catalog, InMemoryStore, Store},
    AppState,
};
use rust_decimal::Decimal;
use serde_json::Value;
use service_core::config::{Config, Environment};
use std::sync::Arc;
use tower::ServiceExt;

pub const TEST_JWT_SECRET: &str = "integration-test-secret";

pub fn test_config() -> CateringConfig {
    CateringConfig {
        common: Config { port: 0 },
        environment: Environment::Dev,
        service_name: "catering-service-test".to_string(),
        log_level: "debug".to_string(),
        otlp_endpoint: None,
        store: StoreConfig {
            backend: StoreBackend::Memory,
            seed: true,
        },
        mongodb: MongoConfig {
            uri: "mongodb://localhost:27017".to_string(),
            database: "catering_test".to_string(),
        },
        jwt: JwtConfig {
            secret: TEST_JWT_SECRET.to_string(),
            expiry_days: 7,
        },
        google: GoogleOAuthConfig {
            client_id: "test-client-id".to_string(),
            client_secret: "test-client-secret".to_string(),
            redirect_uri: "http://localhost:5000/auth/google/callback".to_string(),
            auth_url: "https://accounts.google.com/o/oauth2/v2/auth".to_string(),
            token_url: "http://127.0.0.1:9/token".to_string(),
            userinfo_url: "http://127.0.0.1:9/userinfo".to_string(),
        },
        pricing: PricingConfig {
            tax_percentage: Decimal::new(15, 0),
            default_number_of_people: 50,
        },
        security: SecurityConfig {
            allowed_origins: vec![],
            require_auth: true,
        },
    }
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: axum::http::HeaderMap,
    pub body: Value,
}

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub token: String,
}

impl TestApp {
    /// App over the demo catalog with auth enforced.
    pub async fn spawn() -> Self {
        Self::with_store(Arc::new(InMemoryStore::with_seed(demo_catalog()))).await
    }

    /// App over an empty store.
    pub async fn empty() -> Self {
        Self::with_store(Arc::new(InMemoryStore::new())).await
    }

    pub async fn with_store(store: Arc<dyn Store>) -> Self {
        let state = AppState::new(test_config(), store).expect("Failed to build app state");
        let user = User::new(
            "google-123".to_string(),
            "chef@example.com".to_string(),
            Some("Test Chef".to_string()),
            None,
        );
        let token = state.jwt.issue(&user).expect("Failed to issue token");
        let router = build_router(state.clone());

        Self {
            router,
            state,
            token,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to execute request");

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Failed to read body");
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };

        TestResponse {
            status,
            headers,
            body,
        }
    }

    fn authed(&self, method: Method, uri: &str) -> axum::http::request::Builder {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {}", self.token))
    }

    pub async fn get(&self, uri: &str) -> TestResponse {
        let request = self
            .authed(Method::GET, uri)
            .body(Body::empty())
            .expect("Failed to build request");
        self.send(request).await
    }

    pub async fn delete(&self, uri: &str) -> TestResponse {
        let request = self
            .authed(Method::DELETE, uri)
            .body(Body::empty())
            .expect("Failed to build request");
        self.send(request).await
    }

    pub async fn post_json(&self, uri: &str, body: &Value) -> TestResponse {
        self.json(Method::POST, uri, body).await
    }

    pub async fn put_json(&self, uri: &str, body: &Value) -> TestResponse {
        self.json(Method::PUT, uri, body).await
    }

    async fn json(&self, method: Method, uri: &str, body: &Value) -> TestResponse {
        let request = self
            .authed(method, uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("Failed to build request");
        self.send(request).await
    }

    /// Id of a seeded recipe by name.
    pub async fn recipe_id(&self, name: &str) -> String {
        let response = self.get("/api/recipes").await;
        response
            .body
            .as_array()
            .and_then(|recipes| recipes.iter().find(|r| r["name"] == name))
            .and_then(|r| r["id"].as_str())
            .map(str::to_string)
            .unwrap_or_else(|| panic!("seeded recipe {} not found", name))
    }

    /// Id of the seeded demo client.
    pub async fn client_id(&self) -> String {
        let response = self.get("/api/clients").await;
        response.body[0]["id"]
            .as_str()
            .expect("seeded client missing")
            .to_string()
    }
}

pub fn as_f64(value: &Value) -> f64 {
    value.as_f64().unwrap_or_else(|| panic!("not a number: {}", value))
}

pub fn assert_close(actual: &Value, expected: f64) {
    let actual = as_f64(actual);
    assert!(
        (actual - expected).abs() < 1e-6,
        "expected {}, got {}",
        expected,
        actual
    );
}

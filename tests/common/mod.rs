#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use storefront_promotions::{
    app_router,
    config::AppConfig,
    db::{self, DbConfig},
    events::{Event, EventSender},
    health::HealthState,
    services::promotions::PromotionService,
    AppState,
};
use tokio::sync::{mpsc, Mutex};
use tower::ServiceExt;

/// Helper harness for spinning up the application backed by an in-memory SQLite database.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    events: Mutex<mpsc::Receiver<Event>>,
}

impl TestApp {
    /// Construct a new test application with fresh database state.
    pub async fn new() -> Self {
        let mut cfg = AppConfig::new(
            "sqlite::memory:".to_string(),
            "127.0.0.1".to_string(),
            18_080,
            "test".to_string(),
        );
        cfg.auto_migrate = true;
        cfg.api_default_page_size = 2;
        cfg.api_max_page_size = 5;

        // A single connection keeps every query on the same in-memory database.
        let pool = db::establish_connection_with_config(&DbConfig {
            url: cfg.database_url.clone(),
            max_connections: 1,
            min_connections: 1,
            ..Default::default()
        })
        .await
        .expect("failed to create test database");

        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let db_arc = Arc::new(pool);
        let (event_tx, event_rx) = mpsc::channel(1024);
        let event_sender = Arc::new(EventSender::new(event_tx));

        let state = AppState::new(db_arc.clone(), cfg, event_sender);
        let health = Arc::new(HealthState::new(db_arc));
        let router = app_router(state.clone(), health);

        Self {
            router,
            state,
            events: Mutex::new(event_rx),
        }
    }

    pub fn promotions(&self) -> Arc<PromotionService> {
        self.state.promotion_service()
    }

    /// Send a request against the router.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> axum::response::Response {
        self.request_with_headers(method, uri, body, &[]).await
    }

    pub async fn request_with_headers(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        headers: &[(&str, &str)],
    ) -> axum::response::Response {
        let mut builder = Request::builder().method(method).uri(uri);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }

        let body = if let Some(json) = body {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).expect("failed to serialize json request body"))
        } else {
            Body::empty()
        };

        let request = builder.body(body).expect("failed to build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    /// Sends a request with a raw, possibly malformed, JSON body.
    pub async fn request_raw(&self, method: Method, uri: &str, raw: &str) -> axum::response::Response {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(raw.to_string()))
            .expect("failed to build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    /// Creates a promotion through the admin API and returns its JSON.
    pub async fn create_promotion(&self, body: Value) -> Value {
        let response = self
            .request(Method::POST, "/api/v1/admin/promotions", Some(body))
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        response_json(response).await
    }

    /// Next published event, if one arrives shortly.
    pub async fn next_event(&self) -> Option<Event> {
        let mut events = self.events.lock().await;
        tokio::time::timeout(Duration::from_millis(200), events.recv())
            .await
            .ok()
            .flatten()
    }
}

pub async fn response_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("failed to read response body");
    serde_json::from_slice(&bytes).expect("response body is not JSON")
}

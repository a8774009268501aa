//! Storefront Promotions Library
//!
//! Promotion code admission for a storefront checkout: validation of a code
//! against an order amount, guarded redemption, and the back-office API that
//! manages promotions.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

// Core modules
pub mod commands;
pub mod config;
pub mod db;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod health;
pub mod middleware_helpers;
pub mod migrator;
pub mod models;
pub mod openapi;
pub mod services;
pub mod tracing;

use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::{compression::CompressionLayer, timeout::TimeoutLayer};

use crate::{
    config::AppConfig,
    db::DbPool,
    events::EventSender,
    health::HealthState,
    services::promotions::{Clock, PromotionService, SystemClock},
};

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DbPool>,
    pub config: AppConfig,
    pub event_sender: Arc<EventSender>,
    pub services: handlers::AppServices,
}

impl AppState {
    pub fn new(db: Arc<DbPool>, config: AppConfig, event_sender: Arc<EventSender>) -> Self {
        Self::with_clock(db, config, event_sender, Arc::new(SystemClock))
    }

    /// Builds the state with a custom clock for the promotion date checks.
    pub fn with_clock(
        db: Arc<DbPool>,
        config: AppConfig,
        event_sender: Arc<EventSender>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let promotions = PromotionService::with_clock(db.clone(), event_sender.clone(), clock)
            .with_page_sizes(config.api_default_page_size, config.api_max_page_size);

        Self {
            services: handlers::AppServices::with_promotions(promotions),
            db,
            config,
            event_sender,
        }
    }

    pub fn promotion_service(&self) -> Arc<PromotionService> {
        self.services.promotions.clone()
    }
}

/// Versioned API, nested under `/api/v1`.
pub fn api_v1_routes() -> Router<AppState> {
    Router::new()
        .nest("/promotions", handlers::promotions::promotion_routes())
        .nest(
            "/admin/promotions",
            handlers::promotions::admin_promotion_routes(),
        )
}

/// Full application router without CORS, which depends on deployment
/// configuration and is layered on by the binary.
pub fn app_router(state: AppState, health: Arc<HealthState>) -> Router {
    let request_timeout = state.config.request_timeout();

    Router::<AppState>::new()
        .route("/", get(|| async { "storefront-promotions up" }))
        .nest("/api/v1", api_v1_routes())
        .nest("/health", health::health_routes_with_state(health))
        .merge(openapi::openapi_routes())
        // HTTP tracing layer for consistent request/response telemetry
        .layer(crate::tracing::configure_http_tracing())
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(request_timeout))
        // Ensure every request carries a request id for traceability
        .layer(axum::middleware::from_fn(
            middleware_helpers::request_id::request_id_middleware,
        ))
        .with_state(state)
}

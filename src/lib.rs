//! Bookstore API
//!
//! Catalog, cart and checkout, subscription plans and reader libraries for an
//! online bookstore, served over HTTP with axum and persisted with SeaORM.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod auth;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod middleware_helpers;
pub mod migrator;
pub mod openapi;
pub mod services;
pub mod tracing;

use axum::{
    extract::Request,
    http::HeaderValue,
    middleware::{self, Next},
    response::Response,
    Router,
};
use sea_orm::DatabaseConnection;
use std::{sync::Arc, time::Instant};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    services::ServeDir,
    trace::TraceLayer,
};

use crate::{
    auth::{AuthConfig, AuthService},
    config::AppConfig,
    events::EventSender,
    handlers::{common::route_not_found, AppServices},
    middleware_helpers::{request_id_middleware, verification_key_middleware, VerificationKeys},
    services::storage::LocalFileStore,
};

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: Arc<AppConfig>,
    pub auth: Arc<AuthService>,
    pub services: AppServices,
    pub event_sender: Arc<EventSender>,
}

impl AppState {
    pub fn new(db: DatabaseConnection, config: AppConfig, event_sender: EventSender) -> Self {
        let db = Arc::new(db);
        let auth = Arc::new(AuthService::new(AuthConfig::from(&config)));
        let event_sender = Arc::new(event_sender);
        let storage = Arc::new(LocalFileStore::new(config.upload_dir.clone()));
        let services = AppServices::new(db.clone(), event_sender.clone(), auth.clone(), storage);

        Self {
            db,
            config: Arc::new(config),
            auth,
            services,
            event_sender,
        }
    }
}

/// Every API route, without state or middleware.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(handlers::health::health_routes())
        .merge(handlers::users::users_routes())
        .merge(handlers::staff::staff_routes())
        .merge(handlers::content::content_routes())
        .merge(handlers::notifications::notifications_routes())
        .merge(handlers::uploads::uploads_routes())
        .merge(handlers::catalog::books_routes())
        .merge(handlers::catalog::authors_routes())
        .merge(handlers::catalog::ratings_routes())
        .merge(handlers::catalog::favorites_routes())
        .merge(handlers::commerce::carts_routes())
        .merge(handlers::commerce::checkout_routes())
        .merge(handlers::commerce::coupons_routes())
        .merge(handlers::commerce::plans_routes())
        .merge(handlers::commerce::library_routes())
        .merge(handlers::commerce::premium_routes())
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .cors_origins()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();

    if !origins.is_empty() {
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        if !config.should_allow_permissive_cors() {
            ::tracing::warn!(
                "No CORS origins configured; set APP__CORS_ALLOWED_ORIGINS. Falling back to permissive CORS"
            );
        }
        CorsLayer::permissive()
    }
}

async fn log_requests(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let started = Instant::now();

    let response = next.run(request).await;

    ::tracing::info!(
        method = %method,
        uri = %uri,
        status = response.status().as_u16(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "request completed"
    );
    response
}

/// Builds the full application: routes, static uploads, API docs and middleware.
pub fn app_router(state: AppState) -> Router {
    let config = state.config.clone();
    let keys = VerificationKeys::new(config.verification_key_list());

    Router::new()
        .merge(api_routes())
        .nest_service("/uploads", ServeDir::new(&config.upload_dir))
        .merge(openapi::swagger_ui())
        .fallback(route_not_found)
        .layer(RequestBodyLimitLayer::new(config.max_body_bytes))
        .layer(middleware::from_fn_with_state(
            keys,
            verification_key_middleware,
        ))
        .layer(CompressionLayer::new())
        .layer(cors_layer(&config))
        .layer(middleware::from_fn(log_requests))
        .layer(TraceLayer::new_for_http().make_span_with(crate::tracing::RequestSpanMaker))
        .layer(middleware::from_fn(request_id_middleware))
        .with_state(state)
}

//! Router assembly.

use crate::handler;
use crate::middleware::{cors, rate_limit, security_headers};
use axum::Router;
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post};
use oikos_core::{IntakeService, RateLimiter};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    /// Form intake.
    pub intake: Arc<IntakeService>,
    /// Per-client request limiter for the form endpoints.
    pub limiter: Arc<RateLimiter>,
}

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route(
            "/api/contact",
            post(handler::contact).fallback(handler::method_not_allowed),
        )
        .route(
            "/api/booking",
            post(handler::booking).fallback(handler::method_not_allowed),
        )
        .route(
            "/api/get-started",
            post(handler::get_started).fallback(handler::method_not_allowed),
        )
        .route_layer(from_fn_with_state(state.clone(), rate_limit));

    let router = Router::new()
        .route("/health", get(handler::health))
        .merge(api)
        .fallback(handler::not_found)
        .with_state(state);

    security_headers()
        .into_iter()
        .fold(router, |router, layer| router.layer(layer))
        .layer(cors())
        .layer(TraceLayer::new_for_http())
}

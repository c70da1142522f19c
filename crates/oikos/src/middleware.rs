//! Request middleware and response layers.

use crate::app::AppState;
use crate::error::ApiError;
use crate::extract::ClientIp;
use axum::extract::{Request, State};
use axum::http::header::{self, HeaderName, HeaderValue};
use axum::http::Method;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tower_http::cors::{Any, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;

/// Rejects clients that exceed the configured request budget.
pub async fn rate_limit(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let key = ClientIp::from_extensions(request.extensions()).key();
    if state.limiter.check(&key) {
        next.run(request).await
    } else {
        tracing::warn!(client = %key, "rate limit exceeded");
        ApiError::TooManyRequests.into_response()
    }
}

/// CORS for the public site: any origin, simple methods, JSON bodies.
#[must_use]
pub fn cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
}

/// Fixed security headers added to every response.
#[must_use]
pub fn security_headers() -> [SetResponseHeaderLayer<HeaderValue>; 4] {
    [
        (header::X_CONTENT_TYPE_OPTIONS, "nosniff"),
        (header::X_FRAME_OPTIONS, "SAMEORIGIN"),
        (header::REFERRER_POLICY, "strict-origin-when-cross-origin"),
        (
            HeaderName::from_static("permissions-policy"),
            "geolocation=(), microphone=(), camera=()",
        ),
    ]
    .map(|(name, value)| {
        SetResponseHeaderLayer::overriding(name, HeaderValue::from_static(value))
    })
}

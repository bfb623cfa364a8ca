//! # hera-api: Axum gateway for the HERA universal API
//!
//! Every request follows the same path: parse the body, run the guardrails
//! (organization UUID, smart codes, organization scope), call one stored
//! procedure through `hera-rpc-client`, return its JSON.
//!
//! ## API Surface
//!
//! | Prefix | Module | Purpose |
//! |--------|--------|---------|
//! | `/api/universal/entities` | [`routes::entities`] | Entity upsert, read, list, delete |
//! | `/api/universal/dynamic-data` | [`routes::dynamic_data`] | Dynamic field values |
//! | `/api/universal/relationships` | [`routes::relationships`] | Relationship upsert (single or batch) |
//! | `/api/universal/transactions` | [`routes::transactions`] | Transaction emit (single or batch) and read |
//! | `/api/v2/*` | all of the above | Same handlers under the v2 prefix |
//! | `/api/v2/pos/checkout` | [`routes::pos`] | POS sale emission |
//! | `/api/v2/presets` | [`routes::presets`] | Entity preset catalog |
//! | `/api/v2/navigation` | [`routes::navigation`] | Role-filtered navigation |
//! | `/api/v2/smart-codes/validate` | [`routes::smart_codes`] | Smart code checks |
//!
//! ## Middleware Stack (execution order)
//!
//! ```text
//! TraceLayer → MetricsMiddleware → AuthMiddleware → RateLimitMiddleware → Handler
//! ```
//!
//! `/health/*` and `/metrics` are mounted outside auth.

pub mod auth;
pub mod error;
pub mod extractors;
pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod state;

use axum::extract::{DefaultBodyLimit, State};
use axum::http::StatusCode;
use axum::middleware::from_fn;
use axum::response::IntoResponse;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::auth::AuthConfig;
use crate::middleware::rate_limit::RateLimiter;
use crate::state::AppState;

/// Request bodies above this size are rejected with 413.
const BODY_LIMIT_BYTES: usize = 2 * 1024 * 1024;

/// Assemble the full application router with all routes and middleware.
pub fn app(state: AppState) -> Router {
    let auth_config = AuthConfig {
        token: state.config.auth_token.clone(),
    };
    let limiter = RateLimiter::new(state.config.rate_limit.clone());
    let metrics = state.metrics.clone();
    let metrics_on = state.config.metrics_enabled;

    // Auth runs before rate limiting so rejected callers do not consume quota.
    let mut api = Router::new()
        .merge(routes::router())
        .merge(openapi::router())
        .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
        .layer(from_fn(middleware::rate_limit::rate_limit_middleware))
        .layer(from_fn(auth::auth_middleware));

    if metrics_on {
        api = api
            .layer(from_fn(middleware::metrics::metrics_middleware))
            .layer(axum::Extension(metrics.clone()));
    }

    let api = api
        .layer(TraceLayer::new_for_http())
        .layer(axum::Extension(auth_config))
        .layer(axum::Extension(limiter))
        .with_state(state.clone());

    let mut unauthenticated = Router::new()
        .route("/health/liveness", axum::routing::get(liveness))
        .route("/health/readiness", axum::routing::get(readiness));

    if metrics_on {
        unauthenticated = unauthenticated.route("/metrics", axum::routing::get(prometheus_metrics));
    }

    Router::new()
        .merge(unauthenticated.with_state(state))
        .merge(api)
}

/// GET /metrics: Prometheus text exposition.
async fn prometheus_metrics(State(state): State<AppState>) -> impl IntoResponse {
    match state.metrics.gather_and_encode() {
        Ok(body) => (
            StatusCode::OK,
            [(
                axum::http::header::CONTENT_TYPE,
                "text/plain; version=0.0.4; charset=utf-8",
            )],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::error!("Failed to encode Prometheus metrics: {e}");
            (StatusCode::INTERNAL_SERVER_ERROR, e).into_response()
        }
    }
}

/// Liveness probe: always returns 200 if the process is running.
async fn liveness() -> &'static str {
    "ok"
}

/// Readiness probe: 200 once the database endpoint answers, 503 when it
/// does not or when no RPC client is configured.
async fn readiness(State(state): State<AppState>) -> impl IntoResponse {
    let Some(client) = state.client.as_ref() else {
        return (StatusCode::SERVICE_UNAVAILABLE, "rpc client not configured".to_string());
    };
    match client.health_check().await {
        Ok(()) => (StatusCode::OK, "ready".to_string()),
        Err(e) => {
            tracing::warn!(error = %e, "readiness check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                "database endpoint unreachable".to_string(),
            )
        }
    }
}

//! # API Routes
//!
//! | Prefix | Routes |
//! |--------|--------|
//! | `/api/universal` | entities, dynamic-data, relationships, transactions |
//! | `/api/v2` | the same resources, plus pos, presets, navigation, smart-codes |
//!
//! Handlers are thin: extract, run guardrails, check organization scope,
//! call one stored procedure, return its JSON untouched.

pub mod dynamic_data;
pub mod entities;
pub mod navigation;
pub mod pos;
pub mod presets;
pub mod relationships;
pub mod smart_codes;
pub mod transactions;

use axum::Router;
use hera_rpc_client::{HeraClient, RpcError};

use crate::error::AppError;
use crate::middleware::metrics::{ApiMetrics, RpcOutcome};
use crate::state::AppState;

/// Resource routes shared by both prefixes.
fn resources() -> Router<AppState> {
    Router::new()
        .merge(entities::router())
        .merge(dynamic_data::router())
        .merge(relationships::router())
        .merge(transactions::router())
}

/// All API routes.
pub fn router() -> Router<AppState> {
    let v2 = resources()
        .merge(pos::router())
        .merge(presets::router())
        .merge(navigation::router())
        .merge(smart_codes::router());

    Router::new()
        .nest("/api/universal", resources())
        .nest("/api/v2", v2)
}

/// Extract the RPC client from AppState or return 503.
pub(crate) fn require_client(state: &AppState) -> Result<&HeraClient, AppError> {
    state.client.as_ref().ok_or_else(|| {
        AppError::service_unavailable(
            "RPC client not configured. Set SUPABASE_URL and SUPABASE_SERVICE_ROLE_KEY.",
        )
    })
}

/// Count the outcome of a stored procedure call and convert its error.
pub(crate) fn observe<T>(
    metrics: &ApiMetrics,
    function: &str,
    result: Result<T, RpcError>,
) -> Result<T, AppError> {
    let outcome = match &result {
        Ok(_) => RpcOutcome::Ok,
        Err(RpcError::Function { .. }) => RpcOutcome::Rejected,
        Err(_) => RpcOutcome::Failed,
    };
    metrics.record_rpc(function, outcome);
    if let Err(e) = &result {
        tracing::warn!(function, error = %e, "stored procedure call failed");
    }
    result.map_err(AppError::from)
}

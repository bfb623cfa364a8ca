//! Point-of-sale checkout: build the sale transaction and emit it.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use hera_core::guardrail::require_organization_id;
use hera_core::{build_pos_emit_payload, PosSale, TransactionPayload};
use hera_rpc_client::transactions;
use serde::Serialize;
use serde_json::Value;
use utoipa::ToSchema;

use crate::auth::{ensure_org_access, CallerIdentity};
use crate::error::AppError;
use crate::extractors::extract_json;
use crate::routes::{observe, require_client};
use crate::state::AppState;

/// POS routes (v2 only).
pub fn router() -> Router<AppState> {
    Router::new().route("/pos/checkout", post(checkout))
}

/// Result of a checkout.
#[derive(Debug, Serialize, ToSchema)]
pub struct CheckoutResponse {
    /// The emitted payload, with numbered lines and totals.
    #[schema(value_type = Object)]
    pub payload: TransactionPayload,
    /// What `hera_txn_emit_v1` returned.
    #[schema(value_type = Object)]
    pub result: Value,
}

/// POST /api/v2/pos/checkout: emit a sale built from a basket.
///
/// Items become PRODUCT/SERVICE lines, followed by DISCOUNT (negative),
/// TAX and PAYMENT lines for the non-zero amounts.
#[utoipa::path(
    post,
    path = "/api/v2/pos/checkout",
    request_body(content = serde_json::Value, description = "Basket: organization_id, items [{product_id, qty, price}], discount, tax, paid"),
    responses(
        (status = 200, description = "Sale emitted", body = CheckoutResponse),
        (status = 400, description = "Invalid basket or procedure rejection", body = crate::error::ErrorBody),
        (status = 403, description = "Organization outside the caller's scope", body = crate::error::ErrorBody),
        (status = 503, description = "RPC client not configured", body = crate::error::ErrorBody),
    ),
    tag = "pos"
)]
pub async fn checkout(
    State(state): State<AppState>,
    caller: CallerIdentity,
    body: Result<Json<PosSale>, JsonRejection>,
) -> Result<Json<CheckoutResponse>, AppError> {
    let sale = extract_json(body)?;
    let payload = build_pos_emit_payload(&sale)?;
    let org = require_organization_id(Some(&payload.organization_id))?;
    ensure_org_access(&caller, &org)?;

    let client = require_client(&state)?;
    tracing::info!(
        organization_id = %org,
        items = sale.items.len(),
        total = ?payload.total_amount,
        "emitting POS sale"
    );
    let result = client.transactions().emit(&org, &payload).await;
    let result = observe(&state.metrics, transactions::EMIT, result)?;
    Ok(Json(CheckoutResponse { payload, result }))
}

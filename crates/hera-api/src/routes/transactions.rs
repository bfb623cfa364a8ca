//! # Transaction Routes
//!
//! `POST /transactions` emits one transaction (body is the payload) or a
//! batch (`{ organization_id, transactions: [...] }`). Batch items inherit
//! the batch organization when they omit it. Unnumbered lines are numbered
//! before the guardrails run.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use hera_core::guardrail::{ensure_same_organization, require_organization_id};
use hera_core::{GuardrailViolation, OrganizationId, TransactionPayload};
use hera_rpc_client::transactions;
use serde::Deserialize;
use serde_json::Value;
use utoipa::{IntoParams, ToSchema};

use crate::auth::{ensure_org_access, CallerIdentity};
use crate::error::AppError;
use crate::extractors::{extract_json, extract_query, from_body, transaction_id};
use crate::routes::{observe, require_client};
use crate::state::AppState;

/// Transaction routes.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/transactions", post(emit_transactions))
        .route("/transactions/:id", get(get_transaction))
}

/// Batch form of `POST /transactions`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct TransactionBatchBody {
    /// Organization of every transaction.
    pub organization_id: Option<String>,
    /// Transactions emitted atomically.
    #[schema(value_type = Vec<Object>)]
    pub transactions: Vec<TransactionPayload>,
}

/// Query of `GET /transactions/:id`.
#[derive(Debug, Deserialize, IntoParams)]
pub struct TransactionQuery {
    /// Owning organization.
    pub organization_id: Option<String>,
    /// Include the lines (default true).
    pub include_lines: Option<bool>,
}

#[derive(Debug)]
enum TransactionWrite {
    Single(OrganizationId, TransactionPayload),
    Batch(OrganizationId, Vec<TransactionPayload>),
}

fn check_single(mut txn: TransactionPayload) -> Result<TransactionWrite, GuardrailViolation> {
    txn.normalize()?;
    let org = txn.validate()?;
    Ok(TransactionWrite::Single(org, txn))
}

fn check_batch(batch: TransactionBatchBody) -> Result<TransactionWrite, GuardrailViolation> {
    let org = require_organization_id(batch.organization_id.as_deref())?;
    if batch.transactions.is_empty() {
        return Err(GuardrailViolation::Invalid(
            "transactions must contain at least one transaction".into(),
        ));
    }

    let mut txns = batch.transactions;
    for (i, txn) in txns.iter_mut().enumerate() {
        if txn.organization_id.trim().is_empty() {
            txn.organization_id = org.to_string();
        }
        let checked = txn.normalize().and_then(|()| txn.validate());
        let item_org = checked.map_err(|e| match e {
            GuardrailViolation::SmartCode { field, source } => GuardrailViolation::SmartCode {
                field: format!("transactions[{i}].{field}"),
                source,
            },
            GuardrailViolation::Invalid(msg) => {
                GuardrailViolation::Invalid(format!("transactions[{i}]: {msg}"))
            }
            other => other,
        })?;
        ensure_same_organization(
            &format!("transactions[{i}].organization_id"),
            &org,
            Some(&item_org),
        )?;
    }
    Ok(TransactionWrite::Batch(org, txns))
}

/// POST /api/universal/transactions: emit one transaction or a batch.
#[utoipa::path(
    post,
    path = "/api/universal/transactions",
    request_body(content = TransactionBatchBody, description = "A batch, or a single transaction payload at the top level"),
    responses(
        (status = 200, description = "Procedure result"),
        (status = 400, description = "Guardrail failure or procedure rejection", body = crate::error::ErrorBody),
        (status = 403, description = "Organization outside the caller's scope", body = crate::error::ErrorBody),
        (status = 503, description = "RPC client not configured", body = crate::error::ErrorBody),
    ),
    tag = "transactions"
)]
pub async fn emit_transactions(
    State(state): State<AppState>,
    caller: CallerIdentity,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let body = extract_json(body)?;
    let write = if body.get("transactions").is_some() {
        check_batch(from_body(body)?)?
    } else {
        check_single(from_body(body)?)?
    };

    match write {
        TransactionWrite::Single(org, txn) => {
            ensure_org_access(&caller, &org)?;
            let client = require_client(&state)?;
            tracing::debug!(
                organization_id = %org,
                transaction_type = %txn.transaction_type,
                lines = txn.lines.len(),
                "forwarding transaction"
            );
            let result = client.transactions().emit(&org, &txn).await;
            observe(&state.metrics, transactions::EMIT, result).map(Json)
        }
        TransactionWrite::Batch(org, txns) => {
            ensure_org_access(&caller, &org)?;
            let client = require_client(&state)?;
            let result = client.transactions().emit_batch(&org, &txns).await;
            observe(&state.metrics, transactions::EMIT_BATCH, result).map(Json)
        }
    }
}

/// GET /api/universal/transactions/{id}: read a transaction.
#[utoipa::path(
    get,
    path = "/api/universal/transactions/:id",
    params(
        ("id" = String, Path, description = "Transaction UUID"),
        TransactionQuery,
    ),
    responses(
        (status = 200, description = "Transaction found"),
        (status = 404, description = "Transaction not found", body = crate::error::ErrorBody),
        (status = 503, description = "RPC client not configured", body = crate::error::ErrorBody),
    ),
    tag = "transactions"
)]
pub async fn get_transaction(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<String>,
    query: Result<Query<TransactionQuery>, QueryRejection>,
) -> Result<Json<Value>, AppError> {
    let query = extract_query(query)?;
    let org = require_organization_id(query.organization_id.as_deref())?;
    let id = transaction_id("id", &id)?;
    ensure_org_access(&caller, &org)?;

    let client = require_client(&state)?;
    let result = client
        .transactions()
        .read(&org, &id, query.include_lines.unwrap_or(true))
        .await;
    observe(&state.metrics, transactions::READ, result)?
        .map(Json)
        .ok_or_else(|| AppError::not_found(format!("transaction {id} not found")))
}

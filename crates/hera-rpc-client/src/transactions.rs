//! Typed client for the transaction procedures.
//!
//! `hera_txn_emit_v1` takes the header and lines as separate arguments; the
//! batch variant takes whole payloads and emits them atomically.

use hera_core::{OrganizationId, TransactionId, TransactionLine, TransactionPayload};
use serde::Serialize;
use serde_json::Value;

use crate::entities::first_row;
use crate::error::RpcError;
use crate::Rpc;

pub const EMIT: &str = "hera_txn_emit_v1";
pub const EMIT_BATCH: &str = "hera_txn_emit_batch_v1";
pub const READ: &str = "hera_txn_read_v1";

#[derive(Serialize)]
struct EmitParams<'a> {
    p_organization_id: &'a OrganizationId,
    p_transaction: Value,
    p_lines: &'a [TransactionLine],
}

#[derive(Serialize)]
struct BatchParams<'a> {
    p_organization_id: &'a OrganizationId,
    p_transactions: &'a [TransactionPayload],
}

#[derive(Serialize)]
struct ReadParams<'a> {
    p_organization_id: &'a OrganizationId,
    p_transaction_id: &'a TransactionId,
    p_include_lines: bool,
}

/// Client for the transaction procedures.
#[derive(Debug, Clone)]
pub struct TransactionClient {
    rpc: Rpc,
}

impl TransactionClient {
    pub(crate) fn new(rpc: Rpc) -> Self {
        Self { rpc }
    }

    /// Emit one transaction.
    pub async fn emit(
        &self,
        org: &OrganizationId,
        txn: &TransactionPayload,
    ) -> Result<Value, RpcError> {
        let params = EmitParams {
            p_organization_id: org,
            p_transaction: header_of(txn, EMIT)?,
            p_lines: &txn.lines,
        };
        self.rpc.call(EMIT, &params).await
    }

    /// Emit several transactions atomically.
    pub async fn emit_batch(
        &self,
        org: &OrganizationId,
        txns: &[TransactionPayload],
    ) -> Result<Value, RpcError> {
        let params = BatchParams {
            p_organization_id: org,
            p_transactions: txns,
        };
        self.rpc.call(EMIT_BATCH, &params).await
    }

    /// Read a transaction, optionally with its lines.
    ///
    /// Returns `Ok(None)` when the procedure returns nothing for the id.
    pub async fn read(
        &self,
        org: &OrganizationId,
        id: &TransactionId,
        include_lines: bool,
    ) -> Result<Option<Value>, RpcError> {
        let params = ReadParams {
            p_organization_id: org,
            p_transaction_id: id,
            p_include_lines: include_lines,
        };
        Ok(first_row(self.rpc.call(READ, &params).await?))
    }
}

/// Header fields of a payload: everything except the lines and the
/// organization, which travel as their own arguments.
fn header_of(txn: &TransactionPayload, function: &str) -> Result<Value, RpcError> {
    let mut header = serde_json::to_value(txn).map_err(|e| RpcError::Serialization {
        function: function.into(),
        source: e,
    })?;
    if let Value::Object(obj) = &mut header {
        obj.remove("lines");
        obj.remove("organization_id");
    }
    Ok(header)
}

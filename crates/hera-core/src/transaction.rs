//! # Universal Transactions
//!
//! Request shape for `hera_txn_emit_v1`: one header row plus ordered lines,
//! every row tagged with a smart code. Amounts are [`Decimal`] and travel as
//! JSON strings so no precision is lost on the way to `numeric` columns.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::GuardrailViolation;
use crate::guardrail::{require_non_empty, require_organization_id, require_smart_code};
use crate::identity::OrganizationId;

/// One transaction line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionLine {
    /// 1-based position; assigned by [`TransactionPayload::normalize`] when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_number: Option<u32>,
    /// Line type, e.g. `PRODUCT`, `DISCOUNT`, `PAYMENT`.
    pub line_type: String,
    /// Entity the line refers to (product, service, staff member).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<String>,
    /// Free-text description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Quantity.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<Decimal>,
    /// Unit price.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_amount: Option<Decimal>,
    /// Signed line amount.
    pub line_amount: Decimal,
    /// Smart code of the line.
    pub smart_code: String,
    /// Arbitrary line payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_data: Option<Value>,
}

/// A transaction header with its lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionPayload {
    /// Owning organization (UUID).
    #[serde(default)]
    pub organization_id: String,
    /// Transaction type, e.g. `SALE`, `APPOINTMENT`, `JOURNAL`.
    pub transaction_type: String,
    /// Smart code of the header.
    pub smart_code: String,
    /// Human reference; generated by the database when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_code: Option<String>,
    /// Business date; the database defaults to now.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_date: Option<DateTime<Utc>>,
    /// Originating entity (customer, supplier).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_entity_id: Option<String>,
    /// Receiving entity (staff member, location).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_entity_id: Option<String>,
    /// Header total.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_amount: Option<Decimal>,
    /// ISO 4217 currency.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_currency_code: Option<String>,
    /// Domain context consumed by posting rules.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub business_context: Option<Value>,
    /// Client metadata stored verbatim.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
    /// Lines, in order.
    #[serde(default)]
    pub lines: Vec<TransactionLine>,
}

impl TransactionPayload {
    /// Guardrail checks; returns the parsed organization on success.
    pub fn validate(&self) -> Result<OrganizationId, GuardrailViolation> {
        let org = require_organization_id(Some(&self.organization_id))?;
        require_smart_code("smart_code", &self.smart_code)?;
        require_non_empty("transaction_type", &self.transaction_type)?;
        if self.lines.is_empty() {
            return Err(GuardrailViolation::Invalid(
                "lines must contain at least one line".into(),
            ));
        }

        let mut numbers = HashSet::new();
        for (i, line) in self.lines.iter().enumerate() {
            require_non_empty(&format!("lines[{i}].line_type"), &line.line_type)?;
            require_smart_code(&format!("lines[{i}].smart_code"), &line.smart_code)?;
            if let Some(n) = line.line_number {
                if n == 0 {
                    return Err(GuardrailViolation::Invalid(format!(
                        "lines[{i}].line_number must start at 1"
                    )));
                }
                if !numbers.insert(n) {
                    return Err(GuardrailViolation::Invalid(format!(
                        "lines[{i}].line_number {n} is duplicated"
                    )));
                }
            }
        }
        Ok(org)
    }

    /// Number unnumbered lines after the highest explicit line number.
    pub fn normalize(&mut self) -> Result<(), GuardrailViolation> {
        let mut next = self
            .lines
            .iter()
            .filter_map(|l| l.line_number)
            .max()
            .unwrap_or(0);
        for (i, line) in self.lines.iter_mut().enumerate() {
            if line.line_number.is_some() {
                continue;
            }
            next = next.checked_add(1).ok_or_else(|| {
                GuardrailViolation::Invalid(format!(
                    "lines[{i}].line_number cannot be assigned: numbering would exceed {}",
                    u32::MAX
                ))
            })?;
            line.line_number = Some(next);
        }
        Ok(())
    }
}

//! # Point-of-Sale Payloads
//!
//! Turns a checkout basket into the universal transaction emitted by
//! `hera_txn_emit_v1`. Line order is fixed: items, then discount, tax and
//! payment, each of the last three only when non-zero.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;

use crate::error::GuardrailViolation;
use crate::guardrail::{require_organization_id, require_smart_code};
use crate::transaction::{TransactionLine, TransactionPayload};

const DEFAULT_INDUSTRY: &str = "SALON";

/// What a basket item sells.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PosItemKind {
    /// Retail product.
    #[default]
    Product,
    /// Service (haircut, treatment).
    Service,
}

impl PosItemKind {
    fn line_type(self) -> &'static str {
        match self {
            Self::Product => "PRODUCT",
            Self::Service => "SERVICE",
        }
    }
}

/// One basket item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PosItem {
    /// Product or service entity.
    #[serde(alias = "service_id", alias = "entity_id")]
    pub product_id: String,
    /// Quantity; must be positive.
    pub qty: Decimal,
    /// Unit price; must not be negative.
    pub price: Decimal,
    /// Product or service.
    #[serde(default)]
    pub kind: PosItemKind,
    /// Optional line description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A checkout request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PosSale {
    /// Selling organization.
    #[serde(default)]
    pub organization_id: String,
    /// Industry segment of the smart codes; defaults to `SALON`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub industry: Option<String>,
    /// Buying customer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<String>,
    /// Serving staff member.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub staff_id: Option<String>,
    /// Basket.
    pub items: Vec<PosItem>,
    /// Whole-basket discount.
    #[serde(default)]
    pub discount: Decimal,
    /// Tax charged.
    #[serde(default)]
    pub tax: Decimal,
    /// Amount tendered.
    #[serde(default)]
    pub paid: Decimal,
    /// Payment method, e.g. `cash`, `card`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<String>,
    /// ISO 4217 currency.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
}

/// Checkout rejected before emission.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PosError {
    /// The basket has no items.
    #[error("a sale needs at least one item")]
    EmptySale,

    /// An item quantity is zero or negative.
    #[error("items[{0}].qty must be greater than zero")]
    NonPositiveQuantity(usize),

    /// An item price is negative.
    #[error("items[{0}].price must not be negative")]
    NegativePrice(usize),

    /// Discount, tax or paid is negative.
    #[error("{0} must not be negative")]
    NegativeAmount(&'static str),

    /// Discount larger than the basket.
    #[error("discount {discount} exceeds subtotal {subtotal}")]
    DiscountExceedsSubtotal {
        /// Requested discount.
        discount: Decimal,
        /// Basket subtotal.
        subtotal: Decimal,
    },

    /// An amount does not fit in a decimal.
    #[error("{0} overflows the supported amount range")]
    AmountOverflow(String),

    /// Organization or smart code check failed.
    #[error(transparent)]
    Guardrail(#[from] GuardrailViolation),
}

/// Build the transaction emitted for a checkout.
pub fn build_pos_emit_payload(sale: &PosSale) -> Result<TransactionPayload, PosError> {
    require_organization_id(Some(&sale.organization_id))?;
    if sale.items.is_empty() {
        return Err(PosError::EmptySale);
    }
    for (name, value) in [("discount", sale.discount), ("tax", sale.tax), ("paid", sale.paid)] {
        if value < Decimal::ZERO {
            return Err(PosError::NegativeAmount(name));
        }
    }

    let industry = sale
        .industry
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(DEFAULT_INDUSTRY)
        .to_ascii_uppercase();
    let header_code = format!("HERA.{industry}.POS.TXN.SALE.v1");
    require_smart_code("industry", &header_code)?;
    let line_code = |line_type: &str| format!("HERA.{industry}.POS.LINE.{line_type}.v1");

    let mut lines = Vec::with_capacity(sale.items.len() + 3);
    let mut subtotal = Decimal::ZERO;
    for (i, item) in sale.items.iter().enumerate() {
        if item.qty <= Decimal::ZERO {
            return Err(PosError::NonPositiveQuantity(i));
        }
        if item.price < Decimal::ZERO {
            return Err(PosError::NegativePrice(i));
        }
        let amount = item
            .qty
            .checked_mul(item.price)
            .ok_or_else(|| PosError::AmountOverflow(format!("items[{i}] qty * price")))?;
        subtotal = subtotal
            .checked_add(amount)
            .ok_or_else(|| PosError::AmountOverflow("subtotal".into()))?;
        let line_type = item.kind.line_type();
        lines.push(TransactionLine {
            line_number: None,
            line_type: line_type.into(),
            entity_id: Some(item.product_id.clone()),
            description: item.description.clone(),
            quantity: Some(item.qty),
            unit_amount: Some(item.price),
            line_amount: amount,
            smart_code: line_code(line_type),
            line_data: None,
        });
    }

    if sale.discount > subtotal {
        return Err(PosError::DiscountExceedsSubtotal {
            discount: sale.discount,
            subtotal,
        });
    }

    let mut adjustment = |line_type: &str, amount: Decimal, data: Option<serde_json::Value>| {
        lines.push(TransactionLine {
            line_number: None,
            line_type: line_type.into(),
            entity_id: None,
            description: None,
            quantity: None,
            unit_amount: None,
            line_amount: amount,
            smart_code: line_code(line_type),
            line_data: data,
        });
    };
    if !sale.discount.is_zero() {
        adjustment("DISCOUNT", -sale.discount, None);
    }
    if !sale.tax.is_zero() {
        adjustment("TAX", sale.tax, None);
    }
    if !sale.paid.is_zero() {
        let method = sale
            .payment_method
            .as_ref()
            .map(|m| json!({ "payment_method": m }));
        adjustment("PAYMENT", sale.paid, method);
    }

    let total = (subtotal - sale.discount)
        .checked_add(sale.tax)
        .ok_or_else(|| PosError::AmountOverflow("total".into()))?;
    let change_due = (sale.paid - total).max(Decimal::ZERO);

    let mut payload = TransactionPayload {
        organization_id: sale.organization_id.trim().to_string(),
        transaction_type: "SALE".into(),
        smart_code: header_code,
        transaction_code: None,
        transaction_date: None,
        source_entity_id: sale.customer_id.clone(),
        target_entity_id: sale.staff_id.clone(),
        total_amount: Some(total),
        transaction_currency_code: sale.currency.clone(),
        business_context: Some(json!({
            "channel": "POS",
            "subtotal": subtotal,
            "discount": sale.discount,
            "tax": sale.tax,
            "paid": sale.paid,
            "change_due": change_due,
            "payment_method": sale.payment_method,
        })),
        metadata: None,
        lines,
    };
    payload.normalize()?;
    payload.validate()?;
    Ok(payload)
}

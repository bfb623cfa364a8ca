//! # Dynamic Fields
//!
//! The dynamic_data table stores one typed value per (entity, field name).
//! Clients send fields as `{ field_name, field_type, field_value, smart_code }`;
//! the upsert RPC expects them keyed by name with the value placed in the
//! column matching its type:
//!
//! ```json
//! { "email": { "field_type": "text", "field_value_text": "a@b.c",
//!              "smart_code": "HERA.SALON.CUSTOMER.DYN.EMAIL.v1" } }
//! ```

use std::str::FromStr;

use chrono::{DateTime, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::GuardrailViolation;
use crate::guardrail::{require_non_empty, require_smart_code};

/// Storage type of a dynamic field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    /// Free text, stored in `field_value_text`.
    Text,
    /// Decimal number, stored in `field_value_number`.
    Number,
    /// Boolean, stored in `field_value_boolean`.
    Boolean,
    /// Date or timestamp, stored in `field_value_date`.
    Date,
    /// Arbitrary JSON, stored in `field_value_json`.
    Json,
}

impl FieldType {
    /// The dynamic_data column that holds values of this type.
    pub fn value_column(&self) -> &'static str {
        match self {
            Self::Text => "field_value_text",
            Self::Number => "field_value_number",
            Self::Boolean => "field_value_boolean",
            Self::Date => "field_value_date",
            Self::Json => "field_value_json",
        }
    }

    /// Lowercase name as used on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Date => "date",
            Self::Json => "json",
        }
    }

    /// Best-effort type for an untyped JSON value.
    pub fn infer(value: &Value) -> Self {
        match value {
            Value::Bool(_) => Self::Boolean,
            Value::Number(_) => Self::Number,
            Value::String(_) | Value::Null => Self::Text,
            Value::Array(_) | Value::Object(_) => Self::Json,
        }
    }

    /// Whether `value` can be stored as this type.
    ///
    /// `null` is accepted for every type (it clears the field).
    pub fn accepts(&self, value: &Value) -> bool {
        match (self, value) {
            (_, Value::Null) => true,
            (Self::Json, _) => true,
            (Self::Text, Value::String(_)) => true,
            (Self::Boolean, Value::Bool(_)) => true,
            (Self::Number, Value::Number(_)) => true,
            (Self::Number, Value::String(s)) => Decimal::from_str(s.trim()).is_ok(),
            (Self::Date, Value::String(s)) => is_date_like(s),
            _ => false,
        }
    }
}

fn is_date_like(s: &str) -> bool {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok() || DateTime::parse_from_rfc3339(s).is_ok()
}

/// One dynamic field value submitted with an entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DynamicFieldInput {
    /// Field name, unique per entity.
    pub field_name: String,
    /// Declared storage type; inferred from the value when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_type: Option<FieldType>,
    /// The value.
    #[serde(default)]
    pub field_value: Value,
    /// Smart code describing the field's business meaning. May be left
    /// blank when the entity's preset declares the field.
    #[serde(default)]
    pub smart_code: String,
}

impl DynamicFieldInput {
    /// Declared type, or the type inferred from the value.
    pub fn effective_type(&self) -> FieldType {
        self.field_type
            .unwrap_or_else(|| FieldType::infer(&self.field_value))
    }

    /// Guardrail checks for a single field. `path` prefixes error messages.
    pub fn validate(&self, path: &str) -> Result<(), GuardrailViolation> {
        require_non_empty(&format!("{path}.field_name"), &self.field_name)?;
        require_smart_code(&format!("{path}.smart_code"), &self.smart_code)?;
        let ty = self.effective_type();
        if !ty.accepts(&self.field_value) {
            return Err(GuardrailViolation::Invalid(format!(
                "{path}.field_value is not a valid {} value",
                ty.as_str()
            )));
        }
        Ok(())
    }

    /// Wire form of this field for the upsert RPC.
    pub fn to_rpc_value(&self) -> Value {
        let ty = self.effective_type();
        let mut obj = Map::new();
        obj.insert("field_type".into(), Value::String(ty.as_str().into()));
        obj.insert(ty.value_column().into(), self.field_value.clone());
        obj.insert("smart_code".into(), Value::String(self.smart_code.clone()));
        Value::Object(obj)
    }
}

/// Validate a list of dynamic fields, rejecting duplicate names.
pub fn validate_fields(fields: &[DynamicFieldInput], path: &str) -> Result<(), GuardrailViolation> {
    let mut seen = std::collections::HashSet::new();
    for (i, field) in fields.iter().enumerate() {
        let item = format!("{path}[{i}]");
        field.validate(&item)?;
        if !seen.insert(field.field_name.as_str()) {
            return Err(GuardrailViolation::Invalid(format!(
                "{item}.field_name \"{}\" is duplicated",
                field.field_name
            )));
        }
    }
    Ok(())
}

/// Key a field list by name for the `p_dynamic` RPC parameter.
pub fn fields_to_rpc(fields: &[DynamicFieldInput]) -> Value {
    let map: Map<String, Value> = fields
        .iter()
        .map(|f| (f.field_name.clone(), f.to_rpc_value()))
        .collect();
    Value::Object(map)
}

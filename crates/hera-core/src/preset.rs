//! # Entity Presets
//!
//! A preset is the declarative description of one business entity type: the
//! dynamic fields it carries, their storage types and UI hints, and the
//! relationships it participates in. Presets do not change what the
//! database accepts; they let the gateway reject obviously wrong dynamic
//! values (a `"yes"` in a boolean field, a missing required field on create)
//! before the round trip.
//!
//! Presets compose:
//!
//! - [`with_mixins`] adds shared field groups (contact details, pricing)
//!   that the base preset does not already declare. The base wins.
//! - [`with_overlay`] applies an organization- or industry-specific
//!   customisation on top. The overlay wins.
//!
//! Both are pure and return a new preset.

use serde::{Deserialize, Serialize};

use crate::dynamic::{DynamicFieldInput, FieldType};
use crate::error::{GuardrailViolation, PresetError};
use crate::smart_code::SmartCode;

/// Presentation hints consumed by form renderers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UiHints {
    /// Widget name, e.g. `text`, `currency`, `select`, `date`, `toggle`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub widget: Option<String>,
    /// Human label; renderers fall back to the field name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Placeholder text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    /// Allowed values for `select` widgets.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
    /// Sort key within the form.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<i32>,
}

/// Declaration of one dynamic field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DynamicFieldDef {
    /// Field name, unique within the preset.
    pub name: String,
    /// Storage type.
    pub field_type: FieldType,
    /// Smart code stamped on stored values.
    pub smart_code: String,
    /// Must be present when the entity is created.
    #[serde(default)]
    pub required: bool,
    /// Presentation hints.
    #[serde(default)]
    pub ui: UiHints,
}

/// How many targets a relationship may point at.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cardinality {
    /// At most one target.
    One,
    /// Any number of targets.
    #[default]
    Many,
}

/// Declaration of a relationship from this entity type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipDef {
    /// Relationship type, e.g. `HAS_CATEGORY`.
    pub relationship_type: String,
    /// Smart code stamped on the relationship row.
    pub smart_code: String,
    /// Entity type of the target, when constrained.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_entity_type: Option<String>,
    /// Cardinality.
    #[serde(default)]
    pub cardinality: Cardinality,
}

/// Complete description of an entity type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityPreset {
    /// Entity type, stored uppercase, e.g. `CUSTOMER`.
    pub entity_type: String,
    /// Display label.
    pub label: String,
    /// Smart code stamped on entity rows of this type.
    pub smart_code: String,
    /// Dynamic field declarations, in form order.
    #[serde(default)]
    pub dynamic_fields: Vec<DynamicFieldDef>,
    /// Relationship declarations.
    #[serde(default)]
    pub relationships: Vec<RelationshipDef>,
}

/// A reusable group of fields and relationships.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresetMixin {
    /// Fields contributed by the mixin.
    #[serde(default)]
    pub dynamic_fields: Vec<DynamicFieldDef>,
    /// Relationships contributed by the mixin.
    #[serde(default)]
    pub relationships: Vec<RelationshipDef>,
}

/// A customisation applied on top of a base preset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresetOverlay {
    /// Replacement label.
    #[serde(default)]
    pub label: Option<String>,
    /// Replacement entity smart code.
    #[serde(default)]
    pub smart_code: Option<String>,
    /// Fields to replace (same name) or append (new name).
    #[serde(default)]
    pub dynamic_fields: Vec<DynamicFieldDef>,
    /// Relationships to replace (same type) or append (new type).
    #[serde(default)]
    pub relationships: Vec<RelationshipDef>,
    /// Field names to drop from the base.
    #[serde(default)]
    pub remove_fields: Vec<String>,
}

/// Merge `overlay` onto `base`; overlay entries win.
///
/// Same-named fields are replaced in place, so form order is stable; new
/// fields are appended in overlay order. Relationships merge by type the
/// same way. `remove_fields` is applied after merging.
pub fn with_overlay(base: &EntityPreset, overlay: &PresetOverlay) -> EntityPreset {
    let mut out = base.clone();
    if let Some(label) = &overlay.label {
        out.label = label.clone();
    }
    if let Some(code) = &overlay.smart_code {
        out.smart_code = code.clone();
    }

    for field in &overlay.dynamic_fields {
        match out.dynamic_fields.iter_mut().find(|f| f.name == field.name) {
            Some(existing) => *existing = field.clone(),
            None => out.dynamic_fields.push(field.clone()),
        }
    }
    for rel in &overlay.relationships {
        match out
            .relationships
            .iter_mut()
            .find(|r| r.relationship_type == rel.relationship_type)
        {
            Some(existing) => *existing = rel.clone(),
            None => out.relationships.push(rel.clone()),
        }
    }

    out.dynamic_fields
        .retain(|f| !overlay.remove_fields.iter().any(|r| r == &f.name));
    out
}

/// Append mixin fields and relationships the base does not declare; base wins.
///
/// Mixins are applied in order, so an earlier mixin also wins over a later one.
pub fn with_mixins<'a, I>(base: &EntityPreset, mixins: I) -> EntityPreset
where
    I: IntoIterator<Item = &'a PresetMixin>,
{
    let mut out = base.clone();
    for mixin in mixins {
        for field in &mixin.dynamic_fields {
            if !out.dynamic_fields.iter().any(|f| f.name == field.name) {
                out.dynamic_fields.push(field.clone());
            }
        }
        for rel in &mixin.relationships {
            if !out
                .relationships
                .iter()
                .any(|r| r.relationship_type == rel.relationship_type)
            {
                out.relationships.push(rel.clone());
            }
        }
    }
    out
}

impl EntityPreset {
    /// Look up a field declaration by name.
    pub fn field(&self, name: &str) -> Option<&DynamicFieldDef> {
        self.dynamic_fields.iter().find(|f| f.name == name)
    }

    /// Names of fields that must be present on create.
    pub fn required_fields(&self) -> impl Iterator<Item = &str> {
        self.dynamic_fields
            .iter()
            .filter(|f| f.required)
            .map(|f| f.name.as_str())
    }

    /// Check every smart code the preset declares.
    pub fn check_smart_codes(&self) -> Result<(), PresetError> {
        let at = |path: String| move |source| PresetError::SmartCode { path, source };
        let base = format!("presets[{}]", self.entity_type);

        SmartCode::parse(self.smart_code.as_str()).map_err(at(format!("{base}.smart_code")))?;
        for f in &self.dynamic_fields {
            SmartCode::parse(f.smart_code.as_str())
                .map_err(at(format!("{base}.dynamic_fields[{}]", f.name)))?;
        }
        for r in &self.relationships {
            SmartCode::parse(r.smart_code.as_str())
                .map_err(at(format!("{base}.relationships[{}]", r.relationship_type)))?;
        }
        Ok(())
    }

    /// Type-check submitted dynamic fields against the declarations.
    ///
    /// Fields the preset does not declare are allowed through: the store is
    /// open-ended and organizations add their own. When `creating`, every
    /// required field must be present with a non-null value.
    pub fn validate_dynamic_fields(
        &self,
        fields: &[DynamicFieldInput],
        creating: bool,
    ) -> Result<(), GuardrailViolation> {
        for input in fields {
            let Some(def) = self.field(&input.field_name) else {
                continue;
            };
            if let Some(declared) = input.field_type {
                if declared != def.field_type {
                    return Err(GuardrailViolation::Invalid(format!(
                        "{} field \"{}\" is declared as {}, got {}",
                        self.entity_type,
                        def.name,
                        def.field_type.as_str(),
                        declared.as_str()
                    )));
                }
            }
            if !def.field_type.accepts(&input.field_value) {
                return Err(GuardrailViolation::Invalid(format!(
                    "{} field \"{}\" expects a {} value",
                    self.entity_type,
                    def.name,
                    def.field_type.as_str()
                )));
            }
        }

        if creating {
            let missing: Vec<&str> = self
                .required_fields()
                .filter(|name| {
                    !fields
                        .iter()
                        .any(|f| f.field_name == *name && !f.field_value.is_null())
                })
                .collect();
            if !missing.is_empty() {
                return Err(GuardrailViolation::Invalid(format!(
                    "{} requires dynamic fields: {}",
                    self.entity_type,
                    missing.join(", ")
                )));
            }
        }
        Ok(())
    }

    /// Fill in `field_type` and `smart_code` for inputs that match a
    /// declaration but omitted them.
    pub fn complete_inputs(&self, fields: &mut [DynamicFieldInput]) {
        for input in fields.iter_mut() {
            if let Some(def) = self.field(&input.field_name) {
                if input.field_type.is_none() {
                    input.field_type = Some(def.field_type);
                }
                if input.smart_code.trim().is_empty() {
                    input.smart_code = def.smart_code.clone();
                }
            }
        }
    }
}

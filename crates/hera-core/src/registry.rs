//! # Preset Registry
//!
//! Loads entity presets from a YAML document and resolves mixins and
//! overlays at load time, so lookups at request time are a map read.
//!
//! ## Document format
//!
//! ```yaml
//! mixins:
//!   contact:
//!     dynamic_fields:
//!       - { name: phone, field_type: text, smart_code: HERA.SALON.CRM.DYN.PHONE.v1 }
//! presets:
//!   - entity_type: CUSTOMER
//!     label: Customer
//!     smart_code: HERA.SALON.CRM.ENTITY.CUSTOMER.v1
//!     mixins: [contact]
//! overlays:
//!   CUSTOMER:
//!     label: Client
//! ```
//!
//! Every smart code in the document is validated; the first malformed one
//! fails the load with its location.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use crate::error::PresetError;
use crate::preset::{with_mixins, with_overlay, EntityPreset, PresetMixin, PresetOverlay};
use crate::smart_code::SmartCode;

const BUILTIN_SALON: &str = include_str!("../presets/salon.yaml");

#[derive(Debug, Deserialize)]
struct PresetDocument {
    #[serde(default)]
    mixins: BTreeMap<String, PresetMixin>,
    #[serde(default)]
    presets: Vec<PresetEntry>,
    #[serde(default)]
    overlays: BTreeMap<String, PresetOverlay>,
}

#[derive(Debug, Deserialize)]
struct PresetEntry {
    #[serde(flatten)]
    preset: EntityPreset,
    #[serde(default)]
    mixins: Vec<String>,
}

/// Resolved presets keyed by uppercase entity type.
#[derive(Debug, Clone, Default)]
pub struct PresetRegistry {
    presets: BTreeMap<String, EntityPreset>,
}

impl PresetRegistry {
    /// The preset catalog compiled into the binary.
    pub fn builtin() -> Result<Self, PresetError> {
        Self::from_yaml_str(BUILTIN_SALON)
    }

    /// Load a registry from a YAML file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, PresetError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| PresetError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let registry = Self::from_yaml_str(&raw)?;
        tracing::info!(path = %path.display(), presets = registry.len(), "loaded preset catalog");
        Ok(registry)
    }

    /// Parse and resolve a YAML preset document.
    pub fn from_yaml_str(raw: &str) -> Result<Self, PresetError> {
        let doc: PresetDocument = serde_yaml::from_str(raw)?;

        for (name, mixin) in &doc.mixins {
            for f in &mixin.dynamic_fields {
                SmartCode::parse(f.smart_code.as_str()).map_err(|source| PresetError::SmartCode {
                    path: format!("mixins[{name}].dynamic_fields[{}]", f.name),
                    source,
                })?;
            }
            for r in &mixin.relationships {
                SmartCode::parse(r.smart_code.as_str()).map_err(|source| PresetError::SmartCode {
                    path: format!("mixins[{name}].relationships[{}]", r.relationship_type),
                    source,
                })?;
            }
        }

        let mut presets = BTreeMap::new();
        for entry in doc.presets {
            let mut resolved = Vec::with_capacity(entry.mixins.len());
            for name in &entry.mixins {
                let mixin = doc.mixins.get(name).ok_or_else(|| PresetError::UnknownMixin {
                    entity_type: entry.preset.entity_type.clone(),
                    mixin: name.clone(),
                })?;
                resolved.push(mixin);
            }
            let mut preset = with_mixins(&entry.preset, resolved);
            preset.entity_type = preset.entity_type.to_ascii_uppercase();
            let key = preset.entity_type.clone();
            if presets.insert(key.clone(), preset).is_some() {
                return Err(PresetError::Duplicate(key));
            }
        }

        let mut registry = Self { presets };
        for (entity_type, overlay) in &doc.overlays {
            registry.apply_overlay(entity_type, overlay)?;
        }
        for preset in registry.presets.values() {
            preset.check_smart_codes()?;
        }
        Ok(registry)
    }

    /// Apply an overlay to an already-registered preset.
    pub fn apply_overlay(
        &mut self,
        entity_type: &str,
        overlay: &PresetOverlay,
    ) -> Result<(), PresetError> {
        let key = entity_type.to_ascii_uppercase();
        let base = self
            .presets
            .get(&key)
            .ok_or_else(|| PresetError::UnknownOverlayTarget(key.clone()))?;
        let merged = with_overlay(base, overlay);
        merged.check_smart_codes()?;
        self.presets.insert(key, merged);
        Ok(())
    }

    /// Look up a preset; entity types are case-insensitive.
    pub fn get(&self, entity_type: &str) -> Option<&EntityPreset> {
        self.presets.get(&entity_type.to_ascii_uppercase())
    }

    /// All presets, sorted by entity type.
    pub fn list(&self) -> Vec<&EntityPreset> {
        self.presets.values().collect()
    }

    /// Number of presets.
    pub fn len(&self) -> usize {
        self.presets.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.presets.is_empty()
    }
}

//! Role-based navigation filtering.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::PresetError;

const BUILTIN_NAVIGATION: &str = include_str!("../presets/navigation.yaml");

/// One navigation entry, possibly with nested children.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavItem {
    /// Stable identifier.
    pub id: String,
    /// Display label.
    pub label: String,
    /// Route.
    pub href: String,
    /// Icon name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    /// Roles allowed to see the entry; absent or empty means everyone.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roles: Option<Vec<String>>,
    /// Nested entries.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NavItem>,
}

impl NavItem {
    /// Whether a caller holding `roles` may see this entry.
    pub fn visible_to<S: AsRef<str>>(&self, roles: &[S]) -> bool {
        match self.roles.as_deref() {
            None | Some([]) => true,
            Some(allowed) => allowed
                .iter()
                .any(|a| roles.iter().any(|r| r.as_ref() == a)),
        }
    }
}

/// Keep the entries visible to `roles`, recursing into children.
///
/// An entry hidden from the caller hides its whole subtree. Order is kept.
pub fn filter_nav_by_role<S: AsRef<str>>(items: &[NavItem], roles: &[S]) -> Vec<NavItem> {
    items
        .iter()
        .filter(|item| item.visible_to(roles))
        .map(|item| NavItem {
            children: filter_nav_by_role(&item.children, roles),
            ..item.clone()
        })
        .collect()
}

/// The navigation catalog compiled into the binary.
pub fn default_navigation() -> Result<Vec<NavItem>, PresetError> {
    navigation_from_yaml_str(BUILTIN_NAVIGATION)
}

/// Parse a YAML list of navigation entries.
pub fn navigation_from_yaml_str(raw: &str) -> Result<Vec<NavItem>, PresetError> {
    Ok(serde_yaml::from_str(raw)?)
}

/// Load a navigation catalog from a YAML file.
pub fn navigation_from_path(path: impl AsRef<Path>) -> Result<Vec<NavItem>, PresetError> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path).map_err(|source| PresetError::Io {
        path: path.display().to_string(),
        source,
    })?;
    navigation_from_yaml_str(&raw)
}

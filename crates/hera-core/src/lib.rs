#![deny(missing_docs)]

//! # hera-core: Foundational Types for the HERA Universal API
//!
//! Every business object in HERA is stored in the same six generic tables
//! (organizations, entities, dynamic_data, relationships, transactions,
//! transaction_lines). The database functions that enforce business rules
//! live outside this workspace; this crate holds what the gateway checks
//! before it forwards a request:
//!
//! - [`SmartCode`]: the `HERA.<DOMAIN>...v<N>` taxonomy tag carried by every
//!   entity, field, relationship, transaction and line.
//! - [`OrganizationId`] and friends: UUID newtypes; every request is scoped
//!   to exactly one organization.
//! - [`guardrail`]: single-pass shape checks (org present, smart codes well
//!   formed, same organization across batch items).
//! - [`preset`] / [`registry`]: declarative entity presets with overlay and
//!   mixin composition, used to type-check dynamic fields.
//! - [`nav`]: role-based navigation filtering.
//! - [`pos`]: point-of-sale checkout to transaction payload builder.
//!
//! ## Design Principles
//!
//! 1. **Newtypes at the boundary.** A raw string never reaches the RPC layer
//!    where a [`SmartCode`] or [`OrganizationId`] is expected.
//! 2. **Pure functions.** Nothing here performs I/O except
//!    [`registry::PresetRegistry::from_path`].
//! 3. **Structured errors.** `thiserror` enums, no `.unwrap()` outside tests.

pub mod dynamic;
pub mod error;
pub mod guardrail;
pub mod identity;
pub mod nav;
pub mod pos;
pub mod preset;
pub mod registry;
pub mod smart_code;
pub mod transaction;

pub use dynamic::{DynamicFieldInput, FieldType};
pub use error::{GuardrailViolation, PresetError, ValidationError};
pub use identity::{EntityId, OrganizationId, TransactionId};
pub use nav::{default_navigation, filter_nav_by_role, NavItem};
pub use pos::{build_pos_emit_payload, PosError, PosItem, PosItemKind, PosSale};
pub use preset::{with_mixins, with_overlay, DynamicFieldDef, EntityPreset, RelationshipDef};
pub use registry::PresetRegistry;
pub use smart_code::{is_valid_smart_code, SmartCode};
pub use transaction::{TransactionLine, TransactionPayload};

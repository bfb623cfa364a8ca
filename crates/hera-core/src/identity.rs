//! # Identifier Newtypes
//!
//! UUID newtypes for the identifiers that cross the RPC boundary. Each is a
//! distinct type, so an [`EntityId`] cannot be passed where an
//! [`OrganizationId`] is expected. All three serialize transparently as the
//! hyphenated UUID string.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;

macro_rules! uuid_newtype {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Create a new random identifier.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Wrap an existing UUID.
            pub fn from_uuid(id: Uuid) -> Self {
                Self(id)
            }

            /// Access the underlying UUID.
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }

            /// Parse from the textual UUID form.
            ///
            /// # Errors
            ///
            /// Returns [`ValidationError::InvalidUuid`] if `raw` is not a UUID.
            pub fn parse(raw: &str) -> Result<Self, ValidationError> {
                Uuid::parse_str(raw.trim())
                    .map(Self)
                    .map_err(|_| ValidationError::InvalidUuid {
                        kind: $kind,
                        value: raw.to_string(),
                    })
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s)
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }
    };
}

uuid_newtype!(
    /// Tenant identifier. Every row in the six tables belongs to exactly one
    /// organization, and every RPC call is scoped by one.
    OrganizationId,
    "organization_id"
);

uuid_newtype!(
    /// Identifier of a row in the entities table (customer, product, staff, ...).
    EntityId,
    "entity_id"
);

uuid_newtype!(
    /// Identifier of a row in the transactions table.
    TransactionId,
    "transaction_id"
);

//! Identifier newtypes shared by the storage, service and HTTP layers.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            #[must_use]
            pub const fn new(id: i64) -> Self {
                Self(id)
            }

            #[must_use]
            pub const fn get(self) -> i64 {
                self.0
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = CoreError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim()
                    .parse::<i64>()
                    .map(Self)
                    .map_err(|e| CoreError::ParseError(format!("invalid {}: {s:?} ({e})", $label)))
            }
        }
    };
}

define_id!(
    /// Identifier of an actor (user account).
    UserId,
    "user id"
);
define_id!(
    /// Identifier of a tenant.
    TenantId,
    "tenant id"
);
define_id!(
    /// Identifier of a workspace inside a tenant.
    WorkspaceId,
    "workspace id"
);

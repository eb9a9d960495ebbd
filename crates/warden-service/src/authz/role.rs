//! Role vocabulary.
//!
//! The same identifiers name global roles (on the actor) and workspace roles
//! (on a membership). Parsing never fails: anything outside the vocabulary
//! becomes [`Role::Unrecognized`], which carries no standing permissions.

use serde::{Deserialize, Serialize};

/// A role identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    /// Implicit `{*, *, global}` grant. Never consults the role matrix.
    Owner,
    Admin,
    Editor,
    Author,
    Member,
    Viewer,
    /// A role name this build does not know.
    Unrecognized(String),
}

impl Role {
    /// Parse a role name. Matching is case-insensitive and ignores surrounding whitespace.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        let trimmed = value.trim();
        match trimmed.to_ascii_uppercase().as_str() {
            "OWNER" => Self::Owner,
            "ADMIN" => Self::Admin,
            "EDITOR" => Self::Editor,
            "AUTHOR" => Self::Author,
            "MEMBER" => Self::Member,
            "VIEWER" => Self::Viewer,
            _ => Self::Unrecognized(trimmed.to_string()),
        }
    }

    /// Returns the canonical role name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Owner => "OWNER",
            Self::Admin => "ADMIN",
            Self::Editor => "EDITOR",
            Self::Author => "AUTHOR",
            Self::Member => "MEMBER",
            Self::Viewer => "VIEWER",
            Self::Unrecognized(name) => name,
        }
    }

    #[must_use]
    pub const fn is_owner(&self) -> bool {
        matches!(self, Self::Owner)
    }

    #[must_use]
    pub const fn is_recognized(&self) -> bool {
        !matches!(self, Self::Unrecognized(_))
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl From<String> for Role {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        role.as_str().to_string()
    }
}

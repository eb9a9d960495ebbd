//! Database enum types with Diesel serialization.
//!
//! Each enum implements `ToSql` and `FromSql` for conversion between Rust and
//! the `PostgreSQL` CHECK-constrained text columns.

use diesel::deserialize::{self, FromSql, FromSqlRow};
use diesel::expression::AsExpression;
use diesel::pg::{Pg, PgValue};
use diesel::serialize::{self, IsNull, Output, ToSql};
use diesel::sql_types::Text;
use std::fmt;
use std::io::Write;

/// Kind of audit log entry.
///
/// Maps to `audit_log.kind` CHECK constraint.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    AsExpression,
    FromSqlRow,
    serde::Serialize,
    serde::Deserialize,
)]
#[diesel(sql_type = Text)]
pub enum AuditKind {
    /// A granted authorization decision.
    Allowed,
    /// A global or workspace role assignment.
    RoleChange,
}

impl AuditKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Allowed => "allowed",
            Self::RoleChange => "role_change",
        }
    }
}

impl ToSql<Text, Pg> for AuditKind {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Pg>) -> serialize::Result {
        out.write_all(self.as_str().as_bytes())?;
        Ok(IsNull::No)
    }
}

impl FromSql<Text, Pg> for AuditKind {
    fn from_sql(bytes: PgValue<'_>) -> deserialize::Result<Self> {
        match bytes.as_bytes() {
            b"allowed" => Ok(Self::Allowed),
            b"role_change" => Ok(Self::RoleChange),
            _ => Err("Unrecognized enum variant".into()),
        }
    }
}

impl fmt::Display for AuditKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

use crate::db::{enums::AuditKind, schema};
use diesel::{pg::Pg, prelude::*};

#[derive(Debug, Clone, PartialEq, Eq, Identifiable, Queryable, Selectable)]
#[diesel(table_name = schema::audit_log)]
#[diesel(check_for_backend(Pg))]
pub struct AuditRow {
    pub id: i64,
    pub kind: AuditKind,
    pub actor_id: i64,
    pub subject_id: Option<i64>,
    pub tenant_id: Option<i64>,
    pub workspace_id: Option<i64>,
    pub resource: Option<String>,
    pub action: Option<String>,
    pub outcome: Option<String>,
    pub new_role: Option<String>,
    pub request_method: Option<String>,
    pub request_path: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Append-only audit entry. `id` is assigned by the database.
#[derive(Debug, Clone, PartialEq, Eq, Insertable)]
#[diesel(table_name = schema::audit_log)]
pub struct NewAuditEntry {
    pub kind: AuditKind,
    pub actor_id: i64,
    pub subject_id: Option<i64>,
    pub tenant_id: Option<i64>,
    pub workspace_id: Option<i64>,
    pub resource: Option<String>,
    pub action: Option<String>,
    pub outcome: Option<String>,
    pub new_role: Option<String>,
    pub request_method: Option<String>,
    pub request_path: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

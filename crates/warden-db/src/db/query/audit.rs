//! Audit log queries. The table is append-only.

use diesel_async::RunQueryDsl;

use crate::db::{connection::DbConnection, schema::audit_log};
use crate::error::DbResult;
use crate::model::audit::NewAuditEntry;

/// ## Summary
/// Appends one audit entry.
///
/// ## Errors
/// Returns a database error if the insert fails.
pub async fn insert_audit_entry(
    conn: &mut DbConnection<'_>,
    entry: &NewAuditEntry,
) -> DbResult<()> {
    diesel::insert_into(audit_log::table)
        .values(entry)
        .execute(conn)
        .await?;
    Ok(())
}

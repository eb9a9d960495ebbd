//! Workspace membership queries.

use diesel::prelude::*;
use diesel::upsert::excluded;
use diesel_async::RunQueryDsl;

use crate::db::{connection::DbConnection, schema::workspace_membership};
use crate::error::DbResult;
use crate::model::membership::{MembershipRow, NewMembership};

/// ## Summary
/// Loads the membership of a user in a workspace. The composite primary key
/// guarantees at most one row.
///
/// ## Errors
/// Returns a database error if the query fails.
#[tracing::instrument(skip(conn))]
pub async fn find_membership(
    conn: &mut DbConnection<'_>,
    user_id: i64,
    workspace_id: i64,
) -> DbResult<Option<MembershipRow>> {
    Ok(workspace_membership::table
        .find((user_id, workspace_id))
        .select(MembershipRow::as_select())
        .first::<MembershipRow>(conn)
        .await
        .optional()?)
}

/// ## Summary
/// Creates the membership or replaces its role when it already exists.
///
/// ## Errors
/// Returns a database error if the upsert fails.
#[tracing::instrument(skip(conn, membership), fields(
    user_id = membership.user_id,
    workspace_id = membership.workspace_id,
    role = membership.role
))]
pub async fn upsert_membership(
    conn: &mut DbConnection<'_>,
    membership: &NewMembership<'_>,
) -> DbResult<()> {
    diesel::insert_into(workspace_membership::table)
        .values(membership)
        .on_conflict((
            workspace_membership::user_id,
            workspace_membership::workspace_id,
        ))
        .do_update()
        .set((
            workspace_membership::role.eq(excluded(workspace_membership::role)),
            workspace_membership::updated_at.eq(excluded(workspace_membership::updated_at)),
        ))
        .execute(conn)
        .await?;
    Ok(())
}

/// ## Summary
/// Removes a membership when it ends.
///
/// ## Returns
/// The number of rows deleted.
///
/// ## Errors
/// Returns a database error if the delete fails.
pub async fn delete_membership(
    conn: &mut DbConnection<'_>,
    user_id: i64,
    workspace_id: i64,
) -> DbResult<usize> {
    Ok(
        diesel::delete(workspace_membership::table.find((user_id, workspace_id)))
            .execute(conn)
            .await?,
    )
}

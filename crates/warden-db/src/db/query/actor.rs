//! Actor queries.

use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::db::{connection::DbConnection, schema::actor};
use crate::error::DbResult;
use crate::model::actor::{ActorRow, NewActor};

/// ## Summary
/// Loads an actor by id.
///
/// ## Errors
/// Returns a database error if the query fails.
#[tracing::instrument(skip(conn))]
pub async fn find_actor(conn: &mut DbConnection<'_>, id: i64) -> DbResult<Option<ActorRow>> {
    Ok(actor::table
        .find(id)
        .select(ActorRow::as_select())
        .first::<ActorRow>(conn)
        .await
        .optional()?)
}

/// ## Summary
/// Inserts an actor row unless the id is taken. Provisioning belongs to the
/// identity subsystem; this exists for seeding.
///
/// ## Returns
/// The number of rows inserted (0 when the actor already exists).
///
/// ## Errors
/// Returns a database error if the insert fails.
#[tracing::instrument(skip(conn, new_actor), fields(id = new_actor.id))]
pub async fn insert_actor(conn: &mut DbConnection<'_>, new_actor: &NewActor<'_>) -> DbResult<usize> {
    Ok(diesel::insert_into(actor::table)
        .values(new_actor)
        .on_conflict(actor::id)
        .do_nothing()
        .execute(conn)
        .await?)
}

/// ## Summary
/// Replaces the global role of an actor.
///
/// ## Returns
/// The number of rows updated (0 when the actor does not exist).
///
/// ## Errors
/// Returns a database error if the update fails.
#[tracing::instrument(skip(conn))]
pub async fn update_actor_role(
    conn: &mut DbConnection<'_>,
    id: i64,
    role: &str,
) -> DbResult<usize> {
    Ok(diesel::update(actor::table.find(id))
        .set((
            actor::role.eq(role),
            actor::updated_at.eq(chrono::Utc::now()),
        ))
        .execute(conn)
        .await?)
}

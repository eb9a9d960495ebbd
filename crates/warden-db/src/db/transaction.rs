//! Transaction helper for multi-statement writes.
//!
//! ```rust,ignore
//! use diesel_async::scoped_futures::ScopedFutureExt;
//! use crate::db::transaction::with_transaction;
//!
//! with_transaction(conn, |conn| async move {
//!     actor::update_actor_role(conn, user_id, "EDITOR").await?;
//!     membership::upsert_membership(conn, &membership).await?;
//!     Ok(())
//! }.scope_boxed()).await?;
//! ```

use diesel_async::{AsyncConnection, scoped_futures::ScopedBoxFuture};

use crate::db::connection::DbConnection;
use crate::error::{DbError, DbResult};

/// ## Summary
/// Runs a database transaction and returns the closure result.
///
/// ## Errors
/// Returns any error produced by the closure, or errors raised while starting
/// or committing the transaction.
pub async fn with_transaction<'a, 'conn, T, F>(
    conn: &'a mut DbConnection<'conn>,
    callback: F,
) -> DbResult<T>
where
    F: for<'r> FnOnce(&'r mut DbConnection<'conn>) -> ScopedBoxFuture<'a, 'r, DbResult<T>>
        + Send
        + 'a,
    T: Send + 'a,
{
    conn.transaction::<_, DbError, _>(callback).await
}

//! Transaction helpers for pharmacy writes and consistent reads.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use diesel_async::scoped_futures::ScopedFutureExt;
//! use crate::db::transaction::with_transaction;
//!
//! with_transaction(&mut conn, |conn| async move {
//!     pharmacy::delete_inventory(conn, pharmacy_id).await?;
//!     pharmacy::insert_inventory(conn, pharmacy_id, &entries).await?;
//!     Ok(())
//! }.scope_boxed()).await?;
//! ```

use diesel_async::{AsyncConnection, AsyncPgConnection, scoped_futures::ScopedBoxFuture};

use crate::error::{DbError, DbResult};

/// ## Summary
/// Runs a read-write transaction and returns the closure result.
///
/// ## Errors
/// Returns any error produced by the closure, or errors raised while starting
/// or committing the transaction.
pub async fn with_transaction<'a, 'conn, T, F>(
    conn: &'conn mut AsyncPgConnection,
    callback: F,
) -> DbResult<T>
where
    F: for<'r> FnOnce(&'r mut AsyncPgConnection) -> ScopedBoxFuture<'a, 'r, DbResult<T>>
        + Send
        + 'a,
    T: Send + 'a,
    'a: 'conn,
{
    conn.transaction::<_, DbError, _>(callback).await
}

/// ## Summary
/// Runs the closure inside a read-only `REPEATABLE READ` transaction so that
/// every statement it issues observes the same snapshot.
///
/// ## Errors
/// Returns any error produced by the closure, or errors raised while starting
/// or committing the transaction.
pub async fn with_read_snapshot<'a, 'conn, T, F>(
    conn: &'conn mut AsyncPgConnection,
    callback: F,
) -> DbResult<T>
where
    F: for<'r> FnOnce(&'r mut AsyncPgConnection) -> ScopedBoxFuture<'a, 'r, DbResult<T>>
        + Send
        + 'a,
    T: Send + 'a,
    'a: 'conn,
{
    conn.build_transaction()
        .read_only()
        .repeatable_read()
        .run::<_, DbError, _>(callback)
        .await
}

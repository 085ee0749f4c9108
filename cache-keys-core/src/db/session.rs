//! Scoped database session.

use super::{Connection, Connector, Cursor, CursorOf, DbError};
use futures::future::BoxFuture;
use futures::FutureExt;
use std::fmt::Display;
use std::panic::AssertUnwindSafe;
use tracing::{debug, error, instrument, warn};

/// A connection plus one cursor, alive for the duration of [`Session::run`].
pub struct Session;

impl Session {
    /// Open a connection and a cursor, hand the cursor to `op`, then close the
    /// cursor and the connection in that order.
    ///
    /// Teardown happens whether `op` succeeds, fails or panics. Errors from
    /// `op` are logged and returned unchanged; panics resume after teardown.
    /// Failures while closing are logged and never replace `op`'s outcome.
    ///
    /// ```ignore
    /// let keys = Session::run(&connector, |cursor| {
    ///     Box::pin(async move {
    ///         cursor.execute("SELECT key FROM llm_cache_keys", &[]).await?;
    ///         cursor.fetch_all().await
    ///     })
    /// })
    /// .await?;
    /// ```
    #[instrument(skip_all)]
    pub async fn run<C, T, E, F>(connector: &C, op: F) -> Result<T, E>
    where
        C: Connector,
        T: Send,
        E: From<DbError> + Display + Send,
        F: for<'c> FnOnce(&'c mut CursorOf<C>) -> BoxFuture<'c, Result<T, E>>,
    {
        let mut connection = connector.connect().await?;

        let mut cursor = match connection.cursor(connector.row_shape()).await {
            Ok(cursor) => cursor,
            Err(e) => {
                release_connection(connection).await;
                return Err(e.into());
            }
        };
        debug!("Database session opened");

        let outcome = AssertUnwindSafe(op(&mut cursor)).catch_unwind().await;

        if let Err(e) = cursor.close().await {
            warn!(error = %e, "Failed to close cursor");
        }
        release_connection(connection).await;
        debug!("Database session closed");

        match outcome {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => {
                error!(error = %e, "An error occurred in database session");
                Err(e)
            }
            Err(panic) => std::panic::resume_unwind(panic),
        }
    }
}

async fn release_connection<C: Connection>(connection: C) {
    if let Err(e) = connection.close().await {
        warn!(error = %e, "Failed to close connection");
    }
}

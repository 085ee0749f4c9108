//! Access to the `llm_cache_keys` table.

use crate::db::{Connector, Cursor, DbError, Row, Session};
use tracing::{info, instrument};

pub const SELECT_KEYS_SQL: &str = "SELECT key FROM llm_cache_keys";
pub const INSERT_KEY_SQL: &str = "INSERT INTO llm_cache_keys (key) VALUES ($1)";

/// Cache-key operations. Every call runs in its own session.
#[derive(Debug, Clone)]
pub struct CacheKeyStore<C> {
    connector: C,
}

impl<C: Connector> CacheKeyStore<C> {
    pub fn new(connector: C) -> Self {
        Self { connector }
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }

    /// Every stored key, in storage order.
    #[instrument(skip(self))]
    pub async fn list_keys(&self) -> Result<Vec<String>, DbError> {
        let rows = Session::run(&self.connector, |cursor| {
            Box::pin(async move {
                cursor.execute(SELECT_KEYS_SQL, &[]).await?;
                cursor.fetch_all().await
            })
        })
        .await?;

        let keys = rows.iter().map(key_of).collect::<Result<Vec<_>, _>>()?;
        info!(count = keys.len(), "Listed cache keys");

        Ok(keys)
    }

    /// Insert `key` and commit. Duplicates are stored as-is.
    #[instrument(skip(self))]
    pub async fn add_key(&self, key: &str) -> Result<(), DbError> {
        let key = key.to_string();

        Session::run(&self.connector, |cursor| {
            Box::pin(async move {
                cursor.execute(INSERT_KEY_SQL, &[key.as_str()]).await?;
                cursor.commit().await
            })
        })
        .await?;

        info!("Cache key added");

        Ok(())
    }
}

fn key_of(row: &Row) -> Result<String, DbError> {
    row.column(0)
        .and_then(|value| value.as_str())
        .map(str::to_string)
        .ok_or_else(|| DbError::UnexpectedRow(format!("expected a text key, got {:?}", row)))
}

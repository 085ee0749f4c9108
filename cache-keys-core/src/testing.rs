//! In-memory stand-in for the cache-key database.
//!
//! Understands exactly the statements issued by [`crate::store`], keeps
//! uncommitted inserts per connection, counts every lifecycle call and can be
//! told to fail at a given step.

use crate::db::{Connection, Connector, Cursor, DbError, Row, RowShape};
use crate::store::{INSERT_KEY_SQL, SELECT_KEYS_SQL};
use async_trait::async_trait;
use serde_json::json;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SessionStats {
    pub connects: usize,
    pub cursors_opened: usize,
    pub statements: usize,
    pub commits: usize,
    pub cursor_closes: usize,
    pub connection_closes: usize,
}

/// Step at which the fake database fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
    Connect,
    Query,
    Commit,
}

#[derive(Default)]
struct State {
    committed: Vec<String>,
    stats: SessionStats,
    failures: Vec<Failure>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn simulated(step: &str) -> sqlx::Error {
    sqlx::Error::Protocol(format!("simulated {} failure", step))
}

#[derive(Clone, Default)]
pub struct MemoryConnector {
    state: Arc<Mutex<State>>,
    shape: RowShape,
}

impl MemoryConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_keys<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let connector = Self::new();
        lock(&connector.state)
            .committed
            .extend(keys.into_iter().map(Into::into));
        connector
    }

    pub fn row_shape(mut self, shape: RowShape) -> Self {
        self.shape = shape;
        self
    }

    pub fn fail_on(self, failure: Failure) -> Self {
        lock(&self.state).failures.push(failure);
        self
    }

    /// Committed keys, in insertion order.
    pub fn keys(&self) -> Vec<String> {
        lock(&self.state).committed.clone()
    }

    pub fn stats(&self) -> SessionStats {
        lock(&self.state).stats
    }

    fn fails_on(&self, failure: Failure) -> bool {
        lock(&self.state).failures.contains(&failure)
    }
}

#[async_trait]
impl Connector for MemoryConnector {
    type Connection = MemoryConnection;

    async fn connect(&self) -> Result<MemoryConnection, DbError> {
        lock(&self.state).stats.connects += 1;

        if self.fails_on(Failure::Connect) {
            return Err(DbError::Connect(sqlx::Error::Io(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "connection refused",
            ))));
        }

        Ok(MemoryConnection {
            connector: self.clone(),
            pending: Arc::default(),
        })
    }

    fn row_shape(&self) -> RowShape {
        self.shape
    }
}

pub struct MemoryConnection {
    connector: MemoryConnector,
    pending: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl Connection for MemoryConnection {
    type Cursor = MemoryCursor;

    async fn cursor(&mut self, shape: RowShape) -> Result<MemoryCursor, DbError> {
        lock(&self.connector.state).stats.cursors_opened += 1;

        Ok(MemoryCursor {
            connector: self.connector.clone(),
            pending: Arc::clone(&self.pending),
            shape,
            rows: Vec::new(),
            closed: false,
        })
    }

    async fn close(self) -> Result<(), DbError> {
        lock(&self.connector.state).stats.connection_closes += 1;
        lock(&self.pending).clear();
        Ok(())
    }
}

pub struct MemoryCursor {
    connector: MemoryConnector,
    pending: Arc<Mutex<Vec<String>>>,
    shape: RowShape,
    rows: Vec<Row>,
    closed: bool,
}

impl MemoryCursor {
    fn ensure_open(&self) -> Result<(), DbError> {
        if self.closed {
            return Err(DbError::CursorClosed);
        }
        Ok(())
    }
}

#[async_trait]
impl Cursor for MemoryCursor {
    async fn execute(&mut self, sql: &str, params: &[&str]) -> Result<(), DbError> {
        self.ensure_open()?;
        lock(&self.connector.state).stats.statements += 1;

        if self.connector.fails_on(Failure::Query) {
            return Err(DbError::Query(simulated("query")));
        }

        match sql {
            SELECT_KEYS_SQL => {
                let mut keys = self.connector.keys();
                keys.extend(lock(&self.pending).iter().cloned());
                let shape = self.shape;
                self.rows = keys
                    .into_iter()
                    .map(|key| Row::from_columns(shape, vec![("key".to_string(), json!(key))]))
                    .collect();
            }
            INSERT_KEY_SQL => {
                let key = params
                    .first()
                    .ok_or_else(|| DbError::Query(sqlx::Error::Protocol("missing $1".into())))?;
                lock(&self.pending).push(key.to_string());
                self.rows.clear();
            }
            other => {
                return Err(DbError::Query(sqlx::Error::Protocol(format!(
                    "unsupported statement: {}",
                    other
                ))));
            }
        }

        Ok(())
    }

    async fn fetch_all(&mut self) -> Result<Vec<Row>, DbError> {
        self.ensure_open()?;
        Ok(std::mem::take(&mut self.rows))
    }

    async fn commit(&mut self) -> Result<(), DbError> {
        self.ensure_open()?;

        if self.connector.fails_on(Failure::Commit) {
            return Err(DbError::Query(simulated("commit")));
        }

        let pending = std::mem::take(&mut *lock(&self.pending));
        let mut state = lock(&self.connector.state);
        state.committed.extend(pending);
        state.stats.commits += 1;

        Ok(())
    }

    async fn close(&mut self) -> Result<(), DbError> {
        lock(&self.connector.state).stats.cursor_closes += 1;
        self.closed = true;
        self.rows.clear();
        Ok(())
    }
}

//! Database access: connection/cursor abstractions, the scoped session that
//! owns their lifecycle, and the PostgreSQL driver behind them.

mod postgres;
mod session;

pub use postgres::{resolve_ipv4, PgConnector, PostgresConnection, PostgresCursor};
pub use session::Session;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("Failed to resolve host '{host}': {source}")]
    Resolve {
        host: String,
        #[source]
        source: std::io::Error,
    },

    #[error("No IPv4 address found for host '{0}'")]
    NoIpv4Address(String),

    #[error("Failed to connect: {0}")]
    Connect(#[source] sqlx::Error),

    #[error("Query failed: {0}")]
    Query(#[source] sqlx::Error),

    #[error("Failed to close connection: {0}")]
    Close(#[source] sqlx::Error),

    #[error("Cursor is closed")]
    CursorClosed,

    #[error("Connection still has an open cursor")]
    CursorStillOpen,

    #[error("Unexpected row: {0}")]
    UnexpectedRow(String),
}

/// How a cursor hands rows back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowShape {
    /// Positional column values.
    #[default]
    Tuple,
    /// Column values keyed by column name.
    Mapping,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Row {
    Tuple(Vec<Value>),
    Mapping(Vec<(String, Value)>),
}

impl Row {
    /// Build a row of the requested shape from `(column name, value)` pairs.
    pub fn from_columns(shape: RowShape, columns: Vec<(String, Value)>) -> Self {
        match shape {
            RowShape::Tuple => Row::Tuple(columns.into_iter().map(|(_, v)| v).collect()),
            RowShape::Mapping => Row::Mapping(columns),
        }
    }

    /// Value at position `index`, whatever the row shape.
    pub fn column(&self, index: usize) -> Option<&Value> {
        match self {
            Row::Tuple(values) => values.get(index),
            Row::Mapping(columns) => columns.get(index).map(|(_, v)| v),
        }
    }

    /// Value of column `name`. Tuple rows carry no names.
    pub fn get(&self, name: &str) -> Option<&Value> {
        match self {
            Row::Tuple(_) => None,
            Row::Mapping(columns) => columns.iter().find(|(n, _)| n == name).map(|(_, v)| v),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Row::Tuple(values) => values.len(),
            Row::Mapping(columns) => columns.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A statement executor bound to one connection.
///
/// Rows produced by the last `execute` are buffered until `fetch_all`.
#[async_trait]
pub trait Cursor: Send {
    async fn execute(&mut self, sql: &str, params: &[&str]) -> Result<(), DbError>;

    async fn fetch_all(&mut self) -> Result<Vec<Row>, DbError>;

    /// Commit the transaction open on the owning connection.
    async fn commit(&mut self) -> Result<(), DbError>;

    async fn close(&mut self) -> Result<(), DbError>;
}

#[async_trait]
pub trait Connection: Send + Sized {
    type Cursor: Cursor;

    async fn cursor(&mut self, shape: RowShape) -> Result<Self::Cursor, DbError>;

    /// Close the connection. Uncommitted work is discarded.
    async fn close(self) -> Result<(), DbError>;
}

/// Connection factory.
#[async_trait]
pub trait Connector: Send + Sync {
    type Connection: Connection;

    async fn connect(&self) -> Result<Self::Connection, DbError>;

    fn row_shape(&self) -> RowShape {
        RowShape::Tuple
    }
}

/// Cursor type produced by a connector's connections.
pub type CursorOf<C> = <<C as Connector>::Connection as Connection>::Cursor;

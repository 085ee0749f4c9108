//! PostgreSQL driver for the session abstractions.

use super::{Connection, Connector, Cursor, DbError, Row, RowShape};
use crate::config::DatabaseConfig;
use async_trait::async_trait;
use secrecy::ExposeSecret;
use serde_json::Value;
use sqlx::postgres::{PgConnectOptions, PgRow};
use sqlx::{Column, ConnectOptions, Connection as _, Row as _, TypeInfo, ValueRef};
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

/// Resolve `host` to its first IPv4 address.
pub async fn resolve_ipv4(host: &str, port: u16) -> Result<Ipv4Addr, DbError> {
    let mut addrs = tokio::net::lookup_host((host, port))
        .await
        .map_err(|source| DbError::Resolve {
            host: host.to_string(),
            source,
        })?;

    addrs
        .find_map(|addr| match addr {
            SocketAddr::V4(v4) => Some(*v4.ip()),
            SocketAddr::V6(_) => None,
        })
        .ok_or_else(|| DbError::NoIpv4Address(host.to_string()))
}

/// Opens a fresh connection per call from explicit configuration.
#[derive(Debug, Clone)]
pub struct PgConnector {
    config: DatabaseConfig,
}

impl PgConnector {
    pub fn new(config: DatabaseConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }
}

#[async_trait]
impl Connector for PgConnector {
    type Connection = PostgresConnection;

    #[instrument(skip(self), fields(host = %self.config.host, dbname = %self.config.dbname))]
    async fn connect(&self) -> Result<PostgresConnection, DbError> {
        let address = resolve_ipv4(&self.config.host, self.config.port).await?;
        debug!(address = %address, "Resolved database host");

        let conn = PgConnectOptions::new()
            .host(&address.to_string())
            .port(self.config.port)
            .username(&self.config.user)
            .password(self.config.password.expose_secret())
            .database(&self.config.dbname)
            .connect()
            .await
            .map_err(DbError::Connect)?;

        info!("Connected to PostgreSQL");

        Ok(PostgresConnection::new(conn))
    }

    fn row_shape(&self) -> RowShape {
        self.config.row_shape
    }
}

struct Shared {
    conn: sqlx::PgConnection,
    in_transaction: bool,
}

/// A live PostgreSQL connection. The first statement opens a transaction
/// that stays open until a cursor commits it or the connection closes.
pub struct PostgresConnection {
    shared: Arc<Mutex<Shared>>,
}

impl PostgresConnection {
    fn new(conn: sqlx::PgConnection) -> Self {
        Self {
            shared: Arc::new(Mutex::new(Shared {
                conn,
                in_transaction: false,
            })),
        }
    }
}

#[async_trait]
impl Connection for PostgresConnection {
    type Cursor = PostgresCursor;

    async fn cursor(&mut self, shape: RowShape) -> Result<PostgresCursor, DbError> {
        Ok(PostgresCursor {
            shared: Some(Arc::clone(&self.shared)),
            shape,
            rows: Vec::new(),
        })
    }

    async fn close(self) -> Result<(), DbError> {
        match Arc::try_unwrap(self.shared) {
            Ok(shared) => {
                let shared = shared.into_inner();
                if shared.in_transaction {
                    debug!("Discarding uncommitted transaction");
                }
                shared.conn.close().await.map_err(DbError::Close)
            }
            // The socket lives on in the cursor until that cursor is dropped.
            Err(_) => {
                warn!("Connection closed while a cursor is still open");
                Err(DbError::CursorStillOpen)
            }
        }
    }
}

pub struct PostgresCursor {
    shared: Option<Arc<Mutex<Shared>>>,
    shape: RowShape,
    rows: Vec<Row>,
}

impl PostgresCursor {
    fn shared(&self) -> Result<&Arc<Mutex<Shared>>, DbError> {
        self.shared.as_ref().ok_or(DbError::CursorClosed)
    }
}

#[async_trait]
impl Cursor for PostgresCursor {
    async fn execute(&mut self, sql: &str, params: &[&str]) -> Result<(), DbError> {
        let shape = self.shape;
        let mut state = self.shared()?.lock().await;

        if !state.in_transaction {
            sqlx::query("BEGIN")
                .execute(&mut state.conn)
                .await
                .map_err(DbError::Query)?;
            state.in_transaction = true;
        }

        let mut query = sqlx::query(sql);
        for param in params {
            query = query.bind(*param);
        }
        let rows = query
            .fetch_all(&mut state.conn)
            .await
            .map_err(DbError::Query)?;
        drop(state);

        self.rows = rows
            .iter()
            .map(|row| decode_row(row, shape))
            .collect::<Result<_, _>>()?;

        Ok(())
    }

    async fn fetch_all(&mut self) -> Result<Vec<Row>, DbError> {
        self.shared()?;
        Ok(std::mem::take(&mut self.rows))
    }

    async fn commit(&mut self) -> Result<(), DbError> {
        let mut state = self.shared()?.lock().await;

        if state.in_transaction {
            sqlx::query("COMMIT")
                .execute(&mut state.conn)
                .await
                .map_err(DbError::Query)?;
            state.in_transaction = false;
        }

        Ok(())
    }

    async fn close(&mut self) -> Result<(), DbError> {
        self.rows.clear();
        self.shared = None;
        Ok(())
    }
}

fn decode_row(row: &PgRow, shape: RowShape) -> Result<Row, DbError> {
    let columns = row
        .columns()
        .iter()
        .map(|column| {
            let value = decode_column(row, column.ordinal(), column.type_info().name())?;
            Ok::<_, DbError>((column.name().to_string(), value))
        })
        .collect::<Result<Vec<_>, DbError>>()?;

    Ok(Row::from_columns(shape, columns))
}

fn decode_column(row: &PgRow, index: usize, type_name: &str) -> Result<Value, DbError> {
    let raw = row.try_get_raw(index).map_err(DbError::Query)?;
    if raw.is_null() {
        return Ok(Value::Null);
    }

    let value = match type_name {
        "BOOL" => row.try_get::<bool, _>(index).map(Value::from),
        "INT2" => row.try_get::<i16, _>(index).map(Value::from),
        "INT4" => row.try_get::<i32, _>(index).map(Value::from),
        "INT8" => row.try_get::<i64, _>(index).map(Value::from),
        "FLOAT4" => row.try_get::<f32, _>(index).map(Value::from),
        "FLOAT8" => row.try_get::<f64, _>(index).map(Value::from),
        _ => row.try_get::<String, _>(index).map(Value::from),
    };

    value.map_err(|e| DbError::UnexpectedRow(format!("column {} ({}): {}", index, type_name, e)))
}

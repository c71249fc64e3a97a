//! PostgreSQL driver.
//!
//! Provides the `PostgresDriver` struct that implements the `SqlDriver` trait
//! for PostgreSQL databases using a single sqlx connection.

use super::{decode_as, decode_text, ColumnInfo, ConnectionDescriptor, Dialect, QueryResult, Row, SqlDriver, Value};
use crate::error::{Result, TabulaError};
use async_trait::async_trait;
use futures::TryStreamExt;
use sqlx::postgres::{PgConnection, PgRow};
use sqlx::types::chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use sqlx::types::{Decimal, JsonValue, Uuid};
use sqlx::{Column as SqlxColumn, Connection, Row as SqlxRow, TypeInfo};
use tracing::debug;

/// PostgreSQL connection.
#[derive(Debug)]
pub struct PostgresDriver {
    conn: Option<PgConnection>,
}

impl PostgresDriver {
    fn connection(&mut self) -> Result<&mut PgConnection> {
        self.conn
            .as_mut()
            .ok_or_else(|| TabulaError::internal("PostgreSQL connection already closed"))
    }
}

#[async_trait]
impl SqlDriver for PostgresDriver {
    fn dialect(&self) -> Dialect {
        Dialect::Postgres
    }

    async fn connect(descriptor: &ConnectionDescriptor) -> Result<Self>
    where
        Self: Sized,
    {
        let conn = PgConnection::connect(descriptor.conn_str.trim())
            .await
            .map_err(map_connection_error)?;
        debug!("Successfully connected to PostgreSQL");
        Ok(Self { conn: Some(conn) })
    }

    async fn fetch(&mut self, sql: &str, binds: &[&str]) -> Result<QueryResult> {
        let conn = self.connection()?;
        let mut query = sqlx::query(sql);
        for bind in binds {
            query = query.bind(bind.to_string());
        }

        let mut rows = query.fetch(conn);
        let mut result = QueryResult::default();
        while let Some(row) = rows.try_next().await.map_err(format_query_error)? {
            if result.columns.is_empty() {
                result.columns = column_info(&row);
            }
            result.rows.push(convert_row(&row));
        }

        Ok(result)
    }

    async fn execute(&mut self, sql: &str) -> Result<u64> {
        let conn = self.connection()?;
        let done = sqlx::Executor::execute(conn, sqlx::raw_sql(sql))
            .await
            .map_err(format_query_error)?;
        Ok(done.rows_affected())
    }

    async fn ping(&mut self) -> Result<()> {
        self.connection()?
            .ping()
            .await
            .map_err(|e| TabulaError::connection(e.to_string()))
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(conn) = self.conn.take() {
            conn.close()
                .await
                .map_err(|e| TabulaError::connection(e.to_string()))?;
            debug!("PostgreSQL connection closed");
        }
        Ok(())
    }
}

fn column_info(row: &PgRow) -> Vec<ColumnInfo> {
    row.columns()
        .iter()
        .map(|col| ColumnInfo::new(col.name(), col.type_info().name()))
        .collect()
}

/// Converts a sqlx PgRow to our Row type.
fn convert_row(row: &PgRow) -> Row {
    row.columns()
        .iter()
        .enumerate()
        .map(|(i, col)| convert_value(row, i, col.type_info().name()))
        .collect()
}

/// Converts a single column value from a PgRow to our Value type.
fn convert_value(row: &PgRow, index: usize, type_name: &str) -> Value {
    let decoded = match type_name {
        "BOOL" => decode_as::<_, bool>(row, index),
        "INT2" => decode_as::<_, i16>(row, index),
        "INT4" => decode_as::<_, i32>(row, index),
        "INT8" => decode_as::<_, i64>(row, index),
        "FLOAT4" => decode_as::<_, f32>(row, index),
        "FLOAT8" => decode_as::<_, f64>(row, index),
        "NUMERIC" => decode_as::<_, Decimal>(row, index),
        "DATE" => decode_as::<_, NaiveDate>(row, index),
        "TIME" => decode_as::<_, NaiveTime>(row, index),
        "TIMESTAMP" => decode_as::<_, NaiveDateTime>(row, index),
        "TIMESTAMPTZ" => decode_as::<_, DateTime<Utc>>(row, index),
        "UUID" => decode_as::<_, Uuid>(row, index),
        "JSON" | "JSONB" => decode_as::<_, JsonValue>(row, index),
        "BYTEA" => decode_as::<_, Vec<u8>>(row, index),
        _ => None,
    };

    decoded
        .or_else(|| decode_text(row, index))
        .unwrap_or_else(|| Value::Unsupported(type_name.to_string()))
}

/// Maps sqlx connection errors to user-friendly messages.
fn map_connection_error(error: sqlx::Error) -> TabulaError {
    let error_str = error.to_string().to_lowercase();

    if error_str.contains("connection refused") || error_str.contains("could not connect") {
        TabulaError::connection(format!(
            "Cannot reach the PostgreSQL server. Check that it is running. ({error})"
        ))
    } else if error_str.contains("password authentication failed")
        || error_str.contains("authentication failed")
    {
        TabulaError::connection(format!("Authentication failed. Check your credentials. ({error})"))
    } else if error_str.contains("does not exist") && error_str.contains("database") {
        TabulaError::connection(format!("Database does not exist. ({error})"))
    } else if error_str.contains("ssl") || error_str.contains("tls") {
        TabulaError::connection(format!(
            "Server requires SSL. Add '?sslmode=require' to the connection string. ({error})"
        ))
    } else {
        TabulaError::connection(error.to_string())
    }
}

/// Formats a query error, keeping PostgreSQL's detail and hint.
fn format_query_error(error: sqlx::Error) -> TabulaError {
    let Some(db_error) = error.as_database_error() else {
        return TabulaError::query(error.to_string());
    };

    let mut message = db_error.message().to_string();
    if let Some(pg_error) = db_error.try_downcast_ref::<sqlx::postgres::PgDatabaseError>() {
        if let Some(detail) = pg_error.detail() {
            message.push_str(" DETAIL: ");
            message.push_str(detail);
        }
        if let Some(hint) = pg_error.hint() {
            message.push_str(" HINT: ");
            message.push_str(hint);
        }
    }

    TabulaError::query(message)
}

//! MySQL and MariaDB driver.

use super::{decode_as, decode_text, ColumnInfo, ConnectionDescriptor, Dialect, QueryResult, Row, SqlDriver, Value};
use crate::error::{Result, TabulaError};
use async_trait::async_trait;
use futures::TryStreamExt;
use sqlx::mysql::{MySqlConnectOptions, MySqlConnection, MySqlRow};
use sqlx::types::chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use sqlx::types::{Decimal, JsonValue};
use sqlx::{Column as SqlxColumn, ConnectOptions, Connection, Row as SqlxRow, TypeInfo};
use std::str::FromStr;
use tracing::debug;

/// MySQL connection.
#[derive(Debug)]
pub struct MySqlDriver {
    conn: Option<MySqlConnection>,
}

impl MySqlDriver {
    fn connection(&mut self) -> Result<&mut MySqlConnection> {
        self.conn
            .as_mut()
            .ok_or_else(|| TabulaError::internal("MySQL connection already closed"))
    }
}

/// Connection options for the descriptor. A non-empty database name
/// replaces the one in the connection string.
pub fn connect_options(descriptor: &ConnectionDescriptor) -> Result<MySqlConnectOptions> {
    let options = MySqlConnectOptions::from_str(descriptor.conn_str.trim())
        .map_err(|e| TabulaError::config(e.to_string()))?;

    match descriptor.db_name.trim() {
        "" => Ok(options),
        database => Ok(options.database(database)),
    }
}

#[async_trait]
impl SqlDriver for MySqlDriver {
    fn dialect(&self) -> Dialect {
        Dialect::MySql
    }

    async fn connect(descriptor: &ConnectionDescriptor) -> Result<Self>
    where
        Self: Sized,
    {
        let conn = connect_options(descriptor)?
            .connect()
            .await
            .map_err(|e| TabulaError::connection(e.to_string()))?;
        debug!("Successfully connected to MySQL");
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
        while let Some(row) = rows.try_next().await.map_err(query_error)? {
            if result.columns.is_empty() {
                result.columns = row
                    .columns()
                    .iter()
                    .map(|col| ColumnInfo::new(col.name(), col.type_info().name()))
                    .collect();
            }
            result.rows.push(convert_row(&row));
        }

        Ok(result)
    }

    async fn execute(&mut self, sql: &str) -> Result<u64> {
        let conn = self.connection()?;
        let done = sqlx::Executor::execute(conn, sqlx::raw_sql(sql))
            .await
            .map_err(query_error)?;
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
            debug!("MySQL connection closed");
        }
        Ok(())
    }
}

fn convert_row(row: &MySqlRow) -> Row {
    row.columns()
        .iter()
        .enumerate()
        .map(|(i, col)| convert_value(row, i, col.type_info().name()))
        .collect()
}

fn convert_value(row: &MySqlRow, index: usize, type_name: &str) -> Value {
    let decoded = match type_name {
        "BOOLEAN" => decode_as::<_, bool>(row, index),
        t if t.ends_with("UNSIGNED") => decode_as::<_, u64>(row, index),
        "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" => decode_as::<_, i64>(row, index),
        "FLOAT" => decode_as::<_, f32>(row, index),
        "DOUBLE" => decode_as::<_, f64>(row, index),
        "DECIMAL" => decode_as::<_, Decimal>(row, index),
        "DATE" => decode_as::<_, NaiveDate>(row, index),
        "TIME" => decode_as::<_, NaiveTime>(row, index),
        "DATETIME" => decode_as::<_, NaiveDateTime>(row, index),
        "TIMESTAMP" => decode_as::<_, DateTime<Utc>>(row, index),
        "JSON" => decode_as::<_, JsonValue>(row, index),
        _ => None,
    };

    decoded
        .or_else(|| decode_text(row, index))
        .unwrap_or_else(|| Value::Unsupported(type_name.to_string()))
}

fn query_error(error: sqlx::Error) -> TabulaError {
    match error.as_database_error() {
        Some(db_error) => TabulaError::query(db_error.message().to_string()),
        None => TabulaError::query(error.to_string()),
    }
}

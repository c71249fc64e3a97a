//! SQLite driver.
//!
//! SQLite columns carry a declared type but each value has its own storage
//! class, so values are decoded by their storage class unless the declared
//! type asks for a boolean or a timestamp.

use super::{
    decode_as, decode_text, ColumnInfo, ConnectionDescriptor, Dialect, QueryResult, Row, SqlDriver,
    Value,
};
use crate::error::{Result, TabulaError};
use async_trait::async_trait;
use futures::TryStreamExt;
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection, SqliteRow};
use sqlx::types::chrono::NaiveDateTime;
use sqlx::{
    Column as SqlxColumn, ConnectOptions, Connection, Row as SqlxRow, TypeInfo, ValueRef,
};
use std::str::FromStr;
use tracing::debug;

/// SQLite connection.
#[derive(Debug)]
pub struct SqliteDriver {
    conn: Option<SqliteConnection>,
}

impl SqliteDriver {
    fn connection(&mut self) -> Result<&mut SqliteConnection> {
        self.conn
            .as_mut()
            .ok_or_else(|| TabulaError::internal("SQLite connection already closed"))
    }
}

/// Connection options for a `sqlite:` URL or a plain database path.
///
/// The database must already exist.
pub fn connect_options(source: &str) -> Result<SqliteConnectOptions> {
    if source.is_empty() {
        return Err(TabulaError::config(
            "SQLite needs a database path in --conn-str or --dbname",
        ));
    }

    if source.starts_with("sqlite:") {
        SqliteConnectOptions::from_str(source).map_err(|e| TabulaError::config(e.to_string()))
    } else {
        Ok(SqliteConnectOptions::new().filename(source))
    }
}

#[async_trait]
impl SqlDriver for SqliteDriver {
    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }

    async fn connect(descriptor: &ConnectionDescriptor) -> Result<Self>
    where
        Self: Sized,
    {
        let options = connect_options(descriptor.sqlite_source())?;
        let conn = options
            .connect()
            .await
            .map_err(|e| TabulaError::connection(e.to_string()))?;
        debug!("Opened SQLite database {}", descriptor.sqlite_source());
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
            debug!("SQLite connection closed");
        }
        Ok(())
    }
}

fn convert_row(row: &SqliteRow) -> Row {
    row.columns()
        .iter()
        .enumerate()
        .map(|(i, col)| convert_value(row, i, col.type_info().name()))
        .collect()
}

fn convert_value(row: &SqliteRow, index: usize, declared: &str) -> Value {
    let Ok(raw) = row.try_get_raw(index) else {
        return Value::Unsupported(declared.to_string());
    };
    if raw.is_null() {
        return Value::Null;
    }
    let storage = raw.type_info().name().to_string();

    let decoded = match declared {
        "BOOLEAN" => decode_as::<_, bool>(row, index),
        "DATETIME" => decode_as::<_, NaiveDateTime>(row, index),
        _ => None,
    };

    decoded
        .or_else(|| match storage.as_str() {
            "INTEGER" => decode_as::<_, i64>(row, index),
            "REAL" => decode_as::<_, f64>(row, index),
            "BLOB" => decode_as::<_, Vec<u8>>(row, index),
            _ => None,
        })
        .or_else(|| decode_text(row, index))
        .unwrap_or_else(|| Value::Unsupported(declared.to_string()))
}

fn query_error(error: sqlx::Error) -> TabulaError {
    match error.as_database_error() {
        Some(db_error) => TabulaError::query(db_error.message().to_string()),
        None => TabulaError::query(error.to_string()),
    }
}

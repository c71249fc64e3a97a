//! Engine adapters for tabula.
//!
//! Every engine implements [`EngineAdapter`], the capability set shared by
//! relational and document backends. Relational engines go through one
//! generic adapter parameterized by a [`SqlDriver`]; the document engine
//! has its own adapter driven by a small command language.

mod command;
mod dialect;
mod document;
mod mock;
mod mysql;
mod postgres;
mod relational;
mod sqlite;
mod types;

pub use command::{parse_command, Call, ParsedCommand};
pub use dialect::Dialect;
pub use document::DocumentAdapter;
pub use mock::{MockDriver, MockState};
pub use mysql::MySqlDriver;
pub use postgres::PostgresDriver;
pub use relational::{RelationalAdapter, SqlDriver};
pub use sqlite::SqliteDriver;
pub use types::{value_text, ColumnInfo, QueryResult, Row, Value};
pub(crate) use types::{decode_as, decode_text};

use crate::error::{Result, TabulaError};
use crate::render::{ArtifactKind, Table, ERROR_MARKER};
use async_trait::async_trait;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Default bound on every document-engine operation.
pub const DEFAULT_DOCUMENT_TIMEOUT: Duration = Duration::from_secs(5);

/// Default bound on every relational statement.
pub const DEFAULT_STATEMENT_TIMEOUT: Duration = Duration::from_secs(30);

/// Supported engines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Engine {
    Postgres,
    MySql,
    Sqlite,
    Mongo,
}

impl Engine {
    /// Returns the canonical engine identifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Postgres => "postgres",
            Self::MySql => "mysql",
            Self::Sqlite => "sqlite",
            Self::Mongo => "mongo",
        }
    }

    /// Parses an engine identifier, accepting the usual aliases.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "postgres" | "postgresql" => Some(Self::Postgres),
            "mysql" | "mariadb" => Some(Self::MySql),
            "sqlite" | "sqlite3" => Some(Self::Sqlite),
            "mongo" | "mongodb" => Some(Self::Mongo),
            _ => None,
        }
    }

    /// The SQL dialect, or `None` for the document engine.
    pub fn dialect(&self) -> Option<Dialect> {
        match self {
            Self::Postgres => Some(Dialect::Postgres),
            Self::MySql => Some(Dialect::MySql),
            Self::Sqlite => Some(Dialect::Sqlite),
            Self::Mongo => None,
        }
    }
}

impl FromStr for Engine {
    type Err = TabulaError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s).ok_or_else(|| TabulaError::config(format!("Engine {s} is not supported")))
    }
}

impl fmt::Display for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything needed to open the one connection of an invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionDescriptor {
    pub engine: Engine,
    pub conn_str: String,
    pub db_name: String,
}

impl ConnectionDescriptor {
    pub fn new(engine: Engine, conn_str: impl Into<String>, db_name: impl Into<String>) -> Self {
        Self {
            engine,
            conn_str: conn_str.into(),
            db_name: db_name.into(),
        }
    }

    /// SQLite accepts either a connection string or a bare database path.
    pub fn sqlite_source(&self) -> &str {
        if self.conn_str.trim().is_empty() {
            self.db_name.trim()
        } else {
            self.conn_str.trim()
        }
    }
}

/// Per-invocation engine limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineSettings {
    /// Bound on each relational statement, including connection setup.
    pub statement_timeout: Duration,

    /// Bound on connecting to and every operation of the document engine.
    pub document_timeout: Duration,
}

impl EngineSettings {
    /// Bound on a single operation of `engine`.
    pub fn operation_timeout(&self, engine: Engine) -> Duration {
        match engine {
            Engine::Mongo => self.document_timeout,
            Engine::Postgres | Engine::MySql | Engine::Sqlite => self.statement_timeout,
        }
    }
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            statement_timeout: DEFAULT_STATEMENT_TIMEOUT,
            document_timeout: DEFAULT_DOCUMENT_TIMEOUT,
        }
    }
}

/// Outcome of one batch statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatementReport {
    Affected(u64),
    Returned(usize),
    Executed,
    Failed(String),
}

impl StatementReport {
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    /// Report line for the statement at 1-based `position`.
    pub fn line(&self, position: usize) -> String {
        match self {
            Self::Affected(n) => format!("{position})   Row(s) affected: {n}"),
            Self::Returned(n) => format!("{position})   Row(s) returned: {n}"),
            Self::Executed => format!("{position})   Statement executed correctly."),
            Self::Failed(message) => format!("{position}) {ERROR_MARKER} {message}"),
        }
    }
}

/// What an adapter operation produced, before presentation.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// A non-empty table to render into a result file.
    Table { table: Table, kind: ArtifactKind },

    /// A read that returned no rows.
    Empty,

    /// A single mutating statement.
    Affected(u64),

    /// A single statement that neither reads nor mutates rows.
    Executed,

    /// A short status line (document writes).
    Message(String),

    /// One report per statement of a batch, in input order.
    Batch(Vec<StatementReport>),
}

impl Outcome {
    /// Wraps a table, collapsing an empty one to [`Outcome::Empty`].
    pub fn from_table(table: Table, kind: ArtifactKind) -> Self {
        if table.is_empty() {
            Self::Empty
        } else {
            Self::Table { table, kind }
        }
    }

    /// Builds the outcome of a relational read.
    pub fn from_result(result: &QueryResult) -> Self {
        if result.is_empty() {
            return Self::Empty;
        }
        Self::from_table(Table::from_result(result), ArtifactKind::Relational)
    }

    /// Builds the outcome of a user query, numbering its rows.
    pub fn from_select(result: &QueryResult) -> Self {
        if result.is_empty() {
            return Self::Empty;
        }
        Self::from_table(Table::numbered(result), ArtifactKind::Relational)
    }

    /// True if this is a batch with at least one failed statement.
    pub fn has_failures(&self) -> bool {
        matches!(self, Self::Batch(reports) if reports.iter().any(StatementReport::is_failure))
    }
}

/// Capability set every engine provides.
///
/// One adapter owns exactly one live connection. Callers must call
/// [`EngineAdapter::close`] on every exit path once the adapter is open.
#[async_trait]
pub trait EngineAdapter: Send {
    /// Opens the connection described by `descriptor`.
    async fn open(descriptor: &ConnectionDescriptor, settings: &EngineSettings) -> Result<Self>
    where
        Self: Sized;

    /// Lists table or collection names.
    async fn list_entities(&mut self) -> Result<Vec<String>>;

    /// Describes the columns or fields of one entity.
    async fn describe_entity(&mut self, name: &str) -> Result<Outcome>;

    /// Executes a statement, a batch, or a document command.
    async fn execute(&mut self, input: &str) -> Result<Outcome>;

    /// Checks that the connection is alive.
    async fn ping(&mut self) -> Result<()>;

    /// Releases the connection. Calling it twice is a no-op.
    async fn close(&mut self) -> Result<()>;
}

/// Opens an adapter for the descriptor's engine.
///
/// This is the central factory function for engine connections.
pub async fn connect(
    descriptor: &ConnectionDescriptor,
    settings: &EngineSettings,
) -> Result<Box<dyn EngineAdapter>> {
    match descriptor.engine {
        Engine::Postgres => {
            let adapter = RelationalAdapter::<PostgresDriver>::open(descriptor, settings).await?;
            Ok(Box::new(adapter))
        }
        Engine::MySql => {
            let adapter = RelationalAdapter::<MySqlDriver>::open(descriptor, settings).await?;
            Ok(Box::new(adapter))
        }
        Engine::Sqlite => {
            let adapter = RelationalAdapter::<SqliteDriver>::open(descriptor, settings).await?;
            Ok(Box::new(adapter))
        }
        Engine::Mongo => {
            let adapter = DocumentAdapter::open(descriptor, settings).await?;
            Ok(Box::new(adapter))
        }
    }
}

/// Awaits `future`, failing with a query error once `limit` elapses.
pub(crate) async fn with_timeout<T, F>(limit: Duration, future: F) -> Result<T>
where
    F: std::future::Future<Output = Result<T>>,
{
    tokio::time::timeout(limit, future).await.map_err(|_| {
        TabulaError::query(format!(
            "Operation timed out after {} seconds",
            limit.as_secs_f64()
        ))
    })?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_parse() {
        assert_eq!(Engine::parse("postgresql"), Some(Engine::Postgres));
        assert_eq!(Engine::parse("MariaDB"), Some(Engine::MySql));
        assert_eq!(Engine::parse("sqlite3"), Some(Engine::Sqlite));
        assert_eq!(Engine::parse("mongodb"), Some(Engine::Mongo));
        assert_eq!(Engine::parse("oracle"), None);
    }

    #[test]
    fn test_engine_from_str_error_message() {
        let err = "redis".parse::<Engine>().unwrap_err();
        assert!(err.to_string().contains("Engine redis is not supported"));
    }

    #[test]
    fn test_engine_dialect() {
        assert_eq!(Engine::MySql.dialect(), Some(Dialect::MySql));
        assert_eq!(Engine::Mongo.dialect(), None);
    }

    #[test]
    fn test_sqlite_source_prefers_conn_str() {
        let descriptor = ConnectionDescriptor::new(Engine::Sqlite, "", "/tmp/app.db");
        assert_eq!(descriptor.sqlite_source(), "/tmp/app.db");

        let descriptor = ConnectionDescriptor::new(Engine::Sqlite, "sqlite:other.db", "/tmp/app.db");
        assert_eq!(descriptor.sqlite_source(), "sqlite:other.db");
    }

    #[test]
    fn test_operation_timeout_by_engine() {
        let settings = EngineSettings {
            statement_timeout: Duration::from_secs(30),
            document_timeout: Duration::from_secs(5),
        };
        assert_eq!(settings.operation_timeout(Engine::Mongo), Duration::from_secs(5));
        assert_eq!(settings.operation_timeout(Engine::MySql), Duration::from_secs(30));
    }

    #[test]
    fn test_statement_report_lines() {
        assert_eq!(StatementReport::Affected(3).line(1), "1)   Row(s) affected: 3");
        assert_eq!(StatementReport::Returned(0).line(4), "4)   Row(s) returned: 0");
        assert_eq!(
            StatementReport::Executed.line(2),
            "2)   Statement executed correctly."
        );
        assert_eq!(
            StatementReport::Failed("no such table: t".to_string()).line(3),
            "3) ✘ no such table: t"
        );
    }

    #[test]
    fn test_outcome_from_empty_result() {
        assert_eq!(Outcome::from_result(&QueryResult::default()), Outcome::Empty);
        assert_eq!(
            Outcome::from_table(Table::new(["a"]), ArtifactKind::Document),
            Outcome::Empty
        );
    }

    #[test]
    fn test_outcome_has_failures() {
        let batch = Outcome::Batch(vec![
            StatementReport::Executed,
            StatementReport::Failed("boom".to_string()),
        ]);
        assert!(batch.has_failures());
        assert!(!Outcome::Batch(vec![StatementReport::Executed]).has_failures());
        assert!(!Outcome::Executed.has_failures());
    }

    #[tokio::test]
    async fn test_with_timeout_elapses() {
        let result: Result<()> = with_timeout(Duration::from_millis(10), async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        })
        .await;
        assert!(matches!(result, Err(TabulaError::Query(_))));
    }
}

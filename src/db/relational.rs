//! Relational engine adapter.
//!
//! Execute, list and describe are written once here. A [`SqlDriver`] only
//! knows how to talk to its server; the metadata SQL it runs comes from its
//! [`Dialect`].

use super::{
    value_text, with_timeout, ConnectionDescriptor, Dialect, EngineAdapter, EngineSettings,
    Outcome, QueryResult, StatementReport,
};
use crate::error::{Result, TabulaError};
use crate::statement::{is_mutating_statement, is_select_statement, StatementSplitter};
use async_trait::async_trait;
use tracing::{debug, error, info};

/// A single connection to one relational server.
#[async_trait]
pub trait SqlDriver: Send {
    /// Dialect used for metadata queries and batch splitting.
    fn dialect(&self) -> Dialect;

    /// Opens the connection.
    async fn connect(descriptor: &ConnectionDescriptor) -> Result<Self>
    where
        Self: Sized;

    /// Runs a row-returning statement with positional text parameters.
    async fn fetch(&mut self, sql: &str, binds: &[&str]) -> Result<QueryResult>;

    /// Runs a statement and returns the number of affected rows.
    async fn execute(&mut self, sql: &str) -> Result<u64>;

    async fn ping(&mut self) -> Result<()>;

    /// Closes the connection. Calling it twice is a no-op.
    async fn close(&mut self) -> Result<()>;
}

/// Engine adapter shared by every SQL dialect.
#[derive(Debug)]
pub struct RelationalAdapter<D> {
    driver: D,
    splitter: StatementSplitter,
    settings: EngineSettings,
    database: String,
}

impl<D: SqlDriver> RelationalAdapter<D> {
    /// Wraps an already connected driver.
    pub fn new(driver: D, settings: EngineSettings) -> Self {
        Self {
            splitter: StatementSplitter::new(driver.dialect()),
            driver,
            settings,
            database: String::new(),
        }
    }

    /// Scopes metadata queries to `database` where the dialect supports it.
    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = database.into().trim().to_string();
        self
    }

    /// The wrapped driver.
    pub fn driver(&self) -> &D {
        &self.driver
    }

    async fn execute_statement(&mut self, statement: &str) -> Result<Outcome> {
        let limit = self.settings.statement_timeout;

        if is_select_statement(statement) {
            let result = with_timeout(limit, self.driver.fetch(statement, &[])).await?;
            debug!("Statement returned {} rows", result.rows.len());
            return Ok(Outcome::from_select(&result));
        }

        let affected = with_timeout(limit, self.driver.execute(statement)).await?;
        if is_mutating_statement(statement) {
            Ok(Outcome::Affected(affected))
        } else {
            Ok(Outcome::Executed)
        }
    }

    /// Runs every statement in order; a failure never stops the rest.
    async fn execute_batch(&mut self, statements: Vec<String>) -> Outcome {
        let limit = self.settings.statement_timeout;
        let mut reports = Vec::with_capacity(statements.len());

        for (i, statement) in statements.iter().enumerate() {
            debug!("Executing batch statement {}: {}", i + 1, statement);
            let report = if is_select_statement(statement) {
                with_timeout(limit, self.driver.fetch(statement, &[]))
                    .await
                    .map(|result| StatementReport::Returned(result.rows.len()))
            } else {
                with_timeout(limit, self.driver.execute(statement))
                    .await
                    .map(|affected| {
                        if is_mutating_statement(statement) {
                            StatementReport::Affected(affected)
                        } else {
                            StatementReport::Executed
                        }
                    })
            };

            let report = match report {
                Ok(report) => report,
                Err(e) => {
                    error!("Batch statement {} failed: {}", i + 1, e);
                    StatementReport::Failed(e.to_string())
                }
            };
            reports.push(report);
        }

        Outcome::Batch(reports)
    }
}

#[async_trait]
impl<D: SqlDriver> EngineAdapter for RelationalAdapter<D> {
    async fn open(descriptor: &ConnectionDescriptor, settings: &EngineSettings) -> Result<Self>
    where
        Self: Sized,
    {
        let driver = tokio::time::timeout(settings.statement_timeout, D::connect(descriptor))
            .await
            .map_err(|_| {
                TabulaError::connection(format!(
                    "Connection timed out after {} seconds",
                    settings.statement_timeout.as_secs_f64()
                ))
            })??;
        info!("Opened {} connection", driver.dialect());
        Ok(Self::new(driver, *settings).with_database(&descriptor.db_name))
    }

    async fn list_entities(&mut self) -> Result<Vec<String>> {
        let dialect = self.driver.dialect();
        let binds = dialect.list_entities_binds(&self.database);
        let result = with_timeout(
            self.settings.statement_timeout,
            self.driver.fetch(dialect.list_entities_sql(), &binds),
        )
        .await?;

        Ok(result
            .rows
            .iter()
            .filter_map(|row| row.first())
            .map(|value| value_text(value).to_uppercase())
            .collect())
    }

    async fn describe_entity(&mut self, name: &str) -> Result<Outcome> {
        let dialect = self.driver.dialect();
        debug!("Describing {} with {} metadata query", name, dialect);
        let binds = dialect.describe_entity_binds(&self.database, name.trim());
        let result = with_timeout(
            self.settings.statement_timeout,
            self.driver.fetch(dialect.describe_entity_sql(), &binds),
        )
        .await?;
        Ok(Outcome::from_result(&result))
    }

    async fn execute(&mut self, input: &str) -> Result<Outcome> {
        let text = self.splitter.strip_comments(input);

        if self.splitter.contains_embedded_separator(&text) {
            let statements = self.splitter.split(&text);
            info!("Executing batch of {} statements", statements.len());
            return Ok(self.execute_batch(statements).await);
        }

        let statement = self
            .splitter
            .split(&text)
            .into_iter()
            .next()
            .ok_or_else(|| TabulaError::query("No statement to execute"))?;
        debug!("Executing statement: {}", statement);
        self.execute_statement(&statement).await
    }

    async fn ping(&mut self) -> Result<()> {
        with_timeout(self.settings.statement_timeout, self.driver.ping())
            .await
            .map_err(TabulaError::into_connection)
    }

    async fn close(&mut self) -> Result<()> {
        self.driver.close().await
    }
}

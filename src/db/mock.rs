//! Mock SQL driver for testing.
//!
//! Returns canned results and records every statement it receives, so the
//! relational adapter and dispatch can be exercised without a server.

use super::{ConnectionDescriptor, Dialect, QueryResult, SqlDriver};
use crate::error::{Result, TabulaError};
use async_trait::async_trait;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Default)]
struct Recorded {
    fetched: Vec<String>,
    binds: Vec<Vec<String>>,
    executed: Vec<String>,
    close_calls: usize,
    closed: bool,
}

/// Shared view of what a [`MockDriver`] has seen. Clones observe the same driver.
#[derive(Debug, Clone, Default)]
pub struct MockState(Arc<Mutex<Recorded>>);

impl MockState {
    fn lock(&self) -> MutexGuard<'_, Recorded> {
        // A poisoned lock only means another test thread panicked.
        self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Statements passed to `fetch`, in order.
    pub fn fetched(&self) -> Vec<String> {
        self.lock().fetched.clone()
    }

    /// Parameters passed to `fetch`, one entry per call.
    pub fn binds(&self) -> Vec<Vec<String>> {
        self.lock().binds.clone()
    }

    /// Statements passed to `execute`, in order.
    pub fn executed(&self) -> Vec<String> {
        self.lock().executed.clone()
    }

    pub fn close_calls(&self) -> usize {
        self.lock().close_calls
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }
}

/// A SQL driver that returns predefined results.
#[derive(Debug, Default)]
pub struct MockDriver {
    result: QueryResult,
    affected: u64,
    fail_on: Option<String>,
    dialect: Option<Dialect>,
    state: MockState,
}

impl MockDriver {
    /// Creates a driver whose reads return no rows and whose writes affect none.
    pub fn new() -> Self {
        Self::default()
    }

    /// Result returned by every `fetch`.
    pub fn with_result(mut self, result: QueryResult) -> Self {
        self.result = result;
        self
    }

    /// Row count returned by every `execute`.
    pub fn with_affected(mut self, affected: u64) -> Self {
        self.affected = affected;
        self
    }

    /// Dialect the driver reports. SQLite when unset.
    pub fn with_dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = Some(dialect);
        self
    }

    /// Fails every statement containing `pattern`.
    pub fn failing_on(mut self, pattern: impl Into<String>) -> Self {
        self.fail_on = Some(pattern.into());
        self
    }

    pub fn state(&self) -> MockState {
        self.state.clone()
    }

    fn check(&self, sql: &str) -> Result<()> {
        if self.state.is_closed() {
            return Err(TabulaError::internal("connection already closed"));
        }
        match &self.fail_on {
            Some(pattern) if sql.contains(pattern.as_str()) => Err(TabulaError::query(format!(
                "syntax error near \"{pattern}\""
            ))),
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl SqlDriver for MockDriver {
    fn dialect(&self) -> Dialect {
        self.dialect.unwrap_or(Dialect::Sqlite)
    }

    async fn connect(descriptor: &ConnectionDescriptor) -> Result<Self>
    where
        Self: Sized,
    {
        if descriptor.conn_str.contains("unreachable") {
            return Err(TabulaError::connection(format!(
                "Cannot connect to {}",
                descriptor.conn_str
            )));
        }
        let driver = Self::new();
        Ok(match descriptor.engine.dialect() {
            Some(dialect) => driver.with_dialect(dialect),
            None => driver,
        })
    }

    async fn fetch(&mut self, sql: &str, binds: &[&str]) -> Result<QueryResult> {
        {
            let mut recorded = self.state.lock();
            recorded.fetched.push(sql.to_string());
            recorded
                .binds
                .push(binds.iter().map(|b| b.to_string()).collect());
        }
        self.check(sql)?;
        Ok(self.result.clone())
    }

    async fn execute(&mut self, sql: &str) -> Result<u64> {
        self.state.lock().executed.push(sql.to_string());
        self.check(sql)?;
        Ok(self.affected)
    }

    async fn ping(&mut self) -> Result<()> {
        self.check("")
    }

    async fn close(&mut self) -> Result<()> {
        let mut recorded = self.state.lock();
        recorded.close_calls += 1;
        recorded.closed = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Engine;

    #[tokio::test]
    async fn test_mock_records_statements() {
        let mut driver = MockDriver::new().with_affected(2);
        let state = driver.state();

        assert_eq!(driver.execute("DELETE FROM t").await.unwrap(), 2);
        driver.fetch("SELECT 1", &["x"]).await.unwrap();

        assert_eq!(state.executed(), vec!["DELETE FROM t"]);
        assert_eq!(state.fetched(), vec!["SELECT 1"]);
        assert_eq!(state.binds(), vec![vec!["x".to_string()]]);
    }

    #[tokio::test]
    async fn test_mock_failing_pattern() {
        let mut driver = MockDriver::new().failing_on("oops");
        assert!(driver.execute("SELECT oops").await.is_err());
        assert!(driver.execute("SELECT fine").await.is_ok());
    }

    #[tokio::test]
    async fn test_mock_closed_driver_rejects_statements() {
        let mut driver = MockDriver::new();
        driver.close().await.unwrap();
        assert!(driver.ping().await.is_err());
        assert_eq!(driver.state().close_calls(), 1);
    }

    #[tokio::test]
    async fn test_mock_connect_failure() {
        let descriptor = ConnectionDescriptor::new(Engine::Sqlite, "unreachable", "");
        let err = MockDriver::connect(&descriptor).await.unwrap_err();
        assert!(matches!(err, TabulaError::Connection(_)));
    }

    #[tokio::test]
    async fn test_mock_dialect_follows_engine() {
        assert_eq!(MockDriver::new().dialect(), Dialect::Sqlite);

        let descriptor = ConnectionDescriptor::new(Engine::Postgres, "mock://", "");
        let driver = MockDriver::connect(&descriptor).await.unwrap();
        assert_eq!(driver.dialect(), Dialect::Postgres);
    }
}

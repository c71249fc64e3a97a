//! Integration tests for tabula.

pub mod common;
pub mod mongo_test;
pub mod mysql_test;
pub mod postgres_test;
pub mod sqlite_test;

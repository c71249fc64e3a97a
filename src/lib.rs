//! tabula - query execution backend for editor database plugins.
//!
//! Runs SQL statements and document-store commands, renders the results as
//! bordered text tables, and reports highlight directives for the editor.

pub mod cli;
pub mod config;
pub mod db;
pub mod dispatch;
pub mod error;
pub mod logging;
pub mod render;
pub mod statement;

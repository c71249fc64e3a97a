//! Command-line argument parsing for tabula.
//!
//! Values are kept as the user typed them; [`crate::config::Invocation`]
//! validates and resolves them against the config file.

use crate::config::Config;
use clap::Parser;
use std::path::PathBuf;

/// Runs SQL statements and document commands for an editor and renders
/// the results as bordered tables.
#[derive(Parser, Debug)]
#[command(name = "tabula")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Engine: postgres, mysql, sqlite or mongo
    #[arg(long, value_name = "ENGINE")]
    pub engine: String,

    /// Connection string (for SQLite a database path works too)
    #[arg(long, value_name = "CONN_STR", env = "TABULA_CONN_STR", default_value = "")]
    pub conn_str: String,

    /// Database name
    #[arg(long = "dbname", value_name = "NAME", default_value = "")]
    pub db_name: String,

    /// Statement, batch or document command; the entity name when describing
    #[arg(long, value_name = "TEXT", default_value = "")]
    pub queries: String,

    /// Border style: 1-5 or default, simple, rounded, double, simple-double
    #[arg(long, value_name = "STYLE")]
    pub border_style: Option<String>,

    /// Folder the result file is written into
    #[arg(long, value_name = "PATH")]
    pub dest_folder: Option<PathBuf>,

    /// Highlight group the column headers link to
    #[arg(long, value_name = "GROUP")]
    pub header_style_link: Option<String>,

    /// Mode: 1 (run), 2 (tables), 3 (table-info) or 4 (ping)
    #[arg(long = "option", value_name = "MODE", default_value = "1")]
    pub mode: String,

    /// Append logs to this file
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Log at debug level
    #[arg(long)]
    pub log_debug: bool,

    /// Config file path
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

impl Cli {
    /// Parses command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// The config file to load: `--config` or the platform default.
    pub fn config_path(&self) -> PathBuf {
        self.config.clone().unwrap_or_else(Config::default_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_invocation() {
        let cli = Cli::parse_from([
            "tabula",
            "--engine",
            "postgres",
            "--conn-str",
            "postgres://localhost/app",
            "--dbname",
            "app",
            "--queries",
            "SELECT 1",
            "--border-style",
            "2",
            "--dest-folder",
            "/tmp/out",
            "--header-style-link",
            "Keyword",
            "--option",
            "run",
            "--log-file",
            "/tmp/tabula.log",
            "--log-debug",
        ]);

        assert_eq!(cli.engine, "postgres");
        assert_eq!(cli.conn_str, "postgres://localhost/app");
        assert_eq!(cli.db_name, "app");
        assert_eq!(cli.queries, "SELECT 1");
        assert_eq!(cli.border_style.as_deref(), Some("2"));
        assert_eq!(cli.dest_folder, Some(PathBuf::from("/tmp/out")));
        assert_eq!(cli.header_style_link.as_deref(), Some("Keyword"));
        assert_eq!(cli.mode, "run");
        assert_eq!(cli.log_file, Some(PathBuf::from("/tmp/tabula.log")));
        assert!(cli.log_debug);
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::parse_from(["tabula", "--engine", "sqlite"]);
        assert_eq!(cli.db_name, "");
        assert_eq!(cli.queries, "");
        assert_eq!(cli.mode, "1");
        assert_eq!(cli.border_style, None);
        assert!(!cli.log_debug);
    }

    #[test]
    fn test_engine_is_required() {
        assert!(Cli::try_parse_from(["tabula", "--queries", "select 1"]).is_err());
    }

    #[test]
    fn test_config_path() {
        let cli = Cli::parse_from(["tabula", "--engine", "mysql", "--config", "/etc/tabula.toml"]);
        assert_eq!(cli.config_path(), PathBuf::from("/etc/tabula.toml"));

        let cli = Cli::parse_from(["tabula", "--engine", "mysql"]);
        assert_eq!(cli.config_path(), Config::default_path());
    }
}

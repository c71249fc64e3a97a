//! Configuration management for tabula.
//!
//! Loads output and engine defaults from a TOML file and resolves them,
//! together with the command-line flags, into one [`Invocation`].

use crate::cli::Cli;
use crate::db::{
    ConnectionDescriptor, Engine, EngineSettings, DEFAULT_DOCUMENT_TIMEOUT,
    DEFAULT_STATEMENT_TIMEOUT,
};
use crate::error::{Result, TabulaError};
use crate::render::BorderStyle;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// Highlight group linked to column headers when nothing else is configured.
pub const DEFAULT_HEADER_STYLE_LINK: &str = "Type";

/// Main configuration structure for tabula.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    /// Result file and rendering defaults.
    #[serde(default)]
    pub output: OutputConfig,

    /// Engine limits.
    #[serde(default)]
    pub engine: EngineConfig,
}

/// `[output]` section.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct OutputConfig {
    /// Folder result files are written into.
    pub dest_folder: Option<PathBuf>,

    /// Border style name, e.g. "rounded".
    pub border_style: Option<BorderStyle>,

    /// Highlight group the column headers link to.
    pub header_style_link: Option<String>,
}

/// `[engine]` section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EngineConfig {
    #[serde(default = "default_document_timeout_secs")]
    pub document_timeout_secs: u64,

    #[serde(default = "default_statement_timeout_secs")]
    pub statement_timeout_secs: u64,
}

fn default_document_timeout_secs() -> u64 {
    DEFAULT_DOCUMENT_TIMEOUT.as_secs()
}

fn default_statement_timeout_secs() -> u64 {
    DEFAULT_STATEMENT_TIMEOUT.as_secs()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            document_timeout_secs: default_document_timeout_secs(),
            statement_timeout_secs: default_statement_timeout_secs(),
        }
    }
}

impl EngineConfig {
    /// Converts the configured limits into adapter settings.
    pub fn settings(&self) -> Result<EngineSettings> {
        if self.document_timeout_secs == 0 || self.statement_timeout_secs == 0 {
            return Err(TabulaError::config("Timeouts must be at least one second"));
        }

        Ok(EngineSettings {
            statement_timeout: Duration::from_secs(self.statement_timeout_secs),
            document_timeout: Duration::from_secs(self.document_timeout_secs),
        })
    }
}

impl Config {
    /// Returns the default config file path for the current platform.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("tabula-db")
            .join("config.toml")
    }

    /// Loads configuration from a TOML file.
    ///
    /// A missing file is not an error; the built-in defaults apply.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| TabulaError::config(format!("Failed to read config file: {e}")))?;

        Self::parse_toml(&content, path)
    }

    /// Parses configuration from a TOML string.
    fn parse_toml(content: &str, path: &Path) -> Result<Self> {
        toml::from_str(content).map_err(|e| {
            TabulaError::config(format!(
                "Configuration error in {}:\n  {}",
                path.display(),
                e
            ))
        })
    }
}

/// What the invocation should do with the connection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Mode {
    /// Run the query text (a statement, a batch, or a document command).
    #[default]
    Execute,
    ListEntities,
    DescribeEntity,
    Ping,
}

impl Mode {
    /// True if the mode reads `--queries`.
    pub fn needs_queries(&self) -> bool {
        matches!(self, Self::Execute | Self::DescribeEntity)
    }
}

impl FromStr for Mode {
    type Err = TabulaError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "1" | "run" | "execute" => Ok(Self::Execute),
            "2" | "tables" | "list" => Ok(Self::ListEntities),
            "3" | "table-info" | "describe" => Ok(Self::DescribeEntity),
            "4" | "ping" => Ok(Self::Ping),
            _ => Err(TabulaError::config(format!("Option {s} is not defined"))),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Execute => "execute",
            Self::ListEntities => "list",
            Self::DescribeEntity => "describe",
            Self::Ping => "ping",
        };
        write!(f, "{name}")
    }
}

/// Every input of one run, fully resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    pub descriptor: ConnectionDescriptor,
    pub mode: Mode,
    pub queries: String,
    pub border_style: BorderStyle,
    pub dest_folder: PathBuf,
    pub header_style_link: String,
    pub settings: EngineSettings,
}

impl Invocation {
    /// Resolves the command line against the config file.
    ///
    /// Flags win over the file, the file wins over the built-in defaults.
    pub fn resolve(cli: &Cli, config: &Config) -> Result<Self> {
        let engine: Engine = cli.engine.parse()?;
        let mode: Mode = cli.mode.parse()?;

        if mode.needs_queries() && cli.queries.trim().is_empty() {
            return Err(TabulaError::config(format!(
                "Mode {mode} needs a value for --queries"
            )));
        }

        let border_style = match &cli.border_style {
            Some(style) => style.parse()?,
            None => config.output.border_style.unwrap_or_default(),
        };

        let dest_folder = cli
            .dest_folder
            .clone()
            .or_else(|| config.output.dest_folder.clone())
            .unwrap_or_else(std::env::temp_dir);

        let header_style_link = cli
            .header_style_link
            .clone()
            .or_else(|| config.output.header_style_link.clone())
            .unwrap_or_else(|| DEFAULT_HEADER_STYLE_LINK.to_string());

        Ok(Self {
            descriptor: ConnectionDescriptor::new(engine, &cli.conn_str, &cli.db_name),
            mode,
            queries: cli.queries.clone(),
            border_style,
            dest_folder,
            header_style_link,
            settings: config.engine.settings()?,
        })
    }
}

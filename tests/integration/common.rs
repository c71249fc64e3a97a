//! Shared helpers: run one invocation the way the binary does and capture stdout.

use clap::Parser;
use std::path::{Path, PathBuf};
use tabula_db::cli::Cli;
use tabula_db::config::{Config, Invocation};
use tabula_db::dispatch;

/// Runs `args` end to end and returns the printed lines.
pub async fn tabula(args: &[&str]) -> Vec<String> {
    let mut full = vec!["tabula"];
    full.extend_from_slice(args);
    let cli = Cli::parse_from(full);

    let mut out = Vec::new();
    let result = match Invocation::resolve(&cli, &Config::default()) {
        Ok(invocation) => dispatch::run(&invocation, &mut out).await,
        Err(e) => Err(e),
    };
    if let Err(e) = result {
        dispatch::report_error(&e, &mut out).unwrap();
    }

    String::from_utf8(out)
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect()
}

/// Reads a result file named on stdout.
pub fn artifact_lines(path: &str) -> Vec<String> {
    std::fs::read_to_string(PathBuf::from(path))
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect()
}

/// Number of entries in a folder.
pub fn file_count(dir: &Path) -> usize {
    std::fs::read_dir(dir).unwrap().count()
}

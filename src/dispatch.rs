//! Invocation dispatch.
//!
//! Opens the one connection of an invocation, runs the selected mode,
//! releases the connection on every exit path, and prints the result in
//! the line protocol the editor reads from stdout.

use crate::config::{Invocation, Mode};
use crate::db::{self, EngineAdapter, Outcome};
use crate::error::{Result, TabulaError};
use crate::render::{artifact_path, directive_line, write_lines, ArtifactKind, Highlight};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

/// Printed when a read returns no rows.
pub const ZERO_RESULTS: &str = "Query has returned 0 results.";

/// Printed by the ping mode.
pub const CONNECTED: &str = "Successfully connected to the database!";

/// Opens a connection for `invocation` and runs it.
pub async fn run<W: Write>(invocation: &Invocation, out: &mut W) -> Result<()> {
    info!(
        "Running {} on {}",
        invocation.mode, invocation.descriptor.engine
    );
    let adapter = db::connect(&invocation.descriptor, &invocation.settings).await?;
    run_with(adapter, invocation, out).await
}

/// Runs `invocation` on an already open adapter, then closes it.
///
/// The adapter is closed whether or not the mode succeeded. Closing is
/// bounded by the engine's operation timeout; a failed or stalled close is
/// logged and never replaces the mode's own result.
pub async fn run_with<W: Write>(
    mut adapter: Box<dyn EngineAdapter>,
    invocation: &Invocation,
    out: &mut W,
) -> Result<()> {
    let result = perform(adapter.as_mut(), invocation, out).await;

    let limit = invocation
        .settings
        .operation_timeout(invocation.descriptor.engine);
    match tokio::time::timeout(limit, adapter.close()).await {
        Ok(Ok(())) => debug!("Connection released"),
        Ok(Err(e)) => warn!("Failed to close connection: {}", e),
        Err(_) => warn!(
            "Closing the connection timed out after {} seconds",
            limit.as_secs_f64()
        ),
    }

    result
}

async fn perform<W: Write>(
    adapter: &mut dyn EngineAdapter,
    invocation: &Invocation,
    out: &mut W,
) -> Result<()> {
    match invocation.mode {
        Mode::Execute => {
            let outcome = adapter.execute(&invocation.queries).await?;
            present(&outcome, invocation, out)
        }
        Mode::ListEntities => {
            let names = adapter.list_entities().await?;
            debug!("Listed {} entities", names.len());
            writeln!(out, "[{}]", names.join(" "))?;
            Ok(())
        }
        Mode::DescribeEntity => {
            let outcome = adapter.describe_entity(&invocation.queries).await?;
            present(&outcome, invocation, out)
        }
        Mode::Ping => {
            adapter.ping().await?;
            writeln!(out, "{CONNECTED}")?;
            Ok(())
        }
    }
}

/// Prints an outcome, writing the result file when it has one.
///
/// Tables print their header directives then the file path. Batches print
/// the error-marker directive (or an empty line) then the file path.
/// Everything else is a single indented status line.
pub fn present<W: Write>(outcome: &Outcome, invocation: &Invocation, out: &mut W) -> Result<()> {
    match outcome {
        Outcome::Table { table, kind } => {
            let lines = table.render(&invocation.border_style.glyphs());
            let path = write_artifact(&invocation.dest_folder, *kind, &lines)?;

            writeln!(
                out,
                "{}",
                directive_line(&table.highlights(&invocation.header_style_link))
            )?;
            writeln!(out, "{}", path.display())?;
        }
        Outcome::Batch(reports) => {
            let lines: Vec<String> = reports
                .iter()
                .enumerate()
                .map(|(i, report)| report.line(i + 1))
                .collect();
            let path = write_artifact(&invocation.dest_folder, ArtifactKind::Relational, &lines)?;

            if outcome.has_failures() {
                writeln!(out, "{}", Highlight::error_marker())?;
            } else {
                writeln!(out)?;
            }
            writeln!(out, "{}", path.display())?;
        }
        Outcome::Empty => writeln!(out, "  {ZERO_RESULTS}")?,
        Outcome::Affected(n) => writeln!(out, "  Row(s) affected: {n}")?,
        Outcome::Executed => writeln!(out, "  Statement executed correctly.")?,
        Outcome::Message(message) => writeln!(out, "  {message}")?,
    }

    Ok(())
}

/// Prints a failure the way the editor expects it. The exit code is unaffected.
pub fn report_error<W: Write>(error: &TabulaError, out: &mut W) -> Result<()> {
    error!("{}: {}", error.category(), error);
    writeln!(out, "[ERROR] {error}")?;
    Ok(())
}

fn write_artifact(dest_folder: &Path, kind: ArtifactKind, lines: &[String]) -> Result<PathBuf> {
    let path = artifact_path(dest_folder, kind);
    write_lines(&path, lines)?;
    debug!("Wrote {} lines to {}", lines.len(), path.display());
    Ok(path)
}

//! Result files read back by the editor.

use crate::error::Result;
use chrono::{DateTime, Local};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

const TIMESTAMP_FORMAT: &str = "%Y%m%d-%H%M%S";

/// Which engine family produced a result file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Relational,
    Document,
}

impl ArtifactKind {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Relational => "tabula",
            Self::Document => "tabula.doc",
        }
    }
}

/// Builds `<dest>/<YYYYMMDD-HHMMSS>.<ext>` for the given instant.
pub fn artifact_path_at(dest_folder: &Path, kind: ArtifactKind, at: DateTime<Local>) -> PathBuf {
    dest_folder.join(format!(
        "{}.{}",
        at.format(TIMESTAMP_FORMAT),
        kind.extension()
    ))
}

/// Builds the result file path for the current local time.
pub fn artifact_path(dest_folder: &Path, kind: ArtifactKind) -> PathBuf {
    artifact_path_at(dest_folder, kind, Local::now())
}

/// Writes `lines` to `path`, one per line, replacing any existing file.
pub fn write_lines(path: &Path, lines: &[String]) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    for line in lines {
        writeln!(writer, "{line}")?;
    }
    writer.flush()?;
    Ok(())
}

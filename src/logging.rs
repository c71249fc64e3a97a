//! Logging setup for tabula.
//!
//! A [`LogSession`] installs the subscriber for the lifetime of one
//! invocation. Logs go to the `--log-file` when one is given, since stdout
//! belongs to the editor, and to stderr at `warn` otherwise.

use std::fs::{self, File, OpenOptions};
use std::path::Path;
use std::sync::Mutex;
use tracing::subscriber::DefaultGuard;
use tracing_subscriber::EnvFilter;

/// Scoped logging context. Dropping it restores the previous subscriber.
#[must_use = "logging stops when the session is dropped"]
pub struct LogSession {
    _guard: DefaultGuard,
}

impl LogSession {
    /// Installs logging for the current thread.
    ///
    /// `RUST_LOG` overrides the level chosen from `debug`.
    pub fn start(log_file: Option<&Path>, debug: bool) -> Self {
        let file = log_file.and_then(open_log_file);
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(default_level(file.is_some(), debug)));

        let guard = match file {
            Some(file) => tracing::subscriber::set_default(
                tracing_subscriber::fmt()
                    .with_env_filter(filter)
                    .with_writer(Mutex::new(file))
                    .with_ansi(false)
                    .finish(),
            ),
            None => tracing::subscriber::set_default(
                tracing_subscriber::fmt()
                    .with_env_filter(filter)
                    .with_writer(std::io::stderr)
                    .finish(),
            ),
        };

        Self { _guard: guard }
    }

    /// Ends the session.
    pub fn finish(self) {
        tracing::debug!("Log session finished");
    }
}

fn default_level(to_file: bool, debug: bool) -> &'static str {
    match (to_file, debug) {
        (_, true) => "debug",
        (true, false) => "info",
        (false, false) => "warn",
    }
}

/// Opens the log file in append mode, creating its folder if needed.
fn open_log_file(path: &Path) -> Option<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if let Err(e) = fs::create_dir_all(parent) {
            eprintln!("Warning: Could not create log directory: {e}");
            return None;
        }
    }

    match OpenOptions::new().create(true).append(true).open(path) {
        Ok(file) => Some(file),
        Err(e) => {
            eprintln!("Warning: Could not open log file: {e}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing::{debug, info};

    #[test]
    fn test_default_levels() {
        assert_eq!(default_level(true, false), "info");
        assert_eq!(default_level(true, true), "debug");
        assert_eq!(default_level(false, false), "warn");
    }

    #[test]
    fn test_session_writes_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("tabula.log");

        let session = LogSession::start(Some(&path), true);
        info!("opening connection");
        debug!("query text");
        session.finish();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("opening connection"));
        assert!(content.contains("query text"));
        assert!(!content.contains("\u{1b}["));
    }

    #[test]
    fn test_session_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tabula.log");
        fs::write(&path, "previous run\n").unwrap();

        let session = LogSession::start(Some(&path), false);
        info!("next run");
        drop(session);

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("previous run\n"));
        assert!(content.contains("next run"));
    }
}

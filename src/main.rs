//! tabula - query execution backend for editor database plugins.

use tabula_db::cli::Cli;
use tabula_db::config::{Config, Invocation};
use tabula_db::dispatch;
use tabula_db::error::Result;
use tabula_db::logging::LogSession;
use tracing::info;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse_args();
    let session = LogSession::start(cli.log_file.as_deref(), cli.log_debug);

    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    // Failures go to stdout; the exit code stays 0.
    if let Err(e) = run(&cli, &mut out).await {
        if let Err(write_err) = dispatch::report_error(&e, &mut out) {
            eprintln!("{e} ({write_err})");
        }
    }

    session.finish();
}

async fn run(cli: &Cli, out: &mut impl std::io::Write) -> Result<()> {
    let config_path = cli.config_path();
    info!("Loading config from: {}", config_path.display());
    let config = Config::load_from_file(&config_path)?;

    let invocation = Invocation::resolve(cli, &config)?;
    dispatch::run(&invocation, out).await
}

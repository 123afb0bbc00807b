// --- Calculadora de notas finales - Archivo principal ---

use clap::Parser;
use std::process::ExitCode;

use gradecalc::cli::{self, Cli, Command};
use gradecalc::{GradeError, config, logging};

fn main() -> ExitCode {
    let dotenv = config::load_dotenv();
    let cli = Cli::parse();

    // En modo interactivo los logs informativos ensucian el prompt
    let interactive = matches!(cli.command, None | Some(Command::Interactive));
    let level = match (&cli.log_level, interactive && !cli.verbose) {
        (Some(level), _) => Some(level.as_str()),
        (None, true) => Some("warn"),
        (None, false) => None,
    };
    if let Err(e) = logging::init_tracing(cli.verbose, level, cli.log_json) {
        eprintln!("failed to initialise logging: {}", e);
    }
    match dotenv {
        Ok(Some(path)) => tracing::debug!(path = %path.display(), "loaded .env"),
        Ok(None) => {}
        Err(e) => tracing::warn!(error = %e, "ignoring unreadable .env file"),
    }

    match cli::run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(code = e.code(), "{}", e);
            eprintln!("Error: {}", e);
            match e {
                GradeError::Validation(_) | GradeError::Config(_) => ExitCode::from(2),
                _ => ExitCode::FAILURE,
            }
        }
    }
}

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Instala el subscriber de `tracing` según los flags de la CLI.
///
/// Orden de prioridad del filtro: `RUST_LOG`, luego `GRADECALC_LOG`, luego
/// `--log-level`/`--verbose`. Los logs van siempre a stderr para no mezclarse
/// con la salida de la CLI interactiva.
pub fn init_tracing(verbose: bool, log_level: Option<&str>, log_json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let level = match (verbose, log_level) {
        (_, Some(level)) => level,
        (true, None) => "debug",
        (false, None) => "info",
    };

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_from_env("GRADECALC_LOG"))
        .unwrap_or_else(|_| EnvFilter::new(filter_directive(level)));

    let registry = tracing_subscriber::registry().with(filter);

    if log_json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr).with_ansi(false))
            .try_init()?;
    } else {
        registry
            .with(
                fmt::layer()
                    .compact()
                    .with_target(false)
                    .with_writer(std::io::stderr)
                    .with_ansi(false),
            )
            .try_init()?;
    }

    Ok(())
}

/// `debug` -> `gradecalc=debug`; directivas completas se dejan tal cual.
fn filter_directive(level: &str) -> String {
    if level.contains('=') {
        level.to_string()
    } else {
        format!("gradecalc={}", level)
    }
}

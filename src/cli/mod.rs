//! Entrada de línea de comandos: argumentos (clap), despacho de subcomandos y
//! el bucle interactivo.

mod interactive;
mod report;

pub use interactive::Session;
pub use report::write_report;

use clap::{Args, Parser, Subcommand};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::algorithm;
use crate::config::*;
use crate::error::{ConfigError, GradeError, Result};
use crate::models::{AttendanceRecord, Evaluation};
use crate::server;
use crate::service::{self, GradeRequest};
use crate::storage::JsonStore;

#[derive(Parser, Debug)]
#[command(name = "gradecalc", version, about = "Final grade calculator: weighted evaluations, attendance gate and extra points")]
pub struct Cli {
    /// Directory holding students.json and calculations.json
    #[arg(long, global = true, env = "GRADECALC_DATA_DIR", default_value = DEFAULT_DATA_DIR)]
    pub data_dir: PathBuf,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Log level or filter directive (e.g. "debug", "gradecalc=trace")
    #[arg(long, global = true, env = "GRADECALC_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(flatten)]
    pub grading: GradingArgs,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Run the REST API
    Serve {
        #[arg(long, env = "GRADECALC_BIND", default_value = DEFAULT_BIND)]
        bind: String,

        /// HTTP worker threads (defaults to the number of CPUs)
        #[arg(long, env = "GRADECALC_WORKERS")]
        workers: Option<usize>,
    },
    /// Interactive prompt loop (default)
    Interactive,
    /// One-shot calculation from flags
    Calculate(CalculateArgs),
}

/// Parámetros de calificación; cada uno admite flag o variable de entorno.
#[derive(Args, Debug, Clone)]
pub struct GradingArgs {
    /// Minimum attendance percentage required to pass
    #[arg(long, global = true, env = "GRADECALC_ATTENDANCE_MIN", default_value_t = DEFAULT_ATTENDANCE_MIN)]
    pub attendance_min: f64,

    /// Maximum extra points that can be awarded
    #[arg(long, global = true, env = "GRADECALC_EXTRA_CAP", default_value_t = DEFAULT_EXTRA_CAP)]
    pub extra_cap: f64,

    /// Maximum grade of the scale
    #[arg(long, global = true, env = "GRADECALC_SCALE_MAX", default_value_t = DEFAULT_SCALE_MAX)]
    pub scale_max: f64,

    #[arg(long, global = true, env = "GRADECALC_MAX_EVALUATIONS", default_value_t = DEFAULT_MAX_EVALUATIONS)]
    pub max_evaluations: usize,

    /// Grade assigned when attendance is below the minimum
    #[arg(long, global = true, env = "GRADECALC_FAILING_GRADE", default_value_t = DEFAULT_FAILING_GRADE)]
    pub failing_grade: f64,

    /// Bonus granted when the per-year criterion is met every year
    #[arg(long, global = true, env = "GRADECALC_DEFAULT_EXTRA_POINTS", default_value_t = DEFAULT_EXTRA_POINTS)]
    pub default_extra_points: f64,
}

impl GradingArgs {
    pub fn to_config(&self) -> Result<GradingConfig, ConfigError> {
        GradingConfig {
            attendance_min: self.attendance_min,
            extra_cap: self.extra_cap,
            scale_max: self.scale_max,
            max_evaluations: self.max_evaluations,
            failing_grade: self.failing_grade,
            default_extra_points: self.default_extra_points,
            weight_tolerance: DEFAULT_WEIGHT_TOLERANCE,
        }
        .validate()
    }
}

#[derive(Args, Debug, Clone)]
pub struct CalculateArgs {
    /// Student id (required with --save)
    #[arg(long, short)]
    pub student: Option<String>,

    /// Evaluation as NAME:SCORE:WEIGHT or SCORE:WEIGHT (repeatable)
    #[arg(long = "eval", short, required = true, value_parser = parse_eval_arg, action = clap::ArgAction::Append)]
    pub evaluations: Vec<Evaluation>,

    /// Attendance percentage (0-100)
    #[arg(long, short)]
    pub attendance: f64,

    /// Extra points requested (capped by --extra-cap)
    #[arg(long)]
    pub extra: Option<f64>,

    /// Store the inputs on the student record and append to its history
    #[arg(long)]
    pub save: bool,
}

/// `"Parcial:16:0.6"` o `"16:0.6"`. El nombre puede contener ':'.
pub fn parse_eval_arg(s: &str) -> std::result::Result<Evaluation, String> {
    let mut parts = s.rsplitn(3, ':');
    let weight = parts.next().unwrap_or_default().trim();
    let score = parts.next().ok_or_else(|| format!("expected NAME:SCORE:WEIGHT, got '{}'", s))?.trim();
    let name = parts.next().unwrap_or_default().trim();

    let score: f64 = score.parse().map_err(|_| format!("invalid score '{}'", score))?;
    let weight: f64 = weight.parse().map_err(|_| format!("invalid weight '{}'", weight))?;
    Ok(Evaluation::new(name, score, weight))
}

/// Despacha el subcomando. Sin subcomando se abre la sesión interactiva.
pub fn run(cli: Cli) -> Result<()> {
    let config = cli.grading.to_config()?;

    match cli.command.unwrap_or(Command::Interactive) {
        Command::Serve { bind, workers } => {
            let server_config = ServerConfig::new(bind, cli.data_dir, config).with_workers(workers);
            actix_web::rt::System::new().block_on(server::run_server(server_config))
        }
        Command::Interactive => {
            let store = JsonStore::open(&cli.data_dir)?;
            let stdin = io::stdin();
            let stdout = io::stdout();
            let mut session = Session::new(stdin.lock(), stdout.lock(), &store, config);
            session.run().map_err(|e| GradeError::Internal(format!("terminal I/O failed: {}", e)))
        }
        Command::Calculate(args) => run_calculate(args, &cli.data_dir, &config),
    }
}

fn run_calculate(args: CalculateArgs, data_dir: &Path, config: &GradingConfig) -> Result<()> {
    let policy = algorithm::resolve_extra_policy(config, args.extra, None);
    let attendance = AttendanceRecord::new(args.attendance);

    let result = if args.save {
        let student_id = args
            .student
            .ok_or_else(|| GradeError::Config(ConfigError::Invalid("--save requires --student".into())))?;
        let store = JsonStore::open(data_dir)?;
        let request = GradeRequest {
            student_id,
            evaluations: Some(args.evaluations),
            attendance: Some(attendance),
            policy,
        };
        service::grade_student(&store, config, request)?.result
    } else {
        algorithm::calculate(config, &args.evaluations, &attendance, &policy)?
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();
    write_report(&mut out, &result)
        .and_then(|_| out.flush())
        .map_err(|e| GradeError::Internal(format!("failed to write report: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_eval_arg() {
        let e = parse_eval_arg("Parcial:16:0.6").unwrap();
        assert_eq!(e, Evaluation::new("Parcial", 16.0, 0.6));

        let e = parse_eval_arg("14:0.4").unwrap();
        assert_eq!(e.name, "");
        assert_eq!(e.score, 14.0);

        let e = parse_eval_arg("Lab: part 2:18:0.1").unwrap();
        assert_eq!(e.name, "Lab: part 2");

        assert!(parse_eval_arg("16").is_err());
        assert!(parse_eval_arg("x:abc:0.5").is_err());
    }

    #[test]
    fn test_cli_defaults_and_flags() {
        let cli = Cli::try_parse_from([
            "gradecalc",
            "--attendance-min",
            "75",
            "calculate",
            "--eval",
            "Midterm:16:0.6",
            "--eval",
            "Final:14:0.4",
            "--attendance",
            "80",
            "--extra",
            "2",
        ])
        .unwrap();
        let cfg = cli.grading.to_config().unwrap();
        assert_eq!(cfg.attendance_min, 75.0);
        assert_eq!(cfg.scale_max, 20.0);
        match cli.command {
            Some(Command::Calculate(args)) => {
                assert_eq!(args.evaluations.len(), 2);
                assert_eq!(args.extra, Some(2.0));
                assert!(!args.save);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let cli = Cli::try_parse_from(["gradecalc", "--scale-max", "0", "interactive"]).unwrap();
        assert!(cli.grading.to_config().is_err());
    }
}

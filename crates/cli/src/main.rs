// ctrlboard CLI - control-plan dashboards and reconciliation, headless

mod exit_codes;
mod filters;
mod recon;
mod report;
mod validate;
mod workspace;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser, Subcommand};

use ctrlboard_config::ConfigError;
use ctrlboard_io::LoadError;

use exit_codes::{EXIT_CONFIG, EXIT_ERROR, EXIT_SUCCESS, EXIT_USAGE};
use recon::ReconKind;

#[derive(Parser)]
#[command(name = "ctrlboard")]
#[command(about = "Control-plan dashboards and plan-vs-detail reconciliation")]
#[command(version)]
struct Cli {
    /// Config file (default: <config dir>/ctrlboard/config.toml)
    #[arg(long, global = true, env = "CTRLBOARD_CONFIG")]
    config: Option<PathBuf>,

    /// Directory of <sheet>.csv / <sheet>.json exports (overrides the config source)
    #[arg(long, global = true)]
    data: Option<PathBuf>,

    /// More log output on stderr (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the dashboard for one organization, or its whole sector
    #[command(after_help = "\
Examples:
  ctrlboard report --data exports --org 'Instituto ABC' --year 2025
  ctrlboard report --data exports --org 'Instituto ABC' --sector Salud --year 2025
  ctrlboard report --org 'Fondo Y' --year 2025 --json | jq .kpis")]
    Report {
        /// Organization, as written in the plan table
        #[arg(long)]
        org: String,

        /// Roll up the whole sector instead of one organization ("all" means none)
        #[arg(long)]
        sector: Option<String>,

        #[arg(long)]
        year: i64,

        /// Output JSON to stdout instead of a human summary
        #[arg(long)]
        json: bool,
    },

    /// Reconcile declared plan totals against detail rows
    #[command(after_help = "\
Examples:
  ctrlboard recon --data exports
  ctrlboard recon --kind control --json
  ctrlboard recon --output recon.json")]
    Recon {
        #[arg(long, value_enum, default_value_t = ReconKind::All)]
        kind: ReconKind,

        /// Output JSON to stdout instead of a human summary
        #[arg(long)]
        json: bool,

        /// Write JSON output to file
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// List organizations, sectors and the years available to filter on
    #[command(after_help = "\
Examples:
  ctrlboard filters
  ctrlboard filters --org 'Instituto ABC'
  ctrlboard filters --sector Salud --json")]
    Filters {
        /// Years for this organization
        #[arg(long, conflicts_with = "sector")]
        org: Option<String>,

        /// Years for this sector
        #[arg(long)]
        sector: Option<String>,

        #[arg(long)]
        json: bool,
    },

    /// Load and clean every table, reporting what was read
    #[command(after_help = "\
Examples:
  ctrlboard validate --data exports
  ctrlboard validate --config ctrlboard.toml --json")]
    Validate {
        #[arg(long)]
        json: bool,
    },
}

fn init_logging(verbose: u8) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::new().filter_or("CTRLBOARD_LOG", "warn"));
    match verbose {
        0 => {}
        1 => {
            builder.filter_level(log::LevelFilter::Info);
        }
        _ => {
            builder.filter_level(log::LevelFilter::Debug);
        }
    }
    builder.target(env_logger::Target::Stderr).init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = workspace::Workspace::open(cli.config.as_deref(), cli.data.as_deref()).and_then(|ws| {
        match cli.command {
            Commands::Report { org, sector, year, json } => {
                report::cmd_report(&ws, &org, sector.as_deref(), year, json)
            }
            Commands::Recon { kind, json, output } => recon::cmd_recon(&ws, kind, json, output),
            Commands::Filters { org, sector, json } => {
                filters::cmd_filters(&ws, org.as_deref(), sector.as_deref(), json)
            }
            Commands::Validate { json } => validate::cmd_validate(&ws, json),
        }
    });

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn new(code: u8, msg: impl Into<String>) -> Self {
        Self { code, message: msg.into(), hint: None }
    }

    pub fn args(msg: impl Into<String>) -> Self {
        Self::new(EXIT_USAGE, msg)
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self::new(EXIT_ERROR, msg)
    }

    pub fn config(err: ConfigError) -> Self {
        let hint = match &err {
            ConfigError::Validation(m) if m.contains("source.path") => Some(format!(
                "pass --data <dir> or set source.path in {}",
                ctrlboard_config::Settings::default_path().display()
            )),
            _ => None,
        };
        Self { code: EXIT_CONFIG, message: err.to_string(), hint }
    }

    pub fn load(err: LoadError) -> Self {
        let hint = match &err {
            LoadError::MissingTable(_) => Some("check the [sheets] names in the config".to_string()),
            LoadError::Http { status: 401 | 403, .. } => {
                Some("the sheet must be published as CSV without sign-in".to_string())
            }
            _ => None,
        };
        Self { code: exit_codes::load_exit_code(&err), message: err.to_string(), hint }
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

/// Pretty JSON to stdout.
pub(crate) fn print_json<T: serde::Serialize>(value: &T) -> Result<(), CliError> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| CliError::io(format!("JSON serialization error: {e}")))?;
    println!("{json}");
    Ok(())
}

// tieout CLI - month-end portfolio tie-out of an ACH payment batch against
// a servicer's portfolio statement.

mod exit_codes;
mod tieout;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use exit_codes::EXIT_SUCCESS;

#[derive(Parser)]
#[command(name = "tieout")]
#[command(about = "Tie out an ACH payment batch against a portfolio statement")]
#[command(long_version = long_version())]
#[command(version)]
struct Cli {
    /// More log output on stderr (-v info, -vv debug). RUST_LOG overrides.
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the tie-out and write the three-sheet report workbook
    #[command(after_help = "\
Examples:
  tieout run ach.xlsx portfolio.xlsx 22723.45
  tieout run ach.xlsx portfolio.xlsx 22723.45 --prior Portfolio_tie_out_060218.xlsx --date 07-02-18
  tieout run ach.xlsx portfolio.xlsx '$18,402.10' --buyouts --cut 40
  tieout run ach.xlsx portfolio.xlsx 22723.45 -c clark.toml --skip-rows 3 --dry-run --json
  tieout run ach.xlsx portfolio.xlsx 22723.45 -o out/june.xlsx")]
    Run(tieout::RunArgs),

    /// Validate a run config without reading any workbook
    #[command(after_help = "\
Examples:
  tieout validate clark.toml")]
    Validate {
        /// Path to the TOML run config
        config: PathBuf,
    },
}

fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        " (", env!("GIT_COMMIT_HASH"), ")",
        "\nengine:  tieout-recon ", env!("CARGO_PKG_VERSION"),
        "\ntarget:  ", env!("TARGET"),
    )
}

/// Install the stderr subscriber. `log` records from the library crates are
/// bridged in through tracing-subscriber's tracing-log support.
fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .try_init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Run(args) => tieout::cmd_run(args),
        Commands::Validate { config } => tieout::cmd_validate(config),
    };

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

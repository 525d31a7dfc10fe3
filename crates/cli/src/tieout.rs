//! `tieout run` / `tieout validate`: monthly portfolio tie-out.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use clap::Args;

use tieout_io::{read_first_sheet, read_prior_contracts, write_report};
use tieout_recon::error::SourceKind;
use tieout_recon::money::{format_cents, parse_money_string};
use tieout_recon::report::{ReportCell, SheetView};
use tieout_recon::{PortfolioMode, ReconConfig, ReconError, RunParams, TieOutInput, TieOutResult};

use crate::exit_codes::{tieout_exit_code, EXIT_ERROR, EXIT_TIEOUT_SOURCE_NOT_FOUND, EXIT_USAGE};
use crate::CliError;

/// Rows of the comparison sheet shown before writing.
const PREVIEW_ROWS: usize = 5;

#[derive(Args, Debug)]
pub struct RunArgs {
    /// ACH payment batch workbook (.xls/.xlsx/.xlsb/.ods)
    pub payment_file: PathBuf,

    /// Servicer portfolio statement workbook
    pub portfolio_file: PathBuf,

    /// Payment total from the counterparty's transmittal (e.g. 22723.45 or "$22,723.45")
    #[arg(allow_hyphen_values = true)]
    pub payment_total: String,

    /// Prior period's tie-out workbook; its column A replaces the statement's contract numbers
    #[arg(long, value_name = "FILE")]
    pub prior: Option<PathBuf>,

    /// TOML run configuration (layout positions, filters, sheet names)
    #[arg(long, short = 'c', value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Statement uses the buyout layout (requires --cut)
    #[arg(long, requires = "cut")]
    pub buyouts: bool,

    /// Last ledger row of a buyout statement; buyout rows follow it
    #[arg(long, value_name = "ROW")]
    pub cut: Option<usize>,

    /// Rows to skip above the statement header (cancelled/replaced layout)
    #[arg(long, value_name = "N")]
    pub skip_rows: Option<usize>,

    /// Rows to skip at the bottom of the statement (cancelled/replaced layout)
    #[arg(long, value_name = "N")]
    pub skip_footer: Option<usize>,

    /// Header of the portfolio-amount column in the report
    #[arg(long, value_name = "NAME")]
    pub portfolio_name: Option<String>,

    /// Bank code that marks a payment for this portfolio
    #[arg(long, value_name = "CODE")]
    pub bank_code: Option<String>,

    /// Transaction type code of unallocated payments
    #[arg(long, value_name = "CODE")]
    pub transaction_type: Option<String>,

    /// Directory for the report workbook (default: current directory)
    #[arg(long, value_name = "DIR")]
    pub destination: Option<PathBuf>,

    /// Report date used in the file name, MM-DD-YY (default: today)
    #[arg(long, value_name = "MM-DD-YY")]
    pub date: Option<String>,

    /// Write the report to this exact path instead of <destination>/Portfolio_tie_out_<MMDDYY>.xlsx
    #[arg(long, short = 'o', value_name = "FILE", conflicts_with_all = ["destination", "date"])]
    pub output: Option<PathBuf>,

    /// Print the preview and summary, write nothing
    #[arg(long)]
    pub dry_run: bool,

    /// Print the run summary as JSON to stdout
    #[arg(long)]
    pub json: bool,
}

fn engine_err(err: ReconError) -> CliError {
    let code = tieout_exit_code(&err);
    let hint = match &err {
        ReconError::SchemaMismatch { source: SourceKind::Portfolio, .. } => {
            Some("check --skip-rows / --skip-footer / --cut against this period's statement".to_string())
        }
        ReconError::SchemaMismatch { source: SourceKind::Payment, .. } => {
            Some("check [payment.columns] in the config against this batch".to_string())
        }
        ReconError::TypeCoercion { .. } => {
            Some("fix the cell or adjust the layout; amounts are never coerced to zero".to_string())
        }
        _ => None,
    };
    CliError { code, message: err.to_string(), hint }
}

fn usage_err(msg: impl Into<String>) -> CliError {
    CliError { code: EXIT_USAGE, message: msg.into(), hint: None }
}

/// Load the config file, or built-in defaults when none is given.
pub fn load_config(path: Option<&Path>) -> Result<ReconConfig, CliError> {
    let Some(path) = path else {
        return Ok(ReconConfig::default());
    };
    let text = std::fs::read_to_string(path).map_err(|e| CliError {
        code: EXIT_TIEOUT_SOURCE_NOT_FOUND,
        message: format!("cannot read config {}: {e}", path.display()),
        hint: None,
    })?;
    let config = ReconConfig::from_toml(&text).map_err(engine_err)?;
    log::debug!("loaded config '{}' from {}", config.name, path.display());
    Ok(config)
}

/// Flags win over the config file.
fn apply_overrides(config: &mut ReconConfig, args: &RunArgs) -> Result<(), CliError> {
    if let Some(n) = args.skip_rows {
        config.portfolio.skip_rows = n;
    }
    if let Some(n) = args.skip_footer {
        config.portfolio.skip_footer = n;
    }
    if let Some(name) = &args.portfolio_name {
        config.report.portfolio_name = name.clone();
    }
    if let Some(code) = &args.bank_code {
        config.payment.bank_code = code.clone();
    }
    if let Some(code) = &args.transaction_type {
        config.payment.transaction_type = code.clone();
    }
    config.validate().map_err(engine_err)
}

/// Accepts MM-DD-YY and MM-DD-YYYY.
pub fn parse_report_date(s: &str) -> Result<NaiveDate, CliError> {
    NaiveDate::parse_from_str(s, "%m-%d-%y")
        .or_else(|_| NaiveDate::parse_from_str(s, "%m-%d-%Y"))
        .map_err(|_| usage_err(format!("invalid --date '{s}': expected MM-DD-YY")))
}

pub fn report_file_name(date: NaiveDate) -> String {
    format!("Portfolio_tie_out_{}.xlsx", date.format("%m%d%y"))
}

fn output_path(args: &RunArgs) -> Result<PathBuf, CliError> {
    if let Some(path) = &args.output {
        return Ok(path.clone());
    }
    let date = match &args.date {
        Some(s) => parse_report_date(s)?,
        None => chrono::Local::now().date_naive(),
    };
    let dir = args.destination.clone().unwrap_or_else(|| PathBuf::from("."));
    Ok(dir.join(report_file_name(date)))
}

pub fn cmd_run(args: RunArgs) -> Result<(), CliError> {
    let payment_total_cents = parse_money_string(&args.payment_total)
        .map_err(|e| usage_err(format!("invalid payment total '{}': {e}", args.payment_total)))?;

    let mode = if args.buyouts {
        PortfolioMode::Buyout { cut: args.cut.unwrap_or(0) }
    } else {
        if args.cut.is_some() {
            log::warn!("--cut only applies with --buyouts; ignored");
        }
        PortfolioMode::CancelledReplaced
    };

    let mut config = load_config(args.config.as_deref())?;
    apply_overrides(&mut config, &args)?;

    // Resolve the output path before reading anything so a bad --date fails fast.
    let out_path = output_path(&args)?;

    let payment = read_first_sheet(&args.payment_file, SourceKind::Payment).map_err(engine_err)?;
    let portfolio = read_first_sheet(&args.portfolio_file, SourceKind::Portfolio).map_err(engine_err)?;
    let prior_contracts = match &args.prior {
        Some(path) => Some(read_prior_contracts(path).map_err(engine_err)?),
        None => None,
    };

    let input = TieOutInput { payment, portfolio, prior_contracts };
    let params = RunParams { payment_total_cents, mode };
    let result = tieout_recon::run(&config, &input, &params).map_err(engine_err)?;

    print_preview(&result.report.summary, PREVIEW_ROWS);
    print_summary(&result);

    if args.json {
        let json_str = serde_json::to_string_pretty(&result.to_json()).map_err(|e| CliError {
            code: EXIT_ERROR,
            message: format!("JSON serialization error: {e}"),
            hint: None,
        })?;
        println!("{json_str}");
    }

    if args.dry_run {
        eprintln!("dry run: nothing written (would write {})", out_path.display());
        return Ok(());
    }

    write_report(&result.report, &config.report, &out_path).map_err(engine_err)?;
    eprintln!("wrote {}", out_path.display());
    Ok(())
}

pub fn cmd_validate(config_path: PathBuf) -> Result<(), CliError> {
    let config = load_config(Some(&config_path))?;
    let rules = config.portfolio.contract.prefix_rules.len();
    eprintln!(
        "ok: '{}' (payment type '{}', bank code '{}'; statement skip {}/{}; {} prefix rule(s); sheets {}, {}, {})",
        config.name,
        config.payment.transaction_type,
        config.payment.bank_code,
        config.portfolio.skip_rows,
        config.portfolio.skip_footer,
        rules,
        config.report.sheets.summary,
        config.report.sheets.exceptions,
        config.report.sheets.portfolio,
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// Human output (stderr)
// ---------------------------------------------------------------------------

fn cell_display(cell: &ReportCell) -> String {
    match cell {
        ReportCell::Blank => String::new(),
        ReportCell::Text(s) => s.clone(),
        ReportCell::Money(c) => format_cents(*c),
    }
}

fn print_preview(view: &SheetView, limit: usize) {
    let shown: Vec<Vec<String>> = view
        .rows
        .iter()
        .take(limit)
        .map(|r| r.iter().map(cell_display).collect())
        .collect();

    let mut widths: Vec<usize> = view.columns.iter().map(|c| c.chars().count()).collect();
    for row in &shown {
        for (i, cell) in row.iter().enumerate() {
            if let Some(w) = widths.get_mut(i) {
                *w = (*w).max(cell.chars().count());
            }
        }
    }

    let line = |cells: &[String]| {
        cells
            .iter()
            .zip(&widths)
            .map(|(c, w)| format!("{c:<w$}"))
            .collect::<Vec<_>>()
            .join("  ")
    };

    eprintln!("{}", line(&view.columns));
    for row in &shown {
        eprintln!("{}", line(row));
    }
    if view.rows.len() > limit {
        eprintln!("... {} more row(s)", view.rows.len() - limit);
    }
}

fn print_summary(result: &TieOutResult) {
    let s = &result.summary;
    eprintln!(
        "tie-out: {} payment(s), {} statement row(s): {} matched, {} exception(s), {} paid-only, {} statement-only",
        s.payment_records, s.portfolio_records, s.matched, s.exceptions, s.payment_only, s.portfolio_only,
    );
    eprintln!(
        "payment total {}, portfolio total {}, difference {}",
        format_cents(s.payment_total_cents),
        format_cents(s.portfolio_total_cents),
        format_cents(s.variance_cents),
    );
}

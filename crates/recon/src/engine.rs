use crate::config::ReconConfig;
use crate::error::ReconError;
use crate::matcher::reconcile;
use crate::model::{PortfolioMode, RunParams, TieOutInput, TieOutMeta, TieOutResult, TieOutSummary};
use crate::payment::parse_payments;
use crate::portfolio::parse_portfolio;
use crate::report::{assemble, exception_rows};

/// Run the tie-out over pre-loaded sheets. Every stage works on the previous
/// stage's output and returns a new record set; nothing is written back.
pub fn run(config: &ReconConfig, input: &TieOutInput, params: &RunParams) -> Result<TieOutResult, ReconError> {
    if let PortfolioMode::Buyout { cut: 0 } = params.mode {
        return Err(ReconError::ConfigValidation(
            "buyout statements need a cut row greater than 0".into(),
        ));
    }

    let payments = parse_payments(&input.payment, &config.payment)?;
    log::info!("payment batch: {} unallocated payment(s)", payments.len());

    let portfolio = parse_portfolio(
        &input.portfolio,
        &config.portfolio,
        params.mode,
        input.prior_contracts.as_deref(),
    )?;
    log::info!("portfolio statement: {} contract row(s)", portfolio.len());

    let (reconciled, join) = reconcile(&payments, &portfolio, &config.report.portfolio_name);

    if !join.payment_only.is_empty() {
        log::warn!(
            "{} contract(s) paid but not on the statement: {}",
            join.payment_only.len(),
            join.payment_only.join(", ")
        );
    }
    if !join.portfolio_only.is_empty() {
        log::warn!(
            "{} statement contract(s) with no payment: {}",
            join.portfolio_only.len(),
            join.portfolio_only.join(", ")
        );
    }

    let report = assemble(
        &reconciled,
        params.payment_total_cents,
        &portfolio,
        &params.mode,
        &config.report.sheets,
    );

    let summary = TieOutSummary {
        payment_records: payments.len(),
        portfolio_records: portfolio.len(),
        matched: reconciled.rows.len(),
        exceptions: exception_rows(&reconciled, &params.mode).len(),
        payment_only: join.payment_only.len(),
        portfolio_only: join.portfolio_only.len(),
        payment_total_cents: report.payment_total_cents,
        portfolio_total_cents: report.portfolio_total_cents,
        variance_cents: report.variance_cents,
    };

    Ok(TieOutResult {
        meta: TieOutMeta {
            config_name: config.name.clone(),
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            run_at: chrono::Utc::now().to_rfc3339(),
            mode: params.mode,
        },
        summary,
        payments,
        portfolio,
        reconciled,
        join,
        report,
    })
}

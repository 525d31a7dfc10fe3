//! Report views: the comparison summary, the exceptions (notes) sheet and
//! the normalized portfolio. Pure data; writing them is the io crate's job.

use serde::Serialize;

use crate::config::SheetNames;
use crate::model::{PortfolioMode, PortfolioRecord, ReconciledRecord, ReconciledSet};

pub const TOTALS_LABEL: &str = "Totals";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ReportCell {
    Blank,
    Text(String),
    Money(i64),
}

impl ReportCell {
    fn text(s: impl Into<String>) -> Self {
        Self::Text(s.into())
    }

    pub fn as_money(&self) -> Option<i64> {
        match self {
            Self::Money(c) => Some(*c),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

/// One worksheet's worth of output.
#[derive(Debug, Clone, Serialize)]
pub struct SheetView {
    pub name: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<ReportCell>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub summary: SheetView,
    pub exceptions: SheetView,
    pub portfolio: SheetView,
    pub payment_total_cents: i64,
    pub portfolio_total_cents: i64,
    /// `portfolio_total_cents - payment_total_cents`
    pub variance_cents: i64,
}

impl Report {
    pub fn sheets(&self) -> [&SheetView; 3] {
        [&self.summary, &self.exceptions, &self.portfolio]
    }
}

fn note_cell(note: Option<crate::model::Note>) -> ReportCell {
    match note {
        Some(n) => ReportCell::text(n.as_str()),
        None => ReportCell::text(""),
    }
}

/// Rows the exceptions sheet lists for `mode`. Totals are never included.
pub fn exception_rows<'a>(reconciled: &'a ReconciledSet, mode: &PortfolioMode) -> Vec<&'a ReconciledRecord> {
    reconciled
        .rows
        .iter()
        .filter(|r| mode.is_exception(r.note))
        .collect()
}

pub fn assemble(
    reconciled: &ReconciledSet,
    payment_total_cents: i64,
    portfolio: &[PortfolioRecord],
    mode: &PortfolioMode,
    sheets: &SheetNames,
) -> Report {
    let name = &reconciled.portfolio_name;
    let portfolio_total_cents = reconciled.totals.portfolio_amount_cents;
    let variance_cents = portfolio_total_cents - payment_total_cents;

    // -- Comparison ------------------------------------------------------

    let summary_columns: Vec<String> = [
        "ContractNumber",
        "CustomerName",
        "Type",
        "Amount",
        name.as_str(),
        "Difference",
        "Notes",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();

    let mut summary_rows: Vec<Vec<ReportCell>> = reconciled
        .rows
        .iter()
        .map(|r| {
            vec![
                ReportCell::text(&r.contract),
                ReportCell::text(&r.customer_name),
                ReportCell::text(&r.transaction_type),
                ReportCell::Money(r.amount_cents),
                ReportCell::Money(r.portfolio_amount_cents),
                ReportCell::Money(r.difference_cents),
                note_cell(r.note),
            ]
        })
        .collect();

    let totals = &reconciled.totals;
    summary_rows.push(vec![
        ReportCell::text(TOTALS_LABEL),
        ReportCell::Blank,
        ReportCell::Blank,
        ReportCell::Money(totals.amount_cents),
        ReportCell::Money(totals.portfolio_amount_cents),
        ReportCell::Money(totals.difference_cents),
        ReportCell::Blank,
    ]);

    summary_rows.push(vec![
        ReportCell::Blank,
        ReportCell::text("Payment Total:"),
        ReportCell::Money(payment_total_cents),
        ReportCell::text("Portfolio Total:"),
        ReportCell::Money(portfolio_total_cents),
        ReportCell::text("Difference:"),
        ReportCell::Money(variance_cents),
    ]);

    // -- Notes -----------------------------------------------------------

    let exception_columns: Vec<String> = ["ContractNumber", "CustomerName", "Amount", name.as_str(), "Notes"]
        .iter()
        .map(|s| s.to_string())
        .collect();

    let exception_view_rows = exception_rows(reconciled, mode)
        .into_iter()
        .map(|r| {
            vec![
                ReportCell::text(&r.contract),
                ReportCell::text(&r.customer_name),
                ReportCell::Money(r.amount_cents),
                ReportCell::Money(r.portfolio_amount_cents),
                note_cell(r.note),
            ]
        })
        .collect();

    // -- Portfolio Payments ----------------------------------------------

    let portfolio_columns: Vec<String> = ["ContractNumber", "CustomerName", "Amount", "Notes"]
        .iter()
        .map(|s| s.to_string())
        .collect();

    let portfolio_rows = portfolio
        .iter()
        .map(|r| {
            vec![
                ReportCell::text(&r.contract),
                ReportCell::text(&r.customer_name),
                ReportCell::Money(r.amount_cents),
                note_cell(r.note),
            ]
        })
        .collect();

    Report {
        summary: SheetView {
            name: sheets.summary.clone(),
            columns: summary_columns,
            rows: summary_rows,
        },
        exceptions: SheetView {
            name: sheets.exceptions.clone(),
            columns: exception_columns,
            rows: exception_view_rows,
        },
        portfolio: SheetView {
            name: sheets.portfolio.clone(),
            columns: portfolio_columns,
            rows: portfolio_rows,
        },
        payment_total_cents,
        portfolio_total_cents,
        variance_cents,
    }
}

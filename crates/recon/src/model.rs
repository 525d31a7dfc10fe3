use serde::Serialize;

use crate::report::Report;
use crate::table::RawTable;

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// Pre-loaded worksheets for one run.
pub struct TieOutInput {
    pub payment: RawTable,
    pub portfolio: RawTable,
    /// Contract column of the prior period's tie-out, if supplied.
    pub prior_contracts: Option<Vec<String>>,
}

/// Statement layout for this period. Chosen by the operator, never sniffed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "layout")]
pub enum PortfolioMode {
    /// Ledger rows end at `cut`; buyout adjustment rows follow.
    Buyout { cut: usize },
    /// Amount column may hold "Cancelled" / "Replaced" instead of a number.
    CancelledReplaced,
}

impl PortfolioMode {
    /// Whether a reconciled row belongs on the exceptions sheet for this layout.
    pub fn is_exception(&self, note: Option<Note>) -> bool {
        match self {
            Self::Buyout { .. } => note == Some(Note::Buyout),
            Self::CancelledReplaced => matches!(note, Some(Note::Cancelled | Note::Replaced)),
        }
    }
}

/// Per-run values supplied by the operator.
#[derive(Debug, Clone)]
pub struct RunParams {
    /// Payment total from the counterparty's transmittal.
    pub payment_total_cents: i64,
    pub mode: PortfolioMode,
}

// ---------------------------------------------------------------------------
// Normalized records
// ---------------------------------------------------------------------------

/// One unallocated payment from the ACH batch. The bank code used for
/// filtering is not carried.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentRecord {
    pub contract: String,
    pub customer_name: String,
    pub transaction_type: String,
    pub amount_cents: i64,
    pub program: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Note {
    Buyout,
    Cancelled,
    Replaced,
}

impl Note {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Buyout => "Buyout",
            Self::Cancelled => "Cancelled",
            Self::Replaced => "Replaced",
        }
    }

    /// Statement sentinels that stand in for an amount.
    pub fn from_amount_sentinel(s: &str) -> Option<Self> {
        match s {
            "Cancelled" => Some(Self::Cancelled),
            "Replaced" => Some(Self::Replaced),
            _ => None,
        }
    }
}

impl std::fmt::Display for Note {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One expected payment from the servicer's statement.
/// `note` is set exactly when the row needed special handling.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PortfolioRecord {
    pub contract: String,
    pub customer_name: String,
    pub amount_cents: i64,
    pub note: Option<Note>,
}

// ---------------------------------------------------------------------------
// Reconciliation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReconciledRecord {
    pub contract: String,
    pub customer_name: String,
    pub transaction_type: String,
    pub amount_cents: i64,
    pub portfolio_amount_cents: i64,
    /// `amount_cents - portfolio_amount_cents`
    pub difference_cents: i64,
    pub note: Option<Note>,
}

/// Column sums over every reconciled row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Totals {
    pub amount_cents: i64,
    pub portfolio_amount_cents: i64,
    pub difference_cents: i64,
}

impl Totals {
    pub fn from_rows(rows: &[ReconciledRecord]) -> Self {
        rows.iter().fold(Self::default(), |acc, r| Self {
            amount_cents: acc.amount_cents + r.amount_cents,
            portfolio_amount_cents: acc.portfolio_amount_cents + r.portfolio_amount_cents,
            difference_cents: acc.difference_cents + r.difference_cents,
        })
    }
}

/// Joined rows plus the trailing totals row. The totals are kept apart from
/// `rows` so per-record iteration never sees them.
#[derive(Debug, Clone, Serialize)]
pub struct ReconciledSet {
    /// Display name of the portfolio-amount column.
    pub portfolio_name: String,
    pub rows: Vec<ReconciledRecord>,
    pub totals: Totals,
}

/// Contracts dropped by the inner join, per side, in first-seen order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct JoinReport {
    pub payment_only: Vec<String>,
    pub portfolio_only: Vec<String>,
}

impl JoinReport {
    pub fn is_clean(&self) -> bool {
        self.payment_only.is_empty() && self.portfolio_only.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Summary + Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct TieOutMeta {
    pub config_name: String,
    pub engine_version: String,
    pub run_at: String,
    pub mode: PortfolioMode,
}

#[derive(Debug, Clone, Serialize)]
pub struct TieOutSummary {
    pub payment_records: usize,
    pub portfolio_records: usize,
    pub matched: usize,
    pub exceptions: usize,
    pub payment_only: usize,
    pub portfolio_only: usize,
    pub payment_total_cents: i64,
    pub portfolio_total_cents: i64,
    /// `portfolio_total_cents - payment_total_cents`
    pub variance_cents: i64,
}

#[derive(Debug, Clone)]
pub struct TieOutResult {
    pub meta: TieOutMeta,
    pub summary: TieOutSummary,
    pub payments: Vec<PaymentRecord>,
    pub portfolio: Vec<PortfolioRecord>,
    pub reconciled: ReconciledSet,
    pub join: JoinReport,
    pub report: Report,
}

/// JSON shape printed by `--json`.
#[derive(Debug, Serialize)]
pub struct TieOutJson<'a> {
    pub meta: &'a TieOutMeta,
    pub summary: &'a TieOutSummary,
    pub join: &'a JoinReport,
    pub reconciled: &'a ReconciledSet,
}

impl TieOutResult {
    pub fn to_json(&self) -> TieOutJson<'_> {
        TieOutJson {
            meta: &self.meta,
            summary: &self.summary,
            join: &self.join,
            reconciled: &self.reconciled,
        }
    }
}

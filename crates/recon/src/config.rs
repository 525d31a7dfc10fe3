use std::collections::HashSet;

use serde::{Deserialize, Deserializer};

use crate::contract::ContractFormat;
use crate::error::ReconError;
use crate::table::{column_index, column_letter};

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Layout parameters for one portfolio's tie-out. Periods drift, so every
/// column position, filter code and skip count lives here.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReconConfig {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default)]
    pub payment: PaymentConfig,
    #[serde(default)]
    pub portfolio: PortfolioConfig,
    #[serde(default)]
    pub report: ReportConfig,
}

fn default_name() -> String {
    "Portfolio tie-out".into()
}

impl Default for ReconConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            payment: PaymentConfig::default(),
            portfolio: PortfolioConfig::default(),
            report: ReportConfig::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Column references
// ---------------------------------------------------------------------------

/// A worksheet column, written as its letter in config ("A", "G").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Column(pub usize);

impl Column {
    pub fn index(&self) -> usize {
        self.0
    }
}

impl std::fmt::Display for Column {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&column_letter(self.0))
    }
}

impl<'de> Deserialize<'de> for Column {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let letters = String::deserialize(deserializer)?;
        column_index(&letters)
            .map(Column)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid column letter '{letters}'")))
    }
}

// ---------------------------------------------------------------------------
// Payment batch
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PaymentConfig {
    #[serde(default)]
    pub columns: PaymentColumns,
    /// First row of the sheet is a header row.
    #[serde(default = "default_true")]
    pub header: bool,
    /// Keep rows whose transaction type equals this code.
    #[serde(default = "default_transaction_type")]
    pub transaction_type: String,
    /// Keep rows whose bank code equals this code.
    #[serde(default = "default_bank_code")]
    pub bank_code: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PaymentColumns {
    pub contract: Column,
    pub customer: Column,
    pub transaction_type: Column,
    pub bank_code: Column,
    pub amount: Column,
    pub program: Column,
}

impl PaymentColumns {
    pub fn all(&self) -> [(&'static str, Column); 6] {
        [
            ("ContractNumber", self.contract),
            ("CustomerName", self.customer),
            ("Type", self.transaction_type),
            ("Bank Code", self.bank_code),
            ("Amount", self.amount),
            ("Program", self.program),
        ]
    }
}

impl Default for PaymentColumns {
    fn default() -> Self {
        Self {
            contract: Column(0),
            customer: Column(1),
            transaction_type: Column(2),
            bank_code: Column(3),
            amount: Column(6),
            program: Column(7),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_transaction_type() -> String {
    "U".into()
}

fn default_bank_code() -> String {
    "999.99".into()
}

impl Default for PaymentConfig {
    fn default() -> Self {
        Self {
            columns: PaymentColumns::default(),
            header: true,
            transaction_type: default_transaction_type(),
            bank_code: default_bank_code(),
        }
    }
}

// ---------------------------------------------------------------------------
// Portfolio statement
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PortfolioConfig {
    /// Column positions for the cancelled/replaced layout.
    #[serde(default)]
    pub columns: PortfolioColumns,
    /// Note rows above the header.
    #[serde(default = "default_skip_rows")]
    pub skip_rows: usize,
    /// Note and signature rows at the bottom of the statement.
    #[serde(default = "default_skip_footer")]
    pub skip_footer: usize,
    #[serde(default = "default_true")]
    pub header: bool,
    #[serde(default = "default_grand_total")]
    pub grand_total_label: String,
    #[serde(default)]
    pub contract: ContractFormat,
    #[serde(default)]
    pub buyout: BuyoutLayout,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PortfolioColumns {
    pub contract: Column,
    pub customer: Column,
    pub amount: Column,
}

impl Default for PortfolioColumns {
    fn default() -> Self {
        Self {
            contract: Column(0),
            customer: Column(2),
            amount: Column(3),
        }
    }
}

/// Buyout statements are read by header name; the adjustment rows below the
/// ledger are shifted one column right of the marker.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BuyoutLayout {
    #[serde(default = "default_contract_header")]
    pub contract_header: String,
    #[serde(default = "default_customer_header")]
    pub customer_header: String,
    #[serde(default = "default_amount_header")]
    pub amount_header: String,
    /// Value in the contract column that marks an adjustment row.
    #[serde(default = "default_marker")]
    pub marker: String,
    #[serde(default = "default_buyout_contract")]
    pub contract_column: Column,
    #[serde(default = "default_buyout_customer")]
    pub customer_column: Column,
    #[serde(default = "default_buyout_amount")]
    pub amount_column: Column,
}

fn default_skip_rows() -> usize {
    2
}

fn default_skip_footer() -> usize {
    9
}

fn default_grand_total() -> String {
    "Grand Total".into()
}

fn default_contract_header() -> String {
    "ContractNumber".into()
}

fn default_customer_header() -> String {
    "CustomerName".into()
}

fn default_amount_header() -> String {
    "Amount".into()
}

fn default_marker() -> String {
    "Buyout".into()
}

fn default_buyout_contract() -> Column {
    Column(1)
}

fn default_buyout_customer() -> Column {
    Column(2)
}

fn default_buyout_amount() -> Column {
    Column(3)
}

impl Default for BuyoutLayout {
    fn default() -> Self {
        Self {
            contract_header: default_contract_header(),
            customer_header: default_customer_header(),
            amount_header: default_amount_header(),
            marker: default_marker(),
            contract_column: default_buyout_contract(),
            customer_column: default_buyout_customer(),
            amount_column: default_buyout_amount(),
        }
    }
}

impl Default for PortfolioConfig {
    fn default() -> Self {
        Self {
            columns: PortfolioColumns::default(),
            skip_rows: default_skip_rows(),
            skip_footer: default_skip_footer(),
            header: true,
            grand_total_label: default_grand_total(),
            contract: ContractFormat::default(),
            buyout: BuyoutLayout::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReportConfig {
    /// Header of the portfolio-amount column.
    #[serde(default = "default_portfolio_name")]
    pub portfolio_name: String,
    #[serde(default)]
    pub sheets: SheetNames,
    #[serde(default = "default_number_format")]
    pub number_format: String,
    #[serde(default = "default_column_width")]
    pub column_width: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SheetNames {
    #[serde(default = "default_summary_sheet")]
    pub summary: String,
    #[serde(default = "default_exceptions_sheet")]
    pub exceptions: String,
    #[serde(default = "default_portfolio_sheet")]
    pub portfolio: String,
}

fn default_portfolio_name() -> String {
    "Clark LLC".into()
}

fn default_number_format() -> String {
    "#,##0.00".into()
}

fn default_column_width() -> f64 {
    15.0
}

fn default_summary_sheet() -> String {
    "Comparison".into()
}

fn default_exceptions_sheet() -> String {
    "Notes".into()
}

fn default_portfolio_sheet() -> String {
    "Portfolio Payments".into()
}

impl Default for SheetNames {
    fn default() -> Self {
        Self {
            summary: default_summary_sheet(),
            exceptions: default_exceptions_sheet(),
            portfolio: default_portfolio_sheet(),
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            portfolio_name: default_portfolio_name(),
            sheets: SheetNames::default(),
            number_format: default_number_format(),
            column_width: default_column_width(),
        }
    }
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

/// Excel rejects these in sheet names.
const SHEET_NAME_FORBIDDEN: &[char] = &['[', ']', ':', '*', '?', '/', '\\'];

impl ReconConfig {
    pub fn from_toml(input: &str) -> Result<Self, ReconError> {
        let config: ReconConfig =
            toml::from_str(input).map_err(|e| ReconError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        // Payment columns must be distinct
        let mut seen = HashSet::new();
        for (name, col) in self.payment.columns.all() {
            if !seen.insert(col) {
                return Err(ReconError::ConfigValidation(format!(
                    "payment column {col} is mapped twice (again for '{name}')"
                )));
            }
        }

        let cols = &self.portfolio.columns;
        if cols.contract == cols.customer || cols.contract == cols.amount || cols.customer == cols.amount {
            return Err(ReconError::ConfigValidation(
                "portfolio contract, customer and amount columns must differ".into(),
            ));
        }

        let b = &self.portfolio.buyout;
        if b.contract_column == b.customer_column
            || b.contract_column == b.amount_column
            || b.customer_column == b.amount_column
        {
            return Err(ReconError::ConfigValidation(
                "buyout contract, customer and amount columns must differ".into(),
            ));
        }

        let contract = &self.portfolio.contract;
        if contract.length == 0 {
            return Err(ReconError::ConfigValidation("contract length must be greater than 0".into()));
        }

        // Prefix rules: 3 characters, non-empty ranges, ordered, no overlap
        let mut prev_end: Option<usize> = None;
        for (i, rule) in contract.prefix_rules.iter().enumerate() {
            if rule.prefix.chars().count() != 3 {
                return Err(ReconError::ConfigValidation(format!(
                    "prefix rule {i}: prefix '{}' must be exactly 3 characters",
                    rule.prefix
                )));
            }
            if let Some(end) = rule.end {
                if end <= rule.start {
                    return Err(ReconError::ConfigValidation(format!(
                        "prefix rule {i}: end {end} must be greater than start {}",
                        rule.start
                    )));
                }
            }
            if i > 0 {
                match prev_end {
                    None => {
                        return Err(ReconError::ConfigValidation(format!(
                            "prefix rule {i} follows an open-ended rule"
                        )));
                    }
                    Some(end) if rule.start < end => {
                        return Err(ReconError::ConfigValidation(format!(
                            "prefix rule {i} starts at {} inside the previous rule (ends at {end})",
                            rule.start
                        )));
                    }
                    _ => {}
                }
            }
            prev_end = rule.end;
        }

        // Sheet names: non-empty, distinct, Excel-legal
        let sheets = &self.report.sheets;
        let names = [&sheets.summary, &sheets.exceptions, &sheets.portfolio];
        for name in names {
            if name.trim().is_empty() {
                return Err(ReconError::ConfigValidation("sheet names must not be empty".into()));
            }
            if name.chars().count() > 31 || name.contains(SHEET_NAME_FORBIDDEN) {
                return Err(ReconError::ConfigValidation(format!(
                    "sheet name '{name}' is not a valid worksheet name"
                )));
            }
        }
        let distinct: HashSet<String> = names.iter().map(|n| n.to_lowercase()).collect();
        if distinct.len() != names.len() {
            return Err(ReconError::ConfigValidation("sheet names must be distinct".into()));
        }

        if self.report.portfolio_name.trim().is_empty() {
            return Err(ReconError::ConfigValidation("portfolio name must not be empty".into()));
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

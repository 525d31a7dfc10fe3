//! Servicer portfolio statement → [`PortfolioRecord`]s.
//!
//! Two statement layouts exist and the operator says which one a file uses:
//!
//! - **Buyout**: ledger rows down to the cut row, then adjustment rows whose
//!   contract column holds the buyout marker. An adjustment replaces the
//!   ledger amount of its contract and tags it `Buyout`.
//! - **Cancelled/Replaced**: a noisy sheet with notes above and below the
//!   ledger; the amount cell may hold `Cancelled` or `Replaced`, which reads
//!   as a zero amount tagged with that note.

use std::collections::HashMap;

use crate::config::{BuyoutLayout, PortfolioConfig};
use crate::contract::{normalize_contract, PLACEHOLDER};
use crate::error::{ReconError, SourceKind};
use crate::model::{Note, PortfolioMode, PortfolioRecord};
use crate::money::cents_from_cell;
use crate::table::{RawCell, RawTable};

/// A statement amount cell: either a number or a sentinel in its place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LedgerAmount {
    Value(i64),
    Sentinel(Note),
}

impl LedgerAmount {
    fn read(cell: &RawCell, row: usize) -> Result<Self, ReconError> {
        if let Some(note) = cell.as_str().and_then(Note::from_amount_sentinel) {
            return Ok(Self::Sentinel(note));
        }
        cents_from_cell(cell)
            .map(Self::Value)
            .map_err(|_| coercion_error(row, "Amount", cell))
    }

    fn into_parts(self) -> (i64, Option<Note>) {
        match self {
            Self::Value(cents) => (cents, None),
            Self::Sentinel(note) => (0, Some(note)),
        }
    }
}

fn coercion_error(row: usize, column: &str, cell: &RawCell) -> ReconError {
    ReconError::TypeCoercion {
        source: SourceKind::Portfolio,
        row,
        column: column.into(),
        value: cell.to_text().unwrap_or_default(),
    }
}

fn schema_error(detail: impl Into<String>) -> ReconError {
    ReconError::SchemaMismatch {
        source: SourceKind::Portfolio,
        detail: detail.into(),
    }
}

/// Normalize a statement. `prior_contracts` only applies to the
/// cancelled/replaced layout.
pub fn parse_portfolio(
    table: &RawTable,
    config: &PortfolioConfig,
    mode: PortfolioMode,
    prior_contracts: Option<&[String]>,
) -> Result<Vec<PortfolioRecord>, ReconError> {
    match mode {
        PortfolioMode::Buyout { cut } => {
            if prior_contracts.is_some() {
                log::info!("prior-period contracts are not used for buyout statements");
            }
            parse_buyout(table, &config.buyout, cut)
        }
        PortfolioMode::CancelledReplaced => parse_cancelled_replaced(table, config, prior_contracts),
    }
}

// ---------------------------------------------------------------------------
// Buyout layout
// ---------------------------------------------------------------------------

struct BuyoutAdjustment {
    customer_name: Option<String>,
    amount_cents: i64,
}

fn parse_buyout(table: &RawTable, layout: &BuyoutLayout, cut: usize) -> Result<Vec<PortfolioRecord>, ReconError> {
    if table.is_empty() {
        return Err(schema_error("statement has no header row"));
    }
    let marker_col = table
        .find_in_row(0, &layout.contract_header)
        .ok_or_else(|| schema_error(format!("no '{}' column in header", layout.contract_header)))?;

    // Adjustments come from the whole sheet, before the ledger is cut.
    let mut adjustments: HashMap<String, BuyoutAdjustment> = HashMap::new();
    for r in 1..table.height() {
        if table.cell(r, marker_col).as_str() != Some(layout.marker.as_str()) {
            continue;
        }
        let Some(contract) = table.cell(r, layout.contract_column.index()).to_text() else {
            log::warn!("row {}: {} row without a contract number, ignored", r + 1, layout.marker);
            continue;
        };
        let amount_cell = table.cell(r, layout.amount_column.index());
        let amount_cents = cents_from_cell(amount_cell).map_err(|_| coercion_error(r + 1, "Amount", amount_cell))?;
        let customer_name = table.cell(r, layout.customer_column.index()).to_text();
        let adjustment = BuyoutAdjustment { customer_name, amount_cents };
        if adjustments.insert(contract.clone(), adjustment).is_some() {
            log::warn!("contract {contract}: more than one {} row, using the last", layout.marker);
        }
    }

    // Header + the first `cut` ledger rows, without columns that are empty throughout.
    if cut + 1 > table.height() {
        log::debug!("cut row {cut} is past the end of the statement ({} data rows)", table.height() - 1);
    }
    let main = table.truncate(cut + 1).drop_empty_columns(1);

    let col = |name: &str| {
        main.find_in_row(0, name)
            .ok_or_else(|| schema_error(format!("no '{name}' column with data in the first {cut} row(s)")))
    };
    let contract_col = col(&layout.contract_header)?;
    let customer_col = col(&layout.customer_header)?;
    let amount_col = col(&layout.amount_header)?;

    let mut records = Vec::new();
    for r in 1..main.height() {
        if main.is_row_blank(r) {
            continue;
        }
        let contract = main
            .cell(r, contract_col)
            .to_text()
            .unwrap_or_else(|| PLACEHOLDER.to_string());
        if contract == layout.marker {
            continue;
        }
        let mut customer_name = main.cell(r, customer_col).to_text().unwrap_or_default();

        let (amount_cents, note) = match adjustments.get(&contract) {
            Some(adj) => {
                match adj.customer_name.as_deref() {
                    Some(name) if customer_name.is_empty() => customer_name = name.to_string(),
                    Some(name) if name != customer_name => {
                        log::warn!("contract {contract}: {} row names '{name}', ledger has '{customer_name}'", layout.marker);
                    }
                    _ => {}
                }
                (adj.amount_cents, Some(Note::Buyout))
            }
            None => {
                let cell = main.cell(r, amount_col);
                let cents = cents_from_cell(cell).map_err(|_| coercion_error(r + 1, "Amount", cell))?;
                (cents, None)
            }
        };

        records.push(PortfolioRecord {
            contract,
            customer_name,
            amount_cents,
            note,
        });
    }

    let unmatched = adjustments
        .keys()
        .filter(|k| !records.iter().any(|rec| &rec.contract == *k))
        .count();
    if unmatched > 0 {
        log::warn!("{unmatched} buyout adjustment(s) reference contracts not in the ledger");
    }

    Ok(records)
}

// ---------------------------------------------------------------------------
// Cancelled / Replaced layout
// ---------------------------------------------------------------------------

fn parse_cancelled_replaced(
    table: &RawTable,
    config: &PortfolioConfig,
    prior_contracts: Option<&[String]>,
) -> Result<Vec<PortfolioRecord>, ReconError> {
    let top = config.skip_rows + usize::from(config.header);
    let body = table.slice_rows(top, config.skip_footer);
    let cols = &config.columns;

    // Sheet row of body row 0, 1-based
    let first_sheet_row = top + 1;

    let widest = cols.contract.index().max(cols.customer.index()).max(cols.amount.index());
    if !body.is_empty() && table.width() <= widest {
        return Err(schema_error(format!(
            "sheet has {} column(s); layout reads up to column {}",
            table.width(),
            crate::table::column_letter(widest)
        )));
    }

    let mut contracts = Vec::new();
    let mut customers = Vec::new();
    let mut amounts = Vec::new();

    for r in 0..body.height() {
        let contract_cell = body.cell(r, cols.contract.index());
        let customer_cell = body.cell(r, cols.customer.index());
        let amount_cell = body.cell(r, cols.amount.index());

        // A row missing any of the three cells is a note, spacer or total.
        if contract_cell.is_blank() || customer_cell.is_blank() || amount_cell.is_blank() {
            log::trace!("statement row {}: incomplete, dropped", first_sheet_row + r);
            continue;
        }
        let customer = customer_cell.to_text().unwrap_or_default();
        if customer == config.grand_total_label {
            continue;
        }

        // Ordinal is the position in the statement, before any row is dropped.
        let contract_text = contract_cell.to_text();
        let contract = normalize_contract(contract_text.as_deref(), r, &config.contract);

        let amount = LedgerAmount::read(amount_cell, first_sheet_row + r)?;
        contracts.push(contract);
        customers.push(customer);
        amounts.push(amount);
    }

    if let Some(prior) = prior_contracts {
        if prior.len() != contracts.len() {
            return Err(schema_error(format!(
                "prior-period file lists {} contract(s) but the statement has {} row(s)",
                prior.len(),
                contracts.len()
            )));
        }
        contracts = prior.to_vec();
    }

    let records: Vec<PortfolioRecord> = contracts
        .into_iter()
        .zip(customers)
        .zip(amounts)
        .map(|((contract, customer_name), amount)| {
            let (amount_cents, note) = amount.into_parts();
            PortfolioRecord {
                contract,
                customer_name,
                amount_cents,
                note,
            }
        })
        .collect();

    log::debug!(
        "portfolio statement: {} row(s), {} cancelled/replaced",
        records.len(),
        records.iter().filter(|r| r.note.is_some()).count()
    );

    Ok(records)
}

/// Contract list from a prior period's tie-out: column A below the header,
/// blank cells skipped.
pub fn prior_period_contracts(table: &RawTable) -> Vec<String> {
    (1..table.height())
        .filter_map(|r| table.cell(r, 0).to_text())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::PrefixRule;

    fn row(cells: &[RawCell]) -> Vec<RawCell> {
        cells.to_vec()
    }

    fn s(v: &str) -> RawCell {
        RawCell::from(v)
    }

    fn n(v: f64) -> RawCell {
        RawCell::Number(v)
    }

    // -- Buyout ----------------------------------------------------------

    fn buyout_sheet() -> RawTable {
        let mut rows = vec![row(&[s("ContractNumber"), s("CustomerName"), s("Amount"), s(""), s("Extra")])];
        for i in 0..9 {
            rows.push(row(&[s(&format!("K{i}")), s(&format!("Name {i}")), n(100.0 + i as f64)]));
        }
        rows.push(row(&[]));
        rows.push(row(&[s("Buyout"), s("K2"), s("Name 2"), n(5000.125)]));
        rows.push(row(&[s("Buyout"), s("K7"), s("Name 7"), n(812.4)]));
        RawTable::new(rows)
    }

    #[test]
    fn buyout_overrides_ledger_amount() {
        let records = parse_buyout(&buyout_sheet(), &BuyoutLayout::default(), 9).unwrap();
        assert_eq!(records.len(), 9);

        let tagged: Vec<&PortfolioRecord> = records.iter().filter(|r| r.note == Some(Note::Buyout)).collect();
        assert_eq!(tagged.len(), 2);
        assert_eq!(tagged[0].contract, "K2");
        assert_eq!(tagged[0].amount_cents, 500012);
        assert_eq!(tagged[1].contract, "K7");
        assert_eq!(tagged[1].amount_cents, 81240);

        let k3 = records.iter().find(|r| r.contract == "K3").unwrap();
        assert_eq!(k3.amount_cents, 10300);
        assert_eq!(k3.note, None);
    }

    #[test]
    fn buyout_cut_limits_ledger() {
        let records = parse_buyout(&buyout_sheet(), &BuyoutLayout::default(), 4).unwrap();
        assert_eq!(records.len(), 4);
        assert_eq!(records.iter().filter(|r| r.note.is_some()).count(), 1);
    }

    #[test]
    fn buyout_missing_header_is_schema_mismatch() {
        let table = RawTable::new(vec![row(&[s("Contract"), s("Name"), s("Amt")])]);
        let err = parse_buyout(&table, &BuyoutLayout::default(), 1).unwrap_err();
        assert!(matches!(err, ReconError::SchemaMismatch { .. }));
    }

    #[test]
    fn buyout_empty_amount_column_is_schema_mismatch() {
        let table = RawTable::new(vec![
            row(&[s("ContractNumber"), s("CustomerName"), s("Amount")]),
            row(&[s("K1"), s("Name")]),
        ]);
        let err = parse_buyout(&table, &BuyoutLayout::default(), 1).unwrap_err();
        assert!(err.to_string().contains("'Amount'"));
    }

    #[test]
    fn buyout_customer_fills_blank_ledger_name() {
        let table = RawTable::new(vec![
            row(&[s("ContractNumber"), s("CustomerName"), s("Amount")]),
            row(&[s("K1"), s("Name 1"), n(10.0)]),
            row(&[s("K2"), s(""), n(20.0)]),
            row(&[]),
            row(&[s("Buyout"), s("K2"), s("Name 2"), n(35.0)]),
        ]);
        let records = parse_buyout(&table, &BuyoutLayout::default(), 2).unwrap();
        assert_eq!(records[1].contract, "K2");
        assert_eq!(records[1].customer_name, "Name 2");
        assert_eq!(records[1].amount_cents, 3500);
        assert_eq!(records[0].customer_name, "Name 1");
    }

    #[test]
    fn buyout_customer_read_from_configured_column() {
        let table = RawTable::new(vec![
            row(&[s("ContractNumber"), s("CustomerName"), s("Amount")]),
            row(&[s("K0"), s("Name 0"), n(5.0)]),
            row(&[s("K1"), s(""), n(10.0)]),
            row(&[]),
            row(&[s("Buyout"), s("K1"), s("wrong"), n(12.0), s("Name 1")]),
        ]);
        let layout = BuyoutLayout {
            customer_column: crate::config::Column(4),
            ..BuyoutLayout::default()
        };
        let records = parse_buyout(&table, &layout, 2).unwrap();
        assert_eq!(records[1].customer_name, "Name 1");
        assert_eq!(records[1].amount_cents, 1200);
    }

    // -- Cancelled / Replaced --------------------------------------------

    fn statement_config() -> PortfolioConfig {
        let mut config = PortfolioConfig {
            skip_rows: 1,
            skip_footer: 2,
            ..PortfolioConfig::default()
        };
        config.contract.prefix_rules = vec![
            PrefixRule { start: 0, end: Some(2), prefix: "001".into() },
            PrefixRule { start: 2, end: None, prefix: "040".into() },
        ];
        config
    }

    fn statement_sheet() -> RawTable {
        RawTable::new(vec![
            row(&[s("Clark LLC portfolio, June")]),
            row(&[s("Contract"), s("Company Contract"), s("Customer Name"), s("Payment")]),
            row(&[s("12345678901"), s("x"), s("Acme"), n(250.0)]),
            row(&[s("22345678901"), s("x"), s("Bolt"), s("Cancelled")]),
            row(&[]),
            row(&[s("040-32345678901"), s("x"), s("Crane"), s("Replaced")]),
            row(&[s("42345678901"), s("x"), s("Dune"), s("$1,020.10")]),
            row(&[s(""), s(""), s("Grand Total"), n(1270.10)]),
            row(&[s("Prepared by")]),
            row(&[s("Signature")]),
        ])
    }

    #[test]
    fn sentinels_become_zero_with_note() {
        let records = parse_cancelled_replaced(&statement_sheet(), &statement_config(), None).unwrap();
        assert_eq!(records.len(), 4);

        assert_eq!(records[0].contract, "001-12345678901");
        assert_eq!(records[0].amount_cents, 25000);
        assert_eq!(records[0].note, None);

        assert_eq!(records[1].contract, "001-22345678901");
        assert_eq!(records[1].amount_cents, 0);
        assert_eq!(records[1].note, Some(Note::Cancelled));

        assert_eq!(records[2].contract, "040-32345678901");
        assert_eq!(records[2].note, Some(Note::Replaced));

        // Ordinal counts the blank row that was dropped
        assert_eq!(records[3].contract, "040-42345678901");
        assert_eq!(records[3].amount_cents, 102010);
    }

    #[test]
    fn note_set_iff_sentinel() {
        let records = parse_cancelled_replaced(&statement_sheet(), &statement_config(), None).unwrap();
        let noted: Vec<&str> = records
            .iter()
            .filter(|r| r.note.is_some())
            .map(|r| r.customer_name.as_str())
            .collect();
        assert_eq!(noted, vec!["Bolt", "Crane"]);
        assert!(records.iter().filter(|r| r.note.is_some()).all(|r| r.amount_cents == 0));
    }

    #[test]
    fn bad_amount_is_type_coercion_with_sheet_row() {
        let table = RawTable::new(vec![
            row(&[s("note")]),
            row(&[s("Contract"), s(""), s("Name"), s("Amount")]),
            row(&[s("12345678901"), s(""), s("Acme"), s("Void")]),
        ]);
        let config = PortfolioConfig {
            skip_rows: 1,
            skip_footer: 0,
            ..PortfolioConfig::default()
        };
        let err = parse_cancelled_replaced(&table, &config, None).unwrap_err();
        match err {
            ReconError::TypeCoercion { row, value, .. } => {
                assert_eq!(row, 3);
                assert_eq!(value, "Void");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn numeric_contract_cell_is_prefixed() {
        let table = RawTable::new(vec![
            row(&[s("note")]),
            row(&[s("Contract"), s(""), s("Name"), s("Amount")]),
            row(&[n(12345678901.0), RawCell::Empty, s("Acme"), n(10.0)]),
        ]);
        let mut config = PortfolioConfig {
            skip_rows: 1,
            skip_footer: 0,
            ..PortfolioConfig::default()
        };
        config.contract.prefix_rules = vec![PrefixRule { start: 0, end: None, prefix: "001".into() }];
        let records = parse_cancelled_replaced(&table, &config, None).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].contract, "001-12345678901");
        assert_eq!(records[0].amount_cents, 1000);
    }

    #[test]
    fn rows_with_a_blank_cell_are_dropped() {
        let mut rows: Vec<Vec<RawCell>> = statement_sheet().rows().map(|r| r.to_vec()).collect();
        rows.insert(7, row(&[s("Subtotal note"), RawCell::Empty, s("See attached"), RawCell::Empty]));
        rows.insert(8, row(&[RawCell::Empty, RawCell::Empty, RawCell::Empty, n(99.0)]));
        let records = parse_cancelled_replaced(&RawTable::new(rows), &statement_config(), None).unwrap();

        let customers: Vec<&str> = records.iter().map(|r| r.customer_name.as_str()).collect();
        assert_eq!(customers, vec!["Acme", "Bolt", "Crane", "Dune"]);
    }

    #[test]
    fn prior_contracts_override_positionally() {
        let prior: Vec<String> = ["001-A", "001-B", "040-C", "040-D"].iter().map(|s| s.to_string()).collect();
        let records = parse_cancelled_replaced(&statement_sheet(), &statement_config(), Some(&prior)).unwrap();
        let contracts: Vec<&str> = records.iter().map(|r| r.contract.as_str()).collect();
        assert_eq!(contracts, vec!["001-A", "001-B", "040-C", "040-D"]);
        assert_eq!(records[1].note, Some(Note::Cancelled));
    }

    #[test]
    fn prior_contract_count_mismatch() {
        let prior = vec!["001-A".to_string()];
        let err = parse_cancelled_replaced(&statement_sheet(), &statement_config(), Some(&prior)).unwrap_err();
        assert!(matches!(err, ReconError::SchemaMismatch { .. }));
    }

    #[test]
    fn prior_period_column_a() {
        let table = RawTable::new(vec![
            row(&[s("ContractNumber"), s("CustomerName")]),
            row(&[s("001-A"), s("Acme")]),
            row(&[s("001-B"), s("Bolt")]),
            row(&[s(""), s("")]),
            row(&[s(""), s("Payment Total:")]),
        ]);
        assert_eq!(prior_period_contracts(&table), vec!["001-A", "001-B"]);
    }
}

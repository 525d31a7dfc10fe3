//! ACH payment batch → [`PaymentRecord`]s.
//!
//! Columns are taken by position; header text in the batch is never trusted.
//! Only rows carrying the configured transaction type and bank code survive.

use crate::config::PaymentConfig;
use crate::error::{ReconError, SourceKind};
use crate::model::PaymentRecord;
use crate::money::cents_from_cell;
use crate::table::RawTable;

pub fn parse_payments(table: &RawTable, config: &PaymentConfig) -> Result<Vec<PaymentRecord>, ReconError> {
    let cols = &config.columns;
    let widest = cols
        .all()
        .iter()
        .map(|(_, c)| c.index())
        .max()
        .unwrap_or(0);

    if table.width() <= widest {
        let missing: Vec<String> = cols
            .all()
            .iter()
            .filter(|(_, c)| c.index() >= table.width())
            .map(|(name, c)| format!("{name} ({c})"))
            .collect();
        return Err(ReconError::SchemaMismatch {
            source: SourceKind::Payment,
            detail: format!(
                "sheet has {} column(s); missing {}",
                table.width(),
                missing.join(", ")
            ),
        });
    }

    let first = usize::from(config.header);
    let mut records = Vec::new();
    let mut skipped = 0usize;

    for r in first..table.height() {
        let text = |c: crate::config::Column| table.cell(r, c.index()).to_text().unwrap_or_default();

        let transaction_type = text(cols.transaction_type);
        let bank_code = text(cols.bank_code);
        if transaction_type != config.transaction_type || bank_code != config.bank_code {
            skipped += 1;
            continue;
        }

        let amount_cell = table.cell(r, cols.amount.index());
        let amount_cents = cents_from_cell(amount_cell).map_err(|_| ReconError::TypeCoercion {
            source: SourceKind::Payment,
            row: r + 1,
            column: "Amount".into(),
            value: amount_cell.to_text().unwrap_or_default(),
        })?;

        records.push(PaymentRecord {
            contract: text(cols.contract),
            customer_name: text(cols.customer),
            transaction_type,
            amount_cents,
            program: text(cols.program),
        });
    }

    log::debug!(
        "payment batch: {} row(s) kept, {} filtered out (type={}, bank code={})",
        records.len(),
        skipped,
        config.transaction_type,
        config.bank_code
    );

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::RawCell;
    use proptest::prelude::*;

    fn ach_row(contract: &str, kind: &str, bank: RawCell, amount: RawCell) -> Vec<RawCell> {
        vec![
            RawCell::from(contract),
            RawCell::from("Customer"),
            RawCell::from(kind),
            bank,
            RawCell::Number(1.0),
            RawCell::Number(2.0),
            amount,
            RawCell::from("P1"),
        ]
    }

    fn header() -> Vec<RawCell> {
        ["Contract", "Name", "Type", "Bank", "Other", "Some", "Amount", "Program"]
            .iter()
            .map(|s| RawCell::from(*s))
            .collect()
    }

    #[test]
    fn keeps_only_matching_type_and_bank_code() {
        let mut rows = vec![header()];
        for i in 0..5 {
            rows.push(ach_row(&format!("C{i}"), "U", RawCell::from("999.99"), RawCell::Number(10.0)));
        }
        rows.push(ach_row("N1", "N", RawCell::from("999.99"), RawCell::Number(10.0)));
        rows.push(ach_row("N2", "U", RawCell::from("123.45"), RawCell::Number(10.0)));
        rows.push(ach_row("N3", "N", RawCell::from("123.45"), RawCell::Number(10.0)));

        let records = parse_payments(&RawTable::new(rows), &PaymentConfig::default()).unwrap();
        assert_eq!(records.len(), 5);
        assert!(records.iter().all(|r| r.transaction_type == "U"));
        assert_eq!(records[0].contract, "C0");
        assert_eq!(records[4].contract, "C4");
        assert_eq!(records[0].amount_cents, 1000);
        assert_eq!(records[0].program, "P1");
    }

    #[test]
    fn numeric_bank_code_cell_matches() {
        let rows = vec![header(), ach_row("C1", "U", RawCell::Number(999.99), RawCell::Number(5.5))];
        let records = parse_payments(&RawTable::new(rows), &PaymentConfig::default()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].amount_cents, 550);
    }

    #[test]
    fn no_matching_rows_is_not_an_error() {
        let rows = vec![header(), ach_row("C1", "N", RawCell::from("999.99"), RawCell::Number(5.0))];
        let records = parse_payments(&RawTable::new(rows), &PaymentConfig::default()).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn narrow_sheet_is_schema_mismatch() {
        let rows = vec![vec![RawCell::from("A"), RawCell::from("B")]];
        let err = parse_payments(&RawTable::new(rows), &PaymentConfig::default()).unwrap_err();
        match err {
            ReconError::SchemaMismatch { source, detail } => {
                assert_eq!(source, SourceKind::Payment);
                assert!(detail.contains("Amount (G)"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn unreadable_amount_reports_sheet_row() {
        let rows = vec![
            header(),
            ach_row("C1", "U", RawCell::from("999.99"), RawCell::Number(5.0)),
            ach_row("C2", "U", RawCell::from("999.99"), RawCell::from("n/a")),
        ];
        let err = parse_payments(&RawTable::new(rows), &PaymentConfig::default()).unwrap_err();
        match err {
            ReconError::TypeCoercion { row, value, .. } => {
                assert_eq!(row, 3);
                assert_eq!(value, "n/a");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn unreadable_amount_on_filtered_row_is_ignored() {
        let rows = vec![header(), ach_row("C1", "N", RawCell::from("999.99"), RawCell::from("n/a"))];
        assert!(parse_payments(&RawTable::new(rows), &PaymentConfig::default()).unwrap().is_empty());
    }

    proptest! {
        #[test]
        fn every_record_passed_the_filter(
            kinds in proptest::collection::vec(prop_oneof![Just("U"), Just("N"), Just("R")], 0..30),
            banks in proptest::collection::vec(prop_oneof![Just("999.99"), Just("100.00")], 30),
        ) {
            let mut rows = vec![header()];
            let mut expected = 0;
            for (i, kind) in kinds.iter().enumerate() {
                if *kind == "U" && banks[i] == "999.99" {
                    expected += 1;
                }
                rows.push(ach_row(&format!("C{i}"), kind, RawCell::from(banks[i]), RawCell::Number(1.25)));
            }
            let records = parse_payments(&RawTable::new(rows), &PaymentConfig::default()).unwrap();
            prop_assert_eq!(records.len(), expected);
            prop_assert!(records.iter().all(|r| r.transaction_type == "U"));
        }
    }
}

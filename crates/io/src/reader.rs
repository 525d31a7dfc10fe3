// Worksheet import (xlsx, xls, xlsb, ods) into the engine's RawTable.
//
// Only the first sheet of each file is read. Cells keep the kind calamine
// reports (text, number, bool); dates come through as serial numbers and
// errors as their text, which downstream parsing rejects where a number is
// required.

use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};
use tieout_recon::error::{ReconError, SourceKind};
use tieout_recon::portfolio::prior_period_contracts;
use tieout_recon::{RawCell, RawTable};

/// Read the first worksheet of `path`, anchored at A1.
pub fn read_first_sheet(path: &Path, source: SourceKind) -> Result<RawTable, ReconError> {
    let not_found = |reason: String| ReconError::SourceNotFound {
        path: path.display().to_string(),
        reason,
    };

    if !path.exists() {
        return Err(not_found("no such file".into()));
    }

    let mut workbook = open_workbook_auto(path).map_err(|e| not_found(e.to_string()))?;

    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| ReconError::SchemaMismatch {
            source,
            detail: "workbook contains no sheets".into(),
        })?;

    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| not_found(format!("failed to read sheet '{sheet_name}': {e}")))?;

    // Range start offset (data may not begin at A1)
    let (start_row, start_col) = range.start().unwrap_or((0, 0));
    let (start_row, start_col) = (start_row as usize, start_col as usize);

    let mut rows: Vec<Vec<RawCell>> = vec![Vec::new(); start_row];
    for row in range.rows() {
        let mut cells = vec![RawCell::Empty; start_col];
        cells.extend(row.iter().map(convert_cell));
        rows.push(cells);
    }

    let table = RawTable::new(rows);
    log::debug!(
        "{source}: read sheet '{sheet_name}' from {} ({} rows x {} cols)",
        path.display(),
        table.height(),
        table.width()
    );
    Ok(table)
}

/// Contract column of a prior period's tie-out workbook.
pub fn read_prior_contracts(path: &Path) -> Result<Vec<String>, ReconError> {
    let table = read_first_sheet(path, SourceKind::PriorPeriod)?;
    let contracts = prior_period_contracts(&table);
    log::info!("prior-period file: {} contract(s)", contracts.len());
    Ok(contracts)
}

fn convert_cell(cell: &Data) -> RawCell {
    match cell {
        Data::Empty => RawCell::Empty,
        Data::String(s) if s.is_empty() => RawCell::Empty,
        Data::String(s) => RawCell::Text(s.clone()),
        Data::Float(n) => RawCell::Number(*n),
        Data::Int(n) => RawCell::Number(*n as f64),
        Data::Bool(b) => RawCell::Bool(*b),
        Data::Error(e) => RawCell::Text(format!("#{:?}", e)),
        Data::DateTime(dt) => RawCell::Number(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => RawCell::Text(s.clone()),
    }
}

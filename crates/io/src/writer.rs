// Report workbook export (xlsx only)
//
// One worksheet per report view, in order: comparison, notes, portfolio.
// Money cells are written as numbers with the configured display format so
// the workbook stays summable; text and blank cells are written as-is.

use std::path::Path;

use rust_xlsxwriter::{Format, Workbook, Worksheet};
use tieout_recon::config::ReportConfig;
use tieout_recon::error::ReconError;
use tieout_recon::money::cents_to_f64;
use tieout_recon::report::{Report, ReportCell, SheetView};

/// Statistics from writing a report workbook
#[derive(Debug, Clone, Default)]
pub struct ExportResult {
    pub sheets_written: usize,
    pub rows_written: usize,
}

/// Write the three report sheets to `path`, replacing any existing file.
pub fn write_report(report: &Report, config: &ReportConfig, path: &Path) -> Result<ExportResult, ReconError> {
    let write_err = |reason: String| ReconError::Write {
        path: path.display().to_string(),
        reason,
    };

    let header_format = Format::new().set_bold();
    let money_format = Format::new().set_num_format(&config.number_format);

    let mut workbook = Workbook::new();
    let mut result = ExportResult::default();

    for view in report.sheets() {
        let worksheet = workbook
            .add_worksheet()
            .set_name(&view.name)
            .map_err(|e| write_err(format!("failed to create sheet '{}': {}", view.name, e)))?;

        write_view(worksheet, view, &header_format, &money_format, config.column_width)
            .map_err(|e| write_err(format!("sheet '{}': {}", view.name, e)))?;

        result.sheets_written += 1;
        result.rows_written += view.rows.len();
    }

    workbook
        .save(path)
        .map_err(|e| write_err(format!("failed to save XLSX file: {e}")))?;

    log::info!(
        "wrote {} sheet(s), {} row(s) to {}",
        result.sheets_written,
        result.rows_written,
        path.display()
    );
    Ok(result)
}

fn write_view(
    worksheet: &mut Worksheet,
    view: &SheetView,
    header_format: &Format,
    money_format: &Format,
    column_width: f64,
) -> Result<(), rust_xlsxwriter::XlsxError> {
    for (col, name) in view.columns.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, name, header_format)?;
        worksheet.set_column_width(col as u16, column_width)?;
    }

    for (idx, row) in view.rows.iter().enumerate() {
        let row32 = (idx + 1) as u32;
        for (col, cell) in row.iter().enumerate() {
            let col16 = col as u16;
            match cell {
                ReportCell::Blank => {}
                ReportCell::Text(s) if s.is_empty() => {}
                ReportCell::Text(s) => {
                    worksheet.write_string(row32, col16, s)?;
                }
                ReportCell::Money(cents) => {
                    worksheet.write_number_with_format(row32, col16, cents_to_f64(*cents), money_format)?;
                }
            }
        }
    }
    Ok(())
}

// Spreadsheet I/O for the tie-out engine

pub mod reader;
pub mod writer;

pub use reader::{read_first_sheet, read_prior_contracts};
pub use writer::{write_report, ExportResult};

//! Excel I/O
//!
//! - Import: .xlsx/.xlsm/.xls/.ods → in-memory sheets (calamine)
//! - Export: in-memory sheets → .xlsx (rust_xlsxwriter)

mod exporter;
mod importer;

pub use exporter::{excel_serial, WorkbookWriter};
pub use importer::WorkbookReader;

//! Workbook reader - Excel (.xlsx/.xls/.ods) → `SourceWorkbook`

use crate::error::{SplitError, SplitResult};
use crate::types::{CellValue, Sheet, SourceWorkbook};
use calamine::{open_workbook_auto, Data, Range, Reader};
use chrono::{NaiveDate, NaiveDateTime};
use std::iter;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Reads every sheet of a workbook into memory, once
pub struct WorkbookReader {
    path: PathBuf,
}

impl WorkbookReader {
    /// Create a new workbook reader
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Load all sheets, in workbook order
    pub fn read(&self) -> SplitResult<SourceWorkbook> {
        if !self.path.is_file() {
            return Err(SplitError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("Source workbook not found: {}", self.path.display()),
            )));
        }

        let mut workbook = open_workbook_auto(&self.path).map_err(|e| {
            SplitError::Workbook(format!(
                "Failed to open {}: {}",
                self.path.display(),
                e
            ))
        })?;

        let mut source = SourceWorkbook::new(self.path.clone());

        for sheet_name in workbook.sheet_names() {
            let range = workbook.worksheet_range(&sheet_name).map_err(|e| {
                SplitError::Workbook(format!("Failed to read sheet '{}': {}", sheet_name, e))
            })?;
            let sheet = Self::sheet_from_range(&sheet_name, &range);
            debug!(
                sheet = %sheet.name,
                columns = sheet.headers.len(),
                rows = sheet.row_count(),
                "read sheet"
            );
            source.add_sheet(sheet);
        }

        Ok(source)
    }

    /// First row of the used range is the header, the rest are data rows.
    ///
    /// The used range starts at the first non-empty cell, so blank leading
    /// columns are restored as `Unnamed: {idx}` columns counted from A.
    fn sheet_from_range(sheet_name: &str, range: &Range<Data>) -> Sheet {
        let lead = range.start().map_or(0, |(_, col)| col as usize);
        let mut rows = range.rows();

        let headers = match rows.next() {
            Some(header_row) => (0..lead)
                .map(|idx| format!("Unnamed: {}", idx))
                .chain(
                    header_row
                        .iter()
                        .enumerate()
                        .map(|(idx, cell)| Self::header_name(cell, lead + idx)),
                )
                .collect(),
            None => return Sheet::new(sheet_name, Vec::new()),
        };

        let mut sheet = Sheet::new(sheet_name, headers);
        for row in rows {
            sheet.push_row(
                iter::repeat(CellValue::Empty)
                    .take(lead)
                    .chain(row.iter().map(Self::convert_cell))
                    .collect(),
            );
        }
        sheet
    }

    /// Header text for a column; blank headers get `Unnamed: {idx}`
    fn header_name(cell: &Data, idx: usize) -> String {
        match Self::convert_cell(cell) {
            CellValue::Empty => format!("Unnamed: {}", idx),
            other => other.to_string(),
        }
    }

    /// Convert a calamine cell to a `CellValue`
    fn convert_cell(cell: &Data) -> CellValue {
        match cell {
            Data::Empty => CellValue::Empty,
            Data::String(s) if s.is_empty() => CellValue::Empty,
            Data::String(s) => CellValue::Text(s.clone()),
            Data::Int(i) => CellValue::Number(*i as f64),
            Data::Float(f) => CellValue::Number(*f),
            Data::Bool(b) => CellValue::Bool(*b),
            Data::DateTime(dt) => dt
                .as_datetime()
                .map(CellValue::DateTime)
                .unwrap_or_else(|| CellValue::Number(dt.as_f64())),
            Data::DateTimeIso(s) => Self::parse_iso_datetime(s)
                .map(CellValue::DateTime)
                .unwrap_or_else(|| CellValue::Text(s.clone())),
            Data::DurationIso(s) => CellValue::Text(s.clone()),
            Data::Error(e) => CellValue::Error(e.to_string()),
        }
    }

    /// ODS stores dates as ISO 8601 text
    fn parse_iso_datetime(s: &str) -> Option<NaiveDateTime> {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
            .ok()
            .or_else(|| {
                NaiveDate::parse_from_str(s, "%Y-%m-%d")
                    .ok()
                    .and_then(|d| d.and_hms_opt(0, 0, 0))
            })
    }
}

//! Workbook writer - `Sheet`s → Excel (.xlsx)

use crate::error::{SplitError, SplitResult};
use crate::types::{CellValue, Sheet};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rust_xlsxwriter::{Format, FormatAlign, FormatBorder, Workbook, Worksheet};
use std::path::Path;

const DATE_FORMAT: &str = "yyyy-mm-dd";
const DATETIME_FORMAT: &str = "yyyy-mm-dd hh:mm:ss";

/// Writes sheets to a new .xlsx file, header row first, no index column
pub struct WorkbookWriter {
    header_format: Format,
    date_format: Format,
    datetime_format: Format,
}

impl Default for WorkbookWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkbookWriter {
    pub fn new() -> Self {
        Self {
            header_format: Format::new()
                .set_bold()
                .set_border(FormatBorder::Thin)
                .set_align(FormatAlign::Center),
            date_format: Format::new().set_num_format(DATE_FORMAT),
            datetime_format: Format::new().set_num_format(DATETIME_FORMAT),
        }
    }

    /// Write `sheets` in order to `output_path`, replacing any existing file
    pub fn write(&self, sheets: &[&Sheet], output_path: &Path) -> SplitResult<()> {
        let mut workbook = Workbook::new();

        for sheet in sheets {
            self.write_sheet(&mut workbook, sheet)?;
        }

        workbook
            .save(output_path)
            .map_err(|e| SplitError::Export(format!("Failed to save Excel file: {}", e)))?;

        Ok(())
    }

    fn write_sheet(&self, workbook: &mut Workbook, sheet: &Sheet) -> SplitResult<()> {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(&sheet.name).map_err(|e| {
            SplitError::Export(format!(
                "Failed to set worksheet name '{}': {}",
                sheet.name, e
            ))
        })?;

        for (col_idx, header) in sheet.headers.iter().enumerate() {
            worksheet
                .write_string_with_format(0, col_idx as u16, header, &self.header_format)
                .map_err(|e| SplitError::Export(format!("Failed to write header: {}", e)))?;
        }

        for (row_idx, row) in sheet.rows.iter().enumerate() {
            // +1 for the header row
            let excel_row = (row_idx + 1) as u32;
            for (col_idx, cell) in row.iter().enumerate() {
                self.write_cell(worksheet, excel_row, col_idx as u16, cell)?;
            }
        }

        Ok(())
    }

    /// Write a single cell value based on its type
    fn write_cell(
        &self,
        worksheet: &mut Worksheet,
        row: u32,
        col: u16,
        cell: &CellValue,
    ) -> SplitResult<()> {
        match cell {
            CellValue::Empty => Ok(()),
            CellValue::Number(n) => worksheet
                .write_number(row, col, *n)
                .map(|_| ())
                .map_err(|e| SplitError::Export(format!("Failed to write number: {}", e))),
            CellValue::Text(s) | CellValue::Error(s) => worksheet
                .write_string(row, col, s)
                .map(|_| ())
                .map_err(|e| SplitError::Export(format!("Failed to write text: {}", e))),
            CellValue::Bool(b) => worksheet
                .write_boolean(row, col, *b)
                .map(|_| ())
                .map_err(|e| SplitError::Export(format!("Failed to write boolean: {}", e))),
            CellValue::DateTime(dt) => {
                let format = if dt.time() == NaiveTime::MIN {
                    &self.date_format
                } else {
                    &self.datetime_format
                };
                worksheet
                    .write_number_with_format(row, col, excel_serial(dt), format)
                    .map(|_| ())
                    .map_err(|e| SplitError::Export(format!("Failed to write date: {}", e)))
            }
        }
    }
}

/// Excel 1900-system serial number for a date-time.
///
/// Serials before 1900-03-01 are one lower than the day count because Excel
/// treats 1900 as a leap year.
pub fn excel_serial(dt: &NaiveDateTime) -> f64 {
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or_default();
    let serial = (*dt - epoch).num_milliseconds() as f64 / 86_400_000.0;
    if serial < 61.0 {
        serial - 1.0
    } else {
        serial
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn datetime(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    #[test]
    fn test_excel_serial() {
        assert_eq!(excel_serial(&datetime(1900, 1, 1, 0, 0)), 1.0);
        assert_eq!(excel_serial(&datetime(1900, 2, 28, 0, 0)), 59.0);
        assert_eq!(excel_serial(&datetime(1900, 3, 1, 0, 0)), 61.0);
        assert_eq!(excel_serial(&datetime(2024, 7, 1, 0, 0)), 45474.0);
        assert_eq!(excel_serial(&datetime(2024, 7, 1, 12, 0)), 45474.5);
    }
}

//! Row selection: key match, calendar-date match, identifier membership

use crate::types::{CellKey, CellValue, Sheet};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use std::collections::HashSet;

/// Largest serial Excel accepts (9999-12-31)
const MAX_EXCEL_SERIAL: f64 = 2_958_465.0;

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%d.%m.%Y"];

/// Calendar date of a cell, time of day discarded.
///
/// Numbers are read as Excel serials. Text is tried against ISO and
/// day-first layouts. Anything else yields `None`.
pub fn normalize_date(cell: &CellValue) -> Option<NaiveDate> {
    match cell {
        CellValue::DateTime(dt) => Some(dt.date()),
        CellValue::Number(serial) => serial_to_date(*serial),
        CellValue::Text(text) => parse_date_text(text.trim()),
        _ => None,
    }
}

/// Inverse of the 1900-system serial, honouring the 1900 leap-year bug
fn serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || !(1.0..=MAX_EXCEL_SERIAL).contains(&serial) {
        return None;
    }
    let days = serial.floor() as i64;
    // Serial 60 is 1900-02-29, which never existed
    let offset = match days {
        60 => return None,
        d if d < 60 => d + 1,
        d => d,
    };
    NaiveDate::from_ymd_opt(1899, 12, 30)?.checked_add_signed(Duration::days(offset))
}

fn parse_date_text(text: &str) -> Option<NaiveDate> {
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .map(|dt| dt.date())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
        })
}

/// Conditions a row must meet to be kept. Unset conditions always pass.
#[derive(Debug, Clone, Copy, Default)]
pub struct RowFilter<'a> {
    /// Column index and the key it must equal
    pub key: Option<(usize, &'a CellKey)>,
    /// Column index and the calendar date it must fall on
    pub date: Option<(usize, NaiveDate)>,
    /// Column index and the identifiers it must belong to
    pub ids: Option<(usize, &'a HashSet<CellKey>)>,
}

impl<'a> RowFilter<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_key(mut self, column: usize, key: &'a CellKey) -> Self {
        self.key = Some((column, key));
        self
    }

    pub fn with_date(mut self, column: usize, date: NaiveDate) -> Self {
        self.date = Some((column, date));
        self
    }

    pub fn with_ids(mut self, column: usize, ids: &'a HashSet<CellKey>) -> Self {
        self.ids = Some((column, ids));
        self
    }

    pub fn matches(&self, sheet: &Sheet, row: usize) -> bool {
        if let Some((col, key)) = self.key {
            if sheet.cell(row, col).key().as_ref() != Some(key) {
                return false;
            }
        }
        if let Some((col, date)) = self.date {
            if normalize_date(sheet.cell(row, col)) != Some(date) {
                return false;
            }
        }
        if let Some((col, ids)) = self.ids {
            match sheet.cell(row, col).key() {
                Some(id) if ids.contains(&id) => {}
                _ => return false,
            }
        }
        true
    }

    /// Indices of the matching rows, in sheet order
    pub fn matching_rows(&self, sheet: &Sheet) -> Vec<usize> {
        (0..sheet.row_count())
            .filter(|&row| self.matches(sheet, row))
            .collect()
    }
}

/// Distinct keys of a column in first-seen order, empty cells skipped
pub fn distinct_keys(sheet: &Sheet, column: usize) -> Vec<CellKey> {
    let mut seen = HashSet::new();
    let mut keys = Vec::new();
    for row in 0..sheet.row_count() {
        if let Some(key) = sheet.cell(row, column).key() {
            if seen.insert(key.clone()) {
                keys.push(key);
            }
        }
    }
    keys
}

use chrono::NaiveDateTime;
use std::fmt;
use std::path::PathBuf;

//==============================================================================
// Cells
//==============================================================================

/// A single worksheet cell, independent of the spreadsheet library that read it
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    /// Integers and floats alike
    Number(f64),
    Text(String),
    Bool(bool),
    DateTime(NaiveDateTime),
    /// Spreadsheet error value such as `#N/A`, kept as its display text
    Error(String),
}

static EMPTY: CellValue = CellValue::Empty;

impl CellValue {
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    /// Identity used for grouping and membership tests.
    ///
    /// Empty and error cells have no identity, so they never become a
    /// partition key and never match an identifier.
    pub fn key(&self) -> Option<CellKey> {
        match self {
            CellValue::Number(n) if n.is_finite() => {
                // -0.0 and 0.0 must hash the same
                let n = if *n == 0.0 { 0.0 } else { *n };
                Some(CellKey::Number(n.to_bits()))
            }
            CellValue::Text(s) => Some(CellKey::Text(s.clone())),
            CellValue::Bool(b) => Some(CellKey::Bool(*b)),
            CellValue::DateTime(dt) => Some(CellKey::DateTime(*dt)),
            _ => None,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Number(n) => f.write_str(&format_number(*n)),
            CellValue::Text(s) => f.write_str(s),
            CellValue::Bool(b) => f.write_str(if *b { "TRUE" } else { "FALSE" }),
            CellValue::DateTime(dt) => f.write_str(&format_datetime(dt)),
            CellValue::Error(e) => f.write_str(e),
        }
    }
}

/// Hashable identity of a non-empty cell
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CellKey {
    /// Bit pattern of a finite, zero-normalized f64
    Number(u64),
    Text(String),
    Bool(bool),
    DateTime(NaiveDateTime),
}

impl fmt::Display for CellKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellKey::Number(bits) => f.write_str(&format_number(f64::from_bits(*bits))),
            CellKey::Text(s) => f.write_str(s),
            CellKey::Bool(b) => f.write_str(if *b { "TRUE" } else { "FALSE" }),
            CellKey::DateTime(dt) => f.write_str(&format_datetime(dt)),
        }
    }
}

/// Whole numbers print without a decimal part (`12345`, not `12345.0`)
fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

fn format_datetime(dt: &NaiveDateTime) -> String {
    if dt.time() == chrono::NaiveTime::MIN {
        dt.format("%Y-%m-%d").to_string()
    } else {
        dt.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}

//==============================================================================
// Sheets
//==============================================================================

/// A worksheet as a header plus rows of cells
#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

impl Sheet {
    pub fn new(name: impl Into<String>, headers: Vec<String>) -> Self {
        Self {
            name: name.into(),
            headers,
            rows: Vec::new(),
        }
    }

    /// Append a row, padding or truncating it to the header width
    pub fn push_row(&mut self, mut row: Vec<CellValue>) {
        row.resize(self.headers.len(), CellValue::Empty);
        self.rows.push(row);
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// True when the sheet has neither a header nor rows
    pub fn is_blank(&self) -> bool {
        self.headers.is_empty() && self.rows.is_empty()
    }

    /// Index of the first header exactly equal to `name`
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Cell at (row, col); out-of-range positions read as empty
    pub fn cell(&self, row: usize, col: usize) -> &CellValue {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .unwrap_or(&EMPTY)
    }

    /// Copy of this sheet holding only the rows at `indices`, in that order
    pub fn select_rows(&self, indices: &[usize]) -> Sheet {
        Sheet {
            name: self.name.clone(),
            headers: self.headers.clone(),
            rows: indices
                .iter()
                .filter_map(|&i| self.rows.get(i).cloned())
                .collect(),
        }
    }

    /// New sheet named `name` holding `columns` (by index) of the rows at `indices`
    pub fn project(&self, name: &str, columns: &[usize], indices: &[usize]) -> Sheet {
        let headers = columns.iter().map(|&c| self.headers[c].clone()).collect();
        let mut sheet = Sheet::new(name, headers);
        for &row in indices {
            sheet.push_row(columns.iter().map(|&c| self.cell(row, c).clone()).collect());
        }
        sheet
    }
}

//==============================================================================
// Workbook
//==============================================================================

/// The source workbook, fully loaded: every sheet in workbook order
#[derive(Debug, Clone)]
pub struct SourceWorkbook {
    pub path: PathBuf,
    pub sheets: Vec<Sheet>,
}

impl SourceWorkbook {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            sheets: Vec::new(),
        }
    }

    pub fn add_sheet(&mut self, sheet: Sheet) {
        self.sheets.push(sheet);
    }

    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }

    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| s.name.as_str()).collect()
    }
}

//! Run and schema configuration
//!
//! `SplitConfig` names the sheets and columns the splitter works with. Its
//! defaults match the contractor-tasks workbook layout; any field can be
//! overridden from a YAML file:
//!
//! ```yaml
//! key_column: [Όνομα, Name]
//! excluded_sheets: [Last Drop, Scratch]
//! mail_copy_columns: [SR ID, Name, Request Date]
//! ```
//!
//! `RunConfig` carries the per-invocation inputs (source, destination,
//! filter date) and is passed by value into the splitter.

use crate::error::{SplitError, SplitResult};
use crate::types::Sheet;
use chrono::{Local, NaiveDate};
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Longest worksheet name Excel accepts
pub const MAX_SHEET_NAME_LEN: usize = 31;

const SHEET_NAME_FORBIDDEN: &[char] = &['[', ']', ':', '*', '?', '/', '\\'];

/// A logical column and the header names it may appear under
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "AliasList")]
pub struct ColumnSpec {
    aliases: Vec<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum AliasList {
    One(String),
    Many(Vec<String>),
}

impl From<AliasList> for ColumnSpec {
    fn from(list: AliasList) -> Self {
        match list {
            AliasList::One(name) => Self::single(name),
            AliasList::Many(aliases) => Self { aliases },
        }
    }
}

impl ColumnSpec {
    pub fn new<I, S>(aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            aliases: aliases.into_iter().map(Into::into).collect(),
        }
    }

    pub fn single(name: impl Into<String>) -> Self {
        Self {
            aliases: vec![name.into()],
        }
    }

    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    /// Name used in messages: the aliases joined with " / "
    pub fn display_name(&self) -> String {
        self.aliases.join(" / ")
    }

    /// Index of the first alias present in the sheet header
    pub fn find_in(&self, sheet: &Sheet) -> Option<usize> {
        self.aliases
            .iter()
            .find_map(|alias| sheet.column_index(alias))
    }
}

/// Sheet and column names the splitter relies on
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SplitConfig {
    /// Sheet whose key column defines the partitions
    pub aggregated_sheet: String,
    /// Sheet restricted to the identifiers of each partition's summary rows
    pub actions_sheet: String,
    /// Sheets never copied into an output workbook
    pub excluded_sheets: Vec<String>,
    /// Name of the summary sheet written first in every output workbook
    pub mail_copy_sheet: String,
    pub key_column: ColumnSpec,
    pub date_column: ColumnSpec,
    pub id_column: ColumnSpec,
    /// Columns of the summary sheet, in output order
    pub mail_copy_columns: Vec<String>,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            aggregated_sheet: "Aggregated Data".to_string(),
            actions_sheet: "Summary of Actions".to_string(),
            excluded_sheets: vec!["Last Drop".to_string()],
            mail_copy_sheet: "mail copy&paste".to_string(),
            key_column: ColumnSpec::new(["Όνομα", "Name"]),
            date_column: ColumnSpec::new(["Ημ/νία Αίτησης", "Request Date"]),
            id_column: ColumnSpec::single("SR ID"),
            mail_copy_columns: [
                "SR ID",
                "Τύπος εργασίας",
                "Κατάσταση",
                "Ημ/νία Αίτησης",
                "Διεύθυνση πελάτη",
                "Αριθμός Οδού",
                "BUILDING ID",
                "A/K",
                "ΤΗΛΕΦΩΝΟ ΠΑΡΑΓΓΕΛΙΑΣ",
                "FLOOR",
                "PILOT",
                "ΌΝΟΜΑΤΕΠΩΝΥΜΟ ΠΕΛΑΤΗ",
                "ΚΙΝΗΤΟ ΠΕΛΑΤΗ",
                "ΌΝΟΜΑΤΕΠΩΝΥΜΟ ΔΙΑΧΕΙΡΙΣΤΗ",
                "ΚΙΝΗΤΟ ΔΙΑΧΕΙΡΙΣΤΗ",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

impl SplitConfig {
    /// Load a (possibly partial) YAML configuration and validate it
    pub fn from_yaml_file(path: &Path) -> SplitResult<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    pub fn from_yaml_str(content: &str) -> SplitResult<Self> {
        // An empty document means "all defaults"
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: SplitConfig = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn is_excluded(&self, sheet_name: &str) -> bool {
        self.excluded_sheets.iter().any(|s| s == sheet_name)
    }

    /// Check the configuration on its own, before any workbook is read
    pub fn validate(&self) -> SplitResult<()> {
        if self.mail_copy_columns.is_empty() {
            return Err(SplitError::Config(
                "mail_copy_columns must list at least one column".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for column in &self.mail_copy_columns {
            if !seen.insert(column.as_str()) {
                return Err(SplitError::Config(format!(
                    "mail_copy_columns lists '{}' more than once",
                    column
                )));
            }
        }

        for (field, column) in [
            ("key_column", &self.key_column),
            ("date_column", &self.date_column),
            ("id_column", &self.id_column),
        ] {
            if column.aliases().is_empty() || column.aliases().iter().any(|a| a.is_empty()) {
                return Err(SplitError::Config(format!(
                    "{} needs at least one non-empty column name",
                    field
                )));
            }
        }

        if self.aggregated_sheet.is_empty() {
            return Err(SplitError::Config(
                "aggregated_sheet must not be empty".to_string(),
            ));
        }

        validate_sheet_name(&self.mail_copy_sheet)
    }
}

/// Excel worksheet naming rules: 1-31 chars, none of `[]:*?/\`, no leading
/// or trailing apostrophe
pub fn validate_sheet_name(name: &str) -> SplitResult<()> {
    let len = name.chars().count();
    if len == 0 || len > MAX_SHEET_NAME_LEN {
        return Err(SplitError::Config(format!(
            "sheet name '{}' must be 1-{} characters long",
            name, MAX_SHEET_NAME_LEN
        )));
    }
    if name.contains(SHEET_NAME_FORBIDDEN) {
        return Err(SplitError::Config(format!(
            "sheet name '{}' contains one of the characters [ ] : * ? / \\",
            name
        )));
    }
    if name.starts_with('\'') || name.ends_with('\'') {
        return Err(SplitError::Config(format!(
            "sheet name '{}' must not start or end with an apostrophe",
            name
        )));
    }
    Ok(())
}

/// How output workbooks are named
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FileNaming {
    /// `{key}.xlsx`, even when a date filter is active
    Key,
    /// `{key}_{YYYY-MM-DD}.xlsx` with a date filter, `{key}.xlsx` without
    #[default]
    KeyAndDate,
}

/// Inputs for one run
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub source_path: PathBuf,
    pub destination_dir: PathBuf,
    pub filter_date: Option<NaiveDate>,
    pub naming: FileNaming,
    /// Plan every partition but write nothing
    pub dry_run: bool,
}

impl RunConfig {
    pub fn new(source_path: impl Into<PathBuf>, destination_dir: impl Into<PathBuf>) -> Self {
        Self {
            source_path: source_path.into(),
            destination_dir: destination_dir.into(),
            filter_date: None,
            naming: FileNaming::default(),
            dry_run: false,
        }
    }

    pub fn with_filter_date(mut self, date: Option<NaiveDate>) -> Self {
        self.filter_date = date;
        self
    }

    pub fn with_naming(mut self, naming: FileNaming) -> Self {
        self.naming = naming;
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }
}

/// Parse a filter date given as `YYYY-MM-DD` or `today`
pub fn parse_filter_date(input: &str) -> SplitResult<NaiveDate> {
    let trimmed = input.trim();
    if trimmed.eq_ignore_ascii_case("today") {
        return Ok(Local::now().date_naive());
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .map_err(|_| SplitError::InvalidDate(input.to_string()))
}

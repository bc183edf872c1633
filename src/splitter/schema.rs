//! Pre-flight schema resolution
//!
//! Every sheet and column lookup the splitter needs is resolved here, once,
//! so a malformed workbook fails before the first output file is written.

use crate::config::{validate_sheet_name, ColumnSpec, SplitConfig};
use crate::error::{SplitError, SplitResult};
use crate::types::{Sheet, SourceWorkbook};

/// Column positions within the aggregated sheet
#[derive(Debug, Clone, PartialEq)]
pub struct AggregatedColumns {
    /// Index of the sheet in the workbook
    pub sheet: usize,
    pub key: usize,
    pub id: usize,
    /// Present whenever the sheet has a date column, required only when a
    /// date filter is active
    pub date: Option<usize>,
    /// Mail-copy columns, in output order
    pub mail_copy: Vec<usize>,
}

/// How one retained source sheet is filtered
#[derive(Debug, Clone, PartialEq)]
pub struct SheetPlan {
    /// Index of the sheet in the workbook
    pub sheet: usize,
    pub key: Option<usize>,
    /// Only recorded when the sheet also has a key column
    pub date: Option<usize>,
    /// Set for the actions sheet: rows are restricted to relevant identifiers
    pub id_restriction: Option<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    pub aggregated: AggregatedColumns,
    /// Retained sheets in workbook order
    pub sheets: Vec<SheetPlan>,
    /// Excluded sheets that were actually present in the source
    pub excluded_present: Vec<String>,
}

/// Resolve and validate the schema of `workbook` against `config`
pub fn resolve(
    workbook: &SourceWorkbook,
    config: &SplitConfig,
    date_filter_active: bool,
) -> SplitResult<Schema> {
    let aggregated = resolve_aggregated(workbook, config, date_filter_active)?;

    let mut sheets = Vec::new();
    let mut excluded_present = Vec::new();

    for (index, sheet) in workbook.sheets.iter().enumerate() {
        if config.is_excluded(&sheet.name) {
            excluded_present.push(sheet.name.clone());
            continue;
        }

        // Worksheet names are unique ignoring case within one xlsx file
        if sheet.name.to_lowercase() == config.mail_copy_sheet.to_lowercase() {
            return Err(SplitError::Config(format!(
                "source sheet '{}' has the same name as the mail-copy sheet; \
                 exclude it or rename mail_copy_sheet",
                sheet.name
            )));
        }

        validate_sheet_name(&sheet.name)?;

        let key = config.key_column.find_in(sheet);
        let date = key.and(config.date_column.find_in(sheet));

        let id_restriction = if sheet.name == config.actions_sheet && !sheet.headers.is_empty() {
            Some(require_column(sheet, &config.id_column)?)
        } else {
            None
        };

        sheets.push(SheetPlan {
            sheet: index,
            key,
            date,
            id_restriction,
        });
    }

    Ok(Schema {
        aggregated,
        sheets,
        excluded_present,
    })
}

fn resolve_aggregated(
    workbook: &SourceWorkbook,
    config: &SplitConfig,
    date_filter_active: bool,
) -> SplitResult<AggregatedColumns> {
    let index = workbook
        .sheets
        .iter()
        .position(|s| s.name == config.aggregated_sheet)
        .ok_or_else(|| SplitError::MissingSheet(config.aggregated_sheet.clone()))?;
    let sheet = &workbook.sheets[index];

    let key = require_column(sheet, &config.key_column)?;
    let id = require_column(sheet, &config.id_column)?;

    let date = config.date_column.find_in(sheet);
    if date_filter_active && date.is_none() {
        return Err(missing(sheet, &config.date_column.display_name()));
    }

    let mail_copy = config
        .mail_copy_columns
        .iter()
        .map(|name| sheet.column_index(name).ok_or_else(|| missing(sheet, name)))
        .collect::<SplitResult<Vec<_>>>()?;

    Ok(AggregatedColumns {
        sheet: index,
        key,
        id,
        date,
        mail_copy,
    })
}

fn require_column(sheet: &Sheet, column: &ColumnSpec) -> SplitResult<usize> {
    column
        .find_in(sheet)
        .ok_or_else(|| missing(sheet, &column.display_name()))
}

fn missing(sheet: &Sheet, column: &str) -> SplitError {
    SplitError::MissingColumn {
        sheet: sheet.name.clone(),
        column: column.to_string(),
    }
}

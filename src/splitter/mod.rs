//! Workbook splitter
//!
//! Splits the source workbook into one output workbook per distinct value of
//! the key column of the aggregated sheet. Each output workbook holds:
//!
//! 1. the mail-copy sheet: the key's aggregated rows (optionally restricted
//!    to one calendar date) projected onto the configured columns, and
//! 2. every other source sheet except the excluded ones, filtered by key
//!    where the sheet has a key column, with the actions sheet further
//!    restricted to the identifiers present in the mail-copy rows.
//!
//! The whole source workbook is read once and held in memory for the run.

pub mod filter;
pub mod naming;
pub mod schema;

use crate::config::{RunConfig, SplitConfig};
use crate::error::{SplitError, SplitResult};
use crate::excel::{WorkbookReader, WorkbookWriter};
use crate::types::{CellKey, Sheet, SourceWorkbook};
use chrono::NaiveDate;
use filter::RowFilter;
use naming::FileNamer;
use schema::Schema;
use serde::Serialize;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Row count of one sheet in an output workbook
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SheetSummary {
    pub name: String,
    pub rows: usize,
}

/// One output workbook, written (or planned, in a dry run)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutputFile {
    pub key: String,
    pub path: PathBuf,
    pub mail_copy_rows: usize,
    pub sheets: Vec<SheetSummary>,
}

/// An output workbook that could not be written
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PartitionFailure {
    pub key: String,
    pub path: PathBuf,
    pub error: String,
}

/// Outcome of a run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SplitReport {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub filter_date: Option<NaiveDate>,
    pub dry_run: bool,
    pub sheets_read: usize,
    pub excluded_sheets: Vec<String>,
    pub outputs: Vec<OutputFile>,
    pub failures: Vec<PartitionFailure>,
}

impl SplitReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn partition_count(&self) -> usize {
        self.outputs.len() + self.failures.len()
    }
}

/// The filtered content of one output workbook
#[derive(Debug, Clone, PartialEq)]
pub struct Partition {
    /// Key as text, as used for the file name
    pub label: String,
    pub path: PathBuf,
    /// Mail-copy sheet first, then the retained source sheets in order
    pub sheets: Vec<Sheet>,
}

impl Partition {
    pub fn mail_copy(&self) -> &Sheet {
        &self.sheets[0]
    }

    fn summary(&self) -> OutputFile {
        OutputFile {
            key: self.label.clone(),
            path: self.path.clone(),
            mail_copy_rows: self.mail_copy().row_count(),
            sheets: self
                .sheets
                .iter()
                .map(|s| SheetSummary {
                    name: s.name.clone(),
                    rows: s.row_count(),
                })
                .collect(),
        }
    }
}

/// Per-key splitter over one source workbook
pub struct Splitter {
    config: SplitConfig,
    run: RunConfig,
    writer: WorkbookWriter,
}

impl Splitter {
    pub fn new(config: SplitConfig, run: RunConfig) -> Self {
        Self {
            config,
            run,
            writer: WorkbookWriter::new(),
        }
    }

    /// Load the source workbook and split it
    pub fn run(&self) -> SplitResult<SplitReport> {
        // A bad configuration fails before the workbook is opened
        self.config.validate()?;

        info!(
            source = %self.run.source_path.display(),
            destination = %self.run.destination_dir.display(),
            filter_date = ?self.run.filter_date,
            "splitting workbook"
        );

        let workbook = WorkbookReader::new(&self.run.source_path).read()?;
        self.split_validated(&workbook)
    }

    /// Split an already loaded workbook.
    ///
    /// Schema, key and file-name checks all happen before the first write;
    /// after that a failed write is recorded and the remaining partitions
    /// are still attempted.
    pub fn split(&self, workbook: &SourceWorkbook) -> SplitResult<SplitReport> {
        self.config.validate()?;
        self.split_validated(workbook)
    }

    fn split_validated(&self, workbook: &SourceWorkbook) -> SplitResult<SplitReport> {
        let schema = schema::resolve(workbook, &self.config, self.run.filter_date.is_some())?;

        let aggregated = &workbook.sheets[schema.aggregated.sheet];
        let keys = filter::distinct_keys(aggregated, schema.aggregated.key);
        let labels: Vec<String> = keys.iter().map(ToString::to_string).collect();

        let namer = FileNamer::new(self.run.naming, self.run.filter_date)?;
        let file_names = namer.plan(&labels)?;

        info!(
            partitions = keys.len(),
            sheets = workbook.sheets.len(),
            "schema validated"
        );

        if !self.run.dry_run {
            fs::create_dir_all(&self.run.destination_dir)?;
        }

        let mut report = SplitReport {
            source: workbook.path.clone(),
            destination: self.run.destination_dir.clone(),
            filter_date: self.run.filter_date,
            dry_run: self.run.dry_run,
            sheets_read: workbook.sheets.len(),
            excluded_sheets: schema.excluded_present.clone(),
            outputs: Vec::new(),
            failures: Vec::new(),
        };

        for ((key, label), file_name) in keys.iter().zip(labels).zip(file_names) {
            let path = self.run.destination_dir.join(file_name);
            let partition = self.build_partition(workbook, &schema, key, label, path);

            if self.run.dry_run {
                report.outputs.push(partition.summary());
                continue;
            }

            match self.write_partition(&partition) {
                Ok(()) => {
                    info!(key = %partition.label, path = %partition.path.display(), "created");
                    report.outputs.push(partition.summary());
                }
                Err(e) => {
                    warn!(key = %partition.label, error = %e, "failed to write partition");
                    report.failures.push(PartitionFailure {
                        key: partition.label,
                        path: partition.path,
                        error: e.to_string(),
                    });
                }
            }
        }

        Ok(report)
    }

    /// Filter every retained sheet for one key
    pub fn build_partition(
        &self,
        workbook: &SourceWorkbook,
        schema: &Schema,
        key: &CellKey,
        label: String,
        path: PathBuf,
    ) -> Partition {
        let columns = &schema.aggregated;
        let aggregated = &workbook.sheets[columns.sheet];

        let mut summary_filter = RowFilter::new().with_key(columns.key, key);
        if let (Some(col), Some(date)) = (columns.date, self.run.filter_date) {
            summary_filter = summary_filter.with_date(col, date);
        }
        let summary_rows = summary_filter.matching_rows(aggregated);

        let mail_copy = aggregated.project(
            &self.config.mail_copy_sheet,
            &columns.mail_copy,
            &summary_rows,
        );

        let relevant_ids: HashSet<CellKey> = summary_rows
            .iter()
            .filter_map(|&row| aggregated.cell(row, columns.id).key())
            .collect();

        let mut sheets = Vec::with_capacity(schema.sheets.len() + 1);
        sheets.push(mail_copy);

        for plan in &schema.sheets {
            let sheet = &workbook.sheets[plan.sheet];

            let mut row_filter = RowFilter::new();
            if let Some(col) = plan.key {
                row_filter = row_filter.with_key(col, key);
                if let (Some(date_col), Some(date)) = (plan.date, self.run.filter_date) {
                    row_filter = row_filter.with_date(date_col, date);
                }
            }
            if let Some(col) = plan.id_restriction {
                row_filter = row_filter.with_ids(col, &relevant_ids);
            }

            let rows = row_filter.matching_rows(sheet);
            debug!(
                key = %label,
                sheet = %sheet.name,
                kept = rows.len(),
                total = sheet.row_count(),
                "filtered sheet"
            );
            sheets.push(sheet.select_rows(&rows));
        }

        Partition {
            label,
            path,
            sheets,
        }
    }

    fn write_partition(&self, partition: &Partition) -> SplitResult<()> {
        let sheets: Vec<&Sheet> = partition.sheets.iter().collect();
        self.writer.write(&sheets, &partition.path)
    }
}

/// Split `source_path` into `destination_dir` with the default configuration.
///
/// Returns the files written, or an error if any partition failed.
pub fn partition_workbook(
    source_path: &Path,
    destination_dir: &Path,
    filter_date: Option<NaiveDate>,
) -> SplitResult<Vec<OutputFile>> {
    let run = RunConfig::new(source_path, destination_dir).with_filter_date(filter_date);
    let report = Splitter::new(SplitConfig::default(), run).run()?;

    if !report.is_success() {
        return Err(SplitError::PartialFailure {
            failed: report.failures.len(),
            total: report.partition_count(),
        });
    }
    Ok(report.outputs)
}

//==============================================================================
// Inspection
//==============================================================================

/// How a source sheet will be treated
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SheetOverview {
    pub name: String,
    pub rows: usize,
    pub columns: usize,
    pub key_column: Option<String>,
    pub date_column: Option<String>,
    pub excluded: bool,
}

/// A partition key and the number of aggregated rows carrying it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeyCount {
    pub key: String,
    pub rows: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkbookOverview {
    pub source: PathBuf,
    pub sheets: Vec<SheetOverview>,
    pub keys: Vec<KeyCount>,
}

/// Validate the schema and describe the workbook without writing anything
pub fn inspect(workbook: &SourceWorkbook, config: &SplitConfig) -> SplitResult<WorkbookOverview> {
    config.validate()?;
    let schema = schema::resolve(workbook, config, false)?;
    let aggregated = &workbook.sheets[schema.aggregated.sheet];

    let sheets = workbook
        .sheets
        .iter()
        .map(|sheet| {
            let key = config.key_column.find_in(sheet);
            let date = key.and(config.date_column.find_in(sheet));
            SheetOverview {
                name: sheet.name.clone(),
                rows: sheet.row_count(),
                columns: sheet.headers.len(),
                key_column: key.map(|c| sheet.headers[c].clone()),
                date_column: date.map(|c| sheet.headers[c].clone()),
                excluded: config.is_excluded(&sheet.name),
            }
        })
        .collect();

    let keys = filter::distinct_keys(aggregated, schema.aggregated.key)
        .iter()
        .map(|key| KeyCount {
            key: key.to_string(),
            rows: RowFilter::new()
                .with_key(schema.aggregated.key, key)
                .matching_rows(aggregated)
                .len(),
        })
        .collect();

    Ok(WorkbookOverview {
        source: workbook.path.clone(),
        sheets,
        keys,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CellValue;
    use pretty_assertions::assert_eq;

    fn text(s: &str) -> CellValue {
        CellValue::Text(s.to_string())
    }

    fn num(n: f64) -> CellValue {
        CellValue::Number(n)
    }

    fn sheet(name: &str, headers: &[&str], rows: Vec<Vec<CellValue>>) -> Sheet {
        let mut sheet = Sheet::new(name, headers.iter().map(|h| h.to_string()).collect());
        for row in rows {
            sheet.push_row(row);
        }
        sheet
    }

    fn config() -> SplitConfig {
        SplitConfig {
            mail_copy_columns: vec![
                "SR ID".to_string(),
                "Name".to_string(),
                "Request Date".to_string(),
            ],
            ..SplitConfig::default()
        }
    }

    fn source() -> SourceWorkbook {
        let mut wb = SourceWorkbook::new(PathBuf::from("source.xlsx"));
        wb.add_sheet(sheet(
            "Aggregated Data",
            &["Name", "SR ID", "Request Date", "Extra"],
            vec![
                vec![text("Acme"), num(1.0), text("2024-07-01"), text("x")],
                vec![text("Acme"), num(2.0), text("2024-07-02"), text("y")],
                vec![text("Beta"), num(3.0), text("2024-07-01"), text("z")],
                vec![CellValue::Empty, num(4.0), text("2024-07-01"), text("w")],
            ],
        ));
        wb.add_sheet(sheet(
            "Summary of Actions",
            &["SR ID", "Action"],
            vec![
                vec![num(1.0), text("call")],
                vec![num(2.0), text("visit")],
                vec![num(3.0), text("email")],
            ],
        ));
        wb.add_sheet(sheet("Last Drop", &["Name"], vec![vec![text("Acme")]]));
        wb.add_sheet(sheet(
            "Visits",
            &["Name", "Notes"],
            vec![
                vec![text("Beta"), text("b1")],
                vec![text("Acme"), text("a1")],
            ],
        ));
        wb.add_sheet(sheet(
            "Codes",
            &["Code", "Request Date"],
            vec![vec![text("C1"), text("2023-01-01")]],
        ));
        wb
    }

    fn splitter(filter_date: Option<NaiveDate>) -> Splitter {
        let run = RunConfig::new("source.xlsx", "out")
            .with_filter_date(filter_date)
            .with_dry_run(true);
        Splitter::new(config(), run)
    }

    fn partition(splitter: &Splitter, wb: &SourceWorkbook, key: &str) -> Partition {
        let schema = schema::resolve(wb, &splitter.config, splitter.run.filter_date.is_some())
            .unwrap();
        let key = text(key).key().unwrap();
        splitter.build_partition(wb, &schema, &key, key.to_string(), PathBuf::from("p.xlsx"))
    }

    fn column(sheet: &Sheet, name: &str) -> Vec<CellValue> {
        let col = sheet.column_index(name).unwrap();
        (0..sheet.row_count())
            .map(|r| sheet.cell(r, col).clone())
            .collect()
    }

    #[test]
    fn test_invalid_config_rejected_before_reading() {
        let config = SplitConfig {
            mail_copy_columns: Vec::new(),
            ..config()
        };
        let run = RunConfig::new("/does/not/exist.xlsx", "out");
        assert!(matches!(
            Splitter::new(config.clone(), run).run(),
            Err(SplitError::Config(_))
        ));

        let run = RunConfig::new("source.xlsx", "out").with_dry_run(true);
        assert!(matches!(
            Splitter::new(config, run).split(&source()),
            Err(SplitError::Config(_))
        ));
    }

    #[test]
    fn test_partition_without_date_filter() {
        let wb = source();
        let acme = partition(&splitter(None), &wb, "Acme");

        let names: Vec<&str> = acme.sheets.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "mail copy&paste",
                "Aggregated Data",
                "Summary of Actions",
                "Visits",
                "Codes"
            ]
        );
        assert_eq!(
            acme.mail_copy().headers,
            vec!["SR ID", "Name", "Request Date"]
        );
        assert_eq!(column(acme.mail_copy(), "SR ID"), vec![num(1.0), num(2.0)]);
        assert_eq!(
            column(&acme.sheets[2], "SR ID"),
            vec![num(1.0), num(2.0)]
        );
        assert_eq!(column(&acme.sheets[3], "Notes"), vec![text("a1")]);
        // no key column: copied as is
        assert_eq!(acme.sheets[4], wb.sheets[4]);
    }

    #[test]
    fn test_partition_with_date_filter() {
        let wb = source();
        let date = NaiveDate::from_ymd_opt(2024, 7, 1);
        let acme = partition(&splitter(date), &wb, "Acme");

        assert_eq!(column(acme.mail_copy(), "SR ID"), vec![num(1.0)]);
        assert_eq!(column(&acme.sheets[1], "SR ID"), vec![num(1.0)]);
        assert_eq!(column(&acme.sheets[2], "Action"), vec![text("call")]);
        // key column but no date column: only the key filter applies
        assert_eq!(column(&acme.sheets[3], "Notes"), vec![text("a1")]);
        // date column but no key column: never date-filtered
        assert_eq!(acme.sheets[4].row_count(), 1);
    }

    #[test]
    fn test_empty_partition_keeps_headers() {
        let wb = source();
        let date = NaiveDate::from_ymd_opt(2024, 7, 2);
        let beta = partition(&splitter(date), &wb, "Beta");

        assert_eq!(beta.mail_copy().row_count(), 0);
        assert_eq!(beta.mail_copy().headers.len(), 3);
        assert_eq!(beta.sheets[2].row_count(), 0);
        assert_eq!(beta.sheets[2].headers, vec!["SR ID", "Action"]);
    }

    #[test]
    fn test_dry_run_report() {
        let wb = source();
        let report = splitter(NaiveDate::from_ymd_opt(2024, 7, 1))
            .split(&wb)
            .unwrap();

        assert!(report.is_success());
        assert!(report.dry_run);
        assert_eq!(report.excluded_sheets, vec!["Last Drop".to_string()]);
        let keys: Vec<&str> = report.outputs.iter().map(|o| o.key.as_str()).collect();
        assert_eq!(keys, vec!["Acme", "Beta"]);
        assert_eq!(
            report.outputs[0].path,
            PathBuf::from("out").join("Acme_2024-07-01.xlsx")
        );
        assert_eq!(report.outputs[0].mail_copy_rows, 1);
        assert_eq!(report.outputs[1].mail_copy_rows, 1);
    }

    #[test]
    fn test_numeric_keys_label_without_decimals() {
        let mut wb = SourceWorkbook::new(PathBuf::from("source.xlsx"));
        wb.add_sheet(sheet(
            "Aggregated Data",
            &["Name", "SR ID", "Request Date"],
            vec![vec![num(42.0), num(1.0), CellValue::Empty]],
        ));
        let report = splitter(None).split(&wb).unwrap();
        assert_eq!(report.outputs[0].key, "42");
        assert_eq!(report.outputs[0].path, PathBuf::from("out").join("42.xlsx"));
    }

    #[test]
    fn test_inspect() {
        let wb = source();
        let overview = inspect(&wb, &config()).unwrap();

        assert_eq!(
            overview.keys,
            vec![
                KeyCount { key: "Acme".to_string(), rows: 2 },
                KeyCount { key: "Beta".to_string(), rows: 1 },
            ]
        );
        assert_eq!(overview.sheets.len(), 5);
        assert!(overview.sheets[2].excluded);
        assert_eq!(overview.sheets[0].date_column.as_deref(), Some("Request Date"));
        assert_eq!(overview.sheets[4].key_column, None);
        assert_eq!(overview.sheets[4].date_column, None);
    }
}

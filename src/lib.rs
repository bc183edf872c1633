//! Sheet Splitter - split one workbook into per-contractor workbooks
//!
//! Reads a multi-sheet workbook, takes the distinct values of the key column
//! ("Όνομα" / "Name") of its "Aggregated Data" sheet, and writes one workbook
//! per value containing a fixed-column "mail copy&paste" summary sheet plus a
//! filtered copy of every other sheet.
//!
//! # Features
//!
//! - Optional calendar-date filter on the "Request Date" column
//! - "Summary of Actions" restricted to the SR IDs of each summary sheet
//! - Schema validated up front: no partial output on a malformed workbook
//! - Unsafe file-name characters sanitized, colliding names rejected
//! - Sheet and column names configurable from YAML
//!
//! # Example
//!
//! ```no_run
//! use sheet_splitter::config::{RunConfig, SplitConfig};
//! use sheet_splitter::splitter::Splitter;
//! use chrono::NaiveDate;
//!
//! let run = RunConfig::new("master.xlsx", "out")
//!     .with_filter_date(NaiveDate::from_ymd_opt(2024, 7, 1));
//! let report = Splitter::new(SplitConfig::default(), run).run()?;
//!
//! for output in &report.outputs {
//!     println!("{} -> {}", output.key, output.path.display());
//! }
//! # Ok::<(), sheet_splitter::error::SplitError>(())
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod excel;
pub mod splitter;
pub mod types;

// Re-export commonly used types
pub use config::{FileNaming, RunConfig, SplitConfig};
pub use error::{SplitError, SplitResult};
pub use splitter::{partition_workbook, OutputFile, SplitReport, Splitter};
pub use types::{CellKey, CellValue, Sheet, SourceWorkbook};

use thiserror::Error;

pub type SplitResult<T> = Result<T, SplitError>;

#[derive(Error, Debug)]
pub enum SplitError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Workbook error: {0}")]
    Workbook(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Sheet '{0}' not found in the source workbook")]
    MissingSheet(String),

    #[error("Column '{column}' not found in sheet '{sheet}'")]
    MissingColumn { sheet: String, column: String },

    #[error("Invalid date '{0}'. Expected YYYY-MM-DD (e.g., 2024-07-01) or 'today'")]
    InvalidDate(String),

    #[error("Partition key '{0}' cannot be turned into a file name")]
    InvalidFileName(String),

    #[error("Partition keys '{first}' and '{second}' would both be written to '{file_name}'")]
    FileNameCollision {
        first: String,
        second: String,
        file_name: String,
    },

    #[error("Excel export error: {0}")]
    Export(String),

    #[error("{failed} of {total} output workbooks could not be written")]
    PartialFailure { failed: usize, total: usize },
}

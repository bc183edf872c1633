//! Output file names derived from partition keys

use crate::config::FileNaming;
use crate::error::{SplitError, SplitResult};
use chrono::NaiveDate;
use regex::Regex;
use std::collections::HashMap;

const RESERVED_NAMES: &[&str] = &[
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
    "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];

/// Turns partition keys into safe, distinct file names
pub struct FileNamer {
    illegal: Regex,
    naming: FileNaming,
    filter_date: Option<NaiveDate>,
}

impl FileNamer {
    pub fn new(naming: FileNaming, filter_date: Option<NaiveDate>) -> SplitResult<Self> {
        let illegal = Regex::new(r#"[<>:"/\\|?*\x00-\x1F]"#)
            .map_err(|e| SplitError::Config(format!("Regex error: {}", e)))?;
        Ok(Self {
            illegal,
            naming,
            filter_date,
        })
    }

    /// Key with file-system-unsafe characters replaced by `_`.
    ///
    /// Returns `None` when nothing usable is left.
    pub fn sanitize(&self, key: &str) -> Option<String> {
        let replaced = self.illegal.replace_all(key, "_");
        let trimmed = replaced.trim().trim_end_matches(['.', ' ']);
        if trimmed.is_empty() || trimmed.chars().all(|c| c == '.') {
            return None;
        }

        let stem = trimmed.split('.').next().unwrap_or(trimmed);
        if RESERVED_NAMES.iter().any(|r| r.eq_ignore_ascii_case(stem)) {
            Some(format!("_{}", trimmed))
        } else {
            Some(trimmed.to_string())
        }
    }

    /// `{key}.xlsx` or `{key}_{date}.xlsx`
    pub fn file_name(&self, key: &str) -> SplitResult<String> {
        let stem = self
            .sanitize(key)
            .ok_or_else(|| SplitError::InvalidFileName(key.to_string()))?;
        match (self.naming, self.filter_date) {
            (FileNaming::KeyAndDate, Some(date)) => {
                Ok(format!("{}_{}.xlsx", stem, date.format("%Y-%m-%d")))
            }
            _ => Ok(format!("{}.xlsx", stem)),
        }
    }

    /// File names for all keys, in key order.
    ///
    /// Two keys mapping to the same name (ignoring case, as Windows and
    /// macOS do) is an error rather than a silent overwrite.
    pub fn plan(&self, keys: &[String]) -> SplitResult<Vec<String>> {
        let mut claimed: HashMap<String, &str> = HashMap::new();
        let mut names = Vec::with_capacity(keys.len());

        for key in keys {
            let name = self.file_name(key)?;
            if let Some(first) = claimed.insert(name.to_lowercase(), key) {
                return Err(SplitError::FileNameCollision {
                    first: first.to_string(),
                    second: key.clone(),
                    file_name: name,
                });
            }
            names.push(name);
        }

        Ok(names)
    }
}

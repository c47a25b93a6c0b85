use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::{self, ALL_DATASET_FILE_LABEL, ALL_DATASET_LABEL};

/// One raw survey row exactly as read from the input CSV.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRow {
    /// 1-based data line number, for log messages
    pub line: usize,
    pub fields: Vec<String>,
}

/// The raw input: header row plus data rows, before any cleaning.
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<RawRow>,
}

impl RawTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index of a column, matching headers case-insensitively after trimming
    pub fn column_index(&self, name: &str) -> Option<usize> {
        let wanted = name.trim().to_lowercase();
        self.headers
            .iter()
            .position(|h| h.trim().to_lowercase() == wanted)
    }
}

/// A cleaned survey respondent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurveyRecord {
    pub job_title: String,
    /// Annual salary in `currency`
    pub salary: f64,
    /// Additional monetary compensation in `currency`; 0 when not reported
    pub bonus: f64,
    pub currency: String,
    /// Canonical code from the free-text "other currency" answer
    pub other_currency: Option<String>,
    pub country: String,
    pub age_range: String,
    pub experience: Option<String>,
}

/// Which cleaned dataset the analyzer works on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DatasetId {
    /// One currency partition, identified by its file-safe label
    Currency(String),
    /// Every cleaned row across currencies
    All,
}

impl DatasetId {
    pub fn for_currency(code: &str) -> Self {
        DatasetId::Currency(constants::file_safe_label(code))
    }

    /// Parse a user-supplied name (`USD`, `aud/nzd`, `ALL`, ...)
    pub fn parse(name: &str) -> Self {
        let trimmed = name.trim();
        if trimmed.eq_ignore_ascii_case(ALL_DATASET_LABEL) {
            DatasetId::All
        } else {
            DatasetId::for_currency(&trimmed.to_uppercase())
        }
    }

    /// Label used in menus, report headers and result folder names
    pub fn label(&self) -> &str {
        match self {
            DatasetId::Currency(label) => label,
            DatasetId::All => ALL_DATASET_LABEL,
        }
    }

    /// Name of the cleaned CSV backing this dataset
    pub fn file_name(&self) -> String {
        match self {
            DatasetId::Currency(label) => constants::cleaned_file_name(label),
            DatasetId::All => constants::cleaned_file_name(ALL_DATASET_FILE_LABEL),
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, DatasetId::All)
    }
}

impl fmt::Display for DatasetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// File and folder naming shared by the cleaner (writer) and analyzer (reader).
/// The two stages only talk to each other through these files.

pub const DEFAULT_INPUT_FILE: &str = "data.csv";

pub const CLEANED_FILE_PREFIX: &str = "cleaned_data_";
pub const CLEANED_FILE_EXTENSION: &str = "csv";

/// Label of the combined dataset, both in file names and in menus
pub const ALL_DATASET_LABEL: &str = "ALL";
pub const ALL_DATASET_FILE_LABEL: &str = "all";

pub const CLEANING_SUMMARY_FILE: &str = "cleaning_summary.json";

pub const RESULTS_DIR_PREFIX: &str = "results_";

/// Timestamp format embedded in saved report and chart file names
pub const RESULT_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Currency code whose rows carry their real currency in a free-text column
pub const OTHER_CURRENCY: &str = "OTHER";

pub const USD: &str = "USD";

/// Turn a currency code into something safe to embed in a file name (`AUD/NZD` -> `AUD_NZD`)
pub fn file_safe_label(code: &str) -> String {
    code.replace(['/', '\\'], "_")
}

/// File name of the cleaned dataset for a file-safe label
pub fn cleaned_file_name(label: &str) -> String {
    format!("{}{}.{}", CLEANED_FILE_PREFIX, label, CLEANED_FILE_EXTENSION)
}

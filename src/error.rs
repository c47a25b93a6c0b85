use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SurveyError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Missing required column: {0}")]
    MissingColumn(String),

    #[error("Dataset file not found: {}", .0.display())]
    DatasetNotFound(PathBuf),

    #[error("Dataset '{0}' has no usable records")]
    EmptyDataset(String),

    #[error("Chart rendering failed: {0}")]
    Chart(String),
}

pub type Result<T> = std::result::Result<T, SurveyError>;

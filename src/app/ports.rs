use std::path::PathBuf;

use crate::analysis::AnalysisReport;
use crate::app::clean_use_case::CleanSummary;
use crate::domain::{DatasetId, RawTable, SurveyRecord};

// Cleaner-side ports
pub trait SurveySourcePort {
    fn read_raw(&self) -> anyhow::Result<RawTable>;
}

pub trait CleanedOutputPort {
    /// Write one cleaned dataset, returning where it landed
    fn write_dataset(&self, dataset: &DatasetId, records: &[SurveyRecord]) -> anyhow::Result<PathBuf>;
    fn write_summary(&self, summary: &CleanSummary) -> anyhow::Result<PathBuf>;
}

// Analyzer-side ports
pub trait DatasetSourcePort {
    /// Cleaned datasets present on disk, currencies first then `ALL`
    fn available_datasets(&self) -> anyhow::Result<Vec<DatasetId>>;
    fn load(&self, dataset: &DatasetId) -> anyhow::Result<Vec<SurveyRecord>>;
}

pub trait ReportSinkPort {
    fn save(&self, report: &AnalysisReport) -> anyhow::Result<SavedReport>;
}

#[derive(Clone, Debug, PartialEq)]
pub struct SavedReport {
    pub text_path: PathBuf,
    /// `None` when the analysis has no chart or rendering failed
    pub chart_path: Option<PathBuf>,
}

//! Metrics for the cleaner and analyzer.
//!
//! Recording is a no-op until [`install_recorder`] is called; the binary only
//! installs it when a metrics snapshot file is requested.

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::fmt;
use std::fs;
use std::path::Path;

use crate::error::{Result, SurveyError};

/// Enum representing all metric names used in the system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricName {
    CleanRowsRead,
    CleanDuplicatesRemoved,
    CleanRowsRejected,
    CleanLookupHits,
    CleanOutliersRemoved,
    CleanRowsWritten,
    CleanPartitionSize,
    AnalysisRuns,
    AnalysisRowsUnconverted,
    ReportsSaved,
    ChartsFailed,
}

impl MetricName {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricName::CleanRowsRead => "survey_clean_rows_read_total",
            MetricName::CleanDuplicatesRemoved => "survey_clean_duplicates_removed_total",
            MetricName::CleanRowsRejected => "survey_clean_rows_rejected_total",
            MetricName::CleanLookupHits => "survey_clean_lookup_hits_total",
            MetricName::CleanOutliersRemoved => "survey_clean_outliers_removed_total",
            MetricName::CleanRowsWritten => "survey_clean_rows_written_total",
            MetricName::CleanPartitionSize => "survey_clean_partition_size",
            MetricName::AnalysisRuns => "survey_analysis_runs_total",
            MetricName::AnalysisRowsUnconverted => "survey_analysis_rows_unconverted_total",
            MetricName::ReportsSaved => "survey_reports_saved_total",
            MetricName::ChartsFailed => "survey_charts_failed_total",
        }
    }
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Install the process-wide Prometheus recorder
pub fn install_recorder() -> Result<PrometheusHandle> {
    PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| SurveyError::Config(format!("Failed to install metrics recorder: {}", e)))
}

/// Write the current metric values in Prometheus text format
pub fn write_snapshot(handle: &PrometheusHandle, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, handle.render())?;
    Ok(())
}

pub mod cleaner {
    use super::MetricName;

    pub fn rows_read(count: usize) {
        ::metrics::counter!(MetricName::CleanRowsRead.as_str()).increment(count as u64);
    }

    pub fn duplicates_removed(count: usize) {
        ::metrics::counter!(MetricName::CleanDuplicatesRemoved.as_str()).increment(count as u64);
    }

    /// A row dropped before outlier filtering, labelled by reason
    pub fn row_rejected(reason: &'static str) {
        ::metrics::counter!(MetricName::CleanRowsRejected.as_str(), "reason" => reason).increment(1);
    }

    /// A free-text value resolved through a lookup table
    pub fn lookup_hit(table: &'static str) {
        ::metrics::counter!(MetricName::CleanLookupHits.as_str(), "table" => table).increment(1);
    }

    pub fn outliers_removed(currency: &str, count: usize) {
        ::metrics::counter!(MetricName::CleanOutliersRemoved.as_str(), "currency" => currency.to_string())
            .increment(count as u64);
    }

    pub fn partition_written(currency: &str, rows: usize) {
        ::metrics::histogram!(MetricName::CleanPartitionSize.as_str()).record(rows as f64);
        ::metrics::counter!(MetricName::CleanRowsWritten.as_str(), "currency" => currency.to_string())
            .increment(rows as u64);
    }
}

pub mod analyzer {
    use super::MetricName;

    pub fn analysis_run(kind: &'static str, dataset: &str) {
        ::metrics::counter!(
            MetricName::AnalysisRuns.as_str(),
            "kind" => kind,
            "dataset" => dataset.to_string()
        )
        .increment(1);
    }

    /// Rows left out of a USD aggregation because no rate applied
    pub fn rows_unconverted(count: usize) {
        ::metrics::counter!(MetricName::AnalysisRowsUnconverted.as_str()).increment(count as u64);
    }

    pub fn report_saved() {
        ::metrics::counter!(MetricName::ReportsSaved.as_str()).increment(1);
    }

    pub fn chart_failed() {
        ::metrics::counter!(MetricName::ChartsFailed.as_str()).increment(1);
    }
}

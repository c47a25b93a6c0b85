use anyhow::Context;
use chrono::{DateTime, Local};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::analysis::AnalysisReport;
use crate::app::ports::{ReportSinkPort, SavedReport};
use crate::constants::{RESULTS_DIR_PREFIX, RESULT_TIMESTAMP_FORMAT};
use crate::infra::chart::BarChartRenderer;
use crate::observability::metrics::analyzer as analyzer_metrics;

const BANNER_WIDTH: usize = 80;

/// Saves reports under `results_<dataset>/` as timestamped text files plus PNG charts
pub struct FileReportSink {
    base_dir: PathBuf,
    charts: BarChartRenderer,
}

impl FileReportSink {
    pub fn new(base_dir: impl Into<PathBuf>, charts: BarChartRenderer) -> Self {
        Self {
            base_dir: base_dir.into(),
            charts,
        }
    }

    pub fn results_dir(&self, report: &AnalysisReport) -> PathBuf {
        self.base_dir
            .join(format!("{}{}", RESULTS_DIR_PREFIX, report.dataset.label()))
    }

    fn save_at(&self, report: &AnalysisReport, now: DateTime<Local>) -> anyhow::Result<SavedReport> {
        let dir = self.results_dir(report);
        fs::create_dir_all(&dir)
            .with_context(|| format!("Cannot create results directory {}", dir.display()))?;

        let stamp = now.format(RESULT_TIMESTAMP_FORMAT).to_string();
        let text_path = dir.join(format!("{}_{}.txt", report.title().replace(' ', "_"), stamp));
        fs::write(&text_path, render_with_banner(report, &now))
            .with_context(|| format!("Cannot write {}", text_path.display()))?;

        let chart_path = report.chart.as_ref().and_then(|spec| {
            let path = dir.join(format!("{}_{}.png", report.kind.key(), stamp));
            self.save_chart(spec, &path)
        });

        Ok(SavedReport {
            text_path,
            chart_path,
        })
    }

    fn save_chart(&self, spec: &crate::analysis::ChartSpec, path: &Path) -> Option<PathBuf> {
        match self.charts.render(spec, path) {
            Ok(()) => Some(path.to_path_buf()),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Chart could not be saved");
                analyzer_metrics::chart_failed();
                None
            }
        }
    }
}

impl ReportSinkPort for FileReportSink {
    fn save(&self, report: &AnalysisReport) -> anyhow::Result<SavedReport> {
        self.save_at(report, Local::now())
    }
}

/// Report text preceded by a banner naming the analysis, dataset and time
pub fn render_with_banner(report: &AnalysisReport, generated: &DateTime<Local>) -> String {
    let rule = "=".repeat(BANNER_WIDTH);
    format!(
        "{rule}\n{} - {}\nGenerated: {}\n{rule}\n\n{}",
        report.title().to_uppercase(),
        report.dataset.label(),
        generated.format("%Y-%m-%d %H:%M:%S"),
        report.render_text(),
        rule = rule,
    )
}

use anyhow::{bail, Context, Result};
use tracing::{info, info_span};

use crate::analysis::{AnalysisKind, AnalysisReport, SalaryAnalyzer};
use crate::app::ports::{DatasetSourcePort, ReportSinkPort, SavedReport};
use crate::domain::{DatasetId, SurveyRecord};
use crate::observability::metrics::analyzer as analyzer_metrics;

/// A finished analysis and where it was saved
#[derive(Debug, Clone)]
pub struct AnalysisOutcome {
    pub report: AnalysisReport,
    pub saved: SavedReport,
}

/// Use case for running one analysis against the cleaned datasets
pub struct AnalyzeUseCase {
    datasets: Box<dyn DatasetSourcePort>,
    sink: Box<dyn ReportSinkPort>,
    analyzer: SalaryAnalyzer,
}

impl AnalyzeUseCase {
    pub fn new(
        datasets: Box<dyn DatasetSourcePort>,
        sink: Box<dyn ReportSinkPort>,
        analyzer: SalaryAnalyzer,
    ) -> Self {
        Self {
            datasets,
            sink,
            analyzer,
        }
    }

    pub fn available_datasets(&self) -> Result<Vec<DatasetId>> {
        self.datasets.available_datasets()
    }

    /// Run `kind` on `dataset`, then save the text report and chart.
    /// Cross-currency comparison ignores `dataset` and reads every currency partition.
    pub fn run(&self, kind: AnalysisKind, dataset: &DatasetId) -> Result<AnalysisOutcome> {
        let _span = info_span!("analysis", kind = kind.key(), dataset = %dataset).entered();

        let (target, records) = if kind.needs_dataset() {
            let records = self
                .datasets
                .load(dataset)
                .with_context(|| format!("Failed to load dataset {}", dataset))?;
            (dataset.clone(), records)
        } else {
            (DatasetId::All, self.load_currency_partitions()?)
        };
        info!(rows = records.len(), "Loaded cleaned data");

        let report = self.analyzer.run(kind, &target, &records)?;
        analyzer_metrics::analysis_run(kind.key(), target.label());

        let saved = self.sink.save(&report).context("Failed to save analysis report")?;
        analyzer_metrics::report_saved();
        info!(path = %saved.text_path.display(), "Saved report");

        Ok(AnalysisOutcome { report, saved })
    }

    fn load_currency_partitions(&self) -> Result<Vec<SurveyRecord>> {
        let partitions: Vec<DatasetId> = self
            .datasets
            .available_datasets()?
            .into_iter()
            .filter(|d| !d.is_all())
            .collect();
        if partitions.is_empty() {
            bail!("No cleaned currency datasets found; run the cleaner first");
        }

        let mut records = Vec::new();
        for dataset in &partitions {
            let loaded = self
                .datasets
                .load(dataset)
                .with_context(|| format!("Failed to load dataset {}", dataset))?;
            records.extend(loaded);
        }
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SurveyConfig;
    use crate::error::SurveyError;
    use std::collections::BTreeMap;
    use std::path::PathBuf;
    use std::sync::{Arc, Mutex};

    struct MockDatasets {
        data: BTreeMap<DatasetId, Vec<SurveyRecord>>,
    }

    impl DatasetSourcePort for MockDatasets {
        fn available_datasets(&self) -> Result<Vec<DatasetId>> {
            Ok(self.data.keys().cloned().collect())
        }

        fn load(&self, dataset: &DatasetId) -> Result<Vec<SurveyRecord>> {
            self.data
                .get(dataset)
                .cloned()
                .ok_or_else(|| SurveyError::DatasetNotFound(PathBuf::from(dataset.file_name())).into())
        }
    }

    #[derive(Default)]
    struct MockReportSink {
        reports: Arc<Mutex<Vec<AnalysisReport>>>,
    }

    impl ReportSinkPort for MockReportSink {
        fn save(&self, report: &AnalysisReport) -> Result<SavedReport> {
            self.reports.lock().unwrap().push(report.clone());
            Ok(SavedReport {
                text_path: PathBuf::from(format!("results_{}/report.txt", report.dataset.label())),
                chart_path: None,
            })
        }
    }

    fn record(title: &str, salary: f64, currency: &str) -> SurveyRecord {
        SurveyRecord {
            job_title: title.to_string(),
            salary,
            bonus: 0.0,
            currency: currency.to_string(),
            other_currency: None,
            country: "Somewhere".to_string(),
            age_range: "25-34".to_string(),
            experience: None,
        }
    }

    fn use_case() -> (AnalyzeUseCase, Arc<Mutex<Vec<AnalysisReport>>>) {
        let usd = vec![record("Engineer", 100000.0, "USD"), record("Nurse", 70000.0, "USD")];
        let eur = vec![record("Engineer", 80000.0, "EUR")];
        let mut all = usd.clone();
        all.extend(eur.clone());

        let mut data = BTreeMap::new();
        data.insert(DatasetId::for_currency("USD"), usd);
        data.insert(DatasetId::for_currency("EUR"), eur);
        data.insert(DatasetId::All, all);

        let sink = MockReportSink::default();
        let reports = sink.reports.clone();
        let analyzer = SalaryAnalyzer::from_config(&SurveyConfig::builtin().unwrap());
        (
            AnalyzeUseCase::new(Box::new(MockDatasets { data }), Box::new(sink), analyzer),
            reports,
        )
    }

    #[test]
    fn test_run_saves_report_for_dataset() {
        let (use_case, reports) = use_case();
        let outcome = use_case
            .run(AnalysisKind::Summary, &DatasetId::for_currency("USD"))
            .unwrap();

        assert_eq!(outcome.saved.text_path, PathBuf::from("results_USD/report.txt"));
        assert_eq!(reports.lock().unwrap().len(), 1);
        assert!(outcome.report.render_text().contains("Total records: 2"));
    }

    #[test]
    fn test_cross_currency_reads_every_partition() {
        let (use_case, _) = use_case();
        let outcome = use_case
            .run(AnalysisKind::CrossCurrency, &DatasetId::for_currency("USD"))
            .unwrap();

        assert_eq!(outcome.report.dataset, DatasetId::All);
        let table = outcome.report.table.unwrap();
        let counts: usize = table.rows.iter().map(|r| r.stats.count).sum();
        assert_eq!(counts, 3);
    }

    #[test]
    fn test_missing_dataset_is_error() {
        let (use_case, reports) = use_case();
        let err = use_case
            .run(AnalysisKind::Bonus, &DatasetId::for_currency("JPY"))
            .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<SurveyError>(),
            Some(SurveyError::DatasetNotFound(_))
        ));
        assert!(reports.lock().unwrap().is_empty());
    }
}

use std::fs;
use std::path::Path;

use salary_survey::analysis::{AnalysisKind, SalaryAnalyzer};
use salary_survey::app::analyze_use_case::AnalyzeUseCase;
use salary_survey::app::ports::CleanedOutputPort;
use salary_survey::config::{ChartConfig, SurveyConfig};
use salary_survey::domain::{DatasetId, SurveyRecord};
use salary_survey::error::SurveyError;
use salary_survey::infra::{BarChartRenderer, CsvDatasetStore, FileReportSink};
use tempfile::tempdir;

fn record(title: &str, salary: f64, bonus: f64, currency: &str, country: &str) -> SurveyRecord {
    SurveyRecord {
        job_title: title.to_string(),
        salary,
        bonus,
        currency: currency.to_string(),
        other_currency: None,
        country: country.to_string(),
        age_range: "25-34".to_string(),
        experience: None,
    }
}

/// Write cleaned datasets the way the cleaner lays them out
fn seed(dir: &Path, config: &SurveyConfig, records: &[SurveyRecord]) {
    let store = CsvDatasetStore::new(dir, config.columns.clone());
    for (currency, partition) in salary_survey::pipeline::partition_by_currency(records) {
        store
            .write_dataset(&DatasetId::for_currency(&currency), &partition)
            .unwrap();
    }
    store.write_dataset(&DatasetId::All, records).unwrap();
}

fn use_case(dir: &Path, config: &SurveyConfig) -> AnalyzeUseCase {
    let charts = BarChartRenderer::new(&ChartConfig {
        width: 400,
        height: 300,
        font_path: None,
    });
    AnalyzeUseCase::new(
        Box::new(CsvDatasetStore::new(dir, config.columns.clone())),
        Box::new(FileReportSink::new(dir, charts)),
        SalaryAnalyzer::from_config(config),
    )
}

#[test]
fn test_all_dataset_converts_eur_before_aggregation() {
    let dir = tempdir().unwrap();
    let config = SurveyConfig::builtin().unwrap();
    seed(
        dir.path(),
        &config,
        &[record("Teacher", 50000.0, 0.0, "EUR", "Germany")],
    );

    let outcome = use_case(dir.path(), &config)
        .run(AnalysisKind::Summary, &DatasetId::All)
        .unwrap();
    let text = outcome.report.render_text();
    // 50,000 EUR at the static rate of 1.164 USD
    assert!(text.contains("Median: 58,200.00 USD"), "{}", text);
    assert!(text.contains("Currency: USD - Converted"));
}

#[test]
fn test_currency_dataset_is_not_converted() {
    let dir = tempdir().unwrap();
    let config = SurveyConfig::builtin().unwrap();
    seed(
        dir.path(),
        &config,
        &[
            record("Teacher", 50000.0, 2000.0, "EUR", "Germany"),
            record("Teacher", 40000.0, 0.0, "EUR", "France"),
        ],
    );

    let outcome = use_case(dir.path(), &config)
        .run(AnalysisKind::Bonus, &DatasetId::for_currency("EUR"))
        .unwrap();
    let text = outcome.report.render_text();
    assert!(text.contains("Respondents with bonus: 1 (50.0%)"));
    assert!(text.contains("Max bonus: 2,000.00 EUR"));
}

#[test]
fn test_reports_saved_in_results_folder() {
    let dir = tempdir().unwrap();
    let config = SurveyConfig::builtin().unwrap();
    let records: Vec<SurveyRecord> = (0..6)
        .map(|i| record("Engineer", 90000.0 + i as f64 * 1000.0, 0.0, "USD", "United States"))
        .collect();
    seed(dir.path(), &config, &records);

    let outcome = use_case(dir.path(), &config)
        .run(AnalysisKind::Benchmark, &DatasetId::for_currency("USD"))
        .unwrap();

    let text_path = &outcome.saved.text_path;
    assert_eq!(text_path.parent().unwrap(), dir.path().join("results_USD"));
    let name = text_path.file_name().unwrap().to_str().unwrap();
    assert!(name.starts_with("Salary_Benchmarking_"));
    assert!(name.ends_with(".txt"));
    // Salary_Benchmarking_YYYYmmdd_HHMMSS.txt
    let stamp = &name["Salary_Benchmarking_".len()..name.len() - ".txt".len()];
    assert_eq!(stamp.len(), 15);
    assert_eq!(&stamp[8..9], "_");

    let saved = fs::read_to_string(text_path).unwrap();
    assert!(saved.contains("SALARY BENCHMARKING - USD"));
    assert!(saved.contains("Engineer"));

    if let Some(chart) = &outcome.saved.chart_path {
        assert!(chart.is_file());
        assert_eq!(chart.parent().unwrap(), dir.path().join("results_USD"));
    }
}

#[test]
fn test_cross_currency_reads_every_partition() {
    let dir = tempdir().unwrap();
    let config = SurveyConfig::builtin().unwrap();
    seed(
        dir.path(),
        &config,
        &[
            record("A", 60000.0, 0.0, "USD", "United States"),
            record("B", 50000.0, 0.0, "EUR", "Germany"),
            record("C", 8000000.0, 0.0, "JPY", "Japan"),
        ],
    );

    let outcome = use_case(dir.path(), &config)
        .run(AnalysisKind::CrossCurrency, &DatasetId::for_currency("USD"))
        .unwrap();
    let table = outcome.report.table.unwrap();
    assert_eq!(table.rows.len(), 3);
    assert!(outcome
        .saved
        .text_path
        .starts_with(dir.path().join("results_ALL")));
}

#[test]
fn test_missing_dataset_is_an_error() {
    let dir = tempdir().unwrap();
    let config = SurveyConfig::builtin().unwrap();

    let err = use_case(dir.path(), &config)
        .run(AnalysisKind::Summary, &DatasetId::for_currency("CHF"))
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<SurveyError>(),
        Some(SurveyError::DatasetNotFound(_))
    ));
    assert!(!dir.path().join("results_CHF").exists());
}

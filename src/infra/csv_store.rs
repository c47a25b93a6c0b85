use anyhow::Context;
use csv::{ReaderBuilder, Trim, WriterBuilder};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::app::clean_use_case::CleanSummary;
use crate::app::ports::{CleanedOutputPort, DatasetSourcePort, SurveySourcePort};
use crate::config::ColumnMap;
use crate::constants::{
    ALL_DATASET_FILE_LABEL, CLEANED_FILE_EXTENSION, CLEANED_FILE_PREFIX, CLEANING_SUMMARY_FILE,
};
use crate::domain::{DatasetId, RawRow, RawTable, SurveyRecord};
use crate::error::{Result, SurveyError};
use crate::pipeline::processing::parser::SurveyRowParser;

/// Read a CSV file into headers plus trimmed string rows.
/// Short or long rows are accepted as-is.
pub fn read_raw_table(path: &Path) -> Result<RawTable> {
    if !path.is_file() {
        return Err(SurveyError::DatasetNotFound(path.to_path_buf()));
    }

    let mut reader = ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .from_path(path)?;

    let headers = reader.headers()?.iter().map(str::to_string).collect();
    let mut rows = Vec::new();
    for (index, result) in reader.records().enumerate() {
        let record = result?;
        rows.push(RawRow {
            line: index + 1,
            fields: record.iter().map(str::to_string).collect(),
        });
    }

    debug!(path = %path.display(), rows = rows.len(), "Read CSV file");
    Ok(RawTable { headers, rows })
}

/// The raw survey export
pub struct CsvSurveySource {
    path: PathBuf,
}

impl CsvSurveySource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SurveySourcePort for CsvSurveySource {
    fn read_raw(&self) -> anyhow::Result<RawTable> {
        info!(path = %self.path.display(), "Reading survey export");
        let table = read_raw_table(&self.path)
            .with_context(|| format!("Cannot read survey input {}", self.path.display()))?;
        Ok(table)
    }
}

/// Cleaned datasets stored as `cleaned_data_<label>.csv` files in one directory.
/// The cleaner writes through it and the analyzer reads back through it.
pub struct CsvDatasetStore {
    dir: PathBuf,
    columns: ColumnMap,
}

impl CsvDatasetStore {
    pub fn new(dir: impl Into<PathBuf>, columns: ColumnMap) -> Self {
        Self {
            dir: dir.into(),
            columns,
        }
    }

    pub fn dataset_path(&self, dataset: &DatasetId) -> PathBuf {
        self.dir.join(dataset.file_name())
    }

    fn headers(&self) -> [&str; 8] {
        let c = &self.columns;
        [
            c.job_title.as_str(),
            c.salary.as_str(),
            c.bonus.as_str(),
            c.currency.as_str(),
            c.other_currency.as_str(),
            c.country.as_str(),
            c.age_range.as_str(),
            c.experience.as_str(),
        ]
    }

    fn write_records(&self, path: &Path, records: &[SurveyRecord]) -> Result<()> {
        let mut writer = WriterBuilder::new().from_path(path)?;
        writer.write_record(self.headers())?;
        for record in records {
            let salary = record.salary.to_string();
            let bonus = record.bonus.to_string();
            writer.write_record([
                record.job_title.as_str(),
                salary.as_str(),
                bonus.as_str(),
                record.currency.as_str(),
                record.other_currency.as_deref().unwrap_or(""),
                record.country.as_str(),
                record.age_range.as_str(),
                record.experience.as_deref().unwrap_or(""),
            ])?;
        }
        writer.flush()?;
        Ok(())
    }

    fn read_records(&self, path: &Path) -> Result<Vec<SurveyRecord>> {
        let table = read_raw_table(path)?;
        let parser = SurveyRowParser::for_table(&table, &self.columns)?;

        let mut records = Vec::with_capacity(table.len());
        for row in &table.rows {
            match parser.parse(row) {
                Ok(parsed) => records.push(parsed.record),
                Err(issue) => warn!(path = %path.display(), %issue, "Skipping unreadable cleaned row"),
            }
        }
        Ok(records)
    }
}

/// Dataset id for a file name like `cleaned_data_EUR.csv`
fn dataset_from_file_name(name: &str) -> Option<DatasetId> {
    let label = name
        .strip_prefix(CLEANED_FILE_PREFIX)?
        .strip_suffix(CLEANED_FILE_EXTENSION)?
        .strip_suffix('.')?;
    if label.is_empty() {
        None
    } else if label == ALL_DATASET_FILE_LABEL {
        Some(DatasetId::All)
    } else {
        Some(DatasetId::Currency(label.to_string()))
    }
}

impl CleanedOutputPort for CsvDatasetStore {
    fn write_dataset(&self, dataset: &DatasetId, records: &[SurveyRecord]) -> anyhow::Result<PathBuf> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Cannot create output directory {}", self.dir.display()))?;
        let path = self.dataset_path(dataset);
        self.write_records(&path, records)
            .with_context(|| format!("Cannot write {}", path.display()))?;
        Ok(path)
    }

    fn write_summary(&self, summary: &CleanSummary) -> anyhow::Result<PathBuf> {
        fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(CLEANING_SUMMARY_FILE);
        let json = serde_json::to_string_pretty(summary)?;
        fs::write(&path, json).with_context(|| format!("Cannot write {}", path.display()))?;
        Ok(path)
    }
}

impl DatasetSourcePort for CsvDatasetStore {
    fn available_datasets(&self) -> anyhow::Result<Vec<DatasetId>> {
        if !self.dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut datasets = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            if let Some(dataset) = entry.file_name().to_str().and_then(dataset_from_file_name) {
                datasets.push(dataset);
            }
        }
        datasets.sort();
        Ok(datasets)
    }

    fn load(&self, dataset: &DatasetId) -> anyhow::Result<Vec<SurveyRecord>> {
        let path = self.dataset_path(dataset);
        let records = self.read_records(&path)?;
        info!(dataset = %dataset, rows = records.len(), "Loaded cleaned dataset");
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SurveyConfig;
    use tempfile::tempdir;

    fn store(dir: &Path) -> CsvDatasetStore {
        CsvDatasetStore::new(dir, SurveyConfig::builtin().unwrap().columns)
    }

    fn record(currency: &str, other: Option<&str>) -> SurveyRecord {
        SurveyRecord {
            job_title: "Data Analyst, Senior".to_string(),
            salary: 72500.5,
            bonus: 0.0,
            currency: currency.to_string(),
            other_currency: other.map(str::to_string),
            country: "New Zealand".to_string(),
            age_range: "25-34".to_string(),
            experience: Some("5-7 years".to_string()),
        }
    }

    #[test]
    fn test_written_dataset_reads_back() {
        let dir = tempdir().unwrap();
        let store = store(dir.path());
        let records = vec![record("AUD/NZD", None), record("OTHER", Some("PLN"))];

        let path = store
            .write_dataset(&DatasetId::for_currency("AUD/NZD"), &records)
            .unwrap();
        assert!(path.ends_with("cleaned_data_AUD_NZD.csv"));

        let loaded = store.load(&DatasetId::for_currency("AUD/NZD")).unwrap();
        assert_eq!(loaded, records);
    }

    #[test]
    fn test_available_datasets_lists_cleaned_files_only() {
        let dir = tempdir().unwrap();
        let store = store(dir.path());
        store.write_dataset(&DatasetId::All, &[]).unwrap();
        store.write_dataset(&DatasetId::for_currency("USD"), &[]).unwrap();
        store.write_dataset(&DatasetId::for_currency("EUR"), &[]).unwrap();
        fs::write(dir.path().join("data.csv"), "a,b\n").unwrap();
        fs::write(dir.path().join("cleaned_data_.csv"), "a,b\n").unwrap();

        let datasets = store.available_datasets().unwrap();
        assert_eq!(
            datasets,
            vec![
                DatasetId::Currency("EUR".to_string()),
                DatasetId::Currency("USD".to_string()),
                DatasetId::All,
            ]
        );
    }

    #[test]
    fn test_missing_dataset_file() {
        let dir = tempdir().unwrap();
        let err = store(dir.path()).load(&DatasetId::for_currency("JPY")).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SurveyError>(),
            Some(SurveyError::DatasetNotFound(_))
        ));
    }

    #[test]
    fn test_no_output_dir_means_no_datasets() {
        let dir = tempdir().unwrap();
        let store = store(&dir.path().join("missing"));
        assert!(store.available_datasets().unwrap().is_empty());
    }

    #[test]
    fn test_raw_table_rows_are_trimmed() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data.csv");
        fs::write(&path, "Job Title , Salary\n  Chef ,\"50,000\"\nBaker\n").unwrap();

        let table = read_raw_table(&path).unwrap();
        assert_eq!(table.headers, vec!["Job Title", "Salary"]);
        assert_eq!(table.rows[0].fields, vec!["Chef", "50,000"]);
        assert_eq!(table.rows[1].fields, vec!["Baker"]);
        assert_eq!(table.rows[1].line, 2);
    }
}

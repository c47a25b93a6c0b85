use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::{debug, info, info_span};

use crate::app::ports::{CleanedOutputPort, SurveySourcePort};
use crate::config::{ColumnMap, SurveyConfig};
use crate::domain::{DatasetId, SurveyRecord};
use crate::observability::metrics::cleaner as cleaner_metrics;
use crate::pipeline::processing::dedupe::dedupe_rows;
use crate::pipeline::processing::normalize::{LookupNormalizer, Normalizer};
use crate::pipeline::processing::outliers::{partition_by_currency, OutlierFilter, PartitionOutlierReport};
use crate::pipeline::processing::parser::SurveyRowParser;
use crate::pipeline::processing::quality_gate::{DefaultQualityGate, QualityDecision, QualityGate, QualityIssueType};

/// Per-stage counts of one cleaner run, also written as `cleaning_summary.json`
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CleanSummary {
    pub input_rows: usize,
    pub duplicates_removed: usize,
    pub malformed_salary: usize,
    /// Blank required field or non-positive salary
    pub missing_required: usize,
    pub unknown_currency: usize,
    pub outliers_removed: usize,
    pub final_rows: usize,
    pub rows_per_currency: BTreeMap<String, usize>,
    pub outliers: Vec<PartitionOutlierReport>,
    pub files_written: Vec<PathBuf>,
}

impl CleanSummary {
    /// Rows dropped before outlier removal, duplicates excluded
    pub fn rejected(&self) -> usize {
        self.malformed_salary + self.missing_required + self.unknown_currency
    }
}

/// Use case for turning the raw survey export into cleaned per-currency datasets
pub struct CleanUseCase {
    source: Box<dyn SurveySourcePort>,
    output: Box<dyn CleanedOutputPort>,
    columns: ColumnMap,
    normalizer: Box<dyn Normalizer>,
    quality_gate: Box<dyn QualityGate>,
    outliers: OutlierFilter,
}

impl CleanUseCase {
    pub fn new(
        source: Box<dyn SurveySourcePort>,
        output: Box<dyn CleanedOutputPort>,
        columns: ColumnMap,
        normalizer: Box<dyn Normalizer>,
        quality_gate: Box<dyn QualityGate>,
        outliers: OutlierFilter,
    ) -> Self {
        Self {
            source,
            output,
            columns,
            normalizer,
            quality_gate,
            outliers,
        }
    }

    /// Create a use case with the lookup normalizer and default quality gate
    pub fn from_config(
        config: &SurveyConfig,
        source: Box<dyn SurveySourcePort>,
        output: Box<dyn CleanedOutputPort>,
    ) -> Self {
        Self::new(
            source,
            output,
            config.columns.clone(),
            Box::new(LookupNormalizer::from_config(config)),
            Box::new(DefaultQualityGate::from_config(config)),
            OutlierFilter::new(config.cleaning.outlier_std_devs),
        )
    }

    pub fn execute(&self) -> Result<CleanSummary> {
        let mut summary = CleanSummary::default();

        let table = {
            let _span = info_span!("clean_stage", stage = "read").entered();
            self.source.read_raw().context("Failed to read raw survey data")?
        };
        let parser = SurveyRowParser::for_table(&table, &self.columns)?;
        summary.input_rows = table.len();
        cleaner_metrics::rows_read(table.len());
        info!(rows = table.len(), "Loaded raw survey rows");

        let rows = {
            let _span = info_span!("clean_stage", stage = "dedupe").entered();
            let outcome = dedupe_rows(table.rows);
            summary.duplicates_removed = outcome.duplicates_removed;
            cleaner_metrics::duplicates_removed(outcome.duplicates_removed);
            info!(removed = outcome.duplicates_removed, "Removed duplicate rows");
            outcome.rows
        };

        let parsed = {
            let _span = info_span!("clean_stage", stage = "parse").entered();
            let mut parsed = Vec::with_capacity(rows.len());
            for row in &rows {
                match parser.parse(row) {
                    Ok(record) => parsed.push(record),
                    Err(issue) => {
                        debug!(%issue, "Dropping row");
                        summary.malformed_salary += 1;
                        cleaner_metrics::row_rejected("malformed_salary");
                    }
                }
            }
            info!(dropped = summary.malformed_salary, "Parsed salary amounts");
            parsed
        };

        let accepted = {
            let _span = info_span!("clean_stage", stage = "normalize").entered();
            let mut accepted = Vec::with_capacity(parsed.len());
            for record in parsed {
                let normalized = self.normalizer.normalize(record);
                if normalized.normalization.country_mapped {
                    cleaner_metrics::lookup_hit("countries");
                }
                if normalized.normalization.currency_mapped {
                    cleaner_metrics::lookup_hit("currencies");
                }

                let assessment = self.quality_gate.assess(&normalized);
                match assessment.decision {
                    QualityDecision::Accept => accepted.push(normalized.record),
                    QualityDecision::Quarantine => {
                        // A row counts once, under its most basic problem
                        let unknown_currency_only = assessment
                            .issues
                            .iter()
                            .all(|issue| issue.issue_type == QualityIssueType::UnknownCurrency);
                        if unknown_currency_only {
                            summary.unknown_currency += 1;
                            cleaner_metrics::row_rejected("unknown_currency");
                        } else {
                            summary.missing_required += 1;
                            cleaner_metrics::row_rejected("missing_required");
                        }
                        debug!(line = normalized.line, issues = ?assessment.issues, "Row quarantined");
                    }
                }
            }
            info!(
                kept = accepted.len(),
                missing_required = summary.missing_required,
                unknown_currency = summary.unknown_currency,
                "Normalized text fields"
            );
            accepted
        };

        let kept = {
            let _span = info_span!("clean_stage", stage = "outliers").entered();
            let outcome = self.outliers.apply(accepted);
            for partition in &outcome.partitions {
                if partition.removed > 0 {
                    cleaner_metrics::outliers_removed(&partition.currency, partition.removed);
                }
            }
            summary.outliers_removed = outcome.removed();
            info!(removed = summary.outliers_removed, "Removed salary outliers");
            summary.outliers = outcome.partitions;
            outcome.kept
        };

        {
            let _span = info_span!("clean_stage", stage = "write").entered();
            self.write_outputs(&kept, &mut summary)?;
        }
        summary.final_rows = kept.len();

        let summary_path = self.output.write_summary(&summary)?;
        info!(
            final_rows = summary.final_rows,
            summary = %summary_path.display(),
            "Cleaning complete"
        );
        Ok(summary)
    }

    fn write_outputs(&self, kept: &[SurveyRecord], summary: &mut CleanSummary) -> Result<()> {
        for (currency, records) in partition_by_currency(kept) {
            let dataset = DatasetId::for_currency(&currency);
            let path = self
                .output
                .write_dataset(&dataset, &records)
                .with_context(|| format!("Failed to write {} dataset", currency))?;
            cleaner_metrics::partition_written(&currency, records.len());
            info!(currency = %currency, rows = records.len(), path = %path.display(), "Wrote currency partition");
            summary.rows_per_currency.insert(currency, records.len());
            summary.files_written.push(path);
        }

        let path = self
            .output
            .write_dataset(&DatasetId::All, kept)
            .context("Failed to write combined dataset")?;
        info!(rows = kept.len(), path = %path.display(), "Wrote combined dataset");
        summary.files_written.push(path);
        Ok(())
    }
}

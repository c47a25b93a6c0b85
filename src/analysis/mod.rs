//! Descriptive analyses over cleaned survey data.
//!
//! Every analysis works on [`AnalysisRow`]s. For the combined `ALL` dataset
//! the rows are converted to USD first so that different currencies are
//! never aggregated together.

pub mod exchange;
pub mod report;

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, warn};

use crate::config::{AnalysisConfig, SurveyConfig};
use crate::constants::USD;
use crate::domain::{DatasetId, SurveyRecord};
use crate::error::{Result, SurveyError};
use crate::stats::{self, Statistics};

pub use exchange::ExchangeRates;
pub use report::{AnalysisKind, AnalysisReport, ChartSpec, GroupRow, ReportTable, StatColumn};

use report::{format_amount, format_count};

/// One respondent as seen by the analyses, amounts already in the report currency
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisRow<'a> {
    pub record: &'a SurveyRecord,
    pub salary: f64,
    pub bonus: f64,
}

/// Rows ready for aggregation plus how their amounts are expressed
#[derive(Debug, Clone)]
pub struct PreparedData<'a> {
    pub rows: Vec<AnalysisRow<'a>>,
    /// Currency every amount in `rows` is expressed in
    pub currency: String,
    /// Whether amounts were converted to USD
    pub converted: bool,
    /// Rows dropped because no exchange rate applied
    pub unconverted: usize,
}

/// Runs analyses with a static exchange table and configured thresholds.
pub struct SalaryAnalyzer {
    rates: ExchangeRates,
    settings: AnalysisConfig,
}

impl SalaryAnalyzer {
    pub fn new(rates: ExchangeRates, settings: AnalysisConfig) -> Self {
        Self { rates, settings }
    }

    pub fn from_config(config: &SurveyConfig) -> Self {
        Self::new(
            ExchangeRates::from_config(&config.exchange),
            config.analysis.clone(),
        )
    }

    pub fn rates(&self) -> &ExchangeRates {
        &self.rates
    }

    /// Run `kind` over `records`, which were loaded from `dataset`.
    ///
    /// For [`AnalysisKind::CrossCurrency`] `records` must hold every currency
    /// partition; the dataset is only used to file the report.
    pub fn run(
        &self,
        kind: AnalysisKind,
        dataset: &DatasetId,
        records: &[SurveyRecord],
    ) -> Result<AnalysisReport> {
        match kind {
            AnalysisKind::CrossCurrency => self.cross_currency_comparison(dataset, records),
            AnalysisKind::Benchmark => {
                Ok(self.salary_benchmarking(dataset, &self.non_empty(dataset, records)?))
            }
            AnalysisKind::AgeSalary => {
                Ok(self.age_salary_analysis(dataset, &self.non_empty(dataset, records)?))
            }
            AnalysisKind::Geography => {
                Ok(self.geographic_analysis(dataset, &self.non_empty(dataset, records)?))
            }
            AnalysisKind::Bonus => Ok(self.bonus_analysis(dataset, &self.non_empty(dataset, records)?)),
            AnalysisKind::Summary => {
                Ok(self.summary_statistics(dataset, &self.non_empty(dataset, records)?))
            }
        }
    }

    fn non_empty<'a>(&self, dataset: &DatasetId, records: &'a [SurveyRecord]) -> Result<PreparedData<'a>> {
        let data = self.prepare(dataset, records);
        if data.rows.is_empty() {
            return Err(SurveyError::EmptyDataset(dataset.label().to_string()));
        }
        Ok(data)
    }

    /// Convert to USD when the dataset mixes currencies, otherwise use amounts as-is
    pub fn prepare<'a>(&self, dataset: &DatasetId, records: &'a [SurveyRecord]) -> PreparedData<'a> {
        if !dataset.is_all() {
            let currency = records
                .first()
                .map(|r| r.currency.clone())
                .unwrap_or_else(|| dataset.label().to_string());
            let rows = records
                .iter()
                .map(|record| AnalysisRow {
                    record,
                    salary: record.salary,
                    bonus: record.bonus,
                })
                .collect();
            return PreparedData {
                rows,
                currency,
                converted: false,
                unconverted: 0,
            };
        }

        let (rows, unconverted) = self.convert_to_usd(records);
        PreparedData {
            rows,
            currency: USD.to_string(),
            converted: true,
            unconverted,
        }
    }

    fn convert_to_usd<'a>(&self, records: &'a [SurveyRecord]) -> (Vec<AnalysisRow<'a>>, usize) {
        let mut unconverted = 0;
        let rows: Vec<AnalysisRow<'a>> = records
            .iter()
            .filter_map(|record| match self.rates.to_usd(record) {
                Some((salary, bonus)) => Some(AnalysisRow { record, salary, bonus }),
                None => {
                    debug!(currency = %record.currency, country = %record.country, "No exchange rate for row");
                    unconverted += 1;
                    None
                }
            })
            .collect();

        if unconverted > 0 {
            warn!(unconverted, "Rows without an exchange rate were left out of the USD conversion");
            crate::observability::metrics::analyzer::rows_unconverted(unconverted);
        }
        (rows, unconverted)
    }

    pub fn salary_benchmarking(&self, dataset: &DatasetId, data: &PreparedData<'_>) -> AnalysisReport {
        let top_n = self.settings.benchmark_top_n;
        let mut groups = group_statistics(&data.rows, |row| row.record.job_title.as_str(), |row| row.salary);
        groups.retain(|g| g.stats.count >= self.settings.benchmark_min_count);
        sort_by_median_desc(&mut groups);
        groups.truncate(top_n);

        let chart = median_chart(
            format!("Median Salary by Job Title ({})", currency_caption(data)),
            "Job Title",
            &groups,
        );

        AnalysisReport {
            kind: AnalysisKind::Benchmark,
            dataset: dataset.clone(),
            preamble: with_currency_notes(format!("Top {} Jobs by Median Salary", top_n), data, "salary"),
            table: Some(ReportTable {
                key_header: "job title".to_string(),
                columns: vec![
                    StatColumn::Count,
                    StatColumn::Mean,
                    StatColumn::Median,
                    StatColumn::Min,
                    StatColumn::Max,
                    StatColumn::Std,
                ],
                rows: groups,
            }),
            lines: Vec::new(),
            chart,
        }
    }

    pub fn age_salary_analysis(&self, dataset: &DatasetId, data: &PreparedData<'_>) -> AnalysisReport {
        // group_statistics returns keys in sorted order already
        let groups = group_statistics(&data.rows, |row| row.record.age_range.as_str(), |row| row.salary);

        let chart = median_chart(
            format!("Median Salary by Age Group ({})", currency_caption(data)),
            "Age Group",
            &groups,
        );

        AnalysisReport {
            kind: AnalysisKind::AgeSalary,
            dataset: dataset.clone(),
            preamble: with_currency_notes("Salary Statistics by Age Group".to_string(), data, "salary"),
            table: Some(ReportTable {
                key_header: "age range".to_string(),
                columns: vec![StatColumn::Count, StatColumn::Median, StatColumn::Mean],
                rows: groups,
            }),
            lines: Vec::new(),
            chart,
        }
    }

    pub fn geographic_analysis(&self, dataset: &DatasetId, data: &PreparedData<'_>) -> AnalysisReport {
        let top_n = self.settings.geography_top_n;
        let mut groups = group_statistics(&data.rows, |row| row.record.country.as_str(), |row| row.salary);
        groups.retain(|g| g.stats.count >= self.settings.geography_min_count);
        sort_by_median_desc(&mut groups);
        groups.truncate(top_n);

        let chart = median_chart(
            format!("Median Salary by Country ({})", currency_caption(data)),
            "Country",
            &groups,
        );

        AnalysisReport {
            kind: AnalysisKind::Geography,
            dataset: dataset.clone(),
            preamble: with_currency_notes(format!("Top {} Countries by Median Salary", top_n), data, "salary"),
            table: Some(ReportTable {
                key_header: "country".to_string(),
                columns: vec![StatColumn::Count, StatColumn::Median, StatColumn::Mean],
                rows: groups,
            }),
            lines: Vec::new(),
            chart,
        }
    }

    /// Compare every currency partition in USD, grouped by original currency
    pub fn cross_currency_comparison(
        &self,
        dataset: &DatasetId,
        records: &[SurveyRecord],
    ) -> Result<AnalysisReport> {
        let (rows, unconverted) = self.convert_to_usd(records);
        if rows.is_empty() {
            return Err(SurveyError::EmptyDataset(dataset.label().to_string()));
        }

        let mut groups = group_statistics(&rows, |row| row.record.currency.as_str(), |row| row.salary);
        sort_by_median_desc(&mut groups);

        let mut preamble = vec![
            "Salary Statistics by Original Currency".to_string(),
            "Currency: USD (all values converted)".to_string(),
            "Note: All original currency salaries have been converted to USD using static exchange rates".to_string(),
        ];
        if unconverted > 0 {
            preamble.push(format!(
                "Note: {} rows without a known exchange rate were excluded",
                format_count(unconverted)
            ));
        }

        let chart = median_chart(
            "Median Salary by Original Currency (USD)".to_string(),
            "Currency",
            &groups,
        );

        Ok(AnalysisReport {
            kind: AnalysisKind::CrossCurrency,
            dataset: dataset.clone(),
            preamble,
            table: Some(ReportTable {
                key_header: "original currency".to_string(),
                columns: vec![StatColumn::Count, StatColumn::Median, StatColumn::Mean],
                rows: groups,
            }),
            lines: Vec::new(),
            chart,
        })
    }

    pub fn bonus_analysis(&self, dataset: &DatasetId, data: &PreparedData<'_>) -> AnalysisReport {
        let bonuses: Vec<f64> = data.rows.iter().map(|r| r.bonus).collect();
        let positive: Vec<f64> = bonuses.iter().copied().filter(|b| *b > 0.0).collect();
        let cur = &data.currency;

        let total = bonuses.len();
        let share = if total == 0 {
            0.0
        } else {
            positive.len() as f64 / total as f64 * 100.0
        };
        let amount = |value: Option<f64>| match value {
            Some(v) => format!("{} {}", format_amount(v), cur),
            None => "n/a".to_string(),
        };
        let max = bonuses.iter().copied().fold(None, |acc: Option<f64>, b| {
            Some(acc.map_or(b, |a| a.max(b)))
        });

        let lines = vec![
            format!("Total respondents: {}", format_count(total)),
            format!(
                "Respondents with bonus: {} ({:.1}%)",
                format_count(positive.len()),
                share
            ),
            format!("Median bonus (all): {}", amount(stats::median(&bonuses))),
            format!("Median bonus (if >0): {}", amount(stats::median(&positive))),
            format!("Mean bonus (all): {}", amount(stats::mean(&bonuses))),
            format!("Max bonus: {}", amount(max)),
        ];

        AnalysisReport {
            kind: AnalysisKind::Bonus,
            dataset: dataset.clone(),
            preamble: with_currency_notes("Bonus Statistics".to_string(), data, "bonus"),
            table: None,
            lines,
            chart: None,
        }
    }

    pub fn summary_statistics(&self, dataset: &DatasetId, data: &PreparedData<'_>) -> AnalysisReport {
        let salaries: Vec<f64> = data.rows.iter().map(|r| r.salary).collect();
        let cur = &data.currency;
        let amount = |value: Option<f64>| match value {
            Some(v) => format!("{} {}", format_amount(v), cur),
            None => "n/a".to_string(),
        };

        let unique_titles: HashSet<&str> = data.rows.iter().map(|r| r.record.job_title.as_str()).collect();
        let unique_countries: HashSet<&str> = data.rows.iter().map(|r| r.record.country.as_str()).collect();
        let top_earner = data
            .rows
            .iter()
            .max_by(|a, b| a.salary.partial_cmp(&b.salary).unwrap_or(Ordering::Equal));

        let mut lines = vec![
            format!("Total records: {}", format_count(data.rows.len())),
            format!("Unique job titles: {}", format_count(unique_titles.len())),
            format!("Unique countries: {}", format_count(unique_countries.len())),
            String::new(),
            format!("Salary Statistics (all amounts in {}):", cur),
            format!("  Minimum: {}", amount(salaries.iter().copied().reduce(f64::min))),
            format!("  25th percentile: {}", amount(stats::quantile(&salaries, 0.25))),
            format!("  Median: {}", amount(stats::median(&salaries))),
            format!("  Mean: {}", amount(stats::mean(&salaries))),
            format!("  75th percentile: {}", amount(stats::quantile(&salaries, 0.75))),
        ];
        if let Some(top) = top_earner {
            lines.push(format!(
                "  Maximum: {} ({} from {})",
                amount(Some(top.salary)),
                top.record.job_title,
                top.record.country
            ));
        }
        lines.push(format!(
            "  Standard deviation: {}",
            amount(stats::sample_std_dev(&salaries))
        ));

        let mut preamble = vec!["Dataset Overview".to_string(), format!("Currency: {}", currency_caption(data))];
        if data.unconverted > 0 {
            preamble.push(format!(
                "Note: {} rows without a known exchange rate were excluded",
                format_count(data.unconverted)
            ));
        }

        AnalysisReport {
            kind: AnalysisKind::Summary,
            dataset: dataset.clone(),
            preamble,
            table: None,
            lines,
            chart: None,
        }
    }
}

/// Group rows by a text key and compute statistics of one amount per group.
/// Groups come back sorted by key.
pub fn group_statistics<'r, 'a: 'r, K, V>(rows: &'r [AnalysisRow<'a>], key: K, value: V) -> Vec<GroupRow>
where
    K: Fn(&'r AnalysisRow<'a>) -> &'r str,
    V: Fn(&AnalysisRow<'a>) -> f64,
{
    let mut groups: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
    for row in rows {
        groups.entry(key(row)).or_default().push(value(row));
    }
    groups
        .into_iter()
        .filter_map(|(key, values)| {
            Statistics::compute(&values).map(|stats| GroupRow {
                key: key.to_string(),
                stats,
            })
        })
        .collect()
}

fn sort_by_median_desc(groups: &mut [GroupRow]) {
    groups.sort_by(|a, b| {
        b.stats
            .median
            .partial_cmp(&a.stats.median)
            .unwrap_or(Ordering::Equal)
    });
}

fn currency_caption(data: &PreparedData<'_>) -> String {
    if data.converted {
        format!("{} - Converted", data.currency)
    } else {
        data.currency.clone()
    }
}

fn with_currency_notes(heading: String, data: &PreparedData<'_>, amount_name: &str) -> Vec<String> {
    let mut lines = vec![heading];
    if data.converted {
        lines.push(format!("Currency: {} (converted from multiple currencies)", data.currency));
        lines.push(format!(
            "Note: All {} amounts have been converted to {} for fair comparison",
            amount_name, data.currency
        ));
        if data.unconverted > 0 {
            lines.push(format!(
                "Note: {} rows without a known exchange rate were excluded",
                format_count(data.unconverted)
            ));
        }
    } else {
        lines.push(format!("Currency: {}", data.currency));
        lines.push(format!(
            "Note: All {} amounts shown are in {}",
            amount_name, data.currency
        ));
    }
    lines
}

fn median_chart(title: String, x_label: &str, groups: &[GroupRow]) -> Option<ChartSpec> {
    if groups.is_empty() {
        return None;
    }
    Some(ChartSpec {
        title,
        x_label: x_label.to_string(),
        y_label: "Median Salary".to_string(),
        bars: groups
            .iter()
            .map(|g| (g.key.clone(), g.stats.median))
            .collect(),
    })
}

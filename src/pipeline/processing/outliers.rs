use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, info};

use crate::domain::SurveyRecord;
use crate::stats;

/// Salary bounds and removal count for one currency partition
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PartitionOutlierReport {
    pub currency: String,
    pub rows_in: usize,
    pub removed: usize,
    pub mean: f64,
    /// `None` when the partition is too small for a standard deviation
    pub std_dev: Option<f64>,
    pub lower_bound: Option<f64>,
    pub upper_bound: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct OutlierOutcome {
    /// Surviving records in their original order
    pub kept: Vec<SurveyRecord>,
    /// One entry per currency, sorted by currency
    pub partitions: Vec<PartitionOutlierReport>,
}

impl OutlierOutcome {
    pub fn removed(&self) -> usize {
        self.partitions.iter().map(|p| p.removed).sum()
    }
}

/// Drops salaries more than `std_devs` sample standard deviations from the mean
/// of their own currency partition. Currencies have different scales, so the
/// statistics are never pooled across partitions.
///
/// Passes repeat until one removes nothing, so every kept salary lies within
/// the bounds of the partition it ends up in and re-filtering the output is a
/// no-op.
#[derive(Debug, Clone, Copy)]
pub struct OutlierFilter {
    std_devs: f64,
}

impl OutlierFilter {
    pub fn new(std_devs: f64) -> Self {
        Self { std_devs }
    }

    pub fn apply(&self, records: Vec<SurveyRecord>) -> OutlierOutcome {
        let mut members: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
        for (index, record) in records.iter().enumerate() {
            members.entry(record.currency.as_str()).or_default().push(index);
        }

        let mut keep = vec![true; records.len()];
        let mut partitions = Vec::with_capacity(members.len());
        for (currency, indices) in &members {
            let rows_in = indices.len();
            let mut remaining = indices.clone();
            let mut passes = 0;

            let (mean, std_dev, range) = loop {
                passes += 1;
                let values: Vec<f64> = remaining.iter().map(|&i| records[i].salary).collect();
                let mean = stats::mean(&values).unwrap_or(0.0);
                let std_dev = stats::sample_std_dev(&values);
                let range = std_dev
                    .filter(|sd| *sd > 0.0)
                    .map(|sd| (mean - self.std_devs * sd, mean + self.std_devs * sd));

                let Some((lower, upper)) = range else {
                    break (mean, std_dev, range);
                };
                let before = remaining.len();
                remaining.retain(|&i| {
                    let salary = records[i].salary;
                    salary >= lower && salary <= upper
                });
                if remaining.len() == before {
                    break (mean, std_dev, range);
                }
            };

            let removed = rows_in - remaining.len();
            for &index in indices {
                keep[index] = false;
            }
            for &index in &remaining {
                keep[index] = true;
            }

            match range {
                Some((lower, upper)) => info!(
                    currency = %currency,
                    removed,
                    passes,
                    "Salary range kept: {:.2} to {:.2}",
                    lower.max(0.0),
                    upper
                ),
                None => debug!(
                    currency = %currency,
                    rows = remaining.len(),
                    removed,
                    "Partition too small or uniform for outlier removal"
                ),
            }

            partitions.push(PartitionOutlierReport {
                currency: currency.to_string(),
                rows_in,
                removed,
                mean,
                std_dev,
                lower_bound: range.map(|(lower, _)| lower),
                upper_bound: range.map(|(_, upper)| upper),
            });
        }

        let kept = records
            .into_iter()
            .zip(keep)
            .filter_map(|(record, keep)| keep.then_some(record))
            .collect();

        OutlierOutcome { kept, partitions }
    }
}

/// Group records by currency code, keeping each group's original order
pub fn partition_by_currency(records: &[SurveyRecord]) -> BTreeMap<String, Vec<SurveyRecord>> {
    let mut partitions: BTreeMap<String, Vec<SurveyRecord>> = BTreeMap::new();
    for record in records {
        partitions
            .entry(record.currency.clone())
            .or_default()
            .push(record.clone());
    }
    partitions
}

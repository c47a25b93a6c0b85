//! Descriptive statistics shared by the outlier filter and the analyzer.
//!
//! Standard deviation is the sample (n - 1) deviation and quantiles use linear
//! interpolation between closest ranks, so results line up with the usual
//! spreadsheet / dataframe conventions.

use std::cmp::Ordering;

/// Statistics computed from a set of numeric values
#[derive(Debug, Clone, PartialEq)]
pub struct Statistics {
    pub count: usize,
    pub sum: f64,
    pub mean: f64,
    pub median: f64,
    pub min: f64,
    pub max: f64,
    /// `None` when fewer than two values are available
    pub std_dev: Option<f64>,
}

impl Statistics {
    /// Compute statistics for a slice of values; `None` when empty
    pub fn compute(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }

        let sorted = sorted_copy(values);
        let count = values.len();
        let sum: f64 = values.iter().sum();
        let mean = sum / count as f64;

        Some(Statistics {
            count,
            sum,
            mean,
            median: quantile_sorted(&sorted, 0.5)?,
            min: sorted[0],
            max: sorted[count - 1],
            std_dev: sample_std_dev(values),
        })
    }
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation (n - 1 denominator)
pub fn sample_std_dev(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let mean = mean(values)?;
    let sum_sq: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
    Some((sum_sq / (values.len() - 1) as f64).sqrt())
}

pub fn median(values: &[f64]) -> Option<f64> {
    quantile(values, 0.5)
}

/// Quantile `q` in `[0, 1]` with linear interpolation
pub fn quantile(values: &[f64], q: f64) -> Option<f64> {
    quantile_sorted(&sorted_copy(values), q)
}

fn quantile_sorted(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() || !(0.0..=1.0).contains(&q) {
        return None;
    }
    let position = q * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let fraction = position - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * fraction)
}

fn sorted_copy(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_statistics_compute() {
        let stats = Statistics::compute(&[10.0, 20.0, 30.0, 40.0, 50.0]).unwrap();

        assert_eq!(stats.count, 5);
        assert_eq!(stats.sum, 150.0);
        assert_eq!(stats.mean, 30.0);
        assert_eq!(stats.median, 30.0);
        assert_eq!(stats.min, 10.0);
        assert_eq!(stats.max, 50.0);
        let std_dev = stats.std_dev.unwrap();
        assert!((std_dev - 15.811388).abs() < 1e-5);
    }

    #[test]
    fn test_statistics_empty() {
        assert!(Statistics::compute(&[]).is_none());
    }

    #[test]
    fn test_single_value_has_no_std_dev() {
        let stats = Statistics::compute(&[42.0]).unwrap();
        assert_eq!(stats.median, 42.0);
        assert!(stats.std_dev.is_none());
    }

    #[test]
    fn test_median_even_count_interpolates() {
        assert_eq!(median(&[4.0, 1.0, 3.0, 2.0]), Some(2.5));
    }

    #[test]
    fn test_quantiles() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0];
        assert_eq!(quantile(&values, 0.25), Some(3.0));
        assert_eq!(quantile(&values, 0.75), Some(7.0));
        assert_eq!(quantile(&[1.0, 2.0], 0.25), Some(1.25));
        assert_eq!(quantile(&values, 1.5), None);
    }
}

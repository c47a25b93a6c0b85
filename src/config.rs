use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Result, SurveyError};

/// Configuration shipped with the binary; `--config` files are layered on top.
const BUILTIN_CONFIG: &str = include_str!("../config/survey.toml");

#[derive(Debug, Clone, Deserialize)]
pub struct SurveyConfig {
    pub columns: ColumnMap,
    pub cleaning: CleaningConfig,
    pub lookups: LookupConfig,
    pub exchange: ExchangeConfig,
    pub analysis: AnalysisConfig,
    pub chart: ChartConfig,
}

/// CSV header used for each survey field, matched case-insensitively.
#[derive(Debug, Clone, Deserialize)]
pub struct ColumnMap {
    pub job_title: String,
    pub salary: String,
    pub bonus: String,
    pub currency: String,
    pub other_currency: String,
    pub country: String,
    pub age_range: String,
    pub experience: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CleaningConfig {
    /// Rows further than this many standard deviations from their partition mean are dropped
    pub outlier_std_devs: f64,
    pub known_currencies: Vec<String>,
}

/// Raw variant -> canonical value tables
#[derive(Debug, Clone, Deserialize)]
pub struct LookupConfig {
    pub countries: BTreeMap<String, String>,
    pub currencies: BTreeMap<String, String>,
    pub other_currencies: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExchangeConfig {
    /// USD value of one unit of each currency code
    pub rates: BTreeMap<String, f64>,
    /// Fallback rates for OTHER-currency rows, keyed by canonical country name
    pub country_rates: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnalysisConfig {
    pub benchmark_min_count: usize,
    pub benchmark_top_n: usize,
    pub geography_min_count: usize,
    pub geography_top_n: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChartConfig {
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub font_path: Option<PathBuf>,
}

impl SurveyConfig {
    /// The configuration embedded from `config/survey.toml`.
    pub fn builtin() -> Result<Self> {
        Self::from_table(builtin_table()?)
    }

    /// Load the built-in configuration, layering `path` on top when given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            None => Self::builtin(),
            Some(path) => {
                let content = fs::read_to_string(path).map_err(|e| {
                    SurveyError::Config(format!(
                        "Failed to read config file '{}': {}",
                        path.display(),
                        e
                    ))
                })?;
                Self::from_toml_str(&content)
            }
        }
    }

    /// Parse a TOML override; its values replace or extend the built-in ones.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let overrides: toml::Table = toml::from_str(content)?;
        let mut table = builtin_table()?;
        merge_tables(&mut table, overrides);
        Self::from_table(table)
    }

    fn from_table(table: toml::Table) -> Result<Self> {
        let config: SurveyConfig = toml::Value::Table(table).try_into()?;
        config.validate()?;
        Ok(config)
    }

    /// Check the cross-field invariants the cleaner and analyzer rely on.
    pub fn validate(&self) -> Result<()> {
        if !(self.cleaning.outlier_std_devs.is_finite() && self.cleaning.outlier_std_devs > 0.0) {
            return Err(SurveyError::Config(format!(
                "cleaning.outlier_std_devs must be a positive number, got {}",
                self.cleaning.outlier_std_devs
            )));
        }

        if self.cleaning.known_currencies.is_empty() {
            return Err(SurveyError::Config(
                "cleaning.known_currencies must not be empty".to_string(),
            ));
        }

        for (variant, canonical) in &self.lookups.currencies {
            if !self.is_known_currency(canonical) {
                return Err(SurveyError::Config(format!(
                    "lookups.currencies maps '{}' to '{}', which is not a known currency",
                    variant, canonical
                )));
            }
        }

        let all_rates = self
            .exchange
            .rates
            .iter()
            .chain(self.exchange.country_rates.iter());
        for (key, rate) in all_rates {
            if !(rate.is_finite() && *rate > 0.0) {
                return Err(SurveyError::Config(format!(
                    "exchange rate for '{}' must be a positive number, got {}",
                    key, rate
                )));
            }
        }

        if self.chart.width == 0 || self.chart.height == 0 {
            return Err(SurveyError::Config("chart dimensions must be non-zero".to_string()));
        }

        Ok(())
    }

    pub fn is_known_currency(&self, code: &str) -> bool {
        self.cleaning.known_currencies.iter().any(|c| c == code)
    }
}

fn builtin_table() -> Result<toml::Table> {
    Ok(toml::from_str(BUILTIN_CONFIG)?)
}

/// Recursively merge `overrides` into `base`: nested tables merge, everything else replaces.
fn merge_tables(base: &mut toml::Table, overrides: toml::Table) {
    for (key, value) in overrides {
        match (base.get_mut(&key), value) {
            (Some(toml::Value::Table(existing)), toml::Value::Table(incoming)) => {
                merge_tables(existing, incoming);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}

pub mod lookup;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::config::SurveyConfig;
use crate::domain::SurveyRecord;
use crate::pipeline::processing::parser::ParsedRecord;

pub use lookup::LookupTable;

static WHITESPACE_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("whitespace pattern is valid"));

/// A record whose free-text fields have been mapped onto canonical values
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedRecord {
    pub line: usize,
    pub record: SurveyRecord,
    pub normalization: NormalizationMetadata,
}

/// What the normalizer did to a record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NormalizationMetadata {
    /// Country came from the lookup table rather than title-casing
    pub country_mapped: bool,
    /// Currency came from the lookup table rather than being upper-cased as-is
    pub currency_mapped: bool,
    pub warnings: Vec<String>,
}

/// Trait for normalizing parsed survey records
pub trait Normalizer {
    fn normalize(&self, parsed: ParsedRecord) -> NormalizedRecord;
}

/// Lookup-table driven normalizer.
///
/// Unmapped countries pass through title-cased and unmapped "other currency"
/// answers pass through upper-cased. Unmapped currency codes are kept
/// upper-cased here; the quality gate rejects the ones outside the known set.
pub struct LookupNormalizer {
    countries: LookupTable,
    currencies: LookupTable,
    other_currencies: LookupTable,
}

impl LookupNormalizer {
    pub fn new(countries: LookupTable, currencies: LookupTable, other_currencies: LookupTable) -> Self {
        Self {
            countries,
            currencies,
            other_currencies,
        }
    }

    pub fn from_config(config: &SurveyConfig) -> Self {
        Self::new(
            LookupTable::from_map(&config.lookups.countries),
            LookupTable::from_map(&config.lookups.currencies),
            LookupTable::from_map(&config.lookups.other_currencies),
        )
    }

    /// Returns the canonical country and whether the table supplied it
    pub fn normalize_country(&self, raw: &str) -> (String, bool) {
        let collapsed = collapse_whitespace(raw);
        if collapsed.is_empty() {
            return (collapsed, false);
        }
        match self.countries.lookup(&collapsed) {
            Some(canonical) => (canonical.to_string(), true),
            None => (title_case(&collapsed), false),
        }
    }

    /// Returns the canonical currency code and whether the table supplied it
    pub fn normalize_currency(&self, raw: &str) -> (String, bool) {
        let code = raw.trim().to_uppercase();
        match self.currencies.lookup(&code) {
            Some(canonical) => (canonical.to_string(), true),
            None => (code, false),
        }
    }

    /// An empty canonical value marks an answer that is not a currency at all
    pub fn normalize_other_currency(&self, raw: &str) -> Option<String> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        match self.other_currencies.lookup(trimmed) {
            Some("") => None,
            Some(canonical) => Some(canonical.to_string()),
            None => Some(trimmed.to_uppercase()),
        }
    }
}

impl Normalizer for LookupNormalizer {
    fn normalize(&self, parsed: ParsedRecord) -> NormalizedRecord {
        let ParsedRecord { line, record } = parsed;
        let mut normalization = NormalizationMetadata::default();

        let (country, country_mapped) = self.normalize_country(&record.country);
        let (currency, currency_mapped) = self.normalize_currency(&record.currency);
        normalization.country_mapped = country_mapped;
        normalization.currency_mapped = currency_mapped;

        let other_currency = record
            .other_currency
            .as_deref()
            .and_then(|raw| self.normalize_other_currency(raw));
        if record.other_currency.is_some() && other_currency.is_none() {
            normalization
                .warnings
                .push("other_currency answer is not a currency".to_string());
        }

        NormalizedRecord {
            line,
            record: SurveyRecord {
                job_title: collapse_whitespace(&record.job_title),
                country,
                currency,
                other_currency,
                age_range: record.age_range.trim().to_string(),
                experience: record.experience.map(|e| e.trim().to_string()),
                ..record
            },
            normalization,
        }
    }
}

/// Trim and replace every internal whitespace run with a single space
pub fn collapse_whitespace(text: &str) -> String {
    WHITESPACE_RUN.replace_all(text.trim(), " ").into_owned()
}

/// Upper-case the first letter of every alphabetic run and lower-case the rest
/// (`"new  zealand"` -> `"New  Zealand"`, `"CÔTE D'IVOIRE"` -> `"Côte D'Ivoire"`).
pub fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut previous_is_letter = false;
    for c in text.chars() {
        if c.is_alphabetic() {
            if previous_is_letter {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            previous_is_letter = true;
        } else {
            out.push(c);
            previous_is_letter = false;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalizer() -> LookupNormalizer {
        LookupNormalizer::from_config(&SurveyConfig::builtin().unwrap())
    }

    fn parsed(country: &str, currency: &str, other: Option<&str>) -> ParsedRecord {
        ParsedRecord {
            line: 1,
            record: SurveyRecord {
                job_title: "  Senior   Analyst ".to_string(),
                salary: 80000.0,
                bonus: 0.0,
                currency: currency.to_string(),
                other_currency: other.map(str::to_string),
                country: country.to_string(),
                age_range: " 25-34 ".to_string(),
                experience: None,
            },
        }
    }

    #[test]
    fn test_country_typos_map_to_united_states() {
        let n = normalizer();
        assert_eq!(n.normalize_country("Unitedd States").0, "United States");
        assert_eq!(n.normalize_country("United states").0, "United States");
        assert_eq!(n.normalize_country("  USA ").0, "United States");
        assert_eq!(n.normalize_country("united   states").0, "United States");
    }

    #[test]
    fn test_unmapped_country_is_title_cased() {
        let n = normalizer();
        assert_eq!(n.normalize_country("new zealand"), ("New Zealand".to_string(), false));
        assert_eq!(n.normalize_country("CANADA"), ("Canada".to_string(), false));
    }

    #[test]
    fn test_currency_normalization() {
        let n = normalizer();
        assert_eq!(n.normalize_currency(" usd "), ("USD".to_string(), false));
        assert_eq!(n.normalize_currency("US Dollar"), ("USD".to_string(), true));
        assert_eq!(n.normalize_currency("Pounds"), ("GBP".to_string(), true));
        assert_eq!(n.normalize_currency("aud/nzd"), ("AUD/NZD".to_string(), false));
    }

    #[test]
    fn test_other_currency_normalization() {
        let n = normalizer();
        assert_eq!(n.normalize_other_currency("Indian Rupees"), Some("INR".to_string()));
        assert_eq!(n.normalize_other_currency("Polish złoty"), Some("PLN".to_string()));
        assert_eq!(n.normalize_other_currency("myr"), Some("MYR".to_string()));
        assert_eq!(n.normalize_other_currency("Equity"), None);
        assert_eq!(n.normalize_other_currency("   "), None);
    }

    #[test]
    fn test_normalize_record() {
        let normalized = normalizer().normalize(parsed("u.s.", "Dollars", Some("equity")));

        assert_eq!(normalized.record.country, "United States");
        assert_eq!(normalized.record.currency, "USD");
        assert_eq!(normalized.record.job_title, "Senior Analyst");
        assert_eq!(normalized.record.age_range, "25-34");
        assert_eq!(normalized.record.other_currency, None);
        assert!(normalized.normalization.country_mapped);
        assert!(normalized.normalization.currency_mapped);
        assert_eq!(normalized.normalization.warnings.len(), 1);
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("CÔTE D'IVOIRE"), "Côte D'Ivoire");
        assert_eq!(title_case("trinidad and tobago"), "Trinidad And Tobago");
    }
}

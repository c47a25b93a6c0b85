use std::collections::HashMap;

use crate::config::ExchangeConfig;
use crate::constants::OTHER_CURRENCY;
use crate::domain::SurveyRecord;

/// Static currency -> USD conversion table, loaded once from configuration.
#[derive(Debug, Clone, Default)]
pub struct ExchangeRates {
    rates: HashMap<String, f64>,
    country_rates: HashMap<String, f64>,
}

impl ExchangeRates {
    pub fn from_config(config: &ExchangeConfig) -> Self {
        Self {
            rates: config
                .rates
                .iter()
                .map(|(code, rate)| (code.to_uppercase(), *rate))
                .collect(),
            country_rates: config
                .country_rates
                .iter()
                .map(|(country, rate)| (country.clone(), *rate))
                .collect(),
        }
    }

    /// USD value of one unit of `code`
    pub fn rate(&self, code: &str) -> Option<f64> {
        self.rates.get(&code.to_uppercase()).copied()
    }

    /// Rate for a record. `OTHER` rows use their stated currency when it is in
    /// the table, then fall back to the rate of the country they work in.
    pub fn rate_for(&self, record: &SurveyRecord) -> Option<f64> {
        if record.currency == OTHER_CURRENCY {
            record
                .other_currency
                .as_deref()
                .and_then(|code| self.rate(code))
                .or_else(|| self.country_rates.get(&record.country).copied())
        } else {
            self.rate(&record.currency)
        }
    }

    /// Salary and bonus of a record in USD
    pub fn to_usd(&self, record: &SurveyRecord) -> Option<(f64, f64)> {
        self.rate_for(record)
            .map(|rate| (record.salary * rate, record.bonus * rate))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SurveyConfig;

    fn rates() -> ExchangeRates {
        ExchangeRates::from_config(&SurveyConfig::builtin().unwrap().exchange)
    }

    fn record(currency: &str, other: Option<&str>, country: &str) -> SurveyRecord {
        SurveyRecord {
            job_title: "Teacher".to_string(),
            salary: 50000.0,
            bonus: 1000.0,
            currency: currency.to_string(),
            other_currency: other.map(str::to_string),
            country: country.to_string(),
            age_range: "25-34".to_string(),
            experience: None,
        }
    }

    #[test]
    fn test_eur_converts_with_static_rate() {
        let (salary, bonus) = rates().to_usd(&record("EUR", None, "Germany")).unwrap();
        assert!((salary - 58200.0).abs() < 1e-6);
        assert!((bonus - 1164.0).abs() < 1e-6);
    }

    #[test]
    fn test_other_currency_prefers_stated_code() {
        let rate = rates().rate_for(&record("OTHER", Some("PLN"), "Germany")).unwrap();
        assert_eq!(rate, 0.250);
    }

    #[test]
    fn test_other_currency_falls_back_to_country() {
        let rate = rates().rate_for(&record("OTHER", Some("XYZ"), "India")).unwrap();
        assert_eq!(rate, 0.0111);
    }

    #[test]
    fn test_unresolvable_rate() {
        assert!(rates().rate_for(&record("OTHER", None, "Atlantis")).is_none());
        assert!(rates().rate_for(&record("DOGE", None, "United States")).is_none());
    }

    #[test]
    fn test_aud_nzd_rate() {
        assert_eq!(rates().rate("AUD/NZD"), Some(0.668));
    }
}

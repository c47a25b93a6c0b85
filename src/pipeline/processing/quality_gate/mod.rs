use serde::{Deserialize, Serialize};

use crate::config::SurveyConfig;
use crate::pipeline::processing::normalize::NormalizedRecord;

/// Quality assessment result for one normalized record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityAssessment {
    pub decision: QualityDecision,
    /// Every problem found; empty when accepted
    pub issues: Vec<QualityIssue>,
}

/// Quality Gate decision for a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QualityDecision {
    /// Record proceeds to outlier filtering and output
    Accept,
    /// Record is dropped from the cleaned dataset
    Quarantine,
}

/// Individual quality issue found during assessment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityIssue {
    pub issue_type: QualityIssueType,
    /// Field that triggered this issue
    pub field: String,
    pub description: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QualityIssueType {
    /// A required field is blank
    MissingData,
    /// Salary is zero or negative
    OutOfRange,
    /// Currency code is not in the known set after normalization
    UnknownCurrency,
}

/// Trait for implementing Quality Gate assessment logic
pub trait QualityGate {
    fn assess(&self, record: &NormalizedRecord) -> QualityAssessment;
}

/// Rejects records with blank required fields, non-positive salary, or a
/// currency outside the configured known set.
pub struct DefaultQualityGate {
    known_currencies: Vec<String>,
}

impl DefaultQualityGate {
    pub fn new(known_currencies: Vec<String>) -> Self {
        Self { known_currencies }
    }

    pub fn from_config(config: &SurveyConfig) -> Self {
        Self::new(config.cleaning.known_currencies.clone())
    }
}

impl QualityGate for DefaultQualityGate {
    fn assess(&self, normalized: &NormalizedRecord) -> QualityAssessment {
        let record = &normalized.record;
        let mut issues = Vec::new();

        let required = [
            ("age_range", &record.age_range),
            ("job_title", &record.job_title),
            ("currency", &record.currency),
            ("country", &record.country),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                issues.push(QualityIssue {
                    issue_type: QualityIssueType::MissingData,
                    field: field.to_string(),
                    description: format!("{} is blank", field),
                });
            }
        }

        if record.salary <= 0.0 {
            issues.push(QualityIssue {
                issue_type: QualityIssueType::OutOfRange,
                field: "salary".to_string(),
                description: format!("salary {} is not positive", record.salary),
            });
        }

        if !record.currency.is_empty() && !self.known_currencies.contains(&record.currency) {
            issues.push(QualityIssue {
                issue_type: QualityIssueType::UnknownCurrency,
                field: "currency".to_string(),
                description: format!("currency '{}' is not a known code", record.currency),
            });
        }

        let decision = if issues.is_empty() {
            QualityDecision::Accept
        } else {
            QualityDecision::Quarantine
        };

        QualityAssessment { decision, issues }
    }
}

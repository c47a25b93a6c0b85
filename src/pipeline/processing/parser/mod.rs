use std::fmt;
use tracing::debug;

use crate::config::ColumnMap;
use crate::domain::{RawRow, RawTable, SurveyRecord};
use crate::error::{Result, SurveyError};

/// A survey record lifted out of a raw CSV row, text still un-normalized.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedRecord {
    pub line: usize,
    pub record: SurveyRecord,
}

/// Why a raw row could not become a record
#[derive(Debug, Clone, PartialEq)]
pub enum ParseIssue {
    MalformedSalary { line: usize, value: String },
}

impl fmt::Display for ParseIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseIssue::MalformedSalary { line, value } => {
                write!(f, "line {}: salary '{}' is not numeric", line, value)
            }
        }
    }
}

/// Positions of the survey fields within a CSV header row
#[derive(Debug, Clone, Copy)]
struct ColumnIndices {
    job_title: usize,
    salary: usize,
    currency: usize,
    country: usize,
    age_range: usize,
    bonus: Option<usize>,
    other_currency: Option<usize>,
    experience: Option<usize>,
}

/// Maps raw CSV rows onto [`SurveyRecord`]s using the configured column names.
pub struct SurveyRowParser {
    indices: ColumnIndices,
}

impl SurveyRowParser {
    /// Resolve the configured columns against a table's headers. Job title, salary,
    /// currency, country and age are required; the rest are optional.
    pub fn for_table(table: &RawTable, columns: &ColumnMap) -> Result<Self> {
        let required = |name: &str| {
            table
                .column_index(name)
                .ok_or_else(|| SurveyError::MissingColumn(name.to_string()))
        };

        let indices = ColumnIndices {
            job_title: required(&columns.job_title)?,
            salary: required(&columns.salary)?,
            currency: required(&columns.currency)?,
            country: required(&columns.country)?,
            age_range: required(&columns.age_range)?,
            bonus: table.column_index(&columns.bonus),
            other_currency: table.column_index(&columns.other_currency),
            experience: table.column_index(&columns.experience),
        };
        debug!(?indices, "Resolved survey columns");

        Ok(Self { indices })
    }

    pub fn parse(&self, row: &RawRow) -> std::result::Result<ParsedRecord, ParseIssue> {
        let field = |idx: usize| row.fields.get(idx).map(|s| s.trim()).unwrap_or("");
        let optional = |idx: Option<usize>| {
            idx.map(field)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };

        let salary_text = field(self.indices.salary);
        let salary = parse_amount(salary_text).ok_or_else(|| ParseIssue::MalformedSalary {
            line: row.line,
            value: salary_text.to_string(),
        })?;

        // Missing or non-numeric bonus means no additional compensation
        let bonus = self
            .indices
            .bonus
            .map(field)
            .and_then(parse_amount)
            .unwrap_or(0.0);

        Ok(ParsedRecord {
            line: row.line,
            record: SurveyRecord {
                job_title: field(self.indices.job_title).to_string(),
                salary,
                bonus,
                currency: field(self.indices.currency).to_string(),
                other_currency: optional(self.indices.other_currency),
                country: field(self.indices.country).to_string(),
                age_range: field(self.indices.age_range).to_string(),
                experience: optional(self.indices.experience),
            },
        })
    }
}

/// Parse a money amount written with optional thousands separators (`"1,250,000"`).
pub fn parse_amount(text: &str) -> Option<f64> {
    let cleaned: String = text.trim().chars().filter(|c| *c != ',').collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SurveyConfig;

    fn table() -> RawTable {
        RawTable {
            headers: vec![
                "Job title".to_string(),
                "salary".to_string(),
                "bonus".to_string(),
                "currency".to_string(),
                "country".to_string(),
                "age".to_string(),
            ],
            rows: Vec::new(),
        }
    }

    fn columns() -> ColumnMap {
        let mut columns = SurveyConfig::builtin().unwrap().columns;
        columns.salary = "salary".to_string();
        columns.bonus = "bonus".to_string();
        columns.currency = "currency".to_string();
        columns.country = "country".to_string();
        columns.age_range = "age".to_string();
        columns
    }

    fn raw(fields: &[&str]) -> RawRow {
        RawRow {
            line: 7,
            fields: fields.iter().map(|f| f.to_string()).collect(),
        }
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("55,000"), Some(55000.0));
        assert_eq!(parse_amount(" 1,250,000.50 "), Some(1250000.5));
        assert_eq!(parse_amount(""), None);
        assert_eq!(parse_amount("about 60k"), None);
        assert_eq!(parse_amount("inf"), None);
    }

    #[test]
    fn test_parse_row() {
        let parser = SurveyRowParser::for_table(&table(), &columns()).unwrap();
        let parsed = parser
            .parse(&raw(&["Engineer ", "72,000", "", "USD", "US", "25-34"]))
            .unwrap();

        assert_eq!(parsed.line, 7);
        assert_eq!(parsed.record.job_title, "Engineer");
        assert_eq!(parsed.record.salary, 72000.0);
        assert_eq!(parsed.record.bonus, 0.0);
        assert_eq!(parsed.record.country, "US");
        assert_eq!(parsed.record.other_currency, None);
        assert_eq!(parsed.record.experience, None);
    }

    #[test]
    fn test_malformed_salary_rejected() {
        let parser = SurveyRowParser::for_table(&table(), &columns()).unwrap();
        let issue = parser
            .parse(&raw(&["Engineer", "a lot", "", "USD", "US", "25-34"]))
            .unwrap_err();
        assert_eq!(
            issue,
            ParseIssue::MalformedSalary {
                line: 7,
                value: "a lot".to_string()
            }
        );
    }

    #[test]
    fn test_missing_required_column() {
        let mut columns = columns();
        columns.country = "what country do you work in?".to_string();
        let err = SurveyRowParser::for_table(&table(), &columns).err().unwrap();
        assert!(matches!(err, SurveyError::MissingColumn(name) if name == "what country do you work in?"));
    }
}

// Data cleaning pipeline: raw survey rows in, normalized currency partitions out

pub mod processing;

pub use processing::dedupe::dedupe_rows;
pub use processing::normalize::{LookupNormalizer, Normalizer};
pub use processing::outliers::{partition_by_currency, OutlierFilter};
pub use processing::parser::SurveyRowParser;
pub use processing::quality_gate::{DefaultQualityGate, QualityGate};

// Filesystem adapters for the application ports

pub mod chart;
pub mod csv_store;
pub mod report_writer;

pub use chart::BarChartRenderer;
pub use csv_store::{CsvDatasetStore, CsvSurveySource};
pub use report_writer::FileReportSink;

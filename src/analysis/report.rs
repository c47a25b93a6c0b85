use serde::Serialize;
use std::fmt::Write as _;

use crate::domain::DatasetId;
use crate::stats::Statistics;

/// The analyses offered by the analyzer menu
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum AnalysisKind {
    /// Salary statistics by job title
    Benchmark,
    /// Salary statistics by age range
    AgeSalary,
    /// Salary statistics by country
    Geography,
    /// Every currency converted to USD and compared
    CrossCurrency,
    /// Bonus and additional compensation
    Bonus,
    /// Overall descriptive statistics
    Summary,
}

impl AnalysisKind {
    pub const ALL: [AnalysisKind; 6] = [
        AnalysisKind::Benchmark,
        AnalysisKind::AgeSalary,
        AnalysisKind::Geography,
        AnalysisKind::CrossCurrency,
        AnalysisKind::Bonus,
        AnalysisKind::Summary,
    ];

    /// Title used in report banners and saved file names
    pub fn title(&self) -> &'static str {
        match self {
            AnalysisKind::Benchmark => "Salary Benchmarking",
            AnalysisKind::AgeSalary => "Age vs Salary",
            AnalysisKind::Geography => "Geographic Analysis",
            AnalysisKind::CrossCurrency => "Cross-Currency Comparison",
            AnalysisKind::Bonus => "Bonus Analysis",
            AnalysisKind::Summary => "Summary Statistics",
        }
    }

    pub fn menu_label(&self) -> &'static str {
        match self {
            AnalysisKind::Benchmark => "Salary Benchmarking by Job Title",
            AnalysisKind::AgeSalary => "Age vs Salary Analysis",
            AnalysisKind::Geography => "Geographic Salary Analysis",
            AnalysisKind::CrossCurrency => "Cross-Currency Comparison",
            AnalysisKind::Bonus => "Bonus & Additional Compensation Analysis",
            AnalysisKind::Summary => "Summary Statistics",
        }
    }

    /// Short identifier for metrics labels and chart file names
    pub fn key(&self) -> &'static str {
        match self {
            AnalysisKind::Benchmark => "benchmark",
            AnalysisKind::AgeSalary => "age_salary",
            AnalysisKind::Geography => "geography",
            AnalysisKind::CrossCurrency => "cross_currency",
            AnalysisKind::Bonus => "bonus",
            AnalysisKind::Summary => "summary",
        }
    }

    /// Cross-currency comparison always reads every currency partition
    pub fn needs_dataset(&self) -> bool {
        !matches!(self, AnalysisKind::CrossCurrency)
    }
}

/// Aggregate column of a grouped table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatColumn {
    Count,
    Mean,
    Median,
    Min,
    Max,
    Std,
}

impl StatColumn {
    fn header(&self) -> &'static str {
        match self {
            StatColumn::Count => "count",
            StatColumn::Mean => "mean",
            StatColumn::Median => "median",
            StatColumn::Min => "min",
            StatColumn::Max => "max",
            StatColumn::Std => "std",
        }
    }

    fn cell(&self, stats: &Statistics) -> String {
        match self {
            StatColumn::Count => stats.count.to_string(),
            StatColumn::Mean => format!("{:.2}", stats.mean),
            StatColumn::Median => format!("{:.2}", stats.median),
            StatColumn::Min => format!("{:.2}", stats.min),
            StatColumn::Max => format!("{:.2}", stats.max),
            StatColumn::Std => stats
                .std_dev
                .map(|sd| format!("{:.2}", sd))
                .unwrap_or_else(|| "NaN".to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GroupRow {
    pub key: String,
    pub stats: Statistics,
}

/// A grouped aggregate table (one row per job title, country, ...)
#[derive(Debug, Clone, PartialEq)]
pub struct ReportTable {
    pub key_header: String,
    pub columns: Vec<StatColumn>,
    pub rows: Vec<GroupRow>,
}

impl ReportTable {
    pub fn render(&self) -> String {
        let cells: Vec<Vec<String>> = self
            .rows
            .iter()
            .map(|row| self.columns.iter().map(|c| c.cell(&row.stats)).collect())
            .collect();

        let key_width = self
            .rows
            .iter()
            .map(|r| r.key.chars().count())
            .chain(std::iter::once(self.key_header.chars().count()))
            .max()
            .unwrap_or(0);
        let widths: Vec<usize> = self
            .columns
            .iter()
            .enumerate()
            .map(|(i, column)| {
                cells
                    .iter()
                    .map(|row| row[i].len())
                    .chain(std::iter::once(column.header().len()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        let mut out = String::new();
        let _ = write!(out, "{:<width$}", self.key_header, width = key_width);
        for (column, width) in self.columns.iter().zip(&widths) {
            let _ = write!(out, "  {:>width$}", column.header(), width = *width);
        }
        out.push('\n');

        for (row, row_cells) in self.rows.iter().zip(&cells) {
            let _ = write!(out, "{}", pad_right(&row.key, key_width));
            for (cell, width) in row_cells.iter().zip(&widths) {
                let _ = write!(out, "  {:>width$}", cell, width = *width);
            }
            out.push('\n');
        }
        out
    }
}

/// Data for a bar chart rendered next to the text report
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSpec {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub bars: Vec<(String, f64)>,
}

/// The outcome of one analysis run.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisReport {
    pub kind: AnalysisKind,
    /// Dataset the report is filed under
    pub dataset: DatasetId,
    /// Heading plus currency notes
    pub preamble: Vec<String>,
    pub table: Option<ReportTable>,
    /// Free-form result lines (bonus and summary statistics)
    pub lines: Vec<String>,
    pub chart: Option<ChartSpec>,
}

impl AnalysisReport {
    pub fn title(&self) -> &'static str {
        self.kind.title()
    }

    pub fn render_text(&self) -> String {
        let mut out = String::new();
        for line in &self.preamble {
            out.push_str(line);
            out.push('\n');
        }
        out.push('\n');
        if let Some(table) = &self.table {
            if table.rows.is_empty() {
                out.push_str("No groups met the minimum response count.\n");
            } else {
                out.push_str(&table.render());
            }
        }
        for line in &self.lines {
            out.push_str(line);
            out.push('\n');
        }
        out
    }
}

/// Format an amount with thousands separators and two decimals (`1234567.891` -> `1,234,567.89`)
pub fn format_amount(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    let fixed = format!("{:.2}", value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, digit) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if value < 0.0 && fixed.chars().any(|c| c.is_ascii_digit() && c != '0') {
        "-"
    } else {
        ""
    };
    format!("{}{}.{}", sign, grouped, frac_part)
}

/// Format a count with thousands separators
pub fn format_count(value: usize) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, digit) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(digit);
    }
    out
}

fn pad_right(text: &str, width: usize) -> String {
    let len = text.chars().count();
    let mut out = text.to_string();
    out.extend(std::iter::repeat(' ').take(width.saturating_sub(len)));
    out
}

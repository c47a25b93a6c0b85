use std::io::{self, BufRead, Write};

use crate::analysis::AnalysisKind;
use crate::app::analyze_use_case::AnalyzeUseCase;
use crate::domain::DatasetId;
use crate::error::SurveyError;
use tracing::warn;

/// Line-oriented prompts over any reader/writer pair.
/// End of input behaves like quitting.
pub struct Menu<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Menu<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn output(&mut self) -> &mut W {
        &mut self.output
    }

    /// `None` on end of input
    fn read_choice(&mut self) -> io::Result<Option<String>> {
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    /// Ask for an analysis; `None` means quit
    pub fn choose_analysis(&mut self) -> io::Result<Option<AnalysisKind>> {
        loop {
            writeln!(self.output)?;
            writeln!(self.output, "{}", "=".repeat(50))?;
            writeln!(self.output, "SALARY SURVEY ANALYZER")?;
            writeln!(self.output, "{}", "=".repeat(50))?;
            for (i, kind) in AnalysisKind::ALL.iter().enumerate() {
                writeln!(self.output, "{}. {}", i + 1, kind.menu_label())?;
            }
            writeln!(self.output, "q. Quit")?;
            write!(self.output, "\nSelect an option: ")?;
            self.output.flush()?;

            let Some(choice) = self.read_choice()? else {
                return Ok(None);
            };
            if choice.eq_ignore_ascii_case("q") {
                return Ok(None);
            }
            match choice.parse::<usize>() {
                Ok(n) if (1..=AnalysisKind::ALL.len()).contains(&n) => {
                    return Ok(Some(AnalysisKind::ALL[n - 1]));
                }
                _ => writeln!(self.output, "❌ Invalid choice '{}', please try again.", choice)?,
            }
        }
    }

    /// Ask which dataset to analyze; `None` means cancel
    pub fn choose_dataset(&mut self, datasets: &[DatasetId]) -> io::Result<Option<DatasetId>> {
        loop {
            writeln!(self.output, "\nAvailable datasets:")?;
            for (i, dataset) in datasets.iter().enumerate() {
                let label = if dataset.is_all() {
                    format!("{} (all currencies, converted to USD)", dataset.label())
                } else {
                    dataset.label().to_string()
                };
                writeln!(self.output, "{}. {}", i + 1, label)?;
            }
            writeln!(self.output, "0. Cancel")?;
            write!(self.output, "\nSelect a dataset: ")?;
            self.output.flush()?;

            let Some(choice) = self.read_choice()? else {
                return Ok(None);
            };
            match choice.parse::<usize>() {
                Ok(0) => return Ok(None),
                Ok(n) if n <= datasets.len() => return Ok(Some(datasets[n - 1].clone())),
                _ => writeln!(self.output, "❌ Invalid choice '{}', please try again.", choice)?,
            }
        }
    }
}

/// Interactive analyzer loop: pick an analysis, pick a dataset, print and save the report
pub fn run_interactive<R: BufRead, W: Write>(
    use_case: &AnalyzeUseCase,
    menu: &mut Menu<R, W>,
) -> anyhow::Result<()> {
    while let Some(kind) = menu.choose_analysis()? {
        let dataset = if kind.needs_dataset() {
            let datasets = use_case.available_datasets()?;
            if datasets.is_empty() {
                writeln!(
                    menu.output(),
                    "⚠️  No cleaned datasets found. Run the cleaner first."
                )?;
                continue;
            }
            match menu.choose_dataset(&datasets)? {
                Some(dataset) => dataset,
                None => continue,
            }
        } else {
            DatasetId::All
        };

        let outcome = match use_case.run(kind, &dataset) {
            Ok(outcome) => outcome,
            Err(e) if is_missing_dataset(&e) => return Err(e),
            Err(e) => {
                warn!("Analysis failed: {:#}", e);
                writeln!(menu.output(), "❌ Error during analysis: {:#}", e)?;
                continue;
            }
        };
        let out = menu.output();
        writeln!(out, "\n{} - {}\n", outcome.report.title(), outcome.report.dataset)?;
        write!(out, "{}", outcome.report.render_text())?;
        writeln!(out, "\n💾 Report saved to {}", outcome.saved.text_path.display())?;
        if let Some(chart) = &outcome.saved.chart_path {
            writeln!(out, "📊 Chart saved to {}", chart.display())?;
        }
    }
    writeln!(menu.output(), "👋 Goodbye!")?;
    Ok(())
}

fn is_missing_dataset(err: &anyhow::Error) -> bool {
    matches!(
        err.downcast_ref::<SurveyError>(),
        Some(SurveyError::DatasetNotFound(_))
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{AnalysisReport, SalaryAnalyzer};
    use crate::app::ports::{DatasetSourcePort, ReportSinkPort, SavedReport};
    use crate::config::SurveyConfig;
    use crate::domain::SurveyRecord;
    use std::io::Cursor;
    use std::path::PathBuf;

    fn menu(input: &str) -> Menu<Cursor<Vec<u8>>, Vec<u8>> {
        Menu::new(Cursor::new(input.as_bytes().to_vec()), Vec::new())
    }

    fn printed(menu: Menu<Cursor<Vec<u8>>, Vec<u8>>) -> String {
        String::from_utf8(menu.output).unwrap()
    }

    #[test]
    fn test_invalid_choice_reprompts() {
        let mut menu = menu("9\nabc\n3\n");
        assert_eq!(menu.choose_analysis().unwrap(), Some(AnalysisKind::Geography));

        let out = printed(menu);
        assert_eq!(out.matches("Select an option:").count(), 3);
        assert!(out.contains("Invalid choice '9'"));
        assert!(out.contains("Invalid choice 'abc'"));
    }

    #[test]
    fn test_quit_and_end_of_input() {
        assert_eq!(menu("q\n").choose_analysis().unwrap(), None);
        assert_eq!(menu("Q\n").choose_analysis().unwrap(), None);
        assert_eq!(menu("").choose_analysis().unwrap(), None);
    }

    struct FixedDatasets {
        missing: bool,
    }

    impl DatasetSourcePort for FixedDatasets {
        fn available_datasets(&self) -> anyhow::Result<Vec<DatasetId>> {
            Ok(vec![DatasetId::for_currency("USD")])
        }

        fn load(&self, dataset: &DatasetId) -> anyhow::Result<Vec<SurveyRecord>> {
            if self.missing {
                return Err(SurveyError::DatasetNotFound(PathBuf::from(dataset.file_name())).into());
            }
            Ok(Vec::new())
        }
    }

    struct NoSink;

    impl ReportSinkPort for NoSink {
        fn save(&self, _report: &AnalysisReport) -> anyhow::Result<SavedReport> {
            anyhow::bail!("nothing should be saved")
        }
    }

    fn use_case(missing: bool) -> AnalyzeUseCase {
        let config = SurveyConfig::builtin().unwrap();
        AnalyzeUseCase::new(
            Box::new(FixedDatasets { missing }),
            Box::new(NoSink),
            SalaryAnalyzer::from_config(&config),
        )
    }

    #[test]
    fn test_failed_analysis_returns_to_menu() {
        // Summary on an empty USD file, then quit
        let mut m = menu("6\n1\nq\n");
        run_interactive(&use_case(false), &mut m).unwrap();

        let out = printed(m);
        assert!(out.contains("❌ Error during analysis"));
        assert!(out.contains("Goodbye!"));
        assert_eq!(out.matches("SALARY SURVEY ANALYZER").count(), 2);
    }

    #[test]
    fn test_missing_dataset_ends_session() {
        let mut m = menu("6\n1\nq\n");
        let err = run_interactive(&use_case(true), &mut m).unwrap_err();
        assert!(is_missing_dataset(&err));
    }

    #[test]
    fn test_dataset_choice_and_cancel() {
        let datasets = vec![DatasetId::for_currency("USD"), DatasetId::All];

        let mut m = menu("5\n2\n");
        assert_eq!(m.choose_dataset(&datasets).unwrap(), Some(DatasetId::All));
        assert!(printed(m).contains("2. ALL (all currencies, converted to USD)"));

        assert_eq!(menu("0\n").choose_dataset(&datasets).unwrap(), None);
    }
}

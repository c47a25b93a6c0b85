use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{error, info};

use salary_survey::analysis::{AnalysisKind, SalaryAnalyzer};
use salary_survey::app::analyze_use_case::AnalyzeUseCase;
use salary_survey::app::clean_use_case::CleanUseCase;
use salary_survey::app::ports::DatasetSourcePort;
use salary_survey::cli::{run_interactive, Menu};
use salary_survey::config::SurveyConfig;
use salary_survey::constants::DEFAULT_INPUT_FILE;
use salary_survey::domain::DatasetId;
use salary_survey::infra::{BarChartRenderer, CsvDatasetStore, CsvSurveySource, FileReportSink};
use salary_survey::logging;
use salary_survey::observability::metrics;

#[derive(Parser)]
#[command(name = "salary_survey")]
#[command(about = "Clean and analyze salary survey responses")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Clean the raw survey export into per-currency datasets
    Clean {
        /// Raw survey CSV
        #[arg(long, default_value = DEFAULT_INPUT_FILE)]
        input: PathBuf,
        /// Directory receiving the cleaned datasets
        #[arg(long, default_value = ".")]
        output_dir: PathBuf,
        /// TOML file layered over the built-in configuration
        #[arg(long)]
        config: Option<PathBuf>,
        /// Write a Prometheus text snapshot of run metrics here
        #[arg(long)]
        metrics_file: Option<PathBuf>,
    },
    /// Analyze cleaned datasets (interactive unless --analysis and --dataset are given)
    Analyze {
        /// Directory holding the cleaned datasets; reports are written next to them
        #[arg(long, default_value = ".")]
        data_dir: PathBuf,
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long, value_enum)]
        analysis: Option<AnalysisKind>,
        /// Currency label such as USD or AUD_NZD, or ALL
        #[arg(long)]
        dataset: Option<String>,
        #[arg(long)]
        metrics_file: Option<PathBuf>,
    },
    /// List the cleaned datasets available for analysis
    Datasets {
        #[arg(long, default_value = ".")]
        data_dir: PathBuf,
    },
}

fn load_config(path: Option<&Path>) -> Result<SurveyConfig> {
    let config = SurveyConfig::load(path).context("Failed to load configuration")?;
    if let Some(path) = path {
        info!(path = %path.display(), "Loaded configuration overrides");
    }
    Ok(config)
}

fn run_clean(input: &Path, output_dir: &Path, config: &SurveyConfig) -> Result<()> {
    println!("🧹 Cleaning {}...", input.display());

    let use_case = CleanUseCase::from_config(
        config,
        Box::new(CsvSurveySource::new(input)),
        Box::new(CsvDatasetStore::new(output_dir, config.columns.clone())),
    );
    let summary = use_case.execute()?;

    println!("\n📊 Cleaning Results:");
    println!("   Input rows: {}", summary.input_rows);
    println!("   Duplicates removed: {}", summary.duplicates_removed);
    println!("   Malformed salary: {}", summary.malformed_salary);
    println!("   Missing required fields: {}", summary.missing_required);
    println!("   Unknown currency: {}", summary.unknown_currency);
    println!("   Outliers removed: {}", summary.outliers_removed);
    println!("   Final rows: {}", summary.final_rows);
    for (currency, rows) in &summary.rows_per_currency {
        println!("     {}: {}", currency, rows);
    }
    println!("\n💾 Files written:");
    for path in &summary.files_written {
        println!("   - {}", path.display());
    }
    println!("✅ Cleaning completed successfully");
    Ok(())
}

fn analyze_use_case(data_dir: &Path, config: &SurveyConfig) -> AnalyzeUseCase {
    AnalyzeUseCase::new(
        Box::new(CsvDatasetStore::new(data_dir, config.columns.clone())),
        Box::new(FileReportSink::new(data_dir, BarChartRenderer::new(&config.chart))),
        SalaryAnalyzer::from_config(config),
    )
}

fn run_analyze(
    data_dir: &Path,
    config: &SurveyConfig,
    analysis: Option<AnalysisKind>,
    dataset: Option<String>,
) -> Result<()> {
    let use_case = analyze_use_case(data_dir, config);

    match (analysis, dataset) {
        (Some(kind), dataset) if dataset.is_some() || !kind.needs_dataset() => {
            let dataset = dataset
                .as_deref()
                .map(DatasetId::parse)
                .unwrap_or(DatasetId::All);
            println!("📈 Running {} on {}...", kind.title(), dataset);
            let outcome = use_case.run(kind, &dataset)?;
            println!("\n{}", outcome.report.render_text());
            println!("💾 Report saved to {}", outcome.saved.text_path.display());
            if let Some(chart) = &outcome.saved.chart_path {
                println!("📊 Chart saved to {}", chart.display());
            }
            Ok(())
        }
        (None, None) => {
            let stdin = io::stdin();
            let mut menu = Menu::new(stdin.lock(), io::stdout());
            run_interactive(&use_case, &mut menu)
        }
        _ => bail!("--analysis and --dataset must be given together (cross-currency needs no dataset)"),
    }
}

fn list_datasets(data_dir: &Path, config: &SurveyConfig) -> Result<()> {
    let store = CsvDatasetStore::new(data_dir, config.columns.clone());
    let datasets = store.available_datasets()?;
    if datasets.is_empty() {
        println!("⚠️  No cleaned datasets in {}. Run `salary_survey clean` first.", data_dir.display());
        return Ok(());
    }
    println!("📂 Cleaned datasets in {}:", data_dir.display());
    for dataset in datasets {
        println!("   - {} ({})", dataset, dataset.file_name());
    }
    Ok(())
}

fn main() -> Result<()> {
    dotenv::dotenv().ok();
    logging::init_logging(Path::new("logs"));

    let cli = Cli::parse();

    let (result, metrics_file) = match cli.command {
        Commands::Clean {
            input,
            output_dir,
            config,
            metrics_file,
        } => {
            let handle = install_metrics(metrics_file.as_deref())?;
            let result = load_config(config.as_deref())
                .and_then(|config| run_clean(&input, &output_dir, &config));
            (result, handle.zip(metrics_file))
        }
        Commands::Analyze {
            data_dir,
            config,
            analysis,
            dataset,
            metrics_file,
        } => {
            let handle = install_metrics(metrics_file.as_deref())?;
            let result = load_config(config.as_deref())
                .and_then(|config| run_analyze(&data_dir, &config, analysis, dataset));
            (result, handle.zip(metrics_file))
        }
        Commands::Datasets { data_dir } => {
            let result = load_config(None).and_then(|config| list_datasets(&data_dir, &config));
            (result, None)
        }
    };

    if let Some((handle, path)) = metrics_file {
        metrics::write_snapshot(&handle, &path)
            .with_context(|| format!("Failed to write metrics to {}", path.display()))?;
        info!(path = %path.display(), "Wrote metrics snapshot");
    }

    if let Err(e) = &result {
        error!("Run failed: {:#}", e);
    }
    result
}

fn install_metrics(
    path: Option<&Path>,
) -> Result<Option<metrics_exporter_prometheus::PrometheusHandle>> {
    match path {
        Some(_) => Ok(Some(metrics::install_recorder()?)),
        None => Ok(None),
    }
}

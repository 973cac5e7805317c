//! Forest CLI - Command-line interface for Fault Forest
//!
//! Commands:
//! - run: Generate data, train the forest and report on it
//! - generate: Export a synthetic sensor dataset
//! - config: Print the effective pipeline configuration

use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use fault_forest::pipeline::{PipelineOutcome, FAULTY_READING, NORMAL_READING};
use fault_forest::types::DATASET_COLUMNS;
use fault_forest::{Dataset, MaintenanceError, MaintenancePipeline, PipelineConfig, VERSION};

/// Forest - Predictive maintenance on synthetic sensor data
#[derive(Parser)]
#[command(name = "forest")]
#[command(version = VERSION)]
#[command(about = "Detect machine faults from sensor readings with a random forest", long_about = None)]
struct Cli {
    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate data, train the forest and report on it
    Run {
        #[command(flatten)]
        overrides: Overrides,

        /// Share of rows held out for evaluation
        #[arg(long)]
        test_ratio: Option<f64>,

        /// Disable stratified splitting
        #[arg(long)]
        no_stratify: bool,

        /// Output the outcome as JSON
        #[arg(long)]
        json: bool,
    },

    /// Export a synthetic sensor dataset
    Generate {
        #[command(flatten)]
        overrides: Overrides,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,

        /// Output format
        #[arg(long, default_value = "csv")]
        format: DatasetFormat,
    },

    /// Print the effective pipeline configuration as JSON
    Config {
        #[command(flatten)]
        overrides: Overrides,
    },
}

/// Settings shared by every command
#[derive(clap::Args)]
struct Overrides {
    /// Load configuration from a JSON file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of rows to generate
    #[arg(short, long)]
    samples: Option<usize>,

    /// Seed for data generation and splitting
    #[arg(long)]
    seed: Option<u64>,
}

impl Overrides {
    /// File values first, then flags
    fn resolve(&self) -> Result<PipelineConfig, ForestCliError> {
        let mut config = match &self.config {
            Some(path) => PipelineConfig::load(path)?,
            None => PipelineConfig::default(),
        };
        if let Some(samples) = self.samples {
            config.num_samples = samples;
        }
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        Ok(config)
    }
}

#[derive(Clone, ValueEnum)]
enum DatasetFormat {
    /// Comma-separated values with a header row
    Csv,
    /// Newline-delimited JSON (one record per line)
    Ndjson,
    /// JSON array of records
    Json,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e))
                    .unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let default_level = if verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_level.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn run(cli: Cli) -> Result<(), ForestCliError> {
    match cli.command {
        Commands::Run {
            overrides,
            test_ratio,
            no_stratify,
            json,
        } => {
            let mut config = overrides.resolve()?;
            if let Some(ratio) = test_ratio {
                config.test_ratio = ratio;
            }
            if no_stratify {
                config.stratify = false;
            }
            cmd_run(config, json)
        }
        Commands::Generate {
            overrides,
            output,
            format,
        } => cmd_generate(overrides.resolve()?, &output, format),
        Commands::Config { overrides } => {
            let config = overrides.resolve()?;
            config.validate()?;
            println!("{}", config.to_json()?);
            Ok(())
        }
    }
}

fn cmd_run(config: PipelineConfig, json: bool) -> Result<(), ForestCliError> {
    let outcome = MaintenancePipeline::new(config).run()?;

    if json {
        println!("{}", outcome.to_json()?);
    } else {
        print!("{}", render_outcome(&outcome));
    }

    Ok(())
}

fn render_outcome(outcome: &PipelineOutcome) -> String {
    let mut out = String::new();

    out.push_str("Data preview:\n");
    out.push_str(&DATASET_COLUMNS.join("\t"));
    out.push('\n');
    for record in &outcome.preview {
        let readings: Vec<String> = record.readings().iter().map(|v| format!("{v:.2}")).collect();
        out.push_str(&format!("{}\t{}\n", readings.join("\t"), record.fault));
    }

    let dist = &outcome.fault_distribution;
    out.push_str(&format!(
        "\nFault distribution:\n  normal (0): {}\n  fault  (1): {}\n",
        dist.normal, dist.fault
    ));

    let shapes = &outcome.shapes;
    out.push_str(&format!(
        "\nTraining set: {:?} features, {} labels\nTest set:     {:?} features, {} labels\n",
        shapes.train_features, shapes.train_labels, shapes.test_features, shapes.test_labels
    ));

    out.push_str(&format!("\nAccuracy: {:.4}\n\n", outcome.accuracy));
    out.push_str(&outcome.report);

    out.push_str("\nFeature importances:\n");
    for item in &outcome.feature_importances {
        out.push_str(&format!("  {:<10} {:.4}\n", item.feature, item.importance));
    }

    out.push_str(&format!(
        "\nNormal reading {:?}: {}\nFaulty reading {:?}: {}\n",
        NORMAL_READING,
        outcome.normal_prediction.as_str(),
        FAULTY_READING,
        outcome.faulty_prediction.as_str()
    ));
    if outcome.maintenance_alert() {
        out.push_str("\nALERT: potential fault detected, schedule maintenance\n");
    }

    out
}

fn cmd_generate(
    config: PipelineConfig,
    output: &Path,
    format: DatasetFormat,
) -> Result<(), ForestCliError> {
    let dataset = MaintenancePipeline::new(config).generate()?;
    let output_data = format_dataset(&dataset, &format)?;

    if output.to_string_lossy() == "-" {
        print!("{}", output_data);
    } else {
        fs::write(output, output_data)?;
    }

    Ok(())
}

fn format_dataset(dataset: &Dataset, format: &DatasetFormat) -> Result<String, ForestCliError> {
    match format {
        DatasetFormat::Csv => {
            let mut lines = vec![DATASET_COLUMNS.join(",")];
            for record in dataset.iter() {
                let mut fields: Vec<String> =
                    record.readings().iter().map(|v| v.to_string()).collect();
                fields.push(record.fault.to_string());
                lines.push(fields.join(","));
            }
            Ok(lines.join("\n") + "\n")
        }
        DatasetFormat::Ndjson => {
            let mut lines: Vec<String> = Vec::new();
            for record in dataset.iter() {
                lines.push(serde_json::to_string(record)?);
            }
            Ok(lines.join("\n") + "\n")
        }
        DatasetFormat::Json => Ok(serde_json::to_string(dataset)?),
    }
}

// Error handling

#[derive(Debug)]
enum ForestCliError {
    Io(std::io::Error),
    Json(serde_json::Error),
    Pipeline(MaintenanceError),
}

impl From<std::io::Error> for ForestCliError {
    fn from(e: std::io::Error) -> Self {
        ForestCliError::Io(e)
    }
}

impl From<serde_json::Error> for ForestCliError {
    fn from(e: serde_json::Error) -> Self {
        ForestCliError::Json(e)
    }
}

impl From<MaintenanceError> for ForestCliError {
    fn from(e: MaintenanceError) -> Self {
        match e {
            MaintenanceError::Io(e) => ForestCliError::Io(e),
            MaintenanceError::Json(e) => ForestCliError::Json(e),
            other => ForestCliError::Pipeline(other),
        }
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<ForestCliError> for CliError {
    fn from(e: ForestCliError) -> Self {
        match e {
            ForestCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            ForestCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check the configuration file's JSON syntax".to_string()),
            },
            ForestCliError::Pipeline(e) => {
                let (code, hint) = match &e {
                    MaintenanceError::InvalidArgument(_) => {
                        ("INVALID_ARGUMENT", "Use a positive --samples value")
                    }
                    MaintenanceError::Config(_) => (
                        "CONFIG_ERROR",
                        "Run 'forest config' to inspect the effective settings",
                    ),
                    MaintenanceError::EmptyInput(_) | MaintenanceError::ShapeMismatch(_) => (
                        "DATA_ERROR",
                        "Generate more samples so both partitions hold data",
                    ),
                    _ => ("PIPELINE_ERROR", "Re-run with --verbose for details"),
                };
                CliError {
                    code: code.to_string(),
                    message: e.to_string(),
                    hint: Some(hint.to_string()),
                }
            }
        }
    }
}

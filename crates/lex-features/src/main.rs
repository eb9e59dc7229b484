//! CLI entry point for feature pipelines.

use anyhow::{Context, Result, anyhow};
use clap::{Parser, ValueEnum};
use lex_features::config::{PreProcessorOptions, StageOrder, load_feature_configs};
use lex_features::utils::to_snake_case;
use lex_features::PreProcessor;
use polars::io::csv::read::CsvReadOptions;
use polars::prelude::*;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// CLI-compatible stage order enum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliStageOrder {
    /// Impute, clip, transform, scale, then weigh within each feature
    Canonical,
    /// Run stages in the order they are written in the config
    Declared,
}

impl From<CliStageOrder> for StageOrder {
    fn from(cli: CliStageOrder) -> Self {
        match cli {
            CliStageOrder::Canonical => StageOrder::Canonical,
            CliStageOrder::Declared => StageOrder::Declared,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    author = "Lex Machina Team",
    version,
    about = "Declarative per-column feature pipelines",
    long_about = "Fits a feature pipeline described by a JSON or YAML config on a training \
                  CSV and applies it to that file and any others.\n\n\
                  EXAMPLES:\n  \
                  # Fit on train.csv and write outputs/train_processed.csv\n  \
                  lex-features -c features.yaml -t train.csv\n\n  \
                  # Apply the same fitted pipeline to a test set\n  \
                  lex-features -c features.json -t train.csv -a test.csv -o results/"
)]
struct Args {
    /// Feature config file (.json, .yaml or .yml)
    #[arg(short, long)]
    config: PathBuf,

    /// CSV file the pipeline is fitted on
    #[arg(short, long)]
    train: PathBuf,

    /// Additional CSV files to transform with the fitted pipeline
    #[arg(short, long)]
    apply: Vec<PathBuf>,

    /// Output directory for processed files
    #[arg(short, long, default_value = "./outputs")]
    output: PathBuf,

    /// How stages are ordered within a feature
    #[arg(long, value_enum, default_value = "canonical")]
    stage_order: CliStageOrder,

    /// Convert raw column names to snake_case before matching features
    #[arg(long)]
    snake_case_columns: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Only log warnings and errors
    #[arg(short, long)]
    quiet: bool,
}

/// Initialize the tracing subscriber for logging.
fn init_logging(level: &str, quiet: bool) {
    use tracing_subscriber::EnvFilter;

    let effective_level = if quiet { "warn" } else { level };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.log_level, args.quiet);

    for path in std::iter::once(&args.train).chain(&args.apply) {
        if !path.exists() {
            return Err(anyhow!("Input file not found: {}", path.display()));
        }
    }

    if !args.output.exists() {
        std::fs::create_dir_all(&args.output)?;
        info!("Created output directory: {}", args.output.display());
    }

    let configs = load_feature_configs(&args.config)?;
    let options = PreProcessorOptions::builder()
        .stage_order(args.stage_order.into())
        .build();
    let mut pipeline = PreProcessor::with_options(configs, options)?;

    let train = load_csv(&args.train, args.snake_case_columns)?;
    let processed = pipeline
        .fit_transform(&train)
        .with_context(|| format!("Fitting pipeline on {}", args.train.display()))?;
    write_processed(&args.output, &args.train, processed)?;

    for path in &args.apply {
        let table = load_csv(path, args.snake_case_columns)?;
        let processed = pipeline
            .transform(&table)
            .with_context(|| format!("Transforming {}", path.display()))?;
        write_processed(&args.output, path, processed)?;
    }

    Ok(())
}

fn load_csv(path: &Path, snake_case_columns: bool) -> Result<DataFrame> {
    info!("Loading dataset from: {}", path.display());
    let mut df = CsvReadOptions::default()
        .with_infer_schema_length(Some(100))
        .with_has_header(true)
        .with_parse_options(CsvParseOptions::default().with_quote_char(Some(b'"')))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()
        .with_context(|| format!("Reading {}", path.display()))?;

    if snake_case_columns {
        let renamed: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|name| to_snake_case(name))
            .collect();
        debug!("Normalized column names: {:?}", renamed);
        df.set_column_names(renamed)?;
    }

    info!("Dataset loaded successfully: {:?}", df.shape());
    Ok(df)
}

fn write_processed(output_dir: &Path, input: &Path, mut df: DataFrame) -> Result<()> {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "dataset".to_string());
    let output_path = output_dir.join(format!("{stem}_processed.csv"));

    let mut file = File::create(&output_path)
        .with_context(|| format!("Creating {}", output_path.display()))?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .with_separator(b',')
        .with_quote_char(b'"')
        .finish(&mut df)?;

    info!("Dataset saved: {} {:?}", output_path.display(), df.shape());
    Ok(())
}

//! Featurize CLI - Command-line interface for Sensor Features
//!
//! Commands:
//! - run: Convert the raw data directory into a new feature file (default)
//! - inspect: Show per-key statistics of a single raw data file
//! - table: Read back and validate a feature file
//! - doctor: Diagnose directories and configuration

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use sensor_features::pipeline::{list_raw_files, next_output_path, FileReport, RunSummary};
use sensor_features::{
    FeatureError, FeaturePipeline, FeatureTable, MissingKeyPolicy, PipelineConfig,
    FEATURES_VERSION, PRODUCER_NAME,
};

/// Featurize - turn raw sensor recordings into a feature table
#[derive(Parser)]
#[command(name = "featurize")]
#[command(version = FEATURES_VERSION)]
#[command(about = "Convert raw sensor files into a feature CSV", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert the raw data directory into a new feature file
    Run {
        #[command(flatten)]
        settings: SettingsArgs,

        /// Write a JSON run summary to this path (use - for stdout)
        #[arg(long)]
        report: Option<PathBuf>,
    },

    /// Show per-key statistics of a single raw data file
    Inspect {
        /// Raw data file
        input: PathBuf,

        #[command(flatten)]
        settings: SettingsArgs,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Read back and validate a feature file
    Table {
        /// Feature CSV file
        input: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Diagnose directories and configuration
    Doctor {
        #[command(flatten)]
        settings: SettingsArgs,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args, Default)]
struct SettingsArgs {
    /// Load settings from a JSON config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Raw data directory
    #[arg(long)]
    raw_dir: Option<PathBuf>,

    /// Feature file directory
    #[arg(long)]
    feature_dir: Option<PathBuf>,

    /// Feature file name stem
    #[arg(long)]
    stem: Option<String>,

    /// Handling of sensor keys a later file does not supply
    #[arg(long, value_enum)]
    missing_keys: Option<MissingKeys>,

    /// Process raw files in directory order instead of name order
    #[arg(long)]
    unsorted: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum MissingKeys {
    /// Write NaN for the missing statistics
    Nan,
    /// Write 0 for the missing statistics
    Zero,
    /// Leave the file out of the table
    SkipRow,
}

impl From<MissingKeys> for MissingKeyPolicy {
    fn from(value: MissingKeys) -> Self {
        match value {
            MissingKeys::Nan => MissingKeyPolicy::Nan,
            MissingKeys::Zero => MissingKeyPolicy::Zero,
            MissingKeys::SkipRow => MissingKeyPolicy::SkipRow,
        }
    }
}

impl SettingsArgs {
    /// Resolve config file and flag overrides into a validated config
    fn resolve(&self) -> Result<PipelineConfig, FeatureError> {
        let mut config = match &self.config {
            Some(path) => PipelineConfig::from_json_file(path)?,
            None => PipelineConfig::default(),
        };
        if let Some(dir) = &self.raw_dir {
            config.raw_data_dir = dir.clone();
        }
        if let Some(dir) = &self.feature_dir {
            config.feature_dir = dir.clone();
        }
        if let Some(stem) = &self.stem {
            config.file_stem = stem.clone();
        }
        if let Some(policy) = self.missing_keys {
            config.missing_keys = policy.into();
        }
        if self.unsorted {
            config.sort_inputs = false;
        }
        config.validate()?;
        Ok(config)
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

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

fn run(cli: Cli) -> Result<(), FeaturizeCliError> {
    match cli.command {
        None => cmd_run(&SettingsArgs::default(), None),
        Some(Commands::Run { settings, report }) => cmd_run(&settings, report.as_deref()),
        Some(Commands::Inspect {
            input,
            settings,
            json,
        }) => cmd_inspect(&input, &settings, json),
        Some(Commands::Table { input, json }) => cmd_table(&input, json),
        Some(Commands::Doctor { settings, json }) => cmd_doctor(&settings, json),
    }
}

fn cmd_run(settings: &SettingsArgs, report: Option<&Path>) -> Result<(), FeaturizeCliError> {
    let config = settings.resolve()?;
    let summary = FeaturePipeline::new(config).run()?;

    println!("Feature File Path {}", summary.output_path.display());

    if let Some(report_path) = report {
        write_report(&summary, report_path)?;
    }
    Ok(())
}

fn write_report(summary: &RunSummary, path: &Path) -> Result<(), FeaturizeCliError> {
    let json = serde_json::to_string_pretty(summary)?;
    if path.to_string_lossy() == "-" {
        println!("{}", json);
    } else {
        fs::write(path, json)?;
    }
    Ok(())
}

fn cmd_inspect(input: &Path, settings: &SettingsArgs, json: bool) -> Result<(), FeaturizeCliError> {
    let config = settings.resolve()?;
    let report = FeaturePipeline::new(config).inspect_file(input)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_file_report(&report);
    }
    Ok(())
}

fn print_file_report(report: &FileReport) {
    println!("File:           {}", report.path.display());
    println!("Classification: {}", report.classification);
    println!("Sensor keys:    {}", report.keys.len());
    println!();
    println!(
        "  {:<20} {:>7} {:>12} {:>12} {:>10} {:>10} {:>10}",
        "key", "count", "min", "max", "avg", "rms", "sdv"
    );
    for key in &report.keys {
        println!(
            "  {:<20} {:>7} {:>12.4} {:>12.4} {:>10.4} {:>10.4} {:>10.4}",
            key.key, key.count, key.min, key.max, key.mean, key.rms, key.sdv
        );
    }
}

fn cmd_table(input: &Path, json: bool) -> Result<(), FeaturizeCliError> {
    let table = FeatureTable::from_path(input)?;

    let report = TableReport {
        path: input.to_path_buf(),
        keys: table.registry.keys().to_vec(),
        columns: table.registry.column_count(),
        rows: table.row_count(),
        rows_with_nan: table
            .rows
            .iter()
            .filter(|row| {
                row.stats
                    .iter()
                    .any(|s| s.mean.is_nan() || s.rms.is_nan() || s.sdv.is_nan())
            })
            .count(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Feature Table");
        println!("=============");
        println!("Path:          {}", report.path.display());
        println!("Columns:       {}", report.columns);
        println!("Rows:          {}", report.rows);
        println!("Rows with NaN: {}", report.rows_with_nan);
        println!("Sensor keys:   {}", report.keys.join(", "));
    }
    Ok(())
}

fn cmd_doctor(settings: &SettingsArgs, json: bool) -> Result<(), FeaturizeCliError> {
    let mut checks: Vec<DoctorCheck> = Vec::new();

    checks.push(DoctorCheck {
        name: "version".to_string(),
        status: CheckStatus::Ok,
        message: format!("{} version {}", PRODUCER_NAME, FEATURES_VERSION),
    });

    let config = match settings.resolve() {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config".to_string(),
                status: CheckStatus::Ok,
                message: format!(
                    "key field {}, value field {}, missing keys -> {}, sorted inputs: {}",
                    config.key_field,
                    config.value_field,
                    config.missing_keys.as_str(),
                    config.sort_inputs
                ),
            });
            Some(config)
        }
        Err(e) => {
            checks.push(DoctorCheck {
                name: "config".to_string(),
                status: CheckStatus::Error,
                message: e.to_string(),
            });
            None
        }
    };

    if let Some(config) = &config {
        match list_raw_files(&config.raw_data_dir, config.sort_inputs) {
            Ok(files) if files.is_empty() => checks.push(DoctorCheck {
                name: "raw_data_dir".to_string(),
                status: CheckStatus::Warning,
                message: format!("{} contains no files", config.raw_data_dir.display()),
            }),
            Ok(files) => checks.push(DoctorCheck {
                name: "raw_data_dir".to_string(),
                status: CheckStatus::Ok,
                message: format!(
                    "{} raw data files in {}",
                    files.len(),
                    config.raw_data_dir.display()
                ),
            }),
            Err(e) => checks.push(DoctorCheck {
                name: "raw_data_dir".to_string(),
                status: CheckStatus::Error,
                message: e.to_string(),
            }),
        }

        let feature_check = if config.feature_dir.is_dir() {
            DoctorCheck {
                name: "feature_dir".to_string(),
                status: CheckStatus::Ok,
                message: format!(
                    "next feature file {}",
                    next_output_path(&config.feature_dir, &config.file_stem).display()
                ),
            }
        } else {
            DoctorCheck {
                name: "feature_dir".to_string(),
                status: CheckStatus::Warning,
                message: format!(
                    "{} does not exist and will be created",
                    config.feature_dir.display()
                ),
            }
        };
        checks.push(feature_check);
    }

    let report = DoctorReport {
        producer: PRODUCER_NAME.to_string(),
        version: FEATURES_VERSION.to_string(),
        checks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Featurize Doctor Report");
        println!("=======================");
        println!("Producer: {}", report.producer);
        println!("Version:  {}", report.version);
        println!("\nChecks:");
        for check in &report.checks {
            let status_icon = match check.status {
                CheckStatus::Ok => "[OK]",
                CheckStatus::Warning => "[WARN]",
                CheckStatus::Error => "[ERR]",
            };
            println!("  {} {}: {}", status_icon, check.name, check.message);
        }
    }

    let has_errors = report
        .checks
        .iter()
        .any(|c| matches!(c.status, CheckStatus::Error));
    if has_errors {
        Err(FeaturizeCliError::DoctorFailed)
    } else {
        Ok(())
    }
}

// Report types

#[derive(serde::Serialize)]
struct TableReport {
    path: PathBuf,
    keys: Vec<String>,
    columns: usize,
    rows: usize,
    rows_with_nan: usize,
}

#[derive(serde::Serialize)]
struct DoctorReport {
    producer: String,
    version: String,
    checks: Vec<DoctorCheck>,
}

#[derive(serde::Serialize)]
struct DoctorCheck {
    name: String,
    status: CheckStatus,
    message: String,
}

#[derive(serde::Serialize)]
#[serde(rename_all = "lowercase")]
enum CheckStatus {
    Ok,
    Warning,
    Error,
}

// Error types

#[derive(Debug)]
enum FeaturizeCliError {
    Io(io::Error),
    Feature(FeatureError),
    Json(serde_json::Error),
    DoctorFailed,
}

impl From<io::Error> for FeaturizeCliError {
    fn from(e: io::Error) -> Self {
        FeaturizeCliError::Io(e)
    }
}

impl From<FeatureError> for FeaturizeCliError {
    fn from(e: FeatureError) -> Self {
        FeaturizeCliError::Feature(e)
    }
}

impl From<serde_json::Error> for FeaturizeCliError {
    fn from(e: serde_json::Error) -> Self {
        FeaturizeCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<FeaturizeCliError> for CliError {
    fn from(e: FeaturizeCliError) -> Self {
        match e {
            FeaturizeCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            FeaturizeCliError::Feature(e) => {
                let (code, hint) = match &e {
                    FeatureError::Config(_) | FeatureError::Json(_) => (
                        "CONFIG_ERROR",
                        "Check the config file and command-line overrides",
                    ),
                    FeatureError::RawDataDir { .. } => (
                        "RAW_DATA_DIR",
                        "Create the raw data directory or pass --raw-dir",
                    ),
                    FeatureError::MalformedTable(_) => (
                        "MALFORMED_TABLE",
                        "Ensure the file was produced by featurize",
                    ),
                    FeatureError::ReadRawFile { .. } => (
                        "IO_ERROR",
                        "Check that the raw data file exists and is readable",
                    ),
                    e if e.is_file_scoped() => (
                        "PARSE_ERROR",
                        "First line is the label, then <key>,<field>,<value> records",
                    ),
                    _ => ("IO_ERROR", "Check file paths, permissions and free space"),
                };
                CliError {
                    code: code.to_string(),
                    message: e.to_string(),
                    hint: Some(hint.to_string()),
                }
            }
            FeaturizeCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: None,
            },
            FeaturizeCliError::DoctorFailed => CliError {
                code: "DOCTOR_FAILED".to_string(),
                message: "One or more health checks failed".to_string(),
                hint: Some("Review the failed checks above".to_string()),
            },
        }
    }
}

//! Pipeline orchestration
//!
//! This module provides the public API for feature extraction.
//! It runs every raw data file through the full pipeline and appends one row
//! per file to a freshly named feature CSV.

use crate::adapters::{CommaRecordAdapter, RawSampleAdapter};
use crate::config::{MissingKeyPolicy, PipelineConfig};
use crate::encoder::FeatureTableWriter;
use crate::error::FeatureError;
use crate::features::StatisticsEngine;
use crate::types::{FeatureRow, KeyRegistry, KeyStats};
use chrono::{DateTime, Utc};
use log::{debug, error, info, warn};
use serde::Serialize;
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

/// A raw data file that produced no row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: String,
}

/// Outcome of feeding a batch of files into a feature table writer
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchOutcome {
    /// Canonical key order, fixed by the first usable file
    pub registry: Option<KeyRegistry>,
    pub rows_written: usize,
    pub skipped: Vec<SkippedFile>,
}

/// Report of a complete pipeline run
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub output_path: PathBuf,
    pub keys: Vec<String>,
    pub files_seen: usize,
    pub rows_written: usize,
    pub skipped: Vec<SkippedFile>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// Per-key statistics of a single raw data file
#[derive(Debug, Clone, Serialize)]
pub struct KeyReport {
    pub key: String,
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub rms: f64,
    pub sdv: f64,
}

/// Parse and statistics report of a single raw data file
#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    pub path: PathBuf,
    pub classification: String,
    pub keys: Vec<KeyReport>,
}

/// Run the pipeline with default settings over the given directories.
///
/// # Example
/// ```ignore
/// let summary = run(Path::new("Data/RawData"), Path::new("Data/FeatureFiles"))?;
/// println!("Feature File Path {}", summary.output_path.display());
/// ```
pub fn run(raw_data_dir: &Path, feature_dir: &Path) -> Result<RunSummary, FeatureError> {
    let config = PipelineConfig {
        raw_data_dir: raw_data_dir.to_path_buf(),
        feature_dir: feature_dir.to_path_buf(),
        ..Default::default()
    };
    FeaturePipeline::new(config).run()
}

/// First `<stem>_<N>.csv` in `dir` that does not exist yet
pub fn next_output_path(dir: &Path, stem: &str) -> PathBuf {
    let mut n: u64 = 0;
    loop {
        let path = dir.join(format!("{stem}_{n}.csv"));
        if !path.exists() {
            return path;
        }
        n += 1;
    }
}

/// Claim the first unused `<stem>_<N>.csv` in `dir`, never overwriting
pub fn create_unique_output(dir: &Path, stem: &str) -> Result<(PathBuf, File), FeatureError> {
    let mut n: u64 = 0;
    loop {
        let path = dir.join(format!("{stem}_{n}.csv"));
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => return Ok((path, file)),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => n += 1,
            Err(e) => return Err(e.into()),
        }
    }
}

/// Regular files of the raw data directory, optionally in file name order
pub fn list_raw_files(dir: &Path, sorted: bool) -> Result<Vec<PathBuf>, FeatureError> {
    let dir_err = |source| FeatureError::RawDataDir {
        path: dir.to_path_buf(),
        source,
    };

    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(dir_err)? {
        let path = entry.map_err(dir_err)?.path();
        if path.is_file() {
            files.push(path);
        }
    }
    if sorted {
        files.sort();
    }
    Ok(files)
}

/// Feature extraction pipeline.
///
/// Pipeline stages per raw data file:
/// 1. RawSampleAdapter - Parse label and per-key readings
/// 2. StatisticsEngine - Normalize and compute mean, RMS, SDV
/// 3. KeyRegistry - Line statistics up with the canonical key order
/// 4. FeatureTableWriter - Append the row (header before the first one)
pub struct FeaturePipeline<A: RawSampleAdapter = CommaRecordAdapter> {
    config: PipelineConfig,
    adapter: A,
}

impl FeaturePipeline<CommaRecordAdapter> {
    /// Create a pipeline reading comma-separated records
    pub fn new(config: PipelineConfig) -> Self {
        let adapter = CommaRecordAdapter::new(config.key_field, config.value_field);
        Self::with_adapter(config, adapter)
    }
}

impl<A: RawSampleAdapter> FeaturePipeline<A> {
    /// Create a pipeline with a custom raw data adapter
    pub fn with_adapter(config: PipelineConfig, adapter: A) -> Self {
        Self { config, adapter }
    }

    /// Process the configured raw data directory into a new feature file
    pub fn run(&self) -> Result<RunSummary, FeatureError> {
        self.config.validate()?;
        let started_at = Utc::now();

        let files = list_raw_files(&self.config.raw_data_dir, self.config.sort_inputs)?;
        info!(
            "Processing {} raw data files from {}",
            files.len(),
            self.config.raw_data_dir.display()
        );

        fs::create_dir_all(&self.config.feature_dir)?;
        let (output_path, file) =
            create_unique_output(&self.config.feature_dir, &self.config.file_stem)?;
        info!("Feature File Path {}", output_path.display());

        let mut writer = FeatureTableWriter::new(file);
        let outcome = self
            .process_files(&files, &mut writer)
            .and_then(|outcome| writer.into_inner().map(|_| outcome));
        let outcome = match outcome {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(
                    "Abandoning feature file {}: {}",
                    output_path.display(),
                    e
                );
                return Err(e);
            }
        };

        if outcome.registry.is_none() {
            warn!(
                "No usable raw data files in {}; {} has no header",
                self.config.raw_data_dir.display(),
                output_path.display()
            );
        }
        info!(
            "Wrote {} rows to {} ({} files skipped)",
            outcome.rows_written,
            output_path.display(),
            outcome.skipped.len()
        );

        Ok(RunSummary {
            output_path,
            keys: outcome
                .registry
                .map(|r| r.keys().to_vec())
                .unwrap_or_default(),
            files_seen: files.len(),
            rows_written: outcome.rows_written,
            skipped: outcome.skipped,
            started_at,
            finished_at: Utc::now(),
        })
    }

    /// Feed raw data files, in order, into a feature table writer.
    ///
    /// File-scoped failures skip the file. Writer failures abort the batch.
    pub fn process_files<W: Write>(
        &self,
        files: &[PathBuf],
        writer: &mut FeatureTableWriter<W>,
    ) -> Result<BatchOutcome, FeatureError> {
        let mut canonical: Option<KeyRegistry> = None;
        let mut skipped = Vec::new();

        for path in files {
            let parsed = match self.adapter.parse_file(path) {
                Ok(parsed) => parsed,
                Err(e) if e.is_file_scoped() => {
                    warn!("Skipping {}: {}", path.display(), e);
                    skipped.push(SkippedFile {
                        path: path.clone(),
                        reason: e.to_string(),
                    });
                    continue;
                }
                Err(e) => return Err(e),
            };
            debug!(
                "Parsed {}: '{}', {} keys, {} samples",
                path.display(),
                parsed.classification,
                parsed.series.len(),
                parsed.series.sample_count()
            );

            let stats = StatisticsEngine::compute(&parsed.series);

            let registry = match canonical {
                Some(ref fixed) => fixed,
                None => {
                    let fixed = KeyRegistry::from_series(&parsed.series);
                    writer.write_header(&fixed)?;
                    info!(
                        "Fixed column order from {}: {} sensor keys",
                        path.display(),
                        fixed.len()
                    );
                    canonical.insert(fixed)
                }
            };

            let alignment = registry.align(&stats, parsed.series.keys());
            if !alignment.extra.is_empty() {
                warn!(
                    "{}: ignoring keys absent from the first file: {}",
                    path.display(),
                    alignment.extra.join(", ")
                );
            }

            let fill = if alignment.missing.is_empty() {
                None
            } else {
                let missing = alignment.missing.join(", ");
                match self.config.missing_keys {
                    MissingKeyPolicy::SkipRow => {
                        warn!("Skipping {}: missing keys {}", path.display(), missing);
                        skipped.push(SkippedFile {
                            path: path.clone(),
                            reason: format!("missing keys {missing}"),
                        });
                        continue;
                    }
                    MissingKeyPolicy::Nan => {
                        warn!("{}: missing keys {} written as NaN", path.display(), missing);
                        Some(KeyStats::nan())
                    }
                    MissingKeyPolicy::Zero => {
                        warn!("{}: missing keys {} written as 0", path.display(), missing);
                        Some(KeyStats::default())
                    }
                }
            };

            let row = FeatureRow {
                classification: parsed.classification,
                stats: alignment
                    .stats
                    .into_iter()
                    .map(|slot| slot.or(fill).unwrap_or_default())
                    .collect(),
            };
            writer.write_row(&row)?;
        }

        Ok(BatchOutcome {
            registry: canonical,
            rows_written: writer.rows_written(),
            skipped,
        })
    }

    /// Parse one raw data file and report its per-key statistics
    pub fn inspect_file(&self, path: &Path) -> Result<FileReport, FeatureError> {
        let parsed = self.adapter.parse_file(path)?;
        let stats = StatisticsEngine::compute(&parsed.series);

        let keys = parsed
            .series
            .iter()
            .map(|(key, readings)| {
                let s = stats.get(key).copied().unwrap_or_default();
                KeyReport {
                    key: key.to_string(),
                    count: readings.values.len(),
                    min: readings.min,
                    max: readings.max,
                    mean: s.mean,
                    rms: s.rms,
                    sdv: s.sdv,
                }
            })
            .collect();

        Ok(FileReport {
            path: path.to_path_buf(),
            classification: parsed.classification,
            keys,
        })
    }
}

//! Sensor Features - batch feature extraction from raw sensor recordings
//!
//! Converts a directory of raw per-sample sensor files into a single feature
//! CSV through a deterministic pipeline: raw file adaptation → normalization
//! → per-key statistics → feature table encoding.
//!
//! Every input file becomes one row holding its classification label and the
//! mean, RMS and standard deviation of each sensor key's normalized readings.
//! The column order is fixed by the first processed file and never changes.

pub mod adapters;
pub mod config;
pub mod encoder;
pub mod error;
pub mod features;
pub mod normalizer;
pub mod pipeline;
pub mod table;
pub mod types;

pub use adapters::{CommaRecordAdapter, ParsedFile, RawSampleAdapter};
pub use config::{MissingKeyPolicy, PipelineConfig};
pub use encoder::FeatureTableWriter;
pub use error::FeatureError;
pub use features::StatisticsEngine;
pub use pipeline::{run, FeaturePipeline, RunSummary};
pub use table::FeatureTable;
pub use types::{FeatureRow, KeyRegistry, KeyStats, RawSample, SensorSeries};

/// Crate version reported by the CLI
pub const FEATURES_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name reported by the CLI
pub const PRODUCER_NAME: &str = "sensor-features";

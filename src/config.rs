//! Pipeline configuration
//!
//! Defaults reproduce the fixed layout `Data/RawData/` → `Data/FeatureFiles/`.
//! Every field can be overridden from a JSON file or from the command line.

use crate::error::FeatureError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default directory holding raw data files
pub const DEFAULT_RAW_DATA_DIR: &str = "Data/RawData";

/// Default directory receiving feature files
pub const DEFAULT_FEATURE_DIR: &str = "Data/FeatureFiles";

/// Default feature file stem (`features_<N>.csv`)
pub const DEFAULT_FILE_STEM: &str = "features";

/// What to emit for a registry key that a later file does not supply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MissingKeyPolicy {
    /// Emit `NaN` for all three statistics
    #[default]
    Nan,
    /// Emit `0` for all three statistics
    Zero,
    /// Drop the whole row and report the file as skipped
    SkipRow,
}

impl MissingKeyPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            MissingKeyPolicy::Nan => "nan",
            MissingKeyPolicy::Zero => "zero",
            MissingKeyPolicy::SkipRow => "skip-row",
        }
    }
}

/// Settings for one pipeline run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Directory enumerated for raw data files
    pub raw_data_dir: PathBuf,
    /// Directory the feature file is created in
    pub feature_dir: PathBuf,
    /// Feature file name stem
    pub file_stem: String,
    /// Zero-based record field holding the sensor key
    pub key_field: usize,
    /// Zero-based record field holding the reading
    pub value_field: usize,
    /// Process raw files in file name order instead of directory order
    pub sort_inputs: bool,
    /// Handling of registry keys absent from a later file
    pub missing_keys: MissingKeyPolicy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            raw_data_dir: PathBuf::from(DEFAULT_RAW_DATA_DIR),
            feature_dir: PathBuf::from(DEFAULT_FEATURE_DIR),
            file_stem: DEFAULT_FILE_STEM.to_string(),
            key_field: 0,
            value_field: 2,
            sort_inputs: true,
            missing_keys: MissingKeyPolicy::default(),
        }
    }
}

impl PipelineConfig {
    /// Load configuration from JSON; absent fields keep their defaults
    pub fn from_json(json: &str) -> Result<Self, FeatureError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a JSON file
    pub fn from_json_file(path: &Path) -> Result<Self, FeatureError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Serialize configuration to JSON
    pub fn to_json(&self) -> Result<String, FeatureError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), FeatureError> {
        if self.key_field == self.value_field {
            return Err(FeatureError::Config(format!(
                "key_field and value_field must differ (both are {})",
                self.key_field
            )));
        }
        if self.file_stem.trim().is_empty() {
            return Err(FeatureError::Config("file_stem must not be empty".to_string()));
        }
        if self.file_stem.contains(['/', '\\']) {
            return Err(FeatureError::Config(format!(
                "file_stem must be a bare name, got '{}'",
                self.file_stem
            )));
        }
        Ok(())
    }
}

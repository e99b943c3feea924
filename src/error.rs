//! Error types for sensor feature extraction

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while extracting features
#[derive(Debug, Error)]
pub enum FeatureError {
    #[error("Cannot read raw data file {path}: {source}")]
    ReadRawFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path} line {line}: {reason}")]
    Parse {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("Cannot list raw data directory {path}: {source}")]
    RawDataDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Raw data file is empty: {0}")]
    EmptyFile(PathBuf),

    #[error("Raw data file has a classification but no samples: {0}")]
    NoSamples(PathBuf),

    #[error("Feature file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Feature file CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Feature writer misuse: {0}")]
    WriterState(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Malformed feature table: {0}")]
    MalformedTable(String),
}

impl FeatureError {
    /// True when the error only invalidates the raw file being processed.
    ///
    /// File-scoped errors are logged and the pipeline moves on to the next
    /// file; anything else abandons the run.
    pub fn is_file_scoped(&self) -> bool {
        matches!(
            self,
            FeatureError::ReadRawFile { .. }
                | FeatureError::Parse { .. }
                | FeatureError::EmptyFile(_)
                | FeatureError::NoSamples(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_scoped_classification() {
        let parse = FeatureError::Parse {
            path: PathBuf::from("Data/RawData/a.txt"),
            line: 3,
            reason: "invalid number 'abc'".to_string(),
        };
        assert!(parse.is_file_scoped());
        assert!(FeatureError::NoSamples(PathBuf::from("b.txt")).is_file_scoped());

        let write = FeatureError::Io(std::io::Error::new(
            std::io::ErrorKind::Other,
            "disk full",
        ));
        assert!(!write.is_file_scoped());
        assert!(!FeatureError::WriterState("header".to_string()).is_file_scoped());
    }

    #[test]
    fn test_parse_error_names_file_and_line() {
        let err = FeatureError::Parse {
            path: PathBuf::from("walk.txt"),
            line: 7,
            reason: "invalid number 'x'".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Failed to parse walk.txt line 7: invalid number 'x'"
        );
    }
}

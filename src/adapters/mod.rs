//! Raw data adapters
//!
//! This module provides adapters that read one raw data file and map it to a
//! classification label plus the per-key reading sequences of that file.

mod comma;

pub use comma::CommaRecordAdapter;

use crate::error::FeatureError;
use crate::types::SensorSeries;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Contents of one successfully parsed raw data file
#[derive(Debug, Clone)]
pub struct ParsedFile {
    /// Label from the first line, verbatim
    pub classification: String,
    pub series: SensorSeries,
}

/// Trait for raw data file adapters
pub trait RawSampleAdapter {
    /// Parse an already opened raw data stream.
    ///
    /// `source` only names the stream in error messages.
    fn parse_reader(&self, reader: &mut dyn BufRead, source: &Path)
        -> Result<ParsedFile, FeatureError>;

    /// Open and parse a raw data file
    fn parse_file(&self, path: &Path) -> Result<ParsedFile, FeatureError> {
        let file = File::open(path).map_err(|source| FeatureError::ReadRawFile {
            path: path.to_path_buf(),
            source,
        })?;
        let mut reader = BufReader::new(file);
        self.parse_reader(&mut reader, path)
    }
}

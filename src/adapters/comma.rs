//! Comma-separated raw sample adapter
//!
//! Layout handled:
//! ```text
//! walking
//! accel_x,1510000000123,1.0
//! accel_y,1510000000123,-0.25,extra,fields
//! ```
//! The first line is the classification label. Every later line is a record
//! whose key and value live at configurable field positions.

use super::{ParsedFile, RawSampleAdapter};
use crate::error::FeatureError;
use crate::types::{RawSample, SensorSeries};
use std::io::BufRead;
use std::path::Path;

/// Adapter for `<key>,<ignored>,<value>[,...]` records
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommaRecordAdapter {
    key_field: usize,
    value_field: usize,
}

impl Default for CommaRecordAdapter {
    fn default() -> Self {
        Self::new(0, 2)
    }
}

impl CommaRecordAdapter {
    pub fn new(key_field: usize, value_field: usize) -> Self {
        Self {
            key_field,
            value_field,
        }
    }

    /// Parse one record line into a sample
    fn parse_record(&self, line: &str) -> Result<RawSample, String> {
        let fields: Vec<&str> = line.split(',').collect();
        let needed = self.key_field.max(self.value_field) + 1;
        if fields.len() < needed {
            return Err(format!(
                "expected at least {} fields, found {}",
                needed,
                fields.len()
            ));
        }

        let key = fields[self.key_field].trim();
        if key.is_empty() {
            return Err("empty sensor key".to_string());
        }

        let token = fields[self.value_field].trim();
        let value: f64 = token
            .parse()
            .map_err(|_| format!("invalid number '{}'", token))?;
        if !value.is_finite() {
            return Err(format!("non-finite reading '{}'", token));
        }

        Ok(RawSample {
            key: key.to_string(),
            value,
        })
    }
}

impl RawSampleAdapter for CommaRecordAdapter {
    fn parse_reader(
        &self,
        reader: &mut dyn BufRead,
        source: &Path,
    ) -> Result<ParsedFile, FeatureError> {
        let read_err = |e: std::io::Error| FeatureError::ReadRawFile {
            path: source.to_path_buf(),
            source: e,
        };

        let mut lines = reader.lines();
        let classification = match lines.next() {
            Some(line) => line.map_err(read_err)?,
            None => return Err(FeatureError::EmptyFile(source.to_path_buf())),
        };

        let mut series = SensorSeries::new();
        for (idx, line) in lines.enumerate() {
            let line = line.map_err(read_err)?;
            if line.trim().is_empty() {
                continue;
            }
            // Records start on the second line of the file
            let sample = self.parse_record(&line).map_err(|reason| FeatureError::Parse {
                path: source.to_path_buf(),
                line: idx + 2,
                reason,
            })?;
            series.push(sample);
        }

        if series.is_empty() {
            return Err(FeatureError::NoSamples(source.to_path_buf()));
        }

        Ok(ParsedFile {
            classification,
            series,
        })
    }
}

//! Feature table encoding
//!
//! This module serializes feature rows into the feature CSV. Column layout:
//!
//! ```text
//! classification,{key}_avg...,{key}_rms...,{key}_sdv...
//! ```
//!
//! All mean columns come first, then all RMS columns, then all SDV columns,
//! each block in registry order. Every row is flushed as soon as it is written.

use crate::error::FeatureError;
use crate::types::{FeatureRow, KeyRegistry};
use std::io::Write;

/// Header of the label column
pub const CLASSIFICATION_COLUMN: &str = "classification";

/// Suffix of mean columns
pub const MEAN_SUFFIX: &str = "_avg";

/// Suffix of root-mean-square columns
pub const RMS_SUFFIX: &str = "_rms";

/// Suffix of standard deviation columns
pub const SDV_SUFFIX: &str = "_sdv";

/// Header cells for a registry, in column order
pub fn header_columns(registry: &KeyRegistry) -> Vec<String> {
    let keys = registry.keys();
    let mut columns = Vec::with_capacity(registry.column_count());
    columns.push(CLASSIFICATION_COLUMN.to_string());
    for suffix in [MEAN_SUFFIX, RMS_SUFFIX, SDV_SUFFIX] {
        columns.extend(keys.iter().map(|key| format!("{key}{suffix}")));
    }
    columns
}

/// Render a statistic as shortest round-trippable decimal text
pub fn format_value(value: f64) -> String {
    value.to_string()
}

/// Render a classification label.
///
/// Labels are copied verbatim unless they would break the row: a delimiter,
/// a line break or a leading quote forces a quoted field.
pub fn label_cell(label: &str) -> String {
    let breaks_row = label.contains([',', '\n', '\r']) || label.starts_with('"');
    if breaks_row {
        format!("\"{}\"", label.replace('"', "\"\""))
    } else {
        label.to_string()
    }
}

/// Data cells for a row, in column order
pub fn row_cells(row: &FeatureRow) -> Vec<String> {
    let mut cells = Vec::with_capacity(1 + 3 * row.stats.len());
    cells.push(label_cell(&row.classification));
    cells.extend(row.stats.iter().map(|s| format_value(s.mean)));
    cells.extend(row.stats.iter().map(|s| format_value(s.rms)));
    cells.extend(row.stats.iter().map(|s| format_value(s.sdv)));
    cells
}

/// Writer for a single feature table stream
pub struct FeatureTableWriter<W: Write> {
    csv: csv::Writer<W>,
    columns: Option<usize>,
    rows_written: usize,
}

impl<W: Write> FeatureTableWriter<W> {
    /// Wrap an output stream
    pub fn new(sink: W) -> Self {
        let csv = csv::WriterBuilder::new()
            .has_headers(false)
            .quote_style(csv::QuoteStyle::Never)
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(sink);
        Self {
            csv,
            columns: None,
            rows_written: 0,
        }
    }

    /// Write the header row. Must be called exactly once, before any row.
    pub fn write_header(&mut self, registry: &KeyRegistry) -> Result<(), FeatureError> {
        if self.columns.is_some() {
            return Err(FeatureError::WriterState(
                "header already written".to_string(),
            ));
        }
        let columns = header_columns(registry);
        self.csv.write_record(&columns)?;
        self.csv.flush()?;
        self.columns = Some(columns.len());
        Ok(())
    }

    /// Write one data row and flush it
    pub fn write_row(&mut self, row: &FeatureRow) -> Result<(), FeatureError> {
        let expected = self.columns.ok_or_else(|| {
            FeatureError::WriterState("row written before header".to_string())
        })?;
        let cells = row_cells(row);
        if cells.len() != expected {
            return Err(FeatureError::WriterState(format!(
                "row for '{}' has {} columns, header has {}",
                row.classification,
                cells.len(),
                expected
            )));
        }
        self.csv.write_record(&cells)?;
        self.csv.flush()?;
        self.rows_written += 1;
        Ok(())
    }

    pub fn rows_written(&self) -> usize {
        self.rows_written
    }

    /// Flush and return the underlying stream
    pub fn into_inner(self) -> Result<W, FeatureError> {
        self.csv
            .into_inner()
            .map_err(|e| FeatureError::Io(e.into_error()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::KeyStats;
    use pretty_assertions::assert_eq;

    fn stats(mean: f64, rms: f64, sdv: f64) -> KeyStats {
        KeyStats { mean, rms, sdv }
    }

    #[test]
    fn test_header_layout() {
        let registry = KeyRegistry::from_keys(["accel_x", "accel_y"]);
        let mut writer = FeatureTableWriter::new(Vec::new());
        writer.write_header(&registry).unwrap();
        let out = String::from_utf8(writer.into_inner().unwrap()).unwrap();
        assert_eq!(
            out,
            "classification,accel_x_avg,accel_y_avg,accel_x_rms,accel_y_rms,accel_x_sdv,accel_y_sdv\n"
        );
    }

    #[test]
    fn test_rows_follow_header_layout() {
        let registry = KeyRegistry::from_keys(["a", "b"]);
        let mut writer = FeatureTableWriter::new(Vec::new());
        writer.write_header(&registry).unwrap();
        writer
            .write_row(&FeatureRow {
                classification: "walking".to_string(),
                stats: vec![stats(0.5, 0.75, 0.25), stats(0.0, 0.0, 0.0)],
            })
            .unwrap();
        writer
            .write_row(&FeatureRow {
                classification: "running".to_string(),
                stats: vec![stats(0.1, 0.2, 0.3), KeyStats::nan()],
            })
            .unwrap();
        assert_eq!(writer.rows_written(), 2);

        let out = String::from_utf8(writer.into_inner().unwrap()).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[1], "walking,0.5,0,0.75,0,0.25,0");
        assert_eq!(lines[2], "running,0.1,NaN,0.2,NaN,0.3,NaN");
        assert!(!out.contains(",\n"));
    }

    #[test]
    fn test_values_round_trip() {
        let value = (1.25f64 / 3.0).sqrt();
        let text = format_value(value);
        assert_eq!(text.parse::<f64>().unwrap(), value);
    }

    #[test]
    fn test_label_with_comma_is_quoted() {
        let registry = KeyRegistry::from_keys(["k"]);
        let mut writer = FeatureTableWriter::new(Vec::new());
        writer.write_header(&registry).unwrap();
        writer
            .write_row(&FeatureRow {
                classification: "sit, then stand".to_string(),
                stats: vec![stats(0.5, 0.5, 0.0)],
            })
            .unwrap();
        let out = String::from_utf8(writer.into_inner().unwrap()).unwrap();
        assert!(out.ends_with("\"sit, then stand\",0.5,0.5,0\n"));
    }

    #[test]
    fn test_label_with_quotes_is_verbatim() {
        let registry = KeyRegistry::from_keys(["k"]);
        let mut writer = FeatureTableWriter::new(Vec::new());
        writer.write_header(&registry).unwrap();
        writer
            .write_row(&FeatureRow {
                classification: "  walking \"fast\" ".to_string(),
                stats: vec![stats(0.5, 0.5, 0.0)],
            })
            .unwrap();
        let out = String::from_utf8(writer.into_inner().unwrap()).unwrap();
        assert_eq!(out.lines().nth(1), Some("  walking \"fast\" ,0.5,0.5,0"));
    }

    #[test]
    fn test_label_cell() {
        assert_eq!(label_cell("walking"), "walking");
        assert_eq!(label_cell("say \"hi\""), "say \"hi\"");
        assert_eq!(label_cell("a,b"), "\"a,b\"");
        assert_eq!(label_cell("\"lead"), "\"\"\"lead\"");
        assert_eq!(label_cell("a,\"b\""), "\"a,\"\"b\"\"\"");
    }

    #[test]
    fn test_row_before_header_rejected() {
        let mut writer = FeatureTableWriter::new(Vec::new());
        let err = writer
            .write_row(&FeatureRow {
                classification: "x".to_string(),
                stats: vec![],
            })
            .unwrap_err();
        assert!(matches!(err, FeatureError::WriterState(_)));
    }

    #[test]
    fn test_header_twice_rejected() {
        let registry = KeyRegistry::from_keys(["k"]);
        let mut writer = FeatureTableWriter::new(Vec::new());
        writer.write_header(&registry).unwrap();
        assert!(matches!(
            writer.write_header(&registry),
            Err(FeatureError::WriterState(_))
        ));
        let out = String::from_utf8(writer.into_inner().unwrap()).unwrap();
        assert_eq!(out.lines().count(), 1);
    }

    #[test]
    fn test_column_mismatch_rejected() {
        let registry = KeyRegistry::from_keys(["a", "b"]);
        let mut writer = FeatureTableWriter::new(Vec::new());
        writer.write_header(&registry).unwrap();
        let err = writer
            .write_row(&FeatureRow {
                classification: "short".to_string(),
                stats: vec![stats(0.0, 0.0, 0.0)],
            })
            .unwrap_err();
        assert!(matches!(err, FeatureError::WriterState(_)));
        assert_eq!(writer.rows_written(), 0);
    }
}

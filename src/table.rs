//! Feature table reading
//!
//! Reads a feature CSV back, recovering the key order from its header and
//! checking that every row carries the header's column count.

use crate::encoder::{CLASSIFICATION_COLUMN, MEAN_SUFFIX, RMS_SUFFIX, SDV_SUFFIX};
use crate::error::FeatureError;
use crate::types::{FeatureRow, KeyRegistry, KeyStats};
use serde::Serialize;
use std::io::Read;
use std::path::Path;

/// A feature table loaded from disk
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureTable {
    pub registry: KeyRegistry,
    pub rows: Vec<FeatureRow>,
}

impl FeatureTable {
    /// Read a feature table from a file
    pub fn from_path(path: &Path) -> Result<Self, FeatureError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    /// Read a feature table from any stream
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, FeatureError> {
        let mut csv = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let header: Vec<String> = csv.headers()?.iter().map(str::to_string).collect();
        if header.is_empty() {
            // A run over a directory with no usable files leaves an empty file
            return Ok(Self {
                registry: KeyRegistry::from_keys(Vec::<String>::new()),
                rows: Vec::new(),
            });
        }
        let registry = registry_from_header(&header)?;
        let k = registry.len();

        let mut rows = Vec::new();
        for (idx, record) in csv.records().enumerate() {
            let record = record?;
            if record.len() != header.len() {
                return Err(FeatureError::MalformedTable(format!(
                    "row {} has {} columns, header has {}",
                    idx + 1,
                    record.len(),
                    header.len()
                )));
            }

            let values = record
                .iter()
                .skip(1)
                .map(|cell| {
                    cell.parse::<f64>().map_err(|_| {
                        FeatureError::MalformedTable(format!(
                            "row {}: '{}' is not a number",
                            idx + 1,
                            cell
                        ))
                    })
                })
                .collect::<Result<Vec<f64>, _>>()?;

            let stats = (0..k)
                .map(|i| KeyStats {
                    mean: values[i],
                    rms: values[k + i],
                    sdv: values[2 * k + i],
                })
                .collect();

            rows.push(FeatureRow {
                classification: record.get(0).unwrap_or_default().to_string(),
                stats,
            });
        }

        Ok(Self { registry, rows })
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

/// Recover the key order from a header, checking its three-block layout
fn registry_from_header(header: &[String]) -> Result<KeyRegistry, FeatureError> {
    match header.first() {
        Some(first) if first == CLASSIFICATION_COLUMN => {}
        _ => {
            return Err(FeatureError::MalformedTable(format!(
                "first column must be '{}'",
                CLASSIFICATION_COLUMN
            )))
        }
    }

    let feature_columns = &header[1..];
    if feature_columns.len() % 3 != 0 {
        return Err(FeatureError::MalformedTable(format!(
            "{} feature columns is not a multiple of 3",
            feature_columns.len()
        )));
    }
    let k = feature_columns.len() / 3;

    let keys = block_keys(&feature_columns[..k], MEAN_SUFFIX)?;
    for (block, suffix) in [(1, RMS_SUFFIX), (2, SDV_SUFFIX)] {
        let other = block_keys(&feature_columns[block * k..(block + 1) * k], suffix)?;
        if other != keys {
            return Err(FeatureError::MalformedTable(format!(
                "{} columns are not in the same key order as {} columns",
                suffix, MEAN_SUFFIX
            )));
        }
    }

    Ok(KeyRegistry::from_keys(keys))
}

fn block_keys(columns: &[String], suffix: &str) -> Result<Vec<String>, FeatureError> {
    columns
        .iter()
        .map(|column| {
            column
                .strip_suffix(suffix)
                .map(str::to_string)
                .ok_or_else(|| {
                    FeatureError::MalformedTable(format!(
                        "column '{}' should end with '{}'",
                        column, suffix
                    ))
                })
        })
        .collect()
}

//! Core types for the feature extraction pipeline
//!
//! This module defines the data structures that flow through each stage of the
//! pipeline: parsed samples, per-file sensor series, per-key statistics, the
//! canonical key registry and the aligned feature row.

use serde::Serialize;
use std::collections::HashMap;

/// A single reading parsed from one record line of a raw data file
#[derive(Debug, Clone, PartialEq)]
pub struct RawSample {
    pub key: String,
    pub value: f64,
}

/// Readings for one sensor key within one raw data file
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeyReadings {
    /// Readings in file line order
    pub values: Vec<f64>,
    /// Smallest reading seen in this file
    pub min: f64,
    /// Largest reading seen in this file
    pub max: f64,
}

impl KeyReadings {
    fn first(value: f64) -> Self {
        Self {
            values: vec![value],
            min: value,
            max: value,
        }
    }

    fn push(&mut self, value: f64) {
        self.values.push(value);
        if value < self.min {
            self.min = value;
        }
        if value > self.max {
            self.max = value;
        }
    }
}

/// Per-key reading sequences collected from exactly one raw data file.
///
/// Keys iterate in the order they first appear in the file.
#[derive(Debug, Clone, Default)]
pub struct SensorSeries {
    keys: Vec<String>,
    index: HashMap<String, usize>,
    readings: Vec<KeyReadings>,
}

impl SensorSeries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a sample, updating the running min/max for its key
    pub fn push(&mut self, sample: RawSample) {
        match self.index.get(&sample.key) {
            Some(&slot) => self.readings[slot].push(sample.value),
            None => {
                self.index.insert(sample.key.clone(), self.keys.len());
                self.keys.push(sample.key);
                self.readings.push(KeyReadings::first(sample.value));
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&KeyReadings> {
        self.index.get(key).map(|&slot| &self.readings[slot])
    }

    /// Keys in first-appearance order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.keys.iter().map(String::as_str)
    }

    /// Keys and their readings in first-appearance order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &KeyReadings)> {
        self.keys.iter().map(String::as_str).zip(self.readings.iter())
    }

    /// Number of distinct keys
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Total number of readings across all keys
    pub fn sample_count(&self) -> usize {
        self.readings.iter().map(|r| r.values.len()).sum()
    }
}

/// Aggregate statistics for one key, computed over normalized readings
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct KeyStats {
    pub mean: f64,
    pub rms: f64,
    pub sdv: f64,
}

impl KeyStats {
    /// Statistics of a key with no readings (0/0 in every column)
    pub fn nan() -> Self {
        Self {
            mean: f64::NAN,
            rms: f64::NAN,
            sdv: f64::NAN,
        }
    }
}

/// Statistics for every key of one file
pub type StatsByKey = HashMap<String, KeyStats>;

/// Canonical, ordered sensor key list shared by the header and every row.
///
/// Built once from the first successfully parsed file and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyRegistry {
    keys: Vec<String>,
}

/// Result of lining a file's statistics up against the registry
#[derive(Debug, Clone, PartialEq)]
pub struct Alignment {
    /// One slot per registry key, in registry order
    pub stats: Vec<Option<KeyStats>>,
    /// Registry keys the file did not supply
    pub missing: Vec<String>,
    /// Keys the file supplied that the registry does not know
    pub extra: Vec<String>,
}

impl KeyRegistry {
    /// Fix the canonical key order from the first processed file
    pub fn from_series(series: &SensorSeries) -> Self {
        Self {
            keys: series.keys().map(str::to_string).collect(),
        }
    }

    pub fn from_keys<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keys: keys.into_iter().map(Into::into).collect(),
        }
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Number of CSV columns a row carries, classification included
    pub fn column_count(&self) -> usize {
        1 + 3 * self.keys.len()
    }

    /// Line up per-key statistics in registry order.
    ///
    /// `order` supplies the file's own key order so that `extra` is reported
    /// deterministically.
    pub fn align<'a>(
        &self,
        stats: &StatsByKey,
        order: impl IntoIterator<Item = &'a str>,
    ) -> Alignment {
        let mut missing = Vec::new();
        let slots = self
            .keys
            .iter()
            .map(|key| {
                let found = stats.get(key).copied();
                if found.is_none() {
                    missing.push(key.clone());
                }
                found
            })
            .collect();

        let extra = order
            .into_iter()
            .filter(|key| !self.keys.iter().any(|k| k == key))
            .map(str::to_string)
            .collect();

        Alignment {
            stats: slots,
            missing,
            extra,
        }
    }
}

/// One output row: a classification and one stats triple per registry key
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureRow {
    pub classification: String,
    pub stats: Vec<KeyStats>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(key: &str, value: f64) -> RawSample {
        RawSample {
            key: key.to_string(),
            value,
        }
    }

    #[test]
    fn test_series_tracks_min_max_per_key() {
        let mut series = SensorSeries::new();
        series.push(sample("accel_x", 2.0));
        series.push(sample("accel_y", -1.0));
        series.push(sample("accel_x", 5.0));
        series.push(sample("accel_x", 1.0));

        let x = series.get("accel_x").unwrap();
        assert_eq!(x.values, vec![2.0, 5.0, 1.0]);
        assert_eq!(x.min, 1.0);
        assert_eq!(x.max, 5.0);

        let y = series.get("accel_y").unwrap();
        assert_eq!(y.min, -1.0);
        assert_eq!(y.max, -1.0);
        assert_eq!(series.sample_count(), 4);
    }

    #[test]
    fn test_series_keeps_first_appearance_order() {
        let mut series = SensorSeries::new();
        for key in ["gyro_z", "accel_x", "gyro_z", "baro"] {
            series.push(sample(key, 0.0));
        }
        let keys: Vec<&str> = series.keys().collect();
        assert_eq!(keys, vec!["gyro_z", "accel_x", "baro"]);
        assert_eq!(series.len(), 3);
    }

    #[test]
    fn test_registry_align_reports_missing_and_extra() {
        let registry = KeyRegistry::from_keys(["A", "B"]);
        let mut stats = StatsByKey::new();
        stats.insert(
            "A".to_string(),
            KeyStats {
                mean: 0.5,
                rms: 0.6,
                sdv: 0.4,
            },
        );
        stats.insert("C".to_string(), KeyStats::default());

        let alignment = registry.align(&stats, ["C", "A"]);
        assert_eq!(alignment.stats.len(), 2);
        assert_eq!(alignment.stats[0].map(|s| s.mean), Some(0.5));
        assert!(alignment.stats[1].is_none());
        assert_eq!(alignment.missing, vec!["B".to_string()]);
        assert_eq!(alignment.extra, vec!["C".to_string()]);
    }

    #[test]
    fn test_column_count() {
        let registry = KeyRegistry::from_keys(["A", "B", "C"]);
        assert_eq!(registry.column_count(), 10);
        assert_eq!(KeyRegistry::from_keys(Vec::<String>::new()).column_count(), 1);
    }
}

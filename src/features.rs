//! Feature derivation
//!
//! This module derives the per-key statistics written to the feature table:
//! - mean of normalized readings
//! - root-mean-square of normalized readings
//! - population standard deviation of normalized readings

use crate::normalizer::Normalizer;
use crate::types::{KeyReadings, KeyStats, SensorSeries, StatsByKey};

/// Statistics engine for computing per-key features of one file
pub struct StatisticsEngine;

impl StatisticsEngine {
    /// Compute mean, RMS and standard deviation for every key of a series
    pub fn compute(series: &SensorSeries) -> StatsByKey {
        series
            .iter()
            .map(|(key, readings)| (key.to_string(), Self::compute_key(readings)))
            .collect()
    }

    /// Compute the statistics of a single key.
    ///
    /// Sums run in reading order. The deviation pass reuses the finished mean.
    pub fn compute_key(readings: &KeyReadings) -> KeyStats {
        let n = readings.values.len();
        if n == 0 {
            return KeyStats::nan();
        }
        let n = n as f64;

        let mut sum = 0.0;
        let mut sum_sq = 0.0;
        for v in Normalizer::normalize(readings) {
            sum += v;
            sum_sq += v * v;
        }
        let mean = sum / n;
        let rms = (sum_sq / n).sqrt();

        let dev_sq: f64 = Normalizer::normalize(readings)
            .map(|v| (v - mean) * (v - mean))
            .sum();
        let sdv = (dev_sq / n).sqrt();

        KeyStats { mean, rms, sdv }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RawSample;

    fn series_of(key: &str, values: &[f64]) -> SensorSeries {
        let mut series = SensorSeries::new();
        for &value in values {
            series.push(RawSample {
                key: key.to_string(),
                value,
            });
        }
        series
    }

    #[test]
    fn test_walking_accel_x_scenario() {
        let series = series_of("accel_x", &[1.0, 2.0, 3.0]);
        let stats = StatisticsEngine::compute(&series);
        let x = stats["accel_x"];

        // normalized [0.0, 0.5, 1.0]
        assert!((x.mean - 0.5).abs() < 1e-12);
        assert!((x.rms - (1.25f64 / 3.0).sqrt()).abs() < 1e-12);
        assert!((x.rms - 0.6455).abs() < 1e-4);
        assert!((x.sdv - (0.5f64 / 3.0).sqrt()).abs() < 1e-12);
        assert!((x.sdv - 0.4082).abs() < 1e-4);
    }

    #[test]
    fn test_constant_readings_are_all_zero() {
        let series = series_of("baro", &[1013.2, 1013.2, 1013.2, 1013.2]);
        let stats = StatisticsEngine::compute(&series);
        assert_eq!(stats["baro"], KeyStats::default());
    }

    #[test]
    fn test_single_reading() {
        let series = series_of("temp", &[36.6]);
        let stats = StatisticsEngine::compute(&series);
        assert_eq!(stats["temp"], KeyStats::default());
    }

    #[test]
    fn test_population_divisor() {
        // normalized [0, 1]: mean 0.5, population sdv 0.5 (sample sdv would be ~0.707)
        let series = series_of("k", &[-2.0, 2.0]);
        let stats = StatisticsEngine::compute(&series)["k"];
        assert_eq!(stats.mean, 0.5);
        assert_eq!(stats.sdv, 0.5);
        assert!((stats.rms - 0.5f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_statistics_within_unit_interval() {
        let samples = [
            &[0.3, 9.1, -4.0, 2.2, 2.2, 7.7][..],
            &[100.0, 100.5, 99.5][..],
            &[-1e6, 1e6, 0.0, 5.0][..],
            &[0.0, 0.0, 0.0, 1.0][..],
        ];
        for values in samples {
            let stats = StatisticsEngine::compute(&series_of("k", values))["k"];
            for v in [stats.mean, stats.rms, stats.sdv] {
                assert!((0.0..=1.0).contains(&v), "{v} out of range for {values:?}");
            }
        }
    }

    #[test]
    fn test_skewed_readings() {
        let stats = StatisticsEngine::compute(&series_of("k", &[0.0, 0.0, 0.0, 1.0]))["k"];
        assert_eq!(stats.mean, 0.25);
        assert_eq!(stats.rms, 0.5);
        assert!((stats.sdv - 0.1875f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_keys_are_independent() {
        let mut series = series_of("a", &[0.0, 10.0]);
        series.push(RawSample {
            key: "b".to_string(),
            value: 5.0,
        });
        let stats = StatisticsEngine::compute(&series);
        assert_eq!(stats.len(), 2);
        assert_eq!(stats["a"].mean, 0.5);
        assert_eq!(stats["b"], KeyStats::default());
    }
}

//! Reading normalization
//!
//! Readings are rescaled to 0-1 using the min/max observed for the same key in
//! the same file. A key whose readings are all equal normalizes to 0.

use crate::types::KeyReadings;

/// Rescale `value` into 0-1 against the observed `min`/`max`
pub fn normalize_value(value: f64, min: f64, max: f64) -> f64 {
    if max == min {
        0.0
    } else {
        (value - min) / (max - min)
    }
}

/// Normalizer for a key's reading sequence
pub struct Normalizer;

impl Normalizer {
    /// Normalized readings of one key, in reading order
    pub fn normalize(readings: &KeyReadings) -> impl Iterator<Item = f64> + '_ {
        readings
            .values
            .iter()
            .map(move |&v| normalize_value(v, readings.min, readings.max))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{RawSample, SensorSeries};

    #[test]
    fn test_normalize_value_endpoints() {
        assert_eq!(normalize_value(1.0, 1.0, 3.0), 0.0);
        assert_eq!(normalize_value(2.0, 1.0, 3.0), 0.5);
        assert_eq!(normalize_value(3.0, 1.0, 3.0), 1.0);
        assert_eq!(normalize_value(-5.0, -10.0, 0.0), 0.5);
    }

    #[test]
    fn test_zero_range_normalizes_to_zero() {
        assert_eq!(normalize_value(4.2, 4.2, 4.2), 0.0);
    }

    #[test]
    fn test_normalized_readings_within_unit_interval() {
        let mut series = SensorSeries::new();
        for v in [9.81, -3.2, 0.0, 15.7, 2.2, -3.2, 15.7] {
            series.push(RawSample {
                key: "accel_z".to_string(),
                value: v,
            });
        }
        let readings = series.get("accel_z").unwrap();
        let normalized: Vec<f64> = Normalizer::normalize(readings).collect();

        assert_eq!(normalized.len(), 7);
        assert!(normalized.iter().all(|n| (0.0..=1.0).contains(n)));
        assert_eq!(normalized[1], 0.0);
        assert_eq!(normalized[3], 1.0);
    }
}

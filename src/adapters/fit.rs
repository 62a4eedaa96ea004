//! FIT recording adapter
//!
//! Decodes FIT activity files and maps `record` messages to raw samples.

use crate::error::PipelineError;
use crate::types::RawSample;
use chrono::Utc;
use fitparser::profile::MesgNum;
use fitparser::Value;

use super::RecordAdapter;

/// Degrees per semicircle (2^31 semicircles = 180 degrees)
const DEGREES_PER_SEMICIRCLE: f64 = 180.0 / 2_147_483_648.0;

/// FIT file adapter
pub struct FitAdapter;

impl RecordAdapter for FitAdapter {
    fn parse(&self, bytes: &[u8]) -> Result<Vec<RawSample>, PipelineError> {
        let records =
            fitparser::de::from_bytes(bytes).map_err(|e| PipelineError::FitParse(e.to_string()))?;

        let mut samples = Vec::new();
        for record in records {
            if record.kind() != MesgNum::Record {
                continue;
            }

            let mut row = FieldRow::default();
            for field in record.fields() {
                row.apply(field.name(), field.units(), field.value());
            }
            samples.push(row.into_sample());
        }

        tracing::debug!(samples = samples.len(), "decoded FIT record messages");
        Ok(samples)
    }
}

/// Fields of one record message. Enhanced fields win over their legacy twins.
#[derive(Default)]
struct FieldRow {
    sample: RawSample,
    enhanced_distance: bool,
    enhanced_altitude: bool,
}

impl FieldRow {
    fn apply(&mut self, name: &str, units: &str, value: &Value) {
        match name {
            "timestamp" => {
                if let Value::Timestamp(ts) = value {
                    self.sample.timestamp = Some(ts.with_timezone(&Utc));
                }
            }
            "enhanced_distance" => {
                if let Some(v) = value_to_f64(value) {
                    self.sample.distance = Some(v);
                    self.enhanced_distance = true;
                }
            }
            "distance" if !self.enhanced_distance => {
                self.sample.distance = value_to_f64(value).or(self.sample.distance);
            }
            "enhanced_altitude" => {
                if let Some(v) = value_to_f64(value) {
                    self.sample.altitude = Some(v);
                    self.enhanced_altitude = true;
                }
            }
            "altitude" if !self.enhanced_altitude => {
                self.sample.altitude = value_to_f64(value).or(self.sample.altitude);
            }
            "heart_rate" => self.sample.heart_rate = value_to_f64(value),
            "cadence" => self.sample.cadence = value_to_f64(value),
            "position_lat" => self.sample.position_lat = position_degrees(value, units),
            "position_long" => self.sample.position_long = position_degrees(value, units),
            _ => {}
        }
    }

    fn into_sample(self) -> RawSample {
        self.sample
    }
}

fn position_degrees(value: &Value, units: &str) -> Option<f64> {
    let raw = value_to_f64(value)?;
    if units == "semicircles" {
        Some(semicircles_to_degrees(raw))
    } else {
        Some(raw)
    }
}

pub(crate) fn semicircles_to_degrees(semicircles: f64) -> f64 {
    semicircles * DEGREES_PER_SEMICIRCLE
}

pub(crate) fn value_to_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Float32(v) => Some(*v as f64),
        Value::Float64(v) => Some(*v),
        Value::SInt8(v) => Some(*v as f64),
        Value::UInt8(v) => Some(*v as f64),
        Value::UInt8z(v) => Some(*v as f64),
        Value::Byte(v) => Some(*v as f64),
        Value::SInt16(v) => Some(*v as f64),
        Value::UInt16(v) => Some(*v as f64),
        Value::UInt16z(v) => Some(*v as f64),
        Value::SInt32(v) => Some(*v as f64),
        Value::UInt32(v) => Some(*v as f64),
        Value::UInt32z(v) => Some(*v as f64),
        Value::SInt64(v) => Some(*v as f64),
        Value::UInt64(v) => Some(*v as f64),
        Value::UInt64z(v) => Some(*v as f64),
        Value::Array(values) => values.iter().find_map(value_to_f64),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_semicircles_to_degrees() {
        let degrees = semicircles_to_degrees(2_147_483_648.0);
        assert!((degrees - 180.0).abs() < 1e-12);
        // roughly Lisbon
        let lat = semicircles_to_degrees(460_000_000.0);
        assert!((lat - 38.557).abs() < 0.001);
    }

    #[test]
    fn test_enhanced_fields_take_precedence() {
        let mut row = FieldRow::default();
        row.apply("enhanced_distance", "m", &Value::Float64(1200.5));
        row.apply("distance", "m", &Value::Float64(1200.0));
        row.apply("altitude", "m", &Value::Float64(80.0));
        row.apply("enhanced_altitude", "m", &Value::Float64(81.2));
        row.apply("heart_rate", "bpm", &Value::UInt8(151));
        let sample = row.into_sample();

        assert_eq!(sample.distance, Some(1200.5));
        assert_eq!(sample.altitude, Some(81.2));
        assert_eq!(sample.heart_rate, Some(151.0));
        assert!(sample.timestamp.is_none());
    }

    #[test]
    fn test_value_conversion() {
        assert_eq!(value_to_f64(&Value::UInt16(42)), Some(42.0));
        assert_eq!(
            value_to_f64(&Value::Array(vec![Value::String("x".into()), Value::SInt32(-7)])),
            Some(-7.0)
        );
        assert_eq!(value_to_f64(&Value::String("n/a".into())), None);
    }

    #[test]
    fn test_garbage_bytes_rejected() {
        let result = FitAdapter.parse(b"definitely not a fit file");
        assert!(matches!(result, Err(PipelineError::FitParse(_))));
    }
}

//! Core types for the runflux pipeline
//!
//! This module defines the records that flow through the cleaning pipeline:
//! raw device samples in, enriched samples out, plus the advisory diagnostics
//! collected along the way and the table payloads handed to consumers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One timestamped telemetry reading as decoded from the recording.
///
/// `timestamp` and `distance` are optional here because the decoder reports
/// whatever the device wrote; the pipeline rejects samples missing either.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawSample {
    /// Sample instant (UTC)
    pub timestamp: Option<DateTime<Utc>>,
    /// Cumulative distance (meters)
    pub distance: Option<f64>,
    /// Altitude (meters)
    #[serde(default)]
    pub altitude: Option<f64>,
    /// Heart rate (bpm)
    #[serde(default)]
    pub heart_rate: Option<f64>,
    /// Cadence (steps/min)
    #[serde(default)]
    pub cadence: Option<f64>,
    /// Latitude (degrees)
    #[serde(default)]
    pub position_lat: Option<f64>,
    /// Longitude (degrees)
    #[serde(default)]
    pub position_long: Option<f64>,
}

impl RawSample {
    /// Sample with only the required base fields set
    pub fn new(timestamp: DateTime<Utc>, distance: f64) -> Self {
        Self {
            timestamp: Some(timestamp),
            distance: Some(distance),
            ..Default::default()
        }
    }
}

/// A surviving sample with its derived motion metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedSample {
    pub timestamp: DateTime<Utc>,
    /// Cumulative distance (meters)
    pub distance: f64,
    pub altitude: f64,
    pub heart_rate: f64,
    pub cadence: f64,
    pub position_lat: Option<f64>,
    pub position_long: Option<f64>,
    /// Instantaneous speed after local outlier suppression (m/s)
    pub speed_calculated: f64,
    /// `speed_calculated` in km/h
    pub speed_kmh: f64,
    /// Long-window smoothed speed (km/h, never negative)
    pub speed_smoothed: f64,
    /// Minutes per kilometer; absent when `speed_smoothed` is zero
    pub pace_min_km: Option<f64>,
    pub distance_km: f64,
    /// Altitude change per kilometer travelled (m/km)
    pub inclination: f64,
}

impl From<&EnrichedSample> for RawSample {
    fn from(sample: &EnrichedSample) -> Self {
        Self {
            timestamp: Some(sample.timestamp),
            distance: Some(sample.distance),
            altitude: Some(sample.altitude),
            heart_rate: Some(sample.heart_rate),
            cadence: Some(sample.cadence),
            position_lat: sample.position_lat,
            position_long: sample.position_long,
        }
    }
}

/// Column names of the enriched table, in output order
pub const ENRICHED_COLUMNS: [&str; 13] = [
    "timestamp",
    "distance",
    "altitude",
    "heart_rate",
    "cadence",
    "position_lat",
    "position_long",
    "speed_calculated",
    "speed_kmh",
    "speed_smoothed",
    "pace_min_km",
    "distance_km",
    "inclination",
];

/// Pipeline stage that raised a diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    InstantSpeed,
    ShortSmoothing,
    LongSmoothing,
    OutlierFilter,
}

/// Advisory condition raised while cleaning. Never aborts the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// Too few samples for a window or bound to be computed meaningfully
    InsufficientData {
        stage: Stage,
        column: Option<String>,
        samples: usize,
    },
    /// Negative smoothed speeds clamped to zero
    NegativeValueCorrected { count: usize },
    /// Rows left without a pace after interpolation
    NullAfterInterpolation { count: usize },
    /// Samples dropped because time did not advance since the previous one
    NonIncreasingTimestamp { count: usize },
}

impl Diagnostic {
    /// Log the diagnostic for the operator and record it
    pub fn emit(self, sink: &mut Vec<Diagnostic>) {
        match &self {
            Diagnostic::InsufficientData {
                stage,
                column,
                samples,
            } => tracing::warn!(
                ?stage,
                column = column.as_deref().unwrap_or("-"),
                samples,
                "insufficient data, degrading to partial output"
            ),
            Diagnostic::NegativeValueCorrected { count } => {
                tracing::warn!(count, "negative values in speed_smoothed corrected to 0")
            }
            Diagnostic::NullAfterInterpolation { count } => {
                tracing::warn!(count, "null values in pace_min_km after interpolation")
            }
            Diagnostic::NonIncreasingTimestamp { count } => {
                tracing::warn!(count, "samples without time progress dropped")
            }
        }
        sink.push(self);
    }
}

/// Outcome summary of one pipeline run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CleaningReport {
    pub raw_samples: usize,
    pub enriched_samples: usize,
    pub diagnostics: Vec<Diagnostic>,
}

/// Enriched samples together with the report of the run that produced them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleanedActivity {
    pub samples: Vec<EnrichedSample>,
    pub report: CleaningReport,
}

impl CleanedActivity {
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Producer metadata attached to encoded tables
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableProducer {
    pub name: String,
    pub version: String,
    pub instance_id: String,
}

/// Where the table came from
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableProvenance {
    pub source_format: String,
    pub computed_at_utc: String,
}

/// Row-oriented enriched table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityTable {
    pub producer: TableProducer,
    pub provenance: TableProvenance,
    pub report: CleaningReport,
    pub columns: Vec<String>,
    pub rows: Vec<EnrichedSample>,
}

/// Column-oriented enriched table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnTable {
    pub producer: TableProducer,
    pub provenance: TableProvenance,
    pub report: CleaningReport,
    pub timestamp: Vec<DateTime<Utc>>,
    pub distance: Vec<f64>,
    pub altitude: Vec<f64>,
    pub heart_rate: Vec<f64>,
    pub cadence: Vec<f64>,
    pub position_lat: Vec<Option<f64>>,
    pub position_long: Vec<Option<f64>>,
    pub speed_calculated: Vec<f64>,
    pub speed_kmh: Vec<f64>,
    pub speed_smoothed: Vec<f64>,
    pub pace_min_km: Vec<Option<f64>>,
    pub distance_km: Vec<f64>,
    pub inclination: Vec<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_raw_sample_json_defaults() {
        let sample: RawSample =
            serde_json::from_str(r#"{"timestamp": "2024-03-02T08:00:00Z", "distance": 12.5}"#)
                .unwrap();

        assert_eq!(
            sample.timestamp,
            Some(Utc.with_ymd_and_hms(2024, 3, 2, 8, 0, 0).unwrap())
        );
        assert_eq!(sample.distance, Some(12.5));
        assert!(sample.altitude.is_none());
        assert!(sample.position_lat.is_none());
    }

    #[test]
    fn test_diagnostic_serialization() {
        let diag = Diagnostic::NegativeValueCorrected { count: 3 };
        let json = serde_json::to_value(&diag).unwrap();

        assert_eq!(json["kind"], "negative_value_corrected");
        assert_eq!(json["count"], 3);
    }
}

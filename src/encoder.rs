//! Table encoding
//!
//! This module encodes a cleaned activity into the tabular payloads read by the
//! dashboard collaborators: row-oriented for tables, column-oriented for charts.

use crate::adapters::InputFormat;
use crate::error::PipelineError;
use crate::types::{
    ActivityTable, CleanedActivity, ColumnTable, TableProducer, TableProvenance, ENRICHED_COLUMNS,
};
use crate::{PRODUCER_NAME, RUNFLUX_VERSION};
use chrono::Utc;
use uuid::Uuid;

/// Encoder for enriched activity tables
pub struct TableEncoder {
    instance_id: String,
}

impl Default for TableEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl TableEncoder {
    /// Create a new encoder with a unique instance ID
    pub fn new() -> Self {
        Self {
            instance_id: Uuid::new_v4().to_string(),
        }
    }

    /// Create an encoder with a specific instance ID
    pub fn with_instance_id(instance_id: String) -> Self {
        Self { instance_id }
    }

    /// Encode as a row-oriented table
    pub fn encode(&self, activity: &CleanedActivity, source: InputFormat) -> ActivityTable {
        ActivityTable {
            producer: self.producer(),
            provenance: provenance(source),
            report: activity.report.clone(),
            columns: ENRICHED_COLUMNS.iter().map(|c| c.to_string()).collect(),
            rows: activity.samples.clone(),
        }
    }

    /// Encode as a column-oriented table
    pub fn encode_columns(&self, activity: &CleanedActivity, source: InputFormat) -> ColumnTable {
        let s = &activity.samples;
        ColumnTable {
            producer: self.producer(),
            provenance: provenance(source),
            report: activity.report.clone(),
            timestamp: s.iter().map(|r| r.timestamp).collect(),
            distance: s.iter().map(|r| r.distance).collect(),
            altitude: s.iter().map(|r| r.altitude).collect(),
            heart_rate: s.iter().map(|r| r.heart_rate).collect(),
            cadence: s.iter().map(|r| r.cadence).collect(),
            position_lat: s.iter().map(|r| r.position_lat).collect(),
            position_long: s.iter().map(|r| r.position_long).collect(),
            speed_calculated: s.iter().map(|r| r.speed_calculated).collect(),
            speed_kmh: s.iter().map(|r| r.speed_kmh).collect(),
            speed_smoothed: s.iter().map(|r| r.speed_smoothed).collect(),
            pace_min_km: s.iter().map(|r| r.pace_min_km).collect(),
            distance_km: s.iter().map(|r| r.distance_km).collect(),
            inclination: s.iter().map(|r| r.inclination).collect(),
        }
    }

    /// Encode the row-oriented table to pretty JSON
    pub fn encode_to_json(
        &self,
        activity: &CleanedActivity,
        source: InputFormat,
    ) -> Result<String, PipelineError> {
        let table = self.encode(activity, source);
        serde_json::to_string_pretty(&table)
            .map_err(|e| PipelineError::EncodingError(e.to_string()))
    }

    /// One JSON object per enriched row, newline terminated
    pub fn encode_ndjson(&self, activity: &CleanedActivity) -> Result<String, PipelineError> {
        let mut out = String::new();
        for row in &activity.samples {
            let line = serde_json::to_string(row)
                .map_err(|e| PipelineError::EncodingError(e.to_string()))?;
            out.push_str(&line);
            out.push('\n');
        }
        Ok(out)
    }

    fn producer(&self) -> TableProducer {
        TableProducer {
            name: PRODUCER_NAME.to_string(),
            version: RUNFLUX_VERSION.to_string(),
            instance_id: self.instance_id.clone(),
        }
    }
}

fn provenance(source: InputFormat) -> TableProvenance {
    TableProvenance {
        source_format: source.as_str().to_string(),
        computed_at_utc: Utc::now().to_rfc3339(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CleaningReport, Diagnostic, EnrichedSample};
    use chrono::TimeZone;

    fn make_activity() -> CleanedActivity {
        let timestamp = Utc.with_ymd_and_hms(2024, 6, 9, 6, 30, 1).unwrap();
        let row = EnrichedSample {
            timestamp,
            distance: 3.0,
            altitude: 120.0,
            heart_rate: 140.0,
            cadence: 86.0,
            position_lat: Some(38.7),
            position_long: None,
            speed_calculated: 3.0,
            speed_kmh: 10.8,
            speed_smoothed: 0.0,
            pace_min_km: None,
            distance_km: 0.003,
            inclination: 0.0,
        };
        CleanedActivity {
            samples: vec![row],
            report: CleaningReport {
                raw_samples: 2,
                enriched_samples: 1,
                diagnostics: vec![Diagnostic::NullAfterInterpolation { count: 1 }],
            },
        }
    }

    #[test]
    fn test_encode_rows() {
        let encoder = TableEncoder::with_instance_id("test-instance".to_string());
        let json = encoder
            .encode_to_json(&make_activity(), InputFormat::Fit)
            .unwrap();
        let payload: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(payload["producer"]["name"], "runflux");
        assert_eq!(payload["producer"]["instance_id"], "test-instance");
        assert_eq!(payload["provenance"]["source_format"], "fit");
        assert_eq!(
            payload["columns"].as_array().unwrap().len(),
            ENRICHED_COLUMNS.len()
        );
        assert_eq!(payload["rows"][0]["speed_kmh"], 10.8);
        assert!(payload["rows"][0]["pace_min_km"].is_null());
        assert_eq!(
            payload["report"]["diagnostics"][0]["kind"],
            "null_after_interpolation"
        );
    }

    #[test]
    fn test_encode_columns() {
        let encoder = TableEncoder::new();
        let table = encoder.encode_columns(&make_activity(), InputFormat::Json);

        assert_eq!(table.speed_kmh, vec![10.8]);
        assert_eq!(table.position_long, vec![None]);
        assert_eq!(table.provenance.source_format, "json");
    }

    #[test]
    fn test_encode_ndjson() {
        let encoder = TableEncoder::new();
        let ndjson = encoder.encode_ndjson(&make_activity()).unwrap();

        assert_eq!(ndjson.lines().count(), 1);
        assert!(ndjson.ends_with('\n'));
    }

    #[test]
    fn test_unique_instance_ids() {
        let a = TableEncoder::new();
        let b = TableEncoder::new();
        assert_ne!(a.instance_id, b.instance_id);
    }
}

//! Overview statistics
//!
//! Per-column descriptive statistics for the overview page: count, mean,
//! sample standard deviation, extremes and quartiles.

use crate::stats::{mean, quantile_sorted, sample_std};
use crate::types::EnrichedSample;
use serde::{Deserialize, Serialize};

/// Descriptive statistics of one numeric column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSummary {
    pub column: String,
    pub count: usize,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub p25: Option<f64>,
    pub p50: Option<f64>,
    pub p75: Option<f64>,
    pub max: Option<f64>,
}

impl ColumnSummary {
    /// Summarize the present values of a column
    pub fn from_values(column: &str, values: impl IntoIterator<Item = Option<f64>>) -> Self {
        let mut present: Vec<f64> = values.into_iter().flatten().collect();
        present.sort_by(f64::total_cmp);

        Self {
            column: column.to_string(),
            count: present.len(),
            mean: mean(&present),
            std: sample_std(&present),
            min: present.first().copied(),
            p25: quantile_sorted(&present, 0.25),
            p50: quantile_sorted(&present, 0.5),
            p75: quantile_sorted(&present, 0.75),
            max: present.last().copied(),
        }
    }
}

/// Summaries for every numeric column of the enriched table
pub fn summarize(samples: &[EnrichedSample]) -> Vec<ColumnSummary> {
    type Getter = fn(&EnrichedSample) -> Option<f64>;
    let columns: [(&str, Getter); 12] = [
        ("distance", |s| Some(s.distance)),
        ("altitude", |s| Some(s.altitude)),
        ("heart_rate", |s| Some(s.heart_rate)),
        ("cadence", |s| Some(s.cadence)),
        ("position_lat", |s| s.position_lat),
        ("position_long", |s| s.position_long),
        ("speed_calculated", |s| Some(s.speed_calculated)),
        ("speed_kmh", |s| Some(s.speed_kmh)),
        ("speed_smoothed", |s| Some(s.speed_smoothed)),
        ("pace_min_km", |s| s.pace_min_km),
        ("distance_km", |s| Some(s.distance_km)),
        ("inclination", |s| Some(s.inclination)),
    ];

    columns
        .iter()
        .map(|(name, get)| ColumnSummary::from_values(name, samples.iter().map(get)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_column_summary() {
        let summary = ColumnSummary::from_values(
            "heart_rate",
            [Some(150.0), None, Some(140.0), Some(160.0), Some(130.0)],
        );

        assert_eq!(
            summary,
            ColumnSummary {
                column: "heart_rate".to_string(),
                count: 4,
                mean: Some(145.0),
                std: Some((500.0_f64 / 3.0).sqrt()),
                min: Some(130.0),
                p25: Some(137.5),
                p50: Some(145.0),
                p75: Some(152.5),
                max: Some(160.0),
            }
        );
    }

    #[test]
    fn test_empty_table() {
        let summaries = summarize(&[]);
        assert_eq!(summaries.len(), 12);
        assert!(summaries.iter().all(|s| s.count == 0 && s.mean.is_none()));
    }
}

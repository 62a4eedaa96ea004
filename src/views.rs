//! Chart series
//!
//! Extracts the series each dashboard panel plots from the enriched table. The
//! renderers themselves live outside this crate.

use crate::stats::{mean, trailing_rolling_mean};
use crate::types::EnrichedSample;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Reference bands drawn across the heart-rate axis (bpm)
pub const HEART_RATE_ZONES: [f64; 5] = [90.0, 120.0, 140.0, 160.0, 180.0];

/// Trailing window applied to the speed curve before plotting
pub const SPEED_DISPLAY_WINDOW: usize = 30;

/// Default number of histogram bins
pub const DEFAULT_BINS: usize = 30;

/// Route polyline for the map panel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    /// Mean position, used to center the map
    pub center: (f64, f64),
    /// `(lat, long)` in recording order
    pub points: Vec<(f64, f64)>,
}

/// Route of the activity; `None` when the recording carries no positions, in
/// which case the map panel shows its placeholder.
pub fn route(samples: &[EnrichedSample]) -> Option<Route> {
    let points: Vec<(f64, f64)> = samples
        .iter()
        .filter_map(|s| Some((s.position_lat?, s.position_long?)))
        .collect();

    let lats: Vec<f64> = points.iter().map(|p| p.0).collect();
    let longs: Vec<f64> = points.iter().map(|p| p.1).collect();
    Some(Route {
        center: (mean(&lats)?, mean(&longs)?),
        points,
    })
}

/// `(distance_km, speed km/h)` with a trailing mean over the displayed speed
pub fn speed_over_distance(samples: &[EnrichedSample]) -> Vec<(f64, f64)> {
    let speeds: Vec<f64> = samples.iter().map(|s| s.speed_smoothed).collect();
    samples
        .iter()
        .zip(trailing_rolling_mean(&speeds, SPEED_DISPLAY_WINDOW, 1))
        .filter_map(|(s, speed)| Some((s.distance_km, speed?)))
        .collect()
}

/// One point of the elevation panel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElevationPoint {
    pub timestamp: DateTime<Utc>,
    pub altitude: f64,
    pub inclination: f64,
}

pub fn elevation_profile(samples: &[EnrichedSample]) -> Vec<ElevationPoint> {
    samples
        .iter()
        .map(|s| ElevationPoint {
            timestamp: s.timestamp,
            altitude: s.altitude,
            inclination: s.inclination,
        })
        .collect()
}

/// Equal-width histogram
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Histogram {
    /// `bins + 1` ascending bin edges
    pub edges: Vec<f64>,
    pub counts: Vec<usize>,
}

/// Histogram of `values` over `bins` equal-width bins spanning min..=max.
/// The last bin is closed on the right.
pub fn distribution(values: &[f64], bins: usize) -> Histogram {
    let bins = bins.max(1);
    let (Some(min), Some(max)) = (
        values.iter().copied().reduce(f64::min),
        values.iter().copied().reduce(f64::max),
    ) else {
        return Histogram {
            edges: Vec::new(),
            counts: Vec::new(),
        };
    };

    // a constant column gets a unit-wide span around its value
    let (lo, hi) = if max > min {
        (min, max)
    } else {
        (min - 0.5, max + 0.5)
    };
    let width = (hi - lo) / bins as f64;
    let edges = (0..=bins).map(|i| lo + width * i as f64).collect();

    let mut counts = vec![0; bins];
    for v in values {
        let idx = (((v - lo) / width).floor() as usize).min(bins - 1);
        counts[idx] += 1;
    }

    Histogram { edges, counts }
}

/// Cadence distribution panel
pub fn cadence_distribution(samples: &[EnrichedSample]) -> Histogram {
    let values: Vec<f64> = samples.iter().map(|s| s.cadence).collect();
    distribution(&values, DEFAULT_BINS)
}

/// Speed distribution panel
pub fn speed_distribution(samples: &[EnrichedSample]) -> Histogram {
    let values: Vec<f64> = samples.iter().map(|s| s.speed_kmh).collect();
    distribution(&values, DEFAULT_BINS)
}

/// One point of the pace and heart-rate overlay
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PacePoint {
    pub timestamp: DateTime<Utc>,
    pub pace_min_km: Option<f64>,
    pub heart_rate: f64,
}

/// Pace and heart-rate overlay with its fixed reference bands
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaceHeartRate {
    pub points: Vec<PacePoint>,
    pub zones: Vec<f64>,
}

pub fn pace_heart_rate(samples: &[EnrichedSample]) -> PaceHeartRate {
    PaceHeartRate {
        points: samples
            .iter()
            .map(|s| PacePoint {
                timestamp: s.timestamp,
                pace_min_km: s.pace_min_km,
                heart_rate: s.heart_rate,
            })
            .collect(),
        zones: HEART_RATE_ZONES.to_vec(),
    }
}

//! Motion derivation
//!
//! Turns checked samples into speed and pace columns:
//! - instantaneous speed from distance/time deltas
//! - local outlier suppression against a short centered mean
//! - km/h conversion and long-window smoothing with gap interpolation
//! - pace in minutes per kilometer

use crate::config::CleaningConfig;
use crate::stats::{centered_rolling_mean, interpolate_linear, population_std, present_values};
use crate::types::{Diagnostic, RawSample, Stage};
use chrono::{DateTime, Utc};

/// m/s to km/h
pub const KMH_PER_MPS: f64 = 3.6;

/// A raw sample whose base fields are known to be present
#[derive(Debug, Clone, PartialEq)]
pub struct BaseSample {
    pub timestamp: DateTime<Utc>,
    pub distance: f64,
    pub raw: RawSample,
}

/// A sample carrying its speed and pace columns
#[derive(Debug, Clone, PartialEq)]
pub struct MotionSample {
    pub base: BaseSample,
    /// m/s after local outlier suppression
    pub speed_calculated: f64,
    pub speed_kmh: f64,
    /// km/h, clamped to be non-negative; `None` before the first full window
    pub speed_smoothed: Option<f64>,
    pub pace_min_km: Option<f64>,
}

/// Deriver for the speed and pace columns
pub struct MotionDeriver;

impl MotionDeriver {
    /// Derive motion columns. The first sample, and any sample whose time did
    /// not advance, has no speed and is not carried forward.
    pub fn derive(
        samples: &[BaseSample],
        config: &CleaningConfig,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Vec<MotionSample> {
        let (kept, mut speeds) = instantaneous_speeds(samples, diagnostics);

        if speeds.is_empty() {
            Diagnostic::InsufficientData {
                stage: Stage::InstantSpeed,
                column: Some("distance".to_string()),
                samples: samples.len(),
            }
            .emit(diagnostics);
            return Vec::new();
        }

        suppress_local_outliers(&mut speeds, config.short_window, diagnostics);

        let speeds_kmh: Vec<f64> = speeds.iter().map(|s| s * KMH_PER_MPS).collect();
        let smoothed = smooth_long(&speeds_kmh, config.long_window, diagnostics);

        let rows: Vec<MotionSample> = kept
            .into_iter()
            .zip(speeds)
            .zip(speeds_kmh)
            .zip(smoothed)
            .map(|(((base, speed), kmh), smoothed)| MotionSample {
                base,
                speed_calculated: speed,
                speed_kmh: kmh,
                speed_smoothed: smoothed,
                pace_min_km: smoothed.and_then(pace_from_kmh),
            })
            .collect();

        let missing_pace = rows.iter().filter(|r| r.pace_min_km.is_none()).count();
        if missing_pace > 0 {
            Diagnostic::NullAfterInterpolation {
                count: missing_pace,
            }
            .emit(diagnostics);
        }

        rows
    }
}

/// Minutes per kilometer at `speed_kmh`; undefined at or below zero
pub fn pace_from_kmh(speed_kmh: f64) -> Option<f64> {
    if speed_kmh > 0.0 {
        Some(60.0 / speed_kmh)
    } else {
        None
    }
}

/// Speed of each sample relative to its predecessor (m/s)
fn instantaneous_speeds(
    samples: &[BaseSample],
    diagnostics: &mut Vec<Diagnostic>,
) -> (Vec<BaseSample>, Vec<f64>) {
    let mut kept = Vec::with_capacity(samples.len().saturating_sub(1));
    let mut speeds = Vec::with_capacity(samples.len().saturating_sub(1));
    let mut stalled = 0;

    for pair in samples.windows(2) {
        let (prev, cur) = (&pair[0], &pair[1]);
        let dt = (cur.timestamp - prev.timestamp).num_milliseconds() as f64 / 1000.0;
        if dt <= 0.0 {
            stalled += 1;
            continue;
        }
        kept.push(cur.clone());
        speeds.push((cur.distance - prev.distance) / dt);
    }

    if stalled > 0 {
        Diagnostic::NonIncreasingTimestamp { count: stalled }.emit(diagnostics);
    }

    (kept, speeds)
}

/// Replace speeds that stray from their short centered mean by more than the
/// standard deviation of that mean. One pass; edges without a full window are
/// left as they are.
fn suppress_local_outliers(speeds: &mut [f64], window: usize, diagnostics: &mut Vec<Diagnostic>) {
    let smoothed = centered_rolling_mean(speeds, window, window);
    let Some(threshold) = population_std(&present_values(&smoothed)) else {
        Diagnostic::InsufficientData {
            stage: Stage::ShortSmoothing,
            column: Some("speed_calculated".to_string()),
            samples: speeds.len(),
        }
        .emit(diagnostics);
        return;
    };

    let mut replaced = 0;
    for (speed, mean) in speeds.iter_mut().zip(&smoothed) {
        if let Some(mean) = mean {
            if (*speed - mean).abs() > threshold {
                *speed = *mean;
                replaced += 1;
            }
        }
    }
    tracing::debug!(replaced, threshold, "local speed outliers suppressed");
}

/// Long centered mean with interior and trailing gaps interpolated and
/// negatives clamped to zero. Rows ahead of the first full window stay empty.
fn smooth_long(
    speeds_kmh: &[f64],
    window: usize,
    diagnostics: &mut Vec<Diagnostic>,
) -> Vec<Option<f64>> {
    let mut smoothed = centered_rolling_mean(speeds_kmh, window, window);

    if smoothed.iter().all(Option::is_none) {
        Diagnostic::InsufficientData {
            stage: Stage::LongSmoothing,
            column: Some("speed_kmh".to_string()),
            samples: speeds_kmh.len(),
        }
        .emit(diagnostics);
        smoothed = centered_rolling_mean(speeds_kmh, window, 1);
    }

    let mut filled = interpolate_linear(&smoothed);

    let mut negatives = 0;
    for value in filled.iter_mut().flatten() {
        if *value < 0.0 {
            *value = 0.0;
            negatives += 1;
        }
    }
    if negatives > 0 {
        Diagnostic::NegativeValueCorrected { count: negatives }.emit(diagnostics);
    }

    filled
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn track(distances: &[f64]) -> Vec<BaseSample> {
        let start = Utc.with_ymd_and_hms(2024, 5, 1, 7, 0, 0).unwrap();
        distances
            .iter()
            .enumerate()
            .map(|(i, d)| {
                let timestamp = start + Duration::seconds(i as i64);
                BaseSample {
                    timestamp,
                    distance: *d,
                    raw: RawSample::new(timestamp, *d),
                }
            })
            .collect()
    }

    #[test]
    fn test_constant_speed() {
        let mut diagnostics = Vec::new();
        let rows = MotionDeriver::derive(
            &track(&[0.0, 10.0, 20.0, 30.0, 40.0]),
            &CleaningConfig::default(),
            &mut diagnostics,
        );

        assert_eq!(rows.len(), 4);
        assert_eq!(rows[0].base.distance, 10.0);
        for row in &rows {
            assert!((row.speed_calculated - 10.0).abs() < 1e-9);
            assert!((row.speed_kmh - 36.0).abs() < 1e-9);
            assert!((row.speed_smoothed.unwrap() - 36.0).abs() < 1e-9);
            assert!((row.pace_min_km.unwrap() - 60.0 / 36.0).abs() < 1e-9);
        }
        // four speeds cannot fill a 60-sample window
        assert!(diagnostics.iter().any(|d| matches!(
            d,
            Diagnostic::InsufficientData {
                stage: Stage::LongSmoothing,
                ..
            }
        )));
    }

    #[test]
    fn test_local_outlier_replaced_by_short_mean() {
        let config = CleaningConfig {
            long_window: 1,
            ..Default::default()
        };
        let mut diagnostics = Vec::new();
        // speeds: 5, 5, 35, 5, 5
        let rows = MotionDeriver::derive(
            &track(&[0.0, 5.0, 10.0, 45.0, 50.0, 55.0]),
            &config,
            &mut diagnostics,
        );

        let speeds: Vec<f64> = rows.iter().map(|r| r.speed_calculated).collect();
        assert_eq!(speeds[0], 5.0);
        assert!((speeds[2] - 15.0).abs() < 1e-9);
        assert_eq!(speeds[4], 5.0);
    }

    #[test]
    fn test_negative_speed_clamped() {
        let config = CleaningConfig {
            short_window: 1,
            long_window: 1,
            ..Default::default()
        };
        let mut diagnostics = Vec::new();
        let rows = MotionDeriver::derive(
            &track(&[0.0, 10.0, 5.0, 15.0]),
            &config,
            &mut diagnostics,
        );

        assert!(rows[1].speed_calculated < 0.0);
        assert_eq!(rows[1].speed_smoothed, Some(0.0));
        assert!(rows[1].pace_min_km.is_none());
        assert!(diagnostics.contains(&Diagnostic::NegativeValueCorrected { count: 1 }));
        assert!(diagnostics.contains(&Diagnostic::NullAfterInterpolation { count: 1 }));
    }

    #[test]
    fn test_stalled_clock_dropped() {
        let mut samples = track(&[0.0, 10.0, 20.0]);
        samples[2].timestamp = samples[1].timestamp;
        let mut diagnostics = Vec::new();
        let rows =
            MotionDeriver::derive(&samples, &CleaningConfig::default(), &mut diagnostics);

        assert_eq!(rows.len(), 1);
        assert!(diagnostics.contains(&Diagnostic::NonIncreasingTimestamp { count: 1 }));
    }

    #[test]
    fn test_single_sample_yields_nothing() {
        let mut diagnostics = Vec::new();
        let rows = MotionDeriver::derive(
            &track(&[0.0]),
            &CleaningConfig::default(),
            &mut diagnostics,
        );

        assert!(rows.is_empty());
        assert_eq!(diagnostics.len(), 1);
    }

    #[test]
    fn test_long_window_leading_gap_stays_empty() {
        let distances: Vec<f64> = (0..=120).map(|i| i as f64 * 3.0).collect();
        let mut diagnostics = Vec::new();
        let rows = MotionDeriver::derive(
            &track(&distances),
            &CleaningConfig::default(),
            &mut diagnostics,
        );

        // 120 speeds; full 60-sample windows are centered on rows 30..=90
        assert_eq!(rows.len(), 120);
        assert!(rows[..30].iter().all(|r| r.speed_smoothed.is_none()));
        assert!(rows[..30].iter().all(|r| r.pace_min_km.is_none()));
        for row in &rows[30..] {
            assert!((row.speed_smoothed.unwrap() - 10.8).abs() < 1e-9);
        }
        assert_eq!(
            diagnostics,
            vec![Diagnostic::NullAfterInterpolation { count: 30 }]
        );
    }

    #[test]
    fn test_pace_from_kmh() {
        assert_eq!(pace_from_kmh(12.0), Some(5.0));
        assert_eq!(pace_from_kmh(0.0), None);
        assert_eq!(pace_from_kmh(-1.0), None);
    }
}

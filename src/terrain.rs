//! Distance and grade derivation
//!
//! Final pipeline step, run on the pruned rows: kilometer distance and the
//! altitude change per kilometer between consecutive surviving samples.

use crate::outliers::ScreenedSample;
use crate::types::EnrichedSample;

/// Deriver for `distance_km` and `inclination`
pub struct GradeDeriver;

impl GradeDeriver {
    /// Build enriched samples. The first row has inclination 0, as does any row
    /// that covers no distance since the previous one.
    pub fn derive(rows: Vec<ScreenedSample>) -> Vec<EnrichedSample> {
        let mut out: Vec<EnrichedSample> = Vec::with_capacity(rows.len());

        for row in rows {
            let distance_km = row.motion.base.distance / 1000.0;
            let inclination = match out.last() {
                Some(prev) => {
                    inclination(prev.altitude, row.altitude, prev.distance_km, distance_km)
                }
                None => 0.0,
            };
            let raw = &row.motion.base.raw;

            out.push(EnrichedSample {
                timestamp: row.motion.base.timestamp,
                distance: row.motion.base.distance,
                altitude: row.altitude,
                heart_rate: row.heart_rate,
                cadence: row.cadence,
                position_lat: raw.position_lat,
                position_long: raw.position_long,
                speed_calculated: row.motion.speed_calculated,
                speed_kmh: row.motion.speed_kmh,
                speed_smoothed: row.speed_smoothed,
                pace_min_km: row.motion.pace_min_km,
                distance_km,
                inclination,
            });
        }

        out
    }
}

/// Meters climbed per kilometer between two points
pub fn inclination(prev_alt: f64, alt: f64, prev_km: f64, km: f64) -> f64 {
    let run = km - prev_km;
    if run == 0.0 {
        return 0.0;
    }
    (alt - prev_alt) / run
}

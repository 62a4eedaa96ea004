//! Distribution-based outlier removal
//!
//! Masks values outside the Tukey fences `[Q1 - k*IQR, Q3 + k*IQR]` of their
//! column, then prunes every row left with a masked value.

use crate::motion::MotionSample;
use crate::stats::quantile;
use crate::types::{Diagnostic, Stage};

/// Columns screened by the IQR rule, in screening order
pub const SCREENED_COLUMNS: [&str; 4] = ["speed_smoothed", "altitude", "heart_rate", "cadence"];

/// Inclusive fence around the bulk of a column
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fence {
    pub lower: f64,
    pub upper: f64,
}

impl Fence {
    /// Fence from the present values of a column; `None` when it has none
    pub fn from_column(values: &[Option<f64>], multiplier: f64) -> Option<Self> {
        let q1 = quantile(values, 0.25)?;
        let q3 = quantile(values, 0.75)?;
        let iqr = q3 - q1;
        Some(Self {
            lower: q1 - multiplier * iqr,
            upper: q3 + multiplier * iqr,
        })
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.lower && value <= self.upper
    }
}

/// A row whose four screened columns are all present
#[derive(Debug, Clone, PartialEq)]
pub struct ScreenedSample {
    pub motion: MotionSample,
    pub speed_smoothed: f64,
    pub altitude: f64,
    pub heart_rate: f64,
    pub cadence: f64,
}

/// IQR-based outlier filter
pub struct OutlierFilter;

impl OutlierFilter {
    /// Mask out-of-fence values per column, then drop incomplete rows
    pub fn filter(
        rows: Vec<MotionSample>,
        multiplier: f64,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Vec<ScreenedSample> {
        let mut columns: [Vec<Option<f64>>; 4] = [
            rows.iter().map(|r| r.speed_smoothed).collect(),
            rows.iter().map(|r| r.base.raw.altitude).collect(),
            rows.iter().map(|r| r.base.raw.heart_rate).collect(),
            rows.iter().map(|r| r.base.raw.cadence).collect(),
        ];

        for (name, column) in SCREENED_COLUMNS.iter().zip(columns.iter_mut()) {
            mask_column(name, column, multiplier, diagnostics);
        }

        let [speed, altitude, heart_rate, cadence] = columns;
        let before = rows.len();
        let kept: Vec<ScreenedSample> = rows
            .into_iter()
            .zip(speed)
            .zip(altitude)
            .zip(heart_rate)
            .zip(cadence)
            .filter_map(|((((motion, speed), altitude), heart_rate), cadence)| {
                Some(ScreenedSample {
                    motion,
                    speed_smoothed: speed?,
                    altitude: altitude?,
                    heart_rate: heart_rate?,
                    cadence: cadence?,
                })
            })
            .collect();

        tracing::debug!(before, after = kept.len(), "pruned incomplete rows");
        kept
    }
}

/// Mark values outside the column's fence as absent
pub fn mask_column(
    name: &str,
    column: &mut [Option<f64>],
    multiplier: f64,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let Some(fence) = Fence::from_column(column, multiplier) else {
        if !column.is_empty() {
            Diagnostic::InsufficientData {
                stage: Stage::OutlierFilter,
                column: Some(name.to_string()),
                samples: column.len(),
            }
            .emit(diagnostics);
        }
        return;
    };

    let mut masked = 0;
    for slot in column.iter_mut() {
        if matches!(slot, Some(v) if !fence.contains(*v)) {
            *slot = None;
            masked += 1;
        }
    }
    tracing::debug!(
        column = name,
        lower = fence.lower,
        upper = fence.upper,
        masked,
        "iqr fence applied"
    );
}

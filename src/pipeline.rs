//! Pipeline orchestration
//!
//! This module provides the public API for runflux.
//! It runs a decoded recording through every cleaning stage and returns the
//! enriched samples along with the diagnostics raised on the way.

use crate::adapters::{FitAdapter, InputFormat, RecordAdapter};
use crate::config::CleaningConfig;
use crate::error::PipelineError;
use crate::motion::{BaseSample, MotionDeriver};
use crate::outliers::OutlierFilter;
use crate::terrain::GradeDeriver;
use crate::types::{CleanedActivity, CleaningReport, EnrichedSample, RawSample};

/// Clean raw samples with the default configuration.
///
/// # Arguments
/// * `raw` - Samples in recording order, each carrying `timestamp` and `distance`
///
/// # Returns
/// The enriched samples that survive cleaning, in input order
///
/// # Example
/// ```ignore
/// let samples = FitAdapter.parse(&bytes)?;
/// let enriched = clean_samples(&samples)?;
/// ```
pub fn clean_samples(raw: &[RawSample]) -> Result<Vec<EnrichedSample>, PipelineError> {
    ActivityProcessor::new()
        .clean(raw)
        .map(|activity| activity.samples)
}

/// Decode a FIT recording held in memory and clean it with the default configuration.
pub fn process_fit_bytes(bytes: &[u8]) -> Result<CleanedActivity, PipelineError> {
    ActivityProcessor::new().process_with_adapter(&FitAdapter, bytes)
}

/// Processor holding a cleaning configuration.
///
/// Each call is independent; nothing is carried over between recordings.
#[derive(Debug, Clone, Default)]
pub struct ActivityProcessor {
    config: CleaningConfig,
}

impl ActivityProcessor {
    /// Create a processor with the default windows and fence multiplier
    pub fn new() -> Self {
        Self {
            config: CleaningConfig::default(),
        }
    }

    /// Create a processor with a specific configuration
    pub fn with_config(config: CleaningConfig) -> Result<Self, PipelineError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &CleaningConfig {
        &self.config
    }

    /// Decode `bytes` in the given format and clean the result
    pub fn process_bytes(
        &self,
        bytes: &[u8],
        format: InputFormat,
    ) -> Result<CleanedActivity, PipelineError> {
        let adapter = format.adapter();
        self.process_with_adapter(adapter.as_ref(), bytes)
    }

    fn process_with_adapter(
        &self,
        adapter: &dyn RecordAdapter,
        bytes: &[u8],
    ) -> Result<CleanedActivity, PipelineError> {
        let raw = adapter.parse(bytes)?;
        self.clean(&raw)
    }

    /// Run the cleaning stages.
    ///
    /// Pipeline stages:
    /// 1. Base field check - every sample needs `timestamp` and `distance`
    /// 2. MotionDeriver - speed, local outliers, smoothing, pace
    /// 3. OutlierFilter - IQR masking and row pruning
    /// 4. GradeDeriver - kilometer distance and inclination
    pub fn clean(&self, raw: &[RawSample]) -> Result<CleanedActivity, PipelineError> {
        let base = require_base_fields(raw)?;
        let mut diagnostics = Vec::new();

        let motion = MotionDeriver::derive(&base, &self.config, &mut diagnostics);
        let screened = OutlierFilter::filter(motion, self.config.iqr_multiplier, &mut diagnostics);
        let samples = GradeDeriver::derive(screened);

        tracing::info!(
            raw = raw.len(),
            enriched = samples.len(),
            diagnostics = diagnostics.len(),
            "recording cleaned"
        );

        Ok(CleanedActivity {
            report: CleaningReport {
                raw_samples: raw.len(),
                enriched_samples: samples.len(),
                diagnostics,
            },
            samples,
        })
    }
}

/// Check the base columns. An empty recording has neither column at all.
fn require_base_fields(raw: &[RawSample]) -> Result<Vec<BaseSample>, PipelineError> {
    if raw.is_empty() {
        return Err(PipelineError::MissingField {
            field: "timestamp",
            index: 0,
        });
    }

    raw.iter()
        .enumerate()
        .map(|(index, sample)| {
            let timestamp = sample.timestamp.ok_or(PipelineError::MissingField {
                field: "timestamp",
                index,
            })?;
            let distance = sample.distance.ok_or(PipelineError::MissingField {
                field: "distance",
                index,
            })?;
            Ok(BaseSample {
                timestamp,
                distance,
                raw: sample.clone(),
            })
        })
        .collect()
}

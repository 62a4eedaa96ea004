//! Pipeline configuration
//!
//! Window sizes and the IQR fence multiplier. Defaults reproduce the dashboard's
//! stock cleaning; a JSON file may override any subset of them.

use crate::error::PipelineError;
use serde::{Deserialize, Serialize};

/// Centered window used for local outlier suppression
pub const DEFAULT_SHORT_WINDOW: usize = 3;

/// Centered window used for the displayed speed curve
pub const DEFAULT_LONG_WINDOW: usize = 60;

/// Tukey fence multiplier
pub const DEFAULT_IQR_MULTIPLIER: f64 = 1.5;

/// Tunables for one cleaning run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CleaningConfig {
    /// Samples in the short centered rolling mean
    pub short_window: usize,
    /// Samples in the long centered rolling mean
    pub long_window: usize,
    /// Fence width in interquartile ranges
    pub iqr_multiplier: f64,
}

impl Default for CleaningConfig {
    fn default() -> Self {
        Self {
            short_window: DEFAULT_SHORT_WINDOW,
            long_window: DEFAULT_LONG_WINDOW,
            iqr_multiplier: DEFAULT_IQR_MULTIPLIER,
        }
    }
}

impl CleaningConfig {
    /// Load a configuration from JSON; missing keys keep their defaults
    pub fn from_json(json: &str) -> Result<Self, PipelineError> {
        let config: CleaningConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> Result<String, PipelineError> {
        serde_json::to_string_pretty(self).map_err(PipelineError::JsonError)
    }

    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.short_window == 0 {
            return Err(PipelineError::InvalidConfig(
                "short_window must be at least 1".to_string(),
            ));
        }
        if self.long_window == 0 {
            return Err(PipelineError::InvalidConfig(
                "long_window must be at least 1".to_string(),
            ));
        }
        if !self.iqr_multiplier.is_finite() || self.iqr_multiplier < 0.0 {
            return Err(PipelineError::InvalidConfig(format!(
                "iqr_multiplier must be a non-negative number, got {}",
                self.iqr_multiplier
            )));
        }
        Ok(())
    }
}

//! Recording adapters
//!
//! This module provides adapters that decode an activity recording held in
//! memory into the ordered raw sample sequence the pipeline consumes.

mod fit;
mod json;

pub use fit::FitAdapter;
pub use json::JsonAdapter;

use crate::error::PipelineError;
use crate::types::RawSample;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Trait for recording adapters
pub trait RecordAdapter {
    /// Decode raw bytes into samples ordered by timestamp
    fn parse(&self, bytes: &[u8]) -> Result<Vec<RawSample>, PipelineError>;
}

/// Supported recording formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputFormat {
    /// Garmin FIT activity file
    Fit,
    /// JSON array or newline-delimited JSON of raw samples
    Json,
}

impl InputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            InputFormat::Fit => "fit",
            InputFormat::Json => "json",
        }
    }

    /// Pick the format from a file extension
    pub fn from_path(path: &Path) -> Result<Self, PipelineError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "fit" => Ok(InputFormat::Fit),
            "json" | "ndjson" | "jsonl" => Ok(InputFormat::Json),
            _ => Err(PipelineError::UnsupportedFormat(path.display().to_string())),
        }
    }

    /// Adapter decoding this format
    pub fn adapter(&self) -> Box<dyn RecordAdapter> {
        match self {
            InputFormat::Fit => Box::new(FitAdapter),
            InputFormat::Json => Box::new(JsonAdapter),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_extension() {
        assert_eq!(
            InputFormat::from_path(Path::new("morning_run.FIT")).unwrap(),
            InputFormat::Fit
        );
        assert_eq!(
            InputFormat::from_path(Path::new("samples.ndjson")).unwrap(),
            InputFormat::Json
        );
        assert!(matches!(
            InputFormat::from_path(Path::new("track.gpx")),
            Err(PipelineError::UnsupportedFormat(_))
        ));
        assert!(InputFormat::from_path(Path::new("noext")).is_err());
    }
}

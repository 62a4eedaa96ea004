//! JSON sample adapter
//!
//! Accepts either a JSON array of raw samples or newline-delimited JSON with
//! one sample per line. Useful for re-processing exported tables and for
//! fixtures.

use crate::error::PipelineError;
use crate::types::RawSample;

use super::RecordAdapter;

/// JSON / NDJSON adapter
pub struct JsonAdapter;

impl RecordAdapter for JsonAdapter {
    fn parse(&self, bytes: &[u8]) -> Result<Vec<RawSample>, PipelineError> {
        let text = std::str::from_utf8(bytes)
            .map_err(|e| PipelineError::UnsupportedFormat(format!("input is not UTF-8: {e}")))?;

        if text.trim_start().starts_with('[') {
            return Ok(serde_json::from_str(text)?);
        }

        text.lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(|line| serde_json::from_str(line).map_err(PipelineError::from))
            .collect()
    }
}

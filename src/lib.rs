//! runflux - Cleaning pipeline for single activity recordings
//!
//! runflux turns the raw, noisy per-sample telemetry of a wearable recording
//! into a consistent derived dataset through a deterministic pipeline:
//! recording adaptation → motion derivation → outlier filtering → grade
//! derivation → table encoding.
//!
//! ## Modules
//!
//! - **Pipeline**: FIT/JSON recordings in, enriched samples (speed, pace, inclination) out
//! - **Views**: Chart-ready series and overview statistics for dashboard panels

pub mod adapters;
pub mod config;
pub mod encoder;
pub mod error;
pub mod motion;
pub mod outliers;
pub mod pipeline;
pub mod stats;
pub mod summary;
pub mod terrain;
pub mod types;
pub mod views;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use adapters::{FitAdapter, InputFormat, JsonAdapter, RecordAdapter};
pub use config::CleaningConfig;
pub use error::PipelineError;
pub use pipeline::{clean_samples, process_fit_bytes, ActivityProcessor};
pub use types::{CleanedActivity, Diagnostic, EnrichedSample, RawSample};

/// runflux version embedded in all encoded tables
pub const RUNFLUX_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for encoded tables
pub const PRODUCER_NAME: &str = "runflux";

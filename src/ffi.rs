//! FFI bindings for runflux
//!
//! This module provides C-compatible functions for calling runflux from other
//! languages. Recordings are passed as in-memory byte buffers; results come
//! back as newly allocated JSON strings that must be freed by the caller using
//! `runflux_free_string`.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;
use std::slice;

use crate::adapters::InputFormat;
use crate::config::CleaningConfig;
use crate::encoder::TableEncoder;
use crate::error::PipelineError;
use crate::pipeline::ActivityProcessor;

// Thread-local storage for the last error message
thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

fn set_last_error(msg: &str) {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(msg).ok();
    });
}

fn clear_last_error() {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = None;
    });
}

unsafe fn cstr_to_string(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    CStr::from_ptr(ptr).to_str().ok().map(|s| s.to_string())
}

/// Borrow a caller-owned buffer
unsafe fn bytes_from_raw<'a>(data: *const u8, len: usize) -> Option<&'a [u8]> {
    if data.is_null() {
        return None;
    }
    Some(slice::from_raw_parts(data, len))
}

/// Helper to convert Rust string to C string (caller must free)
fn string_to_cstr(s: &str) -> *mut c_char {
    match CString::new(s) {
        Ok(cstr) => cstr.into_raw(),
        Err(_) => ptr::null_mut(),
    }
}

/// Clean a recording and encode the table, reporting failures through the
/// last-error slot.
fn process_to_json(
    processor: &ActivityProcessor,
    bytes: &[u8],
    format: InputFormat,
) -> *mut c_char {
    let result = processor
        .process_bytes(bytes, format)
        .and_then(|activity| TableEncoder::new().encode_to_json(&activity, format));

    match result {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&error_message(&e));
            ptr::null_mut()
        }
    }
}

fn error_message(e: &PipelineError) -> String {
    if e.is_unsupported_recording() {
        format!("Unsupported recording: {e}")
    } else {
        e.to_string()
    }
}

// ============================================================================
// Stateless API
// ============================================================================

/// Clean a FIT recording and return the enriched table as JSON.
///
/// # Safety
/// - `data` must point to `len` readable bytes.
/// - Returns a newly allocated string that must be freed with `runflux_free_string`.
/// - Returns NULL on error; call `runflux_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn runflux_process_fit(data: *const u8, len: usize) -> *mut c_char {
    clear_last_error();

    let Some(bytes) = bytes_from_raw(data, len) else {
        set_last_error("Invalid data pointer");
        return ptr::null_mut();
    };

    process_to_json(&ActivityProcessor::new(), bytes, InputFormat::Fit)
}

/// Clean raw samples given as a JSON array (or NDJSON) and return the enriched table.
///
/// # Safety
/// - `json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `runflux_free_string`.
/// - Returns NULL on error; call `runflux_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn runflux_process_json(json: *const c_char) -> *mut c_char {
    clear_last_error();

    let Some(json_str) = cstr_to_string(json) else {
        set_last_error("Invalid JSON string pointer");
        return ptr::null_mut();
    };

    process_to_json(
        &ActivityProcessor::new(),
        json_str.as_bytes(),
        InputFormat::Json,
    )
}

// ============================================================================
// Configured Processor API
// ============================================================================

/// Opaque handle to a configured ActivityProcessor
pub struct RunfluxProcessorHandle {
    processor: ActivityProcessor,
}

/// Create a processor. `config_json` may be NULL for the default configuration.
///
/// # Safety
/// - `config_json` must be NULL or a valid null-terminated C string.
/// - Must be freed with `runflux_processor_free`.
/// - Returns NULL on error.
#[no_mangle]
pub unsafe extern "C" fn runflux_processor_new(
    config_json: *const c_char,
) -> *mut RunfluxProcessorHandle {
    clear_last_error();

    let config = if config_json.is_null() {
        CleaningConfig::default()
    } else {
        let Some(json) = cstr_to_string(config_json) else {
            set_last_error("Invalid config string pointer");
            return ptr::null_mut();
        };
        match CleaningConfig::from_json(&json) {
            Ok(config) => config,
            Err(e) => {
                set_last_error(&e.to_string());
                return ptr::null_mut();
            }
        }
    };

    match ActivityProcessor::with_config(config) {
        Ok(processor) => Box::into_raw(Box::new(RunfluxProcessorHandle { processor })),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Free a processor.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `runflux_processor_new`, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn runflux_processor_free(processor: *mut RunfluxProcessorHandle) {
    if !processor.is_null() {
        drop(Box::from_raw(processor));
    }
}

/// Clean a FIT recording with a configured processor.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `runflux_processor_new`.
/// - `data` must point to `len` readable bytes.
/// - Returns a newly allocated string that must be freed with `runflux_free_string`.
#[no_mangle]
pub unsafe extern "C" fn runflux_processor_process_fit(
    processor: *const RunfluxProcessorHandle,
    data: *const u8,
    len: usize,
) -> *mut c_char {
    clear_last_error();

    let Some(handle) = processor.as_ref() else {
        set_last_error("Invalid processor pointer");
        return ptr::null_mut();
    };
    let Some(bytes) = bytes_from_raw(data, len) else {
        set_last_error("Invalid data pointer");
        return ptr::null_mut();
    };

    process_to_json(&handle.processor, bytes, InputFormat::Fit)
}

// ============================================================================
// Memory Management
// ============================================================================

/// Free a string returned by runflux functions.
///
/// # Safety
/// - `ptr` must be a valid pointer returned by a runflux function, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn runflux_free_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        drop(CString::from_raw(ptr));
    }
}

// ============================================================================
// Error Handling
// ============================================================================

/// Get the last error message.
///
/// # Safety
/// - Returns a pointer to a thread-local error string.
/// - The returned pointer is valid until the next runflux call on this thread.
/// - Do NOT free the returned pointer.
/// - Returns NULL if no error occurred.
#[no_mangle]
pub unsafe extern "C" fn runflux_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match &*e.borrow() {
        Some(cstr) => cstr.as_ptr(),
        None => ptr::null(),
    })
}

/// Get the library version.
///
/// # Safety
/// - Returns a pointer to a static string. Do NOT free.
#[no_mangle]
pub unsafe extern "C" fn runflux_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_json() -> CString {
        let rows: Vec<String> = (0..90)
            .map(|i| {
                format!(
                    r#"{{"timestamp": "2024-06-09T06:{:02}:{:02}Z", "distance": {}, "altitude": {}, "heart_rate": 150, "cadence": 88}}"#,
                    30 + i / 60,
                    i % 60,
                    i as f64 * 2.8,
                    110 + i % 4
                )
            })
            .collect();
        CString::new(format!("[{}]", rows.join(","))).unwrap()
    }

    #[test]
    fn test_ffi_process_json() {
        let json = sample_json();

        unsafe {
            let result = runflux_process_json(json.as_ptr());
            assert!(!result.is_null());

            let result_str = CStr::from_ptr(result).to_str().unwrap();
            let payload: serde_json::Value = serde_json::from_str(result_str).unwrap();
            assert_eq!(payload["producer"]["name"], "runflux");
            assert_eq!(payload["report"]["raw_samples"], 90);

            runflux_free_string(result);
        }
    }

    #[test]
    fn test_ffi_missing_field_reported() {
        let json = CString::new(r#"[{"timestamp": "2024-06-09T06:30:00Z"}]"#).unwrap();

        unsafe {
            let result = runflux_process_json(json.as_ptr());
            assert!(result.is_null());

            let error = runflux_last_error();
            assert!(!error.is_null());
            let error_str = CStr::from_ptr(error).to_str().unwrap();
            assert!(error_str.starts_with("Unsupported recording"));
            assert!(error_str.contains("distance"));
        }
    }

    #[test]
    fn test_ffi_invalid_fit_bytes() {
        let data = b"not a fit file";

        unsafe {
            let result = runflux_process_fit(data.as_ptr(), data.len());
            assert!(result.is_null());
            assert!(!runflux_last_error().is_null());
        }
    }

    #[test]
    fn test_ffi_processor_lifecycle() {
        let config = CString::new(r#"{"long_window": 10}"#).unwrap();

        unsafe {
            let processor = runflux_processor_new(config.as_ptr());
            assert!(!processor.is_null());
            assert_eq!((*processor).processor.config().long_window, 10);

            let result = runflux_processor_process_fit(processor, ptr::null(), 0);
            assert!(result.is_null());

            runflux_processor_free(processor);
        }
    }

    #[test]
    fn test_ffi_processor_rejects_bad_config() {
        let config = CString::new(r#"{"short_window": 0}"#).unwrap();

        unsafe {
            let processor = runflux_processor_new(config.as_ptr());
            assert!(processor.is_null());
            assert!(!runflux_last_error().is_null());
        }
    }

    #[test]
    fn test_ffi_version() {
        unsafe {
            let version = runflux_version();
            assert!(!version.is_null());

            let version_str = CStr::from_ptr(version).to_str().unwrap();
            assert!(!version_str.is_empty());
        }
    }
}

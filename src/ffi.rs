//! FFI bindings for Synheart Digest
//!
//! This module provides C-compatible functions for embedding the digest engine
//! in the collector host. All functions use C strings (null-terminated) and
//! return allocated memory that must be freed by the caller using
//! `digest_free_string`.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use chrono::{Local, NaiveDate};

use crate::config::DigestConfig;
use crate::error::DigestError;
use crate::pipeline::{slim_document, DigestProcessor};

// Thread-local storage for the last error message
thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

/// Set the last error message
fn set_last_error(msg: &str) {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(msg).ok();
    });
}

/// Clear the last error message
fn clear_last_error() {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = None;
    });
}

/// Helper to convert C string to Rust string
unsafe fn cstr_to_string(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    CStr::from_ptr(ptr).to_str().ok().map(|s| s.to_string())
}

/// Helper to convert Rust string to C string (caller must free)
fn string_to_cstr(s: &str) -> *mut c_char {
    match CString::new(s) {
        Ok(cstr) => cstr.into_raw(),
        Err(_) => ptr::null_mut(),
    }
}

/// Configuration from an optional JSON C string; NULL means defaults
unsafe fn config_from_ptr(config_json: *const c_char) -> Result<DigestConfig, DigestError> {
    if config_json.is_null() {
        return Ok(DigestConfig::default());
    }
    let json = cstr_to_string(config_json)
        .ok_or_else(|| DigestError::InvalidConfig("configuration is not valid UTF-8".to_string()))?;
    DigestConfig::from_json(&json)
}

fn finish(result: Result<String, DigestError>) -> *mut c_char {
    match result {
        Ok(output) => string_to_cstr(&output),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

// ============================================================================
// Stateless API
// ============================================================================

/// Slim a collected provider document and return the digest JSON.
///
/// # Safety
/// - `json` must be a valid null-terminated C string.
/// - `config_json` must be a valid null-terminated C string or NULL (defaults).
/// - Returns a newly allocated string that must be freed with `digest_free_string`.
/// - Returns NULL on error; call `digest_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn digest_slim_document(
    json: *const c_char,
    config_json: *const c_char,
) -> *mut c_char {
    clear_last_error();

    let json_str = match cstr_to_string(json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid JSON string pointer");
            return ptr::null_mut();
        }
    };

    let config = match config_from_ptr(config_json) {
        Ok(config) => config,
        Err(e) => {
            set_last_error(&e.to_string());
            return ptr::null_mut();
        }
    };

    finish(slim_document(&json_str, &config))
}

/// Return the collection plan as a JSON array.
///
/// # Safety
/// - `config_json` must be a valid null-terminated C string or NULL (defaults).
/// - `today` must be a `YYYY-MM-DD` null-terminated C string or NULL (local date).
/// - Returns a newly allocated string that must be freed with `digest_free_string`.
/// - Returns NULL on error; call `digest_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn digest_collection_plan(
    config_json: *const c_char,
    today: *const c_char,
) -> *mut c_char {
    clear_last_error();

    let config = match config_from_ptr(config_json) {
        Ok(config) => config,
        Err(e) => {
            set_last_error(&e.to_string());
            return ptr::null_mut();
        }
    };

    let today = if today.is_null() {
        Local::now().date_naive()
    } else {
        let parsed = cstr_to_string(today)
            .and_then(|s| NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok());
        match parsed {
            Some(date) => date,
            None => {
                set_last_error("Invalid date, expected YYYY-MM-DD");
                return ptr::null_mut();
            }
        }
    };

    finish(config.collection_plan(today).and_then(|plan| {
        serde_json::to_string(&plan).map_err(|e| DigestError::EncodingError(e.to_string()))
    }))
}

// ============================================================================
// Processor API
// ============================================================================

/// Opaque handle to a DigestProcessor
pub struct DigestProcessorHandle {
    processor: DigestProcessor,
}

/// Create a processor from a JSON configuration.
///
/// # Safety
/// - `config_json` must be a valid null-terminated C string or NULL (defaults).
/// - Must be freed with `digest_processor_free`.
/// - Returns NULL on error; call `digest_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn digest_processor_new(config_json: *const c_char) -> *mut DigestProcessorHandle {
    clear_last_error();

    match config_from_ptr(config_json) {
        Ok(config) => {
            let handle = Box::new(DigestProcessorHandle {
                processor: DigestProcessor::new(config),
            });
            Box::into_raw(handle)
        }
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Free a processor.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `digest_processor_new`, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn digest_processor_free(processor: *mut DigestProcessorHandle) {
    if !processor.is_null() {
        drop(Box::from_raw(processor));
    }
}

/// Slim a document with a processor's configuration.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `digest_processor_new`.
/// - `json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `digest_free_string`.
/// - Returns NULL on error; call `digest_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn digest_processor_process(
    processor: *const DigestProcessorHandle,
    json: *const c_char,
) -> *mut c_char {
    clear_last_error();

    if processor.is_null() {
        set_last_error("Invalid processor pointer");
        return ptr::null_mut();
    }

    let json_str = match cstr_to_string(json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid JSON string pointer");
            return ptr::null_mut();
        }
    };

    finish((*processor).processor.process(&json_str))
}

/// Free a string returned by digest functions.
///
/// # Safety
/// - `ptr` must be a valid pointer returned by a digest function, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn digest_free_string(ptr: *mut c_char) {
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
/// - The returned pointer is valid until the next digest function call on this thread.
/// - Do NOT free the returned pointer.
/// - Returns NULL if no error occurred.
#[no_mangle]
pub unsafe extern "C" fn digest_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match &*e.borrow() {
        Some(cstr) => cstr.as_ptr(),
        None => ptr::null(),
    })
}

// ============================================================================
// Version Information
// ============================================================================

/// Get the library version.
///
/// # Safety
/// - Returns a pointer to a static string. Do NOT free.
#[no_mangle]
pub unsafe extern "C" fn digest_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}

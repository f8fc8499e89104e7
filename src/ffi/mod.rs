//! C ABI for hosts that do not share an allocator with this crate.
//!
//! Two surfaces are exported:
//! - [`handle`]: an explicit `QuestionStore *` owned by the host and passed
//!   to every call (`qb_store_*`).
//! - [`exports`]: the flat names the desktop front end links against
//!   (`load_questions_into_memory`, `get_question_type`, ...), operating on
//!   one process-wide store.
//!
//! Every string or array returned by either surface belongs to the caller
//! and must be handed back exactly once to its matching release function:
//!
//! | Returned by | Release with |
//! |---|---|
//! | `get_question_text`, `get_last_load_error` and `qb_store_*` equivalents | `free_cstring` |
//! | `get_mc_options`, `get_tf_statements` and `qb_store_*` equivalents | `free_string_array` |
//! | `get_tf_correct_answers`, `qb_store_tf_correct_answers` | `free_bool_array` |

pub mod alloc;
pub mod exports;
pub mod handle;

use std::ffi::{CStr, c_char, c_int};
use std::path::PathBuf;

use crate::data::{LoadError, LoadOptions};
use crate::store::QuestionStore;

/// Status returned by a successful load.
pub const QB_OK: c_int = 0;

/// Status returned by `qb_store_*` calls given a null store.
pub const QB_NULL_STORE: c_int = -1;

/// Returned by the correct-answer accessors when the index is out of range
/// or the question is not multiple choice. Equal to `SIZE_MAX` in C.
pub const QB_NOT_APPLICABLE: usize = usize::MAX;

/// Status returned when `qb_store_load_with_policy` gets an unknown policy.
pub const QB_INVALID_POLICY: c_int = 7;

/// # Safety
///
/// `path` must be null or point to a NUL-terminated string.
unsafe fn path_arg(path: *const c_char) -> Result<PathBuf, LoadError> {
    if path.is_null() {
        return Err(LoadError::InvalidPath);
    }
    let path = unsafe { CStr::from_ptr(path) };
    path.to_str()
        .map(PathBuf::from)
        .map_err(|_| LoadError::InvalidPath)
}

/// # Safety
///
/// `path` must be null or point to a NUL-terminated string.
unsafe fn load_into(
    store: &mut QuestionStore,
    path: *const c_char,
    options: &LoadOptions,
) -> c_int {
    let result = unsafe { path_arg(path) }.and_then(|path| store.load_with(path, options));
    match result {
        Ok(()) => QB_OK,
        Err(err) => {
            if matches!(err, LoadError::InvalidPath) {
                store.record_failure(&err);
            }
            err.status_code()
        }
    }
}

/// # Safety
///
/// `out` must be null or valid for a `usize` write.
unsafe fn write_count(out: *mut usize, count: usize) {
    if !out.is_null() {
        unsafe { out.write(count) };
    }
}

fn question_text(store: &QuestionStore, index: usize) -> *mut c_char {
    match store.get(index).and_then(|q| q.text()) {
        Some(text) => alloc::export_text(text),
        None => std::ptr::null_mut(),
    }
}

fn last_error(store: &QuestionStore) -> *mut c_char {
    match store.last_error() {
        Some(message) => alloc::export_text(message),
        None => std::ptr::null_mut(),
    }
}

/// # Safety
///
/// `out_count` must be null or valid for a `usize` write.
unsafe fn mc_options(
    store: &QuestionStore,
    index: usize,
    out_count: *mut usize,
) -> *mut *mut c_char {
    let (ptr, count) = match store.get(index).and_then(|q| q.as_multiple_choice()) {
        Some(mc) => alloc::export_text_array(&mc.options),
        None => (std::ptr::null_mut(), 0),
    };
    unsafe { write_count(out_count, count) };
    ptr
}

fn mc_correct_answer(store: &QuestionStore, index: usize) -> usize {
    store
        .correct_option_index_of(index)
        .unwrap_or(QB_NOT_APPLICABLE)
}

/// # Safety
///
/// `out_count` must be null or valid for a `usize` write.
unsafe fn tf_statements(
    store: &QuestionStore,
    index: usize,
    out_count: *mut usize,
) -> *mut *mut c_char {
    let (ptr, count) = match store.statements_of(index) {
        Some(statements) => alloc::export_text_array(&statements),
        None => (std::ptr::null_mut(), 0),
    };
    unsafe { write_count(out_count, count) };
    ptr
}

/// # Safety
///
/// `out_count` must be null or valid for a `usize` write.
unsafe fn tf_correct_answers(
    store: &QuestionStore,
    index: usize,
    out_count: *mut usize,
) -> *mut u8 {
    let (ptr, count) = match store.statement_truth_of(index) {
        Some(values) => alloc::export_bool_array(&values),
        None => (std::ptr::null_mut(), 0),
    };
    unsafe { write_count(out_count, count) };
    ptr
}

/// Serializes tests that hand out and release boundary allocations, since
/// they share the allocation registry and the process-wide store.
#[cfg(test)]
pub(crate) fn test_lock() -> std::sync::MutexGuard<'static, ()> {
    static LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());
    LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}

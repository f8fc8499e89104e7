//! Handle-based C API. The host creates a store with [`qb_store_new`],
//! passes it to every `qb_store_*` call, and destroys it with
//! [`qb_store_free`].

use std::ffi::{c_char, c_int};
use std::ptr;

use tracing::warn;

use super::{QB_INVALID_POLICY, QB_NOT_APPLICABLE, QB_NULL_STORE};
use crate::data::{LoadOptions, UnknownRecordPolicy};
use crate::models::QuestionKind;
use crate::store::QuestionStore;

/// Create an empty store. Release it with [`qb_store_free`].
#[unsafe(no_mangle)]
pub extern "C" fn qb_store_new() -> *mut QuestionStore {
    Box::into_raw(Box::new(QuestionStore::new()))
}

/// Destroy a store and every question it holds.
///
/// # Safety
///
/// `store` must be null or a pointer returned by [`qb_store_new`] that has
/// not been freed yet.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn qb_store_free(store: *mut QuestionStore) {
    if !store.is_null() {
        drop(unsafe { Box::from_raw(store) });
    }
}

/// Load a YAML file into `store`, replacing its questions on success.
///
/// Returns `0` on success, a positive load status on failure (the store is
/// left unchanged), or `-1` for a null store.
///
/// # Safety
///
/// `store` must be null or a live store. `path` must be null or a
/// NUL-terminated string.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn qb_store_load(store: *mut QuestionStore, path: *const c_char) -> c_int {
    let Some(store) = (unsafe { store.as_mut() }) else {
        return QB_NULL_STORE;
    };
    unsafe { super::load_into(store, path, &LoadOptions::default()) }
}

/// Like [`qb_store_load`] with an explicit policy for unreadable records:
/// `0` keep them as unknown, `1` skip them, `2` fail the load.
///
/// # Safety
///
/// Same as [`qb_store_load`].
#[unsafe(no_mangle)]
pub unsafe extern "C" fn qb_store_load_with_policy(
    store: *mut QuestionStore,
    path: *const c_char,
    policy: c_int,
) -> c_int {
    let Some(store) = (unsafe { store.as_mut() }) else {
        return QB_NULL_STORE;
    };
    let Some(policy) = UnknownRecordPolicy::from_code(policy) else {
        warn!(policy, "unknown record policy");
        return QB_INVALID_POLICY;
    };
    let options = LoadOptions::default().with_unknown_records(policy);
    unsafe { super::load_into(store, path, &options) }
}

/// Drop every question held by `store`.
///
/// # Safety
///
/// `store` must be null or a live store.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn qb_store_clear(store: *mut QuestionStore) {
    if let Some(store) = unsafe { store.as_mut() } {
        store.clear();
    }
}

/// # Safety
///
/// `store` must be null or a live store.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn qb_store_count(store: *const QuestionStore) -> usize {
    unsafe { store.as_ref() }.map_or(0, QuestionStore::count)
}

/// # Safety
///
/// `store` must be null or a live store.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn qb_store_question_type(
    store: *const QuestionStore,
    index: usize,
) -> QuestionKind {
    unsafe { store.as_ref() }.map_or(QuestionKind::Unknown, |s| s.type_of(index))
}

/// Prompt of the question at `index`, or null. Release with `free_cstring`.
///
/// # Safety
///
/// `store` must be null or a live store.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn qb_store_question_text(
    store: *const QuestionStore,
    index: usize,
) -> *mut c_char {
    unsafe { store.as_ref() }.map_or(ptr::null_mut(), |s| super::question_text(s, index))
}

/// Options of a multiple-choice question. Release with `free_string_array`.
///
/// # Safety
///
/// `store` must be null or a live store. `out_count` must be null or valid
/// for writes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn qb_store_mc_options(
    store: *const QuestionStore,
    index: usize,
    out_count: *mut usize,
) -> *mut *mut c_char {
    match unsafe { store.as_ref() } {
        Some(store) => unsafe { super::mc_options(store, index, out_count) },
        None => unsafe {
            super::write_count(out_count, 0);
            ptr::null_mut()
        },
    }
}

/// Index of the correct option, or `SIZE_MAX` when not applicable.
///
/// # Safety
///
/// `store` must be null or a live store.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn qb_store_mc_correct_answer(
    store: *const QuestionStore,
    index: usize,
) -> usize {
    unsafe { store.as_ref() }.map_or(QB_NOT_APPLICABLE, |s| super::mc_correct_answer(s, index))
}

/// Statements of a true/false block. Release with `free_string_array`.
///
/// # Safety
///
/// `store` must be null or a live store. `out_count` must be null or valid
/// for writes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn qb_store_tf_statements(
    store: *const QuestionStore,
    index: usize,
    out_count: *mut usize,
) -> *mut *mut c_char {
    match unsafe { store.as_ref() } {
        Some(store) => unsafe { super::tf_statements(store, index, out_count) },
        None => unsafe {
            super::write_count(out_count, 0);
            ptr::null_mut()
        },
    }
}

/// Truth value of each statement, `1` for true and `0` for false. Release
/// with `free_bool_array`.
///
/// # Safety
///
/// `store` must be null or a live store. `out_count` must be null or valid
/// for writes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn qb_store_tf_correct_answers(
    store: *const QuestionStore,
    index: usize,
    out_count: *mut usize,
) -> *mut u8 {
    match unsafe { store.as_ref() } {
        Some(store) => unsafe { super::tf_correct_answers(store, index, out_count) },
        None => unsafe {
            super::write_count(out_count, 0);
            ptr::null_mut()
        },
    }
}

/// Message of the most recent failed load, or null. Release with
/// `free_cstring`.
///
/// # Safety
///
/// `store` must be null or a live store.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn qb_store_last_error(store: *const QuestionStore) -> *mut c_char {
    unsafe { store.as_ref() }.map_or(ptr::null_mut(), super::last_error)
}

/// Number of strings and arrays handed out and not yet released.
#[unsafe(no_mangle)]
pub extern "C" fn qb_live_allocations() -> usize {
    super::alloc::live_allocations()
}

#[cfg(test)]
mod tests {
    use std::ffi::{CStr, CString};
    use std::slice;

    use super::*;
    use crate::ffi::exports::{free_bool_array, free_cstring, free_string_array};
    use crate::ffi::test_lock;

    fn write_fixture(name: &str, contents: &str) -> CString {
        let path = std::env::temp_dir().join(format!(
            "question-bank-handle-{}-{}.yaml",
            std::process::id(),
            name
        ));
        std::fs::write(&path, contents).unwrap();
        CString::new(path.to_str().unwrap()).unwrap()
    }

    #[test]
    fn test_handle_lifecycle() {
        let _guard = test_lock();
        let path = write_fixture(
            "lifecycle",
            "- question: Capital of Italy?\n  options: [Rome, Milan]\n  correct_answer: 0\n\
             - statements:\n    - Snow is white: true\n",
        );

        unsafe {
            let store = qb_store_new();
            assert_eq!(qb_store_count(store), 0);
            assert_eq!(qb_store_load(store, path.as_ptr()), 0);
            assert_eq!(qb_store_count(store), 2);

            assert_eq!(qb_store_question_type(store, 0), QuestionKind::MultipleChoice);
            let text = qb_store_question_text(store, 0);
            assert_eq!(CStr::from_ptr(text).to_str().unwrap(), "Capital of Italy?");
            free_cstring(text);

            let mut count: usize = 99;
            let options = qb_store_mc_options(store, 0, &mut count);
            assert_eq!(count, 2);
            assert_eq!(CStr::from_ptr(*options.add(1)).to_str().unwrap(), "Milan");
            free_string_array(options, count);
            assert_eq!(qb_store_mc_correct_answer(store, 0), 0);
            assert_eq!(qb_store_mc_correct_answer(store, 1), QB_NOT_APPLICABLE);

            let answers = qb_store_tf_correct_answers(store, 1, &mut count);
            assert_eq!(slice::from_raw_parts(answers, count), &[1]);
            free_bool_array(answers);

            let mut count: usize = 5;
            assert!(qb_store_tf_statements(store, 0, &mut count).is_null());
            assert_eq!(count, 0);

            qb_store_clear(store);
            assert_eq!(qb_store_count(store), 0);
            qb_store_free(store);
        }
    }

    #[test]
    fn test_failed_load_reports_status_and_error() {
        let _guard = test_lock();
        let good = write_fixture("good", "- statements: []\n");
        let missing = CString::new("/nonexistent/path.yaml").unwrap();

        unsafe {
            let store = qb_store_new();
            assert_eq!(qb_store_load(store, good.as_ptr()), 0);
            assert!(qb_store_last_error(store).is_null());

            assert_eq!(qb_store_load(store, missing.as_ptr()), 2);
            assert_eq!(qb_store_count(store), 1);

            let message = qb_store_last_error(store);
            assert!(CStr::from_ptr(message).to_str().unwrap().contains("not found"));
            free_cstring(message);

            assert_eq!(qb_store_load(store, ptr::null()), 1);
            assert_eq!(qb_store_load_with_policy(store, good.as_ptr(), 9), QB_INVALID_POLICY);
            assert_eq!(qb_store_count(store), 1);

            qb_store_free(store);
        }
    }

    #[test]
    fn test_null_store_is_harmless() {
        let _guard = test_lock();
        unsafe {
            let path = CString::new("x.yaml").unwrap();
            assert_eq!(qb_store_load(ptr::null_mut(), path.as_ptr()), QB_NULL_STORE);
            assert_eq!(qb_store_count(ptr::null()), 0);
            assert_eq!(qb_store_question_type(ptr::null(), 0), QuestionKind::Unknown);
            assert!(qb_store_question_text(ptr::null(), 0).is_null());

            let mut count: usize = 3;
            assert!(qb_store_mc_options(ptr::null(), 0, &mut count).is_null());
            assert_eq!(count, 0);
            qb_store_free(ptr::null_mut());
        }
    }

    #[test]
    fn test_policy_is_honoured() {
        let _guard = test_lock();
        let path = write_fixture("policy", "- bogus: 1\n- statements: []\n");

        unsafe {
            let store = qb_store_new();
            assert_eq!(qb_store_load_with_policy(store, path.as_ptr(), 0), 0);
            assert_eq!(qb_store_count(store), 2);
            assert_eq!(qb_store_question_type(store, 0), QuestionKind::Unknown);

            assert_eq!(qb_store_load_with_policy(store, path.as_ptr(), 1), 0);
            assert_eq!(qb_store_count(store), 1);

            assert_eq!(qb_store_load_with_policy(store, path.as_ptr(), 2), 6);
            assert_eq!(qb_store_count(store), 1);
            qb_store_free(store);
        }
    }
}

//! The flat C API used by the desktop front end.
//!
//! These functions work on one process-wide [`QuestionStore`]. The host is
//! expected to call them from one thread at a time: the lock below only
//! keeps the store itself consistent, it does not make a reload and an
//! in-progress iteration over the old bank agree with each other.

use std::ffi::{c_char, c_int};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::data::LoadOptions;
use crate::models::QuestionKind;
use crate::store::QuestionStore;

use super::alloc;

static DEFAULT_STORE: Mutex<QuestionStore> = Mutex::new(QuestionStore::new());

fn default_store() -> MutexGuard<'static, QuestionStore> {
    DEFAULT_STORE.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Load a YAML file, replacing the questions in memory on success.
///
/// Returns `0` on success. On failure returns a positive status and keeps
/// whatever was loaded before.
///
/// # Safety
///
/// `path` must be null or a NUL-terminated string.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn load_questions_into_memory(path: *const c_char) -> c_int {
    let mut store = default_store();
    unsafe { super::load_into(&mut store, path, &LoadOptions::default()) }
}

/// Discard the questions in memory.
#[unsafe(no_mangle)]
pub extern "C" fn clear_questions_from_memory() {
    default_store().clear();
}

#[unsafe(no_mangle)]
pub extern "C" fn get_total_question_count() -> usize {
    default_store().count()
}

#[unsafe(no_mangle)]
pub extern "C" fn get_question_type(index: usize) -> QuestionKind {
    default_store().type_of(index)
}

/// Prompt of the question at `index`, or null. Release with [`free_cstring`].
#[unsafe(no_mangle)]
pub extern "C" fn get_question_text(index: usize) -> *mut c_char {
    super::question_text(&default_store(), index)
}

/// Options of the multiple-choice question at `index`, with their number
/// written to `out_count`. Null with a count of `0` for any other question.
/// Release with [`free_string_array`].
///
/// # Safety
///
/// `out_count` must be null or valid for writes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn get_mc_options(index: usize, out_count: *mut usize) -> *mut *mut c_char {
    unsafe { super::mc_options(&default_store(), index, out_count) }
}

/// Index of the correct option, or `SIZE_MAX` if the question at `index` is
/// not multiple choice.
#[unsafe(no_mangle)]
pub extern "C" fn get_mc_correct_answer(index: usize) -> usize {
    super::mc_correct_answer(&default_store(), index)
}

/// Statements of the true/false block at `index`. Release with
/// [`free_string_array`].
///
/// # Safety
///
/// `out_count` must be null or valid for writes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn get_tf_statements(
    index: usize,
    out_count: *mut usize,
) -> *mut *mut c_char {
    unsafe { super::tf_statements(&default_store(), index, out_count) }
}

/// Truth values matching [`get_tf_statements`] element by element. Release
/// with [`free_bool_array`].
///
/// # Safety
///
/// `out_count` must be null or valid for writes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn get_tf_correct_answers(index: usize, out_count: *mut usize) -> *mut u8 {
    unsafe { super::tf_correct_answers(&default_store(), index, out_count) }
}

/// Message of the most recent failed load, or null. Release with
/// [`free_cstring`].
#[unsafe(no_mangle)]
pub extern "C" fn get_last_load_error() -> *mut c_char {
    super::last_error(&default_store())
}

/// Release a string returned by this library. Null is ignored.
///
/// # Safety
///
/// `ptr` must be null or a string returned by this library that has not
/// been released yet.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn free_cstring(ptr: *mut c_char) {
    unsafe { alloc::release_text(ptr) }
}

/// Release a string array and every string in it. `count` is checked
/// against the recorded length. Null is ignored.
///
/// # Safety
///
/// `ptr` must be null or an array returned by this library that has not
/// been released yet.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn free_string_array(ptr: *mut *mut c_char, count: usize) {
    unsafe { alloc::release_text_array(ptr, count) }
}

/// Release a boolean array. Null is ignored.
///
/// # Safety
///
/// `ptr` must be null or an array returned by this library that has not
/// been released yet.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn free_bool_array(ptr: *mut u8) {
    unsafe { alloc::release_bool_array(ptr) }
}

#[cfg(test)]
mod tests {
    use std::ffi::{CStr, CString};
    use std::ptr;
    use std::slice;

    use super::*;
    use crate::ffi::{QB_NOT_APPLICABLE, test_lock};

    fn fixture(name: &str, contents: &str) -> CString {
        let path = std::env::temp_dir().join(format!(
            "question-bank-exports-{}-{}.yaml",
            std::process::id(),
            name
        ));
        std::fs::write(&path, contents).unwrap();
        CString::new(path.to_str().unwrap()).unwrap()
    }

    unsafe fn read_strings(ptr: *mut *mut c_char, count: usize) -> Vec<String> {
        unsafe { slice::from_raw_parts(ptr, count) }
            .iter()
            .map(|p| unsafe { CStr::from_ptr(*p) }.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_front_end_walkthrough() {
        let _guard = test_lock();
        let path = fixture(
            "walkthrough",
            r#"
- question: "2+2=?"
  options: ["3", "4", "5"]
  correct_answer: 1
- statements:
    - statement: "Paris is the capital of France"
      answer: true
    - statement: "The sun is cold"
      answer: false
"#,
        );

        unsafe {
            assert_eq!(load_questions_into_memory(path.as_ptr()), 0);
            assert_eq!(get_total_question_count(), 2);

            assert_eq!(get_question_type(0), QuestionKind::MultipleChoice);
            let text = get_question_text(0);
            assert_eq!(CStr::from_ptr(text).to_str().unwrap(), "2+2=?");
            free_cstring(text);

            let mut count: usize = 0;
            let options = get_mc_options(0, &mut count);
            assert_eq!(read_strings(options, count), vec!["3", "4", "5"]);
            free_string_array(options, count);
            assert_eq!(get_mc_correct_answer(0), 1);

            assert_eq!(get_question_type(1), QuestionKind::TrueFalse);
            assert!(get_question_text(1).is_null());
            assert_eq!(get_mc_correct_answer(1), QB_NOT_APPLICABLE);

            let mut statement_count: usize = 0;
            let statements = get_tf_statements(1, &mut statement_count);
            let mut answer_count: usize = 0;
            let answers = get_tf_correct_answers(1, &mut answer_count);
            assert_eq!(statement_count, answer_count);
            assert_eq!(
                read_strings(statements, statement_count),
                vec!["Paris is the capital of France", "The sun is cold"]
            );
            assert_eq!(slice::from_raw_parts(answers, answer_count), &[1, 0]);
            free_string_array(statements, statement_count);
            free_bool_array(answers);

            assert_eq!(get_question_type(2), QuestionKind::Unknown);
            assert!(get_question_text(2).is_null());

            let missing = CString::new("/nonexistent/path.yaml").unwrap();
            assert_ne!(load_questions_into_memory(missing.as_ptr()), 0);
            assert_eq!(get_total_question_count(), 2);
            let message = get_last_load_error();
            assert!(!message.is_null());
            free_cstring(message);

            clear_questions_from_memory();
            assert_eq!(get_total_question_count(), 0);
            assert_eq!(get_question_type(0), QuestionKind::Unknown);
        }
    }

    #[test]
    fn test_release_functions_ignore_null() {
        let _guard = test_lock();
        unsafe {
            free_cstring(ptr::null_mut());
            free_string_array(ptr::null_mut(), 3);
            free_bool_array(ptr::null_mut());
        }
    }
}

//! Allocations handed across the C boundary and their release functions.
//!
//! Arrays carry a hidden header in front of the first element holding the
//! element count, so a release call never depends on the caller remembering
//! the length. Every live allocation is also recorded together with its
//! shape; a release of a pointer that is not live, or that belongs to a
//! different shape, is refused and logged instead of touching memory.

use std::alloc::{self, Layout};
use std::collections::BTreeMap;
use std::ffi::{CString, c_char};
use std::ptr;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::{debug, error, warn};

/// The three allocation shapes that cross the boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Shape {
    Text,
    TextArray,
    BoolArray,
}

static LIVE: Mutex<BTreeMap<usize, Shape>> = Mutex::new(BTreeMap::new());

fn live() -> MutexGuard<'static, BTreeMap<usize, Shape>> {
    LIVE.lock().unwrap_or_else(PoisonError::into_inner)
}

fn track(addr: usize, shape: Shape) {
    live().insert(addr, shape);
}

/// Remove `addr` from the registry if it is live with the expected shape.
fn untrack(addr: usize, shape: Shape) -> bool {
    let mut live = live();
    match live.get(&addr).copied() {
        Some(found) if found == shape => {
            live.remove(&addr);
            true
        }
        Some(found) => {
            error!(
                ?found,
                expected = ?shape,
                "release called with the wrong function for this allocation"
            );
            false
        }
        None => {
            error!(
                ?shape,
                "release of a pointer that is not live (double free or foreign pointer)"
            );
            false
        }
    }
}

/// Number of allocations handed out and not yet released.
pub fn live_allocations() -> usize {
    live().len()
}

/// Whether `ptr` is an allocation handed out by this crate and not yet
/// released.
pub fn is_live<T>(ptr: *const T) -> bool {
    live().contains_key(&ptr.addr())
}

/// Copy `text` into a NUL-terminated string owned by the caller.
///
/// Returns null if `text` contains an interior NUL.
pub(crate) fn export_text(text: &str) -> *mut c_char {
    match CString::new(text) {
        Ok(text) => {
            let ptr = text.into_raw();
            track(ptr.addr(), Shape::Text);
            ptr
        }
        Err(_) => {
            warn!("text contains a NUL byte and cannot be handed out");
            ptr::null_mut()
        }
    }
}

/// # Safety
///
/// `ptr` must be null or a pointer obtained from [`export_text`].
pub(crate) unsafe fn release_text(ptr: *mut c_char) {
    if ptr.is_null() || !untrack(ptr.addr(), Shape::Text) {
        return;
    }
    drop(unsafe { CString::from_raw(ptr) });
}

/// Copy `items` into a caller-owned array of NUL-terminated strings.
///
/// Empty input, or any item with an interior NUL, yields `(null, 0)`.
pub(crate) fn export_text_array(items: &[String]) -> (*mut *mut c_char, usize) {
    let mut raw = Vec::with_capacity(items.len());
    for item in items {
        match CString::new(item.as_str()) {
            Ok(text) => raw.push(text.into_raw()),
            Err(_) => {
                warn!("list item contains a NUL byte; list not handed out");
                unsafe { free_raw_strings(&raw) };
                return (ptr::null_mut(), 0);
            }
        }
    }

    let ptr = export_slice(&raw, Shape::TextArray);
    if ptr.is_null() {
        unsafe { free_raw_strings(&raw) };
        return (ptr::null_mut(), 0);
    }
    (ptr, raw.len())
}

/// # Safety
///
/// `ptr` must be null or a pointer obtained from [`export_text_array`].
pub(crate) unsafe fn release_text_array(ptr: *mut *mut c_char, count: usize) {
    if ptr.is_null() || !untrack(ptr.addr(), Shape::TextArray) {
        return;
    }

    let len = unsafe { recorded_len(ptr) };
    if len != count {
        warn!(
            count,
            len, "string array released with a mismatched count; using the recorded length"
        );
    }

    let items = unsafe { std::slice::from_raw_parts(ptr, len) };
    unsafe {
        free_raw_strings(items);
        release_slice(ptr, len);
    }
}

/// Copy `items` into a caller-owned array of `0`/`1` bytes.
pub(crate) fn export_bool_array(items: &[bool]) -> (*mut u8, usize) {
    let bytes: Vec<u8> = items.iter().map(|b| u8::from(*b)).collect();
    let ptr = export_slice(&bytes, Shape::BoolArray);
    if ptr.is_null() {
        return (ptr::null_mut(), 0);
    }
    (ptr, bytes.len())
}

/// # Safety
///
/// `ptr` must be null or a pointer obtained from [`export_bool_array`].
pub(crate) unsafe fn release_bool_array(ptr: *mut u8) {
    if ptr.is_null() || !untrack(ptr.addr(), Shape::BoolArray) {
        return;
    }
    let len = unsafe { recorded_len(ptr) };
    unsafe { release_slice(ptr, len) };
}

/// # Safety
///
/// Every element must come from `CString::into_raw` and not be freed yet.
unsafe fn free_raw_strings(items: &[*mut c_char]) {
    for &item in items {
        drop(unsafe { CString::from_raw(item) });
    }
    debug!(count = items.len(), "released strings");
}

/// Layout of a header word followed by `len` values of `T`, and the offset
/// of the first value. The offset does not depend on `len`.
fn prefixed_layout<T>(len: usize) -> Option<(Layout, usize)> {
    let values = Layout::array::<T>(len).ok()?;
    let (layout, offset) = Layout::new::<usize>().extend(values).ok()?;
    Some((layout.pad_to_align(), offset))
}

fn prefix_offset<T>() -> usize {
    prefixed_layout::<T>(0).map_or(0, |(_, offset)| offset)
}

/// Copy `items` into a fresh length-prefixed allocation. Empty input yields
/// null.
fn export_slice<T: Copy>(items: &[T], shape: Shape) -> *mut T {
    if items.is_empty() {
        return ptr::null_mut();
    }
    let Some((layout, offset)) = prefixed_layout::<T>(items.len()) else {
        error!(len = items.len(), "array too large to hand out");
        return ptr::null_mut();
    };

    // SAFETY: `layout` has non-zero size (it holds at least the header),
    // the header is aligned for `usize` and `offset` is aligned for `T`.
    let data = unsafe {
        let base = alloc::alloc(layout);
        if base.is_null() {
            alloc::handle_alloc_error(layout);
        }
        base.cast::<usize>().write(items.len());
        let data = base.add(offset).cast::<T>();
        ptr::copy_nonoverlapping(items.as_ptr(), data, items.len());
        data
    };

    track(data.addr(), shape);
    data
}

/// # Safety
///
/// `data` must point at the first element of a live allocation made by
/// [`export_slice`].
unsafe fn recorded_len<T>(data: *const T) -> usize {
    unsafe {
        data.cast::<u8>()
            .sub(prefix_offset::<T>())
            .cast::<usize>()
            .read()
    }
}

/// # Safety
///
/// `data` must point at the first element of an allocation made by
/// [`export_slice`] holding `len` elements, already removed from the
/// registry.
unsafe fn release_slice<T>(data: *mut T, len: usize) {
    let Some((layout, offset)) = prefixed_layout::<T>(len) else {
        return;
    };
    unsafe { alloc::dealloc(data.cast::<u8>().sub(offset), layout) };
}

#[cfg(test)]
mod tests {
    use std::ffi::CStr;

    use super::*;
    use crate::ffi::test_lock;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_text_release_once() {
        let _guard = test_lock();
        let ptr = export_text("2+2=?");
        assert!(is_live(ptr));
        assert_eq!(unsafe { CStr::from_ptr(ptr) }.to_str().unwrap(), "2+2=?");

        unsafe { release_text(ptr) };
        assert!(!is_live(ptr));

        // A second release is refused rather than freeing again.
        unsafe { release_text(ptr) };
    }

    #[test]
    fn test_text_with_nul_is_not_exported() {
        let _guard = test_lock();
        assert!(export_text("a\0b").is_null());
        unsafe { release_text(ptr::null_mut()) };
    }

    #[test]
    fn test_text_array_round_trip() {
        let _guard = test_lock();
        let (ptr, count) = export_text_array(&strings(&["3", "4", "5"]));
        assert_eq!(count, 3);
        assert_eq!(unsafe { recorded_len(ptr) }, 3);

        let items = unsafe { std::slice::from_raw_parts(ptr, count) };
        let read: Vec<&str> = items
            .iter()
            .map(|p| unsafe { CStr::from_ptr(*p) }.to_str().unwrap())
            .collect();
        assert_eq!(read, vec!["3", "4", "5"]);

        // A wrong count falls back to the recorded length.
        unsafe { release_text_array(ptr, 1) };
        assert!(!is_live(ptr));
    }

    #[test]
    fn test_empty_arrays_are_null() {
        let _guard = test_lock();
        let (ptr, count) = export_text_array(&[]);
        assert!(ptr.is_null());
        assert_eq!(count, 0);

        let (ptr, count) = export_bool_array(&[]);
        assert!(ptr.is_null());
        assert_eq!(count, 0);

        unsafe {
            release_text_array(ptr::null_mut(), 0);
            release_bool_array(ptr::null_mut());
        }
    }

    #[test]
    fn test_text_array_with_nul_is_not_exported() {
        let _guard = test_lock();
        let (ptr, count) = export_text_array(&strings(&["fine", "bad\0"]));
        assert!(ptr.is_null());
        assert_eq!(count, 0);
    }

    #[test]
    fn test_bool_array_is_self_describing() {
        let _guard = test_lock();
        let (ptr, count) = export_bool_array(&[true, false, true]);
        assert_eq!(count, 3);
        assert_eq!(unsafe { std::slice::from_raw_parts(ptr, count) }, &[1, 0, 1]);

        unsafe { release_bool_array(ptr) };
        assert!(!is_live(ptr));
    }

    #[test]
    fn test_wrong_shape_release_is_refused() {
        let _guard = test_lock();
        let text = export_text("keep me");
        // Releasing a string through the bool-array path must not free it.
        unsafe { release_bool_array(text.cast::<u8>()) };
        assert!(is_live(text));

        unsafe { release_text(text) };
        assert!(!is_live(text));
    }
}

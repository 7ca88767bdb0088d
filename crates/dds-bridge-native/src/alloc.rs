// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! C-allocator helpers for values handed to the caller.
//!
//! Everything returned from here is owned by the caller, who releases it
//! with `free` (the bridge's marshaler does exactly that).

use std::ffi::CStr;
use std::mem;
use std::os::raw::{c_char, c_void};
use std::ptr;

use dds_bridge_sys::{RawHandle, RawSequence};

/// Duplicate `value` into a `malloc`ed, NUL-terminated string.
pub(crate) fn alloc_string(value: &str) -> *mut c_char {
    let bytes = value.as_bytes();
    // SAFETY: plain C allocation, checked for null below.
    let out = unsafe { libc::malloc(bytes.len() + 1) }.cast::<c_char>();
    if out.is_null() {
        return ptr::null_mut();
    }
    // SAFETY: `out` has room for `len + 1` bytes.
    unsafe {
        ptr::copy_nonoverlapping(bytes.as_ptr().cast::<c_char>(), out, bytes.len());
        *out.add(bytes.len()) = 0;
    }
    out
}

fn alloc_sequence<T: Copy>(items: &[T]) -> *mut RawSequence {
    // SAFETY: plain C allocations, null-checked.
    unsafe {
        let seq = libc::malloc(mem::size_of::<RawSequence>()).cast::<RawSequence>();
        if seq.is_null() {
            return ptr::null_mut();
        }
        let buffer = if items.is_empty() {
            ptr::null_mut()
        } else {
            let buffer = libc::malloc(mem::size_of_val(items)).cast::<T>();
            if buffer.is_null() {
                libc::free(seq.cast::<c_void>());
                return ptr::null_mut();
            }
            ptr::copy_nonoverlapping(items.as_ptr(), buffer, items.len());
            buffer.cast::<c_void>()
        };
        let len = u32::try_from(items.len()).unwrap_or(u32::MAX);
        seq.write(RawSequence {
            length: len,
            maximum: len,
            buffer,
        });
        seq
    }
}

/// Caller-owned sequence of handles.
pub(crate) fn alloc_handle_sequence(handles: &[RawHandle]) -> *mut RawSequence {
    alloc_sequence(handles)
}

/// Caller-owned sequence of caller-owned strings.
pub(crate) fn alloc_string_sequence(values: &[String]) -> *mut RawSequence {
    let strings: Vec<*mut c_char> = values.iter().map(|v| alloc_string(v)).collect();
    if strings.iter().any(|s| s.is_null()) {
        for s in strings {
            // SAFETY: each pointer came from `alloc_string` (or is null).
            unsafe { libc::free(s.cast::<c_void>()) };
        }
        return ptr::null_mut();
    }
    alloc_sequence(&strings)
}

/// Copy a borrowed C string.
///
/// # Safety
///
/// `value` must be null or a valid NUL-terminated string.
pub(crate) unsafe fn read_string(value: *const c_char) -> Option<String> {
    if value.is_null() {
        return None;
    }
    Some(unsafe { CStr::from_ptr(value) }.to_string_lossy().into_owned())
}

/// Copy a borrowed string sequence. A null sequence reads as empty.
///
/// # Safety
///
/// `seq` must be null or point at a valid sequence of C strings.
pub(crate) unsafe fn read_string_sequence(seq: *const RawSequence) -> Vec<String> {
    if seq.is_null() {
        return Vec::new();
    }
    let seq = unsafe { &*seq };
    if seq.length == 0 || seq.buffer.is_null() {
        return Vec::new();
    }
    let items = unsafe {
        std::slice::from_raw_parts(seq.buffer.cast::<*const c_char>(), seq.length as usize)
    };
    items
        .iter()
        .map(|&item| unsafe { read_string(item) }.unwrap_or_default())
        .collect()
}

/// Write `seq` into an out-parameter, or free it when `out` is null.
///
/// # Safety
///
/// `out` must be null or valid for a pointer write.
pub(crate) unsafe fn store_sequence(out: *mut *mut RawSequence, seq: *mut RawSequence) -> bool {
    if out.is_null() {
        return false;
    }
    unsafe { out.write(seq) };
    !seq.is_null()
}

#[cfg(test)]
mod tests {
    use super::*;

    unsafe fn free_string_sequence(seq: *mut RawSequence) {
        let raw = &*seq;
        let items = std::slice::from_raw_parts(raw.buffer.cast::<*mut c_char>(), raw.length as usize);
        for &item in items {
            libc::free(item.cast::<c_void>());
        }
        libc::free(raw.buffer);
        libc::free(seq.cast::<c_void>());
    }

    #[test]
    fn string_sequence_copies_back() {
        let values = vec!["alpha".to_string(), String::new(), "gamma".to_string()];
        let seq = alloc_string_sequence(&values);
        assert!(!seq.is_null());
        unsafe {
            assert_eq!(read_string_sequence(seq), values);
            free_string_sequence(seq);
        }
    }

    #[test]
    fn empty_sequence_has_null_buffer() {
        let seq = alloc_handle_sequence(&[]);
        unsafe {
            assert_eq!((*seq).length, 0);
            assert!((*seq).buffer.is_null());
            libc::free(seq.cast::<c_void>());
        }
    }
}

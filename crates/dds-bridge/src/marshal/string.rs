// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

use std::ffi::{CStr, CString};
use std::os::raw::{c_char, c_void};
use std::ptr;
use std::slice;

use dds_bridge_sys::RawSequence;

use super::{c_alloc, c_free, Release};
use crate::error::{Error, Result};

/// Copy `value` into a C-allocated, NUL-terminated string.
pub(crate) fn alloc_c_string(value: &str) -> Result<*mut c_char> {
    let owned = CString::new(value)?;
    let bytes = owned.as_bytes_with_nul();
    let out = c_alloc(bytes.len()).cast::<c_char>();
    if out.is_null() {
        return Err(Error::OutOfResources);
    }
    // SAFETY: `out` holds `bytes.len()` bytes.
    unsafe { ptr::copy_nonoverlapping(bytes.as_ptr().cast::<c_char>(), out, bytes.len()) };
    Ok(out)
}

/// Copy a native string. A null pointer reads as `None`.
///
/// # Safety
///
/// `raw` must be null or a valid NUL-terminated string; with
/// [`Release::Free`] it must also be a C-allocated block we now own.
pub unsafe fn string_from_native(raw: *mut c_char, release: Release) -> Option<String> {
    if raw.is_null() {
        return None;
    }
    let value = unsafe { CStr::from_ptr(raw) }
        .to_string_lossy()
        .into_owned();
    if release == Release::Free {
        unsafe { c_free(raw.cast::<c_void>()) };
    }
    Some(value)
}

/// Copy a native string sequence, preserving order.
///
/// A null sequence reads as `None`; a zero-length one as an empty vector.
/// Null elements read as empty strings.
///
/// # Safety
///
/// `raw` must be null or a valid sequence of C strings; with
/// [`Release::Free`] the sequence, its buffer and every element must be
/// C-allocated blocks we now own.
pub unsafe fn strings_from_native(
    raw: *mut RawSequence,
    release: Release,
) -> Option<Vec<String>> {
    if raw.is_null() {
        return None;
    }
    let seq = unsafe { &*raw };
    let items: &[*mut c_char] = if seq.length == 0 || seq.buffer.is_null() {
        &[]
    } else {
        unsafe { slice::from_raw_parts(seq.buffer.cast::<*mut c_char>(), seq.length as usize) }
    };

    let values = items
        .iter()
        .map(|&item| unsafe { string_from_native(item, Release::Keep) }.unwrap_or_default())
        .collect();

    if release == Release::Free {
        unsafe {
            for &item in items {
                c_free(item.cast::<c_void>());
            }
            c_free(seq.buffer);
            c_free(raw.cast::<c_void>());
        }
    }
    Some(values)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interior_nul_is_rejected() {
        assert!(matches!(alloc_c_string("a\0b"), Err(Error::Nul(_))));
    }

    #[test]
    fn string_round_trip_frees_once() {
        let before = crate::marshal::thread_stats();
        let raw = alloc_c_string("héllo").unwrap();
        let back = unsafe { string_from_native(raw, Release::Free) };
        assert_eq!(back.as_deref(), Some("héllo"));
        let after = crate::marshal::thread_stats();
        assert_eq!(after.allocations - before.allocations, 1);
        assert_eq!(after.releases - before.releases, 1);
    }

    #[test]
    fn null_reads_as_absent() {
        unsafe {
            assert_eq!(string_from_native(ptr::null_mut(), Release::Free), None);
            assert_eq!(strings_from_native(ptr::null_mut(), Release::Free), None);
        }
    }
}

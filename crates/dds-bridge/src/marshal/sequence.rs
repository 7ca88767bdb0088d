// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

use std::mem;
use std::os::raw::{c_char, c_void};
use std::ptr;
use std::slice;

use dds_bridge_sys::{RawHandle, RawQosPolicyCount, RawSequence};

use super::string::alloc_c_string;
use super::{c_alloc, c_free, Release};
use crate::error::{Error, Result};

/// Fixed-width element that can be copied bit-for-bit across the boundary.
///
/// # Safety
///
/// Implementors must be `#[repr(C)]` or primitive, with no padding that
/// the native side would read, and valid for any bit pattern it writes.
pub unsafe trait NativeElement: Copy {}

unsafe impl NativeElement for i32 {}
unsafe impl NativeElement for u32 {}
unsafe impl NativeElement for RawHandle {}
unsafe impl NativeElement for RawQosPolicyCount {}

/// Rust-built native sequence, released on drop.
///
/// `None` collections become a null pointer; empty ones a zero-length
/// sequence with a null buffer.
#[derive(Debug)]
pub struct NativeSequence {
    raw: *mut RawSequence,
    /// Elements are C strings owned by this sequence.
    strings: bool,
}

impl NativeSequence {
    /// A null sequence pointer.
    #[must_use]
    pub const fn null() -> Self {
        Self {
            raw: ptr::null_mut(),
            strings: false,
        }
    }

    /// Build a sequence of C strings.
    pub fn from_strings<S: AsRef<str>>(values: Option<&[S]>) -> Result<Self> {
        let Some(values) = values else {
            return Ok(Self::null());
        };
        let mut items: Vec<*mut c_char> = Vec::with_capacity(values.len());
        for value in values {
            match alloc_c_string(value.as_ref()) {
                Ok(item) => items.push(item),
                Err(err) => {
                    free_strings(items);
                    return Err(err);
                }
            }
        }
        Self::adopt_strings(items, Self::allocate)
    }

    /// Take ownership of `items` through `build`; they are freed when it fails.
    fn adopt_strings(
        items: Vec<*mut c_char>,
        build: impl FnOnce(&[*mut c_char]) -> Result<Self>,
    ) -> Result<Self> {
        match build(&items) {
            Ok(mut seq) => {
                seq.strings = true;
                Ok(seq)
            }
            Err(err) => {
                free_strings(items);
                Err(err)
            }
        }
    }

    /// Build a sequence of fixed-width values.
    pub fn from_values<T: NativeElement>(values: Option<&[T]>) -> Result<Self> {
        match values {
            None => Ok(Self::null()),
            Some(values) => Self::allocate(values),
        }
    }

    fn allocate<T: Copy>(items: &[T]) -> Result<Self> {
        let len = u32::try_from(items.len())
            .map_err(|_| Error::InvalidArgument("sequence longer than u32::MAX"))?;
        let raw = c_alloc(mem::size_of::<RawSequence>()).cast::<RawSequence>();
        if raw.is_null() {
            return Err(Error::OutOfResources);
        }
        let buffer = if items.is_empty() {
            ptr::null_mut()
        } else {
            let buffer = c_alloc(mem::size_of_val(items)).cast::<T>();
            if buffer.is_null() {
                // SAFETY: allocated just above.
                unsafe { c_free(raw.cast::<c_void>()) };
                return Err(Error::OutOfResources);
            }
            // SAFETY: `buffer` holds `items.len()` elements of `T`.
            unsafe { ptr::copy_nonoverlapping(items.as_ptr(), buffer, items.len()) };
            buffer.cast::<c_void>()
        };
        // SAFETY: `raw` is a fresh block sized for a `RawSequence`.
        unsafe {
            raw.write(RawSequence {
                length: len,
                maximum: len,
                buffer,
            });
        }
        Ok(Self {
            raw,
            strings: false,
        })
    }

    /// Pointer for a native call that only borrows the sequence.
    #[must_use]
    pub fn as_ptr(&self) -> *const RawSequence {
        self.raw
    }

    #[must_use]
    pub fn is_null(&self) -> bool {
        self.raw.is_null()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        if self.raw.is_null() {
            0
        } else {
            // SAFETY: non-null `raw` is a live sequence we own.
            unsafe { (*self.raw).length as usize }
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Give up ownership, for native calls that take it.
    #[must_use]
    pub fn into_raw(mut self) -> *mut RawSequence {
        mem::replace(&mut self.raw, ptr::null_mut())
    }

    /// Free the sequence now. Calling it again is a no-op.
    pub fn release(&mut self) {
        let raw = mem::replace(&mut self.raw, ptr::null_mut());
        if raw.is_null() {
            return;
        }
        // SAFETY: `raw` was built by `allocate` and not handed out.
        unsafe {
            if self.strings {
                let _ = super::strings_from_native(raw, Release::Free);
            } else {
                c_free((*raw).buffer);
                c_free(raw.cast::<c_void>());
            }
        }
    }
}

impl Drop for NativeSequence {
    fn drop(&mut self) {
        self.release();
    }
}

fn free_strings(items: Vec<*mut c_char>) {
    for item in items {
        // SAFETY: every item came from `alloc_c_string` and is not shared.
        unsafe { c_free(item.cast::<c_void>()) };
    }
}

/// Copy a native value sequence, preserving order.
///
/// # Safety
///
/// `raw` must be null or a valid sequence of `T`; with [`Release::Free`]
/// the sequence and its buffer must be C-allocated blocks we now own.
pub unsafe fn values_from_native<T: NativeElement>(
    raw: *mut RawSequence,
    release: Release,
) -> Option<Vec<T>> {
    if raw.is_null() {
        return None;
    }
    let seq = unsafe { &*raw };
    let values = if seq.length == 0 || seq.buffer.is_null() {
        Vec::new()
    } else {
        unsafe { slice::from_raw_parts(seq.buffer.cast::<T>(), seq.length as usize) }.to_vec()
    };
    if release == Release::Free {
        unsafe {
            c_free(seq.buffer);
            c_free(raw.cast::<c_void>());
        }
    }
    Some(values)
}

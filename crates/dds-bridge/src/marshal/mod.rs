// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Sequence and string marshaling across the native boundary.
//!
//! Direction decides ownership:
//!
//! ```text
//! Rust -> native   NativeSequence (RAII); freed on drop unless into_raw()
//!                  hands it to a native call that takes ownership
//! native -> Rust   *_from_native(raw, Release::Free)  caller-owned result
//!                  *_from_native(raw, Release::Keep)  runtime-owned payload
//! ```
//!
//! All native memory goes through the C allocator. Every allocation and
//! release made here is counted, process-wide and per thread, so tests
//! can assert the absence of leaks and double frees.

mod sequence;
mod string;

use std::cell::Cell;
use std::os::raw::c_void;
use std::sync::atomic::{AtomicU64, Ordering};

pub use sequence::{values_from_native, NativeElement, NativeSequence};
pub use string::{string_from_native, strings_from_native};

/// What to do with a native value after copying it out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Release {
    /// The native runtime still owns it (callback payloads).
    Keep,
    /// Ownership was transferred to us; free it after the copy.
    Free,
}

/// Snapshot of allocator activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AllocStats {
    /// Blocks allocated by the marshaler.
    pub allocations: u64,
    /// Blocks released by the marshaler, whichever side allocated them.
    pub releases: u64,
}

impl AllocStats {
    /// Allocations not yet matched by a release.
    #[must_use]
    pub fn outstanding(&self) -> i64 {
        self.allocations as i64 - self.releases as i64
    }
}

static ALLOCATIONS: AtomicU64 = AtomicU64::new(0);
static RELEASES: AtomicU64 = AtomicU64::new(0);

thread_local! {
    static THREAD_ALLOCATIONS: Cell<u64> = const { Cell::new(0) };
    static THREAD_RELEASES: Cell<u64> = const { Cell::new(0) };
}

/// Process-wide allocator counters.
#[must_use]
pub fn stats() -> AllocStats {
    AllocStats {
        allocations: ALLOCATIONS.load(Ordering::Relaxed),
        releases: RELEASES.load(Ordering::Relaxed),
    }
}

/// Allocator counters of the calling thread only.
#[must_use]
pub fn thread_stats() -> AllocStats {
    AllocStats {
        allocations: THREAD_ALLOCATIONS.with(Cell::get),
        releases: THREAD_RELEASES.with(Cell::get),
    }
}

pub(crate) fn c_alloc(size: usize) -> *mut c_void {
    // SAFETY: plain C allocation; callers null-check.
    let ptr = unsafe { libc::malloc(size.max(1)) };
    if !ptr.is_null() {
        ALLOCATIONS.fetch_add(1, Ordering::Relaxed);
        THREAD_ALLOCATIONS.with(|c| c.set(c.get() + 1));
    }
    ptr
}

/// Free a C block. Null is a no-op and is not counted.
///
/// # Safety
///
/// `ptr` must be null or a live block from the C allocator.
pub(crate) unsafe fn c_free(ptr: *mut c_void) {
    if ptr.is_null() {
        return;
    }
    unsafe { libc::free(ptr) };
    RELEASES.fetch_add(1, Ordering::Relaxed);
    THREAD_RELEASES.with(|c| c.set(c.get() + 1));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_track_alloc_and_free() {
        let before = thread_stats();
        let block = c_alloc(16);
        assert!(!block.is_null());
        unsafe {
            c_free(block);
            c_free(std::ptr::null_mut());
        }
        let after = thread_stats();
        assert_eq!(after.allocations - before.allocations, 1);
        assert_eq!(after.releases - before.releases, 1);
        assert!(stats().allocations >= after.allocations - before.allocations);
    }
}

// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Scalar and aggregate types passed across the native boundary.

use std::fmt;
use std::os::raw::c_void;

/// Opaque address-sized identifier of a native object.
///
/// Never dereferenced on the Rust side. Used as a map key and passed back
/// to native calls unchanged.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct RawHandle(usize);

impl RawHandle {
    /// The null sentinel returned by native factories on failure.
    pub const NULL: RawHandle = RawHandle(0);

    /// Wrap a raw address.
    #[must_use]
    pub const fn from_addr(addr: usize) -> Self {
        RawHandle(addr)
    }

    /// Raw address value.
    #[must_use]
    pub const fn addr(self) -> usize {
        self.0
    }

    /// True for the null sentinel.
    #[must_use]
    pub const fn is_null(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for RawHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// Native return code (DDS numbering).
pub type ReturnCode = i32;

pub const RETCODE_OK: ReturnCode = 0;
pub const RETCODE_ERROR: ReturnCode = 1;
pub const RETCODE_UNSUPPORTED: ReturnCode = 2;
pub const RETCODE_BAD_PARAMETER: ReturnCode = 3;
pub const RETCODE_PRECONDITION_NOT_MET: ReturnCode = 4;
pub const RETCODE_OUT_OF_RESOURCES: ReturnCode = 5;
pub const RETCODE_NOT_ENABLED: ReturnCode = 6;
pub const RETCODE_IMMUTABLE_POLICY: ReturnCode = 7;
pub const RETCODE_INCONSISTENT_POLICY: ReturnCode = 8;
pub const RETCODE_ALREADY_DELETED: ReturnCode = 9;
pub const RETCODE_TIMEOUT: ReturnCode = 10;
pub const RETCODE_NO_DATA: ReturnCode = 11;
pub const RETCODE_ILLEGAL_OPERATION: ReturnCode = 12;

/// Raw status mask bits (DDS numbering).
pub type RawStatusMask = u32;

pub const INCONSISTENT_TOPIC_STATUS: RawStatusMask = 1 << 0;
pub const OFFERED_DEADLINE_MISSED_STATUS: RawStatusMask = 1 << 1;
pub const REQUESTED_DEADLINE_MISSED_STATUS: RawStatusMask = 1 << 2;
pub const OFFERED_INCOMPATIBLE_QOS_STATUS: RawStatusMask = 1 << 5;
pub const REQUESTED_INCOMPATIBLE_QOS_STATUS: RawStatusMask = 1 << 6;
pub const SAMPLE_LOST_STATUS: RawStatusMask = 1 << 7;
pub const SAMPLE_REJECTED_STATUS: RawStatusMask = 1 << 8;
pub const DATA_ON_READERS_STATUS: RawStatusMask = 1 << 9;
pub const DATA_AVAILABLE_STATUS: RawStatusMask = 1 << 10;
pub const LIVELINESS_LOST_STATUS: RawStatusMask = 1 << 11;
pub const LIVELINESS_CHANGED_STATUS: RawStatusMask = 1 << 12;
pub const PUBLICATION_MATCHED_STATUS: RawStatusMask = 1 << 13;
pub const SUBSCRIPTION_MATCHED_STATUS: RawStatusMask = 1 << 14;

/// Counted array of fixed-width elements.
///
/// `buffer` points at `maximum` slots of which the first `length` are
/// initialised. An empty sequence has `length == 0` and may carry a null
/// buffer; a null `*RawSequence` means "no collection at all".
#[repr(C)]
#[derive(Debug)]
pub struct RawSequence {
    pub length: u32,
    pub maximum: u32,
    pub buffer: *mut c_void,
}

/// Native duration (seconds + nanoseconds).
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct RawDuration {
    pub sec: i32,
    pub nanosec: u32,
}

pub const DURATION_INFINITE_SEC: i32 = 0x7fff_ffff;
pub const DURATION_INFINITE_NSEC: u32 = 0x7fff_ffff;
pub const DURATION_ZERO_SEC: i32 = 0;
pub const DURATION_ZERO_NSEC: u32 = 0;

impl RawDuration {
    pub const INFINITE: RawDuration = RawDuration {
        sec: DURATION_INFINITE_SEC,
        nanosec: DURATION_INFINITE_NSEC,
    };

    pub const ZERO: RawDuration = RawDuration {
        sec: DURATION_ZERO_SEC,
        nanosec: DURATION_ZERO_NSEC,
    };

    #[must_use]
    pub const fn is_infinite(&self) -> bool {
        self.sec == DURATION_INFINITE_SEC && self.nanosec == DURATION_INFINITE_NSEC
    }
}

pub type SampleStateMask = u32;
pub type ViewStateMask = u32;
pub type InstanceStateMask = u32;

pub const READ_SAMPLE_STATE: SampleStateMask = 1 << 0;
pub const NOT_READ_SAMPLE_STATE: SampleStateMask = 1 << 1;
pub const ANY_SAMPLE_STATE: SampleStateMask = 0xffff;

pub const NEW_VIEW_STATE: ViewStateMask = 1 << 0;
pub const NOT_NEW_VIEW_STATE: ViewStateMask = 1 << 1;
pub const ANY_VIEW_STATE: ViewStateMask = 0xffff;

pub const ALIVE_INSTANCE_STATE: InstanceStateMask = 1 << 0;
pub const NOT_ALIVE_DISPOSED_INSTANCE_STATE: InstanceStateMask = 1 << 1;
pub const NOT_ALIVE_NO_WRITERS_INSTANCE_STATE: InstanceStateMask = 1 << 2;
pub const ANY_INSTANCE_STATE: InstanceStateMask = 0xffff;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_handle_is_default() {
        assert!(RawHandle::default().is_null());
        assert!(!RawHandle::from_addr(0x1000).is_null());
        assert_eq!(RawHandle::from_addr(0x1000).to_string(), "0x1000");
    }

    #[test]
    fn infinite_duration_sentinel() {
        assert!(RawDuration::INFINITE.is_infinite());
        assert!(!RawDuration::ZERO.is_infinite());
        assert!(!RawDuration {
            sec: DURATION_INFINITE_SEC,
            nanosec: 0
        }
        .is_infinite());
    }

    #[test]
    fn handle_is_pointer_sized() {
        assert_eq!(
            std::mem::size_of::<RawHandle>(),
            std::mem::size_of::<*mut c_void>()
        );
    }
}

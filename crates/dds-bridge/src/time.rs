// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! DDS durations with explicit infinite and zero sentinels.

use dds_bridge_sys::RawDuration;

/// Timeout value for [`WaitSet::wait`](crate::WaitSet::wait).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Duration {
    pub sec: i32,
    pub nanosec: u32,
}

impl Duration {
    /// Block until a condition triggers.
    pub const INFINITE: Duration = Duration {
        sec: RawDuration::INFINITE.sec,
        nanosec: RawDuration::INFINITE.nanosec,
    };

    /// Poll without blocking.
    pub const ZERO: Duration = Duration { sec: 0, nanosec: 0 };

    #[must_use]
    pub const fn new(sec: i32, nanosec: u32) -> Self {
        Self { sec, nanosec }
    }

    #[must_use]
    pub const fn from_millis(millis: u32) -> Self {
        Self {
            sec: (millis / 1000) as i32,
            nanosec: (millis % 1000) * 1_000_000,
        }
    }

    #[must_use]
    pub const fn is_infinite(&self) -> bool {
        self.sec == Self::INFINITE.sec && self.nanosec == Self::INFINITE.nanosec
    }
}

impl Default for Duration {
    fn default() -> Self {
        Self::INFINITE
    }
}

/// Saturates to [`Duration::INFINITE`] beyond the representable range.
impl From<std::time::Duration> for Duration {
    fn from(d: std::time::Duration) -> Self {
        match i32::try_from(d.as_secs()) {
            Ok(sec) if sec < Self::INFINITE.sec => Self {
                sec,
                nanosec: d.subsec_nanos(),
            },
            _ => Self::INFINITE,
        }
    }
}

impl From<Duration> for RawDuration {
    fn from(d: Duration) -> Self {
        RawDuration {
            sec: d.sec,
            nanosec: d.nanosec,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinels_match_native_encoding() {
        assert!(RawDuration::from(Duration::INFINITE).is_infinite());
        assert_eq!(RawDuration::from(Duration::ZERO), RawDuration::ZERO);
    }

    #[test]
    fn std_duration_converts() {
        let d = Duration::from(std::time::Duration::from_millis(1500));
        assert_eq!(d, Duration::new(1, 500_000_000));
        assert_eq!(Duration::from_millis(1500), d);
        assert!(Duration::from(std::time::Duration::MAX).is_infinite());
    }
}

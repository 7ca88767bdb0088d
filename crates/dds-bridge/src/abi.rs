// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! ABI dispatch between the paired native entry points.
//!
//! The native runtime exports each operation once per process word size.
//! Call sites name one logical operation; [`invoke`] picks the variant
//! matching the selected [`Abi`] and runs it exactly once.

use std::fmt;
use std::str::FromStr;

use dds_bridge_sys::{Entry, X64_SUFFIX, X86_SUFFIX};

use crate::error::{Error, Result};

/// Calling convention / word size of a native entry point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Abi {
    X64,
    X86,
}

impl Abi {
    /// ABI of the running process.
    #[must_use]
    pub const fn current() -> Self {
        if cfg!(target_pointer_width = "64") {
            Abi::X64
        } else {
            Abi::X86
        }
    }

    /// Symbol suffix of this ABI's entry points.
    #[must_use]
    pub const fn suffix(self) -> &'static str {
        match self {
            Abi::X64 => X64_SUFFIX,
            Abi::X86 => X86_SUFFIX,
        }
    }
}

impl Default for Abi {
    fn default() -> Self {
        Self::current()
    }
}

impl fmt::Display for Abi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Abi::X64 => "x64",
            Abi::X86 => "x86",
        })
    }
}

impl FromStr for Abi {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "x64" | "x86_64" | "amd64" | "64" => Ok(Abi::X64),
            "x86" | "i686" | "i386" | "32" => Ok(Abi::X86),
            "auto" | "" => Ok(Abi::current()),
            _ => Err(Error::InvalidArgument("unknown ABI name")),
        }
    }
}

/// Run the closure matching `abi`; the other one is never called.
pub fn dispatch<T>(abi: Abi, x64: impl FnOnce() -> T, x86: impl FnOnce() -> T) -> T {
    match abi {
        Abi::X64 => x64(),
        Abi::X86 => x86(),
    }
}

/// Call the `abi` variant of `entry` through `call`.
///
/// A variant that did not resolve fails with [`Error::NativeLibraryLoad`]
/// before anything runs.
pub fn invoke<F: Copy, T>(abi: Abi, entry: &Entry<F>, call: impl FnOnce(F) -> T) -> Result<T> {
    let function = dispatch(abi, || entry.x64, || entry.x86).ok_or_else(|| {
        log::error!("no {abi} entry point for {}", entry.name);
        Error::NativeLibraryLoad {
            operation: entry.name,
            reason: format!("dds_{}{} is not resolved", entry.name, abi.suffix()),
        }
    })?;
    Ok(call(function))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn dispatch_runs_exactly_one_side() {
        let x64 = Cell::new(0);
        let x86 = Cell::new(0);
        let out = dispatch(
            Abi::X86,
            || {
                x64.set(x64.get() + 1);
                64
            },
            || {
                x86.set(x86.get() + 1);
                86
            },
        );
        assert_eq!(out, 86);
        assert_eq!((x64.get(), x86.get()), (0, 1));
    }

    #[test]
    fn missing_variant_is_a_load_error() {
        fn forty_two() -> i32 {
            42
        }
        let entry: Entry<fn() -> i32> = Entry {
            name: "ping",
            x64: Some(forty_two),
            x86: None,
        };
        assert_eq!(invoke(Abi::X64, &entry, |f| f()), Ok(42));
        match invoke(Abi::X86, &entry, |f| f()) {
            Err(Error::NativeLibraryLoad { operation, reason }) => {
                assert_eq!(operation, "ping");
                assert!(reason.contains("dds_ping_x86"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn parse_names() {
        assert_eq!("X64".parse::<Abi>(), Ok(Abi::X64));
        assert_eq!("i686".parse::<Abi>(), Ok(Abi::X86));
        assert_eq!("auto".parse::<Abi>(), Ok(Abi::current()));
        assert!("sparc".parse::<Abi>().is_err());
        assert_eq!(Abi::X86.to_string(), "x86");
    }
}

// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # dds-bridge-native
//!
//! Reference native DDS runtime behind the dual-ABI C surface.
//!
//! Built as a `cdylib` it can be loaded through
//! [`NativeApi::load`](dds_bridge_sys::NativeApi::load); linked as an
//! `rlib` it serves its own entry points through [`symbols`] and
//! [`native_api`] without touching the dynamic loader.
//!
//! ```text
//! exports (dds_<op>_x64 / dds_<op>_x86)
//!     |
//!     v
//! state (object graph, listeners) <---- hooks (raise, triggers)
//!     |                                     |
//!     v                                     v
//! waitset (blocking wait)              listener (propagation, delivery)
//! ```
//!
//! Discovery, matching and data transfer are out of scope; tests stand
//! in for them through [`hooks`].

mod alloc;
mod exports;
pub mod hooks;
mod listener;
mod state;
mod waitset;

use std::os::raw::c_void;

use dds_bridge_sys::{NativeApi, SymbolSource};

pub use listener::{IncompatibleQos, StatusEvent};

/// Symbol table of the entry points linked into this binary.
#[derive(Debug, Clone, Copy, Default)]
pub struct Exports;

impl SymbolSource for Exports {
    fn resolve(&self, symbol: &str) -> Option<*const c_void> {
        exports::lookup(symbol)
    }
}

/// The in-process symbol table.
#[must_use]
pub fn symbols() -> Exports {
    Exports
}

/// Entry-point table resolved against the in-process exports.
#[must_use]
pub fn native_api() -> NativeApi {
    NativeApi::resolve(&Exports)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_entry_point_resolves_for_both_abis() {
        let api = native_api();
        assert!(api.unresolved().is_empty(), "{:?}", api.unresolved());
        assert!(api.waitset_wait.x64.is_some());
        assert!(api.waitset_wait.x86.is_some());
        assert!(!api.is_dynamic());
    }

    #[test]
    fn unknown_symbol_is_absent() {
        assert!(symbols().resolve("dds_participant_create").is_none());
        assert!(symbols().resolve("dds_participant_create_x64").is_some());
    }
}

// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # dds-bridge-sys
//!
//! C ABI vocabulary shared by the native DDS runtime and the safe bridge.
//!
//! Nothing in this crate owns native state. It describes what crosses the
//! boundary: opaque handles, return codes, counted sequences, durations,
//! status payloads, callback signatures, and the [`NativeApi`] table of
//! paired entry points (one per process ABI).
//!
//! # Memory contract
//!
//! Strings and sequences crossing the boundary are allocated with the C
//! allocator on both sides. Ownership moves with the value:
//!
//! - getters returning a sequence or a string hand ownership to the caller,
//! - sequences passed *into* a native call stay owned by the caller,
//! - sequences embedded in a callback payload stay owned by the native
//!   runtime and are only valid for the duration of the callback.

mod api;
mod callbacks;
mod status;
mod types;

pub use api::*;
pub use callbacks::*;
pub use status::*;
pub use types::*;

// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! In-process control surface for driving the runtime from tests.
//!
//! These stand in for the protocol engine: they raise statuses and flip
//! read-condition triggers the way discovery and sample arrival would.

use std::io;
use std::thread::{self, JoinHandle};

use dds_bridge_sys::RawHandle;

use crate::listener::{self, StatusEvent};
use crate::state::{state, Kind, WAKE};

/// Raise `event` on `entity` from the calling thread.
///
/// Returns true when a listener callback ran.
pub fn raise(entity: RawHandle, event: StatusEvent) -> bool {
    listener::raise(entity, &event)
}

/// Raise `event` on `entity` from a dedicated native worker thread.
pub fn raise_on_worker(entity: RawHandle, event: StatusEvent) -> io::Result<JoinHandle<bool>> {
    thread::Builder::new()
        .name("dds-native-worker".into())
        .spawn(move || listener::raise(entity, &event))
}

/// Set the trigger of a read or query condition and wake waiters.
///
/// Returns false when `condition` is not a live read condition.
pub fn set_read_condition_trigger(condition: RawHandle, value: bool) -> bool {
    let updated = match state().objects.get_mut(&condition).map(|obj| &mut obj.kind) {
        Some(Kind::ReadCondition { trigger, .. }) => {
            *trigger = value;
            true
        }
        _ => false,
    };
    if updated {
        WAKE.notify_all();
    }
    updated
}

/// True while `handle` names a live native object.
pub fn is_live(handle: RawHandle) -> bool {
    state().objects.contains_key(&handle)
}

/// Number of native listener objects not yet released.
pub fn listener_count() -> usize {
    state().listeners.len()
}

/// Listener currently installed on `entity`, null when none.
pub fn installed_listener(entity: RawHandle) -> RawHandle {
    state()
        .objects
        .get(&entity)
        .map_or(RawHandle::NULL, |obj| obj.listener)
}

/// True while the native listener `listener` has not been released.
pub fn listener_is_live(listener: RawHandle) -> bool {
    state().listeners.contains_key(&listener)
}

/// True when `entity` is live and has been enabled.
pub fn is_enabled(entity: RawHandle) -> bool {
    state().objects.get(&entity).is_some_and(|obj| obj.enabled)
}

/// Make the next native delete of `handle` fail with `RETCODE_ERROR`.
///
/// Honoured by the read-condition delete and the reader, subscriber and
/// participant `delete_contained_entities` entry points.
pub fn fail_next_delete(handle: RawHandle) {
    state().failing_deletes.insert(handle);
}

// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

use std::fmt;
use std::sync::Arc;

use dds_bridge_sys::RawHandle;

use crate::error::{check, Error, Result};
use crate::runtime::{native, Runtime};

/// Application-triggered condition.
///
/// The native object is deleted when the last clone is dropped; a
/// WaitSet it is attached to holds a clone.
#[derive(Clone)]
pub struct GuardCondition(Arc<GuardInner>);

struct GuardInner {
    handle: RawHandle,
    runtime: Arc<Runtime>,
}

impl GuardCondition {
    pub(crate) fn create(runtime: &Arc<Runtime>) -> Result<Self> {
        let handle = native!(runtime, guardcondition_create())?;
        if handle.is_null() {
            log::debug!("guardcondition_create returned a null handle");
            return Err(Error::Error);
        }
        Ok(Self(Arc::new(GuardInner {
            handle,
            runtime: runtime.clone(),
        })))
    }

    #[must_use]
    pub fn handle(&self) -> RawHandle {
        self.0.handle
    }

    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    pub fn get_trigger_value(&self) -> Result<bool> {
        native!(self.0.runtime, guardcondition_get_trigger_value(self.0.handle))
    }

    /// Set the trigger; `true` wakes every WaitSet this guard is attached to.
    pub fn set_trigger_value(&self, value: bool) -> Result<()> {
        check(native!(
            self.0.runtime,
            guardcondition_set_trigger_value(self.0.handle, value)
        )?)
    }
}

impl Drop for GuardInner {
    fn drop(&mut self) {
        match native!(self.runtime, guardcondition_delete(self.handle)).and_then(check) {
            Ok(()) => log::trace!("guard condition {} deleted", self.handle),
            Err(err) => log::warn!("failed to delete guard condition {}: {err}", self.handle),
        }
    }
}

impl fmt::Debug for GuardCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GuardCondition({})", self.0.handle)
    }
}

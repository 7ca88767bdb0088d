// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

use std::collections::HashMap;
use std::fmt;
use std::ptr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use dds_bridge_sys::{RawDuration, RawHandle, RawSequence};
use parking_lot::Mutex;

use super::Condition;
use crate::error::{check, Error, Result};
use crate::marshal::{values_from_native, Release};
use crate::runtime::{native, Runtime};
use crate::time::Duration;

/// Blocks a thread until one of its attached conditions triggers.
///
/// Only one thread may wait on a WaitSet at a time.
#[derive(Clone)]
pub struct WaitSet(Arc<WaitSetInner>);

pub(crate) struct WaitSetInner {
    handle: RawHandle,
    runtime: Arc<Runtime>,
    /// Local registry of attached conditions.
    conditions: Mutex<HashMap<RawHandle, Condition>>,
    waiting: AtomicBool,
}

/// Resets the single-waiter flag on every exit path.
struct Waiting<'a>(&'a AtomicBool);

impl Drop for Waiting<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl WaitSet {
    pub(crate) fn create(runtime: &Arc<Runtime>) -> Result<Self> {
        let handle = native!(runtime, waitset_create())?;
        if handle.is_null() {
            log::debug!("waitset_create returned a null handle");
            return Err(Error::Error);
        }
        Ok(Self(Arc::new(WaitSetInner {
            handle,
            runtime: runtime.clone(),
            conditions: Mutex::new(HashMap::new()),
            waiting: AtomicBool::new(false),
        })))
    }

    #[must_use]
    pub fn handle(&self) -> RawHandle {
        self.0.handle
    }

    /// True while a thread is inside [`WaitSet::wait`].
    #[must_use]
    pub fn is_waiting(&self) -> bool {
        self.0.waiting.load(Ordering::Acquire)
    }

    /// Attach `condition`. Attaching it again is a no-op.
    ///
    /// A read condition that its reader has deleted, or is deleting, is
    /// refused with `AlreadyDeleted`.
    pub fn attach_condition(&self, condition: impl Into<Condition>) -> Result<()> {
        let condition = condition.into();
        let handle = condition.handle();
        let mut conditions = self.0.conditions.lock();
        if conditions.contains_key(&handle) {
            return Ok(());
        }
        let attach = || {
            check(native!(
                self.0.runtime,
                waitset_attach_condition(self.0.handle, handle)
            )?)
        };
        match condition.as_read() {
            Some(read) => read.attach_to(&self.0, attach)?,
            None => attach()?,
        }
        conditions.insert(handle, condition);
        Ok(())
    }

    /// Detach `condition`; fails with `PreconditionNotMet` when it is not attached.
    pub fn detach_condition(&self, condition: impl Into<Condition>) -> Result<()> {
        let handle = condition.into().handle();
        let mut conditions = self.0.conditions.lock();
        if !conditions.contains_key(&handle) {
            return Err(Error::PreconditionNotMet);
        }
        check(native!(
            self.0.runtime,
            waitset_detach_condition(self.0.handle, handle)
        )?)?;
        if let Some(removed) = conditions.remove(&handle) {
            drop(conditions);
            if let Some(read) = removed.as_read() {
                read.untrack_waitset(&self.0);
            }
        }
        Ok(())
    }

    /// Block until a condition triggers or `timeout` elapses.
    ///
    /// Returns the triggered conditions. A timeout is `Err(Error::Timeout)`;
    /// a second concurrent waiter gets `Err(Error::PreconditionNotMet)`.
    pub fn wait(&self, timeout: Duration) -> Result<Vec<Condition>> {
        if self.0.waiting.swap(true, Ordering::AcqRel) {
            log::debug!("waitset {} already has a waiter", self.0.handle);
            return Err(Error::PreconditionNotMet);
        }
        let _waiting = Waiting(&self.0.waiting);

        let raw_timeout = RawDuration::from(timeout);
        let mut out: *mut RawSequence = ptr::null_mut();
        let out_ptr = ptr::addr_of_mut!(out);
        let rc = native!(self.0.runtime, waitset_wait(self.0.handle, out_ptr, raw_timeout))?;
        // SAFETY: the triggered list is caller-owned, or null when nothing was written.
        let triggered = unsafe { values_from_native::<RawHandle>(out, Release::Free) };
        check(rc)?;
        Ok(self.map_local(&triggered.unwrap_or_default()))
    }

    /// Conditions currently attached, in attach order.
    pub fn get_conditions(&self) -> Result<Vec<Condition>> {
        let mut out: *mut RawSequence = ptr::null_mut();
        let out_ptr = ptr::addr_of_mut!(out);
        let rc = native!(self.0.runtime, waitset_get_conditions(self.0.handle, out_ptr))?;
        // SAFETY: as in `wait`.
        let attached = unsafe { values_from_native::<RawHandle>(out, Release::Free) };
        check(rc)?;
        Ok(self.map_local(&attached.unwrap_or_default()))
    }

    /// Translate native handles through the local registry, dropping unknown ones.
    fn map_local(&self, handles: &[RawHandle]) -> Vec<Condition> {
        let conditions = self.0.conditions.lock();
        handles
            .iter()
            .filter_map(|h| {
                let found = conditions.get(h).cloned();
                if found.is_none() {
                    log::trace!("waitset {}: {h} not attached locally", self.0.handle);
                }
                found
            })
            .collect()
    }
}

impl WaitSetInner {
    /// Drop a condition that its reader is about to delete.
    pub(crate) fn forget(&self, condition: RawHandle) -> Option<Condition> {
        let removed = self.conditions.lock().remove(&condition)?;
        match native!(self.runtime, waitset_detach_condition(self.handle, condition)).and_then(check)
        {
            Ok(()) => {}
            Err(err) => log::debug!("waitset {}: detach of {condition} failed: {err}", self.handle),
        }
        Some(removed)
    }

    /// Reattach a condition whose delete failed after [`Self::forget`].
    pub(crate) fn restore(self: &Arc<Self>, condition: Condition) {
        let handle = condition.handle();
        let mut conditions = self.conditions.lock();
        match native!(self.runtime, waitset_attach_condition(self.handle, handle)).and_then(check) {
            Ok(()) => {
                if let Some(read) = condition.as_read() {
                    read.track_waitset(self);
                }
                conditions.insert(handle, condition);
            }
            Err(err) => log::warn!("waitset {}: reattach of {handle} failed: {err}", self.handle),
        }
    }
}

impl Drop for WaitSetInner {
    fn drop(&mut self) {
        if let Err(err) = native!(self.runtime, waitset_delete(self.handle)).and_then(check) {
            log::warn!("failed to delete waitset {}: {err}", self.handle);
        }
    }
}

impl fmt::Debug for WaitSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WaitSet")
            .field("handle", &self.0.handle)
            .field("attached", &self.0.conditions.lock().len())
            .finish()
    }
}

// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

use std::fmt;
use std::ops::Deref;
use std::ptr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use dds_bridge_sys::{InstanceStateMask, RawHandle, RawSequence, SampleStateMask, ViewStateMask};
use parking_lot::Mutex;

use super::{Condition, WaitSetInner};
use crate::entity::DataReader;
use crate::error::{check, Error, Result};
use crate::marshal::{string_from_native, strings_from_native, NativeSequence, Release};
use crate::runtime::{native, Runtime};

/// Condition on the sample, view and instance states of one reader.
#[derive(Clone)]
pub struct ReadCondition(Arc<ReadConditionInner>);

struct ReadConditionInner {
    handle: RawHandle,
    reader: RawHandle,
    runtime: Arc<Runtime>,
    /// WaitSets this condition is attached to.
    waitsets: Mutex<Vec<Weak<WaitSetInner>>>,
    /// Set while the owning reader deletes this condition; attach is refused.
    releasing: AtomicBool,
    deleted: AtomicBool,
}

/// WaitSets a condition was detached from ahead of a native delete.
///
/// Dropping it keeps the condition detached; [`Detached::restore`]
/// reattaches it when the delete failed.
#[must_use]
pub(crate) struct Detached {
    condition: ReadCondition,
    waitsets: Vec<(Arc<WaitSetInner>, Condition)>,
}

impl Detached {
    pub(crate) fn restore(self) {
        for (waitset, condition) in self.waitsets {
            waitset.restore(condition);
        }
        self.condition.0.releasing.store(false, Ordering::Release);
    }
}

impl ReadCondition {
    pub(crate) fn new(runtime: Arc<Runtime>, handle: RawHandle, reader: RawHandle) -> Self {
        Self(Arc::new(ReadConditionInner {
            handle,
            reader,
            runtime,
            waitsets: Mutex::new(Vec::new()),
            releasing: AtomicBool::new(false),
            deleted: AtomicBool::new(false),
        }))
    }

    #[must_use]
    pub fn handle(&self) -> RawHandle {
        self.0.handle
    }

    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// True once the owning reader released this condition.
    #[must_use]
    pub fn is_deleted(&self) -> bool {
        self.0.deleted.load(Ordering::Acquire)
    }

    fn live(&self) -> Result<&ReadConditionInner> {
        if self.is_deleted() {
            Err(Error::AlreadyDeleted)
        } else {
            Ok(&self.0)
        }
    }

    pub fn get_trigger_value(&self) -> Result<bool> {
        let c = self.live()?;
        native!(c.runtime, readcondition_get_trigger_value(c.handle))
    }

    pub fn get_sample_state_mask(&self) -> Result<SampleStateMask> {
        let c = self.live()?;
        native!(c.runtime, readcondition_get_sample_state_mask(c.handle))
    }

    pub fn get_view_state_mask(&self) -> Result<ViewStateMask> {
        let c = self.live()?;
        native!(c.runtime, readcondition_get_view_state_mask(c.handle))
    }

    pub fn get_instance_state_mask(&self) -> Result<InstanceStateMask> {
        let c = self.live()?;
        native!(c.runtime, readcondition_get_instance_state_mask(c.handle))
    }

    /// The reader that created this condition.
    pub fn get_datareader(&self) -> Result<DataReader> {
        let c = self.live()?;
        c.runtime
            .resolve(c.reader, || DataReader::wrap(c.runtime.clone(), c.reader))
    }

    /// Run the native `attach` and track `waitset`, unless this condition
    /// is being released or already deleted.
    pub(crate) fn attach_to(
        &self,
        waitset: &Arc<WaitSetInner>,
        attach: impl FnOnce() -> Result<()>,
    ) -> Result<()> {
        // held across the native call so `release` cannot slip in between
        let mut waitsets = self.0.waitsets.lock();
        if self.0.releasing.load(Ordering::Acquire) || self.is_deleted() {
            return Err(Error::AlreadyDeleted);
        }
        attach()?;
        waitsets.retain(|w| w.strong_count() > 0);
        waitsets.push(Arc::downgrade(waitset));
        Ok(())
    }

    pub(crate) fn track_waitset(&self, waitset: &Arc<WaitSetInner>) {
        let mut waitsets = self.0.waitsets.lock();
        waitsets.retain(|w| w.strong_count() > 0);
        waitsets.push(Arc::downgrade(waitset));
    }

    pub(crate) fn untrack_waitset(&self, waitset: &Arc<WaitSetInner>) {
        self.0
            .waitsets
            .lock()
            .retain(|w| w.strong_count() > 0 && !ptr::eq(w.as_ptr(), Arc::as_ptr(waitset)));
    }

    /// Refuse further attaches and detach from every WaitSet still holding
    /// this condition.
    pub(crate) fn release(&self) -> Detached {
        let waitsets = {
            let mut waitsets = self.0.waitsets.lock();
            self.0.releasing.store(true, Ordering::Release);
            std::mem::take(&mut *waitsets)
        };
        let waitsets = waitsets
            .iter()
            .filter_map(Weak::upgrade)
            .filter_map(|waitset| {
                let condition = waitset.forget(self.0.handle)?;
                Some((waitset, condition))
            })
            .collect();
        Detached {
            condition: self.clone(),
            waitsets,
        }
    }

    pub(crate) fn mark_deleted(&self) {
        if self.0.deleted.swap(true, Ordering::AcqRel) {
            log::warn!("read condition {} released twice", self.0.handle);
        }
    }
}

impl fmt::Debug for ReadCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReadCondition")
            .field("handle", &self.0.handle)
            .field("reader", &self.0.reader)
            .field("deleted", &self.is_deleted())
            .finish()
    }
}

/// A [`ReadCondition`] further filtered by a query over sample content.
#[derive(Clone)]
pub struct QueryCondition(ReadCondition);

impl QueryCondition {
    pub(crate) fn new(runtime: Arc<Runtime>, handle: RawHandle, reader: RawHandle) -> Self {
        Self(ReadCondition::new(runtime, handle, reader))
    }

    #[must_use]
    pub fn as_read_condition(&self) -> &ReadCondition {
        &self.0
    }

    pub fn get_query_expression(&self) -> Result<String> {
        let c = self.0.live()?;
        let raw = native!(c.runtime, querycondition_get_query_expression(c.handle))?;
        // SAFETY: the native getter returns a caller-owned string or null.
        unsafe { string_from_native(raw, Release::Free) }.ok_or(Error::Error)
    }

    pub fn get_query_parameters(&self) -> Result<Vec<String>> {
        let c = self.0.live()?;
        let mut out: *mut RawSequence = ptr::null_mut();
        let out_ptr = ptr::addr_of_mut!(out);
        let rc = native!(c.runtime, querycondition_get_query_parameters(c.handle, out_ptr))?;
        // SAFETY: ownership of `out` passes to us; it stays null on failure.
        let parameters = unsafe { strings_from_native(out, Release::Free) };
        check(rc)?;
        Ok(parameters.unwrap_or_default())
    }

    pub fn set_query_parameters<S: AsRef<str>>(&self, parameters: &[S]) -> Result<()> {
        let c = self.0.live()?;
        let seq = NativeSequence::from_strings(Some(parameters))?;
        check(native!(
            c.runtime,
            querycondition_set_query_parameters(c.handle, seq.as_ptr())
        )?)
    }
}

impl Deref for QueryCondition {
    type Target = ReadCondition;

    fn deref(&self) -> &ReadCondition {
        &self.0
    }
}

impl fmt::Debug for QueryCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "QueryCondition({})", self.0.handle())
    }
}

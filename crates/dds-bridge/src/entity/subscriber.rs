// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

use std::mem;
use std::ptr;
use std::sync::Arc;

use dds_bridge_sys::{RawHandle, RawSequence};
use parking_lot::Mutex;

use super::{adopt, created, DataReader, DomainParticipant, Topic};
use crate::condition::Detached;
use crate::error::{check, Error, Result};
use crate::listener::bridge::ListenerSlot;
use crate::listener::SubscriberListener;
use crate::marshal::{strings_from_native, NativeSequence, Release};
use crate::runtime::{native, Runtime};

#[derive(Clone)]
pub struct Subscriber(Arc<SubscriberInner>);

struct SubscriberInner {
    handle: RawHandle,
    runtime: Arc<Runtime>,
    listener: ListenerSlot<dyn SubscriberListener>,
    readers: Mutex<Vec<DataReader>>,
}

entity_common!(Subscriber, SubscriberListener);

impl Subscriber {
    pub(crate) fn wrap(runtime: Arc<Runtime>, handle: RawHandle) -> Self {
        Self(Arc::new(SubscriberInner {
            handle,
            runtime,
            listener: ListenerSlot::new(),
            readers: Mutex::new(Vec::new()),
        }))
    }

    pub fn get_participant(&self) -> Result<DomainParticipant> {
        let rt = &self.0.runtime;
        let handle = native!(rt, subscriber_get_participant(self.0.handle))?;
        rt.resolve(handle, || DomainParticipant::wrap(rt.clone(), handle))
    }

    pub fn create_datareader(&self, topic: &Topic) -> Result<DataReader> {
        let rt = &self.0.runtime;
        let handle = native!(rt, subscriber_create_datareader(self.0.handle, topic.handle()))?;
        let reader = DataReader::wrap(rt.clone(), created("subscriber_create_datareader", handle)?);
        self.0.readers.lock().push(reader.clone());
        rt.register(reader.clone().into());
        Ok(reader)
    }

    /// Delete a reader created by this subscriber, releasing its
    /// conditions first.
    pub fn delete_datareader(&self, reader: &DataReader) -> Result<()> {
        if !self.0.readers.lock().iter().any(|r| r.ptr_eq(reader)) {
            self.adopt_children();
        }
        let mut readers = self.0.readers.lock();
        let Some(index) = readers.iter().position(|r| r.ptr_eq(reader)) else {
            return Err(Error::PreconditionNotMet);
        };
        reader.delete_contained_entities()?;
        check(native!(
            self.0.runtime,
            subscriber_delete_datareader(self.0.handle, reader.handle())
        )?)?;
        readers.remove(index);
        drop(readers);
        reader.retire();
        Ok(())
    }

    /// Delete every reader and their conditions.
    pub fn delete_contained_entities(&self) -> Result<()> {
        self.adopt_children();
        let detached = self.release_conditions();
        let deleted = native!(
            self.0.runtime,
            subscriber_delete_contained_entities(self.0.handle)
        )
        .and_then(check);
        if let Err(err) = deleted {
            detached.into_iter().for_each(Detached::restore);
            return Err(err);
        }
        self.retire_children();
        Ok(())
    }

    pub fn get_partition(&self) -> Result<Vec<String>> {
        let mut out: *mut RawSequence = ptr::null_mut();
        let out_ptr = ptr::addr_of_mut!(out);
        let rc = native!(self.0.runtime, subscriber_get_partition(self.0.handle, out_ptr))?;
        // SAFETY: ownership of `out` passes to us; null on failure.
        let names = unsafe { strings_from_native(out, Release::Free) };
        check(rc)?;
        Ok(names.unwrap_or_default())
    }

    pub fn set_partition<S: AsRef<str>>(&self, names: &[S]) -> Result<()> {
        let seq = NativeSequence::from_strings(Some(names))?;
        check(native!(
            self.0.runtime,
            subscriber_set_partition(self.0.handle, seq.as_ptr())
        )?)
    }

    pub(crate) fn release_conditions(&self) -> Vec<Detached> {
        let readers = self.0.readers.lock().clone();
        readers
            .iter()
            .flat_map(DataReader::release_conditions)
            .collect()
    }

    /// Pick up readers registered through another wrapper of this handle.
    pub(crate) fn adopt_children(&self) {
        let rt = &self.0.runtime;
        adopt(
            &self.0.readers,
            rt.registered_children(self.0.handle, |r: &DataReader| {
                native!(rt, datareader_get_subscriber(r.handle()))
            }),
        );
    }

    fn retire_children(&self) {
        let readers = mem::take(&mut *self.0.readers.lock());
        for reader in readers {
            reader.retire();
        }
    }

    pub(crate) fn retire(&self) {
        self.retire_children();
        self.0.listener.unbind();
        self.0.runtime.unregister(self.0.handle);
    }
}

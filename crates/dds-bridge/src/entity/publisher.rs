// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

use std::mem;
use std::ptr;
use std::sync::Arc;

use dds_bridge_sys::{RawHandle, RawSequence};
use parking_lot::Mutex;

use super::{adopt, created, DataWriter, DomainParticipant, Topic};
use crate::error::{check, Error, Result};
use crate::listener::bridge::ListenerSlot;
use crate::listener::PublisherListener;
use crate::marshal::{strings_from_native, NativeSequence, Release};
use crate::runtime::{native, Runtime};

#[derive(Clone)]
pub struct Publisher(Arc<PublisherInner>);

struct PublisherInner {
    handle: RawHandle,
    runtime: Arc<Runtime>,
    listener: ListenerSlot<dyn PublisherListener>,
    writers: Mutex<Vec<DataWriter>>,
}

entity_common!(Publisher, PublisherListener);

impl Publisher {
    pub(crate) fn wrap(runtime: Arc<Runtime>, handle: RawHandle) -> Self {
        Self(Arc::new(PublisherInner {
            handle,
            runtime,
            listener: ListenerSlot::new(),
            writers: Mutex::new(Vec::new()),
        }))
    }

    pub fn get_participant(&self) -> Result<DomainParticipant> {
        let rt = &self.0.runtime;
        let handle = native!(rt, publisher_get_participant(self.0.handle))?;
        rt.resolve(handle, || DomainParticipant::wrap(rt.clone(), handle))
    }

    pub fn create_datawriter(&self, topic: &Topic) -> Result<DataWriter> {
        let rt = &self.0.runtime;
        let handle = native!(rt, publisher_create_datawriter(self.0.handle, topic.handle()))?;
        let writer = DataWriter::wrap(rt.clone(), created("publisher_create_datawriter", handle)?);
        self.0.writers.lock().push(writer.clone());
        rt.register(writer.clone().into());
        Ok(writer)
    }

    /// Delete a writer created by this publisher.
    pub fn delete_datawriter(&self, writer: &DataWriter) -> Result<()> {
        if !self.0.writers.lock().iter().any(|w| w.ptr_eq(writer)) {
            self.adopt_children();
        }
        let mut writers = self.0.writers.lock();
        let Some(index) = writers.iter().position(|w| w.ptr_eq(writer)) else {
            return Err(Error::PreconditionNotMet);
        };
        check(native!(
            self.0.runtime,
            publisher_delete_datawriter(self.0.handle, writer.handle())
        )?)?;
        writers.remove(index);
        drop(writers);
        writer.retire();
        Ok(())
    }

    pub fn delete_contained_entities(&self) -> Result<()> {
        self.adopt_children();
        check(native!(
            self.0.runtime,
            publisher_delete_contained_entities(self.0.handle)
        )?)?;
        self.retire_children();
        Ok(())
    }

    pub fn get_partition(&self) -> Result<Vec<String>> {
        let mut out: *mut RawSequence = ptr::null_mut();
        let out_ptr = ptr::addr_of_mut!(out);
        let rc = native!(self.0.runtime, publisher_get_partition(self.0.handle, out_ptr))?;
        // SAFETY: ownership of `out` passes to us; null on failure.
        let names = unsafe { strings_from_native(out, Release::Free) };
        check(rc)?;
        Ok(names.unwrap_or_default())
    }

    pub fn set_partition<S: AsRef<str>>(&self, names: &[S]) -> Result<()> {
        let seq = NativeSequence::from_strings(Some(names))?;
        check(native!(
            self.0.runtime,
            publisher_set_partition(self.0.handle, seq.as_ptr())
        )?)
    }

    /// Pick up writers registered through another wrapper of this handle.
    pub(crate) fn adopt_children(&self) {
        let rt = &self.0.runtime;
        adopt(
            &self.0.writers,
            rt.registered_children(self.0.handle, |w: &DataWriter| {
                native!(rt, datawriter_get_publisher(w.handle()))
            }),
        );
    }

    fn retire_children(&self) {
        let writers = mem::take(&mut *self.0.writers.lock());
        for writer in writers {
            writer.retire();
        }
    }

    pub(crate) fn retire(&self) {
        self.retire_children();
        self.0.listener.unbind();
        self.0.runtime.unregister(self.0.handle);
    }
}

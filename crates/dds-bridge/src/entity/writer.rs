// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

use std::sync::Arc;

use dds_bridge_sys::RawHandle;

use super::{Publisher, Topic};
use crate::error::Result;
use crate::listener::bridge::ListenerSlot;
use crate::listener::DataWriterListener;
use crate::runtime::{native, Runtime};

#[derive(Clone)]
pub struct DataWriter(Arc<DataWriterInner>);

struct DataWriterInner {
    handle: RawHandle,
    runtime: Arc<Runtime>,
    listener: ListenerSlot<dyn DataWriterListener>,
}

entity_common!(DataWriter, DataWriterListener);

impl DataWriter {
    pub(crate) fn wrap(runtime: Arc<Runtime>, handle: RawHandle) -> Self {
        Self(Arc::new(DataWriterInner {
            handle,
            runtime,
            listener: ListenerSlot::new(),
        }))
    }

    pub fn get_publisher(&self) -> Result<Publisher> {
        let rt = &self.0.runtime;
        let handle = native!(rt, datawriter_get_publisher(self.0.handle))?;
        rt.resolve(handle, || Publisher::wrap(rt.clone(), handle))
    }

    pub fn get_topic(&self) -> Result<Topic> {
        let rt = &self.0.runtime;
        let handle = native!(rt, datawriter_get_topic(self.0.handle))?;
        rt.resolve(handle, || Topic::wrap(rt.clone(), handle))
    }

    pub(crate) fn retire(&self) {
        self.0.listener.unbind();
        self.0.runtime.unregister(self.0.handle);
    }
}

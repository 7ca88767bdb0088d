// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

use std::sync::Arc;

use dds_bridge_sys::RawHandle;

use super::DomainParticipant;
use crate::error::{Error, Result};
use crate::listener::bridge::ListenerSlot;
use crate::listener::TopicListener;
use crate::marshal::{string_from_native, Release};
use crate::runtime::{native, Runtime};

/// A named, typed topic within a participant.
#[derive(Clone)]
pub struct Topic(Arc<TopicInner>);

struct TopicInner {
    handle: RawHandle,
    runtime: Arc<Runtime>,
    listener: ListenerSlot<dyn TopicListener>,
}

entity_common!(Topic, TopicListener);

impl Topic {
    pub(crate) fn wrap(runtime: Arc<Runtime>, handle: RawHandle) -> Self {
        Self(Arc::new(TopicInner {
            handle,
            runtime,
            listener: ListenerSlot::new(),
        }))
    }

    pub fn get_name(&self) -> Result<String> {
        let raw = native!(self.0.runtime, topic_get_name(self.0.handle))?;
        // SAFETY: caller-owned string or null.
        unsafe { string_from_native(raw, Release::Free) }.ok_or(Error::Error)
    }

    pub fn get_type_name(&self) -> Result<String> {
        let raw = native!(self.0.runtime, topic_get_type_name(self.0.handle))?;
        // SAFETY: caller-owned string or null.
        unsafe { string_from_native(raw, Release::Free) }.ok_or(Error::Error)
    }

    pub fn get_participant(&self) -> Result<DomainParticipant> {
        let rt = &self.0.runtime;
        let handle = native!(rt, topic_get_participant(self.0.handle))?;
        rt.resolve(handle, || DomainParticipant::wrap(rt.clone(), handle))
    }

    pub(crate) fn retire(&self) {
        self.0.listener.unbind();
        self.0.runtime.unregister(self.0.handle);
    }
}

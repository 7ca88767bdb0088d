// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! In-memory native object graph.
//!
//! ```text
//! NativeState (static global, one per process)
//! +-- objects:   HashMap<RawHandle, Object>
//! +-- listeners: HashMap<RawHandle, Arc<NativeListener>>
//!
//! Participant --+-- Topic
//!               +-- Publisher  -- DataWriter
//!               +-- Subscriber -- DataReader -- ReadCondition / QueryCondition
//! GuardCondition, WaitSet: standalone
//! ```
//!
//! Handles are never reused within a process.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};

use dds_bridge_sys::{
    InstanceStateMask, RawHandle, RawStatusMask, ReturnCode, SampleStateMask, ViewStateMask,
    RETCODE_ALREADY_DELETED, RETCODE_BAD_PARAMETER, RETCODE_ERROR, RETCODE_OK,
    RETCODE_PRECONDITION_NOT_MET,
};
use parking_lot::{Condvar, Mutex, MutexGuard};

use crate::listener::NativeListener;

static NEXT_HANDLE: AtomicUsize = AtomicUsize::new(0x0001_0000);

/// Woken whenever a condition trigger or a waitset attachment changes.
pub(crate) static WAKE: Condvar = Condvar::new();

pub(crate) fn next_handle() -> RawHandle {
    RawHandle::from_addr(NEXT_HANDLE.fetch_add(0x10, Ordering::Relaxed))
}

pub(crate) fn state() -> MutexGuard<'static, NativeState> {
    static STATE: OnceLock<Mutex<NativeState>> = OnceLock::new();
    STATE.get_or_init(|| Mutex::new(NativeState::default())).lock()
}

#[derive(Debug, Clone)]
pub(crate) struct Query {
    pub expression: String,
    pub parameters: Vec<String>,
}

#[derive(Debug)]
pub(crate) enum Kind {
    Participant {
        domain_id: i32,
        topics: Vec<RawHandle>,
        publishers: Vec<RawHandle>,
        subscribers: Vec<RawHandle>,
    },
    Topic {
        name: String,
        type_name: String,
    },
    Publisher {
        partition: Vec<String>,
        writers: Vec<RawHandle>,
    },
    Subscriber {
        partition: Vec<String>,
        readers: Vec<RawHandle>,
    },
    DataWriter {
        topic: RawHandle,
    },
    DataReader {
        topic: RawHandle,
        conditions: Vec<RawHandle>,
    },
    ReadCondition {
        sample_states: SampleStateMask,
        view_states: ViewStateMask,
        instance_states: InstanceStateMask,
        query: Option<Query>,
        trigger: bool,
    },
    GuardCondition {
        trigger: bool,
    },
    WaitSet {
        conditions: Vec<RawHandle>,
        waiting: bool,
    },
}

#[derive(Debug)]
pub(crate) struct Object {
    /// Owning container, null for participants and standalone objects.
    pub parent: RawHandle,
    pub listener: RawHandle,
    pub mask: RawStatusMask,
    pub enabled: bool,
    pub kind: Kind,
}

impl Object {
    pub fn new(parent: RawHandle, kind: Kind) -> Self {
        Self {
            parent,
            listener: RawHandle::NULL,
            mask: 0,
            enabled: true,
            kind,
        }
    }
}

#[derive(Default)]
pub(crate) struct NativeState {
    pub objects: HashMap<RawHandle, Object>,
    pub listeners: HashMap<RawHandle, Arc<NativeListener>>,
    /// Handles whose next delete fails with `RETCODE_ERROR`.
    pub failing_deletes: HashSet<RawHandle>,
}

impl NativeState {
    pub fn insert(&mut self, parent: RawHandle, kind: Kind) -> RawHandle {
        let handle = next_handle();
        self.objects.insert(handle, Object::new(parent, kind));
        handle
    }

    /// Look up a live object, mapping misses onto native return codes.
    pub fn get(&self, handle: RawHandle) -> Result<&Object, ReturnCode> {
        if handle.is_null() {
            return Err(RETCODE_BAD_PARAMETER);
        }
        self.objects.get(&handle).ok_or(RETCODE_ALREADY_DELETED)
    }

    pub fn get_mut(&mut self, handle: RawHandle) -> Result<&mut Object, ReturnCode> {
        if handle.is_null() {
            return Err(RETCODE_BAD_PARAMETER);
        }
        self.objects.get_mut(&handle).ok_or(RETCODE_ALREADY_DELETED)
    }

    /// Consume an injected delete failure for `handle`.
    pub fn injected_failure(&mut self, handle: RawHandle) -> Result<(), ReturnCode> {
        if self.failing_deletes.remove(&handle) {
            Err(RETCODE_ERROR)
        } else {
            Ok(())
        }
    }

    pub fn parent_of(&self, handle: RawHandle) -> RawHandle {
        self.objects
            .get(&handle)
            .map_or(RawHandle::NULL, |obj| obj.parent)
    }

    /// True when any reader or writer still references `topic`.
    pub fn topic_in_use(&self, topic: RawHandle) -> bool {
        self.objects.values().any(|obj| match obj.kind {
            Kind::DataWriter { topic: t } | Kind::DataReader { topic: t, .. } => t == topic,
            _ => false,
        })
    }

    /// Remove a condition from every waitset that lists it.
    fn detach_everywhere(&mut self, condition: RawHandle) {
        for obj in self.objects.values_mut() {
            if let Kind::WaitSet { conditions, .. } = &mut obj.kind {
                conditions.retain(|&c| c != condition);
            }
        }
    }

    pub fn delete_condition(&mut self, condition: RawHandle) {
        self.detach_everywhere(condition);
        self.objects.remove(&condition);
    }

    pub fn delete_reader_conditions(&mut self, reader: RawHandle) -> Result<(), ReturnCode> {
        let conditions = match &mut self.get_mut(reader)?.kind {
            Kind::DataReader { conditions, .. } => std::mem::take(conditions),
            _ => return Err(RETCODE_BAD_PARAMETER),
        };
        for condition in conditions {
            self.delete_condition(condition);
        }
        Ok(())
    }

    pub fn delete_reader(&mut self, reader: RawHandle) -> Result<(), ReturnCode> {
        self.delete_reader_conditions(reader)?;
        self.objects.remove(&reader);
        Ok(())
    }

    pub fn delete_subscriber_contents(&mut self, subscriber: RawHandle) -> Result<(), ReturnCode> {
        let readers = match &mut self.get_mut(subscriber)?.kind {
            Kind::Subscriber { readers, .. } => std::mem::take(readers),
            _ => return Err(RETCODE_BAD_PARAMETER),
        };
        for reader in readers {
            self.delete_reader(reader)?;
        }
        Ok(())
    }

    pub fn delete_publisher_contents(&mut self, publisher: RawHandle) -> Result<(), ReturnCode> {
        let writers = match &mut self.get_mut(publisher)?.kind {
            Kind::Publisher { writers, .. } => std::mem::take(writers),
            _ => return Err(RETCODE_BAD_PARAMETER),
        };
        for writer in writers {
            self.objects.remove(&writer);
        }
        Ok(())
    }

    pub fn delete_participant_contents(
        &mut self,
        participant: RawHandle,
    ) -> Result<(), ReturnCode> {
        let (topics, publishers, subscribers) = match &mut self.get_mut(participant)?.kind {
            Kind::Participant {
                topics,
                publishers,
                subscribers,
                ..
            } => (
                std::mem::take(topics),
                std::mem::take(publishers),
                std::mem::take(subscribers),
            ),
            _ => return Err(RETCODE_BAD_PARAMETER),
        };
        for publisher in publishers {
            self.delete_publisher_contents(publisher)?;
            self.objects.remove(&publisher);
        }
        for subscriber in subscribers {
            self.delete_subscriber_contents(subscriber)?;
            self.objects.remove(&subscriber);
        }
        for topic in topics {
            self.objects.remove(&topic);
        }
        Ok(())
    }
}

/// Map a `Result` onto the native return-code convention.
pub(crate) fn code(result: Result<(), ReturnCode>) -> ReturnCode {
    match result {
        Ok(()) => RETCODE_OK,
        Err(code) => code,
    }
}

/// Precondition helper used by the delete paths.
pub(crate) fn require_empty(children: &[RawHandle]) -> Result<(), ReturnCode> {
    if children.is_empty() {
        Ok(())
    } else {
        Err(RETCODE_PRECONDITION_NOT_MET)
    }
}

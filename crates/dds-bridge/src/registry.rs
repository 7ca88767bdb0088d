// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Native identity registry.
//!
//! Maps every live native handle to the one wrapper that represents it.
//!
//! ```text
//! native handle ──► EntityRegistry (DashMap, sharded locks)
//!                        │
//!                        └─► AnyEntity::{Participant, Topic, Publisher,
//!                                        Subscriber, DataWriter, DataReader}
//! ```
//!
//! Insertion is insert-if-absent: two threads resolving the same handle
//! through [`IdentityRegistry::find_or_add`] always get the same wrapper.
//! Delete paths must call [`IdentityRegistry::remove`].

use std::fmt;
use std::sync::{Arc, OnceLock};

use dashmap::DashMap;
use dds_bridge_sys::RawHandle;

use crate::entity::{DataReader, DataWriter, DomainParticipant, Publisher, Subscriber, Topic};

/// Kind tag of a registered entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Participant,
    Topic,
    Publisher,
    Subscriber,
    DataWriter,
    DataReader,
}

/// Any registered entity wrapper.
#[derive(Clone)]
pub enum AnyEntity {
    Participant(DomainParticipant),
    Topic(Topic),
    Publisher(Publisher),
    Subscriber(Subscriber),
    DataWriter(DataWriter),
    DataReader(DataReader),
}

impl AnyEntity {
    #[must_use]
    pub fn handle(&self) -> RawHandle {
        match self {
            AnyEntity::Participant(e) => e.handle(),
            AnyEntity::Topic(e) => e.handle(),
            AnyEntity::Publisher(e) => e.handle(),
            AnyEntity::Subscriber(e) => e.handle(),
            AnyEntity::DataWriter(e) => e.handle(),
            AnyEntity::DataReader(e) => e.handle(),
        }
    }

    #[must_use]
    pub fn kind(&self) -> EntityKind {
        match self {
            AnyEntity::Participant(_) => EntityKind::Participant,
            AnyEntity::Topic(_) => EntityKind::Topic,
            AnyEntity::Publisher(_) => EntityKind::Publisher,
            AnyEntity::Subscriber(_) => EntityKind::Subscriber,
            AnyEntity::DataWriter(_) => EntityKind::DataWriter,
            AnyEntity::DataReader(_) => EntityKind::DataReader,
        }
    }

    /// True when both values are the same wrapper instance.
    #[must_use]
    pub fn ptr_eq(&self, other: &AnyEntity) -> bool {
        match (self, other) {
            (AnyEntity::Participant(a), AnyEntity::Participant(b)) => a.ptr_eq(b),
            (AnyEntity::Topic(a), AnyEntity::Topic(b)) => a.ptr_eq(b),
            (AnyEntity::Publisher(a), AnyEntity::Publisher(b)) => a.ptr_eq(b),
            (AnyEntity::Subscriber(a), AnyEntity::Subscriber(b)) => a.ptr_eq(b),
            (AnyEntity::DataWriter(a), AnyEntity::DataWriter(b)) => a.ptr_eq(b),
            (AnyEntity::DataReader(a), AnyEntity::DataReader(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl fmt::Debug for AnyEntity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({})", self.kind(), self.handle())
    }
}

/// Typed view of an [`AnyEntity`].
pub trait FromEntity: Sized {
    const KIND: EntityKind;

    fn from_entity(entity: AnyEntity) -> Option<Self>;
}

macro_rules! entity_variant {
    ($variant:ident, $ty:ty) => {
        impl From<$ty> for AnyEntity {
            fn from(e: $ty) -> Self {
                AnyEntity::$variant(e)
            }
        }

        impl FromEntity for $ty {
            const KIND: EntityKind = EntityKind::$variant;

            fn from_entity(entity: AnyEntity) -> Option<Self> {
                match entity {
                    AnyEntity::$variant(e) => Some(e),
                    _ => None,
                }
            }
        }
    };
}

entity_variant!(Participant, DomainParticipant);
entity_variant!(Topic, Topic);
entity_variant!(Publisher, Publisher);
entity_variant!(Subscriber, Subscriber);
entity_variant!(DataWriter, DataWriter);
entity_variant!(DataReader, DataReader);

/// Handle-to-wrapper map shared by application and callback threads.
pub trait IdentityRegistry: Send + Sync {
    fn find(&self, handle: RawHandle) -> Option<AnyEntity>;

    /// Insert `entity` unless `handle` is already present.
    ///
    /// Returns the resident wrapper, which is `entity` only when the slot
    /// was empty.
    fn add(&self, handle: RawHandle, entity: AnyEntity) -> AnyEntity;

    fn remove(&self, handle: RawHandle) -> Option<AnyEntity>;

    fn len(&self) -> usize;

    /// Snapshot of every resident wrapper.
    fn entities(&self) -> Vec<AnyEntity>;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Resident wrapper for `handle`, built with `make` only when absent.
    fn find_or_add(&self, handle: RawHandle, make: &mut dyn FnMut() -> AnyEntity) -> AnyEntity {
        match self.find(handle) {
            Some(entity) => entity,
            None => self.add(handle, make()),
        }
    }
}

/// [`IdentityRegistry`] backed by a sharded concurrent map.
#[derive(Default)]
pub struct EntityRegistry {
    entries: DashMap<RawHandle, AnyEntity>,
}

impl EntityRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl IdentityRegistry for EntityRegistry {
    fn find(&self, handle: RawHandle) -> Option<AnyEntity> {
        self.entries.get(&handle).map(|e| e.value().clone())
    }

    fn add(&self, handle: RawHandle, entity: AnyEntity) -> AnyEntity {
        self.entries.entry(handle).or_insert(entity).value().clone()
    }

    fn remove(&self, handle: RawHandle) -> Option<AnyEntity> {
        self.entries.remove(&handle).map(|(_, e)| e)
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn entities(&self) -> Vec<AnyEntity> {
        self.entries.iter().map(|e| e.value().clone()).collect()
    }

    fn find_or_add(&self, handle: RawHandle, make: &mut dyn FnMut() -> AnyEntity) -> AnyEntity {
        // the shard stays locked while `make` runs, so only one wrapper is built
        self.entries
            .entry(handle)
            .or_insert_with(make)
            .value()
            .clone()
    }
}

impl fmt::Debug for EntityRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityRegistry")
            .field("entries", &self.entries.len())
            .finish()
    }
}

/// The process-wide registry, created on first use.
pub fn global() -> Arc<dyn IdentityRegistry> {
    static GLOBAL: OnceLock<Arc<EntityRegistry>> = OnceLock::new();
    GLOBAL.get_or_init(|| Arc::new(EntityRegistry::new())).clone()
}

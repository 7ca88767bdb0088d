// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Conditions and WaitSets.
//!
//! ```text
//! DataReader ──owns──► ReadCondition / QueryCondition ◄──┐
//!                            │ weak back-links            │ local registry
//!                            └──────────────────► WaitSet ┘ (handle -> Condition)
//! GuardCondition ── application owned, deleted natively on last drop
//! ```
//!
//! A WaitSet keeps its own handle-to-condition map; it never consults the
//! entity registry. Deleting a reader detaches its conditions from every
//! WaitSet they are attached to before the native objects go away.

mod guard;
mod read;
mod waitset;

pub use guard::GuardCondition;
pub use read::{QueryCondition, ReadCondition};
pub use waitset::WaitSet;

pub(crate) use read::Detached;
pub(crate) use waitset::WaitSetInner;

use dds_bridge_sys::RawHandle;

use crate::error::Result;

/// Anything a [`WaitSet`] can wait on.
#[derive(Clone, Debug)]
pub enum Condition {
    Guard(GuardCondition),
    Read(ReadCondition),
    Query(QueryCondition),
}

impl Condition {
    #[must_use]
    pub fn handle(&self) -> RawHandle {
        match self {
            Condition::Guard(c) => c.handle(),
            Condition::Read(c) => c.handle(),
            Condition::Query(c) => c.handle(),
        }
    }

    pub fn get_trigger_value(&self) -> Result<bool> {
        match self {
            Condition::Guard(c) => c.get_trigger_value(),
            Condition::Read(c) => c.get_trigger_value(),
            Condition::Query(c) => c.get_trigger_value(),
        }
    }

    /// True when both refer to the same wrapper instance.
    #[must_use]
    pub fn ptr_eq(&self, other: &Condition) -> bool {
        match (self, other) {
            (Condition::Guard(a), Condition::Guard(b)) => a.ptr_eq(b),
            (Condition::Read(a), Condition::Read(b)) => a.ptr_eq(b),
            (Condition::Query(a), Condition::Query(b)) => a.ptr_eq(b),
            _ => false,
        }
    }

    /// The read condition behind a read or query condition.
    pub(crate) fn as_read(&self) -> Option<&ReadCondition> {
        match self {
            Condition::Guard(_) => None,
            Condition::Read(c) => Some(c),
            Condition::Query(c) => Some(c.as_read_condition()),
        }
    }
}

impl From<GuardCondition> for Condition {
    fn from(c: GuardCondition) -> Self {
        Condition::Guard(c)
    }
}

impl From<ReadCondition> for Condition {
    fn from(c: ReadCondition) -> Self {
        Condition::Read(c)
    }
}

impl From<QueryCondition> for Condition {
    fn from(c: QueryCondition) -> Self {
        Condition::Query(c)
    }
}

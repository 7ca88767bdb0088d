// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Entity wrappers.
//!
//! Every wrapper is a cheap `Arc` clone; clones share identity, and the
//! registry guarantees one wrapper per live native handle. Containers
//! keep the children they created so deletion can check membership and
//! cascade. Parents are resolved through the native getter and the
//! registry's find-or-create path; such a resolved container adopts its
//! registered children before a membership check or cascade.
//!
//! Delete order for any entity:
//!
//! 1. release what it owns (read conditions first),
//! 2. delete natively,
//! 3. retire the wrapper: drop its listener binding and registry entry.

use std::sync::Arc;

use dds_bridge_sys::RawHandle;
use parking_lot::Mutex;

use crate::error::{check, Result};
use crate::runtime::{native, Runtime};
use crate::status::StatusMask;

/// Operations shared by every entity wrapper.
pub trait Entity {
    /// Listener trait object accepted by this entity.
    type Listener: ?Sized;

    fn handle(&self) -> RawHandle;

    fn enable(&self) -> Result<()>;

    /// Install `listener` for the statuses in `mask`, or clear it with `None`.
    fn set_listener(&self, listener: Option<Arc<Self::Listener>>, mask: StatusMask) -> Result<()>;

    fn get_listener(&self) -> Option<Arc<Self::Listener>>;
}

/// Common wrapper surface; the inner struct needs `handle`, `runtime`
/// and `listener` fields.
macro_rules! entity_common {
    ($ty:ident, $listener:ident) => {
        impl $ty {
            #[must_use]
            pub fn handle(&self) -> dds_bridge_sys::RawHandle {
                self.0.handle
            }

            /// True when both are the same wrapper instance.
            #[must_use]
            pub fn ptr_eq(&self, other: &Self) -> bool {
                std::sync::Arc::ptr_eq(&self.0, &other.0)
            }

            pub fn enable(&self) -> $crate::error::Result<()> {
                $crate::entity::enable(&self.0.runtime, self.0.handle)
            }

            pub fn set_listener(
                &self,
                listener: Option<std::sync::Arc<dyn $listener>>,
                mask: $crate::status::StatusMask,
            ) -> $crate::error::Result<()> {
                self.0
                    .listener
                    .install(&self.0.runtime, self.0.handle, listener, mask)
            }

            #[must_use]
            pub fn get_listener(&self) -> Option<std::sync::Arc<dyn $listener>> {
                self.0.listener.get()
            }

            /// Statuses the installed listener is enabled for.
            #[must_use]
            pub fn get_listener_mask(&self) -> $crate::status::StatusMask {
                self.0.listener.mask()
            }
        }

        impl $crate::entity::Entity for $ty {
            type Listener = dyn $listener;

            fn handle(&self) -> dds_bridge_sys::RawHandle {
                $ty::handle(self)
            }

            fn enable(&self) -> $crate::error::Result<()> {
                $ty::enable(self)
            }

            fn set_listener(
                &self,
                listener: Option<std::sync::Arc<dyn $listener>>,
                mask: $crate::status::StatusMask,
            ) -> $crate::error::Result<()> {
                $ty::set_listener(self, listener, mask)
            }

            fn get_listener(&self) -> Option<std::sync::Arc<dyn $listener>> {
                $ty::get_listener(self)
            }
        }

        impl std::fmt::Debug for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}({})", stringify!($ty), self.0.handle)
            }
        }
    };
}

mod factory;
mod participant;
mod publisher;
mod reader;
mod subscriber;
mod topic;
mod writer;

pub use factory::{DomainParticipantFactory, FactoryBuilder};
pub use participant::DomainParticipant;
pub use publisher::Publisher;
pub use reader::DataReader;
pub use subscriber::Subscriber;
pub use topic::Topic;
pub use writer::DataWriter;

pub(crate) fn enable(runtime: &Runtime, handle: RawHandle) -> Result<()> {
    check(native!(runtime, entity_enable(handle))?)
}

/// Null handles from a native factory surface as `Error::Error`.
pub(crate) fn created(operation: &str, handle: RawHandle) -> Result<RawHandle> {
    if handle.is_null() {
        log::debug!("{operation} returned a null handle");
        Err(crate::error::Error::Error)
    } else {
        Ok(handle)
    }
}


/// Append registered children that `children` does not hold yet.
pub(crate) fn adopt<T: Entity>(children: &Mutex<Vec<T>>, registered: Vec<T>) {
    let mut children = children.lock();
    for child in registered {
        if !children.iter().any(|c| c.handle() == child.handle()) {
            log::trace!("adopting registered child {}", child.handle());
            children.push(child);
        }
    }
}

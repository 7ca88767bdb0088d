// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Shared state every wrapper carries: entry points, ABI and registry.

use std::fmt;
use std::sync::Arc;

use dds_bridge_sys::{Entry, NativeApi, RawHandle};

use crate::abi::{self, Abi};
use crate::error::{Error, Result};
use crate::registry::{AnyEntity, FromEntity, IdentityRegistry};

/// Call a native operation through the runtime's ABI dispatcher.
///
/// `native!(rt, op(args..))` evaluates to `Result<ret>`; the only failure
/// is an unresolved entry point.
macro_rules! native {
    ($rt:expr, $op:ident($($arg:expr),* $(,)?)) => {{
        let rt: &$crate::runtime::Runtime = &$rt;
        rt.call(&rt.api().$op, |f| {
            // SAFETY: entry points are called with the arguments their
            // exported signature declares; handles are opaque to Rust.
            #[allow(unused_unsafe)]
            unsafe {
                f($($arg),*)
            }
        })
    }};
}

pub(crate) use native;

/// Native entry points plus the identity registry they feed.
pub struct Runtime {
    api: NativeApi,
    abi: Abi,
    registry: Arc<dyn IdentityRegistry>,
}

impl Runtime {
    #[must_use]
    pub fn new(api: NativeApi, abi: Abi, registry: Arc<dyn IdentityRegistry>) -> Arc<Self> {
        Arc::new(Self { api, abi, registry })
    }

    #[must_use]
    pub fn api(&self) -> &NativeApi {
        &self.api
    }

    #[must_use]
    pub fn abi(&self) -> Abi {
        self.abi
    }

    #[must_use]
    pub fn registry(&self) -> &dyn IdentityRegistry {
        self.registry.as_ref()
    }

    pub(crate) fn call<F: Copy, T>(&self, entry: &Entry<F>, call: impl FnOnce(F) -> T) -> Result<T> {
        abi::invoke(self.abi, entry, call)
    }

    /// Register a freshly created wrapper.
    ///
    /// A resident entry under a brand-new handle means a delete path
    /// skipped `remove`; the stale wrapper is replaced.
    pub(crate) fn register(&self, entity: AnyEntity) {
        let handle = entity.handle();
        let resident = self.registry.add(handle, entity.clone());
        let fresh = resident.ptr_eq(&entity);
        debug_assert!(fresh, "stale registry entry for {handle}");
        if !fresh {
            log::warn!("stale registry entry {resident:?} replaced by new wrapper");
            self.registry.remove(handle);
            self.registry.add(handle, entity);
        }
    }

    /// Drop the registry entry of a deleted entity.
    pub(crate) fn unregister(&self, handle: RawHandle) {
        if self.registry.remove(handle).is_none() {
            log::warn!("deleted entity {handle} was not registered");
        }
    }

    /// Resident wrapper of type `T` for `handle`, creating it when absent.
    pub(crate) fn resolve<T>(&self, handle: RawHandle, make: impl Fn() -> T) -> Result<T>
    where
        T: FromEntity + Into<AnyEntity>,
    {
        if handle.is_null() {
            return Err(Error::Error);
        }
        let resident = self.registry.find_or_add(handle, &mut || make().into());
        let kind = resident.kind();
        T::from_entity(resident).ok_or_else(|| {
            log::warn!("{handle} is registered as {kind:?}, not {:?}", T::KIND);
            Error::BadParameter
        })
    }

    /// Registered wrappers of type `T` whose native parent is `parent`.
    pub(crate) fn registered_children<T>(
        &self,
        parent: RawHandle,
        parent_of: impl Fn(&T) -> Result<RawHandle>,
    ) -> Vec<T>
    where
        T: FromEntity,
    {
        self.registry
            .entities()
            .into_iter()
            .filter_map(T::from_entity)
            .filter(|child| parent_of(child).is_ok_and(|h| h == parent))
            .collect()
    }

    /// Registered wrapper of type `T`, without creating one.
    pub(crate) fn lookup<T: FromEntity>(&self, handle: RawHandle) -> Option<T> {
        self.registry.find(handle).and_then(T::from_entity)
    }
}

impl fmt::Debug for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("abi", &self.abi)
            .field("api", &self.api)
            .field("registered", &self.registry.len())
            .finish()
    }
}

// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Native entry-point table.
//!
//! The native runtime exports every operation twice, once per supported
//! process ABI, as `dds_<operation>_x64` and `dds_<operation>_x86`. The
//! table keeps both variants side by side in an [`Entry`]; picking the one
//! that matches the running process is the bridge's job.

use std::ffi::OsStr;
use std::fmt;
use std::mem;
use std::os::raw::{c_char, c_void};
use std::sync::Arc;

use libloading::Library;
use thiserror::Error;

use crate::{
    InstanceStateMask, OnDataAvailable, OnDataOnReaders, OnInconsistentTopic, OnLivelinessChanged,
    OnLivelinessLost, OnOfferedDeadlineMissed, OnOfferedIncompatibleQos, OnPublicationMatched,
    OnRequestedDeadlineMissed, OnRequestedIncompatibleQos, OnSampleLost, OnSampleRejected,
    OnSubscriptionMatched, RawDuration, RawHandle, RawSequence, RawStatusMask, ReturnCode,
    SampleStateMask, ViewStateMask,
};

/// Prefix shared by every exported symbol.
pub const SYMBOL_PREFIX: &str = "dds_";
/// Suffix of the 64-bit entry points.
pub const X64_SUFFIX: &str = "_x64";
/// Suffix of the 32-bit entry points.
pub const X86_SUFFIX: &str = "_x86";

/// Where entry-point addresses come from.
pub trait SymbolSource {
    /// Address of `symbol`, or `None` when the source does not export it.
    fn resolve(&self, symbol: &str) -> Option<*const c_void>;
}

impl SymbolSource for Library {
    fn resolve(&self, symbol: &str) -> Option<*const c_void> {
        // SAFETY: the address is only reinterpreted by `NativeApi::resolve`
        // with the signature the runtime exports it under.
        unsafe { self.get::<unsafe extern "C" fn()>(symbol.as_bytes()) }
            .ok()
            .map(|sym| *sym as *const c_void)
    }
}

/// One logical native operation, resolved for both ABIs.
#[derive(Clone, Copy)]
pub struct Entry<F> {
    /// Operation name without prefix or ABI suffix.
    pub name: &'static str,
    pub x64: Option<F>,
    pub x86: Option<F>,
}

impl<F> Entry<F> {
    /// An entry with no resolved variant.
    #[must_use]
    pub const fn unresolved(name: &'static str) -> Self {
        Self {
            name,
            x64: None,
            x86: None,
        }
    }

    /// True when at least one variant resolved.
    #[must_use]
    pub const fn is_resolved(&self) -> bool {
        self.x64.is_some() || self.x86.is_some()
    }
}

impl<F> fmt::Debug for Entry<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entry")
            .field("name", &self.name)
            .field("x64", &self.x64.is_some())
            .field("x86", &self.x86.is_some())
            .finish()
    }
}

/// Failure to open the native library itself.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to load native library {path}: {source}")]
    Library {
        path: String,
        #[source]
        source: libloading::Error,
    },
}

macro_rules! native_api {
    (
        $(
            $(#[$meta:meta])*
            fn $name:ident($($arg:ident: $ty:ty),* $(,)?) $(-> $ret:ty)?;
        )*
    ) => {
        /// Table of native entry points, one [`Entry`] pair per operation.
        #[derive(Clone)]
        pub struct NativeApi {
            $(
                $(#[$meta])*
                pub $name: Entry<unsafe extern "C" fn($($ty),*) $(-> $ret)?>,
            )*
            library: Option<Arc<Library>>,
        }

        impl NativeApi {
            /// Resolve every entry point from `source`.
            ///
            /// Missing symbols leave the corresponding slot empty; the failure
            /// surfaces when that operation is dispatched.
            pub fn resolve(source: &dyn SymbolSource) -> Self {
                Self {
                    $(
                        $name: Entry {
                            name: stringify!($name),
                            x64: source
                                .resolve(concat!("dds_", stringify!($name), "_x64"))
                                // SAFETY: exported under this exact signature.
                                .map(|addr| unsafe {
                                    mem::transmute::<*const c_void, unsafe extern "C" fn($($ty),*) $(-> $ret)?>(addr)
                                }),
                            x86: source
                                .resolve(concat!("dds_", stringify!($name), "_x86"))
                                // SAFETY: exported under this exact signature.
                                .map(|addr| unsafe {
                                    mem::transmute::<*const c_void, unsafe extern "C" fn($($ty),*) $(-> $ret)?>(addr)
                                }),
                        },
                    )*
                    library: None,
                }
            }

            /// Operations for which neither ABI variant resolved.
            #[must_use]
            pub fn unresolved(&self) -> Vec<&'static str> {
                let mut missing = Vec::new();
                $(
                    if !self.$name.is_resolved() {
                        missing.push(stringify!($name));
                    }
                )*
                missing
            }
        }
    };
}

native_api! {
    // --- DomainParticipant ---------------------------------------------
    fn participant_create(domain_id: i32) -> RawHandle;
    fn participant_delete(participant: RawHandle) -> ReturnCode;
    fn participant_get_domain_id(participant: RawHandle) -> i32;
    fn participant_create_topic(
        participant: RawHandle,
        topic_name: *const c_char,
        type_name: *const c_char,
    ) -> RawHandle;
    fn participant_delete_topic(participant: RawHandle, topic: RawHandle) -> ReturnCode;
    fn participant_create_publisher(participant: RawHandle) -> RawHandle;
    fn participant_delete_publisher(participant: RawHandle, publisher: RawHandle) -> ReturnCode;
    fn participant_create_subscriber(participant: RawHandle) -> RawHandle;
    fn participant_delete_subscriber(participant: RawHandle, subscriber: RawHandle) -> ReturnCode;
    fn participant_delete_contained_entities(participant: RawHandle) -> ReturnCode;

    // --- Topic -----------------------------------------------------------
    /// Returns a caller-owned string.
    fn topic_get_name(topic: RawHandle) -> *mut c_char;
    /// Returns a caller-owned string.
    fn topic_get_type_name(topic: RawHandle) -> *mut c_char;
    fn topic_get_participant(topic: RawHandle) -> RawHandle;

    // --- Publisher -------------------------------------------------------
    fn publisher_get_participant(publisher: RawHandle) -> RawHandle;
    fn publisher_create_datawriter(publisher: RawHandle, topic: RawHandle) -> RawHandle;
    fn publisher_delete_datawriter(publisher: RawHandle, writer: RawHandle) -> ReturnCode;
    fn publisher_delete_contained_entities(publisher: RawHandle) -> ReturnCode;
    /// Writes a caller-owned string sequence into `out`.
    fn publisher_get_partition(publisher: RawHandle, out: *mut *mut RawSequence) -> ReturnCode;
    fn publisher_set_partition(publisher: RawHandle, names: *const RawSequence) -> ReturnCode;

    // --- Subscriber ------------------------------------------------------
    fn subscriber_get_participant(subscriber: RawHandle) -> RawHandle;
    fn subscriber_create_datareader(subscriber: RawHandle, topic: RawHandle) -> RawHandle;
    fn subscriber_delete_datareader(subscriber: RawHandle, reader: RawHandle) -> ReturnCode;
    fn subscriber_delete_contained_entities(subscriber: RawHandle) -> ReturnCode;
    /// Writes a caller-owned string sequence into `out`.
    fn subscriber_get_partition(subscriber: RawHandle, out: *mut *mut RawSequence) -> ReturnCode;
    fn subscriber_set_partition(subscriber: RawHandle, names: *const RawSequence) -> ReturnCode;

    // --- DataWriter / DataReader ------------------------------------------
    fn datawriter_get_publisher(writer: RawHandle) -> RawHandle;
    fn datawriter_get_topic(writer: RawHandle) -> RawHandle;
    fn datareader_get_subscriber(reader: RawHandle) -> RawHandle;
    fn datareader_get_topic(reader: RawHandle) -> RawHandle;
    fn datareader_create_readcondition(
        reader: RawHandle,
        sample_states: SampleStateMask,
        view_states: ViewStateMask,
        instance_states: InstanceStateMask,
    ) -> RawHandle;
    fn datareader_create_querycondition(
        reader: RawHandle,
        sample_states: SampleStateMask,
        view_states: ViewStateMask,
        instance_states: InstanceStateMask,
        query_expression: *const c_char,
        query_parameters: *const RawSequence,
    ) -> RawHandle;
    fn datareader_delete_readcondition(reader: RawHandle, condition: RawHandle) -> ReturnCode;
    fn datareader_delete_contained_entities(reader: RawHandle) -> ReturnCode;

    // --- Conditions ------------------------------------------------------
    fn readcondition_get_trigger_value(condition: RawHandle) -> bool;
    fn readcondition_get_sample_state_mask(condition: RawHandle) -> SampleStateMask;
    fn readcondition_get_view_state_mask(condition: RawHandle) -> ViewStateMask;
    fn readcondition_get_instance_state_mask(condition: RawHandle) -> InstanceStateMask;
    /// Returns a caller-owned string.
    fn querycondition_get_query_expression(condition: RawHandle) -> *mut c_char;
    /// Writes a caller-owned string sequence into `out`.
    fn querycondition_get_query_parameters(
        condition: RawHandle,
        out: *mut *mut RawSequence,
    ) -> ReturnCode;
    fn querycondition_set_query_parameters(
        condition: RawHandle,
        parameters: *const RawSequence,
    ) -> ReturnCode;
    fn guardcondition_create() -> RawHandle;
    fn guardcondition_delete(condition: RawHandle) -> ReturnCode;
    fn guardcondition_get_trigger_value(condition: RawHandle) -> bool;
    fn guardcondition_set_trigger_value(condition: RawHandle, value: bool) -> ReturnCode;

    // --- WaitSet ---------------------------------------------------------
    fn waitset_create() -> RawHandle;
    fn waitset_delete(waitset: RawHandle) -> ReturnCode;
    fn waitset_attach_condition(waitset: RawHandle, condition: RawHandle) -> ReturnCode;
    fn waitset_detach_condition(waitset: RawHandle, condition: RawHandle) -> ReturnCode;
    /// Writes a caller-owned sequence of triggered condition handles into `out`.
    fn waitset_wait(
        waitset: RawHandle,
        out: *mut *mut RawSequence,
        timeout: RawDuration,
    ) -> ReturnCode;
    /// Writes a caller-owned sequence of attached condition handles into `out`.
    fn waitset_get_conditions(waitset: RawHandle, out: *mut *mut RawSequence) -> ReturnCode;

    // --- Entity ----------------------------------------------------------
    fn entity_enable(entity: RawHandle) -> ReturnCode;
    fn entity_set_listener(
        entity: RawHandle,
        listener: RawHandle,
        mask: RawStatusMask,
    ) -> ReturnCode;

    // --- Listeners -------------------------------------------------------
    fn topic_listener_new(ctx: *mut c_void, on_inconsistent_topic: OnInconsistentTopic) -> RawHandle;
    fn datawriter_listener_new(
        ctx: *mut c_void,
        on_offered_deadline_missed: OnOfferedDeadlineMissed,
        on_offered_incompatible_qos: OnOfferedIncompatibleQos,
        on_liveliness_lost: OnLivelinessLost,
        on_publication_matched: OnPublicationMatched,
    ) -> RawHandle;
    fn publisher_listener_new(
        ctx: *mut c_void,
        on_offered_deadline_missed: OnOfferedDeadlineMissed,
        on_offered_incompatible_qos: OnOfferedIncompatibleQos,
        on_liveliness_lost: OnLivelinessLost,
        on_publication_matched: OnPublicationMatched,
    ) -> RawHandle;
    fn datareader_listener_new(
        ctx: *mut c_void,
        on_requested_deadline_missed: OnRequestedDeadlineMissed,
        on_requested_incompatible_qos: OnRequestedIncompatibleQos,
        on_sample_rejected: OnSampleRejected,
        on_liveliness_changed: OnLivelinessChanged,
        on_data_available: OnDataAvailable,
        on_subscription_matched: OnSubscriptionMatched,
        on_sample_lost: OnSampleLost,
    ) -> RawHandle;
    fn subscriber_listener_new(
        ctx: *mut c_void,
        on_requested_deadline_missed: OnRequestedDeadlineMissed,
        on_requested_incompatible_qos: OnRequestedIncompatibleQos,
        on_sample_rejected: OnSampleRejected,
        on_liveliness_changed: OnLivelinessChanged,
        on_data_available: OnDataAvailable,
        on_subscription_matched: OnSubscriptionMatched,
        on_sample_lost: OnSampleLost,
        on_data_on_readers: OnDataOnReaders,
    ) -> RawHandle;
    fn participant_listener_new(
        ctx: *mut c_void,
        on_inconsistent_topic: OnInconsistentTopic,
        on_offered_deadline_missed: OnOfferedDeadlineMissed,
        on_offered_incompatible_qos: OnOfferedIncompatibleQos,
        on_liveliness_lost: OnLivelinessLost,
        on_publication_matched: OnPublicationMatched,
        on_requested_deadline_missed: OnRequestedDeadlineMissed,
        on_requested_incompatible_qos: OnRequestedIncompatibleQos,
        on_sample_rejected: OnSampleRejected,
        on_liveliness_changed: OnLivelinessChanged,
        on_data_available: OnDataAvailable,
        on_subscription_matched: OnSubscriptionMatched,
        on_sample_lost: OnSampleLost,
        on_data_on_readers: OnDataOnReaders,
    ) -> RawHandle;
    fn listener_release(listener: RawHandle);
}

impl NativeApi {
    /// Open the shared library at `path` and resolve the table from it.
    ///
    /// The library stays loaded for as long as any clone of the table lives.
    ///
    /// # Safety
    ///
    /// Loading runs the library's initialisers, and every exported
    /// `dds_*` symbol must have the signature declared in this table.
    pub unsafe fn load(path: impl AsRef<OsStr>) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let library = unsafe { Library::new(path) }.map_err(|source| LoadError::Library {
            path: path.to_string_lossy().into_owned(),
            source,
        })?;

        let mut api = Self::resolve(&library);
        api.library = Some(Arc::new(library));

        let missing = api.unresolved();
        if !missing.is_empty() {
            log::warn!(
                "native library {} lacks {} entry points (first: {})",
                path.to_string_lossy(),
                missing.len(),
                missing[0]
            );
        }
        Ok(api)
    }

    /// True when the table keeps a dynamically loaded library alive.
    #[must_use]
    pub fn is_dynamic(&self) -> bool {
        self.library.is_some()
    }
}

impl fmt::Debug for NativeApi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeApi")
            .field("dynamic", &self.library.is_some())
            .field("unresolved", &self.unresolved().len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoSymbols;

    impl SymbolSource for NoSymbols {
        fn resolve(&self, _symbol: &str) -> Option<*const c_void> {
            None
        }
    }

    #[test]
    fn empty_source_leaves_every_entry_unresolved() {
        let api = NativeApi::resolve(&NoSymbols);
        assert!(!api.participant_create.is_resolved());
        assert_eq!(api.participant_create.name, "participant_create");
        assert!(api.unresolved().contains(&"waitset_wait"));
        assert!(!api.is_dynamic());
    }

    #[test]
    fn load_missing_library_fails() {
        let result = unsafe { NativeApi::load("/nonexistent/libdds_native_missing.so") };
        let err = result.expect_err("library should not load");
        assert!(err.to_string().contains("libdds_native_missing"));
    }
}

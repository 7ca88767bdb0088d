// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Callback signatures handed to the native listener constructors.
//!
//! Every callback receives the context pointer supplied at listener
//! construction, the handle of the entity that raised the event (not the
//! listener), and a pointer to the status payload. A `None` slot is
//! silently skipped by the native runtime.

use std::os::raw::c_void;

use crate::{
    RawHandle, RawInconsistentTopicStatus, RawLivelinessChangedStatus, RawLivelinessLostStatus,
    RawOfferedDeadlineMissedStatus, RawOfferedIncompatibleQosStatus, RawPublicationMatchedStatus,
    RawRequestedDeadlineMissedStatus, RawRequestedIncompatibleQosStatus, RawSampleLostStatus,
    RawSampleRejectedStatus, RawSubscriptionMatchedStatus,
};

pub type OnInconsistentTopic = Option<
    unsafe extern "C" fn(ctx: *mut c_void, topic: RawHandle, status: *const RawInconsistentTopicStatus),
>;

pub type OnOfferedDeadlineMissed = Option<
    unsafe extern "C" fn(
        ctx: *mut c_void,
        writer: RawHandle,
        status: *const RawOfferedDeadlineMissedStatus,
    ),
>;

pub type OnOfferedIncompatibleQos = Option<
    unsafe extern "C" fn(
        ctx: *mut c_void,
        writer: RawHandle,
        status: *const RawOfferedIncompatibleQosStatus,
    ),
>;

pub type OnLivelinessLost = Option<
    unsafe extern "C" fn(ctx: *mut c_void, writer: RawHandle, status: *const RawLivelinessLostStatus),
>;

pub type OnPublicationMatched = Option<
    unsafe extern "C" fn(
        ctx: *mut c_void,
        writer: RawHandle,
        status: *const RawPublicationMatchedStatus,
    ),
>;

pub type OnRequestedDeadlineMissed = Option<
    unsafe extern "C" fn(
        ctx: *mut c_void,
        reader: RawHandle,
        status: *const RawRequestedDeadlineMissedStatus,
    ),
>;

pub type OnRequestedIncompatibleQos = Option<
    unsafe extern "C" fn(
        ctx: *mut c_void,
        reader: RawHandle,
        status: *const RawRequestedIncompatibleQosStatus,
    ),
>;

pub type OnSampleRejected = Option<
    unsafe extern "C" fn(ctx: *mut c_void, reader: RawHandle, status: *const RawSampleRejectedStatus),
>;

pub type OnLivelinessChanged = Option<
    unsafe extern "C" fn(
        ctx: *mut c_void,
        reader: RawHandle,
        status: *const RawLivelinessChangedStatus,
    ),
>;

pub type OnDataAvailable = Option<unsafe extern "C" fn(ctx: *mut c_void, reader: RawHandle)>;

pub type OnSubscriptionMatched = Option<
    unsafe extern "C" fn(
        ctx: *mut c_void,
        reader: RawHandle,
        status: *const RawSubscriptionMatchedStatus,
    ),
>;

pub type OnSampleLost = Option<
    unsafe extern "C" fn(ctx: *mut c_void, reader: RawHandle, status: *const RawSampleLostStatus),
>;

pub type OnDataOnReaders = Option<unsafe extern "C" fn(ctx: *mut c_void, subscriber: RawHandle)>;

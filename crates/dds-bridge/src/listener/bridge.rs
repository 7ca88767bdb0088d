// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Binding between Rust listener objects and native listener handles.
//!
//! ```text
//! set_listener(Some(l), mask)
//!     │
//!     ├─► ContextPin: Box<ListenerContext { l, runtime }> ──► ctx pointer
//!     ├─► <dyn XListener as NativeListener>::create(ctx, trampolines)
//!     └─► entity_set_listener(entity, native, mask)
//!
//! native thread ──► on_x::<dyn XListener>(ctx, entity, status)
//!                      clone Arcs out of ctx, convert status,
//!                      look entity up, call handler under catch_unwind
//! ```
//!
//! The binding owns the context. It is released when the listener is
//! replaced or cleared, or when the entity is deleted. Release first
//! tells the native side to drop the listener, which waits for callbacks
//! already running on other threads, and only then frees the context.

use std::mem;
use std::os::raw::c_void;
use std::ptr;
use std::sync::atomic::{AtomicPtr, Ordering};
use std::sync::Arc;

use dds_bridge_sys::{
    OnDataAvailable, OnDataOnReaders, OnInconsistentTopic, OnLivelinessChanged, OnLivelinessLost,
    OnOfferedDeadlineMissed, OnOfferedIncompatibleQos, OnPublicationMatched,
    OnRequestedDeadlineMissed, OnRequestedIncompatibleQos, OnSampleLost, OnSampleRejected,
    OnSubscriptionMatched, RawDeadlineMissedStatus, RawHandle, RawInconsistentTopicStatus,
    RawIncompatibleQosStatus, RawLivelinessChangedStatus, RawLivelinessLostStatus,
    RawPublicationMatchedStatus, RawQosPolicyCount, RawSampleLostStatus, RawSampleRejectedStatus,
    RawSubscriptionMatchedStatus,
};
use parking_lot::Mutex;

use super::fault;
use super::{
    DataReaderListener, DataWriterListener, DomainParticipantListener, PublisherListener,
    SubscriberListener, TopicListener,
};
use crate::entity::{DataReader, DataWriter, Subscriber, Topic};
use crate::error::{check, Error, Result};
use crate::marshal::{values_from_native, Release};
use crate::registry::FromEntity;
use crate::runtime::{native, Runtime};
use crate::status::{
    DeadlineMissedStatus, InconsistentTopicStatus, IncompatibleQosStatus, LivelinessChangedStatus,
    LivelinessLostStatus, PublicationMatchedStatus, QosPolicyCount, SampleLostStatus,
    SampleRejectedStatus, StatusMask, SubscriptionMatchedStatus,
};

/// What the native side hands back to every trampoline.
struct ListenerContext<L: ?Sized> {
    listener: Arc<L>,
    runtime: Arc<Runtime>,
}

/// Owner of the heap context whose address is given to native code.
struct ContextPin<L: ?Sized> {
    ctx: AtomicPtr<ListenerContext<L>>,
}

impl<L: ?Sized> ContextPin<L> {
    fn new(listener: Arc<L>, runtime: Arc<Runtime>) -> Self {
        let ctx = Box::into_raw(Box::new(ListenerContext { listener, runtime }));
        Self {
            ctx: AtomicPtr::new(ctx),
        }
    }

    fn as_ctx(&self) -> *mut c_void {
        self.ctx.load(Ordering::Acquire).cast()
    }

    /// Free the context. Idempotent.
    fn release(&self) {
        let ctx = self.ctx.swap(ptr::null_mut(), Ordering::AcqRel);
        if !ctx.is_null() {
            // SAFETY: produced by `Box::into_raw` in `new`; the swap above
            // makes this the only release.
            drop(unsafe { Box::from_raw(ctx) });
        }
    }

    /// Give up the context without freeing it.
    fn leak(&self) {
        self.ctx.swap(ptr::null_mut(), Ordering::AcqRel);
    }
}

impl<L: ?Sized> Drop for ContextPin<L> {
    fn drop(&mut self) {
        self.release();
    }
}

/// Native listener construction for one listener trait object.
pub(crate) trait NativeListener {
    fn create(runtime: &Runtime, ctx: *mut c_void) -> Result<RawHandle>;
}

/// An installed listener: the Rust object, its native twin and the
/// context linking them.
struct ListenerBinding<L: ?Sized> {
    listener: Arc<L>,
    mask: StatusMask,
    native: RawHandle,
    pin: ContextPin<L>,
    runtime: Arc<Runtime>,
}

impl<L: NativeListener + ?Sized> ListenerBinding<L> {
    fn create(runtime: &Arc<Runtime>, listener: Arc<L>, mask: StatusMask) -> Result<Self> {
        let pin = ContextPin::new(listener.clone(), runtime.clone());
        let native = L::create(runtime, pin.as_ctx())?;
        if native.is_null() {
            log::error!("native listener construction returned a null handle");
            return Err(Error::Error);
        }
        Ok(Self {
            listener,
            mask,
            native,
            pin,
            runtime: runtime.clone(),
        })
    }
}

impl<L: ?Sized> Drop for ListenerBinding<L> {
    fn drop(&mut self) {
        match native!(self.runtime, listener_release(self.native)) {
            Ok(()) => self.pin.release(),
            Err(err) => {
                // the native side may still call in with this context
                log::error!("failed to release listener {}: {err}", self.native);
                self.pin.leak();
            }
        }
    }
}

/// Per-entity listener slot.
pub(crate) struct ListenerSlot<L: ?Sized> {
    binding: Mutex<Option<ListenerBinding<L>>>,
}

impl<L: ?Sized> ListenerSlot<L> {
    pub(crate) fn new() -> Self {
        Self {
            binding: Mutex::new(None),
        }
    }

    pub(crate) fn get(&self) -> Option<Arc<L>> {
        self.binding.lock().as_ref().map(|b| b.listener.clone())
    }

    pub(crate) fn mask(&self) -> StatusMask {
        self.binding
            .lock()
            .as_ref()
            .map_or(StatusMask::NONE, |b| b.mask)
    }

    /// Drop the binding after the entity is gone natively.
    pub(crate) fn unbind(&self) {
        let previous = self.binding.lock().take();
        drop(previous);
    }
}

impl<L: NativeListener + ?Sized> ListenerSlot<L> {
    /// Install `listener` on `entity`, or clear it with `None`.
    ///
    /// On failure the previous listener stays installed.
    pub(crate) fn install(
        &self,
        runtime: &Arc<Runtime>,
        entity: RawHandle,
        listener: Option<Arc<L>>,
        mask: StatusMask,
    ) -> Result<()> {
        let binding = match listener {
            Some(listener) => Some(ListenerBinding::create(runtime, listener, mask)?),
            None => None,
        };
        let (native, bits) = binding
            .as_ref()
            .map_or((RawHandle::NULL, 0), |b| (b.native, b.mask.bits()));

        let mut slot = self.binding.lock();
        check(native!(runtime, entity_set_listener(entity, native, bits))?)?;
        let previous = mem::replace(&mut *slot, binding);
        drop(slot);
        // released without the slot lock: it may wait on running callbacks
        drop(previous);
        log::debug!("listener on {entity} set to {native} (mask {bits:#x})");
        Ok(())
    }
}

impl<L: ?Sized> Drop for ListenerSlot<L> {
    fn drop(&mut self) {
        self.unbind();
    }
}

// --- trampolines -----------------------------------------------------------

/// Clone the context out, then run `call` with the resolved entity.
///
/// # Safety
///
/// `ctx` must be null or the pointer of a live `ContextPin<L>`.
unsafe fn deliver<L: ?Sized, E: FromEntity>(
    ctx: *mut c_void,
    handle: RawHandle,
    callback: &'static str,
    call: impl FnOnce(&L, Option<&E>),
) {
    let ctx = ctx.cast::<ListenerContext<L>>().cast_const();
    // SAFETY: guaranteed by the caller; nothing reads `ctx` after this.
    let Some((listener, runtime)) =
        (unsafe { ctx.as_ref() }).map(|c| (c.listener.clone(), c.runtime.clone()))
    else {
        log::warn!("{callback} raised with a null listener context");
        return;
    };
    fault::guard(callback, || {
        let entity = runtime.lookup::<E>(handle);
        if entity.is_none() {
            log::debug!("{callback}: {handle} has no registered {:?} wrapper", E::KIND);
        }
        call(&listener, entity.as_ref());
    });
}

macro_rules! status_trampoline {
    ($name:ident: $bound:ident, $entity:ty, $raw:ty, $convert:expr) => {
        unsafe extern "C" fn $name<L: $bound + ?Sized>(
            ctx: *mut c_void,
            handle: RawHandle,
            status: *const $raw,
        ) {
            // SAFETY: the status pointer is valid for the duration of the call.
            let Some(status) = (unsafe { status.as_ref().map(|raw| $convert(raw)) }) else {
                log::warn!(concat!(stringify!($name), " raised without a status"));
                return;
            };
            // SAFETY: `ctx` is the pointer this listener was created with.
            unsafe {
                deliver::<L, $entity>(ctx, handle, stringify!($name), |listener, entity| {
                    listener.$name(entity, &status)
                });
            }
        }
    };
}

/// # Safety
///
/// `raw.policies` must be null or a valid `RawQosPolicyCount` sequence.
unsafe fn incompatible_qos(raw: &RawIncompatibleQosStatus) -> IncompatibleQosStatus {
    // SAFETY: the sequence belongs to the native side; copied, not freed.
    let policies =
        unsafe { values_from_native::<RawQosPolicyCount>(raw.policies.cast_mut(), Release::Keep) };
    IncompatibleQosStatus {
        total_count: raw.total_count,
        total_count_change: raw.total_count_change,
        last_policy_id: raw.last_policy_id,
        policies: policies
            .unwrap_or_default()
            .into_iter()
            .map(QosPolicyCount::from)
            .collect(),
    }
}

status_trampoline!(on_inconsistent_topic: TopicListener, Topic, RawInconsistentTopicStatus, InconsistentTopicStatus::from);

status_trampoline!(on_offered_deadline_missed: DataWriterListener, DataWriter, RawDeadlineMissedStatus, DeadlineMissedStatus::from);
status_trampoline!(on_offered_incompatible_qos: DataWriterListener, DataWriter, RawIncompatibleQosStatus, incompatible_qos);
status_trampoline!(on_liveliness_lost: DataWriterListener, DataWriter, RawLivelinessLostStatus, LivelinessLostStatus::from);
status_trampoline!(on_publication_matched: DataWriterListener, DataWriter, RawPublicationMatchedStatus, PublicationMatchedStatus::from);

status_trampoline!(on_requested_deadline_missed: DataReaderListener, DataReader, RawDeadlineMissedStatus, DeadlineMissedStatus::from);
status_trampoline!(on_requested_incompatible_qos: DataReaderListener, DataReader, RawIncompatibleQosStatus, incompatible_qos);
status_trampoline!(on_sample_rejected: DataReaderListener, DataReader, RawSampleRejectedStatus, SampleRejectedStatus::from);
status_trampoline!(on_liveliness_changed: DataReaderListener, DataReader, RawLivelinessChangedStatus, LivelinessChangedStatus::from);
status_trampoline!(on_subscription_matched: DataReaderListener, DataReader, RawSubscriptionMatchedStatus, SubscriptionMatchedStatus::from);
status_trampoline!(on_sample_lost: DataReaderListener, DataReader, RawSampleLostStatus, SampleLostStatus::from);

unsafe extern "C" fn on_data_available<L: DataReaderListener + ?Sized>(
    ctx: *mut c_void,
    handle: RawHandle,
) {
    // SAFETY: `ctx` is the pointer this listener was created with.
    unsafe {
        deliver::<L, DataReader>(ctx, handle, "on_data_available", |listener, reader| {
            listener.on_data_available(reader)
        });
    }
}

unsafe extern "C" fn on_data_on_readers<L: SubscriberListener + ?Sized>(
    ctx: *mut c_void,
    handle: RawHandle,
) {
    // SAFETY: `ctx` is the pointer this listener was created with.
    unsafe {
        deliver::<L, Subscriber>(ctx, handle, "on_data_on_readers", |listener, subscriber| {
            listener.on_data_on_readers(subscriber)
        });
    }
}

// --- native constructors ---------------------------------------------------

struct WriterCallbacks {
    deadline_missed: OnOfferedDeadlineMissed,
    incompatible_qos: OnOfferedIncompatibleQos,
    liveliness_lost: OnLivelinessLost,
    publication_matched: OnPublicationMatched,
}

impl WriterCallbacks {
    fn of<L: DataWriterListener + ?Sized>() -> Self {
        Self {
            deadline_missed: Some(on_offered_deadline_missed::<L>),
            incompatible_qos: Some(on_offered_incompatible_qos::<L>),
            liveliness_lost: Some(on_liveliness_lost::<L>),
            publication_matched: Some(on_publication_matched::<L>),
        }
    }
}

struct ReaderCallbacks {
    deadline_missed: OnRequestedDeadlineMissed,
    incompatible_qos: OnRequestedIncompatibleQos,
    sample_rejected: OnSampleRejected,
    liveliness_changed: OnLivelinessChanged,
    data_available: OnDataAvailable,
    subscription_matched: OnSubscriptionMatched,
    sample_lost: OnSampleLost,
}

impl ReaderCallbacks {
    fn of<L: DataReaderListener + ?Sized>() -> Self {
        Self {
            deadline_missed: Some(on_requested_deadline_missed::<L>),
            incompatible_qos: Some(on_requested_incompatible_qos::<L>),
            sample_rejected: Some(on_sample_rejected::<L>),
            liveliness_changed: Some(on_liveliness_changed::<L>),
            data_available: Some(on_data_available::<L>),
            subscription_matched: Some(on_subscription_matched::<L>),
            sample_lost: Some(on_sample_lost::<L>),
        }
    }
}

impl NativeListener for dyn TopicListener {
    fn create(runtime: &Runtime, ctx: *mut c_void) -> Result<RawHandle> {
        let inconsistent: OnInconsistentTopic = Some(on_inconsistent_topic::<Self>);
        native!(runtime, topic_listener_new(ctx, inconsistent))
    }
}

impl NativeListener for dyn DataWriterListener {
    fn create(runtime: &Runtime, ctx: *mut c_void) -> Result<RawHandle> {
        let w = WriterCallbacks::of::<Self>();
        native!(
            runtime,
            datawriter_listener_new(
                ctx,
                w.deadline_missed,
                w.incompatible_qos,
                w.liveliness_lost,
                w.publication_matched,
            )
        )
    }
}

impl NativeListener for dyn PublisherListener {
    fn create(runtime: &Runtime, ctx: *mut c_void) -> Result<RawHandle> {
        let w = WriterCallbacks::of::<Self>();
        native!(
            runtime,
            publisher_listener_new(
                ctx,
                w.deadline_missed,
                w.incompatible_qos,
                w.liveliness_lost,
                w.publication_matched,
            )
        )
    }
}

impl NativeListener for dyn DataReaderListener {
    fn create(runtime: &Runtime, ctx: *mut c_void) -> Result<RawHandle> {
        let r = ReaderCallbacks::of::<Self>();
        native!(
            runtime,
            datareader_listener_new(
                ctx,
                r.deadline_missed,
                r.incompatible_qos,
                r.sample_rejected,
                r.liveliness_changed,
                r.data_available,
                r.subscription_matched,
                r.sample_lost,
            )
        )
    }
}

impl NativeListener for dyn SubscriberListener {
    fn create(runtime: &Runtime, ctx: *mut c_void) -> Result<RawHandle> {
        let r = ReaderCallbacks::of::<Self>();
        let on_readers: OnDataOnReaders = Some(on_data_on_readers::<Self>);
        native!(
            runtime,
            subscriber_listener_new(
                ctx,
                r.deadline_missed,
                r.incompatible_qos,
                r.sample_rejected,
                r.liveliness_changed,
                r.data_available,
                r.subscription_matched,
                r.sample_lost,
                on_readers,
            )
        )
    }
}

impl NativeListener for dyn DomainParticipantListener {
    fn create(runtime: &Runtime, ctx: *mut c_void) -> Result<RawHandle> {
        let inconsistent: OnInconsistentTopic = Some(on_inconsistent_topic::<Self>);
        let w = WriterCallbacks::of::<Self>();
        let r = ReaderCallbacks::of::<Self>();
        let on_readers: OnDataOnReaders = Some(on_data_on_readers::<Self>);
        native!(
            runtime,
            participant_listener_new(
                ctx,
                inconsistent,
                w.deadline_missed,
                w.incompatible_qos,
                w.liveliness_lost,
                w.publication_matched,
                r.deadline_missed,
                r.incompatible_qos,
                r.sample_rejected,
                r.liveliness_changed,
                r.data_available,
                r.subscription_matched,
                r.sample_lost,
                on_readers,
            )
        )
    }
}

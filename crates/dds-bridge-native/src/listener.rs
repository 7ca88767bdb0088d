// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Native listener objects and status delivery.
//!
//! A status raised on an entity goes to the nearest listener on the
//! entity -> container -> participant chain whose mask enables it.
//! `DATA_AVAILABLE` first looks for a `DATA_ON_READERS` listener on the
//! owning subscriber chain and, when one exists, delivers
//! `on_data_on_readers` instead.
//!
//! Callbacks run without the state lock held, so handlers may call back
//! into the runtime. [`NativeListener::release`] blocks until in-flight
//! callbacks finish, except when invoked from inside one of them.

use std::cell::RefCell;
use std::os::raw::c_void;
use std::ptr;
use std::sync::Arc;

use dds_bridge_sys::{
    OnDataAvailable, OnDataOnReaders, OnInconsistentTopic, OnLivelinessChanged, OnLivelinessLost,
    OnOfferedDeadlineMissed, OnOfferedIncompatibleQos, OnPublicationMatched,
    OnRequestedDeadlineMissed, OnRequestedIncompatibleQos, OnSampleLost, OnSampleRejected,
    OnSubscriptionMatched, RawDeadlineMissedStatus, RawHandle, RawIncompatibleQosStatus,
    RawInconsistentTopicStatus, RawLivelinessChangedStatus, RawLivelinessLostStatus,
    RawPublicationMatchedStatus, RawQosPolicyCount, RawSampleLostStatus, RawSampleRejectedStatus,
    RawSequence, RawStatusMask, RawSubscriptionMatchedStatus, DATA_AVAILABLE_STATUS,
    DATA_ON_READERS_STATUS, INCONSISTENT_TOPIC_STATUS, LIVELINESS_CHANGED_STATUS,
    LIVELINESS_LOST_STATUS, OFFERED_DEADLINE_MISSED_STATUS, OFFERED_INCOMPATIBLE_QOS_STATUS,
    PUBLICATION_MATCHED_STATUS, REQUESTED_DEADLINE_MISSED_STATUS,
    REQUESTED_INCOMPATIBLE_QOS_STATUS, SAMPLE_LOST_STATUS, SAMPLE_REJECTED_STATUS,
    SUBSCRIPTION_MATCHED_STATUS,
};
use parking_lot::{Condvar, Mutex};

use crate::state::{state, Kind, NativeState};

thread_local! {
    /// Listeners whose callbacks are currently running on this thread.
    static DISPATCHING: RefCell<Vec<RawHandle>> = const { RefCell::new(Vec::new()) };
}

/// Callback slots captured at listener construction.
#[derive(Default, Clone, Copy)]
pub(crate) struct Callbacks {
    pub on_inconsistent_topic: OnInconsistentTopic,
    pub on_offered_deadline_missed: OnOfferedDeadlineMissed,
    pub on_offered_incompatible_qos: OnOfferedIncompatibleQos,
    pub on_liveliness_lost: OnLivelinessLost,
    pub on_publication_matched: OnPublicationMatched,
    pub on_requested_deadline_missed: OnRequestedDeadlineMissed,
    pub on_requested_incompatible_qos: OnRequestedIncompatibleQos,
    pub on_sample_rejected: OnSampleRejected,
    pub on_liveliness_changed: OnLivelinessChanged,
    pub on_data_available: OnDataAvailable,
    pub on_subscription_matched: OnSubscriptionMatched,
    pub on_sample_lost: OnSampleLost,
    pub on_data_on_readers: OnDataOnReaders,
}

/// Incompatible-QoS payload with its policy counters.
#[derive(Debug, Clone, Default)]
pub struct IncompatibleQos {
    pub total_count: i32,
    pub total_count_change: i32,
    pub last_policy_id: i32,
    pub policies: Vec<RawQosPolicyCount>,
}

/// A communication status event raised on an entity.
#[derive(Debug, Clone)]
pub enum StatusEvent {
    InconsistentTopic(RawInconsistentTopicStatus),
    OfferedDeadlineMissed(RawDeadlineMissedStatus),
    OfferedIncompatibleQos(IncompatibleQos),
    LivelinessLost(RawLivelinessLostStatus),
    PublicationMatched(RawPublicationMatchedStatus),
    RequestedDeadlineMissed(RawDeadlineMissedStatus),
    RequestedIncompatibleQos(IncompatibleQos),
    SampleRejected(RawSampleRejectedStatus),
    LivelinessChanged(RawLivelinessChangedStatus),
    DataAvailable,
    SubscriptionMatched(RawSubscriptionMatchedStatus),
    SampleLost(RawSampleLostStatus),
}

impl StatusEvent {
    /// Status bit this event is filtered by.
    #[must_use]
    pub fn mask(&self) -> RawStatusMask {
        match self {
            StatusEvent::InconsistentTopic(_) => INCONSISTENT_TOPIC_STATUS,
            StatusEvent::OfferedDeadlineMissed(_) => OFFERED_DEADLINE_MISSED_STATUS,
            StatusEvent::OfferedIncompatibleQos(_) => OFFERED_INCOMPATIBLE_QOS_STATUS,
            StatusEvent::LivelinessLost(_) => LIVELINESS_LOST_STATUS,
            StatusEvent::PublicationMatched(_) => PUBLICATION_MATCHED_STATUS,
            StatusEvent::RequestedDeadlineMissed(_) => REQUESTED_DEADLINE_MISSED_STATUS,
            StatusEvent::RequestedIncompatibleQos(_) => REQUESTED_INCOMPATIBLE_QOS_STATUS,
            StatusEvent::SampleRejected(_) => SAMPLE_REJECTED_STATUS,
            StatusEvent::LivelinessChanged(_) => LIVELINESS_CHANGED_STATUS,
            StatusEvent::DataAvailable => DATA_AVAILABLE_STATUS,
            StatusEvent::SubscriptionMatched(_) => SUBSCRIPTION_MATCHED_STATUS,
            StatusEvent::SampleLost(_) => SAMPLE_LOST_STATUS,
        }
    }
}

/// Native listener object: context pointer plus callback slots.
pub(crate) struct NativeListener {
    handle: RawHandle,
    ctx: usize,
    callbacks: Callbacks,
    gate: Mutex<Gate>,
    idle: Condvar,
}

#[derive(Default)]
struct Gate {
    in_flight: usize,
    released: bool,
}

/// Decrements the in-flight count when a callback returns.
struct InFlight<'a>(&'a NativeListener);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        DISPATCHING.with(|d| {
            let mut d = d.borrow_mut();
            if let Some(pos) = d.iter().rposition(|&h| h == self.0.handle) {
                d.remove(pos);
            }
        });
        let mut gate = self.0.gate.lock();
        gate.in_flight -= 1;
        if gate.in_flight == 0 {
            self.0.idle.notify_all();
        }
    }
}

impl NativeListener {
    pub fn new(handle: RawHandle, ctx: *mut c_void, callbacks: Callbacks) -> Self {
        Self {
            handle,
            ctx: ctx as usize,
            callbacks,
            gate: Mutex::new(Gate::default()),
            idle: Condvar::new(),
        }
    }

    fn enter(&self) -> Option<InFlight<'_>> {
        let mut gate = self.gate.lock();
        if gate.released {
            return None;
        }
        gate.in_flight += 1;
        drop(gate);
        DISPATCHING.with(|d| d.borrow_mut().push(self.handle));
        Some(InFlight(self))
    }

    /// Stop future deliveries and wait out the ones already running.
    pub fn release(&self) {
        let reentrant = DISPATCHING.with(|d| d.borrow().contains(&self.handle));
        let mut gate = self.gate.lock();
        gate.released = true;
        if reentrant {
            log::debug!(
                "listener {} released from its own callback; not waiting",
                self.handle
            );
            return;
        }
        while gate.in_flight > 0 {
            self.idle.wait(&mut gate);
        }
    }

    fn accepts(&self, event: &StatusEvent) -> bool {
        let cb = &self.callbacks;
        match event {
            StatusEvent::InconsistentTopic(_) => cb.on_inconsistent_topic.is_some(),
            StatusEvent::OfferedDeadlineMissed(_) => cb.on_offered_deadline_missed.is_some(),
            StatusEvent::OfferedIncompatibleQos(_) => cb.on_offered_incompatible_qos.is_some(),
            StatusEvent::LivelinessLost(_) => cb.on_liveliness_lost.is_some(),
            StatusEvent::PublicationMatched(_) => cb.on_publication_matched.is_some(),
            StatusEvent::RequestedDeadlineMissed(_) => cb.on_requested_deadline_missed.is_some(),
            StatusEvent::RequestedIncompatibleQos(_) => {
                cb.on_requested_incompatible_qos.is_some()
            }
            StatusEvent::SampleRejected(_) => cb.on_sample_rejected.is_some(),
            StatusEvent::LivelinessChanged(_) => cb.on_liveliness_changed.is_some(),
            StatusEvent::DataAvailable => cb.on_data_available.is_some(),
            StatusEvent::SubscriptionMatched(_) => cb.on_subscription_matched.is_some(),
            StatusEvent::SampleLost(_) => cb.on_sample_lost.is_some(),
        }
    }

    fn deliver(&self, entity: RawHandle, event: &StatusEvent) -> bool {
        let Some(_in_flight) = self.enter() else {
            return false;
        };
        let ctx = self.ctx as *mut c_void;
        let cb = &self.callbacks;

        // SAFETY: the callbacks and `ctx` were supplied together by the
        // listener's owner, who keeps them valid until `release` returns.
        unsafe {
            match event {
                StatusEvent::InconsistentTopic(s) => call(cb.on_inconsistent_topic, ctx, entity, s),
                StatusEvent::OfferedDeadlineMissed(s) => {
                    call(cb.on_offered_deadline_missed, ctx, entity, s)
                }
                StatusEvent::OfferedIncompatibleQos(s) => {
                    with_incompatible(s, |raw| call(cb.on_offered_incompatible_qos, ctx, entity, raw))
                }
                StatusEvent::LivelinessLost(s) => call(cb.on_liveliness_lost, ctx, entity, s),
                StatusEvent::PublicationMatched(s) => {
                    call(cb.on_publication_matched, ctx, entity, s)
                }
                StatusEvent::RequestedDeadlineMissed(s) => {
                    call(cb.on_requested_deadline_missed, ctx, entity, s)
                }
                StatusEvent::RequestedIncompatibleQos(s) => with_incompatible(s, |raw| {
                    call(cb.on_requested_incompatible_qos, ctx, entity, raw)
                }),
                StatusEvent::SampleRejected(s) => call(cb.on_sample_rejected, ctx, entity, s),
                StatusEvent::LivelinessChanged(s) => {
                    call(cb.on_liveliness_changed, ctx, entity, s)
                }
                StatusEvent::DataAvailable => match cb.on_data_available {
                    Some(f) => {
                        f(ctx, entity);
                        true
                    }
                    None => false,
                },
                StatusEvent::SubscriptionMatched(s) => {
                    call(cb.on_subscription_matched, ctx, entity, s)
                }
                StatusEvent::SampleLost(s) => call(cb.on_sample_lost, ctx, entity, s),
            }
        }
    }

    fn deliver_data_on_readers(&self, subscriber: RawHandle) -> bool {
        let Some(_in_flight) = self.enter() else {
            return false;
        };
        match self.callbacks.on_data_on_readers {
            // SAFETY: see `deliver`.
            Some(f) => {
                unsafe { f(self.ctx as *mut c_void, subscriber) };
                true
            }
            None => false,
        }
    }
}

unsafe fn call<S>(
    callback: Option<unsafe extern "C" fn(*mut c_void, RawHandle, *const S)>,
    ctx: *mut c_void,
    entity: RawHandle,
    status: &S,
) -> bool {
    match callback {
        Some(f) => {
            unsafe { f(ctx, entity, ptr::from_ref(status)) };
            true
        }
        None => false,
    }
}

/// Build the callback-scoped payload; the policy sequence borrows `status`.
fn with_incompatible(
    status: &IncompatibleQos,
    f: impl FnOnce(&RawIncompatibleQosStatus) -> bool,
) -> bool {
    let len = u32::try_from(status.policies.len()).unwrap_or(u32::MAX);
    let policies = RawSequence {
        length: len,
        maximum: len,
        buffer: status.policies.as_ptr().cast_mut().cast::<c_void>(),
    };
    let raw = RawIncompatibleQosStatus {
        total_count: status.total_count,
        total_count_change: status.total_count_change,
        last_policy_id: status.last_policy_id,
        policies: ptr::from_ref(&policies),
    };
    f(&raw)
}

/// Walk `start` and its ancestors for a listener enabling `mask`.
fn find_listener(
    state: &NativeState,
    start: RawHandle,
    mask: RawStatusMask,
    wants: impl Fn(&NativeListener) -> bool,
) -> Option<(RawHandle, Arc<NativeListener>)> {
    let mut current = start;
    while !current.is_null() {
        let obj = state.objects.get(&current)?;
        if obj.mask & mask != 0 {
            if let Some(listener) = state.listeners.get(&obj.listener) {
                if wants(listener) {
                    return Some((current, Arc::clone(listener)));
                }
            }
        }
        current = obj.parent;
    }
    None
}

enum Route {
    Status(Arc<NativeListener>),
    DataOnReaders(RawHandle, Arc<NativeListener>),
}

fn route(entity: RawHandle, event: &StatusEvent) -> Option<Route> {
    let state = state();
    let obj = state.objects.get(&entity)?;

    if matches!(event, StatusEvent::DataAvailable) && matches!(obj.kind, Kind::DataReader { .. })
    {
        let subscriber = obj.parent;
        if let Some((_, listener)) = find_listener(&state, subscriber, DATA_ON_READERS_STATUS, |l| {
            l.callbacks.on_data_on_readers.is_some()
        }) {
            return Some(Route::DataOnReaders(subscriber, listener));
        }
    }

    find_listener(&state, entity, event.mask(), |l| l.accepts(event))
        .map(|(_, listener)| Route::Status(listener))
}

/// Deliver `event` raised on `entity`. Returns true when a callback ran.
pub(crate) fn raise(entity: RawHandle, event: &StatusEvent) -> bool {
    match route(entity, event) {
        Some(Route::Status(listener)) => listener.deliver(entity, event),
        Some(Route::DataOnReaders(subscriber, listener)) => {
            listener.deliver_data_on_readers(subscriber)
        }
        None => {
            log::trace!("no listener for status {:#x} on {}", event.mask(), entity);
            false
        }
    }
}

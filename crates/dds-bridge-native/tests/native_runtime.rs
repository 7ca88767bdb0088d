// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Native runtime driven directly through its entry-point table.

use std::os::raw::c_void;
use std::ptr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use dds_bridge_native::hooks;
use dds_bridge_native::{native_api, StatusEvent};
use dds_bridge_sys::{
    NativeApi, RawDuration, RawHandle, RawSequence, RawSubscriptionMatchedStatus, ANY_INSTANCE_STATE,
    ANY_SAMPLE_STATE, ANY_VIEW_STATE, DATA_AVAILABLE_STATUS, DATA_ON_READERS_STATUS, RETCODE_OK,
    RETCODE_PRECONDITION_NOT_MET, RETCODE_TIMEOUT, SUBSCRIPTION_MATCHED_STATUS,
};

struct Graph {
    api: NativeApi,
    participant: RawHandle,
    topic: RawHandle,
    subscriber: RawHandle,
    reader: RawHandle,
}

fn graph() -> Graph {
    let api = native_api();
    unsafe {
        let participant = (api.participant_create.x64.unwrap())(0);
        let topic = (api.participant_create_topic.x64.unwrap())(
            participant,
            c"T".as_ptr(),
            c"TypeX".as_ptr(),
        );
        let subscriber = (api.participant_create_subscriber.x64.unwrap())(participant);
        let reader = (api.subscriber_create_datareader.x64.unwrap())(subscriber, topic);
        assert!(!reader.is_null());
        Graph {
            api,
            participant,
            topic,
            subscriber,
            reader,
        }
    }
}

unsafe fn take_handles(seq: *mut RawSequence) -> Vec<RawHandle> {
    let raw = &*seq;
    let out = if raw.length == 0 {
        Vec::new()
    } else {
        std::slice::from_raw_parts(raw.buffer.cast::<RawHandle>(), raw.length as usize).to_vec()
    };
    libc::free(raw.buffer);
    libc::free(seq.cast::<c_void>());
    out
}

unsafe extern "C" fn count_matched(
    ctx: *mut c_void,
    _reader: RawHandle,
    status: *const RawSubscriptionMatchedStatus,
) {
    let counter = &*ctx.cast::<AtomicUsize>();
    counter.fetch_add((*status).current_count as usize, Ordering::SeqCst);
}

unsafe extern "C" fn count_data(ctx: *mut c_void, _entity: RawHandle) {
    (*ctx.cast::<AtomicUsize>()).fetch_add(1, Ordering::SeqCst);
}

#[test]
fn delete_requires_empty_container_until_cascade() {
    let g = graph();
    unsafe {
        let delete = g.api.participant_delete.x64.unwrap();
        assert_eq!(delete(g.participant), RETCODE_PRECONDITION_NOT_MET);

        let cascade = g.api.participant_delete_contained_entities.x86.unwrap();
        assert_eq!(cascade(g.participant), RETCODE_OK);
        assert!(!hooks::is_live(g.reader));
        assert!(!hooks::is_live(g.subscriber));
        assert!(!hooks::is_live(g.topic));
        assert_eq!(delete(g.participant), RETCODE_OK);
    }
}

#[test]
fn participant_listener_receives_reader_status() {
    let g = graph();
    let counter = AtomicUsize::new(0);
    unsafe {
        let listener = (g.api.participant_listener_new.x64.unwrap())(
            ptr::from_ref(&counter).cast_mut().cast::<c_void>(),
            None,
            None,
            None,
            None,
            None,
            None,
            None,
            None,
            None,
            None,
            Some(count_matched),
            None,
            None,
        );
        let rc = (g.api.entity_set_listener.x64.unwrap())(
            g.participant,
            listener,
            SUBSCRIPTION_MATCHED_STATUS,
        );
        assert_eq!(rc, RETCODE_OK);

        let status = RawSubscriptionMatchedStatus {
            current_count: 1,
            ..Default::default()
        };
        assert!(hooks::raise(g.reader, StatusEvent::SubscriptionMatched(status)));
        assert_eq!(counter.load(Ordering::SeqCst), 1);

        (g.api.listener_release.x64.unwrap())(listener);
        assert!(!hooks::listener_is_live(listener));
        assert!(!hooks::raise(g.reader, StatusEvent::SubscriptionMatched(status)));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }
}

#[test]
fn data_on_readers_takes_precedence_over_data_available() {
    let g = graph();
    let on_readers = AtomicUsize::new(0);
    let on_data = AtomicUsize::new(0);
    unsafe {
        let reader_listener = (g.api.datareader_listener_new.x64.unwrap())(
            ptr::from_ref(&on_data).cast_mut().cast::<c_void>(),
            None,
            None,
            None,
            None,
            Some(count_data),
            None,
            None,
        );
        let subscriber_listener = (g.api.subscriber_listener_new.x64.unwrap())(
            ptr::from_ref(&on_readers).cast_mut().cast::<c_void>(),
            None,
            None,
            None,
            None,
            None,
            None,
            None,
            Some(count_data),
        );
        let set = g.api.entity_set_listener.x64.unwrap();
        assert_eq!(set(g.reader, reader_listener, DATA_AVAILABLE_STATUS), RETCODE_OK);
        assert_eq!(
            set(g.subscriber, subscriber_listener, DATA_ON_READERS_STATUS),
            RETCODE_OK
        );

        assert!(hooks::raise(g.reader, StatusEvent::DataAvailable));
        assert_eq!(on_readers.load(Ordering::SeqCst), 1);
        assert_eq!(on_data.load(Ordering::SeqCst), 0);

        assert_eq!(set(g.subscriber, RawHandle::NULL, 0), RETCODE_OK);
        assert!(hooks::raise(g.reader, StatusEvent::DataAvailable));
        assert_eq!(on_data.load(Ordering::SeqCst), 1);

        let release = g.api.listener_release.x64.unwrap();
        release(reader_listener);
        release(subscriber_listener);
    }
}

#[test]
fn wait_times_out_with_empty_result() {
    let api = native_api();
    unsafe {
        let waitset = (api.waitset_create.x64.unwrap())();
        let guard = (api.guardcondition_create.x64.unwrap())();
        assert_eq!((api.waitset_attach_condition.x64.unwrap())(waitset, guard), RETCODE_OK);

        let mut out: *mut RawSequence = ptr::null_mut();
        let started = Instant::now();
        let rc = (api.waitset_wait.x64.unwrap())(
            waitset,
            &mut out,
            RawDuration {
                sec: 0,
                nanosec: 20_000_000,
            },
        );
        assert_eq!(rc, RETCODE_TIMEOUT);
        assert!(started.elapsed() >= Duration::from_millis(15));
        assert!(take_handles(out).is_empty());

        assert_eq!((api.guardcondition_set_trigger_value.x64.unwrap())(guard, true), RETCODE_OK);
        let rc = (api.waitset_wait.x64.unwrap())(waitset, &mut out, RawDuration::INFINITE);
        assert_eq!(rc, RETCODE_OK);
        assert_eq!(take_handles(out), vec![guard]);

        assert_eq!((api.waitset_delete.x64.unwrap())(waitset), RETCODE_OK);
        assert_eq!((api.guardcondition_delete.x64.unwrap())(guard), RETCODE_OK);
    }
}

#[test]
fn deleting_reader_conditions_detaches_them_from_waitsets() {
    let g = graph();
    unsafe {
        let condition = (g.api.datareader_create_readcondition.x64.unwrap())(
            g.reader,
            ANY_SAMPLE_STATE,
            ANY_VIEW_STATE,
            ANY_INSTANCE_STATE,
        );
        let waitset = (g.api.waitset_create.x64.unwrap())();
        assert_eq!(
            (g.api.waitset_attach_condition.x64.unwrap())(waitset, condition),
            RETCODE_OK
        );
        assert_eq!(
            (g.api.subscriber_delete_datareader.x64.unwrap())(g.subscriber, g.reader),
            RETCODE_PRECONDITION_NOT_MET
        );

        assert_eq!(
            (g.api.subscriber_delete_contained_entities.x64.unwrap())(g.subscriber),
            RETCODE_OK
        );
        assert!(!hooks::is_live(condition));

        let mut out: *mut RawSequence = ptr::null_mut();
        assert_eq!(
            (g.api.waitset_get_conditions.x64.unwrap())(waitset, &mut out),
            RETCODE_OK
        );
        assert!(take_handles(out).is_empty());
    }
}

#[test]
fn read_condition_trigger_wakes_waiter_on_another_thread() {
    let g = graph();
    unsafe {
        let condition = (g.api.datareader_create_readcondition.x64.unwrap())(
            g.reader,
            ANY_SAMPLE_STATE,
            ANY_VIEW_STATE,
            ANY_INSTANCE_STATE,
        );
        let waitset = (g.api.waitset_create.x64.unwrap())();
        (g.api.waitset_attach_condition.x64.unwrap())(waitset, condition);

        let trigger = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(20));
            hooks::set_read_condition_trigger(condition, true)
        });

        let mut out: *mut RawSequence = ptr::null_mut();
        let rc = (g.api.waitset_wait.x64.unwrap())(
            waitset,
            &mut out,
            RawDuration { sec: 5, nanosec: 0 },
        );
        assert!(trigger.join().unwrap());
        assert_eq!(rc, RETCODE_OK);
        assert_eq!(take_handles(out), vec![condition]);
        assert!((g.api.readcondition_get_trigger_value.x64.unwrap())(condition));
    }
}

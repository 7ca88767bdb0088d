// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Conditions and WaitSets against the in-process runtime.

mod common;

use std::thread;
use std::time::Instant;

use common::{factory, graph};
use dds_bridge::sys::{ANY_INSTANCE_STATE, ANY_SAMPLE_STATE, ANY_VIEW_STATE, NOT_READ_SAMPLE_STATE};
use dds_bridge::{Condition, Duration, Error, IdentityRegistry};
use dds_bridge_native::hooks;

#[test]
fn test_wait_times_out() {
    let factory = factory();
    let waitset = factory.create_waitset().unwrap();
    let guard = factory.create_guard_condition().unwrap();
    waitset.attach_condition(guard).unwrap();

    let started = Instant::now();
    assert_eq!(
        waitset.wait(Duration::from_millis(20)).unwrap_err(),
        Error::Timeout
    );
    assert!(started.elapsed() >= std::time::Duration::from_millis(15));
    assert!(!waitset.is_waiting());
}

#[test]
fn test_guard_trigger_wakes_waiter() {
    let factory = factory();
    let waitset = factory.create_waitset().unwrap();
    let guard = factory.create_guard_condition().unwrap();
    waitset.attach_condition(guard.clone()).unwrap();
    assert!(!guard.get_trigger_value().unwrap());

    let waiter = {
        let waitset = waitset.clone();
        thread::spawn(move || waitset.wait(Duration::new(5, 0)))
    };
    guard.set_trigger_value(true).unwrap();

    let triggered = waiter.join().expect("waiter panicked").unwrap();
    assert_eq!(triggered.len(), 1);
    assert!(triggered[0].ptr_eq(&Condition::Guard(guard.clone())));
    assert!(triggered[0].get_trigger_value().unwrap());
}

#[test]
fn test_zero_timeout_polls() {
    let factory = factory();
    let waitset = factory.create_waitset().unwrap();
    let guard = factory.create_guard_condition().unwrap();
    waitset.attach_condition(guard.clone()).unwrap();

    let started = Instant::now();
    assert_eq!(waitset.wait(Duration::ZERO).unwrap_err(), Error::Timeout);
    assert!(started.elapsed() < std::time::Duration::from_secs(1));

    guard.set_trigger_value(true).unwrap();
    let triggered = waitset.wait(Duration::ZERO).unwrap();
    assert_eq!(triggered.len(), 1);
    assert_eq!(triggered[0].handle(), guard.handle());
}

#[test]
fn test_infinite_wait_is_woken_by_trigger() {
    let factory = factory();
    let waitset = factory.create_waitset().unwrap();
    let guard = factory.create_guard_condition().unwrap();
    waitset.attach_condition(guard.clone()).unwrap();

    let waiter = {
        let waitset = waitset.clone();
        thread::spawn(move || waitset.wait(Duration::INFINITE))
    };
    while !waitset.is_waiting() {
        thread::yield_now();
    }
    guard.set_trigger_value(true).unwrap();

    let triggered = waiter.join().expect("waiter panicked").unwrap();
    assert_eq!(triggered.len(), 1);
    assert_eq!(triggered[0].handle(), guard.handle());
    assert!(!waitset.is_waiting());
}

#[test]
fn test_second_waiter_is_rejected() {
    let factory = factory();
    let waitset = factory.create_waitset().unwrap();
    let guard = factory.create_guard_condition().unwrap();
    waitset.attach_condition(guard.clone()).unwrap();

    let first = {
        let waitset = waitset.clone();
        thread::spawn(move || waitset.wait(Duration::new(5, 0)))
    };
    while !waitset.is_waiting() {
        thread::yield_now();
    }

    assert_eq!(
        waitset.wait(Duration::from_millis(10)).unwrap_err(),
        Error::PreconditionNotMet
    );

    // the first wait is undisturbed
    guard.set_trigger_value(true).unwrap();
    let triggered = first.join().expect("waiter panicked").unwrap();
    assert_eq!(triggered.len(), 1);
    assert_eq!(triggered[0].handle(), guard.handle());
}

#[test]
fn test_attach_is_idempotent_and_detach_checks_membership() {
    let factory = factory();
    let waitset = factory.create_waitset().unwrap();
    let guard = factory.create_guard_condition().unwrap();
    let stranger = factory.create_guard_condition().unwrap();

    waitset.attach_condition(guard.clone()).unwrap();
    waitset.attach_condition(guard.clone()).unwrap();
    assert_eq!(waitset.get_conditions().unwrap().len(), 1);

    assert_eq!(
        waitset.detach_condition(stranger),
        Err(Error::PreconditionNotMet)
    );
    waitset.detach_condition(guard.clone()).unwrap();
    assert!(waitset.get_conditions().unwrap().is_empty());
    assert_eq!(
        waitset.detach_condition(guard),
        Err(Error::PreconditionNotMet)
    );
}

#[test]
fn test_guard_lives_while_attached() {
    let factory = factory();
    let waitset = factory.create_waitset().unwrap();
    let guard = factory.create_guard_condition().unwrap();
    let handle = guard.handle();

    waitset.attach_condition(guard).unwrap();
    assert!(hooks::is_live(handle));

    let attached = waitset.get_conditions().unwrap();
    waitset.detach_condition(attached[0].clone()).unwrap();
    assert!(hooks::is_live(handle));
    drop(attached);
    assert!(!hooks::is_live(handle));
}

#[test]
fn test_read_condition_masks_and_reader() {
    let g = graph();
    let condition = g
        .reader
        .create_readcondition(NOT_READ_SAMPLE_STATE, ANY_VIEW_STATE, ANY_INSTANCE_STATE)
        .unwrap();

    assert_eq!(condition.get_sample_state_mask().unwrap(), NOT_READ_SAMPLE_STATE);
    assert_eq!(condition.get_view_state_mask().unwrap(), ANY_VIEW_STATE);
    assert_eq!(condition.get_instance_state_mask().unwrap(), ANY_INSTANCE_STATE);
    assert!(condition.get_datareader().unwrap().ptr_eq(&g.reader));
    assert!(!condition.get_trigger_value().unwrap());
}

#[test]
fn test_read_condition_trigger_wakes_waiter() {
    let g = graph();
    let waitset = g.factory.create_waitset().unwrap();
    let condition = g
        .reader
        .create_readcondition(ANY_SAMPLE_STATE, ANY_VIEW_STATE, ANY_INSTANCE_STATE)
        .unwrap();
    waitset.attach_condition(condition.clone()).unwrap();

    let waiter = {
        let waitset = waitset.clone();
        thread::spawn(move || waitset.wait(Duration::new(5, 0)))
    };
    assert!(hooks::set_read_condition_trigger(condition.handle(), true));

    let triggered = waiter.join().expect("waiter panicked").unwrap();
    match triggered.as_slice() {
        [Condition::Read(c)] => assert!(c.ptr_eq(&condition)),
        other => panic!("unexpected conditions {other:?}"),
    }
}

#[test]
fn test_query_condition_expression_and_parameters() {
    let g = graph();
    let query = g
        .reader
        .create_querycondition(
            ANY_SAMPLE_STATE,
            ANY_VIEW_STATE,
            ANY_INSTANCE_STATE,
            "x > %0 AND color = %1",
            &["5", "BLUE"],
        )
        .unwrap();

    assert_eq!(query.get_query_expression().unwrap(), "x > %0 AND color = %1");
    assert_eq!(query.get_query_parameters().unwrap(), ["5", "BLUE"]);

    query.set_query_parameters(&["7", "RED"]).unwrap();
    assert_eq!(query.get_query_parameters().unwrap(), ["7", "RED"]);

    query.set_query_parameters::<&str>(&[]).unwrap();
    assert!(query.get_query_parameters().unwrap().is_empty());

    // a query condition is a read condition too
    assert!(query.get_datareader().unwrap().ptr_eq(&g.reader));
    let waitset = g.factory.create_waitset().unwrap();
    waitset.attach_condition(query.clone()).unwrap();
    assert!(matches!(
        waitset.get_conditions().unwrap().as_slice(),
        [Condition::Query(_)]
    ));
}

#[test]
fn test_delete_readcondition_detaches_from_waitsets() {
    let g = graph();
    let first = g.factory.create_waitset().unwrap();
    let second = g.factory.create_waitset().unwrap();
    let condition = g
        .reader
        .create_readcondition(ANY_SAMPLE_STATE, ANY_VIEW_STATE, ANY_INSTANCE_STATE)
        .unwrap();
    first.attach_condition(condition.clone()).unwrap();
    second.attach_condition(condition.clone()).unwrap();

    g.reader.delete_readcondition(&condition).unwrap();

    assert!(first.get_conditions().unwrap().is_empty());
    assert!(second.get_conditions().unwrap().is_empty());
    assert!(!hooks::is_live(condition.handle()));
    assert!(condition.is_deleted());
    assert_eq!(condition.get_trigger_value(), Err(Error::AlreadyDeleted));
    assert_eq!(
        first.attach_condition(condition.clone()),
        Err(Error::AlreadyDeleted)
    );
    assert_eq!(
        g.reader.delete_readcondition(&condition),
        Err(Error::PreconditionNotMet)
    );
}

#[test]
fn test_delete_readcondition_of_other_reader_fails() {
    let g = graph();
    let other = g.subscriber.create_datareader(&g.topic).unwrap();
    let condition = other
        .create_readcondition(ANY_SAMPLE_STATE, ANY_VIEW_STATE, ANY_INSTANCE_STATE)
        .unwrap();

    assert_eq!(
        g.reader.delete_readcondition(&condition),
        Err(Error::PreconditionNotMet)
    );
    assert!(hooks::is_live(condition.handle()));
    assert!(!condition.is_deleted());
}

#[test]
fn test_cascade_releases_attached_conditions() {
    let g = graph();
    let waitset = g.factory.create_waitset().unwrap();
    let guard = g.factory.create_guard_condition().unwrap();
    let read = g
        .reader
        .create_readcondition(ANY_SAMPLE_STATE, ANY_VIEW_STATE, ANY_INSTANCE_STATE)
        .unwrap();
    let query = g
        .reader
        .create_querycondition(ANY_SAMPLE_STATE, ANY_VIEW_STATE, ANY_INSTANCE_STATE, "x > 1", &[] as &[&str])
        .unwrap();
    waitset.attach_condition(read.clone()).unwrap();
    waitset.attach_condition(query.clone()).unwrap();
    waitset.attach_condition(guard.clone()).unwrap();
    assert_eq!(waitset.get_conditions().unwrap().len(), 3);

    g.subscriber.delete_contained_entities().unwrap();

    let remaining = waitset.get_conditions().unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].handle(), guard.handle());
    for condition in [&read, query.as_read_condition()] {
        assert!(!hooks::is_live(condition.handle()));
        assert!(condition.is_deleted());
    }
    assert!(g.factory.runtime().registry().find(g.reader.handle()).is_none());
    assert!(!hooks::is_live(g.reader.handle()));
}

#[test]
fn test_participant_cascade_releases_conditions() {
    let g = graph();
    let waitset = g.factory.create_waitset().unwrap();
    let condition = g
        .reader
        .create_readcondition(ANY_SAMPLE_STATE, ANY_VIEW_STATE, ANY_INSTANCE_STATE)
        .unwrap();
    waitset.attach_condition(condition.clone()).unwrap();

    g.participant.delete_contained_entities().unwrap();

    assert!(waitset.get_conditions().unwrap().is_empty());
    assert!(condition.is_deleted());
    g.factory.delete_participant(&g.participant).unwrap();
}

#[test]
fn test_reader_with_conditions_is_deleted_with_them() {
    let g = graph();
    let waitset = g.factory.create_waitset().unwrap();
    let condition = g
        .reader
        .create_readcondition(ANY_SAMPLE_STATE, ANY_VIEW_STATE, ANY_INSTANCE_STATE)
        .unwrap();
    waitset.attach_condition(condition.clone()).unwrap();

    g.subscriber.delete_datareader(&g.reader).unwrap();

    assert!(waitset.get_conditions().unwrap().is_empty());
    assert!(condition.is_deleted());
    assert!(!hooks::is_live(g.reader.handle()));
}

#[test]
fn test_failed_condition_delete_keeps_attachment() {
    let g = graph();
    let condition = g
        .reader
        .create_readcondition(ANY_SAMPLE_STATE, ANY_VIEW_STATE, ANY_INSTANCE_STATE)
        .unwrap();
    let waitset = g.factory.create_waitset().unwrap();
    waitset.attach_condition(condition.clone()).unwrap();

    hooks::fail_next_delete(condition.handle());
    assert_eq!(
        g.reader.delete_readcondition(&condition).unwrap_err(),
        Error::Error
    );
    assert!(!condition.is_deleted());
    assert_eq!(waitset.get_conditions().unwrap().len(), 1);

    assert!(hooks::set_read_condition_trigger(condition.handle(), true));
    let triggered = waitset.wait(Duration::ZERO).unwrap();
    assert_eq!(triggered[0].handle(), condition.handle());

    g.reader.delete_readcondition(&condition).unwrap();
    assert!(waitset.get_conditions().unwrap().is_empty());
}

#[test]
fn test_failed_cascade_keeps_attachments() {
    let g = graph();
    let condition = g
        .reader
        .create_readcondition(ANY_SAMPLE_STATE, ANY_VIEW_STATE, ANY_INSTANCE_STATE)
        .unwrap();
    let waitset = g.factory.create_waitset().unwrap();
    waitset.attach_condition(condition.clone()).unwrap();

    hooks::fail_next_delete(g.subscriber.handle());
    assert_eq!(
        g.subscriber.delete_contained_entities().unwrap_err(),
        Error::Error
    );
    assert!(!condition.is_deleted());
    assert!(hooks::is_live(g.reader.handle()));
    assert_eq!(waitset.get_conditions().unwrap().len(), 1);

    g.subscriber.delete_contained_entities().unwrap();
    assert!(condition.is_deleted());
    assert!(waitset.get_conditions().unwrap().is_empty());
}

#[test]
fn test_attach_racing_delete_leaves_no_stale_entry() {
    let g = graph();
    let waitsets = (0..4)
        .map(|_| g.factory.create_waitset().unwrap())
        .collect::<Vec<_>>();

    for _ in 0..50 {
        let condition = g
            .reader
            .create_readcondition(ANY_SAMPLE_STATE, ANY_VIEW_STATE, ANY_INSTANCE_STATE)
            .unwrap();
        let attachers = waitsets
            .iter()
            .map(|waitset| {
                let waitset = waitset.clone();
                let condition = condition.clone();
                thread::spawn(move || {
                    let _ = waitset.attach_condition(condition);
                })
            })
            .collect::<Vec<_>>();
        g.reader.delete_readcondition(&condition).unwrap();
        for attacher in attachers {
            attacher.join().expect("attacher panicked");
        }

        // a stale local entry would make this a silent no-op
        for waitset in &waitsets {
            assert_eq!(
                waitset.attach_condition(condition.clone()).unwrap_err(),
                Error::AlreadyDeleted
            );
        }
    }
}

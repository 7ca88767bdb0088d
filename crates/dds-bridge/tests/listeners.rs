// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Listener delivery from native threads.

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use common::graph;
use dds_bridge::sys::{
    RawInconsistentTopicStatus, RawQosPolicyCount, RawSubscriptionMatchedStatus,
};
use dds_bridge::{
    DataReader, DataReaderListener, DataWriter, DataWriterListener, DomainParticipantListener,
    IdentityRegistry, InconsistentTopicStatus, IncompatibleQosStatus, PublisherListener,
    QosPolicyCount, StatusMask, Subscriber, SubscriberListener, SubscriptionMatchedStatus, Topic,
    TopicListener,
};
use dds_bridge_native::{hooks, IncompatibleQos, StatusEvent};
use parking_lot::Mutex;

/// Records everything it is handed.
#[derive(Default)]
struct Recorder {
    matched: Mutex<Vec<(Option<DataReader>, SubscriptionMatchedStatus)>>,
    data_available: Mutex<Vec<Option<DataReader>>>,
    data_on_readers: Mutex<Vec<Option<Subscriber>>>,
    incompatible: Mutex<Vec<(Option<DataWriter>, IncompatibleQosStatus)>>,
    inconsistent: Mutex<Vec<(Option<Topic>, InconsistentTopicStatus)>>,
}

impl TopicListener for Recorder {
    fn on_inconsistent_topic(&self, topic: Option<&Topic>, status: &InconsistentTopicStatus) {
        self.inconsistent.lock().push((topic.cloned(), *status));
    }
}

impl DataWriterListener for Recorder {
    fn on_offered_incompatible_qos(&self, writer: Option<&DataWriter>, status: &IncompatibleQosStatus) {
        self.incompatible.lock().push((writer.cloned(), status.clone()));
    }
}

impl PublisherListener for Recorder {}

impl DataReaderListener for Recorder {
    fn on_data_available(&self, reader: Option<&DataReader>) {
        self.data_available.lock().push(reader.cloned());
    }

    fn on_subscription_matched(&self, reader: Option<&DataReader>, status: &SubscriptionMatchedStatus) {
        self.matched.lock().push((reader.cloned(), *status));
    }
}

impl SubscriberListener for Recorder {
    fn on_data_on_readers(&self, subscriber: Option<&Subscriber>) {
        self.data_on_readers.lock().push(subscriber.cloned());
    }
}

impl DomainParticipantListener for Recorder {}

/// Counts deliveries into a counter the test keeps.
struct Hits(Arc<AtomicUsize>);

impl DataReaderListener for Hits {
    fn on_data_available(&self, _reader: Option<&DataReader>) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

fn subscription_matched() -> RawSubscriptionMatchedStatus {
    RawSubscriptionMatchedStatus {
        total_count: 3,
        total_count_change: 1,
        current_count: 2,
        current_count_change: 1,
        last_publication_handle: 17,
    }
}

#[test]
fn test_participant_listener_receives_reader_status() {
    let g = graph();
    let recorder = Arc::new(Recorder::default());
    g.participant
        .set_listener(Some(recorder.clone()), StatusMask::SUBSCRIPTION_MATCHED)
        .unwrap();
    assert_eq!(g.participant.get_listener_mask(), StatusMask::SUBSCRIPTION_MATCHED);

    let worker = hooks::raise_on_worker(
        g.reader.handle(),
        StatusEvent::SubscriptionMatched(subscription_matched()),
    )
    .unwrap();
    assert!(worker.join().unwrap());

    let matched = std::mem::take(&mut *recorder.matched.lock());
    assert_eq!(matched.len(), 1);
    let (reader, status) = &matched[0];
    assert!(reader.as_ref().is_some_and(|r| r.ptr_eq(&g.reader)));
    assert_eq!(
        *status,
        SubscriptionMatchedStatus {
            total_count: 3,
            total_count_change: 1,
            current_count: 2,
            current_count_change: 1,
            last_publication_handle: 17,
        }
    );
}

#[test]
fn test_masked_out_status_is_not_delivered() {
    let g = graph();
    let recorder = Arc::new(Recorder::default());
    g.participant
        .set_listener(Some(recorder.clone()), StatusMask::DATA_AVAILABLE)
        .unwrap();

    assert!(!hooks::raise(
        g.reader.handle(),
        StatusEvent::SubscriptionMatched(subscription_matched())
    ));
    assert!(recorder.matched.lock().is_empty());
}

#[test]
fn test_listener_outlives_application_reference() {
    let g = graph();
    let hits = Arc::new(AtomicUsize::new(0));
    let listener: Arc<dyn DataReaderListener> = Arc::new(Hits(hits.clone()));
    g.reader
        .set_listener(Some(listener), StatusMask::DATA_AVAILABLE)
        .unwrap();
    // the binding holds the only listener reference now

    let worker = hooks::raise_on_worker(g.reader.handle(), StatusEvent::DataAvailable).unwrap();
    assert!(worker.join().unwrap());
    assert_eq!(hits.load(Ordering::SeqCst), 1);
    assert!(g.reader.get_listener().is_some());
}

#[test]
fn test_replacing_listener_releases_previous_binding() {
    let g = graph();
    let first_hits = Arc::new(AtomicUsize::new(0));
    let second_hits = Arc::new(AtomicUsize::new(0));

    g.reader
        .set_listener(Some(Arc::new(Hits(first_hits.clone()))), StatusMask::DATA_AVAILABLE)
        .unwrap();
    let first = hooks::installed_listener(g.reader.handle());
    assert!(hooks::listener_is_live(first));

    g.reader
        .set_listener(Some(Arc::new(Hits(second_hits.clone()))), StatusMask::DATA_AVAILABLE)
        .unwrap();
    let second = hooks::installed_listener(g.reader.handle());
    assert_ne!(first, second);
    assert!(!hooks::listener_is_live(first));

    assert!(hooks::raise(g.reader.handle(), StatusEvent::DataAvailable));
    assert_eq!(first_hits.load(Ordering::SeqCst), 0);
    assert_eq!(second_hits.load(Ordering::SeqCst), 1);

    g.reader.set_listener(None, StatusMask::NONE).unwrap();
    assert!(!hooks::listener_is_live(second));
    assert!(hooks::installed_listener(g.reader.handle()).is_null());
    assert!(g.reader.get_listener().is_none());
    assert!(!hooks::raise(g.reader.handle(), StatusEvent::DataAvailable));
}

#[test]
fn test_deleting_entity_releases_listener() {
    let g = graph();
    let hits = Arc::new(AtomicUsize::new(0));
    g.reader
        .set_listener(Some(Arc::new(Hits(hits))), StatusMask::DATA_AVAILABLE)
        .unwrap();
    let installed = hooks::installed_listener(g.reader.handle());

    g.subscriber.delete_datareader(&g.reader).unwrap();
    assert!(!hooks::listener_is_live(installed));
    assert!(g.reader.get_listener().is_none());
}

#[test]
fn test_data_on_readers_takes_precedence() {
    let g = graph();
    let subscriber_side = Arc::new(Recorder::default());
    let reader_side = Arc::new(Recorder::default());
    g.subscriber
        .set_listener(Some(subscriber_side.clone()), StatusMask::DATA_ON_READERS)
        .unwrap();
    g.reader
        .set_listener(Some(reader_side.clone()), StatusMask::DATA_AVAILABLE)
        .unwrap();

    assert!(hooks::raise(g.reader.handle(), StatusEvent::DataAvailable));

    let notified = std::mem::take(&mut *subscriber_side.data_on_readers.lock());
    assert_eq!(notified.len(), 1);
    assert!(notified[0].as_ref().is_some_and(|s| s.ptr_eq(&g.subscriber)));
    assert!(reader_side.data_available.lock().is_empty());
}

#[test]
fn test_incompatible_qos_copies_policies() {
    let g = graph();
    let recorder = Arc::new(Recorder::default());
    g.writer
        .set_listener(Some(recorder.clone()), StatusMask::OFFERED_INCOMPATIBLE_QOS)
        .unwrap();

    let event = StatusEvent::OfferedIncompatibleQos(IncompatibleQos {
        total_count: 2,
        total_count_change: 1,
        last_policy_id: 11,
        policies: vec![
            RawQosPolicyCount { policy_id: 11, count: 2 },
            RawQosPolicyCount { policy_id: 4, count: 1 },
        ],
    });
    assert!(hooks::raise_on_worker(g.writer.handle(), event).unwrap().join().unwrap());

    let seen = std::mem::take(&mut *recorder.incompatible.lock());
    assert_eq!(seen.len(), 1);
    assert!(seen[0].0.as_ref().is_some_and(|w| w.ptr_eq(&g.writer)));
    assert_eq!(
        seen[0].1,
        IncompatibleQosStatus {
            total_count: 2,
            total_count_change: 1,
            last_policy_id: 11,
            policies: vec![
                QosPolicyCount { policy_id: 11, count: 2 },
                QosPolicyCount { policy_id: 4, count: 1 },
            ],
        }
    );
}

#[test]
fn test_topic_status_reaches_topic_listener() {
    let g = graph();
    let recorder = Arc::new(Recorder::default());
    g.topic
        .set_listener(Some(recorder.clone()), StatusMask::INCONSISTENT_TOPIC)
        .unwrap();

    let raw = RawInconsistentTopicStatus {
        total_count: 1,
        total_count_change: 1,
    };
    assert!(hooks::raise(g.topic.handle(), StatusEvent::InconsistentTopic(raw)));

    let seen = std::mem::take(&mut *recorder.inconsistent.lock());
    assert_eq!(seen.len(), 1);
    assert!(seen[0].0.as_ref().is_some_and(|t| t.ptr_eq(&g.topic)));
    assert_eq!(seen[0].1.total_count, 1);
}

#[test]
fn test_unregistered_entity_is_delivered_as_none() {
    let g = graph();
    let recorder = Arc::new(Recorder::default());
    g.reader
        .set_listener(Some(recorder.clone()), StatusMask::DATA_AVAILABLE)
        .unwrap();

    let registry = g.factory.runtime().registry();
    let resident = registry.remove(g.reader.handle()).expect("reader registered");
    assert!(hooks::raise(g.reader.handle(), StatusEvent::DataAvailable));
    registry.add(g.reader.handle(), resident);

    let seen = std::mem::take(&mut *recorder.data_available.lock());
    assert_eq!(seen.len(), 1);
    assert!(seen[0].is_none());
}

/// Removes its own listener from inside the callback.
struct OneShot(Arc<AtomicUsize>);

impl DataReaderListener for OneShot {
    fn on_data_available(&self, reader: Option<&DataReader>) {
        self.0.fetch_add(1, Ordering::SeqCst);
        if let Some(reader) = reader {
            reader
                .set_listener(None, StatusMask::NONE)
                .expect("clear listener from callback");
        }
    }
}

#[test]
fn test_listener_can_clear_itself_from_callback() {
    let g = graph();
    let hits = Arc::new(AtomicUsize::new(0));
    g.reader
        .set_listener(Some(Arc::new(OneShot(hits.clone()))), StatusMask::DATA_AVAILABLE)
        .unwrap();
    let installed = hooks::installed_listener(g.reader.handle());

    assert!(hooks::raise_on_worker(g.reader.handle(), StatusEvent::DataAvailable)
        .unwrap()
        .join()
        .unwrap());
    assert!(!hooks::raise(g.reader.handle(), StatusEvent::DataAvailable));

    assert_eq!(hits.load(Ordering::SeqCst), 1);
    assert!(!hooks::listener_is_live(installed));
    assert!(g.reader.get_listener().is_none());
}

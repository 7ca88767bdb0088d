// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Shared fixtures: every test gets its own registry over the in-process runtime.

#![allow(dead_code)]

use std::sync::Arc;

use dds_bridge::{
    DataReader, DataWriter, DomainParticipant, DomainParticipantFactory, EntityRegistry,
    Publisher, Subscriber, Topic,
};

pub fn factory() -> DomainParticipantFactory {
    DomainParticipantFactory::builder()
        .api(dds_bridge_native::native_api())
        .registry(Arc::new(EntityRegistry::new()))
        .build()
        .expect("factory over the in-process runtime")
}

/// One participant with a topic, a writer and a reader on it.
pub struct Graph {
    pub factory: DomainParticipantFactory,
    pub participant: DomainParticipant,
    pub topic: Topic,
    pub publisher: Publisher,
    pub writer: DataWriter,
    pub subscriber: Subscriber,
    pub reader: DataReader,
}

pub fn graph() -> Graph {
    let factory = factory();
    let participant = factory.create_participant(0).expect("participant");
    let topic = participant.create_topic("Square", "ShapeType").expect("topic");
    let publisher = participant.create_publisher().expect("publisher");
    let writer = publisher.create_datawriter(&topic).expect("writer");
    let subscriber = participant.create_subscriber().expect("subscriber");
    let reader = subscriber.create_datareader(&topic).expect("reader");
    Graph {
        factory,
        participant,
        topic,
        publisher,
        writer,
        subscriber,
        reader,
    }
}

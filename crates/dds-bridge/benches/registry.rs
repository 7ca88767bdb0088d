// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Identity registry and marshaling benchmarks.
//!
//! Registry lookups sit on every callback delivery and parent resolution;
//! string sequences cross the boundary on every partition or query call.

#![allow(clippy::uninlined_format_args)]

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use dds_bridge::marshal::{strings_from_native, NativeSequence, Release};
use dds_bridge::{AnyEntity, DomainParticipantFactory, EntityRegistry, IdentityRegistry, Topic};

const TOPICS: usize = 256;

fn topics() -> (DomainParticipantFactory, Vec<Topic>) {
    let factory = DomainParticipantFactory::builder()
        .api(dds_bridge_native::native_api())
        .registry(Arc::new(EntityRegistry::new()))
        .build()
        .expect("factory creation");
    let participant = factory.create_participant(0).expect("participant creation");
    let topics = (0..TOPICS)
        .map(|i| {
            participant
                .create_topic(&format!("bench/topic/{}", i), "BenchType")
                .expect("topic creation")
        })
        .collect();
    (factory, topics)
}

fn bench_registry(c: &mut Criterion) {
    let (_factory, topics) = topics();
    let registry = EntityRegistry::new();
    for topic in &topics {
        registry.add(topic.handle(), AnyEntity::Topic(topic.clone()));
    }

    let mut i = 0;
    c.bench_function("registry_find_hit", |b| {
        b.iter(|| {
            i = (i + 1) % TOPICS;
            black_box(registry.find(black_box(topics[i].handle())))
        })
    });

    let mut i = 0;
    c.bench_function("registry_find_or_add_resident", |b| {
        b.iter(|| {
            i = (i + 1) % TOPICS;
            let topic = &topics[i];
            black_box(registry.find_or_add(topic.handle(), &mut || {
                AnyEntity::Topic(topic.clone())
            }))
        })
    });

    let churn = EntityRegistry::new();
    let mut i = 0;
    c.bench_function("registry_add_remove", |b| {
        b.iter(|| {
            i = (i + 1) % TOPICS;
            let topic = &topics[i];
            churn.add(topic.handle(), AnyEntity::Topic(topic.clone()));
            black_box(churn.remove(topic.handle()))
        })
    });
}

fn bench_marshal(c: &mut Criterion) {
    let names: Vec<String> = (0..16).map(|i| format!("partition-{}", i)).collect();

    c.bench_function("marshal_string_sequence_round_trip", |b| {
        b.iter(|| {
            let raw = NativeSequence::from_strings(Some(black_box(names.as_slice())))
                .expect("sequence")
                .into_raw();
            // SAFETY: `raw` came from `into_raw` and is freed exactly once.
            black_box(unsafe { strings_from_native(raw, Release::Free) })
        })
    });
}

criterion_group!(benches, bench_registry, bench_marshal);
criterion_main!(benches);

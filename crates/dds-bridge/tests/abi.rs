// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Entry-point selection by ABI.

use std::os::raw::c_void;
use std::sync::Arc;

use dds_bridge::sys::{NativeApi, SymbolSource};
use dds_bridge::{Abi, DomainParticipantFactory, EntityRegistry, Error};
use dds_bridge_native::Exports;

/// The in-process exports minus every 32-bit variant.
struct X64Only(Exports);

impl SymbolSource for X64Only {
    fn resolve(&self, symbol: &str) -> Option<*const c_void> {
        if symbol.ends_with("_x86") {
            None
        } else {
            self.0.resolve(symbol)
        }
    }
}

fn factory(api: NativeApi, abi: Abi) -> DomainParticipantFactory {
    DomainParticipantFactory::builder()
        .api(api)
        .abi(abi)
        .registry(Arc::new(EntityRegistry::new()))
        .build()
        .unwrap()
}

#[test]
fn test_missing_variant_is_a_load_error() {
    let api = NativeApi::resolve(&X64Only(dds_bridge_native::symbols()));
    let factory = factory(api, Abi::X86);
    assert_eq!(factory.runtime().abi(), Abi::X86);

    match factory.create_participant(0) {
        Err(Error::NativeLibraryLoad { operation, .. }) => {
            assert_eq!(operation, "participant_create");
        }
        other => panic!("expected a load error, got {other:?}"),
    }
    assert!(factory.create_waitset().is_err());
}

#[test]
fn test_present_variant_is_used() {
    let api = NativeApi::resolve(&X64Only(dds_bridge_native::symbols()));
    let factory = factory(api, Abi::X64);
    let participant = factory.create_participant(4).unwrap();
    assert_eq!(participant.get_domain_id().unwrap(), 4);
}

#[test]
fn test_x86_table_drives_full_lifecycle() {
    let factory = factory(dds_bridge_native::native_api(), Abi::X86);
    let participant = factory.create_participant(0).unwrap();
    let topic = participant.create_topic("Pose", "PoseType").unwrap();
    assert_eq!(topic.get_name().unwrap(), "Pose");
    participant.delete_contained_entities().unwrap();
    factory.delete_participant(&participant).unwrap();
}

/// Exports nothing.
struct Empty;

impl SymbolSource for Empty {
    fn resolve(&self, _symbol: &str) -> Option<*const c_void> {
        None
    }
}

#[test]
fn test_unresolved_table_reports_every_call() {
    let api = NativeApi::resolve(&Empty);
    assert!(api.unresolved().contains(&"guardcondition_create"));
    assert!(NativeApi::resolve(&X64Only(dds_bridge_native::symbols()))
        .unresolved()
        .is_empty());

    let factory = factory(api, Abi::current());
    assert!(matches!(
        factory.create_guard_condition(),
        Err(Error::NativeLibraryLoad { .. })
    ));
}

// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Allocation balance of the marshaler under repetition.

use dds_bridge::marshal::{
    strings_from_native, thread_stats, values_from_native, NativeSequence, Release,
};

#[test]
fn test_string_round_trips_do_not_leak() {
    const ROUNDS: usize = 10_000;
    let cases: [&[&str]; 4] = [
        &[],
        &["", "partition", ""],
        &["alpha", "beta", "gamma", "delta"],
        &["température", "温度"],
    ];

    let before = thread_stats();
    for round in 0..ROUNDS {
        let case = cases[round % cases.len()];
        let raw = NativeSequence::from_strings(Some(case)).unwrap().into_raw();
        // SAFETY: `raw` came from `into_raw` and is released exactly once here.
        let back = unsafe { strings_from_native(raw, Release::Free) }.expect("non-null sequence");
        assert_eq!(back, case);
    }
    let after = thread_stats();

    assert_eq!(after.outstanding(), before.outstanding());
    assert!(after.allocations - before.allocations >= ROUNDS as u64);
}

#[test]
fn test_dropped_sequences_do_not_leak() {
    let before = thread_stats();
    for round in 0..1_000 {
        let names: Vec<String> = (0..round % 8).map(|i| format!("name-{i}")).collect();
        let seq = NativeSequence::from_strings(Some(names.as_slice())).unwrap();
        assert_eq!(seq.len(), names.len());
    }
    assert_eq!(thread_stats().outstanding(), before.outstanding());
}

#[test]
fn test_absent_sequence_stays_absent() {
    let before = thread_stats();
    let raw = NativeSequence::from_strings::<&str>(None).unwrap().into_raw();
    assert!(raw.is_null());
    // SAFETY: null is accepted.
    assert!(unsafe { strings_from_native(raw, Release::Free) }.is_none());
    assert_eq!(thread_stats(), before);
}

#[test]
fn test_value_sequences_keep_order() {
    let before = thread_stats();
    let values: Vec<i32> = (0..64).map(|i| i * 3 - 17).collect();
    let raw = NativeSequence::from_values(Some(values.as_slice()))
        .unwrap()
        .into_raw();
    // SAFETY: as above.
    let back = unsafe { values_from_native::<i32>(raw, Release::Free) }.unwrap();
    assert_eq!(back, values);
    assert_eq!(thread_stats().outstanding(), before.outstanding());
}

#[test]
fn test_interior_nul_fails_without_leaking() {
    let before = thread_stats();
    assert!(NativeSequence::from_strings(Some(&["ok", "bad\0", "never"][..])).is_err());
    assert_eq!(thread_stats().outstanding(), before.outstanding());
}

// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Blocking wait over attached conditions.

use std::time::{Duration, Instant};

use dds_bridge_sys::{
    RawDuration, RawHandle, RawSequence, ReturnCode, RETCODE_ALREADY_DELETED,
    RETCODE_BAD_PARAMETER, RETCODE_OK, RETCODE_OUT_OF_RESOURCES, RETCODE_PRECONDITION_NOT_MET,
    RETCODE_TIMEOUT,
};

use crate::alloc::{alloc_handle_sequence, store_sequence};
use crate::state::{state, Kind, NativeState, WAKE};

/// Convert a wire duration; `None` means wait forever.
fn deadline(timeout: RawDuration) -> Result<Option<Instant>, ReturnCode> {
    if timeout.is_infinite() {
        return Ok(None);
    }
    if timeout.sec < 0 || timeout.nanosec >= 1_000_000_000 {
        return Err(RETCODE_BAD_PARAMETER);
    }
    let span = Duration::new(timeout.sec.unsigned_abs().into(), timeout.nanosec);
    Ok(Some(Instant::now() + span))
}

fn triggered(state: &NativeState, waitset: RawHandle) -> Result<Vec<RawHandle>, ReturnCode> {
    let Kind::WaitSet { conditions, .. } = &state.get(waitset)?.kind else {
        return Err(RETCODE_BAD_PARAMETER);
    };
    Ok(conditions
        .iter()
        .copied()
        .filter(|c| match state.objects.get(c).map(|obj| &obj.kind) {
            Some(Kind::GuardCondition { trigger }) | Some(Kind::ReadCondition { trigger, .. }) => {
                *trigger
            }
            _ => false,
        })
        .collect())
}

fn set_waiting(state: &mut NativeState, waitset: RawHandle, value: bool) {
    if let Some(obj) = state.objects.get_mut(&waitset) {
        if let Kind::WaitSet { waiting, .. } = &mut obj.kind {
            *waiting = value;
        }
    }
}

/// Block until an attached condition triggers or `timeout` elapses.
///
/// # Safety
///
/// `out` must be null or valid for a pointer write.
pub(crate) unsafe fn wait(
    waitset: RawHandle,
    out: *mut *mut RawSequence,
    timeout: RawDuration,
) -> ReturnCode {
    if out.is_null() {
        return RETCODE_BAD_PARAMETER;
    }
    let deadline = match deadline(timeout) {
        Ok(deadline) => deadline,
        Err(code) => return code,
    };

    let mut guard = state();
    match guard.get_mut(waitset) {
        Ok(obj) => match &mut obj.kind {
            Kind::WaitSet { waiting, .. } => {
                if *waiting {
                    return RETCODE_PRECONDITION_NOT_MET;
                }
                *waiting = true;
            }
            _ => return RETCODE_BAD_PARAMETER,
        },
        Err(code) => return code,
    }

    let outcome = loop {
        match triggered(&guard, waitset) {
            Ok(hits) if !hits.is_empty() => break Ok(hits),
            Ok(_) => {}
            Err(_) => break Err(RETCODE_ALREADY_DELETED),
        }
        match deadline {
            None => WAKE.wait(&mut guard),
            Some(at) => {
                if Instant::now() >= at || WAKE.wait_until(&mut guard, at).timed_out() {
                    // one last look, a trigger may have raced the timeout
                    match triggered(&guard, waitset) {
                        Ok(hits) if !hits.is_empty() => break Ok(hits),
                        Ok(_) => break Err(RETCODE_TIMEOUT),
                        Err(_) => break Err(RETCODE_ALREADY_DELETED),
                    }
                }
            }
        }
    };
    set_waiting(&mut guard, waitset, false);
    drop(guard);

    let (code, hits) = match outcome {
        Ok(hits) => (RETCODE_OK, hits),
        Err(RETCODE_TIMEOUT) => (RETCODE_TIMEOUT, Vec::new()),
        Err(code) => return code,
    };
    let seq = alloc_handle_sequence(&hits);
    if seq.is_null() {
        return RETCODE_OUT_OF_RESOURCES;
    }
    // SAFETY: `out` checked non-null above.
    unsafe { store_sequence(out, seq) };
    code
}

/// Snapshot of the conditions attached to `waitset`.
///
/// # Safety
///
/// `out` must be null or valid for a pointer write.
pub(crate) unsafe fn conditions(waitset: RawHandle, out: *mut *mut RawSequence) -> ReturnCode {
    if out.is_null() {
        return RETCODE_BAD_PARAMETER;
    }
    let handles = {
        let state = state();
        match state.get(waitset).map(|obj| &obj.kind) {
            Ok(Kind::WaitSet { conditions, .. }) => conditions.clone(),
            Ok(_) => return RETCODE_BAD_PARAMETER,
            Err(code) => return code,
        }
    };
    let seq = alloc_handle_sequence(&handles);
    if seq.is_null() {
        return RETCODE_OUT_OF_RESOURCES;
    }
    // SAFETY: `out` checked non-null above.
    unsafe { store_sequence(out, seq) };
    RETCODE_OK
}

// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! C-compatible communication status payloads.
//!
//! Counts use the DDS `long` width. Instance handles are the native
//! 32-bit instance handle, not [`RawHandle`](crate::RawHandle).

use std::ptr;

use crate::RawSequence;

/// Native instance handle (publication/subscription/instance identifier).
pub type RawInstanceHandle = i32;

/// Topic found with the same name but a different type.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct RawInconsistentTopicStatus {
    pub total_count: i32,
    pub total_count_change: i32,
}

/// Deadline missed on the writer (offered) or reader (requested) side.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct RawDeadlineMissedStatus {
    pub total_count: i32,
    pub total_count_change: i32,
    pub last_instance_handle: RawInstanceHandle,
}

pub type RawOfferedDeadlineMissedStatus = RawDeadlineMissedStatus;
pub type RawRequestedDeadlineMissedStatus = RawDeadlineMissedStatus;

/// One entry of the per-policy incompatibility counters.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RawQosPolicyCount {
    pub policy_id: i32,
    pub count: i32,
}

/// Incompatible QoS between matched endpoints.
///
/// `policies` is a sequence of [`RawQosPolicyCount`] owned by the native
/// runtime; it is only valid while the callback runs.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct RawIncompatibleQosStatus {
    pub total_count: i32,
    pub total_count_change: i32,
    pub last_policy_id: i32,
    pub policies: *const RawSequence,
}

impl Default for RawIncompatibleQosStatus {
    fn default() -> Self {
        Self {
            total_count: 0,
            total_count_change: 0,
            last_policy_id: 0,
            policies: ptr::null(),
        }
    }
}

pub type RawOfferedIncompatibleQosStatus = RawIncompatibleQosStatus;
pub type RawRequestedIncompatibleQosStatus = RawIncompatibleQosStatus;

#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct RawSampleLostStatus {
    pub total_count: i32,
    pub total_count_change: i32,
}

/// `last_reason`: 0 not rejected, 1 instances limit, 2 samples limit,
/// 3 samples-per-instance limit.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct RawSampleRejectedStatus {
    pub total_count: i32,
    pub total_count_change: i32,
    pub last_reason: i32,
    pub last_instance_handle: RawInstanceHandle,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct RawLivelinessLostStatus {
    pub total_count: i32,
    pub total_count_change: i32,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct RawLivelinessChangedStatus {
    pub alive_count: i32,
    pub not_alive_count: i32,
    pub alive_count_change: i32,
    pub not_alive_count_change: i32,
    pub last_publication_handle: RawInstanceHandle,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct RawPublicationMatchedStatus {
    pub total_count: i32,
    pub total_count_change: i32,
    pub current_count: i32,
    pub current_count_change: i32,
    pub last_subscription_handle: RawInstanceHandle,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct RawSubscriptionMatchedStatus {
    pub total_count: i32,
    pub total_count_change: i32,
    pub current_count: i32,
    pub current_count_change: i32,
    pub last_publication_handle: RawInstanceHandle,
}

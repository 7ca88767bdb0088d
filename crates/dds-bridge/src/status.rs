// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Status masks and communication status payloads.

use dds_bridge_sys::{
    RawDeadlineMissedStatus, RawInconsistentTopicStatus, RawInstanceHandle,
    RawLivelinessChangedStatus, RawLivelinessLostStatus, RawPublicationMatchedStatus,
    RawQosPolicyCount, RawSampleLostStatus, RawSampleRejectedStatus, RawStatusMask,
    RawSubscriptionMatchedStatus, DATA_AVAILABLE_STATUS, DATA_ON_READERS_STATUS,
    INCONSISTENT_TOPIC_STATUS, LIVELINESS_CHANGED_STATUS, LIVELINESS_LOST_STATUS,
    OFFERED_DEADLINE_MISSED_STATUS, OFFERED_INCOMPATIBLE_QOS_STATUS, PUBLICATION_MATCHED_STATUS,
    REQUESTED_DEADLINE_MISSED_STATUS, REQUESTED_INCOMPATIBLE_QOS_STATUS, SAMPLE_LOST_STATUS,
    SAMPLE_REJECTED_STATUS, SUBSCRIPTION_MATCHED_STATUS,
};

/// Set of communication statuses a listener is enabled for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct StatusMask(RawStatusMask);

impl StatusMask {
    pub const NONE: StatusMask = StatusMask(0);
    pub const ALL: StatusMask = StatusMask(0xffff_ffff);

    pub const INCONSISTENT_TOPIC: StatusMask = StatusMask(INCONSISTENT_TOPIC_STATUS);
    pub const OFFERED_DEADLINE_MISSED: StatusMask = StatusMask(OFFERED_DEADLINE_MISSED_STATUS);
    pub const REQUESTED_DEADLINE_MISSED: StatusMask =
        StatusMask(REQUESTED_DEADLINE_MISSED_STATUS);
    pub const OFFERED_INCOMPATIBLE_QOS: StatusMask = StatusMask(OFFERED_INCOMPATIBLE_QOS_STATUS);
    pub const REQUESTED_INCOMPATIBLE_QOS: StatusMask =
        StatusMask(REQUESTED_INCOMPATIBLE_QOS_STATUS);
    pub const SAMPLE_LOST: StatusMask = StatusMask(SAMPLE_LOST_STATUS);
    pub const SAMPLE_REJECTED: StatusMask = StatusMask(SAMPLE_REJECTED_STATUS);
    pub const DATA_ON_READERS: StatusMask = StatusMask(DATA_ON_READERS_STATUS);
    pub const DATA_AVAILABLE: StatusMask = StatusMask(DATA_AVAILABLE_STATUS);
    pub const LIVELINESS_LOST: StatusMask = StatusMask(LIVELINESS_LOST_STATUS);
    pub const LIVELINESS_CHANGED: StatusMask = StatusMask(LIVELINESS_CHANGED_STATUS);
    pub const PUBLICATION_MATCHED: StatusMask = StatusMask(PUBLICATION_MATCHED_STATUS);
    pub const SUBSCRIPTION_MATCHED: StatusMask = StatusMask(SUBSCRIPTION_MATCHED_STATUS);

    #[must_use]
    pub const fn from_bits(bits: RawStatusMask) -> Self {
        StatusMask(bits)
    }

    #[must_use]
    pub const fn bits(&self) -> RawStatusMask {
        self.0
    }

    /// True when every bit of `other` is set in `self`.
    #[must_use]
    pub const fn contains(&self, other: StatusMask) -> bool {
        (self.0 & other.0) == other.0
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }
}

impl std::ops::BitOr for StatusMask {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        StatusMask(self.0 | rhs.0)
    }
}

impl std::ops::BitAnd for StatusMask {
    type Output = Self;
    fn bitand(self, rhs: Self) -> Self {
        StatusMask(self.0 & rhs.0)
    }
}

impl std::ops::BitOrAssign for StatusMask {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// Native instance handle carried in status payloads.
pub type InstanceHandle = RawInstanceHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InconsistentTopicStatus {
    pub total_count: i32,
    pub total_count_change: i32,
}

impl From<&RawInconsistentTopicStatus> for InconsistentTopicStatus {
    fn from(raw: &RawInconsistentTopicStatus) -> Self {
        Self {
            total_count: raw.total_count,
            total_count_change: raw.total_count_change,
        }
    }
}

/// Deadline missed, on either side of a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DeadlineMissedStatus {
    pub total_count: i32,
    pub total_count_change: i32,
    pub last_instance_handle: InstanceHandle,
}

pub type OfferedDeadlineMissedStatus = DeadlineMissedStatus;
pub type RequestedDeadlineMissedStatus = DeadlineMissedStatus;

impl From<&RawDeadlineMissedStatus> for DeadlineMissedStatus {
    fn from(raw: &RawDeadlineMissedStatus) -> Self {
        Self {
            total_count: raw.total_count,
            total_count_change: raw.total_count_change,
            last_instance_handle: raw.last_instance_handle,
        }
    }
}

/// Per-policy incompatibility counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QosPolicyCount {
    pub policy_id: i32,
    pub count: i32,
}

impl From<RawQosPolicyCount> for QosPolicyCount {
    fn from(raw: RawQosPolicyCount) -> Self {
        Self {
            policy_id: raw.policy_id,
            count: raw.count,
        }
    }
}

/// Incompatible QoS between matched endpoints.
///
/// `policies` is copied out of the native payload; the native sequence
/// itself stays with the runtime.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct IncompatibleQosStatus {
    pub total_count: i32,
    pub total_count_change: i32,
    pub last_policy_id: i32,
    pub policies: Vec<QosPolicyCount>,
}

pub type OfferedIncompatibleQosStatus = IncompatibleQosStatus;
pub type RequestedIncompatibleQosStatus = IncompatibleQosStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SampleLostStatus {
    pub total_count: i32,
    pub total_count_change: i32,
}

impl From<&RawSampleLostStatus> for SampleLostStatus {
    fn from(raw: &RawSampleLostStatus) -> Self {
        Self {
            total_count: raw.total_count,
            total_count_change: raw.total_count_change,
        }
    }
}

/// Why the last sample was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SampleRejectedReason {
    #[default]
    NotRejected,
    InstancesLimit,
    SamplesLimit,
    SamplesPerInstanceLimit,
}

impl From<i32> for SampleRejectedReason {
    fn from(raw: i32) -> Self {
        match raw {
            1 => Self::InstancesLimit,
            2 => Self::SamplesLimit,
            3 => Self::SamplesPerInstanceLimit,
            _ => Self::NotRejected,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SampleRejectedStatus {
    pub total_count: i32,
    pub total_count_change: i32,
    pub last_reason: SampleRejectedReason,
    pub last_instance_handle: InstanceHandle,
}

impl From<&RawSampleRejectedStatus> for SampleRejectedStatus {
    fn from(raw: &RawSampleRejectedStatus) -> Self {
        Self {
            total_count: raw.total_count,
            total_count_change: raw.total_count_change,
            last_reason: raw.last_reason.into(),
            last_instance_handle: raw.last_instance_handle,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LivelinessLostStatus {
    pub total_count: i32,
    pub total_count_change: i32,
}

impl From<&RawLivelinessLostStatus> for LivelinessLostStatus {
    fn from(raw: &RawLivelinessLostStatus) -> Self {
        Self {
            total_count: raw.total_count,
            total_count_change: raw.total_count_change,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LivelinessChangedStatus {
    pub alive_count: i32,
    pub not_alive_count: i32,
    pub alive_count_change: i32,
    pub not_alive_count_change: i32,
    pub last_publication_handle: InstanceHandle,
}

impl From<&RawLivelinessChangedStatus> for LivelinessChangedStatus {
    fn from(raw: &RawLivelinessChangedStatus) -> Self {
        Self {
            alive_count: raw.alive_count,
            not_alive_count: raw.not_alive_count,
            alive_count_change: raw.alive_count_change,
            not_alive_count_change: raw.not_alive_count_change,
            last_publication_handle: raw.last_publication_handle,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PublicationMatchedStatus {
    pub total_count: i32,
    pub total_count_change: i32,
    pub current_count: i32,
    pub current_count_change: i32,
    pub last_subscription_handle: InstanceHandle,
}

impl From<&RawPublicationMatchedStatus> for PublicationMatchedStatus {
    fn from(raw: &RawPublicationMatchedStatus) -> Self {
        Self {
            total_count: raw.total_count,
            total_count_change: raw.total_count_change,
            current_count: raw.current_count,
            current_count_change: raw.current_count_change,
            last_subscription_handle: raw.last_subscription_handle,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SubscriptionMatchedStatus {
    pub total_count: i32,
    pub total_count_change: i32,
    pub current_count: i32,
    pub current_count_change: i32,
    pub last_publication_handle: InstanceHandle,
}

impl From<&RawSubscriptionMatchedStatus> for SubscriptionMatchedStatus {
    fn from(raw: &RawSubscriptionMatchedStatus) -> Self {
        Self {
            total_count: raw.total_count,
            total_count_change: raw.total_count_change,
            current_count: raw.current_count,
            current_count_change: raw.current_count_change,
            last_publication_handle: raw.last_publication_handle,
        }
    }
}

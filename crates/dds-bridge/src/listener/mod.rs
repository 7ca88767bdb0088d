// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Listener traits.
//!
//! Handlers run synchronously on whichever native thread raised the
//! status. They receive the entity that raised it, or `None` when that
//! entity has no registered wrapper (yet, or any more); the status is
//! delivered either way.
//!
//! A panic inside a handler never reaches native code. It is caught at
//! the callback boundary and passed to the hook installed with
//! [`set_callback_fault_hook`].
//!
//! # Example
//!
//! ```ignore
//! struct Matched;
//!
//! impl DataReaderListener for Matched {
//!     fn on_subscription_matched(&self, reader: Option<&DataReader>, s: &SubscriptionMatchedStatus) {
//!         log::info!("{:?} matched {} writers", reader.map(DataReader::handle), s.current_count);
//!     }
//! }
//!
//! reader.set_listener(Some(Arc::new(Matched)), StatusMask::SUBSCRIPTION_MATCHED)?;
//! ```

pub(crate) mod bridge;
mod fault;

pub use fault::{reset_callback_fault_hook, set_callback_fault_hook, CallbackFault};

use crate::entity::{DataReader, DataWriter, Subscriber, Topic};
use crate::status::{
    InconsistentTopicStatus, LivelinessChangedStatus, LivelinessLostStatus,
    OfferedDeadlineMissedStatus, OfferedIncompatibleQosStatus, PublicationMatchedStatus,
    RequestedDeadlineMissedStatus, RequestedIncompatibleQosStatus, SampleLostStatus,
    SampleRejectedStatus, SubscriptionMatchedStatus,
};

pub trait TopicListener: Send + Sync {
    fn on_inconsistent_topic(&self, _topic: Option<&Topic>, _status: &InconsistentTopicStatus) {}
}

pub trait DataWriterListener: Send + Sync {
    fn on_offered_deadline_missed(
        &self,
        _writer: Option<&DataWriter>,
        _status: &OfferedDeadlineMissedStatus,
    ) {
    }

    fn on_offered_incompatible_qos(
        &self,
        _writer: Option<&DataWriter>,
        _status: &OfferedIncompatibleQosStatus,
    ) {
    }

    fn on_liveliness_lost(&self, _writer: Option<&DataWriter>, _status: &LivelinessLostStatus) {}

    fn on_publication_matched(
        &self,
        _writer: Option<&DataWriter>,
        _status: &PublicationMatchedStatus,
    ) {
    }
}

/// Writer statuses propagated up from the publisher's writers.
pub trait PublisherListener: DataWriterListener {}

pub trait DataReaderListener: Send + Sync {
    fn on_requested_deadline_missed(
        &self,
        _reader: Option<&DataReader>,
        _status: &RequestedDeadlineMissedStatus,
    ) {
    }

    fn on_requested_incompatible_qos(
        &self,
        _reader: Option<&DataReader>,
        _status: &RequestedIncompatibleQosStatus,
    ) {
    }

    fn on_sample_rejected(&self, _reader: Option<&DataReader>, _status: &SampleRejectedStatus) {}

    fn on_liveliness_changed(
        &self,
        _reader: Option<&DataReader>,
        _status: &LivelinessChangedStatus,
    ) {
    }

    fn on_data_available(&self, _reader: Option<&DataReader>) {}

    fn on_subscription_matched(
        &self,
        _reader: Option<&DataReader>,
        _status: &SubscriptionMatchedStatus,
    ) {
    }

    fn on_sample_lost(&self, _reader: Option<&DataReader>, _status: &SampleLostStatus) {}
}

pub trait SubscriberListener: DataReaderListener {
    /// Takes precedence over `on_data_available` for the subscriber's readers.
    fn on_data_on_readers(&self, _subscriber: Option<&Subscriber>) {}
}

/// Catch-all for every status raised inside a participant.
pub trait DomainParticipantListener: TopicListener + PublisherListener + SubscriberListener {}

// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

use std::ffi::CString;
use std::mem;
use std::sync::Arc;

use dds_bridge_sys::RawHandle;
use parking_lot::Mutex;

use super::{adopt, created, Publisher, Subscriber, Topic};
use crate::condition::Detached;
use crate::error::{check, Error, Result};
use crate::listener::bridge::ListenerSlot;
use crate::listener::DomainParticipantListener;
use crate::runtime::{native, Runtime};

/// Entry point into a DDS domain; owns topics, publishers and subscribers.
#[derive(Clone)]
pub struct DomainParticipant(Arc<ParticipantInner>);

struct ParticipantInner {
    handle: RawHandle,
    runtime: Arc<Runtime>,
    listener: ListenerSlot<dyn DomainParticipantListener>,
    topics: Mutex<Vec<Topic>>,
    publishers: Mutex<Vec<Publisher>>,
    subscribers: Mutex<Vec<Subscriber>>,
}

entity_common!(DomainParticipant, DomainParticipantListener);

impl DomainParticipant {
    pub(crate) fn wrap(runtime: Arc<Runtime>, handle: RawHandle) -> Self {
        Self(Arc::new(ParticipantInner {
            handle,
            runtime,
            listener: ListenerSlot::new(),
            topics: Mutex::new(Vec::new()),
            publishers: Mutex::new(Vec::new()),
            subscribers: Mutex::new(Vec::new()),
        }))
    }

    pub fn get_domain_id(&self) -> Result<i32> {
        let domain_id = native!(self.0.runtime, participant_get_domain_id(self.0.handle))?;
        if domain_id < 0 {
            return Err(Error::Error);
        }
        Ok(domain_id)
    }

    pub fn create_topic(&self, topic_name: &str, type_name: &str) -> Result<Topic> {
        if topic_name.is_empty() {
            return Err(Error::InvalidArgument("topic name is empty"));
        }
        if type_name.is_empty() {
            return Err(Error::InvalidArgument("type name is empty"));
        }
        let topic_name = CString::new(topic_name)?;
        let type_name = CString::new(type_name)?;
        let rt = &self.0.runtime;
        let handle = native!(
            rt,
            participant_create_topic(self.0.handle, topic_name.as_ptr(), type_name.as_ptr())
        )?;
        let topic = Topic::wrap(rt.clone(), created("participant_create_topic", handle)?);
        self.0.topics.lock().push(topic.clone());
        rt.register(topic.clone().into());
        log::debug!("{topic:?} {topic_name:?} created on {self:?}");
        Ok(topic)
    }

    pub fn delete_topic(&self, topic: &Topic) -> Result<()> {
        if !self.0.topics.lock().iter().any(|t| t.ptr_eq(topic)) {
            self.adopt_children();
        }
        let mut topics = self.0.topics.lock();
        let Some(index) = topics.iter().position(|t| t.ptr_eq(topic)) else {
            return Err(Error::PreconditionNotMet);
        };
        check(native!(
            self.0.runtime,
            participant_delete_topic(self.0.handle, topic.handle())
        )?)?;
        topics.remove(index);
        drop(topics);
        topic.retire();
        Ok(())
    }

    pub fn create_publisher(&self) -> Result<Publisher> {
        let rt = &self.0.runtime;
        let handle = native!(rt, participant_create_publisher(self.0.handle))?;
        let publisher = Publisher::wrap(rt.clone(), created("participant_create_publisher", handle)?);
        self.0.publishers.lock().push(publisher.clone());
        rt.register(publisher.clone().into());
        Ok(publisher)
    }

    /// Delete an empty publisher created by this participant.
    pub fn delete_publisher(&self, publisher: &Publisher) -> Result<()> {
        if !self.0.publishers.lock().iter().any(|p| p.ptr_eq(publisher)) {
            self.adopt_children();
        }
        let mut publishers = self.0.publishers.lock();
        let Some(index) = publishers.iter().position(|p| p.ptr_eq(publisher)) else {
            return Err(Error::PreconditionNotMet);
        };
        check(native!(
            self.0.runtime,
            participant_delete_publisher(self.0.handle, publisher.handle())
        )?)?;
        publishers.remove(index);
        drop(publishers);
        publisher.retire();
        Ok(())
    }

    pub fn create_subscriber(&self) -> Result<Subscriber> {
        let rt = &self.0.runtime;
        let handle = native!(rt, participant_create_subscriber(self.0.handle))?;
        let subscriber =
            Subscriber::wrap(rt.clone(), created("participant_create_subscriber", handle)?);
        self.0.subscribers.lock().push(subscriber.clone());
        rt.register(subscriber.clone().into());
        Ok(subscriber)
    }

    /// Delete an empty subscriber created by this participant.
    pub fn delete_subscriber(&self, subscriber: &Subscriber) -> Result<()> {
        if !self.0.subscribers.lock().iter().any(|s| s.ptr_eq(subscriber)) {
            self.adopt_children();
        }
        let mut subscribers = self.0.subscribers.lock();
        let Some(index) = subscribers.iter().position(|s| s.ptr_eq(subscriber)) else {
            return Err(Error::PreconditionNotMet);
        };
        check(native!(
            self.0.runtime,
            participant_delete_subscriber(self.0.handle, subscriber.handle())
        )?)?;
        subscribers.remove(index);
        drop(subscribers);
        subscriber.retire();
        Ok(())
    }

    /// Delete every topic, publisher and subscriber with their contents.
    ///
    /// Reader conditions are detached from their WaitSets before anything
    /// is deleted natively; every deleted wrapper leaves the registry.
    pub fn delete_contained_entities(&self) -> Result<()> {
        self.adopt_children();
        let publishers = self.0.publishers.lock().clone();
        for publisher in &publishers {
            publisher.adopt_children();
        }
        let subscribers = self.0.subscribers.lock().clone();
        let mut detached = Vec::new();
        for subscriber in &subscribers {
            subscriber.adopt_children();
            detached.extend(subscriber.release_conditions());
        }
        let deleted = native!(
            self.0.runtime,
            participant_delete_contained_entities(self.0.handle)
        )
        .and_then(check);
        if let Err(err) = deleted {
            detached.into_iter().for_each(Detached::restore);
            return Err(err);
        }

        let publishers = mem::take(&mut *self.0.publishers.lock());
        let subscribers = mem::take(&mut *self.0.subscribers.lock());
        let topics = mem::take(&mut *self.0.topics.lock());
        publishers.iter().for_each(Publisher::retire);
        subscribers.iter().for_each(Subscriber::retire);
        topics.iter().for_each(Topic::retire);
        Ok(())
    }

    /// True while the participant still owns topics, publishers or subscribers.
    #[must_use]
    pub fn contains_entities(&self) -> bool {
        self.adopt_children();
        !self.0.topics.lock().is_empty()
            || !self.0.publishers.lock().is_empty()
            || !self.0.subscribers.lock().is_empty()
    }

    /// Pick up children registered through another wrapper of this handle.
    fn adopt_children(&self) {
        let rt = &self.0.runtime;
        let handle = self.0.handle;
        adopt(
            &self.0.topics,
            rt.registered_children(handle, |t: &Topic| {
                native!(rt, topic_get_participant(t.handle()))
            }),
        );
        adopt(
            &self.0.publishers,
            rt.registered_children(handle, |p: &Publisher| {
                native!(rt, publisher_get_participant(p.handle()))
            }),
        );
        adopt(
            &self.0.subscribers,
            rt.registered_children(handle, |s: &Subscriber| {
                native!(rt, subscriber_get_participant(s.handle()))
            }),
        );
    }

    pub(crate) fn retire(&self) {
        self.0.listener.unbind();
        self.0.runtime.unregister(self.0.handle);
    }
}

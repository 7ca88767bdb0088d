// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # dds-bridge
//!
//! Safe Rust wrappers over a native DDS runtime reached through a C ABI.
//! The bridge keeps one wrapper per native handle, delivers native status
//! callbacks to Rust listeners, and blocks on native WaitSets.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use dds_bridge::{DomainParticipantFactory, Duration, Result};
//!
//! fn main() -> Result<()> {
//!     dds_bridge::logging::init_env(log::LevelFilter::Info);
//!     let factory = DomainParticipantFactory::from_env()?;
//!
//!     let participant = factory.create_default_participant()?;
//!     let topic = participant.create_topic("T", "TypeX")?;
//!     let subscriber = participant.create_subscriber()?;
//!     let reader = subscriber.create_datareader(&topic)?;
//!
//!     let waitset = factory.create_waitset()?;
//!     let condition = reader.create_readcondition(
//!         dds_bridge::sys::ANY_SAMPLE_STATE,
//!         dds_bridge::sys::ANY_VIEW_STATE,
//!         dds_bridge::sys::ANY_INSTANCE_STATE,
//!     )?;
//!     waitset.attach_condition(condition)?;
//!     let _triggered = waitset.wait(Duration::from_millis(500));
//!
//!     participant.delete_contained_entities()?;
//!     factory.delete_participant(&participant)
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! +---------------------------------------------------------------------+
//! |  Entities: DomainParticipant -> Publisher/Subscriber -> Writer/Reader |
//! |  Conditions: Guard / Read / Query        WaitSet (local registry)   |
//! +---------------------------------------------------------------------+
//! |  Identity registry (handle -> wrapper)   Callback bridge (listeners) |
//! +---------------------------------------------------------------------+
//! |  Marshaler (C-allocated strings/sequences)   ABI dispatcher (x64/x86) |
//! +---------------------------------------------------------------------+
//! |  dds-bridge-sys: NativeApi entry points resolved from the library   |
//! +---------------------------------------------------------------------+
//! ```
//!
//! ## Modules Overview
//!
//! - [`entity`] - participants, topics, publishers, subscribers, writers, readers
//! - [`listener`] - listener traits and the callback fault hook
//! - [`condition`] - guard, read and query conditions, WaitSets
//! - [`marshal`] - native sequence and string conversion
//! - [`registry`] - native identity registry
//! - [`config`] / [`logging`] - environment configuration and logger setup

pub mod abi;
pub mod condition;
pub mod config;
pub mod entity;
pub mod error;
pub mod listener;
pub mod logging;
pub mod marshal;
pub mod registry;
pub mod runtime;
pub mod status;
pub mod time;

/// Raw C ABI vocabulary.
pub use dds_bridge_sys as sys;

pub use abi::Abi;
pub use condition::{Condition, GuardCondition, QueryCondition, ReadCondition, WaitSet};
pub use config::BridgeConfig;
pub use entity::{
    DataReader, DataWriter, DomainParticipant, DomainParticipantFactory, Entity, FactoryBuilder,
    Publisher, Subscriber, Topic,
};
pub use error::{check, Error, Result};
pub use listener::{
    reset_callback_fault_hook, set_callback_fault_hook, CallbackFault, DataReaderListener,
    DataWriterListener, DomainParticipantListener, PublisherListener, SubscriberListener,
    TopicListener,
};
pub use registry::{AnyEntity, EntityKind, EntityRegistry, FromEntity, IdentityRegistry};
pub use runtime::Runtime;
pub use status::*;
pub use time::Duration;

// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Exported C entry points.
//!
//! Every operation is compiled once and exported under two symbols,
//! `dds_<op>_x64` and `dds_<op>_x86`. [`lookup`] serves the same
//! addresses to in-process callers that never `dlopen` the library.

use std::os::raw::{c_char, c_void};
use std::sync::Arc;

use dds_bridge_sys::{
    InstanceStateMask, OnDataAvailable, OnDataOnReaders, OnInconsistentTopic, OnLivelinessChanged,
    OnLivelinessLost, OnOfferedDeadlineMissed, OnOfferedIncompatibleQos, OnPublicationMatched,
    OnRequestedDeadlineMissed, OnRequestedIncompatibleQos, OnSampleLost, OnSampleRejected,
    OnSubscriptionMatched, RawDuration, RawHandle, RawSequence, RawStatusMask, ReturnCode,
    SampleStateMask, ViewStateMask, RETCODE_BAD_PARAMETER, RETCODE_OUT_OF_RESOURCES,
    RETCODE_PRECONDITION_NOT_MET,
};

use crate::alloc::{
    alloc_string, alloc_string_sequence, read_string, read_string_sequence, store_sequence,
};
use crate::listener::{Callbacks, NativeListener};
use crate::state::{code, next_handle, require_empty, state, Kind, NativeState, Query, WAKE};
use crate::waitset;

macro_rules! exports {
    (
        $(
            fn $name:ident => $x64:ident, $x86:ident
                ($($arg:ident: $ty:ty),* $(,)?) $(-> $ret:ty)? $body:block
        )*
    ) => {
        $(
            #[allow(clippy::missing_safety_doc)]
            unsafe fn $name($($arg: $ty),*) $(-> $ret)? $body

            /// 64-bit entry point.
            ///
            /// # Safety
            ///
            /// Pointer arguments must be null or valid for the access the
            /// operation performs.
            #[no_mangle]
            pub unsafe extern "C" fn $x64($($arg: $ty),*) $(-> $ret)? {
                unsafe { $name($($arg),*) }
            }

            /// 32-bit entry point.
            ///
            /// # Safety
            ///
            /// Same contract as the 64-bit variant.
            #[no_mangle]
            pub unsafe extern "C" fn $x86($($arg: $ty),*) $(-> $ret)? {
                unsafe { $name($($arg),*) }
            }
        )*

        /// Address of an exported symbol by name.
        pub(crate) fn lookup(symbol: &str) -> Option<*const c_void> {
            $(
                if symbol == stringify!($x64) {
                    return Some($x64 as unsafe extern "C" fn($($ty),*) $(-> $ret)? as *const c_void);
                }
                if symbol == stringify!($x86) {
                    return Some($x86 as unsafe extern "C" fn($($ty),*) $(-> $ret)? as *const c_void);
                }
            )*
            None
        }
    };
}

fn with_state<T>(f: impl FnOnce(&mut NativeState) -> Result<T, ReturnCode>) -> Result<T, ReturnCode> {
    f(&mut state())
}

fn created(op: &str, result: Result<RawHandle, ReturnCode>) -> RawHandle {
    match result {
        Ok(handle) => {
            log::trace!("{op} -> {handle}");
            handle
        }
        Err(rc) => {
            log::debug!("{op} failed with return code {rc}");
            RawHandle::NULL
        }
    }
}

fn child_of(state: &NativeState, handle: RawHandle, expected: impl Fn(&Kind) -> bool) -> RawHandle {
    match state.objects.get(&handle) {
        Some(obj) if expected(&obj.kind) => obj.parent,
        _ => RawHandle::NULL,
    }
}

fn is_condition(kind: &Kind) -> bool {
    matches!(kind, Kind::ReadCondition { .. } | Kind::GuardCondition { .. })
}

fn new_listener(ctx: *mut c_void, callbacks: Callbacks) -> RawHandle {
    let handle = next_handle();
    let listener = Arc::new(NativeListener::new(handle, ctx, callbacks));
    state().listeners.insert(handle, listener);
    log::trace!("listener_new -> {handle}");
    handle
}

unsafe fn partition_out(
    kind_partition: impl FnOnce(&Kind) -> Option<Vec<String>>,
    entity: RawHandle,
    out: *mut *mut RawSequence,
) -> ReturnCode {
    if out.is_null() {
        return RETCODE_BAD_PARAMETER;
    }
    let names = match with_state(|state| {
        kind_partition(&state.get(entity)?.kind).ok_or(RETCODE_BAD_PARAMETER)
    }) {
        Ok(names) => names,
        Err(rc) => return rc,
    };
    let seq = alloc_string_sequence(&names);
    if seq.is_null() {
        return RETCODE_OUT_OF_RESOURCES;
    }
    unsafe { store_sequence(out, seq) };
    dds_bridge_sys::RETCODE_OK
}

exports! {
    // --- DomainParticipant ---------------------------------------------
    fn participant_create => dds_participant_create_x64, dds_participant_create_x86
        (domain_id: i32) -> RawHandle
    {
        if domain_id < 0 {
            log::debug!("participant_create: invalid domain id {domain_id}");
            return RawHandle::NULL;
        }
        let handle = state().insert(
            RawHandle::NULL,
            Kind::Participant {
                domain_id,
                topics: Vec::new(),
                publishers: Vec::new(),
                subscribers: Vec::new(),
            },
        );
        log::debug!("participant {handle} created on domain {domain_id}");
        handle
    }

    fn participant_delete => dds_participant_delete_x64, dds_participant_delete_x86
        (participant: RawHandle) -> ReturnCode
    {
        code(with_state(|state| {
            match &state.get(participant)?.kind {
                Kind::Participant { topics, publishers, subscribers, .. } => {
                    require_empty(topics)?;
                    require_empty(publishers)?;
                    require_empty(subscribers)?;
                }
                _ => return Err(RETCODE_BAD_PARAMETER),
            }
            state.objects.remove(&participant);
            Ok(())
        }))
    }

    fn participant_get_domain_id => dds_participant_get_domain_id_x64, dds_participant_get_domain_id_x86
        (participant: RawHandle) -> i32
    {
        match state().get(participant).map(|obj| &obj.kind) {
            Ok(Kind::Participant { domain_id, .. }) => *domain_id,
            _ => -1,
        }
    }

    fn participant_create_topic => dds_participant_create_topic_x64, dds_participant_create_topic_x86
        (participant: RawHandle, topic_name: *const c_char, type_name: *const c_char) -> RawHandle
    {
        let (Some(name), Some(type_name)) = (read_string(topic_name), read_string(type_name)) else {
            return RawHandle::NULL;
        };
        created("participant_create_topic", with_state(|state| {
            let Kind::Participant { topics, .. } = &state.get(participant)?.kind else {
                return Err(RETCODE_BAD_PARAMETER);
            };
            let clash = topics.iter().any(|t| {
                matches!(state.objects.get(t).map(|o| &o.kind), Some(Kind::Topic { name: n, .. }) if *n == name)
            });
            if clash {
                return Err(RETCODE_PRECONDITION_NOT_MET);
            }
            let topic = state.insert(participant, Kind::Topic { name, type_name });
            if let Kind::Participant { topics, .. } = &mut state.get_mut(participant)?.kind {
                topics.push(topic);
            }
            Ok(topic)
        }))
    }

    fn participant_delete_topic => dds_participant_delete_topic_x64, dds_participant_delete_topic_x86
        (participant: RawHandle, topic: RawHandle) -> ReturnCode
    {
        code(with_state(|state| {
            state.get(topic)?;
            if state.topic_in_use(topic) {
                return Err(RETCODE_PRECONDITION_NOT_MET);
            }
            let Kind::Participant { topics, .. } = &mut state.get_mut(participant)?.kind else {
                return Err(RETCODE_BAD_PARAMETER);
            };
            let before = topics.len();
            topics.retain(|&t| t != topic);
            if topics.len() == before {
                return Err(RETCODE_PRECONDITION_NOT_MET);
            }
            state.objects.remove(&topic);
            Ok(())
        }))
    }

    fn participant_create_publisher => dds_participant_create_publisher_x64, dds_participant_create_publisher_x86
        (participant: RawHandle) -> RawHandle
    {
        created("participant_create_publisher", with_state(|state| {
            if !matches!(state.get(participant)?.kind, Kind::Participant { .. }) {
                return Err(RETCODE_BAD_PARAMETER);
            }
            let publisher = state.insert(
                participant,
                Kind::Publisher { partition: Vec::new(), writers: Vec::new() },
            );
            if let Kind::Participant { publishers, .. } = &mut state.get_mut(participant)?.kind {
                publishers.push(publisher);
            }
            Ok(publisher)
        }))
    }

    fn participant_delete_publisher => dds_participant_delete_publisher_x64, dds_participant_delete_publisher_x86
        (participant: RawHandle, publisher: RawHandle) -> ReturnCode
    {
        code(with_state(|state| {
            match &state.get(publisher)?.kind {
                Kind::Publisher { writers, .. } => require_empty(writers)?,
                _ => return Err(RETCODE_BAD_PARAMETER),
            }
            let Kind::Participant { publishers, .. } = &mut state.get_mut(participant)?.kind else {
                return Err(RETCODE_BAD_PARAMETER);
            };
            let before = publishers.len();
            publishers.retain(|&p| p != publisher);
            if publishers.len() == before {
                return Err(RETCODE_PRECONDITION_NOT_MET);
            }
            state.objects.remove(&publisher);
            Ok(())
        }))
    }

    fn participant_create_subscriber => dds_participant_create_subscriber_x64, dds_participant_create_subscriber_x86
        (participant: RawHandle) -> RawHandle
    {
        created("participant_create_subscriber", with_state(|state| {
            if !matches!(state.get(participant)?.kind, Kind::Participant { .. }) {
                return Err(RETCODE_BAD_PARAMETER);
            }
            let subscriber = state.insert(
                participant,
                Kind::Subscriber { partition: Vec::new(), readers: Vec::new() },
            );
            if let Kind::Participant { subscribers, .. } = &mut state.get_mut(participant)?.kind {
                subscribers.push(subscriber);
            }
            Ok(subscriber)
        }))
    }

    fn participant_delete_subscriber => dds_participant_delete_subscriber_x64, dds_participant_delete_subscriber_x86
        (participant: RawHandle, subscriber: RawHandle) -> ReturnCode
    {
        code(with_state(|state| {
            match &state.get(subscriber)?.kind {
                Kind::Subscriber { readers, .. } => require_empty(readers)?,
                _ => return Err(RETCODE_BAD_PARAMETER),
            }
            let Kind::Participant { subscribers, .. } = &mut state.get_mut(participant)?.kind else {
                return Err(RETCODE_BAD_PARAMETER);
            };
            let before = subscribers.len();
            subscribers.retain(|&s| s != subscriber);
            if subscribers.len() == before {
                return Err(RETCODE_PRECONDITION_NOT_MET);
            }
            state.objects.remove(&subscriber);
            Ok(())
        }))
    }

    fn participant_delete_contained_entities => dds_participant_delete_contained_entities_x64, dds_participant_delete_contained_entities_x86
        (participant: RawHandle) -> ReturnCode
    {
        let rc = code(with_state(|state| {
            state.injected_failure(participant)?;
            state.delete_participant_contents(participant)
        }));
        WAKE.notify_all();
        rc
    }

    // --- Topic -----------------------------------------------------------
    fn topic_get_name => dds_topic_get_name_x64, dds_topic_get_name_x86
        (topic: RawHandle) -> *mut c_char
    {
        match state().get(topic).map(|obj| &obj.kind) {
            Ok(Kind::Topic { name, .. }) => alloc_string(name),
            _ => std::ptr::null_mut(),
        }
    }

    fn topic_get_type_name => dds_topic_get_type_name_x64, dds_topic_get_type_name_x86
        (topic: RawHandle) -> *mut c_char
    {
        match state().get(topic).map(|obj| &obj.kind) {
            Ok(Kind::Topic { type_name, .. }) => alloc_string(type_name),
            _ => std::ptr::null_mut(),
        }
    }

    fn topic_get_participant => dds_topic_get_participant_x64, dds_topic_get_participant_x86
        (topic: RawHandle) -> RawHandle
    {
        child_of(&state(), topic, |k| matches!(k, Kind::Topic { .. }))
    }

    // --- Publisher -------------------------------------------------------
    fn publisher_get_participant => dds_publisher_get_participant_x64, dds_publisher_get_participant_x86
        (publisher: RawHandle) -> RawHandle
    {
        child_of(&state(), publisher, |k| matches!(k, Kind::Publisher { .. }))
    }

    fn publisher_create_datawriter => dds_publisher_create_datawriter_x64, dds_publisher_create_datawriter_x86
        (publisher: RawHandle, topic: RawHandle) -> RawHandle
    {
        created("publisher_create_datawriter", with_state(|state| {
            let owner = state.get(publisher)?;
            if !matches!(owner.kind, Kind::Publisher { .. }) {
                return Err(RETCODE_BAD_PARAMETER);
            }
            let participant = owner.parent;
            let topic_obj = state.get(topic)?;
            if !matches!(topic_obj.kind, Kind::Topic { .. }) || topic_obj.parent != participant {
                return Err(RETCODE_BAD_PARAMETER);
            }
            let writer = state.insert(publisher, Kind::DataWriter { topic });
            if let Kind::Publisher { writers, .. } = &mut state.get_mut(publisher)?.kind {
                writers.push(writer);
            }
            Ok(writer)
        }))
    }

    fn publisher_delete_datawriter => dds_publisher_delete_datawriter_x64, dds_publisher_delete_datawriter_x86
        (publisher: RawHandle, writer: RawHandle) -> ReturnCode
    {
        code(with_state(|state| {
            state.get(writer)?;
            let Kind::Publisher { writers, .. } = &mut state.get_mut(publisher)?.kind else {
                return Err(RETCODE_BAD_PARAMETER);
            };
            let before = writers.len();
            writers.retain(|&w| w != writer);
            if writers.len() == before {
                return Err(RETCODE_PRECONDITION_NOT_MET);
            }
            state.objects.remove(&writer);
            Ok(())
        }))
    }

    fn publisher_delete_contained_entities => dds_publisher_delete_contained_entities_x64, dds_publisher_delete_contained_entities_x86
        (publisher: RawHandle) -> ReturnCode
    {
        code(with_state(|state| state.delete_publisher_contents(publisher)))
    }

    fn publisher_get_partition => dds_publisher_get_partition_x64, dds_publisher_get_partition_x86
        (publisher: RawHandle, out: *mut *mut RawSequence) -> ReturnCode
    {
        partition_out(
            |kind| match kind {
                Kind::Publisher { partition, .. } => Some(partition.clone()),
                _ => None,
            },
            publisher,
            out,
        )
    }

    fn publisher_set_partition => dds_publisher_set_partition_x64, dds_publisher_set_partition_x86
        (publisher: RawHandle, names: *const RawSequence) -> ReturnCode
    {
        let names = read_string_sequence(names);
        code(with_state(|state| match &mut state.get_mut(publisher)?.kind {
            Kind::Publisher { partition, .. } => {
                *partition = names;
                Ok(())
            }
            _ => Err(RETCODE_BAD_PARAMETER),
        }))
    }

    // --- Subscriber ------------------------------------------------------
    fn subscriber_get_participant => dds_subscriber_get_participant_x64, dds_subscriber_get_participant_x86
        (subscriber: RawHandle) -> RawHandle
    {
        child_of(&state(), subscriber, |k| matches!(k, Kind::Subscriber { .. }))
    }

    fn subscriber_create_datareader => dds_subscriber_create_datareader_x64, dds_subscriber_create_datareader_x86
        (subscriber: RawHandle, topic: RawHandle) -> RawHandle
    {
        created("subscriber_create_datareader", with_state(|state| {
            let owner = state.get(subscriber)?;
            if !matches!(owner.kind, Kind::Subscriber { .. }) {
                return Err(RETCODE_BAD_PARAMETER);
            }
            let participant = owner.parent;
            let topic_obj = state.get(topic)?;
            if !matches!(topic_obj.kind, Kind::Topic { .. }) || topic_obj.parent != participant {
                return Err(RETCODE_BAD_PARAMETER);
            }
            let reader = state.insert(
                subscriber,
                Kind::DataReader { topic, conditions: Vec::new() },
            );
            if let Kind::Subscriber { readers, .. } = &mut state.get_mut(subscriber)?.kind {
                readers.push(reader);
            }
            Ok(reader)
        }))
    }

    fn subscriber_delete_datareader => dds_subscriber_delete_datareader_x64, dds_subscriber_delete_datareader_x86
        (subscriber: RawHandle, reader: RawHandle) -> ReturnCode
    {
        code(with_state(|state| {
            match &state.get(reader)?.kind {
                Kind::DataReader { conditions, .. } => require_empty(conditions)?,
                _ => return Err(RETCODE_BAD_PARAMETER),
            }
            let Kind::Subscriber { readers, .. } = &mut state.get_mut(subscriber)?.kind else {
                return Err(RETCODE_BAD_PARAMETER);
            };
            let before = readers.len();
            readers.retain(|&r| r != reader);
            if readers.len() == before {
                return Err(RETCODE_PRECONDITION_NOT_MET);
            }
            state.objects.remove(&reader);
            Ok(())
        }))
    }

    fn subscriber_delete_contained_entities => dds_subscriber_delete_contained_entities_x64, dds_subscriber_delete_contained_entities_x86
        (subscriber: RawHandle) -> ReturnCode
    {
        let rc = code(with_state(|state| {
            state.injected_failure(subscriber)?;
            state.delete_subscriber_contents(subscriber)
        }));
        WAKE.notify_all();
        rc
    }

    fn subscriber_get_partition => dds_subscriber_get_partition_x64, dds_subscriber_get_partition_x86
        (subscriber: RawHandle, out: *mut *mut RawSequence) -> ReturnCode
    {
        partition_out(
            |kind| match kind {
                Kind::Subscriber { partition, .. } => Some(partition.clone()),
                _ => None,
            },
            subscriber,
            out,
        )
    }

    fn subscriber_set_partition => dds_subscriber_set_partition_x64, dds_subscriber_set_partition_x86
        (subscriber: RawHandle, names: *const RawSequence) -> ReturnCode
    {
        let names = read_string_sequence(names);
        code(with_state(|state| match &mut state.get_mut(subscriber)?.kind {
            Kind::Subscriber { partition, .. } => {
                *partition = names;
                Ok(())
            }
            _ => Err(RETCODE_BAD_PARAMETER),
        }))
    }

    // --- DataWriter / DataReader ------------------------------------------
    fn datawriter_get_publisher => dds_datawriter_get_publisher_x64, dds_datawriter_get_publisher_x86
        (writer: RawHandle) -> RawHandle
    {
        child_of(&state(), writer, |k| matches!(k, Kind::DataWriter { .. }))
    }

    fn datawriter_get_topic => dds_datawriter_get_topic_x64, dds_datawriter_get_topic_x86
        (writer: RawHandle) -> RawHandle
    {
        match state().get(writer).map(|obj| &obj.kind) {
            Ok(Kind::DataWriter { topic }) => *topic,
            _ => RawHandle::NULL,
        }
    }

    fn datareader_get_subscriber => dds_datareader_get_subscriber_x64, dds_datareader_get_subscriber_x86
        (reader: RawHandle) -> RawHandle
    {
        child_of(&state(), reader, |k| matches!(k, Kind::DataReader { .. }))
    }

    fn datareader_get_topic => dds_datareader_get_topic_x64, dds_datareader_get_topic_x86
        (reader: RawHandle) -> RawHandle
    {
        match state().get(reader).map(|obj| &obj.kind) {
            Ok(Kind::DataReader { topic, .. }) => *topic,
            _ => RawHandle::NULL,
        }
    }

    fn datareader_create_readcondition => dds_datareader_create_readcondition_x64, dds_datareader_create_readcondition_x86
        (
            reader: RawHandle,
            sample_states: SampleStateMask,
            view_states: ViewStateMask,
            instance_states: InstanceStateMask,
        ) -> RawHandle
    {
        created("datareader_create_readcondition", with_state(|state| {
            create_condition(state, reader, sample_states, view_states, instance_states, None)
        }))
    }

    fn datareader_create_querycondition => dds_datareader_create_querycondition_x64, dds_datareader_create_querycondition_x86
        (
            reader: RawHandle,
            sample_states: SampleStateMask,
            view_states: ViewStateMask,
            instance_states: InstanceStateMask,
            query_expression: *const c_char,
            query_parameters: *const RawSequence,
        ) -> RawHandle
    {
        let Some(expression) = read_string(query_expression) else {
            return RawHandle::NULL;
        };
        let query = Query {
            expression,
            parameters: read_string_sequence(query_parameters),
        };
        created("datareader_create_querycondition", with_state(|state| {
            create_condition(state, reader, sample_states, view_states, instance_states, Some(query))
        }))
    }

    fn datareader_delete_readcondition => dds_datareader_delete_readcondition_x64, dds_datareader_delete_readcondition_x86
        (reader: RawHandle, condition: RawHandle) -> ReturnCode
    {
        let rc = code(with_state(|state| {
            state.get(condition)?;
            state.injected_failure(condition)?;
            let Kind::DataReader { conditions, .. } = &mut state.get_mut(reader)?.kind else {
                return Err(RETCODE_BAD_PARAMETER);
            };
            let before = conditions.len();
            conditions.retain(|&c| c != condition);
            if conditions.len() == before {
                return Err(RETCODE_PRECONDITION_NOT_MET);
            }
            state.delete_condition(condition);
            Ok(())
        }));
        WAKE.notify_all();
        rc
    }

    fn datareader_delete_contained_entities => dds_datareader_delete_contained_entities_x64, dds_datareader_delete_contained_entities_x86
        (reader: RawHandle) -> ReturnCode
    {
        let rc = code(with_state(|state| {
            state.injected_failure(reader)?;
            state.delete_reader_conditions(reader)
        }));
        WAKE.notify_all();
        rc
    }

    // --- Conditions ------------------------------------------------------
    fn readcondition_get_trigger_value => dds_readcondition_get_trigger_value_x64, dds_readcondition_get_trigger_value_x86
        (condition: RawHandle) -> bool
    {
        matches!(
            state().get(condition).map(|obj| &obj.kind),
            Ok(Kind::ReadCondition { trigger: true, .. })
        )
    }

    fn readcondition_get_sample_state_mask => dds_readcondition_get_sample_state_mask_x64, dds_readcondition_get_sample_state_mask_x86
        (condition: RawHandle) -> SampleStateMask
    {
        match state().get(condition).map(|obj| &obj.kind) {
            Ok(Kind::ReadCondition { sample_states, .. }) => *sample_states,
            _ => 0,
        }
    }

    fn readcondition_get_view_state_mask => dds_readcondition_get_view_state_mask_x64, dds_readcondition_get_view_state_mask_x86
        (condition: RawHandle) -> ViewStateMask
    {
        match state().get(condition).map(|obj| &obj.kind) {
            Ok(Kind::ReadCondition { view_states, .. }) => *view_states,
            _ => 0,
        }
    }

    fn readcondition_get_instance_state_mask => dds_readcondition_get_instance_state_mask_x64, dds_readcondition_get_instance_state_mask_x86
        (condition: RawHandle) -> InstanceStateMask
    {
        match state().get(condition).map(|obj| &obj.kind) {
            Ok(Kind::ReadCondition { instance_states, .. }) => *instance_states,
            _ => 0,
        }
    }

    fn querycondition_get_query_expression => dds_querycondition_get_query_expression_x64, dds_querycondition_get_query_expression_x86
        (condition: RawHandle) -> *mut c_char
    {
        match state().get(condition).map(|obj| &obj.kind) {
            Ok(Kind::ReadCondition { query: Some(query), .. }) => alloc_string(&query.expression),
            _ => std::ptr::null_mut(),
        }
    }

    fn querycondition_get_query_parameters => dds_querycondition_get_query_parameters_x64, dds_querycondition_get_query_parameters_x86
        (condition: RawHandle, out: *mut *mut RawSequence) -> ReturnCode
    {
        partition_out(
            |kind| match kind {
                Kind::ReadCondition { query: Some(query), .. } => Some(query.parameters.clone()),
                _ => None,
            },
            condition,
            out,
        )
    }

    fn querycondition_set_query_parameters => dds_querycondition_set_query_parameters_x64, dds_querycondition_set_query_parameters_x86
        (condition: RawHandle, parameters: *const RawSequence) -> ReturnCode
    {
        let parameters = read_string_sequence(parameters);
        code(with_state(|state| match &mut state.get_mut(condition)?.kind {
            Kind::ReadCondition { query: Some(query), .. } => {
                query.parameters = parameters;
                Ok(())
            }
            _ => Err(RETCODE_BAD_PARAMETER),
        }))
    }

    fn guardcondition_create => dds_guardcondition_create_x64, dds_guardcondition_create_x86
        () -> RawHandle
    {
        state().insert(RawHandle::NULL, Kind::GuardCondition { trigger: false })
    }

    fn guardcondition_delete => dds_guardcondition_delete_x64, dds_guardcondition_delete_x86
        (condition: RawHandle) -> ReturnCode
    {
        let rc = code(with_state(|state| {
            if !matches!(state.get(condition)?.kind, Kind::GuardCondition { .. }) {
                return Err(RETCODE_BAD_PARAMETER);
            }
            state.delete_condition(condition);
            Ok(())
        }));
        WAKE.notify_all();
        rc
    }

    fn guardcondition_get_trigger_value => dds_guardcondition_get_trigger_value_x64, dds_guardcondition_get_trigger_value_x86
        (condition: RawHandle) -> bool
    {
        matches!(
            state().get(condition).map(|obj| &obj.kind),
            Ok(Kind::GuardCondition { trigger: true })
        )
    }

    fn guardcondition_set_trigger_value => dds_guardcondition_set_trigger_value_x64, dds_guardcondition_set_trigger_value_x86
        (condition: RawHandle, value: bool) -> ReturnCode
    {
        let rc = code(with_state(|state| match &mut state.get_mut(condition)?.kind {
            Kind::GuardCondition { trigger } => {
                *trigger = value;
                Ok(())
            }
            _ => Err(RETCODE_BAD_PARAMETER),
        }));
        WAKE.notify_all();
        rc
    }

    // --- WaitSet ---------------------------------------------------------
    fn waitset_create => dds_waitset_create_x64, dds_waitset_create_x86
        () -> RawHandle
    {
        state().insert(
            RawHandle::NULL,
            Kind::WaitSet { conditions: Vec::new(), waiting: false },
        )
    }

    fn waitset_delete => dds_waitset_delete_x64, dds_waitset_delete_x86
        (waitset: RawHandle) -> ReturnCode
    {
        let rc = code(with_state(|state| {
            match state.get(waitset)?.kind {
                Kind::WaitSet { waiting: true, .. } => return Err(RETCODE_PRECONDITION_NOT_MET),
                Kind::WaitSet { .. } => {}
                _ => return Err(RETCODE_BAD_PARAMETER),
            }
            state.objects.remove(&waitset);
            Ok(())
        }));
        WAKE.notify_all();
        rc
    }

    fn waitset_attach_condition => dds_waitset_attach_condition_x64, dds_waitset_attach_condition_x86
        (waitset: RawHandle, condition: RawHandle) -> ReturnCode
    {
        let rc = code(with_state(|state| {
            if !is_condition(&state.get(condition)?.kind) {
                return Err(RETCODE_BAD_PARAMETER);
            }
            let Kind::WaitSet { conditions, .. } = &mut state.get_mut(waitset)?.kind else {
                return Err(RETCODE_BAD_PARAMETER);
            };
            if !conditions.contains(&condition) {
                conditions.push(condition);
            }
            Ok(())
        }));
        WAKE.notify_all();
        rc
    }

    fn waitset_detach_condition => dds_waitset_detach_condition_x64, dds_waitset_detach_condition_x86
        (waitset: RawHandle, condition: RawHandle) -> ReturnCode
    {
        code(with_state(|state| {
            let Kind::WaitSet { conditions, .. } = &mut state.get_mut(waitset)?.kind else {
                return Err(RETCODE_BAD_PARAMETER);
            };
            let before = conditions.len();
            conditions.retain(|&c| c != condition);
            if conditions.len() == before {
                return Err(RETCODE_PRECONDITION_NOT_MET);
            }
            Ok(())
        }))
    }

    fn waitset_wait => dds_waitset_wait_x64, dds_waitset_wait_x86
        (waitset: RawHandle, out: *mut *mut RawSequence, timeout: RawDuration) -> ReturnCode
    {
        waitset::wait(waitset, out, timeout)
    }

    fn waitset_get_conditions => dds_waitset_get_conditions_x64, dds_waitset_get_conditions_x86
        (waitset: RawHandle, out: *mut *mut RawSequence) -> ReturnCode
    {
        waitset::conditions(waitset, out)
    }

    // --- Entity ----------------------------------------------------------
    fn entity_enable => dds_entity_enable_x64, dds_entity_enable_x86
        (entity: RawHandle) -> ReturnCode
    {
        code(with_state(|state| {
            state.get_mut(entity)?.enabled = true;
            Ok(())
        }))
    }

    fn entity_set_listener => dds_entity_set_listener_x64, dds_entity_set_listener_x86
        (entity: RawHandle, listener: RawHandle, mask: RawStatusMask) -> ReturnCode
    {
        code(with_state(|state| {
            if !listener.is_null() && !state.listeners.contains_key(&listener) {
                return Err(RETCODE_BAD_PARAMETER);
            }
            let obj = state.get_mut(entity)?;
            if is_condition(&obj.kind) || matches!(obj.kind, Kind::WaitSet { .. }) {
                return Err(RETCODE_BAD_PARAMETER);
            }
            obj.listener = listener;
            obj.mask = if listener.is_null() { 0 } else { mask };
            Ok(())
        }))
    }

    // --- Listeners -------------------------------------------------------
    fn topic_listener_new => dds_topic_listener_new_x64, dds_topic_listener_new_x86
        (ctx: *mut c_void, on_inconsistent_topic: OnInconsistentTopic) -> RawHandle
    {
        new_listener(ctx, Callbacks { on_inconsistent_topic, ..Callbacks::default() })
    }

    fn datawriter_listener_new => dds_datawriter_listener_new_x64, dds_datawriter_listener_new_x86
        (
            ctx: *mut c_void,
            on_offered_deadline_missed: OnOfferedDeadlineMissed,
            on_offered_incompatible_qos: OnOfferedIncompatibleQos,
            on_liveliness_lost: OnLivelinessLost,
            on_publication_matched: OnPublicationMatched,
        ) -> RawHandle
    {
        new_listener(ctx, Callbacks {
            on_offered_deadline_missed,
            on_offered_incompatible_qos,
            on_liveliness_lost,
            on_publication_matched,
            ..Callbacks::default()
        })
    }

    fn publisher_listener_new => dds_publisher_listener_new_x64, dds_publisher_listener_new_x86
        (
            ctx: *mut c_void,
            on_offered_deadline_missed: OnOfferedDeadlineMissed,
            on_offered_incompatible_qos: OnOfferedIncompatibleQos,
            on_liveliness_lost: OnLivelinessLost,
            on_publication_matched: OnPublicationMatched,
        ) -> RawHandle
    {
        new_listener(ctx, Callbacks {
            on_offered_deadline_missed,
            on_offered_incompatible_qos,
            on_liveliness_lost,
            on_publication_matched,
            ..Callbacks::default()
        })
    }

    fn datareader_listener_new => dds_datareader_listener_new_x64, dds_datareader_listener_new_x86
        (
            ctx: *mut c_void,
            on_requested_deadline_missed: OnRequestedDeadlineMissed,
            on_requested_incompatible_qos: OnRequestedIncompatibleQos,
            on_sample_rejected: OnSampleRejected,
            on_liveliness_changed: OnLivelinessChanged,
            on_data_available: OnDataAvailable,
            on_subscription_matched: OnSubscriptionMatched,
            on_sample_lost: OnSampleLost,
        ) -> RawHandle
    {
        new_listener(ctx, Callbacks {
            on_requested_deadline_missed,
            on_requested_incompatible_qos,
            on_sample_rejected,
            on_liveliness_changed,
            on_data_available,
            on_subscription_matched,
            on_sample_lost,
            ..Callbacks::default()
        })
    }

    fn subscriber_listener_new => dds_subscriber_listener_new_x64, dds_subscriber_listener_new_x86
        (
            ctx: *mut c_void,
            on_requested_deadline_missed: OnRequestedDeadlineMissed,
            on_requested_incompatible_qos: OnRequestedIncompatibleQos,
            on_sample_rejected: OnSampleRejected,
            on_liveliness_changed: OnLivelinessChanged,
            on_data_available: OnDataAvailable,
            on_subscription_matched: OnSubscriptionMatched,
            on_sample_lost: OnSampleLost,
            on_data_on_readers: OnDataOnReaders,
        ) -> RawHandle
    {
        new_listener(ctx, Callbacks {
            on_requested_deadline_missed,
            on_requested_incompatible_qos,
            on_sample_rejected,
            on_liveliness_changed,
            on_data_available,
            on_subscription_matched,
            on_sample_lost,
            on_data_on_readers,
            ..Callbacks::default()
        })
    }

    fn participant_listener_new => dds_participant_listener_new_x64, dds_participant_listener_new_x86
        (
            ctx: *mut c_void,
            on_inconsistent_topic: OnInconsistentTopic,
            on_offered_deadline_missed: OnOfferedDeadlineMissed,
            on_offered_incompatible_qos: OnOfferedIncompatibleQos,
            on_liveliness_lost: OnLivelinessLost,
            on_publication_matched: OnPublicationMatched,
            on_requested_deadline_missed: OnRequestedDeadlineMissed,
            on_requested_incompatible_qos: OnRequestedIncompatibleQos,
            on_sample_rejected: OnSampleRejected,
            on_liveliness_changed: OnLivelinessChanged,
            on_data_available: OnDataAvailable,
            on_subscription_matched: OnSubscriptionMatched,
            on_sample_lost: OnSampleLost,
            on_data_on_readers: OnDataOnReaders,
        ) -> RawHandle
    {
        new_listener(ctx, Callbacks {
            on_inconsistent_topic,
            on_offered_deadline_missed,
            on_offered_incompatible_qos,
            on_liveliness_lost,
            on_publication_matched,
            on_requested_deadline_missed,
            on_requested_incompatible_qos,
            on_sample_rejected,
            on_liveliness_changed,
            on_data_available,
            on_subscription_matched,
            on_sample_lost,
            on_data_on_readers,
        })
    }

    fn listener_release => dds_listener_release_x64, dds_listener_release_x86
        (listener: RawHandle)
    {
        let released = {
            let mut state = state();
            let released = state.listeners.remove(&listener);
            if released.is_some() {
                for obj in state.objects.values_mut() {
                    if obj.listener == listener {
                        obj.listener = RawHandle::NULL;
                        obj.mask = 0;
                    }
                }
            }
            released
        };
        match released {
            Some(l) => l.release(),
            None => log::debug!("listener_release: unknown listener {listener}"),
        }
    }
}

fn create_condition(
    state: &mut NativeState,
    reader: RawHandle,
    sample_states: SampleStateMask,
    view_states: ViewStateMask,
    instance_states: InstanceStateMask,
    query: Option<Query>,
) -> Result<RawHandle, ReturnCode> {
    if !matches!(state.get(reader)?.kind, Kind::DataReader { .. }) {
        return Err(RETCODE_BAD_PARAMETER);
    }
    let condition = state.insert(
        reader,
        Kind::ReadCondition {
            sample_states,
            view_states,
            instance_states,
            query,
            trigger: false,
        },
    );
    if let Kind::DataReader { conditions, .. } = &mut state.get_mut(reader)?.kind {
        conditions.push(condition);
    }
    Ok(condition)
}

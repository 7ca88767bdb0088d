// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

use std::mem;
use std::sync::Arc;

use dds_bridge_sys::{InstanceStateMask, RawHandle, SampleStateMask, ViewStateMask};
use parking_lot::Mutex;

use super::{created, Subscriber, Topic};
use crate::condition::{Detached, QueryCondition, ReadCondition};
use crate::error::{check, Error, Result};
use crate::listener::bridge::ListenerSlot;
use crate::listener::DataReaderListener;
use crate::marshal::NativeSequence;
use crate::runtime::{native, Runtime};

#[derive(Clone)]
pub struct DataReader(Arc<DataReaderInner>);

struct DataReaderInner {
    handle: RawHandle,
    runtime: Arc<Runtime>,
    listener: ListenerSlot<dyn DataReaderListener>,
    /// Read and query conditions created on this reader.
    conditions: Mutex<Vec<ReadCondition>>,
}

entity_common!(DataReader, DataReaderListener);

impl DataReader {
    pub(crate) fn wrap(runtime: Arc<Runtime>, handle: RawHandle) -> Self {
        Self(Arc::new(DataReaderInner {
            handle,
            runtime,
            listener: ListenerSlot::new(),
            conditions: Mutex::new(Vec::new()),
        }))
    }

    pub fn get_subscriber(&self) -> Result<Subscriber> {
        let rt = &self.0.runtime;
        let handle = native!(rt, datareader_get_subscriber(self.0.handle))?;
        rt.resolve(handle, || Subscriber::wrap(rt.clone(), handle))
    }

    pub fn get_topic(&self) -> Result<Topic> {
        let rt = &self.0.runtime;
        let handle = native!(rt, datareader_get_topic(self.0.handle))?;
        rt.resolve(handle, || Topic::wrap(rt.clone(), handle))
    }

    pub fn create_readcondition(
        &self,
        sample_states: SampleStateMask,
        view_states: ViewStateMask,
        instance_states: InstanceStateMask,
    ) -> Result<ReadCondition> {
        let rt = &self.0.runtime;
        let handle = native!(
            rt,
            datareader_create_readcondition(self.0.handle, sample_states, view_states, instance_states)
        )?;
        let handle = created("datareader_create_readcondition", handle)?;
        let condition = ReadCondition::new(rt.clone(), handle, self.0.handle);
        self.0.conditions.lock().push(condition.clone());
        Ok(condition)
    }

    pub fn create_querycondition<S: AsRef<str>>(
        &self,
        sample_states: SampleStateMask,
        view_states: ViewStateMask,
        instance_states: InstanceStateMask,
        query_expression: &str,
        query_parameters: &[S],
    ) -> Result<QueryCondition> {
        let rt = &self.0.runtime;
        let expression = std::ffi::CString::new(query_expression)?;
        let parameters = NativeSequence::from_strings(Some(query_parameters))?;
        let handle = native!(
            rt,
            datareader_create_querycondition(
                self.0.handle,
                sample_states,
                view_states,
                instance_states,
                expression.as_ptr(),
                parameters.as_ptr(),
            )
        )?;
        let handle = created("datareader_create_querycondition", handle)?;
        let condition = QueryCondition::new(rt.clone(), handle, self.0.handle);
        self.0
            .conditions
            .lock()
            .push(condition.as_read_condition().clone());
        Ok(condition)
    }

    /// Delete a read or query condition created by this reader.
    ///
    /// The condition is detached from every WaitSet first.
    pub fn delete_readcondition(&self, condition: &ReadCondition) -> Result<()> {
        let mut conditions = self.0.conditions.lock();
        let Some(index) = conditions.iter().position(|c| c.ptr_eq(condition)) else {
            return Err(Error::PreconditionNotMet);
        };
        let detached = condition.release();
        let deleted = native!(
            self.0.runtime,
            datareader_delete_readcondition(self.0.handle, condition.handle())
        )
        .and_then(check);
        if let Err(err) = deleted {
            detached.restore();
            return Err(err);
        }
        conditions.remove(index);
        drop(conditions);
        condition.mark_deleted();
        Ok(())
    }

    /// Delete every condition this reader created.
    pub fn delete_contained_entities(&self) -> Result<()> {
        let detached = self.release_conditions();
        let deleted = native!(
            self.0.runtime,
            datareader_delete_contained_entities(self.0.handle)
        )
        .and_then(check);
        if let Err(err) = deleted {
            detached.into_iter().for_each(Detached::restore);
            return Err(err);
        }
        self.retire_conditions();
        Ok(())
    }

    /// Detach every condition from its WaitSets ahead of a native delete.
    pub(crate) fn release_conditions(&self) -> Vec<Detached> {
        let conditions = self.0.conditions.lock().clone();
        conditions.iter().map(ReadCondition::release).collect()
    }

    fn retire_conditions(&self) {
        let conditions = mem::take(&mut *self.0.conditions.lock());
        for condition in conditions {
            condition.mark_deleted();
        }
    }

    /// Drop the wrapper's bookkeeping once the reader is gone natively.
    pub(crate) fn retire(&self) {
        self.retire_conditions();
        self.0.listener.unbind();
        self.0.runtime.unregister(self.0.handle);
    }
}

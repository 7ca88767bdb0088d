// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use dds_bridge_sys::{NativeApi, RawHandle};

use super::{created, DomainParticipant};
use crate::abi::Abi;
use crate::condition::{GuardCondition, WaitSet};
use crate::config::BridgeConfig;
use crate::error::{check, Error, Result};
use crate::registry::{self, AnyEntity, IdentityRegistry};
use crate::runtime::{native, Runtime};

/// Creates participants and the free-standing conditions.
///
/// # Example
///
/// ```ignore
/// let factory = DomainParticipantFactory::builder()
///     .library("/opt/dds/lib/libdds_native.so")
///     .domain_id(3)
///     .build()?;
/// let participant = factory.create_default_participant()?;
/// ```
pub struct DomainParticipantFactory {
    runtime: Arc<Runtime>,
    default_domain: i32,
}

impl DomainParticipantFactory {
    #[must_use]
    pub fn builder() -> FactoryBuilder {
        FactoryBuilder::default()
    }

    /// Factory configured from the `DDS_BRIDGE_*` environment variables.
    pub fn from_env() -> Result<Self> {
        let config = BridgeConfig::from_env();
        config.apply_log_level();
        Self::builder().config(&config).build()
    }

    #[must_use]
    pub fn runtime(&self) -> &Arc<Runtime> {
        &self.runtime
    }

    #[must_use]
    pub fn default_domain_id(&self) -> i32 {
        self.default_domain
    }

    pub fn create_participant(&self, domain_id: i32) -> Result<DomainParticipant> {
        if domain_id < 0 {
            return Err(Error::InvalidArgument("domain id must not be negative"));
        }
        let rt = &self.runtime;
        let handle = native!(rt, participant_create(domain_id))?;
        let participant =
            DomainParticipant::wrap(rt.clone(), created("participant_create", handle)?);
        rt.register(participant.clone().into());
        log::debug!("{participant:?} created on domain {domain_id}");
        Ok(participant)
    }

    pub fn create_default_participant(&self) -> Result<DomainParticipant> {
        self.create_participant(self.default_domain)
    }

    /// Delete a participant that no longer contains entities.
    pub fn delete_participant(&self, participant: &DomainParticipant) -> Result<()> {
        let registered = self
            .runtime
            .lookup::<DomainParticipant>(participant.handle())
            .is_some_and(|p| p.ptr_eq(participant));
        if !registered || participant.contains_entities() {
            return Err(Error::PreconditionNotMet);
        }
        check(native!(self.runtime, participant_delete(participant.handle()))?)?;
        participant.retire();
        Ok(())
    }

    pub fn create_waitset(&self) -> Result<WaitSet> {
        WaitSet::create(&self.runtime)
    }

    pub fn create_guard_condition(&self) -> Result<GuardCondition> {
        GuardCondition::create(&self.runtime)
    }

    /// Registered wrapper for `handle`, if any.
    #[must_use]
    pub fn lookup(&self, handle: RawHandle) -> Option<AnyEntity> {
        self.runtime.registry().find(handle)
    }
}

impl fmt::Debug for DomainParticipantFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DomainParticipantFactory")
            .field("runtime", &self.runtime)
            .field("default_domain", &self.default_domain)
            .finish()
    }
}

/// Builder for [`DomainParticipantFactory`].
#[derive(Default)]
pub struct FactoryBuilder {
    api: Option<NativeApi>,
    library: Option<PathBuf>,
    abi: Option<Abi>,
    registry: Option<Arc<dyn IdentityRegistry>>,
    domain_id: i32,
}

impl FactoryBuilder {
    /// Use an already resolved entry-point table.
    #[must_use]
    pub fn api(mut self, api: NativeApi) -> Self {
        self.api = Some(api);
        self
    }

    /// Load the native runtime from `path` at build time.
    #[must_use]
    pub fn library(mut self, path: impl Into<PathBuf>) -> Self {
        self.library = Some(path.into());
        self
    }

    /// Override the detected process ABI.
    #[must_use]
    pub fn abi(mut self, abi: Abi) -> Self {
        self.abi = Some(abi);
        self
    }

    /// Use `registry` instead of the process-wide one.
    #[must_use]
    pub fn registry(mut self, registry: Arc<dyn IdentityRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    #[must_use]
    pub fn domain_id(mut self, domain_id: i32) -> Self {
        self.domain_id = domain_id;
        self
    }

    /// Take library path, ABI and default domain from `config`.
    #[must_use]
    pub fn config(mut self, config: &BridgeConfig) -> Self {
        if let Some(library) = &config.library {
            self.library = Some(library.clone());
        }
        self.abi = Some(config.abi);
        self.domain_id = config.domain_id;
        self
    }

    pub fn build(self) -> Result<DomainParticipantFactory> {
        let api = match (self.api, self.library) {
            (Some(api), _) => api,
            (None, Some(path)) => {
                log::info!("loading native DDS runtime from {}", path.display());
                // SAFETY: the configured library is the native DDS runtime,
                // whose dds_* exports match the entry-point table.
                unsafe { NativeApi::load(&path) }?
            }
            (None, None) => {
                return Err(Error::NativeLibraryLoad {
                    operation: "load",
                    reason: "no native library configured".to_string(),
                })
            }
        };
        let abi = self.abi.unwrap_or_else(Abi::current);
        let registry = self.registry.unwrap_or_else(registry::global);
        log::debug!("participant factory on {abi} entry points");
        Ok(DomainParticipantFactory {
            runtime: Runtime::new(api, abi, registry),
            default_domain: self.domain_id,
        })
    }
}

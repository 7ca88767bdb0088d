// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Error taxonomy mirroring the native return codes.

use std::ffi::NulError;

use dds_bridge_sys::{
    LoadError, ReturnCode, RETCODE_ALREADY_DELETED, RETCODE_BAD_PARAMETER, RETCODE_ERROR,
    RETCODE_ILLEGAL_OPERATION, RETCODE_IMMUTABLE_POLICY, RETCODE_INCONSISTENT_POLICY,
    RETCODE_NOT_ENABLED, RETCODE_NO_DATA, RETCODE_OK, RETCODE_OUT_OF_RESOURCES,
    RETCODE_PRECONDITION_NOT_MET, RETCODE_TIMEOUT, RETCODE_UNSUPPORTED,
};
use thiserror::Error;

/// Errors surfaced by the bridge.
///
/// Every native return code maps onto exactly one variant and back, so
/// callers keep the native error contract.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("native error")]
    Error,
    #[error("operation unsupported")]
    Unsupported,
    #[error("bad parameter")]
    BadParameter,
    #[error("precondition not met")]
    PreconditionNotMet,
    #[error("out of resources")]
    OutOfResources,
    #[error("entity not enabled")]
    NotEnabled,
    #[error("immutable policy")]
    ImmutablePolicy,
    #[error("inconsistent policy")]
    InconsistentPolicy,
    #[error("entity already deleted")]
    AlreadyDeleted,
    #[error("timeout")]
    Timeout,
    #[error("no data")]
    NoData,
    #[error("illegal operation")]
    IllegalOperation,
    /// The entry point for the running ABI could not be resolved.
    #[error("native library unavailable for `{operation}`: {reason}")]
    NativeLibraryLoad {
        operation: &'static str,
        reason: String,
    },
    /// Rejected before any native call was attempted.
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),
    #[error(transparent)]
    Nul(#[from] NulError),
}

/// Result type used throughout the bridge.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Error for a native return code, `None` for `RETCODE_OK`.
    #[must_use]
    pub fn from_code(rc: ReturnCode) -> Option<Self> {
        let err = match rc {
            RETCODE_OK => return None,
            RETCODE_ERROR => Self::Error,
            RETCODE_UNSUPPORTED => Self::Unsupported,
            RETCODE_BAD_PARAMETER => Self::BadParameter,
            RETCODE_PRECONDITION_NOT_MET => Self::PreconditionNotMet,
            RETCODE_OUT_OF_RESOURCES => Self::OutOfResources,
            RETCODE_NOT_ENABLED => Self::NotEnabled,
            RETCODE_IMMUTABLE_POLICY => Self::ImmutablePolicy,
            RETCODE_INCONSISTENT_POLICY => Self::InconsistentPolicy,
            RETCODE_ALREADY_DELETED => Self::AlreadyDeleted,
            RETCODE_TIMEOUT => Self::Timeout,
            RETCODE_NO_DATA => Self::NoData,
            RETCODE_ILLEGAL_OPERATION => Self::IllegalOperation,
            other => {
                log::warn!("unknown native return code {other}");
                Self::Error
            }
        };
        Some(err)
    }

    /// Native return code this error came from, if any.
    #[must_use]
    pub fn return_code(&self) -> Option<ReturnCode> {
        let rc = match self {
            Self::Error => RETCODE_ERROR,
            Self::Unsupported => RETCODE_UNSUPPORTED,
            Self::BadParameter => RETCODE_BAD_PARAMETER,
            Self::PreconditionNotMet => RETCODE_PRECONDITION_NOT_MET,
            Self::OutOfResources => RETCODE_OUT_OF_RESOURCES,
            Self::NotEnabled => RETCODE_NOT_ENABLED,
            Self::ImmutablePolicy => RETCODE_IMMUTABLE_POLICY,
            Self::InconsistentPolicy => RETCODE_INCONSISTENT_POLICY,
            Self::AlreadyDeleted => RETCODE_ALREADY_DELETED,
            Self::Timeout => RETCODE_TIMEOUT,
            Self::NoData => RETCODE_NO_DATA,
            Self::IllegalOperation => RETCODE_ILLEGAL_OPERATION,
            Self::NativeLibraryLoad { .. } | Self::InvalidArgument(_) | Self::Nul(_) => {
                return None
            }
        };
        Some(rc)
    }
}

/// Convert a native return code.
pub fn check(rc: ReturnCode) -> Result<()> {
    match Error::from_code(rc) {
        None => Ok(()),
        Some(err) => {
            log::debug!("native call returned {rc} ({err})");
            Err(err)
        }
    }
}

impl From<LoadError> for Error {
    fn from(err: LoadError) -> Self {
        Self::NativeLibraryLoad {
            operation: "load",
            reason: err.to_string(),
        }
    }
}

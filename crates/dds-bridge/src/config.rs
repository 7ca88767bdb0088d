// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Environment variable configuration.
//!
//! - `DDS_BRIDGE_LIBRARY`: path of the native DDS runtime library
//! - `DDS_BRIDGE_ABI`: `x64`, `x86` or `auto` (default: detected from the process)
//! - `DDS_BRIDGE_DOMAIN_ID`: default domain id (default: 0)
//! - `DDS_BRIDGE_LOG_LEVEL`: log level used when `RUST_LOG` is unset (default: "info")
//!
//! ```bash
//! export DDS_BRIDGE_LIBRARY=/opt/dds/lib/libdds_native.so
//! export DDS_BRIDGE_DOMAIN_ID=7
//! export DDS_BRIDGE_LOG_LEVEL=dds_bridge=debug
//! ```

use std::env;
use std::path::PathBuf;

use crate::abi::Abi;

pub const ENV_LIBRARY: &str = "DDS_BRIDGE_LIBRARY";
pub const ENV_ABI: &str = "DDS_BRIDGE_ABI";
pub const ENV_DOMAIN_ID: &str = "DDS_BRIDGE_DOMAIN_ID";
pub const ENV_LOG_LEVEL: &str = "DDS_BRIDGE_LOG_LEVEL";

/// Bridge configuration read from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeConfig {
    /// Native library to load; `None` when the table is supplied in code.
    pub library: Option<PathBuf>,
    pub abi: Abi,
    pub domain_id: i32,
    /// Logging filter (trace, debug, info, warn, error, or env_logger syntax)
    pub log_level: String,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            library: None,
            abi: Abi::current(),
            domain_id: 0,
            log_level: "info".to_string(),
        }
    }
}

impl BridgeConfig {
    /// Load configuration from environment variables.
    ///
    /// Unparsable values are logged and replaced by their defaults.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let library = env::var_os(ENV_LIBRARY)
            .filter(|s| !s.is_empty())
            .map(PathBuf::from);

        let abi = match env::var(ENV_ABI) {
            Ok(s) => s.parse::<Abi>().unwrap_or_else(|_| {
                log::warn!("{ENV_ABI}={s:?} is not an ABI name; using {}", defaults.abi);
                defaults.abi
            }),
            Err(_) => defaults.abi,
        };

        let domain_id = env::var(ENV_DOMAIN_ID)
            .ok()
            .and_then(|s| match s.trim().parse::<i32>() {
                Ok(id) if id >= 0 => Some(id),
                _ => {
                    log::warn!("{ENV_DOMAIN_ID}={s:?} is not a domain id; using 0");
                    None
                }
            })
            .unwrap_or(defaults.domain_id);

        let log_level = env::var(ENV_LOG_LEVEL)
            .ok()
            .filter(|s| !s.is_empty())
            .unwrap_or(defaults.log_level);

        Self {
            library,
            abi,
            domain_id,
            log_level,
        }
    }

    /// True when anything differs from the defaults.
    #[must_use]
    pub fn is_custom(&self) -> bool {
        *self != Self::default()
    }

    /// Export the log level as `RUST_LOG` unless that is already set.
    pub fn apply_log_level(&self) {
        if let Err(env::VarError::NotPresent) = env::var("RUST_LOG") {
            env::set_var("RUST_LOG", &self.log_level);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    // env vars are process-wide; serialize the tests touching them
    static ENV_LOCK: Mutex<()> = parking_lot::const_mutex(());

    fn with_env(vars: &[(&str, Option<&str>)], f: impl FnOnce()) {
        let _guard = ENV_LOCK.lock();
        let saved: Vec<_> = vars.iter().map(|(k, _)| (*k, env::var_os(k))).collect();
        for (k, v) in vars {
            match v {
                Some(v) => env::set_var(k, v),
                None => env::remove_var(k),
            }
        }
        f();
        for (k, v) in saved {
            match v {
                Some(v) => env::set_var(k, v),
                None => env::remove_var(k),
            }
        }
    }

    #[test]
    fn test_default_config() {
        let config = BridgeConfig::default();
        assert_eq!(config.domain_id, 0);
        assert!(config.library.is_none());
        assert_eq!(config.abi, Abi::current());
        assert_eq!(config.log_level, "info");
        assert!(!config.is_custom());
    }

    #[test]
    fn test_from_env_reads_every_variable() {
        with_env(
            &[
                (ENV_LIBRARY, Some("/opt/dds/libdds_native.so")),
                (ENV_ABI, Some("x86")),
                (ENV_DOMAIN_ID, Some("42")),
                (ENV_LOG_LEVEL, Some("debug")),
            ],
            || {
                let config = BridgeConfig::from_env();
                assert_eq!(
                    config.library,
                    Some(PathBuf::from("/opt/dds/libdds_native.so"))
                );
                assert_eq!(config.abi, Abi::X86);
                assert_eq!(config.domain_id, 42);
                assert_eq!(config.log_level, "debug");
                assert!(config.is_custom());
            },
        );
    }

    #[test]
    fn test_invalid_values_fall_back() {
        with_env(
            &[
                (ENV_LIBRARY, Some("")),
                (ENV_ABI, Some("sparc")),
                (ENV_DOMAIN_ID, Some("-3")),
                (ENV_LOG_LEVEL, None),
            ],
            || {
                let config = BridgeConfig::from_env();
                assert!(config.library.is_none());
                assert_eq!(config.abi, Abi::current());
                assert_eq!(config.domain_id, 0);
                assert_eq!(config.log_level, "info");
            },
        );
    }

    #[test]
    fn test_auto_abi_is_detected() {
        with_env(&[(ENV_ABI, Some("auto"))], || {
            assert_eq!(BridgeConfig::from_env().abi, Abi::current());
        });
    }
}

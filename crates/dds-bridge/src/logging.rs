// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Logging initialization.
//!
//! The bridge logs through the `log` facade; these helpers install
//! `env_logger` for applications that have no logger of their own.
//! Each returns `false` when a logger was already installed.

use log::LevelFilter;

/// Initialize console logging at `level`.
pub fn init(level: LevelFilter) -> bool {
    env_logger::Builder::new()
        .filter_level(level)
        .format_timestamp_millis()
        .try_init()
        .is_ok()
}

/// Initialize from `RUST_LOG`, falling back to `default_level`.
pub fn init_env(default_level: LevelFilter) -> bool {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(default_level.to_string()),
    )
    .format_timestamp_millis()
    .try_init()
    .is_ok()
}

/// Initialize with an env_logger filter string, e.g. `"dds_bridge=debug,info"`.
pub fn init_with_filter(filter: &str) -> bool {
    env_logger::Builder::new()
        .parse_filters(filter)
        .format_timestamp_millis()
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_init_reports_existing_logger() {
        // whichever call wins, the later ones must see a logger in place
        let _ = init_with_filter("dds_bridge=trace");
        assert!(!init(LevelFilter::Info));
        assert!(!init_env(LevelFilter::Warn));
    }
}

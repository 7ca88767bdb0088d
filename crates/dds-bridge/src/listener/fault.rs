// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Process-wide channel for panics raised inside listener handlers.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use parking_lot::RwLock;

/// A listener handler panicked while serving a native callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackFault {
    /// Callback that was running, e.g. `on_data_available`.
    pub callback: &'static str,
    /// Panic payload rendered as text.
    pub message: String,
}

type Hook = Arc<dyn Fn(&CallbackFault) + Send + Sync>;

static HOOK: RwLock<Option<Hook>> = parking_lot::const_rwlock(None);

/// Route callback faults to `hook` instead of the log.
pub fn set_callback_fault_hook(hook: impl Fn(&CallbackFault) + Send + Sync + 'static) {
    *HOOK.write() = Some(Arc::new(hook));
}

/// Restore the default hook, which logs at `error`.
pub fn reset_callback_fault_hook() {
    *HOOK.write() = None;
}

fn describe(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

pub(crate) fn report(callback: &'static str, payload: &(dyn Any + Send)) {
    let fault = CallbackFault {
        callback,
        message: describe(payload),
    };
    let hook = HOOK.read().clone();
    match hook {
        Some(hook) => {
            if panic::catch_unwind(AssertUnwindSafe(|| hook(&fault))).is_err() {
                log::error!("callback fault hook panicked while reporting {fault:?}");
            }
        }
        None => log::error!("listener {} panicked: {}", fault.callback, fault.message),
    }
}

/// Run `f`, turning a panic into a fault report.
pub(crate) fn guard(callback: &'static str, f: impl FnOnce()) {
    if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(f)) {
        report(callback, payload.as_ref());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_text_is_extracted() {
        let payload: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(describe(payload.as_ref()), "boom");
        let payload: Box<dyn Any + Send> = Box::new(String::from("bang"));
        assert_eq!(describe(payload.as_ref()), "bang");
        let payload: Box<dyn Any + Send> = Box::new(7_u8);
        assert_eq!(describe(payload.as_ref()), "non-string panic payload");
    }
}

//! Process-wide feature flags.
//!
//! A small runtime-tunable flag set shared by all sessions, exposed through
//! the `getConfig`/`setConfig` surface. Unrecognized keys are ignored on both
//! read and write for forward compatibility.

use std::sync::atomic::{AtomicBool, Ordering};

use once_cell::sync::Lazy;
use serde_json::{json, Value};

use crate::constants::push::MAX_SAMPLES_PER_PUSH;

/// Recognized flag keys.
pub const KEY_FAST_PATH: &str = "enable-fast-path";
pub const KEY_ZERO_COPY: &str = "enable-zero-copy";
pub const KEY_DEBUG_LOGGING: &str = "debug-logging";

struct RuntimeFlags {
    fast_path: AtomicBool,
    zero_copy: AtomicBool,
    debug_logging: AtomicBool,
}

static FLAGS: Lazy<RuntimeFlags> = Lazy::new(|| RuntimeFlags {
    fast_path: AtomicBool::new(true),
    zero_copy: AtomicBool::new(true),
    debug_logging: AtomicBool::new(false),
});

/// Whether the fast dispatch path is enabled.
pub fn fast_path_enabled() -> bool {
    FLAGS.fast_path.load(Ordering::Relaxed)
}

/// Whether zero-copy sample hand-off is enabled.
pub fn zero_copy_enabled() -> bool {
    FLAGS.zero_copy.load(Ordering::Relaxed)
}

/// Whether verbose debug logging is enabled.
pub fn debug_logging_enabled() -> bool {
    FLAGS.debug_logging.load(Ordering::Relaxed)
}

/// Current flag values plus the fixed per-push bound.
pub fn get_config() -> Value {
    json!({
        KEY_FAST_PATH: fast_path_enabled(),
        KEY_ZERO_COPY: zero_copy_enabled(),
        KEY_DEBUG_LOGGING: debug_logging_enabled(),
        "maxSamplesPerPush": MAX_SAMPLES_PER_PUSH,
    })
}

/// Apply recognized boolean keys from a key/value map; everything else is
/// ignored.
pub fn set_config(updates: &Value) {
    let Some(map) = updates.as_object() else {
        return;
    };
    for (key, value) in map {
        let Some(enabled) = value.as_bool() else {
            continue;
        };
        match key.as_str() {
            KEY_FAST_PATH => FLAGS.fast_path.store(enabled, Ordering::Relaxed),
            KEY_ZERO_COPY => FLAGS.zero_copy.store(enabled, Ordering::Relaxed),
            KEY_DEBUG_LOGGING => FLAGS.debug_logging.store(enabled, Ordering::Relaxed),
            _ => {}
        }
    }
}

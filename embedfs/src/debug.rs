//! Debug bypass
//!
//! While enabled, every `FileSystem` call is served from the host filesystem instead of the
//! embedded store, so assets can be edited without regenerating bundles.

use std::sync::atomic::{AtomicBool, Ordering};

static IS_DEBUG: AtomicBool = AtomicBool::new(false);

pub fn set_debug_mode(enabled: bool) {
    IS_DEBUG.store(enabled, Ordering::Relaxed);
}

pub fn is_debug_enabled() -> bool {
    IS_DEBUG.load(Ordering::Relaxed)
}

/// Turns an embedded-style path into a host path.
pub(crate) fn host_path(path: &str) -> std::path::PathBuf {
    std::path::PathBuf::from(path.replace('/', std::path::MAIN_SEPARATOR_STR))
}

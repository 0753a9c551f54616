//! Logging macros gated on a module-level `ENABLE_LOGS` flag.
//!
//! Every module that logs through these macros declares the flag next to its
//! imports, so noisy paths (merge short-circuits, cache round-trips) can be
//! silenced per module without touching `RUST_LOG`:
//!
//! ```ignore
//! const ENABLE_LOGS: bool = true;
//!
//! use crate::{log_debug, log_warn};
//!
//! log_warn!("guide cache unreadable: {err}");
//! ```
//!
//! All macros log under the `epg_grid` target so a single
//! `RUST_LOG=epg_grid=debug` turns the whole engine up.

/// Debug-level log, emitted only when the calling module's `ENABLE_LOGS` is set.
#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::debug!(target: "epg_grid", $($arg)*);
        }
    };
}

/// Info-level log, emitted only when the calling module's `ENABLE_LOGS` is set.
#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::info!(target: "epg_grid", $($arg)*);
        }
    };
}

/// Warn-level log, emitted only when the calling module's `ENABLE_LOGS` is set.
#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::warn!(target: "epg_grid", $($arg)*);
        }
    };
}

/// Error-level log, emitted only when the calling module's `ENABLE_LOGS` is set.
#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::error!(target: "epg_grid", $($arg)*);
        }
    };
}

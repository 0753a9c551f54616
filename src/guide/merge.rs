use std::sync::Arc;

use crate::models::Grid;

use super::{config::ReconcileConfig, entries::merge_entries, window::reconcile_window};

const ENABLE_LOGS: bool = true;

use crate::log_debug;

/// Fold a newly fetched grid into the held one.
///
/// Returns `incoming` untouched when nothing is held yet. When the merged
/// content equals `current`, the `current` handle itself is returned so
/// callers can detect "nothing changed" with `Arc::ptr_eq`.
pub fn merge_grid(
    current: Option<&Arc<Grid>>,
    incoming: Arc<Grid>,
    preserve_existing_window: bool,
    config: &ReconcileConfig,
) -> Arc<Grid> {
    let Some(current) = current else {
        return incoming;
    };

    let window = reconcile_window(
        Some(&current.window),
        &incoming.window,
        preserve_existing_window,
        config.staleness_tolerance(),
    );
    let items = merge_entries(current, &incoming, &window, &config.parser);
    let merged = Grid::new(window, items);
    debug_assert!(merged.is_consistent());

    if merged == **current {
        log_debug!(
            "guide merge produced no change ({} channels)",
            merged.count
        );
        return Arc::clone(current);
    }

    log_debug!(
        "guide merged: {} channels, {} programs, window {} .. {}",
        merged.count,
        merged.program_count(),
        merged.window.start,
        merged.window.end
    );
    Arc::new(merged)
}

use chrono::Duration;

use crate::models::Window;

/// Combine the held window with a freshly fetched one.
///
/// The merged end is always the later of the two ends. The merged start is
/// the incoming start, except that when `preserve_existing_window` is set and
/// the incoming start is later than the held start by no more than
/// `tolerance`, the held start is kept so the left edge does not jitter.
/// An incoming start earlier than the held one always wins.
pub fn reconcile_window(
    current: Option<&Window>,
    incoming: &Window,
    preserve_existing_window: bool,
    tolerance: Duration,
) -> Window {
    let Some(current) = current else {
        return *incoming;
    };

    let keep_old_start = preserve_existing_window
        && current.start < incoming.start
        && incoming.start - current.start <= tolerance;

    let start = if incoming.start < current.start {
        incoming.start
    } else if keep_old_start {
        current.start
    } else {
        incoming.start
    };

    // An inverted incoming window is the only way to get here with end < start.
    let end = current.end.max(incoming.end).max(start);

    Window { start, end }
}

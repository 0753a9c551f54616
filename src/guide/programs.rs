use chrono::{DateTime, Utc};
use indexmap::IndexMap;

use crate::models::{Program, SlotKey, Window};

use super::instant::InstantParser;

/// Merge one channel's program lists from two fetches.
///
/// Slots are keyed by their raw `(start, end)` strings. Slots from `existing`
/// survive unless `fresh` carries the same key, in which case the fresh
/// program replaces it. Survivors are clamped to `window` and returned in
/// chronological order.
///
/// When either side is empty the other side is returned verbatim, without
/// dedup, clamp or sort. See DESIGN.md before changing that.
pub fn merge_programs(
    existing: &[Program],
    fresh: &[Program],
    window: &Window,
    parser: &InstantParser,
) -> Vec<Program> {
    if existing.is_empty() {
        return fresh.to_vec();
    }
    if fresh.is_empty() {
        return existing.to_vec();
    }

    let mut slots: IndexMap<SlotKey, &Program> =
        IndexMap::with_capacity(existing.len() + fresh.len());
    for program in existing {
        slots.entry(program.slot_key()).or_insert(program);
    }
    for program in fresh {
        slots.insert(program.slot_key(), program);
    }

    let mut survivors: Vec<(DateTime<Utc>, &Program)> = slots
        .into_values()
        .filter(|program| overlaps_window(program, window, parser))
        .map(|program| {
            let sort_start = parser.parse(&program.start).unwrap_or(window.start);
            (sort_start, program)
        })
        .collect();

    // Stable, so slots sharing a start keep map order.
    survivors.sort_by_key(|(start, _)| *start);

    survivors
        .into_iter()
        .map(|(_, program)| program.clone())
        .collect()
}

/// True when the program keeps a positive-length overlap with `window`.
/// Programs whose bounds don't parse are always kept.
fn overlaps_window(program: &Program, window: &Window, parser: &InstantParser) -> bool {
    let (Ok(start), Ok(end)) = (parser.parse(&program.start), parser.parse(&program.end)) else {
        return true;
    };

    let clamped_start = start.max(window.start);
    let clamped_end = end.min(window.end);
    clamped_end > clamped_start
}

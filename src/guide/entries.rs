use std::collections::HashMap;

use indexmap::IndexSet;

use crate::models::{Grid, GuideEntry, Window};

use super::{instant::InstantParser, programs::merge_programs};

/// Union the channels of two grids.
///
/// Ids from `current` keep their order; ids only `incoming` knows follow in
/// incoming order. Incoming metadata wins where it is set.
pub fn merge_entries(
    current: &Grid,
    incoming: &Grid,
    window: &Window,
    parser: &InstantParser,
) -> Vec<GuideEntry> {
    let existing_by_id = index_by_channel(&current.items);
    let fresh_by_id = index_by_channel(&incoming.items);

    let ids: IndexSet<&str> = current
        .items
        .iter()
        .chain(incoming.items.iter())
        .map(|entry| entry.channel_id.as_str())
        .collect();

    ids.into_iter()
        .filter_map(|id| {
            let existing = existing_by_id.get(id).copied();
            let fresh = fresh_by_id.get(id).copied();
            merge_entry(existing, fresh, window, parser)
        })
        .collect()
}

fn index_by_channel(items: &[GuideEntry]) -> HashMap<&str, &GuideEntry> {
    let mut by_id = HashMap::with_capacity(items.len());
    for entry in items {
        // First occurrence wins, matching its position in the id union.
        by_id.entry(entry.channel_id.as_str()).or_insert(entry);
    }
    by_id
}

fn merge_entry(
    existing: Option<&GuideEntry>,
    fresh: Option<&GuideEntry>,
    window: &Window,
    parser: &InstantParser,
) -> Option<GuideEntry> {
    let base = fresh.or(existing)?;

    let name = match (fresh, existing) {
        (Some(fresh), _) if !fresh.name.is_empty() => fresh.name.clone(),
        (_, Some(existing)) => existing.name.clone(),
        _ => base.name.clone(),
    };
    let logo = fresh
        .and_then(|entry| entry.logo.clone())
        .or_else(|| existing.and_then(|entry| entry.logo.clone()));
    let guide_source_id = fresh
        .and_then(|entry| entry.guide_source_id.clone())
        .or_else(|| existing.and_then(|entry| entry.guide_source_id.clone()));

    let programs = merge_programs(
        existing.map(|entry| entry.programs.as_slice()).unwrap_or_default(),
        fresh.map(|entry| entry.programs.as_slice()).unwrap_or_default(),
        window,
        parser,
    );

    Some(GuideEntry {
        channel_id: base.channel_id.clone(),
        name,
        logo,
        guide_source_id,
        programs,
    })
}

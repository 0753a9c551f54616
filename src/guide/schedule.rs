use chrono::{DateTime, Utc};

use crate::models::{GuideEntry, Program};

use super::instant::InstantParser;

/// What a channel is airing at an instant and what follows it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NowNext<'a> {
    pub now: Option<&'a Program>,
    pub next: Option<&'a Program>,
}

/// Programs whose times don't parse can't be placed on a clock and are skipped.
pub fn now_and_next<'a>(
    entry: &'a GuideEntry,
    at: DateTime<Utc>,
    parser: &InstantParser,
) -> NowNext<'a> {
    let timed: Vec<(DateTime<Utc>, DateTime<Utc>, &Program)> = entry
        .programs
        .iter()
        .filter_map(|program| {
            let start = parser.parse(&program.start).ok()?;
            let end = parser.parse(&program.end).ok()?;
            Some((start, end, program))
        })
        .collect();

    let current = timed
        .iter()
        .filter(|(start, end, _)| *start <= at && at < *end)
        .max_by_key(|(start, _, _)| *start);

    let next_after = current.map(|(_, end, _)| *end).unwrap_or(at);
    let next = timed
        .iter()
        .filter(|(start, _, _)| {
            if current.is_some() {
                *start >= next_after
            } else {
                *start > at
            }
        })
        .min_by_key(|(start, _, _)| *start);

    NowNext {
        now: current.map(|(_, _, program)| *program),
        next: next.map(|(_, _, program)| *program),
    }
}

/// Elapsed fraction of `program` at `at`, clamped to `[0, 1]`.
pub fn progress(program: &Program, at: DateTime<Utc>, parser: &InstantParser) -> Option<f64> {
    let start = parser.parse(&program.start).ok()?;
    let end = parser.parse(&program.end).ok()?;
    let total = (end - start).num_seconds();
    if total <= 0 {
        return None;
    }

    let elapsed = (at - start).num_seconds();
    Some((elapsed as f64 / total as f64).clamp(0.0, 1.0))
}

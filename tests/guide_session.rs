use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use epg_grid_lib::{
    guide::{merge_grid, now_and_next, InstantParser},
    ApplyOutcome, Grid, GuideCache, GuideSession, ReconcileConfig,
};

fn at(h: u32, m: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, h, m, 0)
        .single()
        .expect("valid timestamp")
}

fn channel(id: &str, name: &str, programs: &[(&str, &str, &str)]) -> serde_json::Value {
    let programs: Vec<serde_json::Value> = programs
        .iter()
        .map(|(title, start, end)| serde_json::json!({"title": title, "start": start, "end": end}))
        .collect();
    serde_json::json!({"live_id": id, "name": name, "programs": programs})
}

/// A guide response as the API would send it for a slice of channels.
fn fetch(window: (&str, &str), items: Vec<serde_json::Value>) -> Grid {
    serde_json::from_value(serde_json::json!({
        "window": {"start": window.0, "end": window.1},
        "count": items.len(),
        "items": items,
    }))
    .expect("valid guide response")
}

fn titles(grid: &Grid, channel: &str) -> Vec<String> {
    grid.entry(channel)
        .expect("channel present")
        .programs
        .iter()
        .map(|p| p.title.clone())
        .collect()
}

#[tokio::test]
async fn paged_fetches_build_one_guide_and_survive_restart() {
    let dir = tempfile::tempdir().expect("tempdir");
    let cache_path = dir.path().join("guide-cache.json");

    {
        let session = GuideSession::new(
            GuideCache::open(cache_path.clone()).unwrap(),
            ReconcileConfig::default(),
            true,
        );
        assert!(!session.warm_start().await);

        // Channels 0..2, 10:00-13:00.
        let page_one = fetch(
            ("2024-05-01T10:00:00Z", "2024-05-01T13:00:00Z"),
            vec![
                channel(
                    "one",
                    "One",
                    &[
                        ("News", "2024-05-01T10:00:00Z", "2024-05-01T11:00:00Z"),
                        ("Film", "2024-05-01T11:00:00Z", "2024-05-01T13:00:00Z"),
                    ],
                ),
                channel(
                    "two",
                    "Two",
                    &[("Sport", "2024-05-01T10:30:00Z", "2024-05-01T12:00:00Z")],
                ),
            ],
        );
        // Channels 2..3, a refresh starting 25 minutes later and running longer.
        let page_two = fetch(
            ("2024-05-01T12:25:00+02:00", "2024-05-01T16:00:00+02:00"),
            vec![channel(
                "three",
                "Three",
                &[("Kids", "2024-05-01T10:30:00Z", "2024-05-01T12:30:00Z")],
            )],
        );
        // Correction for channel one: the film slot is retitled.
        let correction = fetch(
            ("2024-05-01T10:25:00Z", "2024-05-01T14:00:00Z"),
            vec![channel(
                "one",
                "One HD",
                &[
                    ("Film (director's cut)", "2024-05-01T11:00:00Z", "2024-05-01T13:00:00Z"),
                    ("Late", "2024-05-01T13:00:00Z", "2024-05-01T14:00:00Z"),
                ],
            )],
        );

        for page in [page_one, page_two, correction] {
            let ticket = session.begin_fetch().await;
            assert!(session.apply_fetch(&ticket, page).await.is_replaced());
        }

        let grid = session.current().await.unwrap();
        assert_eq!(grid.window.start, at(10, 0));
        assert_eq!(grid.window.end, at(14, 0));
        assert_eq!(grid.count, 3);
        assert!(grid.is_consistent());

        let ids: Vec<_> = grid.items.iter().map(|e| e.channel_id.as_str()).collect();
        assert_eq!(ids, vec!["one", "two", "three"]);
        assert_eq!(grid.entry("one").unwrap().name, "One HD");
        assert_eq!(
            titles(&grid, "one"),
            vec!["News", "Film (director's cut)", "Late"]
        );

        let listing = now_and_next(grid.entry("one").unwrap(), at(12, 0), &InstantParser::default());
        assert_eq!(listing.now.unwrap().title, "Film (director's cut)");
        assert_eq!(listing.next.unwrap().title, "Late");
    }

    let restarted = GuideSession::new(
        GuideCache::open(cache_path).unwrap(),
        ReconcileConfig::default(),
        true,
    );
    assert!(restarted.warm_start().await);
    let cached = restarted.current().await.unwrap();
    assert_eq!(cached.count, 3);
    assert_eq!(titles(&cached, "one"), vec!["News", "Film (director's cut)", "Late"]);

    // Re-sending an already merged page changes nothing.
    let repeat = fetch(
        ("2024-05-01T10:00:00Z", "2024-05-01T13:00:00Z"),
        vec![channel(
            "two",
            "Two",
            &[("Sport", "2024-05-01T10:30:00Z", "2024-05-01T12:00:00Z")],
        )],
    );
    let ticket = restarted.begin_fetch().await;
    assert!(matches!(
        restarted.apply_fetch(&ticket, repeat).await,
        ApplyOutcome::Unchanged
    ));
    assert!(Arc::ptr_eq(&restarted.current().await.unwrap(), &cached));
}

#[test]
fn expired_programs_are_clamped_away_on_merge() {
    let current = Arc::new(fetch(
        ("2024-05-01T08:00:00Z", "2024-05-01T11:00:00Z"),
        vec![channel(
            "one",
            "One",
            &[
                ("Breakfast", "2024-05-01T08:00:00Z", "2024-05-01T09:00:00Z"),
                ("News", "2024-05-01T10:00:00Z", "2024-05-01T11:00:00Z"),
            ],
        )],
    ));
    // Far enough ahead to move the left edge.
    let incoming = Arc::new(fetch(
        ("2024-05-01T09:45:00Z", "2024-05-01T12:00:00Z"),
        vec![channel(
            "one",
            "One",
            &[("Noon", "2024-05-01T11:00:00Z", "2024-05-01T12:00:00Z")],
        )],
    ));

    let merged = merge_grid(Some(&current), incoming, true, &ReconcileConfig::default());
    assert_eq!(merged.window.start, at(9, 45));
    assert_eq!(titles(&merged, "one"), vec!["News", "Noon"]);
}

#[test]
fn merge_is_pure_over_its_inputs() {
    let current = Arc::new(fetch(
        ("2024-05-01T10:00:00Z", "2024-05-01T13:00:00Z"),
        vec![channel(
            "one",
            "One",
            &[("A", "2024-05-01T11:00:00Z", "2024-05-01T12:00:00Z")],
        )],
    ));
    let incoming = Arc::new(fetch(
        ("2024-05-01T10:00:00Z", "2024-05-01T13:00:00Z"),
        vec![channel(
            "one",
            "One",
            &[("B", "2024-05-01T11:00:00Z", "2024-05-01T12:00:00Z")],
        )],
    ));
    let current_before = (*current).clone();
    let incoming_before = (*incoming).clone();

    let merged = merge_grid(
        Some(&current),
        Arc::clone(&incoming),
        true,
        &ReconcileConfig::default(),
    );
    assert_eq!(titles(&merged, "one"), vec!["B"]);
    assert_eq!(*current, current_before);
    assert_eq!(*incoming, incoming_before);
}

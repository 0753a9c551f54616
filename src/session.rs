use std::sync::Arc;

use tokio::sync::Mutex;

use crate::{
    cache::{CachePayload, GuideCache},
    guide::ReconcileConfig,
    models::{ChannelSummary, Grid},
    store::{ApplyOutcome, FetchTicket, GridStore},
};

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_info};

struct SessionState {
    store: GridStore,
    provider_id: Option<String>,
    channels: Vec<ChannelSummary>,
    selected_channel_id: Option<String>,
}

impl SessionState {
    fn payload(&self) -> CachePayload {
        CachePayload::new(
            self.provider_id.clone(),
            self.channels.clone(),
            self.store.get().map(|grid| (*grid).clone()),
            self.selected_channel_id.clone(),
        )
    }
}

/// Point-in-time view of a session for callers that render it.
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub grid: Option<Arc<Grid>>,
    pub provider_id: Option<String>,
    pub channels: Vec<ChannelSummary>,
    pub selected_channel_id: Option<String>,
}

/// One guide-browsing session: the held grid plus its warm-start cache.
///
/// Every state change that should survive a restart is written through the
/// cache while the session lock is held, so cache writes land in the same
/// order the changes were made.
#[derive(Clone)]
pub struct GuideSession {
    state: Arc<Mutex<SessionState>>,
    cache: GuideCache,
    preserve_existing_window: bool,
}

impl GuideSession {
    pub fn new(cache: GuideCache, config: ReconcileConfig, preserve_existing_window: bool) -> Self {
        Self {
            state: Arc::new(Mutex::new(SessionState {
                store: GridStore::new(config),
                provider_id: None,
                channels: Vec::new(),
                selected_channel_id: None,
            })),
            cache,
            preserve_existing_window,
        }
    }

    pub fn cache(&self) -> &GuideCache {
        &self.cache
    }

    /// Seeds the session from the cache. Returns whether anything was loaded.
    pub async fn warm_start(&self) -> bool {
        let Some(payload) = self.cache.load().await else {
            log_info!("no cached guide at {}; cold start", self.cache.path().display());
            return false;
        };

        let mut state = self.state.lock().await;
        if let Some(grid) = payload.epg {
            log_info!(
                "warm start: {} cached channels, window {} .. {}",
                grid.count,
                grid.window.start,
                grid.window.end
            );
            state.store.replace(Arc::new(grid));
        }
        state.provider_id = payload.provider_id;
        state.channels = payload.channels;
        state.selected_channel_id = payload.selected_channel_id;
        true
    }

    pub async fn begin_fetch(&self) -> FetchTicket {
        self.state.lock().await.store.begin_fetch()
    }

    /// Merge a fetched grid and persist the result when it changed.
    pub async fn apply_fetch(&self, ticket: &FetchTicket, grid: Grid) -> ApplyOutcome {
        let mut state = self.state.lock().await;
        let outcome = state
            .store
            .apply(ticket, grid, self.preserve_existing_window);

        match &outcome {
            ApplyOutcome::Replaced(_) => self.cache.save(&state.payload()).await,
            ApplyOutcome::Unchanged => {
                log_debug!("guide fetch #{} changed nothing; cache untouched", ticket.seq())
            }
            ApplyOutcome::Stale => {}
        }

        outcome
    }

    pub async fn current(&self) -> Option<Arc<Grid>> {
        self.state.lock().await.store.get()
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        let state = self.state.lock().await;
        SessionSnapshot {
            grid: state.store.get(),
            provider_id: state.provider_id.clone(),
            channels: state.channels.clone(),
            selected_channel_id: state.selected_channel_id.clone(),
        }
    }

    pub async fn select_channel(&self, channel_id: impl Into<String>) {
        let mut state = self.state.lock().await;
        state.selected_channel_id = Some(channel_id.into());
        self.cache.save(&state.payload()).await;
    }

    /// Switching provider drops the held guide and any fetch still in flight;
    /// both belong to the old provider.
    pub async fn set_channels(&self, provider_id: Option<String>, channels: Vec<ChannelSummary>) {
        let mut state = self.state.lock().await;
        if state.provider_id != provider_id {
            log_info!("guide provider changed; discarding held grid and pending fetches");
            state.store.reset();
            state.selected_channel_id = None;
        }
        state.provider_id = provider_id;
        state.channels = channels;
        self.cache.save(&state.payload()).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{GuideEntry, Program, Window};
    use chrono::{TimeZone, Utc};

    fn grid(channel: &str, title: &str) -> Grid {
        let start = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).single().expect("valid timestamp");
        let end = Utc.with_ymd_and_hms(2024, 5, 1, 13, 0, 0).single().expect("valid timestamp");
        Grid::new(
            Window::new(start, end),
            vec![GuideEntry::new(channel, channel).with_programs(vec![Program::new(
                title,
                "2024-05-01T10:00:00Z",
                "2024-05-01T11:00:00Z",
            )])],
        )
    }

    fn session(dir: &tempfile::TempDir) -> GuideSession {
        let cache = GuideCache::open(dir.path().join("guide.json")).unwrap();
        GuideSession::new(cache, ReconcileConfig::default(), true)
    }

    #[tokio::test]
    async fn replaced_grid_is_written_to_cache() {
        let dir = tempfile::tempdir().expect("tempdir");
        let session = session(&dir);

        let ticket = session.begin_fetch().await;
        assert!(session.apply_fetch(&ticket, grid("a", "News")).await.is_replaced());

        let payload = session.cache().load().await.expect("cached payload");
        assert_eq!(payload.epg.unwrap().count, 1);
    }

    #[tokio::test]
    async fn unchanged_and_stale_fetches_do_not_write() {
        let dir = tempfile::tempdir().expect("tempdir");
        let session = session(&dir);

        let stale = session.begin_fetch().await;
        let first = session.begin_fetch().await;
        session.apply_fetch(&first, grid("a", "News")).await;
        let saved_at = session.cache().load().await.unwrap().saved_at;

        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let again = session.begin_fetch().await;
        assert!(matches!(
            session.apply_fetch(&again, grid("a", "News")).await,
            ApplyOutcome::Unchanged
        ));
        assert!(matches!(
            session.apply_fetch(&stale, grid("b", "Old")).await,
            ApplyOutcome::Stale
        ));

        assert_eq!(session.cache().load().await.unwrap().saved_at, saved_at);
    }

    #[tokio::test]
    async fn warm_start_restores_previous_session() {
        let dir = tempfile::tempdir().expect("tempdir");
        {
            let session = session(&dir);
            session
                .set_channels(Some("prov".into()), vec![ChannelSummary::new("a", "A")])
                .await;
            let ticket = session.begin_fetch().await;
            session.apply_fetch(&ticket, grid("a", "News")).await;
            session.select_channel("a").await;
        }

        let restarted = session(&dir);
        assert!(restarted.warm_start().await);
        let snapshot = restarted.snapshot().await;
        assert_eq!(snapshot.provider_id.as_deref(), Some("prov"));
        assert_eq!(snapshot.selected_channel_id.as_deref(), Some("a"));
        assert_eq!(snapshot.channels.len(), 1);
        assert_eq!(snapshot.grid.unwrap().entry("a").unwrap().programs[0].title, "News");
    }

    #[tokio::test]
    async fn cold_start_reports_nothing_loaded() {
        let dir = tempfile::tempdir().expect("tempdir");
        let session = session(&dir);
        assert!(!session.warm_start().await);
        assert!(session.current().await.is_none());
    }

    #[tokio::test]
    async fn provider_switch_drops_held_grid() {
        let dir = tempfile::tempdir().expect("tempdir");
        let session = session(&dir);
        session.set_channels(Some("one".into()), Vec::new()).await;
        let ticket = session.begin_fetch().await;
        session.apply_fetch(&ticket, grid("a", "News")).await;

        session.set_channels(Some("two".into()), Vec::new()).await;
        assert!(session.current().await.is_none());
        assert!(session.cache().load().await.unwrap().epg.is_none());
    }

    #[tokio::test]
    async fn fetch_from_previous_provider_is_dropped() {
        let dir = tempfile::tempdir().expect("tempdir");
        let session = session(&dir);
        session.set_channels(Some("one".into()), Vec::new()).await;
        let in_flight = session.begin_fetch().await;

        session.set_channels(Some("two".into()), Vec::new()).await;
        assert!(in_flight.is_cancelled());
        assert!(matches!(
            session.apply_fetch(&in_flight, grid("p1-ch", "Old")).await,
            ApplyOutcome::Stale
        ));
        assert!(session.current().await.is_none());

        let payload = session.cache().load().await.expect("cached payload");
        assert_eq!(payload.provider_id.as_deref(), Some("two"));
        assert!(payload.epg.is_none());

        let ticket = session.begin_fetch().await;
        assert!(session.apply_fetch(&ticket, grid("p2-ch", "New")).await.is_replaced());
        assert!(session.current().await.unwrap().entry("p2-ch").is_some());
    }
}

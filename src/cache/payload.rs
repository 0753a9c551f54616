use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{ChannelSummary, Grid};

/// Everything written to the warm-start cache file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachePayload {
    pub provider_id: Option<String>,
    #[serde(default)]
    pub channels: Vec<ChannelSummary>,
    pub epg: Option<Grid>,
    pub selected_channel_id: Option<String>,
    /// Epoch milliseconds.
    pub saved_at: i64,
}

impl CachePayload {
    pub fn new(
        provider_id: Option<String>,
        channels: Vec<ChannelSummary>,
        epg: Option<Grid>,
        selected_channel_id: Option<String>,
    ) -> Self {
        Self {
            provider_id,
            channels,
            epg,
            selected_channel_id,
            saved_at: Utc::now().timestamp_millis(),
        }
    }

    pub fn saved_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.saved_at).single()
    }
}

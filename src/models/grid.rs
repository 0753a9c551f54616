use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::Program;

/// The `[start, end)` range a guide snapshot claims to cover.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Window {
    #[serde(with = "crate::guide::instant::wire")]
    pub start: DateTime<Utc>,
    #[serde(with = "crate::guide::instant::wire")]
    pub end: DateTime<Utc>,
}

impl Window {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Whole minutes covered, never less than one.
    pub fn duration_minutes(&self) -> i64 {
        self.duration().num_minutes().max(1)
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start <= at && at < self.end
    }
}

/// One channel's row in the guide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuideEntry {
    #[serde(rename = "live_id")]
    pub channel_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
    #[serde(
        rename = "epg_source_id",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub guide_source_id: Option<String>,
    #[serde(default)]
    pub programs: Vec<Program>,
}

impl GuideEntry {
    pub fn new(channel_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            channel_id: channel_id.into(),
            name: name.into(),
            logo: None,
            guide_source_id: None,
            programs: Vec::new(),
        }
    }

    pub fn with_programs(mut self, programs: Vec<Program>) -> Self {
        self.programs = programs;
        self
    }
}

/// One fetched or merged EPG snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    pub window: Window,
    #[serde(default)]
    pub count: usize,
    #[serde(default)]
    pub items: Vec<GuideEntry>,
}

impl Grid {
    pub fn new(window: Window, items: Vec<GuideEntry>) -> Self {
        Self {
            window,
            count: items.len(),
            items,
        }
    }

    pub fn is_consistent(&self) -> bool {
        self.count == self.items.len() && self.window.start <= self.window.end
    }

    pub fn entry(&self, channel_id: &str) -> Option<&GuideEntry> {
        self.items.iter().find(|entry| entry.channel_id == channel_id)
    }

    pub fn program_count(&self) -> usize {
        self.items.iter().map(|entry| entry.programs.len()).sum()
    }
}

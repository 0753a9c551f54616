use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::guide::instant::parse_instant;

/// Identity of a broadcast slot: the literal start/end strings as transported.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SlotKey {
    pub start: String,
    pub end: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Program {
    #[serde(default)]
    pub title: String,
    pub start: String,
    pub end: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desc: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_desc: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub long_desc: Option<String>,
}

impl Program {
    pub fn new(title: impl Into<String>, start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            start: start.into(),
            end: end.into(),
            category: None,
            description: None,
            desc: None,
            short_desc: None,
            long_desc: None,
        }
    }

    pub fn slot_key(&self) -> SlotKey {
        SlotKey {
            start: self.start.clone(),
            end: self.end.clone(),
        }
    }

    /// First non-blank of `description`, `desc`, `short_desc`, `long_desc`.
    pub fn description(&self) -> Option<&str> {
        [
            &self.description,
            &self.desc,
            &self.short_desc,
            &self.long_desc,
        ]
        .into_iter()
        .filter_map(|field| field.as_deref())
        .find(|text| !text.trim().is_empty())
    }

    pub fn parsed_start(&self) -> Option<DateTime<Utc>> {
        parse_instant(&self.start).ok()
    }

    pub fn parsed_end(&self) -> Option<DateTime<Utc>> {
        parse_instant(&self.end).ok()
    }
}

use chrono::Duration;

use super::instant::InstantParser;

/// Tunables for merging guide fetches.
#[derive(Debug, Clone)]
pub struct ReconcileConfig {
    /// A later incoming window start within this many minutes of the held
    /// start does not move the guide's left edge.
    pub staleness_tolerance_minutes: i64,

    /// Parser used for program start/end strings during clamp and sort.
    pub parser: InstantParser,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            staleness_tolerance_minutes: 30,
            parser: InstantParser::default(),
        }
    }
}

impl ReconcileConfig {
    /// Negative values count as zero; values past chrono's range saturate.
    pub fn staleness_tolerance(&self) -> Duration {
        Duration::try_minutes(self.staleness_tolerance_minutes.max(0)).unwrap_or(Duration::MAX)
    }
}

pub mod cache;
pub mod guide;
pub mod models;
pub mod session;
pub mod settings;
pub mod store;
mod utils;

pub use cache::{CachePayload, GuideCache};
pub use guide::{merge_grid, InstantParser, ReconcileConfig};
pub use models::{ChannelSummary, Grid, GuideEntry, Program, Window};
pub use session::{GuideSession, SessionSnapshot};
pub use settings::{GuideSettings, SettingsStore};
pub use store::{ApplyOutcome, FetchTicket, GridStore};

/// Initialize logging (reads RUST_LOG env var). Safe to call more than once.
pub fn init_logging() {
    let default_level = if settings::debug_enabled() {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    let _ = env_logger::Builder::new()
        .filter_level(default_level)
        .parse_default_env()
        .try_init();
}

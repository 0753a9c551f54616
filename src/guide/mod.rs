pub mod config;
pub mod entries;
pub mod instant;
pub mod merge;
pub mod programs;
pub mod schedule;
pub mod window;

pub use config::ReconcileConfig;
pub use entries::merge_entries;
pub use instant::{parse_instant, InstantFormat, InstantParser};
pub use merge::merge_grid;
pub use programs::merge_programs;
pub use schedule::{now_and_next, progress, NowNext};
pub use window::reconcile_window;

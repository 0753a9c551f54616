pub mod channel;
pub mod grid;
pub mod program;

pub use channel::ChannelSummary;
pub use grid::{Grid, GuideEntry, Window};
pub use program::{Program, SlotKey};

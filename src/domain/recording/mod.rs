//! Recording domain module

mod duration;
mod output;
mod screen;
mod stats;

pub use duration::Duration;
pub use output::{
    human_readable_size, incremental_filename, temp_sibling, timestamped_filename,
    RecordingOutcome, RECORDING_PREFIX,
};
pub use screen::{select_region, InvalidScreen, Monitor, Region, ALL_SCREENS};
pub use stats::FrameStats;

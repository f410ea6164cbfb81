//! Audio server adapters

mod pactl;
pub mod parser;

pub use pactl::{PactlAudioServer, DEFAULT_TIMEOUT};

//! Recorder configuration domain module

mod codec;
mod recorder_config;

pub use codec::{OutputFormat, VideoCodec};
pub use recorder_config::{
    default_output_directory, ConfigCorrection, RecorderConfig, CONFIG_KEYS, DEFAULT_APPS,
    LOG_LEVELS, SUPPORTED_SAMPLE_RATES,
};

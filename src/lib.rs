//! Screen Audio Recorder - screen capture with per-application audio for Linux
//!
//! Records the X11 screen while routing the audio of selected applications
//! into a private PulseAudio sink, then merges both with FFmpeg.
//!
//! # Architecture
//!
//! The crate follows hexagonal (ports & adapters) architecture:
//!
//! - **Domain**: settings, session lifecycle, audio routes and value objects
//! - **Application**: the recording use case, audio router, capture loop and port traits
//! - **Infrastructure**: adapters for pactl, FFmpeg, X11, JSON settings and notifications
//! - **CLI**: argument parsing, terminal output, recording controls and logging

pub mod application;
pub mod cli;
pub mod domain;
pub mod infrastructure;

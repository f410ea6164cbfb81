//! Output naming and the result of a finished recording

use std::path::{Path, PathBuf};

use super::duration::Duration;
use super::stats::FrameStats;

/// Base name of incrementally numbered recordings
pub const RECORDING_PREFIX: &str = "recording";

/// First free `recording_N.<ext>` in `dir`, counting from 1.
pub fn incremental_filename(dir: &Path, extension: &str) -> PathBuf {
    let mut n: u64 = 1;
    loop {
        let candidate = dir.join(format!("{}_{}.{}", RECORDING_PREFIX, n, extension));
        if !candidate.exists() {
            return candidate;
        }
        n += 1;
    }
}

/// `recording_<stamp>.<ext>` for callers that disabled numbering.
///
/// The stamp is supplied by the caller so the name stays deterministic in
/// tests. If the name is taken a numeric suffix is appended.
pub fn timestamped_filename(dir: &Path, stamp: &str, extension: &str) -> PathBuf {
    let base = dir.join(format!("{}_{}.{}", RECORDING_PREFIX, stamp, extension));
    if !base.exists() {
        return base;
    }
    let mut n: u64 = 2;
    loop {
        let candidate = dir.join(format!("{}_{}_{}.{}", RECORDING_PREFIX, stamp, n, extension));
        if !candidate.exists() {
            return candidate;
        }
        n += 1;
    }
}

/// Temporary file next to the final output, e.g. `recording_3_temp.mkv`
pub fn temp_sibling(final_path: &Path, suffix: &str, extension: &str) -> PathBuf {
    let stem = final_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| RECORDING_PREFIX.to_string());
    final_path.with_file_name(format!("{}_{}.{}", stem, suffix, extension))
}

/// File size in B, KB, MB or GB with one decimal
pub fn human_readable_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} B", bytes)
    } else {
        format!("{:.1} {}", size, UNITS[unit])
    }
}

/// What a completed session produced
#[derive(Debug, Clone, PartialEq)]
pub struct RecordingOutcome {
    pub output: PathBuf,
    /// Recorded time, paused intervals excluded
    pub duration: Duration,
    pub stats: FrameStats,
    pub has_audio: bool,
    pub size_bytes: u64,
}

impl RecordingOutcome {
    pub fn human_size(&self) -> String {
        human_readable_size(self.size_bytes)
    }
}

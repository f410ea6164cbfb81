//! CLI presenter for output formatting

use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use colored::*;
use indicatif::{ProgressBar, ProgressStyle};

use crate::domain::recording::{Duration, FrameStats};
use crate::domain::session::SessionState;

/// Presenter for CLI output formatting
pub struct Presenter {
    spinner: Option<ProgressBar>,
    is_spinner_active: Arc<AtomicBool>,
}

impl Presenter {
    pub fn new() -> Self {
        Self {
            spinner: None,
            is_spinner_active: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Start a spinner with message
    pub fn start_spinner(&mut self, message: &str) {
        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner()
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
            .template("{spinner:.red} {msg}")
        {
            spinner.set_style(style);
        }
        spinner.set_message(message.to_string());
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        self.spinner = Some(spinner);
        self.is_spinner_active.store(true, Ordering::SeqCst);
    }

    pub fn update_spinner(&self, message: &str) {
        if let Some(ref spinner) = self.spinner {
            spinner.set_message(message.to_string());
        }
    }

    /// Mark spinner as success and finish
    pub fn spinner_success(&mut self, message: &str) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_with_message(format!("{} {}", "✓".green(), message));
        }
        self.is_spinner_active.store(false, Ordering::SeqCst);
    }

    /// Mark spinner as failed and finish
    pub fn spinner_fail(&mut self, message: &str) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_with_message(format!("{} {}", "✗".red(), message));
        }
        self.is_spinner_active.store(false, Ordering::SeqCst);
    }

    pub fn stop_spinner(&mut self) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_and_clear();
        }
        self.is_spinner_active.store(false, Ordering::SeqCst);
    }

    /// Print info message to stderr
    pub fn info(&self, message: &str) {
        eprintln!("{} {}", "ℹ".cyan(), message);
    }

    /// Print success message to stderr
    pub fn success(&self, message: &str) {
        eprintln!("{} {}", "✓".green(), message);
    }

    /// Print warning message to stderr
    pub fn warn(&self, message: &str) {
        eprintln!("{} {}", "⚠".yellow(), message);
    }

    /// Print error message to stderr
    pub fn error(&self, message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Print an error followed by what to do about it
    pub fn error_with_remedy(&self, message: &str, remedy: Option<&str>) {
        self.error(message);
        if let Some(remedy) = remedy {
            eprintln!("  {} {}", "→".dimmed(), remedy);
        }
    }

    /// Output text to stdout
    pub fn output(&self, text: &str) {
        println!("{}", text);
    }

    pub fn output_inline(&self, text: &str) {
        print!("{}", text);
        let _ = io::stdout().flush();
    }

    /// Status line shown while recording
    pub fn format_status(
        &self,
        state: SessionState,
        elapsed: Duration,
        limit: Option<Duration>,
        stats: FrameStats,
    ) -> String {
        let label = match state {
            SessionState::Paused => "PAUSED".yellow().to_string(),
            _ => "REC".red().bold().to_string(),
        };
        let time = match limit {
            Some(limit) => format!("{} / {}", elapsed.format_clock(), limit.format_clock()),
            None => elapsed.format_clock(),
        };
        let mut line = format!("{} {}  {} frames", label, time, stats.frames_captured);
        if stats.frames_dropped > 0 {
            line.push_str(&format!(", {} dropped", stats.frames_dropped).yellow().to_string());
        }
        line.push_str(&"  [p] pause/resume  [s] stop  [c] cancel".dimmed().to_string());
        line
    }

    pub fn update_recording_status(
        &self,
        state: SessionState,
        elapsed: Duration,
        limit: Option<Duration>,
        stats: FrameStats,
    ) {
        self.update_spinner(&self.format_status(state, elapsed, limit, stats));
    }

    /// Print a key-value pair (for config list)
    pub fn key_value(&self, key: &str, value: &str) {
        println!("{}: {}", key.cyan(), value);
    }
}

impl Default for Presenter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(captured: u64, dropped: u64) -> FrameStats {
        FrameStats {
            frames_captured: captured,
            frames_dropped: dropped,
        }
    }

    #[test]
    fn status_shows_elapsed_time_and_frames() {
        colored::control::set_override(false);
        let presenter = Presenter::new();
        let line = presenter.format_status(
            SessionState::Recording,
            Duration::from_secs(75),
            None,
            stats(1500, 0),
        );
        assert!(line.starts_with("REC 01:15  1500 frames"));
        assert!(!line.contains("dropped"));
    }

    #[test]
    fn status_shows_limit_and_drops() {
        colored::control::set_override(false);
        let presenter = Presenter::new();
        let line = presenter.format_status(
            SessionState::Paused,
            Duration::from_secs(10),
            Some(Duration::from_secs(60)),
            stats(200, 3),
        );
        assert!(line.starts_with("PAUSED 00:10 / 01:00"));
        assert!(line.contains("3 dropped"));
    }
}

/// Frame counters of one capture run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Frames grabbed and handed to the writer
    pub frames_captured: u64,
    /// Scheduled ticks skipped because the previous frame overran
    pub frames_dropped: u64,
}

impl FrameStats {
    pub fn scheduled(&self) -> u64 {
        self.frames_captured + self.frames_dropped
    }

    /// Dropped share of scheduled ticks, 0.0 when nothing was scheduled
    pub fn drop_rate(&self) -> f64 {
        match self.scheduled() {
            0 => 0.0,
            n => self.frames_dropped as f64 / n as f64,
        }
    }
}

//! Fixed-rate screen capture loop

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, error, info};

use crate::domain::recording::FrameStats;

use super::ports::{CaptureError, FrameSource, VideoWriter};

/// Longest single sleep, so a stop request is noticed promptly
const MAX_SLEEP: Duration = Duration::from_millis(100);

/// Poll interval while paused
const PAUSE_POLL: Duration = Duration::from_millis(20);

#[derive(Debug, Default)]
struct CaptureShared {
    stop: AtomicBool,
    paused: AtomicBool,
    failed: AtomicBool,
    captured: AtomicU64,
    dropped: AtomicU64,
}

impl CaptureShared {
    fn stats(&self) -> FrameStats {
        FrameStats {
            frames_captured: self.captured.load(Ordering::SeqCst),
            frames_dropped: self.dropped.load(Ordering::SeqCst),
        }
    }
}

/// Grabs frames on a dedicated thread and appends them to a writer.
///
/// Ticks are scheduled every `1 / frame_rate`. A tick that overruns its
/// interval makes the loop skip the ticks it missed and count them as
/// dropped; stale frames are never encoded back to back.
pub struct VideoCapturer {
    shared: Arc<CaptureShared>,
    handle: Option<JoinHandle<Result<(), CaptureError>>>,
}

impl VideoCapturer {
    /// Start the capture thread.
    pub fn start(
        source: Box<dyn FrameSource>,
        writer: Box<dyn VideoWriter>,
        frame_rate: f64,
    ) -> Result<Self, CaptureError> {
        if !(frame_rate.is_finite() && frame_rate > 0.0) {
            return Err(CaptureError::Thread(format!("invalid frame rate {}", frame_rate)));
        }
        let period = Duration::from_secs_f64(1.0 / frame_rate);
        let shared = Arc::new(CaptureShared::default());

        let loop_shared = Arc::clone(&shared);
        let handle = thread::Builder::new()
            .name("video-capture".to_string())
            .spawn(move || capture_loop(source, writer, period, loop_shared))
            .map_err(|e| CaptureError::Thread(e.to_string()))?;

        info!("Video capture started at {:.1} fps", frame_rate);
        Ok(Self {
            shared,
            handle: Some(handle),
        })
    }

    pub fn pause(&self) {
        self.shared.paused.store(true, Ordering::SeqCst);
        debug!("Video capture paused");
    }

    pub fn resume(&self) {
        self.shared.paused.store(false, Ordering::SeqCst);
        debug!("Video capture resumed");
    }

    pub fn is_paused(&self) -> bool {
        self.shared.paused.load(Ordering::SeqCst)
    }

    pub fn stats(&self) -> FrameStats {
        self.shared.stats()
    }

    /// True once the loop ended on a grab or write error
    pub fn has_failed(&self) -> bool {
        self.shared.failed.load(Ordering::SeqCst)
    }

    /// End the loop after the current tick and wait for the writer to finish.
    ///
    /// Blocks; call it from a blocking context.
    pub fn stop(mut self) -> Result<FrameStats, CaptureError> {
        self.shared.stop.store(true, Ordering::SeqCst);
        let result = match self.handle.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| CaptureError::Thread("capture thread panicked".to_string()))?,
            None => Ok(()),
        };
        let stats = self.shared.stats();
        info!(
            "Video capture stopped: {} frames, {} dropped",
            stats.frames_captured, stats.frames_dropped
        );
        result.map(|()| stats)
    }
}

impl Drop for VideoCapturer {
    fn drop(&mut self) {
        // the thread finishes the writer on its own
        self.shared.stop.store(true, Ordering::SeqCst);
    }
}

fn capture_loop(
    mut source: Box<dyn FrameSource>,
    mut writer: Box<dyn VideoWriter>,
    period: Duration,
    shared: Arc<CaptureShared>,
) -> Result<(), CaptureError> {
    let mut next_tick = Instant::now();
    let mut was_paused = false;

    let result = loop {
        if shared.stop.load(Ordering::SeqCst) {
            break Ok(());
        }

        if shared.paused.load(Ordering::SeqCst) {
            was_paused = true;
            thread::sleep(PAUSE_POLL);
            continue;
        }
        if was_paused {
            was_paused = false;
            next_tick = Instant::now();
        }

        let now = Instant::now();
        if now < next_tick {
            thread::sleep((next_tick - now).min(MAX_SLEEP));
            continue;
        }

        let scheduled = next_tick;
        if let Err(e) = source.grab().and_then(|frame| writer.write_frame(&frame)) {
            error!("Video capture failed: {}", e);
            shared.failed.store(true, Ordering::SeqCst);
            break Err(e);
        }
        shared.captured.fetch_add(1, Ordering::SeqCst);

        let late = Instant::now().saturating_duration_since(scheduled);
        let missed = (late.as_nanos() / period.as_nanos().max(1)) as u32;
        if missed > 0 {
            shared.dropped.fetch_add(u64::from(missed), Ordering::SeqCst);
        }
        next_tick = scheduled + period * (missed + 1);
    };

    // flush whatever was written, even after a failure
    let finished = writer.finish();
    result.and(finished)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::application::ports::Frame;
    use std::sync::Mutex;

    /// Frame source producing tiny blank frames, optionally slowly
    pub(crate) struct FakeSource {
        pub delay: Duration,
    }

    impl FrameSource for FakeSource {
        fn dimensions(&self) -> (u32, u32) {
            (4, 2)
        }

        fn grab(&mut self) -> Result<Frame, CaptureError> {
            if !self.delay.is_zero() {
                thread::sleep(self.delay);
            }
            Ok(Frame {
                width: 4,
                height: 2,
                data: vec![0; Frame::expected_len(4, 2)],
            })
        }
    }

    /// Writer that records the instant of every frame
    #[derive(Clone, Default)]
    pub(crate) struct FakeWriter {
        pub writes: Arc<Mutex<Vec<Instant>>>,
        pub finished: Arc<AtomicBool>,
        pub fail_after: Option<usize>,
        /// log shared with other fakes, gets "finish"
        pub events: Option<Arc<Mutex<Vec<String>>>>,
    }

    impl VideoWriter for FakeWriter {
        fn write_frame(&mut self, _frame: &Frame) -> Result<(), CaptureError> {
            let mut writes = self.writes.lock().unwrap();
            if self.fail_after.is_some_and(|n| writes.len() >= n) {
                return Err(CaptureError::WriterFailed("Broken pipe".to_string()));
            }
            writes.push(Instant::now());
            Ok(())
        }

        fn finish(self: Box<Self>) -> Result<(), CaptureError> {
            if let Some(events) = &self.events {
                events.lock().unwrap().push("finish".to_string());
            }
            self.finished.store(true, Ordering::SeqCst);
            Ok(())
        }
    }

    fn fast_source() -> Box<dyn FrameSource> {
        Box::new(FakeSource {
            delay: Duration::ZERO,
        })
    }

    #[test]
    fn thirty_fps_for_two_seconds() {
        let writer = FakeWriter::default();
        let capturer = VideoCapturer::start(fast_source(), Box::new(writer.clone()), 30.0).unwrap();

        thread::sleep(Duration::from_secs(2));
        let stats = capturer.stop().unwrap();

        assert!(
            (52..=68).contains(&stats.frames_captured),
            "captured {}",
            stats.frames_captured
        );
        assert_eq!(stats.frames_dropped, 0);
        assert!(writer.finished.load(Ordering::SeqCst));
        assert_eq!(writer.writes.lock().unwrap().len() as u64, stats.frames_captured);
    }

    #[test]
    fn paused_interval_is_excluded() {
        let writer = FakeWriter::default();
        let capturer = VideoCapturer::start(fast_source(), Box::new(writer), 20.0).unwrap();

        thread::sleep(Duration::from_millis(1000));
        capturer.pause();
        assert!(capturer.is_paused());
        let at_pause = capturer.stats().frames_captured;
        thread::sleep(Duration::from_millis(1000));
        let after_pause = capturer.stats().frames_captured;
        capturer.resume();
        thread::sleep(Duration::from_millis(1000));
        let stats = capturer.stop().unwrap();

        // a tick already in progress when pausing may still land
        assert!(after_pause - at_pause <= 1, "{} frames while paused", after_pause - at_pause);
        assert!(
            (34..=46).contains(&stats.frames_captured),
            "captured {}",
            stats.frames_captured
        );
        assert_eq!(stats.frames_dropped, 0);
    }

    #[test]
    fn slow_source_drops_instead_of_catching_up() {
        let writer = FakeWriter::default();
        let source = Box::new(FakeSource {
            delay: Duration::from_millis(120),
        });
        let capturer = VideoCapturer::start(source, Box::new(writer.clone()), 20.0).unwrap();

        thread::sleep(Duration::from_millis(1500));
        let stats = capturer.stop().unwrap();

        assert!(stats.frames_dropped >= stats.frames_captured, "{:?}", stats);
        assert!(stats.frames_captured <= 13, "{:?}", stats);

        // no stale frames written back to back
        let writes = writer.writes.lock().unwrap();
        for pair in writes.windows(2) {
            assert!(pair[1] - pair[0] >= Duration::from_millis(100));
        }
    }

    #[test]
    fn write_failure_ends_loop() {
        let writer = FakeWriter {
            fail_after: Some(3),
            ..Default::default()
        };
        let capturer = VideoCapturer::start(fast_source(), Box::new(writer.clone()), 50.0).unwrap();

        thread::sleep(Duration::from_millis(300));
        assert!(capturer.has_failed());
        let err = capturer.stop().unwrap_err();

        assert!(matches!(err, CaptureError::WriterFailed(_)));
        assert!(writer.finished.load(Ordering::SeqCst));
        assert_eq!(writer.writes.lock().unwrap().len(), 3);
    }

    #[test]
    fn invalid_frame_rate_is_rejected() {
        assert!(VideoCapturer::start(fast_source(), Box::new(FakeWriter::default()), 0.0).is_err());
    }
}

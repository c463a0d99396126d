use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

use parking_lot::Mutex;

/// Whether an audio clock is currently advancing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockState {
    Running,
    Suspended,
}

/// Monotonic time source that notes are scheduled against.
///
/// Time is in seconds from an implementation-defined epoch. A suspended
/// clock does not advance, so nothing piles up while it is suspended.
pub trait AudioClock: Send + Sync {
    fn current_time(&self) -> f64;

    fn state(&self) -> ClockState;

    fn is_running(&self) -> bool {
        self.state() == ClockState::Running
    }

    /// Start or continue advancing. Called by the front-end after a user gesture.
    fn resume(&self);

    fn suspend(&self);
}

/// Device clock: counts frames rendered by the output stream.
///
/// Starts suspended; the audio callback renders silence and leaves the
/// counter alone until `resume` is called.
pub struct SampleClock {
    frames: AtomicU64,
    sample_rate: u32,
    running: AtomicBool,
}

impl SampleClock {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            frames: AtomicU64::new(0),
            sample_rate: sample_rate.max(1),
            running: AtomicBool::new(false),
        }
    }

    /// Frames rendered so far (the next frame index to be rendered)
    pub fn frame(&self) -> u64 {
        self.frames.load(Ordering::Acquire)
    }

    /// Called by the audio callback after rendering a buffer
    pub fn advance_frames(&self, frames: u64) {
        self.frames.fetch_add(frames, Ordering::AcqRel);
    }
}

impl AudioClock for SampleClock {
    fn current_time(&self) -> f64 {
        self.frame() as f64 / self.sample_rate as f64
    }

    fn state(&self) -> ClockState {
        if self.running.load(Ordering::Acquire) {
            ClockState::Running
        } else {
            ClockState::Suspended
        }
    }

    fn resume(&self) {
        self.running.store(true, Ordering::Release);
    }

    fn suspend(&self) {
        self.running.store(false, Ordering::Release);
    }
}

struct WallClockInner {
    accumulated: Duration,
    resumed_at: Option<Instant>,
}

/// Monotonic wall clock used when no audio device is available.
///
/// Freezes while suspended.
pub struct WallClock {
    inner: Mutex<WallClockInner>,
}

impl WallClock {
    /// A running clock starting at zero
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(WallClockInner {
                accumulated: Duration::ZERO,
                resumed_at: Some(Instant::now()),
            }),
        }
    }
}

impl Default for WallClock {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioClock for WallClock {
    fn current_time(&self) -> f64 {
        let inner = self.inner.lock();
        let running = inner
            .resumed_at
            .map(|at| at.elapsed())
            .unwrap_or(Duration::ZERO);
        (inner.accumulated + running).as_secs_f64()
    }

    fn state(&self) -> ClockState {
        if self.inner.lock().resumed_at.is_some() {
            ClockState::Running
        } else {
            ClockState::Suspended
        }
    }

    fn resume(&self) {
        let mut inner = self.inner.lock();
        if inner.resumed_at.is_none() {
            inner.resumed_at = Some(Instant::now());
        }
    }

    fn suspend(&self) {
        let mut inner = self.inner.lock();
        if let Some(at) = inner.resumed_at.take() {
            inner.accumulated += at.elapsed();
        }
    }
}

/// Clock whose time is set explicitly. Used for offline rendering and tests.
pub struct ManualClock {
    inner: Mutex<(f64, ClockState)>,
}

impl ManualClock {
    pub fn new(start: f64) -> Self {
        Self {
            inner: Mutex::new((start, ClockState::Running)),
        }
    }

    pub fn set_time(&self, time: f64) {
        self.inner.lock().0 = time;
    }

    /// Move time forward, unless suspended
    pub fn advance(&self, seconds: f64) {
        let mut inner = self.inner.lock();
        if inner.1 == ClockState::Running {
            inner.0 += seconds;
        }
    }
}

impl AudioClock for ManualClock {
    fn current_time(&self) -> f64 {
        self.inner.lock().0
    }

    fn state(&self) -> ClockState {
        self.inner.lock().1
    }

    fn resume(&self) {
        self.inner.lock().1 = ClockState::Running;
    }

    fn suspend(&self) {
        self.inner.lock().1 = ClockState::Suspended;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_clock_counts_frames() {
        let clock = SampleClock::new(48_000);
        assert_eq!(clock.state(), ClockState::Suspended);
        clock.resume();
        clock.advance_frames(24_000);
        assert!((clock.current_time() - 0.5).abs() < 1e-12);
        assert!(clock.is_running());
    }

    #[test]
    fn test_wall_clock_freezes_while_suspended() {
        let clock = WallClock::new();
        clock.suspend();
        let frozen = clock.current_time();
        std::thread::sleep(Duration::from_millis(10));
        assert_eq!(clock.current_time(), frozen);
        assert_eq!(clock.state(), ClockState::Suspended);

        clock.resume();
        std::thread::sleep(Duration::from_millis(5));
        assert!(clock.current_time() > frozen);
    }

    #[test]
    fn test_manual_clock_ignores_advance_when_suspended() {
        let clock = ManualClock::new(1.0);
        clock.advance(0.5);
        clock.suspend();
        clock.advance(10.0);
        assert_eq!(clock.current_time(), 1.5);
    }
}

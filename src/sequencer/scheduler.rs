use crate::config::SequencerConfig;
use crate::error::GridError;
use crate::synth::NoteSink;

use super::clock::AudioClock;
use super::flash::FlashState;
use super::grid::Grid;
use super::scale::frequency_for_row;

/// One step committed by `advance`
#[derive(Clone, Debug, PartialEq)]
pub struct ScheduledStep {
    pub column: usize,
    /// Audio clock time the step sounds at
    pub time: f64,
    /// Active rows at that column, lowest first
    pub rows: Vec<usize>,
}

/// Lookahead step scheduler.
///
/// Owns the grid and the playhead. Each `advance` commits every step whose
/// start time falls inside `now + lookahead` and hands its notes to the sink
/// stamped with the step's exact time, so a coarse or jittery poll never
/// shifts audio. Steps that fell behind (host timer stalled) are drained in
/// order at their original times.
pub struct StepScheduler {
    grid: Grid,
    /// Column most recently committed
    position: usize,
    /// Time of step 0 of the current run
    origin: f64,
    /// Steps committed since `origin`
    step_index: u64,
    flash: FlashState,
    step_seconds: f64,
    lookahead_seconds: f64,
    start_offset_seconds: f64,
    muted: bool,
    animate: bool,
    /// None runs silent: editing and playhead still work
    sink: Option<Box<dyn NoteSink>>,
}

impl StepScheduler {
    /// A scheduler armed at clock time zero
    pub fn new(config: &SequencerConfig, sink: Option<Box<dyn NoteSink>>) -> Self {
        let mut scheduler = Self {
            grid: Grid::new(config.rows, config.cols),
            position: config.cols.saturating_sub(1),
            origin: 0.0,
            step_index: 0,
            flash: FlashState::new(config.rows, config.cols, config.flash_seconds),
            step_seconds: config.step_seconds,
            lookahead_seconds: config.lookahead_seconds,
            start_offset_seconds: config.start_offset_seconds,
            muted: config.muted,
            animate: config.animate,
            sink,
        };
        scheduler.start(0.0);
        scheduler
    }

    /// Arm the timeline so the first step (column 0) sounds shortly after `now`
    pub fn start(&mut self, now: f64) {
        self.origin = now + self.start_offset_seconds;
        self.step_index = 0;
        self.position = self.grid.cols().saturating_sub(1);
        self.flash.clear();
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn next_step_time(&self) -> f64 {
        self.origin + self.step_index as f64 * self.step_seconds
    }

    pub fn step_seconds(&self) -> f64 {
        self.step_seconds
    }

    pub fn lookahead_seconds(&self) -> f64 {
        self.lookahead_seconds
    }

    /// Takes effect from the next uncommitted step
    pub fn set_step_seconds(&mut self, step_seconds: f64) {
        if step_seconds.is_finite() && step_seconds > 0.0 && step_seconds != self.step_seconds {
            self.origin = self.next_step_time();
            self.step_index = 0;
            self.step_seconds = step_seconds;
        }
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    pub fn is_animating(&self) -> bool {
        self.animate
    }

    pub fn set_animate(&mut self, animate: bool) {
        self.animate = animate;
        if !animate {
            self.flash.clear();
        }
    }

    /// No synthesizer attached
    pub fn is_silent(&self) -> bool {
        self.sink.is_none()
    }

    pub fn toggle(&mut self, row: usize, col: usize) -> Result<bool, GridError> {
        self.grid.toggle(row, col)
    }

    /// Replace the whole grid. The shape must match.
    pub fn set_grid(&mut self, grid: Grid) -> Result<(), GridError> {
        if !self.grid.same_shape(&grid) {
            return Err(GridError::DimensionMismatch {
                rows: self.grid.rows(),
                cols: self.grid.cols(),
                found_rows: grid.rows(),
                found_cols: grid.cols(),
            });
        }
        self.grid = grid;
        Ok(())
    }

    pub fn clear(&mut self) {
        self.grid.clear();
    }

    pub fn flash_matrix(&self, now: f64) -> Vec<Vec<bool>> {
        self.flash.matrix(now)
    }

    /// Play a row's pitch right away, outside the timeline
    pub fn audition(&mut self, row: usize, now: f64) {
        if self.muted || row >= self.grid.rows() {
            return;
        }
        if let Some(sink) = self.sink.as_mut() {
            sink.play(frequency_for_row(row), now);
        }
    }

    /// Commit every step due within `now + lookahead`.
    ///
    /// Muting suppresses the sink only; playhead and flash marks are
    /// computed exactly as when unmuted.
    pub fn advance(&mut self, now: f64, lookahead: f64) -> Vec<ScheduledStep> {
        let horizon = now + lookahead;
        let cols = self.grid.cols();
        let mut committed = Vec::new();
        // An unbounded horizon would commit steps forever
        if cols == 0 || !horizon.is_finite() {
            return committed;
        }

        while self.next_step_time() <= horizon {
            let time = self.next_step_time();
            let column = (self.position + 1) % cols;
            let rows: Vec<usize> = self.grid.active_rows(column).collect();

            for &row in &rows {
                if !self.muted {
                    if let Some(sink) = self.sink.as_mut() {
                        sink.play(frequency_for_row(row), time);
                    }
                }
                if self.animate {
                    self.flash.mark(row, column, time);
                }
            }

            log::trace!("step {} at {:.3}s, {} notes", column, time, rows.len());
            self.position = column;
            self.step_index += 1;
            committed.push(ScheduledStep { column, time, rows });
        }

        self.flash.prune(now);
        committed
    }

    /// Advance against a clock using the configured lookahead.
    /// A suspended clock counts as no time passing.
    pub fn poll(&mut self, clock: &dyn AudioClock) -> Vec<ScheduledStep> {
        if !clock.is_running() {
            return Vec::new();
        }
        self.advance(clock.current_time(), self.lookahead_seconds)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use parking_lot::Mutex;

    use super::*;
    use crate::sequencer::clock::ManualClock;

    type Played = Arc<Mutex<Vec<(f64, f64)>>>;

    struct RecordingSink(Played);

    impl NoteSink for RecordingSink {
        fn play(&mut self, frequency: f64, start_time: f64) {
            self.0.lock().push((frequency, start_time));
        }
    }

    fn config(rows: usize, cols: usize, step_seconds: f64) -> SequencerConfig {
        SequencerConfig {
            rows,
            cols,
            step_seconds,
            ..SequencerConfig::default()
        }
    }

    fn recording(config: &SequencerConfig) -> (StepScheduler, Played) {
        let played: Played = Arc::new(Mutex::new(Vec::new()));
        let sink = RecordingSink(played.clone());
        (StepScheduler::new(config, Some(Box::new(sink))), played)
    }

    #[test]
    fn test_single_note_scenario() {
        let (mut scheduler, played) = recording(&config(1, 8, 0.5));
        scheduler.toggle(0, 3).unwrap();
        assert!((scheduler.next_step_time() - 0.05).abs() < 1e-12);

        let steps = scheduler.advance(2.0, 0.1);

        let played = played.lock();
        assert_eq!(played.len(), 1);
        let (freq, time) = played[0];
        assert!((time - 1.55).abs() < 1e-9);
        assert!((freq - 130.81).abs() < 0.01);

        // Steps at 0.05, 0.55, 1.05, 1.55 and 2.05 all fall inside 2.1
        let cols: Vec<usize> = steps.iter().map(|s| s.column).collect();
        assert_eq!(cols, vec![0, 1, 2, 3, 4]);
        assert_eq!(scheduler.position(), 4);
        assert_eq!(steps[3].rows, vec![0]);
    }

    #[test]
    fn test_polling_never_skips_or_repeats() {
        let cfg = SequencerConfig {
            poll_interval_ms: 25,
            lookahead_seconds: 0.1,
            ..config(2, 8, 0.5)
        };
        let (mut scheduler, _) = recording(&cfg);
        let clock = ManualClock::new(0.0);
        scheduler.start(clock.current_time());
        let start = scheduler.next_step_time();

        // Ten step durations of simulated time, polled every 25 ms.
        // The tenth step is due at start + 4.5 s, inside the last window.
        let mut steps = Vec::new();
        for _ in 0..200 {
            steps.extend(scheduler.poll(&clock));
            clock.advance(0.025);
        }
        let steps: Vec<_> = steps.into_iter().take_while(|s| s.time < start + 5.0).collect();

        assert_eq!(steps.len(), 10);
        for (n, step) in steps.iter().enumerate() {
            assert_eq!(step.column, n % 8);
            assert!((step.time - (start + n as f64 * 0.5)).abs() < 1e-9);
        }
    }

    #[test]
    fn test_backlog_drains_in_order_at_original_times() {
        let (mut scheduler, played) = recording(&config(1, 4, 0.25));
        for col in 0..4 {
            scheduler.toggle(0, col).unwrap();
        }

        // Host timer stalled for a full second before the first poll
        let steps = scheduler.advance(1.0, 0.1);
        let times: Vec<f64> = played.lock().iter().map(|&(_, t)| t).collect();

        assert_eq!(steps.len(), 5);
        for (n, t) in times.iter().enumerate() {
            assert!((t - (0.05 + n as f64 * 0.25)).abs() < 1e-9);
        }
        assert_eq!(scheduler.position(), 0);
    }

    #[test]
    fn test_muted_suppresses_only_synthesis() {
        let mut cfg = config(2, 8, 0.25);
        cfg.animate = true;
        let (mut muted, muted_played) = recording(&cfg);
        let (mut loud, loud_played) = recording(&cfg);
        for s in [&mut muted, &mut loud] {
            s.toggle(0, 0).unwrap();
            s.toggle(1, 2).unwrap();
        }
        muted.set_muted(true);

        let muted_steps = muted.advance(0.5, 0.1);
        let loud_steps = loud.advance(0.5, 0.1);

        assert!(muted_played.lock().is_empty());
        assert_eq!(loud_played.lock().len(), 2);
        assert_eq!(muted_steps, loud_steps);
        assert_eq!(muted.position(), loud.position());
        assert!(muted.flash_matrix(0.55)[1][2]);
        assert_eq!(muted.flash_matrix(0.55), loud.flash_matrix(0.55));
    }

    #[test]
    fn test_startup_grace_period() {
        let (mut scheduler, _) = recording(&config(1, 8, 0.5));
        scheduler.start(10.0);
        assert!(scheduler.advance(9.0, 0.1).is_empty());
        assert!(scheduler.advance(9.94, 0.1).is_empty());
        assert_eq!(scheduler.position(), 7);
        assert_eq!(scheduler.advance(9.96, 0.1).len(), 1);
        assert_eq!(scheduler.position(), 0);
    }

    #[test]
    fn test_suspended_clock_is_no_time() {
        let (mut scheduler, played) = recording(&config(1, 8, 0.25));
        scheduler.toggle(0, 0).unwrap();
        let clock = ManualClock::new(5.0);
        clock.suspend();

        assert!(scheduler.poll(&clock).is_empty());
        assert!(played.lock().is_empty());
        assert_eq!(scheduler.position(), 7);
    }

    #[test]
    fn test_toggle_and_set_grid_validation() {
        let (mut scheduler, _) = recording(&config(2, 8, 0.25));
        assert!(scheduler.toggle(2, 0).is_err());
        assert!(scheduler.toggle(0, 8).is_err());
        assert!(scheduler.grid().is_empty());

        let mut replacement = Grid::new(2, 8);
        replacement.set(1, 7, true).unwrap();
        scheduler.set_grid(replacement.clone()).unwrap();
        assert_eq!(scheduler.grid(), &replacement);

        let err = scheduler.set_grid(Grid::new(16, 16)).unwrap_err();
        assert!(matches!(err, GridError::DimensionMismatch { .. }));
        assert_eq!(scheduler.grid(), &replacement);

        scheduler.clear();
        assert!(scheduler.grid().is_empty());
        assert_eq!(scheduler.grid().dimensions(), (2, 8));
    }

    #[test]
    fn test_silent_mode_still_advances() {
        let mut scheduler = StepScheduler::new(&config(1, 8, 0.25), None);
        scheduler.toggle(0, 1).unwrap();
        assert!(scheduler.is_silent());
        let steps = scheduler.advance(0.5, 0.1);
        assert_eq!(steps.len(), 3);
        assert_eq!(steps[1].rows, vec![0]);
        assert_eq!(scheduler.position(), 2);
    }

    #[test]
    fn test_step_change_rebases_timeline() {
        let (mut scheduler, _) = recording(&config(1, 8, 0.5));
        scheduler.advance(0.0, 0.1);
        assert!((scheduler.next_step_time() - 0.55).abs() < 1e-12);
        scheduler.set_step_seconds(0.25);
        assert!((scheduler.next_step_time() - 0.55).abs() < 1e-12);
        scheduler.advance(0.5, 0.1);
        assert!((scheduler.next_step_time() - 0.8).abs() < 1e-12);
    }

    #[test]
    fn test_unbounded_timing_commits_nothing() {
        let (mut scheduler, played) = recording(&config(1, 8, 0.5));
        scheduler.toggle(0, 0).unwrap();
        assert!(scheduler.advance(1.0, f64::INFINITY).is_empty());
        assert!(scheduler.advance(1.0, f64::NAN).is_empty());
        assert!(played.lock().is_empty());

        scheduler.set_step_seconds(f64::INFINITY);
        scheduler.set_step_seconds(f64::NAN);
        assert_eq!(scheduler.step_seconds(), 0.5);
        assert_eq!(scheduler.advance(1.0, 0.1).len(), 3);
    }
}

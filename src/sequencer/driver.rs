use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use anyhow::{Context, Result};
use crossbeam_channel::select;
use parking_lot::RwLock;

use crate::command::{Command, CommandBus, CommandReceiver, CommandSender, CommandSource};
use crate::share::{self, ShareLink};

use super::clock::{AudioClock, ClockState};
use super::grid::Grid;
use super::scheduler::StepScheduler;

/// Snapshot published for rendering. The UI only reads it; all writes go
/// through commands.
#[derive(Clone, Debug)]
pub struct SequencerState {
    pub playing: bool,
    pub muted: bool,
    pub animate: bool,
    /// No synthesizer attached
    pub silent: bool,
    pub audio: ClockState,
    pub clock_time: f64,
    pub step_seconds: f64,
    pub position: usize,
    pub grid: Grid,
    /// flash[row][col]
    pub flash: Vec<Vec<bool>>,
    /// None when the grid is too large to share
    pub share_token: Option<String>,
}

impl SequencerState {
    fn capture(scheduler: &StepScheduler, clock: &dyn AudioClock, playing: bool) -> Self {
        let now = clock.current_time();
        Self {
            playing,
            muted: scheduler.is_muted(),
            animate: scheduler.is_animating(),
            silent: scheduler.is_silent(),
            audio: clock.state(),
            clock_time: now,
            step_seconds: scheduler.step_seconds(),
            position: scheduler.position(),
            grid: scheduler.grid().clone(),
            flash: scheduler.flash_matrix(now),
            share_token: share::encode(scheduler.grid()).ok(),
        }
    }
}

/// Owns the scheduler on its own thread and polls it periodically.
///
/// The poll timer is a `tick` channel with room for one pending tick, so a
/// poll that overruns causes the next ticks to be skipped rather than
/// queued. `advance` is only ever called from this thread.
pub struct SequencerDriver {
    sender: CommandSender,
    state: Arc<RwLock<SequencerState>>,
    handle: Option<JoinHandle<()>>,
}

impl SequencerDriver {
    pub fn spawn(
        scheduler: StepScheduler,
        clock: Arc<dyn AudioClock>,
        poll_interval: Duration,
        bus: &CommandBus,
    ) -> Result<Self> {
        let state = Arc::new(RwLock::new(SequencerState::capture(
            &scheduler,
            clock.as_ref(),
            false,
        )));

        let worker = DriverLoop {
            scheduler,
            clock,
            commands: bus.receiver(),
            state: state.clone(),
            playing: false,
        };

        let handle = thread::Builder::new()
            .name("sequencer-driver".to_string())
            .spawn(move || worker.run(poll_interval))
            .context("Failed to spawn sequencer driver thread")?;

        Ok(Self {
            sender: bus.sender(),
            state,
            handle: Some(handle),
        })
    }

    pub fn sender(&self) -> CommandSender {
        self.sender.clone()
    }

    pub fn state(&self) -> Arc<RwLock<SequencerState>> {
        self.state.clone()
    }

    /// Stop polling and wait for the thread. Sounding notes ring out.
    pub fn shutdown(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.sender.send(Command::Shutdown, CommandSource::Tui);
            if handle.join().is_err() {
                log::error!("Sequencer driver thread panicked");
            }
        }
    }
}

impl Drop for SequencerDriver {
    fn drop(&mut self) {
        self.shutdown();
    }
}

struct DriverLoop {
    scheduler: StepScheduler,
    clock: Arc<dyn AudioClock>,
    commands: CommandReceiver,
    state: Arc<RwLock<SequencerState>>,
    playing: bool,
}

impl DriverLoop {
    fn run(mut self, poll_interval: Duration) {
        let ticker = crossbeam_channel::tick(poll_interval);
        log::info!("Sequencer driver started, polling every {:?}", poll_interval);

        let mut quit = false;
        while !quit {
            select! {
                recv(self.commands.channel()) -> msg => match msg {
                    Ok((cmd, source)) => quit = self.handle(cmd, source),
                    Err(_) => quit = true,
                },
                recv(ticker) -> _ => self.poll(),
            }

            // Apply everything else already queued before the next poll
            while !quit {
                match self.commands.try_recv() {
                    Some((cmd, source)) => quit = self.handle(cmd, source),
                    None => break,
                }
            }

            self.publish();
        }

        log::info!("Sequencer driver stopped");
    }

    fn poll(&mut self) {
        if self.playing {
            self.scheduler.poll(self.clock.as_ref());
        }
    }

    fn publish(&self) {
        let snapshot = SequencerState::capture(&self.scheduler, self.clock.as_ref(), self.playing);
        *self.state.write() = snapshot;
    }

    /// Returns true when the loop should exit
    fn handle(&mut self, cmd: Command, source: CommandSource) -> bool {
        log::debug!("{:?}: {}", source, cmd.description());
        match cmd {
            Command::Play => {
                if !self.playing {
                    self.scheduler.start(self.clock.current_time());
                    self.playing = true;
                }
            }
            Command::Stop => {
                self.playing = false;
            }
            Command::SetStepSeconds(seconds) => {
                self.scheduler.set_step_seconds(seconds);
            }
            Command::ToggleCell { row, col } => {
                if let Err(e) = self.scheduler.toggle(row, col) {
                    log::warn!("Ignoring toggle: {}", e);
                }
            }
            Command::SetGrid(grid) => {
                if let Err(e) = self.scheduler.set_grid(grid) {
                    log::warn!("Ignoring grid replacement: {}", e);
                }
            }
            Command::Clear => {
                self.scheduler.clear();
            }
            Command::LoadShare(link) => {
                let (rows, cols) = self.scheduler.grid().dimensions();
                let grid = ShareLink::parse(&link, rows, cols);
                if let Err(e) = self.scheduler.set_grid(grid) {
                    log::warn!("Ignoring shared grid: {}", e);
                }
            }
            Command::SetMuted(muted) => self.scheduler.set_muted(muted),
            Command::ToggleMute => {
                let muted = !self.scheduler.is_muted();
                self.scheduler.set_muted(muted);
            }
            Command::SetAnimate(animate) => self.scheduler.set_animate(animate),
            Command::ResumeAudio => self.clock.resume(),
            Command::SuspendAudio => self.clock.suspend(),
            Command::Audition(row) => {
                if self.clock.is_running() {
                    self.scheduler.audition(row, self.clock.current_time());
                }
            }
            Command::Shutdown => return true,
        }
        false
    }
}

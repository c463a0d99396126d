use std::io::{self, Stdout};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use parking_lot::RwLock;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Terminal;

use chimegrid::audio::AudioEngine;
use chimegrid::command::{Command, CommandSender, CommandSource};
use chimegrid::config::SequencerConfig;
use chimegrid::project::{self, renderer::export_wav};
use chimegrid::sequencer::{ClockState, SequencerDriver, SequencerState};
use chimegrid::share::ShareLink;

use crate::ui::{
    help_line_count, render_audio_gate, render_grid, render_help, render_transport, GridState,
    HelpState, Theme,
};

const STEP_NUDGE_SECONDS: f64 = 0.025;
const MIN_STEP_SECONDS: f64 = 0.05;
const EXPORT_LOOPS: usize = 2;
const STATUS_SECONDS: u64 = 3;

/// Current UI view
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum View {
    Grid,
    Help,
}

/// Application state
pub struct App {
    theme: Theme,
    /// Keeps the output stream alive; `None` in silent mode
    _audio: Option<AudioEngine>,
    driver: SequencerDriver,
    command_sender: CommandSender,
    /// Snapshot published by the driver thread
    sequencer_state: Arc<RwLock<SequencerState>>,
    /// Settings used for sessions and export
    config: SequencerConfig,
    share_base: String,
    grid_state: GridState,
    help_state: HelpState,
    view: View,
    should_quit: bool,
    session_path: PathBuf,
    /// Temporary status message (e.g., "Saved: session.json")
    status_message: Option<(String, Instant)>,
}

impl App {
    pub fn new(
        theme: Theme,
        audio: Option<AudioEngine>,
        driver: SequencerDriver,
        config: SequencerConfig,
        share_base: String,
    ) -> Self {
        let command_sender = driver.sender();
        let sequencer_state = driver.state();

        Self {
            theme,
            _audio: audio,
            driver,
            command_sender,
            sequencer_state,
            config,
            share_base,
            grid_state: GridState::new(),
            help_state: HelpState::new(),
            view: View::Grid,
            should_quit: false,
            session_path: PathBuf::from("session.json"),
            status_message: None,
        }
    }

    /// Run the main application loop
    pub fn run(&mut self) -> Result<()> {
        let mut terminal = Self::setup_terminal()?;

        let result = self.main_loop(&mut terminal);

        self.driver.shutdown();
        Self::restore_terminal(&mut terminal)?;

        result
    }

    /// Setup the terminal for TUI
    fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        stdout.execute(EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;
        Ok(terminal)
    }

    /// Restore terminal to normal state
    fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
        disable_raw_mode()?;
        terminal.backend_mut().execute(LeaveAlternateScreen)?;
        terminal.show_cursor()?;
        Ok(())
    }

    /// Main event loop
    fn main_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
        loop {
            terminal.draw(|frame| self.render(frame))?;

            // Poll for events with timeout for responsive UI (~60fps)
            if event::poll(Duration::from_millis(16))? {
                if let Event::Key(key) = event::read()? {
                    // Only handle key press events (not release)
                    if key.kind == KeyEventKind::Press {
                        self.handle_key(key);
                    }
                }
            }

            if self.should_quit {
                break;
            }
        }

        Ok(())
    }

    fn dispatch(&mut self, cmd: Command) {
        log::debug!("tui: {}", cmd.description());
        self.command_sender.send(cmd, CommandSource::Tui);
    }

    /// Set a temporary status message shown in the footer
    fn set_status(&mut self, msg: String) {
        self.status_message = Some((msg, Instant::now()));
    }

    /// Audio output exists but has not been unlocked yet
    fn audio_locked(&self) -> bool {
        let state = self.sequencer_state.read();
        !state.silent && state.audio == ClockState::Suspended
    }

    /// Current config with the live transport settings folded in
    fn live_config(&self, state: &SequencerState) -> SequencerConfig {
        let mut config = self.config.clone();
        config.rows = state.grid.rows();
        config.cols = state.grid.cols();
        config.step_seconds = state.step_seconds;
        config.muted = state.muted;
        config.animate = state.animate;
        config
    }

    /// Handle key press events
    fn handle_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            match key.code {
                KeyCode::Char('s') => {
                    self.save_session_action();
                    return;
                }
                KeyCode::Char('o') => {
                    self.load_session_action();
                    return;
                }
                KeyCode::Char('e') => {
                    self.export_action();
                    return;
                }
                KeyCode::Char('c') => {
                    self.should_quit = true;
                    return;
                }
                _ => {}
            }
        }

        if key.code == KeyCode::Char('g') {
            self.view = match self.view {
                View::Grid => View::Help,
                View::Help => View::Grid,
            };
            return;
        }

        match self.view {
            View::Grid => self.handle_grid_key(key.code),
            View::Help => self.handle_help_key(key.code),
        }
    }

    /// Handle keys in grid view
    fn handle_grid_key(&mut self, key: KeyCode) {
        let (rows, cols, playing, step_seconds, muted, animate) = {
            let state = self.sequencer_state.read();
            (
                state.grid.rows(),
                state.grid.cols(),
                state.playing,
                state.step_seconds,
                state.muted,
                state.animate,
            )
        };
        self.grid_state.clamp(rows, cols);

        match key {
            KeyCode::Char('q') | KeyCode::Esc => {
                self.should_quit = true;
            }

            // Navigation, up is towards higher pitch
            KeyCode::Up | KeyCode::Char('k') => self.grid_state.move_cursor(0, 1, rows, cols),
            KeyCode::Down | KeyCode::Char('j') => self.grid_state.move_cursor(0, -1, rows, cols),
            KeyCode::Left | KeyCode::Char('h') => self.grid_state.move_cursor(-1, 0, rows, cols),
            KeyCode::Right | KeyCode::Char('l') => self.grid_state.move_cursor(1, 0, rows, cols),

            KeyCode::Enter if self.audio_locked() => {
                self.dispatch(Command::ResumeAudio);
                self.set_status("Audio enabled".to_string());
            }
            KeyCode::Char(' ') | KeyCode::Enter => {
                let cmd = Command::ToggleCell {
                    row: self.grid_state.cursor_row,
                    col: self.grid_state.cursor_col,
                };
                self.dispatch(cmd);
            }

            KeyCode::Char('p') => {
                if playing {
                    self.dispatch(Command::Stop);
                } else {
                    self.dispatch(Command::Play);
                }
            }
            KeyCode::Char('+') | KeyCode::Char('=') => {
                let step = (step_seconds - STEP_NUDGE_SECONDS).max(MIN_STEP_SECONDS);
                self.dispatch(Command::SetStepSeconds(step));
            }
            KeyCode::Char('-') => {
                self.dispatch(Command::SetStepSeconds(step_seconds + STEP_NUDGE_SECONDS));
            }
            KeyCode::Char('m') => {
                self.dispatch(Command::SetMuted(!muted));
                self.set_status(if muted { "Unmuted" } else { "Muted" }.to_string());
            }
            KeyCode::Char('a') => {
                self.dispatch(Command::SetAnimate(!animate));
            }
            KeyCode::Char('c') => {
                self.dispatch(Command::Clear);
                self.set_status("Cleared grid".to_string());
            }
            KeyCode::Char('x') => {
                self.dispatch(Command::Audition(self.grid_state.cursor_row));
            }
            KeyCode::Char('s') => self.share_action(),
            _ => {}
        }
    }

    fn handle_help_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Up | KeyCode::Char('k') => self.help_state.scroll_up(),
            KeyCode::Down | KeyCode::Char('j') => {
                let total = help_line_count(&self.theme);
                self.help_state.scroll_down(total, 10);
            }
            KeyCode::Esc | KeyCode::Tab => self.view = View::Grid,
            KeyCode::Char('q') => self.should_quit = true,
            _ => {}
        }
    }

    fn share_action(&mut self) {
        let grid = self.sequencer_state.read().grid.clone();
        match ShareLink::build(&self.share_base, &grid) {
            Ok(link) => {
                log::info!("Share link: {}", link);
                self.set_status(link);
            }
            Err(e) => self.set_status(format!("Cannot share: {}", e)),
        }
    }

    fn save_session_action(&mut self) {
        let path = self.session_path.clone();
        let state = self.sequencer_state.read().clone();
        let config = self.live_config(&state);
        match project::save_session(&config, &state.grid, &path) {
            Ok(()) => self.set_status(format!("Saved: {}", path.display())),
            Err(e) => self.set_status(format!("Save failed: {}", e)),
        }
    }

    fn load_session_action(&mut self) {
        let path = self.session_path.clone();
        let current = self.sequencer_state.read().grid.dimensions();

        let loaded = project::load_session(&path).and_then(|session| {
            let grid = session.grid()?;
            Ok((session.config, grid))
        });
        match loaded {
            Ok((config, grid)) if grid.dimensions() != current => {
                self.set_status(format!(
                    "Load failed: session is {}x{}, grid is {}x{}",
                    config.rows, config.cols, current.0, current.1
                ));
            }
            Ok((config, grid)) => {
                self.dispatch(Command::SetGrid(grid));
                self.dispatch(Command::SetStepSeconds(config.step_seconds));
                self.dispatch(Command::SetMuted(config.muted));
                self.dispatch(Command::SetAnimate(config.animate));
                self.set_status(format!("Loaded: {}", path.display()));
            }
            Err(e) => self.set_status(format!("Load failed: {}", e)),
        }
    }

    fn export_action(&mut self) {
        let state = self.sequencer_state.read().clone();
        let config = self.live_config(&state);
        let path = PathBuf::from("chimegrid.wav");
        match export_wav(&config, &state.grid, EXPORT_LOOPS, &path) {
            Ok(result) => {
                self.set_status(format!(
                    "Exported: {} ({:.1}s)",
                    path.display(),
                    result.duration_secs
                ));
            }
            Err(e) => self.set_status(format!("Export failed: {}", e)),
        }
    }

    /// Render the UI
    fn render(&self, frame: &mut Frame) {
        let area = frame.area();

        let bg_block = Block::default().style(Style::default().bg(self.theme.bg));
        frame.render_widget(bg_block, area);

        // Layout: header, transport, main content, footer
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Length(3),
                Constraint::Min(4),
                Constraint::Length(3),
            ])
            .split(area);

        let state = self.sequencer_state.read();

        self.render_header(frame, chunks[0]);
        render_transport(frame, chunks[1], &state, &self.theme);

        match self.view {
            View::Grid => {
                render_grid(frame, chunks[2], &state, &self.grid_state, &self.theme);
                if !state.silent && state.audio == ClockState::Suspended {
                    render_audio_gate(frame, chunks[2], &self.theme);
                }
            }
            View::Help => render_help(frame, chunks[2], &self.help_state, &self.theme),
        }
        drop(state);

        self.render_footer(frame, chunks[3]);
    }

    fn render_header(&self, frame: &mut Frame, area: Rect) {
        let view_indicator = match self.view {
            View::Grid => "[GRID]",
            View::Help => "[HELP]",
        };
        let title = format!(
            " CHIMEGRID v{} {} ",
            env!("CARGO_PKG_VERSION"),
            view_indicator
        );
        let header = Paragraph::new(title)
            .style(
                Style::default()
                    .fg(self.theme.highlight)
                    .bg(self.theme.bg)
                    .bold(),
            )
            .alignment(Alignment::Center)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(self.theme.border))
                    .style(Style::default().bg(self.theme.bg)),
            );
        frame.render_widget(header, area);
    }

    /// Render the footer with help or status message
    fn render_footer(&self, frame: &mut Frame, area: Rect) {
        let text = match &self.status_message {
            Some((msg, instant)) if instant.elapsed().as_secs() < STATUS_SECONDS => msg.clone(),
            _ => self.footer_help(),
        };

        let footer = Paragraph::new(text)
            .style(Style::default().fg(self.theme.dimmed).bg(self.theme.bg))
            .alignment(Alignment::Center)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(self.theme.border))
                    .style(Style::default().bg(self.theme.bg)),
            );
        frame.render_widget(footer, area);
    }

    fn footer_help(&self) -> String {
        match self.view {
            View::Grid => format!(
                "SPACE:Toggle | P:Play | +/-:Speed | M:Mute | X:Hear | S:Share | C-s:Save | G:Help | Q:Quit | {}",
                self.theme.name
            ),
            View::Help => format!("Up/Down:Scroll | G/Esc:Back | Q:Quit | {}", self.theme.name),
        }
    }
}

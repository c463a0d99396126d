use crate::sequencer::Grid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandSource {
    Tui,
    Cli,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    // Transport
    Play,
    Stop,
    SetStepSeconds(f64),

    // Grid
    ToggleCell { row: usize, col: usize },
    SetGrid(Grid),
    Clear,
    /// Load a share token or share URL
    LoadShare(String),

    // Playback flags
    SetMuted(bool),
    ToggleMute,
    SetAnimate(bool),

    // Audio gate
    ResumeAudio,
    SuspendAudio,

    /// Play a row's pitch now
    Audition(usize),

    /// Stop the driver thread
    Shutdown,
}

impl Command {
    /// Human-readable description of the command
    pub fn description(&self) -> String {
        match self {
            Command::Play => "Play".to_string(),
            Command::Stop => "Stop".to_string(),
            Command::SetStepSeconds(s) => format!("Set step to {:.3}s", s),
            Command::ToggleCell { row, col } => format!("Toggle row {} col {}", row, col),
            Command::SetGrid(grid) => format!("Set {}x{} grid", grid.rows(), grid.cols()),
            Command::Clear => "Clear grid".to_string(),
            Command::LoadShare(_) => "Load share link".to_string(),
            Command::SetMuted(m) => format!("Set muted {}", m),
            Command::ToggleMute => "Toggle mute".to_string(),
            Command::SetAnimate(a) => format!("Set animate {}", a),
            Command::ResumeAudio => "Resume audio".to_string(),
            Command::SuspendAudio => "Suspend audio".to_string(),
            Command::Audition(row) => format!("Audition row {}", row),
            Command::Shutdown => "Shutdown".to_string(),
        }
    }
}

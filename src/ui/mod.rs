pub mod grid;
pub mod help;
pub mod theme;

pub use grid::{render_audio_gate, render_grid, render_transport, GridState};
pub use help::{help_line_count, render_help, HelpState};
pub use theme::Theme;

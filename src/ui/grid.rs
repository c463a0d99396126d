use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

use chimegrid::sequencer::{note_for_row, ClockState, SequencerState};
use chimegrid::synth::note_name;

use crate::ui::Theme;

/// Grid cursor state
pub struct GridState {
    pub cursor_row: usize,
    pub cursor_col: usize,
}

impl GridState {
    pub fn new() -> Self {
        Self {
            cursor_row: 0,
            cursor_col: 0,
        }
    }

    /// Move the cursor, wrapping at the edges. `dy` is positive upwards
    /// (towards higher rows).
    pub fn move_cursor(&mut self, dx: i32, dy: i32, rows: usize, cols: usize) {
        if rows == 0 || cols == 0 {
            return;
        }
        self.cursor_col = ((self.cursor_col as i32 + dx).rem_euclid(cols as i32)) as usize;
        self.cursor_row = ((self.cursor_row as i32 + dy).rem_euclid(rows as i32)) as usize;
    }

    /// Pull the cursor back inside a (possibly smaller) grid
    pub fn clamp(&mut self, rows: usize, cols: usize) {
        self.cursor_row = self.cursor_row.min(rows.saturating_sub(1));
        self.cursor_col = self.cursor_col.min(cols.saturating_sub(1));
    }
}

impl Default for GridState {
    fn default() -> Self {
        Self::new()
    }
}

/// Render the note grid. Row 0 (lowest pitch) is drawn at the bottom.
pub fn render_grid(
    frame: &mut Frame,
    area: Rect,
    state: &SequencerState,
    grid_state: &GridState,
    theme: &Theme,
) {
    let block = Block::default()
        .title(Span::styled(" Grid ", Style::default().fg(theme.row_label)))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.border))
        .style(Style::default().bg(theme.bg));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let grid = &state.grid;
    let (rows, cols) = grid.dimensions();
    if rows == 0 || cols == 0 {
        return;
    }

    let label_width = 5u16;
    let available_width = inner.width.saturating_sub(label_width);
    let cell_width = (available_width / cols as u16).max(2);
    let cell_height = (inner.height / rows as u16).max(1);

    for line in 0..rows {
        let row = rows - 1 - line;
        let row_y = inner.y + (line as u16 * cell_height);
        if row_y >= inner.y + inner.height {
            break;
        }

        let label = format!("{:>4} ", note_name(note_for_row(row)));
        let label_style = if row == grid_state.cursor_row {
            Style::default().fg(theme.highlight).bold()
        } else {
            Style::default().fg(theme.row_label)
        };
        frame.render_widget(
            Paragraph::new(label).style(label_style),
            Rect::new(inner.x, row_y, label_width, 1),
        );

        for col in 0..cols {
            let col_x = inner.x + label_width + (col as u16 * cell_width);
            if col_x >= inner.x + inner.width {
                break;
            }

            let is_active = grid.get(row, col);
            let is_cursor = row == grid_state.cursor_row && col == grid_state.cursor_col;
            let is_flashing = state
                .flash
                .get(row)
                .and_then(|r| r.get(col))
                .copied()
                .unwrap_or(false);
            let is_playhead = state.playing && col == state.position;

            let (symbol, style) = if is_cursor {
                let style = if is_active {
                    Style::default().fg(theme.bg).bg(theme.cursor).bold()
                } else {
                    Style::default().fg(theme.cursor).bg(theme.bg).bold()
                };
                ("[]", style)
            } else if is_flashing {
                ("██", Style::default().fg(theme.flash).bg(theme.bg).bold())
            } else if is_active {
                let bg = if is_playhead { theme.playhead } else { theme.bg };
                ("██", Style::default().fg(theme.cell_on).bg(bg))
            } else if is_playhead {
                ("::", Style::default().fg(theme.playhead).bg(theme.bg))
            } else if col % 4 == 0 {
                (". ", Style::default().fg(theme.dimmed).bg(theme.bg))
            } else {
                ("- ", Style::default().fg(theme.cell_off).bg(theme.bg))
            };

            frame.render_widget(
                Paragraph::new(symbol).style(style),
                Rect::new(col_x, row_y, cell_width.min(2), 1),
            );
        }
    }
}

/// Render transport status bar
pub fn render_transport(frame: &mut Frame, area: Rect, state: &SequencerState, theme: &Theme) {
    let status = if state.playing { "PLAY" } else { "STOP" };
    let status_style = if state.playing {
        Style::default().fg(theme.highlight).bold()
    } else {
        Style::default().fg(theme.dimmed)
    };

    let audio = if state.silent {
        Span::styled("SILENT", Style::default().fg(theme.warning))
    } else {
        match state.audio {
            ClockState::Running if state.muted => {
                Span::styled("MUTED", Style::default().fg(theme.warning))
            }
            ClockState::Running => Span::styled("AUDIO ON", Style::default().fg(theme.fg)),
            ClockState::Suspended => {
                Span::styled("AUDIO LOCKED", Style::default().fg(theme.warning))
            }
        }
    };

    let sep = || Span::styled(" | ", Style::default().fg(theme.border));
    let transport_text = vec![
        Span::styled(format!(" {} ", status), status_style),
        sep(),
        Span::styled(
            format!("Step: {:.0} ms", state.step_seconds * 1000.0),
            Style::default().fg(theme.fg),
        ),
        sep(),
        Span::styled(
            format!("Col: {:2}/{}", state.position + 1, state.grid.cols()),
            Style::default().fg(theme.fg),
        ),
        sep(),
        Span::styled(
            format!("Bells: {}", state.grid.active_count()),
            Style::default().fg(theme.fg),
        ),
        sep(),
        audio,
        sep(),
        Span::styled(
            if state.animate { "FLASH" } else { "NO FLASH" },
            Style::default().fg(theme.dimmed),
        ),
        sep(),
        Span::styled(
            format!("t={:.2}s", state.clock_time),
            Style::default().fg(theme.dimmed),
        ),
    ];

    let transport = Paragraph::new(Line::from(transport_text))
        .style(Style::default().bg(theme.bg))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.border))
                .style(Style::default().bg(theme.bg)),
        );

    frame.render_widget(transport, area);
}

/// Overlay asking the user to unlock audio output
pub fn render_audio_gate(frame: &mut Frame, area: Rect, theme: &Theme) {
    let width = 40.min(area.width);
    let height = 5.min(area.height);
    let popup = Rect::new(
        area.x + (area.width.saturating_sub(width)) / 2,
        area.y + (area.height.saturating_sub(height)) / 2,
        width,
        height,
    );

    let text = vec![
        Line::from(Span::styled(
            "Audio is locked",
            Style::default().fg(theme.highlight).bold(),
        )),
        Line::from(Span::styled(
            "Press Enter to enable sound",
            Style::default().fg(theme.fg),
        )),
    ];
    let body = Paragraph::new(text)
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.highlight))
                .style(Style::default().bg(theme.bg)),
        );

    frame.render_widget(Clear, popup);
    frame.render_widget(body, popup);
}

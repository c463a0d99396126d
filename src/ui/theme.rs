use ratatui::style::Color;

/// Theme configuration for the TUI
#[derive(Debug, Clone)]
pub struct Theme {
    pub name: &'static str,
    pub bg: Color,
    pub fg: Color,
    pub cell_on: Color,
    pub cell_off: Color,
    pub cursor: Color,
    pub row_label: Color,
    /// Cell lit by a recent trigger
    pub flash: Color,
    pub playhead: Color,
    pub border: Color,
    pub highlight: Color,
    pub dimmed: Color,
    pub warning: Color,
}

impl Theme {
    /// Default theme - uses terminal's ANSI colors
    pub fn default_theme() -> Self {
        Self {
            name: "default",
            bg: Color::Reset,
            fg: Color::Reset,
            cell_on: Color::Cyan,
            cell_off: Color::DarkGray,
            cursor: Color::Yellow,
            row_label: Color::Blue,
            flash: Color::White,
            playhead: Color::Magenta,
            border: Color::White,
            highlight: Color::Magenta,
            dimmed: Color::DarkGray,
            warning: Color::Red,
        }
    }

    /// Warm brass tones on black
    pub fn brass() -> Self {
        Self {
            name: "brass",
            bg: Color::Black,
            fg: Color::Rgb(230, 190, 110),
            cell_on: Color::Rgb(230, 170, 60),
            cell_off: Color::Rgb(70, 55, 25),
            cursor: Color::Rgb(255, 235, 180),
            row_label: Color::Rgb(190, 140, 60),
            flash: Color::Rgb(255, 250, 220),
            playhead: Color::Rgb(160, 110, 40),
            border: Color::Rgb(150, 115, 50),
            highlight: Color::Rgb(255, 215, 130),
            dimmed: Color::Rgb(60, 45, 20),
            warning: Color::Rgb(255, 110, 60),
        }
    }

    /// Pale blues, like frosted glass
    pub fn glacier() -> Self {
        Self {
            name: "glacier",
            bg: Color::Black,
            fg: Color::Rgb(170, 210, 240),
            cell_on: Color::Rgb(110, 190, 255),
            cell_off: Color::Rgb(30, 55, 85),
            cursor: Color::Rgb(220, 240, 255),
            row_label: Color::Rgb(90, 150, 210),
            flash: Color::Rgb(245, 250, 255),
            playhead: Color::Rgb(60, 110, 170),
            border: Color::Rgb(70, 120, 180),
            highlight: Color::Rgb(190, 225, 255),
            dimmed: Color::Rgb(25, 45, 70),
            warning: Color::Rgb(255, 120, 140),
        }
    }

    /// Stark black and white high contrast
    pub fn high_contrast() -> Self {
        Self {
            name: "high-contrast",
            bg: Color::Black,
            fg: Color::White,
            cell_on: Color::White,
            cell_off: Color::Rgb(60, 60, 60),
            cursor: Color::White,
            row_label: Color::White,
            flash: Color::Rgb(255, 255, 0),
            playhead: Color::Rgb(140, 140, 140),
            border: Color::White,
            highlight: Color::White,
            dimmed: Color::Rgb(80, 80, 80),
            warning: Color::White,
        }
    }

    /// Get theme by name
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "default" => Some(Self::default_theme()),
            "brass" => Some(Self::brass()),
            "glacier" => Some(Self::glacier()),
            "high-contrast" => Some(Self::high_contrast()),
            _ => None,
        }
    }

    /// List all available theme names
    pub fn available_themes() -> &'static [&'static str] {
        &["default", "brass", "glacier", "high-contrast"]
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::default_theme()
    }
}

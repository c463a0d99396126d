use thiserror::Error;

/// Errors raised when editing a grid
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GridError {
    #[error("cell ({row}, {col}) is outside the {rows}x{cols} grid")]
    OutOfRange {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },

    #[error("grid shape {found_rows}x{found_cols} does not match {rows}x{cols}")]
    DimensionMismatch {
        rows: usize,
        cols: usize,
        found_rows: usize,
        found_cols: usize,
    },
}

/// Errors raised by the share token codec
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("grid has {cells} cells, a share token holds at most {capacity}")]
    GridTooLarge { cells: usize, capacity: usize },

    #[error("invalid share token: {0}")]
    InvalidToken(String),
}

/// Errors raised when loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("poll interval ({poll_ms} ms) must be shorter than the lookahead window ({lookahead_ms} ms)")]
    PollNotBelowLookahead { poll_ms: f64, lookahead_ms: f64 },

    #[error("step duration must be positive and finite, got {0} s")]
    NonPositiveStep(f64),

    #[error("lookahead window must be positive and finite, got {0} s")]
    InvalidLookahead(f64),

    #[error("poll interval must be at least 1 ms")]
    ZeroPollInterval,

    #[error("{field} must be finite and not negative, got {value} s")]
    NegativeDuration { field: &'static str, value: f64 },

    #[error("grid must have at least one row and one column, got {rows}x{cols}")]
    EmptyGrid { rows: usize, cols: usize },

    #[error("unknown grid preset '{0}'")]
    UnknownPreset(String),

    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const DEFAULT_STEP_SECONDS: f64 = 0.25;
pub const DEFAULT_LOOKAHEAD_SECONDS: f64 = 0.1;
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 25;
pub const DEFAULT_START_OFFSET_SECONDS: f64 = 0.05;
pub const DEFAULT_FLASH_SECONDS: f64 = 0.15;

/// Named grid shapes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GridPreset {
    Single,
    Double,
    Full,
}

impl GridPreset {
    pub fn name(&self) -> &'static str {
        match self {
            GridPreset::Single => "single",
            GridPreset::Double => "double",
            GridPreset::Full => "full",
        }
    }

    /// (rows, cols)
    pub fn dimensions(&self) -> (usize, usize) {
        match self {
            GridPreset::Single => (1, 8),
            GridPreset::Double => (2, 8),
            GridPreset::Full => (16, 16),
        }
    }

    pub fn from_name(name: &str) -> Result<Self, ConfigError> {
        match name {
            "single" => Ok(GridPreset::Single),
            "double" => Ok(GridPreset::Double),
            "full" => Ok(GridPreset::Full),
            other => Err(ConfigError::UnknownPreset(other.to_string())),
        }
    }

    pub fn all() -> [GridPreset; 3] {
        [GridPreset::Single, GridPreset::Double, GridPreset::Full]
    }
}

/// Sequencer timing and grid configuration.
///
/// Every field is re-read by the scheduler on each poll, so flags such as
/// `muted` can change at runtime without rebuilding the poll loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SequencerConfig {
    pub rows: usize,
    pub cols: usize,
    /// Seconds per grid column
    pub step_seconds: f64,
    /// How far past the poll instant notes are committed
    pub lookahead_seconds: f64,
    /// Period of the driver's poll timer
    pub poll_interval_ms: u64,
    /// Delay between start and the first step
    pub start_offset_seconds: f64,
    /// How long a triggered cell stays lit
    pub flash_seconds: f64,
    pub muted: bool,
    pub animate: bool,
}

impl Default for SequencerConfig {
    fn default() -> Self {
        Self::for_preset(GridPreset::Full)
    }
}

impl SequencerConfig {
    pub fn for_preset(preset: GridPreset) -> Self {
        let (rows, cols) = preset.dimensions();
        Self {
            rows,
            cols,
            step_seconds: DEFAULT_STEP_SECONDS,
            lookahead_seconds: DEFAULT_LOOKAHEAD_SECONDS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            start_offset_seconds: DEFAULT_START_OFFSET_SECONDS,
            flash_seconds: DEFAULT_FLASH_SECONDS,
            muted: false,
            animate: true,
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Load a JSON config file. Missing fields fall back to defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        let config: SequencerConfig = serde_json::from_str(&json)?;
        Ok(config)
    }

    /// A poll interval at or above the lookahead window can let a step
    /// become due and pass between two polls.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rows == 0 || self.cols == 0 {
            return Err(ConfigError::EmptyGrid {
                rows: self.rows,
                cols: self.cols,
            });
        }
        if !(self.step_seconds.is_finite() && self.step_seconds > 0.0) {
            return Err(ConfigError::NonPositiveStep(self.step_seconds));
        }
        if !(self.lookahead_seconds.is_finite() && self.lookahead_seconds > 0.0) {
            return Err(ConfigError::InvalidLookahead(self.lookahead_seconds));
        }
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::ZeroPollInterval);
        }
        for (field, value) in [
            ("start offset", self.start_offset_seconds),
            ("flash duration", self.flash_seconds),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ConfigError::NegativeDuration { field, value });
            }
        }
        let poll_ms = self.poll_interval_ms as f64;
        let lookahead_ms = self.lookahead_seconds * 1000.0;
        if poll_ms >= lookahead_ms {
            return Err(ConfigError::PollNotBelowLookahead {
                poll_ms,
                lookahead_ms,
            });
        }
        Ok(())
    }
}

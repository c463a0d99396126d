//! Chimegrid: a grid step sequencer with a lookahead scheduler, an additive
//! bell synthesizer and compact shareable grid tokens.

pub mod audio;
pub mod command;
pub mod config;
pub mod error;
pub mod project;
pub mod sequencer;
pub mod share;
pub mod synth;

pub use config::{GridPreset, SequencerConfig};
pub use error::{CodecError, ConfigError, GridError};
pub use sequencer::{Grid, StepScheduler};

pub mod clock;
pub mod driver;
pub mod flash;
pub mod grid;
pub mod scale;
pub mod scheduler;

pub use clock::{AudioClock, ClockState, ManualClock, SampleClock, WallClock};
pub use driver::{SequencerDriver, SequencerState};
pub use flash::FlashState;
pub use grid::Grid;
pub use scale::{frequency_for_row, note_for_row};
pub use scheduler::{ScheduledStep, StepScheduler};

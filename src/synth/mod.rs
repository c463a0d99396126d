pub mod bank;
pub mod bell;
pub mod master;
pub mod params;
pub mod voice;

pub use bank::VoiceBank;
pub use bell::{NoteEvent, NoteSink, Partial, ToneSynthesizer, NOTE_QUEUE_CAPACITY};
pub use master::{soft_clip, Compressor, MasterBus};
pub use params::{midi_to_freq, note_name, MasterParams, PartialSpec, BELL_PARTIALS};
pub use voice::BellVoice;

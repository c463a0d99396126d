use crossbeam_channel::Receiver;

use super::bell::NoteEvent;
use super::master::MasterBus;
use super::params::MasterParams;
use super::voice::BellVoice;

/// Most voices sounding at once. Preallocated so the audio callback never
/// grows the voice list.
pub const VOICE_CAPACITY: usize = 256;

/// All sounding notes plus the shared output stage.
///
/// Voices are only ever appended; one is dropped once it has decayed to
/// silence, never earlier. Notes arriving while all `VOICE_CAPACITY` slots
/// are sounding are discarded and counted.
pub struct VoiceBank {
    sample_rate: f32,
    voices: Vec<BellVoice>,
    master: MasterBus,
    dropped: u64,
}

impl VoiceBank {
    pub fn new(sample_rate: f32) -> Self {
        Self::with_params(sample_rate, &MasterParams::default())
    }

    pub fn with_params(sample_rate: f32, params: &MasterParams) -> Self {
        Self {
            sample_rate,
            voices: Vec::with_capacity(VOICE_CAPACITY),
            master: MasterBus::new(sample_rate, params),
            dropped: 0,
        }
    }

    /// Returns false when the bank is full and the note was dropped
    pub fn add(&mut self, note: &NoteEvent, current_frame: u64) -> bool {
        if self.voices.len() >= VOICE_CAPACITY {
            self.reap(current_frame);
            if self.voices.len() >= VOICE_CAPACITY {
                self.dropped += 1;
                return false;
            }
        }
        self.voices
            .push(BellVoice::new(note, self.sample_rate as f64, current_frame));
        true
    }

    /// Move every queued note into the bank (non-blocking). Returns how
    /// many were added.
    pub fn drain(&mut self, rx: &Receiver<NoteEvent>, current_frame: u64) -> usize {
        let mut added = 0;
        while let Ok(note) = rx.try_recv() {
            if self.add(&note, current_frame) {
                added += 1;
            }
        }
        added
    }

    /// Notes discarded because every voice slot was busy
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    /// Mixed, limited sample for an absolute frame
    pub fn render_frame(&mut self, frame: u64) -> f32 {
        let mut sum = 0.0f32;
        for voice in &mut self.voices {
            sum += voice.next_sample(frame);
        }
        self.master.process(sum)
    }

    /// Drop voices that finished before `frame`
    pub fn reap(&mut self, frame: u64) {
        self.voices.retain(|v| !v.is_finished(frame));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synth::ToneSynthesizer;

    #[test]
    fn test_drain_and_reap() {
        let (synth, rx) = ToneSynthesizer::channel();
        synth.play_bell(261.63, 0.0);
        synth.play_bell(329.63, 0.5);

        let mut bank = VoiceBank::new(8_000.0);
        assert_eq!(bank.drain(&rx, 0), 2);
        assert_eq!(bank.voices.len(), 2);

        let mut energy = 0.0f32;
        for frame in 0..8_000 {
            energy += bank.render_frame(frame).abs();
        }
        assert!(energy > 0.0);

        // First note ends at 1.4 s, second at 1.9 s
        bank.reap(8_000 * 3 / 2);
        assert_eq!(bank.voices.len(), 1);
        bank.reap(8_000 * 2);
        assert_eq!(bank.voices.len(), 0);
    }

    #[test]
    fn test_full_bank_drops_without_growing() {
        let mut bank = VoiceBank::new(8_000.0);
        for i in 0..VOICE_CAPACITY {
            assert!(bank.add(&NoteEvent::bell(220.0 + i as f64, 0.0), 0));
        }
        let capacity = bank.voices.capacity();

        assert!(!bank.add(&NoteEvent::bell(880.0, 0.0), 0));
        assert_eq!(bank.voices.len(), VOICE_CAPACITY);
        assert_eq!(bank.dropped(), 1);
        assert_eq!(bank.voices.capacity(), capacity);

        // Once the earlier notes have decayed their slots are reused
        assert!(bank.add(&NoteEvent::bell(880.0, 2.0), 8_000 * 2));
        assert_eq!(bank.voices.len(), 1);
    }

    #[test]
    fn test_silent_before_start() {
        let mut bank = VoiceBank::new(8_000.0);
        bank.add(&NoteEvent::bell(440.0, 1.0), 0);
        for frame in 0..8_000 {
            assert_eq!(bank.render_frame(frame), 0.0);
        }
    }
}

use serde::{Deserialize, Serialize};

/// Convert a MIDI pitch to frequency in Hz. Not limited to 0..=127.
/// A4 (69) = 440 Hz
pub fn midi_to_freq(note: f64) -> f64 {
    440.0 * 2.0f64.powf((note - 69.0) / 12.0)
}

/// Note name from MIDI note number (e.g., 60 -> "C4", 61 -> "C#4")
pub fn note_name(note: u8) -> String {
    let names = ["C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B"];
    let octave = (note / 12) as i32 - 1;
    format!("{}{}", names[note as usize % 12], octave)
}

/// Linear attack time shared by every partial
pub const ATTACK_SECONDS: f64 = 0.005;

/// Level the exponential decay reaches at a partial's stop time.
/// Never zero, since an exponential ramp cannot reach zero.
pub const ENVELOPE_FLOOR: f32 = 0.0001;

/// Per-note gain applied to the summed partials
pub const NOTE_GAIN: f32 = 0.3;

/// One sine component of the bell, relative to the base frequency
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PartialSpec {
    pub ratio: f64,
    pub peak: f32,
    pub decay_seconds: f64,
}

/// Fundamental with the longest ring, two quieter harmonics above it
pub const BELL_PARTIALS: [PartialSpec; 3] = [
    PartialSpec {
        ratio: 1.0,
        peak: 0.9,
        decay_seconds: 1.4,
    },
    PartialSpec {
        ratio: 2.0,
        peak: 0.32,
        decay_seconds: 1.0,
    },
    PartialSpec {
        ratio: 3.0,
        peak: 0.18,
        decay_seconds: 0.9,
    },
];

/// Shared output stage settings
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MasterParams {
    pub gain: f32,
    pub threshold_db: f32,
    pub knee_db: f32,
    pub ratio: f32,
    pub attack_seconds: f32,
    pub release_seconds: f32,
}

impl Default for MasterParams {
    fn default() -> Self {
        Self {
            gain: 0.8,
            threshold_db: -18.0,
            knee_db: 24.0,
            ratio: 4.0,
            attack_seconds: 0.003,
            release_seconds: 0.15,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_midi_to_freq() {
        assert!((midi_to_freq(69.0) - 440.0).abs() < 1e-9);
        assert!((midi_to_freq(60.0) - 261.6256).abs() < 1e-3);
        assert!((midi_to_freq(81.0) - 880.0).abs() < 1e-9);
        // Past the MIDI range the octave rule still holds
        assert!((midi_to_freq(150.0) - 2.0 * midi_to_freq(138.0)).abs() < 1e-6);
    }

    #[test]
    fn test_note_name() {
        assert_eq!(note_name(48), "C3");
        assert_eq!(note_name(61), "C#4");
    }
}

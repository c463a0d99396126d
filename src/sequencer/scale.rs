use crate::synth::midi_to_freq;

/// Minor pentatonic degrees, in semitones above the octave root
pub const PENTATONIC_OFFSETS: [u8; 5] = [0, 3, 5, 7, 10];

/// MIDI note of row 0 (C3)
pub const BASE_NOTE: u8 = 48;

/// Pitch of a grid row in (unbounded) MIDI note units, counted from the
/// bottom. Every five rows is one octave up.
pub fn pitch_for_row(row: usize) -> f64 {
    let octave = (row / PENTATONIC_OFFSETS.len()) as f64;
    let degree = PENTATONIC_OFFSETS[row % PENTATONIC_OFFSETS.len()] as f64;
    BASE_NOTE as f64 + 12.0 * octave + degree
}

/// MIDI note for a row label. Saturates at 127; use `frequency_for_row`
/// for sound.
pub fn note_for_row(row: usize) -> u8 {
    pitch_for_row(row).min(127.0) as u8
}

/// Pitch in Hz for a grid row, counted from the bottom
pub fn frequency_for_row(row: usize) -> f64 {
    midi_to_freq(pitch_for_row(row))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_zero_is_c3() {
        assert_eq!(note_for_row(0), 48);
        assert!((frequency_for_row(0) - 130.8128).abs() < 1e-3);
    }

    #[test]
    fn test_tall_grids_keep_rising() {
        assert_eq!(note_for_row(40), 127);
        assert!(frequency_for_row(40) > frequency_for_row(39));
        assert!((frequency_for_row(35) - 8.0 * frequency_for_row(20)).abs() < 1e-6);
    }

    #[test]
    fn test_pentatonic_degrees() {
        let notes: Vec<u8> = (0..6).map(note_for_row).collect();
        assert_eq!(notes, vec![48, 51, 53, 55, 58, 60]);
    }

    #[test]
    fn test_five_rows_up_is_an_octave() {
        for row in 0..60 {
            let low = frequency_for_row(row);
            let high = frequency_for_row(row + 5);
            assert!(
                (high - 2.0 * low).abs() <= 1e-9 * high,
                "row {}: {} vs {}",
                row,
                high,
                low
            );
        }
    }
}

use super::bell::{NoteEvent, Partial};
use super::params::{ATTACK_SECONDS, ENVELOPE_FLOOR};

/// Oscillator and envelope state for one partial
struct PartialVoice {
    /// Phase increment per sample (cycles)
    phase_inc: f64,
    /// Accumulated oscillator phase (0.0 to 1.0)
    phase: f64,
    peak: f32,
    decay_seconds: f64,
    /// Exponential decay rate from peak to ENVELOPE_FLOOR, per second
    decay_rate: f64,
}

impl PartialVoice {
    fn new(partial: &Partial, sample_rate: f64) -> Self {
        let ramp = (partial.decay_seconds - ATTACK_SECONDS).max(1e-6);
        let peak = partial.peak.max(ENVELOPE_FLOOR);
        Self {
            phase_inc: partial.frequency / sample_rate,
            phase: 0.0,
            peak,
            decay_seconds: partial.decay_seconds,
            decay_rate: (ENVELOPE_FLOOR as f64 / peak as f64).ln() / ramp,
        }
    }

    /// Linear attack to peak, then exponential decay reaching the floor
    /// exactly at the stop time. Silent outside [0, decay).
    fn envelope(&self, t: f64) -> f32 {
        if t < 0.0 || t >= self.decay_seconds {
            0.0
        } else if t < ATTACK_SECONDS {
            self.peak * (t / ATTACK_SECONDS) as f32
        } else {
            self.peak * (self.decay_rate * (t - ATTACK_SECONDS)).exp() as f32
        }
    }

    fn next_sample(&mut self, t: f64) -> f32 {
        let amp = self.envelope(t);
        if amp == 0.0 {
            return 0.0;
        }
        let osc = (self.phase * std::f64::consts::TAU).sin() as f32;
        self.phase += self.phase_inc;
        if self.phase >= 1.0 {
            self.phase -= 1.0;
        }
        osc * amp
    }
}

/// One sounding bell note, rendered against absolute frame indices
pub struct BellVoice {
    partials: Vec<PartialVoice>,
    gain: f32,
    sample_rate: f64,
    /// Frame at which the note starts
    start_frame: u64,
    /// Frame from which the voice is silent for good
    end_frame: u64,
}

impl BellVoice {
    /// Notes whose start time has already passed begin at `current_frame`
    pub fn new(note: &NoteEvent, sample_rate: f64, current_frame: u64) -> Self {
        let requested = (note.start_time.max(0.0) * sample_rate).round() as u64;
        let start_frame = requested.max(current_frame);
        let end_frame = start_frame + (note.duration() * sample_rate).ceil() as u64;
        Self {
            partials: note
                .partials
                .iter()
                .map(|p| PartialVoice::new(p, sample_rate))
                .collect(),
            gain: note.gain,
            sample_rate,
            start_frame,
            end_frame,
        }
    }

    pub fn is_finished(&self, frame: u64) -> bool {
        frame >= self.end_frame
    }

    /// Sample for an absolute frame; frames must be requested in order
    pub fn next_sample(&mut self, frame: u64) -> f32 {
        if frame < self.start_frame || frame >= self.end_frame {
            return 0.0;
        }
        let t = (frame - self.start_frame) as f64 / self.sample_rate;
        let sum: f32 = self.partials.iter_mut().map(|p| p.next_sample(t)).sum();
        sum * self.gain
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: f64 = 48_000.0;

    fn single_partial_voice(peak: f32, decay: f64) -> PartialVoice {
        PartialVoice::new(
            &Partial {
                frequency: 440.0,
                peak,
                decay_seconds: decay,
            },
            SR,
        )
    }

    #[test]
    fn test_envelope_shape() {
        let p = single_partial_voice(0.9, 1.4);
        assert_eq!(p.envelope(-0.001), 0.0);
        assert_eq!(p.envelope(0.0), 0.0);
        assert!((p.envelope(0.0025) - 0.45).abs() < 1e-4);
        assert!((p.envelope(ATTACK_SECONDS) - 0.9).abs() < 1e-4);
        assert!(p.envelope(0.5) < p.envelope(0.1));
        let near_stop = p.envelope(1.4 - 1e-9);
        assert!(near_stop > 0.0 && (near_stop - ENVELOPE_FLOOR).abs() < 1e-6);
        assert_eq!(p.envelope(1.4), 0.0);
    }

    #[test]
    fn test_voice_waits_for_start_frame() {
        let note = NoteEvent::bell(440.0, 0.5);
        let mut voice = BellVoice::new(&note, SR, 0);
        assert_eq!(voice.start_frame, 24_000);
        assert_eq!(voice.next_sample(23_999), 0.0);

        // 2 ms into the attack the voice is audible
        let mut peak = 0.0f32;
        for frame in 24_000..24_500 {
            peak = peak.max(voice.next_sample(frame).abs());
        }
        assert!(peak > 0.0);
        assert!(!voice.is_finished(24_500));
        assert!(voice.is_finished(24_000 + (1.4 * SR) as u64 + 1));
    }

    #[test]
    fn test_late_note_starts_immediately() {
        let note = NoteEvent::bell(440.0, 0.1);
        let mut voice = BellVoice::new(&note, SR, 10_000);
        assert_eq!(voice.start_frame, 10_000);
        let mut peak = 0.0f32;
        for frame in 10_000..10_200 {
            peak = peak.max(voice.next_sample(frame).abs());
        }
        assert!(peak > 0.0);
    }
}

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};

use super::params::{PartialSpec, BELL_PARTIALS, NOTE_GAIN};

/// Queue depth between the scheduler and the audio callback
pub const NOTE_QUEUE_CAPACITY: usize = 512;

/// A single sine partial of a scheduled note
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Partial {
    pub frequency: f64,
    pub peak: f32,
    pub decay_seconds: f64,
}

/// An immutable note ready to be rendered, consumed once by the voice bank
#[derive(Clone, Debug, PartialEq)]
pub struct NoteEvent {
    pub frequency: f64,
    /// Audio clock time the note starts at
    pub start_time: f64,
    pub gain: f32,
    pub partials: Vec<Partial>,
}

impl NoteEvent {
    /// The fixed additive bell timbre at a base frequency
    pub fn bell(frequency: f64, start_time: f64) -> Self {
        Self {
            frequency,
            start_time,
            gain: NOTE_GAIN,
            partials: BELL_PARTIALS
                .iter()
                .map(|spec: &PartialSpec| Partial {
                    frequency: frequency * spec.ratio,
                    peak: spec.peak,
                    decay_seconds: spec.decay_seconds,
                })
                .collect(),
        }
    }

    /// Time after `start_time` at which the last partial stops
    pub fn duration(&self) -> f64 {
        self.partials
            .iter()
            .map(|p| p.decay_seconds)
            .fold(0.0, f64::max)
    }
}

/// Anything the scheduler can hand a due note to.
/// Must be Send so the scheduler can live on the driver thread.
pub trait NoteSink: Send {
    /// Schedule a note at `start_time` on the audio clock. Must not block.
    fn play(&mut self, frequency: f64, start_time: f64);
}

/// Fire-and-forget bell synthesizer front.
///
/// Builds note events and queues them for whichever renderer owns the
/// receiving end (the live audio callback or the offline exporter).
#[derive(Clone)]
pub struct ToneSynthesizer {
    tx: Sender<NoteEvent>,
}

impl ToneSynthesizer {
    pub fn new(tx: Sender<NoteEvent>) -> Self {
        Self { tx }
    }

    /// A synthesizer paired with the receiver its notes arrive on
    pub fn channel() -> (Self, Receiver<NoteEvent>) {
        let (tx, rx) = bounded(NOTE_QUEUE_CAPACITY);
        (Self::new(tx), rx)
    }

    /// Queue a bell note (non-blocking, drops if the queue is full)
    pub fn play_bell(&self, frequency: f64, start_time: f64) -> bool {
        match self.tx.try_send(NoteEvent::bell(frequency, start_time)) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                log::warn!("Note queue full, dropping {:.2} Hz at {:.3}s", frequency, start_time);
                false
            }
            Err(TrySendError::Disconnected(_)) => false,
        }
    }
}

impl NoteSink for ToneSynthesizer {
    fn play(&mut self, frequency: f64, start_time: f64) {
        self.play_bell(frequency, start_time);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bell_partials_are_harmonic() {
        let note = NoteEvent::bell(220.0, 1.5);
        let freqs: Vec<f64> = note.partials.iter().map(|p| p.frequency).collect();
        assert_eq!(freqs, vec![220.0, 440.0, 660.0]);
        assert_eq!(note.start_time, 1.5);
        assert_eq!(note.gain, NOTE_GAIN);
        assert_eq!(note.duration(), 1.4);
    }

    #[test]
    fn test_play_queues_event() {
        let (mut synth, rx) = ToneSynthesizer::channel();
        synth.play(130.0, 0.25);
        let note = rx.try_recv().unwrap();
        assert_eq!(note.frequency, 130.0);
        assert_eq!(note.start_time, 0.25);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_full_queue_drops_without_blocking() {
        let (tx, rx) = bounded(1);
        let synth = ToneSynthesizer::new(tx);
        assert!(synth.play_bell(100.0, 0.0));
        assert!(!synth.play_bell(200.0, 0.0));
        assert_eq!(rx.len(), 1);
    }
}

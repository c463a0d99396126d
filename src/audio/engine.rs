use std::sync::Arc;

use anyhow::{Context, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, SampleFormat, Stream, StreamConfig};
use crossbeam_channel::Receiver;

use crate::sequencer::{AudioClock, SampleClock};
use crate::synth::{NoteEvent, ToneSynthesizer, VoiceBank};

/// Audio engine managing the output stream, its sample clock and the voice bank.
///
/// The engine owns the one process-wide output stream. The clock it hands
/// out starts suspended: the callback writes silence and time stands still
/// until the front-end resumes it.
pub struct AudioEngine {
    _stream: Stream,
    clock: Arc<SampleClock>,
    synth: ToneSynthesizer,
}

impl AudioEngine {
    /// Initialize the audio engine with default output device
    pub fn new() -> Result<Self> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .context("No output device available")?;

        let config = device
            .default_output_config()
            .context("No default output config")?;
        let sample_rate = config.sample_rate().0;
        let clock = Arc::new(SampleClock::new(sample_rate));
        let (synth, note_rx) = ToneSynthesizer::channel();

        let stream = match config.sample_format() {
            SampleFormat::F32 => {
                Self::build_stream::<f32>(&device, &config.into(), note_rx, clock.clone())?
            }
            SampleFormat::I16 => {
                Self::build_stream::<i16>(&device, &config.into(), note_rx, clock.clone())?
            }
            SampleFormat::U16 => {
                Self::build_stream::<u16>(&device, &config.into(), note_rx, clock.clone())?
            }
            format => anyhow::bail!("Unsupported sample format: {:?}", format),
        };

        stream.play().context("Failed to start output stream")?;
        log::info!(
            "Audio output on '{}' at {} Hz",
            device.name().unwrap_or_else(|_| "unknown".to_string()),
            sample_rate
        );

        Ok(Self {
            _stream: stream,
            clock,
            synth,
        })
    }

    pub fn clock(&self) -> Arc<SampleClock> {
        self.clock.clone()
    }

    pub fn synthesizer(&self) -> ToneSynthesizer {
        self.synth.clone()
    }

    /// Build the audio stream for a specific sample format
    fn build_stream<T>(
        device: &Device,
        config: &StreamConfig,
        note_rx: Receiver<NoteEvent>,
        clock: Arc<SampleClock>,
    ) -> Result<Stream>
    where
        T: cpal::SizedSample + cpal::FromSample<f32>,
    {
        let sample_rate = config.sample_rate.0 as f32;
        let channels = config.channels as usize;
        let mut bank = VoiceBank::new(sample_rate);

        let stream = device.build_output_stream(
            config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                let start = clock.frame();
                bank.drain(&note_rx, start);

                // Suspended: silence, and the clock does not move
                if !clock.is_running() {
                    for sample in data.iter_mut() {
                        *sample = T::from_sample(0.0f32);
                    }
                    return;
                }

                let mut frames = 0u64;
                for frame in data.chunks_mut(channels) {
                    let sample = bank.render_frame(start + frames);
                    for channel_sample in frame.iter_mut() {
                        *channel_sample = T::from_sample(sample);
                    }
                    frames += 1;
                }

                clock.advance_frames(frames);
                bank.reap(start + frames);
            },
            |err| {
                log::error!("Audio stream error: {}", err);
            },
            None,
        )?;

        Ok(stream)
    }
}

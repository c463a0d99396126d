use std::path::Path;

use anyhow::{Context, Result};

use crate::config::SequencerConfig;
use crate::sequencer::{AudioClock, Grid, ManualClock, StepScheduler};
use crate::synth::{ToneSynthesizer, VoiceBank};

const SAMPLE_RATE: u32 = 44_100;
const TAIL_SECONDS: f64 = 1.5;

/// Result of an export operation
#[derive(Debug)]
pub struct ExportResult {
    pub duration_secs: f32,
    pub samples: usize,
    pub notes: usize,
}

/// Offline renderer that mirrors the live pipeline: the same scheduler is
/// polled once per block against a simulated clock, and the notes it emits
/// go through the same voice bank and master bus.
struct OfflineRenderer {
    scheduler: StepScheduler,
    clock: ManualClock,
    notes: crossbeam_channel::Receiver<crate::synth::NoteEvent>,
    bank: VoiceBank,
    block_frames: u64,
}

impl OfflineRenderer {
    fn new(config: &SequencerConfig, grid: &Grid) -> Result<Self> {
        let mut config = config.clone();
        config.muted = false;
        config.animate = false;

        let (synth, notes) = ToneSynthesizer::channel();
        let mut scheduler = StepScheduler::new(&config, Some(Box::new(synth)));
        scheduler.set_grid(grid.clone())?;

        let block_frames = (config.poll_interval().as_secs_f64() * SAMPLE_RATE as f64)
            .round()
            .max(1.0) as u64;

        Ok(Self {
            scheduler,
            clock: ManualClock::new(0.0),
            notes,
            bank: VoiceBank::new(SAMPLE_RATE as f32),
            block_frames,
        })
    }

    /// Render `steps` steps plus a decay tail
    fn render(&mut self, steps: usize) -> (Vec<f32>, usize) {
        let sr = SAMPLE_RATE as f64;
        self.scheduler.start(self.clock.current_time());
        let first = self.scheduler.next_step_time();
        let step_seconds = self.scheduler.step_seconds();
        let lookahead = self.scheduler.lookahead_seconds();
        // Horizon cap: half a step past the last step to commit
        let cap = first + (steps as f64 - 0.5) * step_seconds;

        let end_seconds = first + steps as f64 * step_seconds + TAIL_SECONDS;
        let total_frames = (end_seconds * sr).ceil() as u64;
        let mut output = Vec::with_capacity(total_frames as usize);
        let mut committed = 0usize;
        let mut notes = 0usize;

        let mut frame = 0u64;
        while frame < total_frames {
            self.clock.set_time(frame as f64 / sr);
            let now = self.clock.current_time();
            if committed < steps {
                let window = lookahead.min(cap - now);
                let due = self.scheduler.advance(now, window);
                committed += due.len();
                notes += due.iter().map(|s| s.rows.len()).sum::<usize>();
            }
            self.bank.drain(&self.notes, frame);

            let block_end = (frame + self.block_frames).min(total_frames);
            for f in frame..block_end {
                output.push(self.bank.render_frame(f));
            }
            self.bank.reap(block_end);
            frame = block_end;
        }

        if self.bank.dropped() > 0 {
            log::warn!("{} notes dropped, all voices busy", self.bank.dropped());
        }
        (output, notes)
    }
}

/// Render `loops` passes over the grid and write a 16-bit stereo WAV file
pub fn export_wav(
    config: &SequencerConfig,
    grid: &Grid,
    loops: usize,
    path: &Path,
) -> Result<ExportResult> {
    let mut renderer = OfflineRenderer::new(config, grid)?;
    let (samples, notes) = renderer.render(loops * grid.cols());

    let spec = hound::WavSpec {
        channels: 2,
        sample_rate: SAMPLE_RATE,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = hound::WavWriter::create(path, spec)
        .with_context(|| format!("Failed to create WAV file: {}", path.display()))?;

    for sample in &samples {
        let s = (*sample * 32767.0).clamp(-32768.0, 32767.0) as i16;
        writer.write_sample(s)?;
        writer.write_sample(s)?;
    }

    writer
        .finalize()
        .with_context(|| format!("Failed to finalize WAV file: {}", path.display()))?;

    let duration_secs = samples.len() as f32 / SAMPLE_RATE as f32;
    log::info!(
        "Exported {} notes, {:.1}s to {}",
        notes,
        duration_secs,
        path.display()
    );

    Ok(ExportResult {
        duration_secs,
        samples: samples.len(),
        notes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GridPreset;

    #[test]
    fn test_render_fires_every_active_cell_once_per_loop() {
        let config = SequencerConfig {
            step_seconds: 0.25,
            ..SequencerConfig::for_preset(GridPreset::Double)
        };
        let mut grid = Grid::new(2, 8);
        grid.set(0, 0, true).unwrap();
        grid.set(1, 0, true).unwrap();
        grid.set(0, 7, true).unwrap();

        let mut renderer = OfflineRenderer::new(&config, &grid).unwrap();
        let (samples, notes) = renderer.render(16);

        assert_eq!(notes, 6);
        let expected = ((0.05 + 16.0 * 0.25 + TAIL_SECONDS) * SAMPLE_RATE as f64).ceil() as usize;
        assert_eq!(samples.len(), expected);
        assert!(samples.iter().all(|s| s.abs() <= 1.0));
        assert!(samples.iter().any(|s| s.abs() > 0.01));
    }

    #[test]
    fn test_export_writes_wav() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("loop.wav");
        let config = SequencerConfig::for_preset(GridPreset::Single);
        let mut grid = Grid::new(1, 8);
        grid.set(0, 2, true).unwrap();

        let result = export_wav(&config, &grid, 1, &path).unwrap();
        assert_eq!(result.notes, 1);

        let reader = hound::WavReader::open(&path).unwrap();
        assert_eq!(reader.spec().channels, 2);
        assert_eq!(reader.spec().sample_rate, SAMPLE_RATE);
        assert_eq!(reader.len() as usize, result.samples * 2);
    }

    #[test]
    fn test_muted_config_still_exports_sound() {
        let config = SequencerConfig {
            muted: true,
            ..SequencerConfig::for_preset(GridPreset::Single)
        };
        let mut grid = Grid::new(1, 8);
        grid.set(0, 0, true).unwrap();
        let mut renderer = OfflineRenderer::new(&config, &grid).unwrap();
        let (samples, notes) = renderer.render(8);
        assert_eq!(notes, 1);
        assert!(samples.iter().any(|s| s.abs() > 0.01));
    }
}

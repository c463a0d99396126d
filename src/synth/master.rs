use super::params::MasterParams;

fn db_to_gain(db: f32) -> f32 {
    10.0f32.powf(db / 20.0)
}

fn gain_to_db(gain: f32) -> f32 {
    20.0 * gain.max(1e-9).log10()
}

/// Gain change in dB (<= 0) for an input level, with a soft knee
fn soft_knee_reduction(input_db: f32, threshold_db: f32, ratio: f32, knee_db: f32) -> f32 {
    let half_knee = knee_db / 2.0;
    let slope = 1.0 - 1.0 / ratio;

    if input_db < threshold_db - half_knee {
        0.0
    } else if input_db > threshold_db + half_knee || knee_db <= 0.0 {
        (threshold_db - input_db) * slope
    } else {
        let x = input_db - threshold_db + half_knee;
        -slope * x * x / (2.0 * knee_db)
    }
}

/// Feed-forward peak compressor used as the safety limiter on the master bus
pub struct Compressor {
    threshold_db: f32,
    knee_db: f32,
    ratio: f32,
    attack_coeff: f32,
    release_coeff: f32,
    /// Smoothed gain change in dB
    gain_db: f32,
}

impl Compressor {
    pub fn new(sample_rate: f32, params: &MasterParams) -> Self {
        let coeff = |seconds: f32| (-1.0 / (seconds.max(1e-5) * sample_rate)).exp();
        Self {
            threshold_db: params.threshold_db,
            knee_db: params.knee_db,
            ratio: params.ratio.max(1.0),
            attack_coeff: coeff(params.attack_seconds),
            release_coeff: coeff(params.release_seconds),
            gain_db: 0.0,
        }
    }

    pub fn process(&mut self, input: f32) -> f32 {
        let target = soft_knee_reduction(
            gain_to_db(input.abs()),
            self.threshold_db,
            self.ratio,
            self.knee_db,
        );
        // More reduction needed = attack, less = release
        let coeff = if target < self.gain_db {
            self.attack_coeff
        } else {
            self.release_coeff
        };
        self.gain_db = target + coeff * (self.gain_db - target);
        input * db_to_gain(self.gain_db)
    }
}

/// Soft clipping function to prevent harsh digital clipping
pub fn soft_clip(x: f32) -> f32 {
    if x > 1.0 {
        1.0 - (-x + 1.0).exp() * 0.5
    } else if x < -1.0 {
        -1.0 + (x + 1.0).exp() * 0.5
    } else {
        x
    }
}

/// Output stage every note passes through: master gain, compressor, clip
pub struct MasterBus {
    gain: f32,
    compressor: Compressor,
}

impl MasterBus {
    pub fn new(sample_rate: f32, params: &MasterParams) -> Self {
        Self {
            gain: params.gain,
            compressor: Compressor::new(sample_rate, params),
        }
    }

    pub fn process(&mut self, input: f32) -> f32 {
        soft_clip(self.compressor.process(input * self.gain))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_knee_regions() {
        // Well below the knee: untouched
        assert_eq!(soft_knee_reduction(-40.0, -18.0, 4.0, 24.0), 0.0);
        // Well above: full ratio
        let r = soft_knee_reduction(0.0, -18.0, 4.0, 24.0);
        assert!((r - (-18.0 * 0.75)).abs() < 1e-4);
        // In the knee: partial, continuous at the edges
        let inside = soft_knee_reduction(-18.0, -18.0, 4.0, 24.0);
        assert!(inside < 0.0 && inside > -18.0 * 0.75);
        let edge = soft_knee_reduction(-6.0, -18.0, 4.0, 24.0);
        assert!((edge - (-12.0 * 0.75)).abs() < 1e-3);
    }

    #[test]
    fn test_quiet_signal_passes() {
        let mut comp = Compressor::new(48_000.0, &MasterParams::default());
        let mut out = 0.0;
        for _ in 0..4800 {
            out = comp.process(0.01);
        }
        assert!((out - 0.01).abs() < 1e-4);
    }

    #[test]
    fn test_stacked_notes_are_limited() {
        let mut bus = MasterBus::new(48_000.0, &MasterParams::default());
        let mut peak = 0.0f32;
        // Sixteen full-level bells summed in one column
        for i in 0..4_800 {
            let x = 16.0 * 0.3 * (i as f32 * 0.05).sin();
            peak = peak.max(bus.process(x).abs());
        }
        assert!(peak <= 1.0);
        assert!(bus.compressor.gain_db < -3.0);
    }

    #[test]
    fn test_soft_clip() {
        assert_eq!(soft_clip(0.5), 0.5);
        assert!(soft_clip(3.0) < 1.0);
        assert!(soft_clip(-3.0) > -1.0);
    }
}

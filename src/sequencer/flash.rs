/// One lit cell: visible from `at` until `at + duration`
#[derive(Clone, Copy, Debug, PartialEq)]
struct FlashPulse {
    row: usize,
    col: usize,
    at: f64,
}

/// Transient "just played" markers, same shape as the grid.
///
/// Pulses are keyed to the audio clock: a cell lights when its note is due
/// to sound, not when it was scheduled, and stays lit for a fixed duration
/// that has nothing to do with the note's decay.
#[derive(Clone, Debug)]
pub struct FlashState {
    rows: usize,
    cols: usize,
    duration: f64,
    pulses: Vec<FlashPulse>,
}

impl FlashState {
    pub fn new(rows: usize, cols: usize, duration: f64) -> Self {
        Self {
            rows,
            cols,
            duration,
            pulses: Vec::new(),
        }
    }

    pub fn mark(&mut self, row: usize, col: usize, at: f64) {
        if row < self.rows && col < self.cols {
            self.pulses.push(FlashPulse { row, col, at });
        }
    }

    /// matrix[row][col]
    pub fn matrix(&self, now: f64) -> Vec<Vec<bool>> {
        let mut matrix = vec![vec![false; self.cols]; self.rows];
        for p in &self.pulses {
            if p.at <= now && now < p.at + self.duration {
                matrix[p.row][p.col] = true;
            }
        }
        matrix
    }

    /// Drop pulses that have finished
    pub fn prune(&mut self, now: f64) {
        let duration = self.duration;
        self.pulses.retain(|p| p.at + duration > now);
    }

    pub fn clear(&mut self) {
        self.pulses.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pulse_lights_for_fixed_duration() {
        let mut flash = FlashState::new(2, 8, 0.15);
        flash.mark(1, 3, 1.0);

        assert!(!flash.matrix(0.99)[1][3]);
        assert!(flash.matrix(1.0)[1][3]);
        assert!(flash.matrix(1.149)[1][3]);
        assert!(!flash.matrix(1.15)[1][3]);
        assert!(!flash.matrix(1.05)[0][3]);

        let matrix = flash.matrix(1.1);
        assert!(matrix[1][3]);
        assert_eq!(matrix.iter().flatten().filter(|&&c| c).count(), 1);
    }

    #[test]
    fn test_prune_drops_finished_pulses() {
        let mut flash = FlashState::new(1, 8, 0.15);
        flash.mark(0, 0, 0.0);
        flash.mark(0, 1, 0.5);
        flash.prune(0.2);
        assert_eq!(flash.pulses.len(), 1);
        assert!(flash.matrix(0.6)[0][1]);
    }

    #[test]
    fn test_out_of_shape_marks_ignored() {
        let mut flash = FlashState::new(1, 8, 0.15);
        flash.mark(3, 0, 0.0);
        assert!(flash.pulses.is_empty());
        assert_eq!(flash.matrix(0.0).len(), 1);
    }
}

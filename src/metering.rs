//! Decaying peak level meters
//!
//! One meter per input channel and per beam, fed from the same per-block
//! buffers the render path already touches. The level tracks the block
//! peak instantly on attack and releases exponentially, which is what a
//! display LED chain expects.

use crate::constants::{AMPLITUDE_FLOOR, DB_FLOOR};

#[derive(Debug, Clone)]
pub struct PeakMeter {
    level: f32,
    decay_per_block: f32,
}

impl PeakMeter {
    /// `release_time_ms` is the time constant of the exponential decay;
    /// the per-block factor follows from the block duration.
    pub fn new(release_time_ms: f32, sample_rate: u32, block_size: usize) -> Self {
        let block_secs = block_size as f32 / sample_rate as f32;
        let tau = (release_time_ms / 1000.0).max(1e-4);
        Self {
            level: 0.0,
            decay_per_block: (-block_secs / tau).exp(),
        }
    }

    pub fn process_block(&mut self, block: &[f32]) {
        let peak = block.iter().fold(0.0f32, |acc, &s| acc.max(s.abs()));
        self.level = peak.max(self.level * self.decay_per_block);
    }

    pub fn level(&self) -> f32 {
        self.level
    }

    pub fn level_db(&self) -> f32 {
        (20.0 * self.level.max(AMPLITUDE_FLOOR).log10()).max(DB_FLOOR)
    }

    pub fn reset(&mut self) {
        self.level = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_attack_is_instant() {
        let mut meter = PeakMeter::new(200.0, 48_000, 512);
        meter.process_block(&[0.1, -0.8, 0.3]);
        assert_abs_diff_eq!(meter.level(), 0.8, epsilon = 1e-6);
    }

    #[test]
    fn test_release_decays_between_blocks() {
        let mut meter = PeakMeter::new(100.0, 48_000, 4800);
        meter.process_block(&[1.0]);
        let silence = vec![0.0f32; 16];

        let mut previous = meter.level();
        for _ in 0..5 {
            meter.process_block(&silence);
            assert!(meter.level() < previous);
            previous = meter.level();
        }
    }

    #[test]
    fn test_silence_floors_in_db() {
        let meter = PeakMeter::new(200.0, 48_000, 512);
        assert_abs_diff_eq!(meter.level_db(), DB_FLOOR, epsilon = 1e-3);
    }
}

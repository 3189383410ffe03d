//! Microphone array geometry
//!
//! Immutable description of the physical array: element spacing along
//! each axis, row/column layout, sample rate and propagation speed.
//! Everything else in the crate derives its sizing from this: the
//! minimum causal FIR length must absorb the largest inter-microphone
//! delay plus a fixed causality margin, and the transform size is the
//! smallest power of two that fits that FIR plus a processing block
//! without circular wrap.

use serde::Deserialize;

use crate::constants::CAUSALITY_MARGIN_TAPS;
use crate::error::{BeamError, Result};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ArrayGeometry {
    /// Element spacing along the horizontal axis in meters
    pub spacing_x_m: f32,
    /// Element spacing along the vertical axis in meters
    pub spacing_y_m: f32,
    /// Number of rows (vertical extent)
    pub rows: usize,
    /// Number of columns (horizontal extent)
    pub cols: usize,
    /// Audio sample rate in Hz
    pub sample_rate: u32,
    /// Speed of sound in meters per second
    pub sound_speed_mps: f32,
}

impl Default for ArrayGeometry {
    fn default() -> Self {
        // 16-element uniform linear array, 4 cm pitch
        Self {
            spacing_x_m: 0.04,
            spacing_y_m: 0.04,
            rows: 1,
            cols: 16,
            sample_rate: 48_000,
            sound_speed_mps: 343.0,
        }
    }
}

impl ArrayGeometry {
    pub fn num_mics(&self) -> usize {
        self.rows * self.cols
    }

    /// Worst-case propagation delay spread across the array in seconds,
    /// reached at end-fire steering on both axes. A degenerate axis
    /// (single row or single column) contributes nothing.
    pub fn max_delay_secs(&self) -> f32 {
        let x = self.cols.saturating_sub(1) as f32 * self.spacing_x_m;
        let y = self.rows.saturating_sub(1) as f32 * self.spacing_y_m;
        (x + y) / self.sound_speed_mps
    }

    /// Worst-case delay spread in whole samples.
    pub fn delay_span_taps(&self) -> usize {
        (self.max_delay_secs() * self.sample_rate as f32).ceil() as usize
    }

    /// Minimum causal FIR length: the delay span plus the causality
    /// margin at each end.
    pub fn required_fir_len(&self) -> usize {
        self.delay_span_taps() + 2 * CAUSALITY_MARGIN_TAPS
    }

    /// Transform size for a given processing block size: the smallest
    /// power of two holding the FIR plus two blocks, so a block-length
    /// input convolved with any steering filter never wraps.
    pub fn transform_size(&self, block_size: usize) -> usize {
        (self.required_fir_len() + 2 * block_size).next_power_of_two()
    }

    pub fn validate(&self) -> Result<()> {
        if self.rows == 0 || self.cols == 0 {
            return Err(BeamError::Config(
                "array must have at least one row and column".into(),
            ));
        }
        if self.spacing_x_m < 0.0 || self.spacing_y_m < 0.0 {
            return Err(BeamError::Config("element spacing must be non-negative".into()));
        }
        if self.sample_rate == 0 {
            return Err(BeamError::Config("sample_rate must be positive".into()));
        }
        if self.sound_speed_mps <= 0.0 {
            return Err(BeamError::Config("sound_speed_mps must be positive".into()));
        }
        Ok(())
    }
}

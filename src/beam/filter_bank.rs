//! Steering filter bank
//!
//! An ordered collection of prepared convolution operands, one per
//! output beam (or per direction-grid cell for the DOA scanner). Each
//! entry retains its time-domain FIR so parameter changes can blend
//! exponentially into the existing coefficients instead of hard-swapping
//! them.

use std::sync::Arc;

use crate::beam::geometry::ArrayGeometry;
use crate::beam::synthesis::FilterSynthesizer;
use crate::config::BeamParams;
use crate::error::{BeamError, Result};
use crate::spectral::{FftContext, SpectralBuffer};

struct BankEntry {
    /// Retained time-domain coefficients, one lane per microphone
    fir: Vec<Vec<f32>>,
    /// Prepared convolution operand built from `fir`
    filter: SpectralBuffer,
    params: BeamParams,
}

pub struct FilterBank {
    synthesizer: FilterSynthesizer,
    entries: Vec<BankEntry>,
}

impl FilterBank {
    /// Build one prepared filter per entry of `params`.
    pub fn new(geometry: ArrayGeometry, fft: Arc<FftContext>, params: &[BeamParams]) -> Self {
        let num_mics = geometry.num_mics();
        let n = fft.size();
        let mut bank = Self {
            synthesizer: FilterSynthesizer::new(geometry, fft.clone()),
            entries: params
                .iter()
                .map(|&params| BankEntry {
                    fir: vec![vec![0.0; n]; num_mics],
                    filter: SpectralBuffer::new(num_mics, fft.clone()),
                    params,
                })
                .collect(),
        };

        for index in 0..bank.entries.len() {
            bank.rebuild(index, 1.0);
        }
        bank
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn params(&self, index: usize) -> &BeamParams {
        &self.entries[index].params
    }

    /// The prepared convolution operand for one entry.
    pub fn filter(&self, index: usize) -> &SpectralBuffer {
        &self.entries[index].filter
    }

    /// Re-steer one entry, blending the new design into the old
    /// coefficients with interpolation factor `alpha` (1 = full
    /// replacement, 0 = no change).
    pub fn update(&mut self, index: usize, params: BeamParams, alpha: f32) -> Result<()> {
        if index >= self.entries.len() {
            return Err(BeamError::BeamIndex {
                index,
                count: self.entries.len(),
            });
        }
        self.entries[index].params = params.clamped();
        self.rebuild(index, alpha);
        Ok(())
    }

    fn rebuild(&mut self, index: usize, alpha: f32) {
        let entry = &mut self.entries[index];
        self.synthesizer.synthesize(&entry.params, alpha, &mut entry.fir);
        entry.filter.load_time_series(&entry.fir);
        entry.filter.prepare_for_convolution();
    }
}

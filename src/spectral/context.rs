//! Shared FFT context
//!
//! One immutable transform handle per engine instance, shared by
//! reference (`Arc`) across every spectral buffer that must stay
//! compatible. Wraps realfft's cached forward/inverse plans for a fixed
//! power-of-two size and applies the `1/N` normalization on the inverse
//! so that forward→inverse round-trips are identity.

use realfft::num_complex::Complex32;
use realfft::{ComplexToReal, RealFftPlanner, RealToComplex};
use std::sync::Arc;

pub struct FftContext {
    size: usize,
    forward: Arc<dyn RealToComplex<f32>>,
    inverse: Arc<dyn ComplexToReal<f32>>,
}

impl FftContext {
    /// Create a context for a power-of-two transform size.
    pub fn new(size: usize) -> Arc<Self> {
        assert!(size.is_power_of_two(), "transform size must be a power of two");
        assert!(size >= 4, "transform size too small");

        let mut planner = RealFftPlanner::<f32>::new();
        Arc::new(Self {
            size,
            forward: planner.plan_fft_forward(size),
            inverse: planner.plan_fft_inverse(size),
        })
    }

    /// Transform size N.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of non-redundant complex bins (N/2 + 1).
    pub fn num_bins(&self) -> usize {
        self.size / 2 + 1
    }

    /// Forward real-to-complex transform. `time` is used as scratch and
    /// clobbered; `spectrum` receives the N/2+1 non-redundant bins,
    /// unnormalized.
    pub fn forward(&self, time: &mut [f32], spectrum: &mut [Complex32]) {
        debug_assert_eq!(time.len(), self.size);
        debug_assert_eq!(spectrum.len(), self.num_bins());
        self.forward
            .process(time, spectrum)
            .expect("forward transform size mismatch");
    }

    /// Inverse complex-to-real transform, normalized by 1/N. `spectrum`
    /// is used as scratch and clobbered.
    pub fn inverse(&self, spectrum: &mut [Complex32], time: &mut [f32]) {
        debug_assert_eq!(spectrum.len(), self.num_bins());
        debug_assert_eq!(time.len(), self.size);
        self.inverse
            .process(spectrum, time)
            .expect("inverse transform size mismatch");

        let scale = 1.0 / self.size as f32;
        for sample in time.iter_mut() {
            *sample *= scale;
        }
    }
}

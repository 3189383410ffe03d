//! Frequency-domain steering filter synthesis
//!
//! Derives one fractional-delay-and-gain FIR per microphone from the
//! array geometry and a requested steering direction/width. The delay is
//! modeled as a pure phase ramp `exp(-j·2π·f·delay)` across the
//! transform's frequency bins, inverse-transformed to time and shaped by
//! the Tukey window; a spatial taper mask derived from the beam width
//! progressively mutes border microphones. Updates blend exponentially
//! into the previous coefficients so live steering changes stay
//! click-free.

use num_complex::Complex32;
use std::f32::consts::{FRAC_PI_2, PI};
use std::sync::Arc;

use crate::beam::geometry::ArrayGeometry;
use crate::config::BeamParams;
use crate::constants::{CAUSALITY_MARGIN_TAPS, MASK_POWER_EPSILON};
use crate::spectral::{FftContext, design_tukey_window};

pub struct FilterSynthesizer {
    geometry: ArrayGeometry,
    fft: Arc<FftContext>,
    window: Vec<f32>,
    /// Common delay applied to every microphone so the earliest arrival
    /// lands a causality margin inside the window span.
    common_delay_secs: f32,
    delays: Vec<f32>,
    mask: Vec<f32>,
    spectrum: Vec<Complex32>,
    time_scratch: Vec<f32>,
}

impl FilterSynthesizer {
    pub fn new(geometry: ArrayGeometry, fft: Arc<FftContext>) -> Self {
        let n = fft.size();
        let fir_len = geometry.required_fir_len().min(n);
        let ramp = CAUSALITY_MARGIN_TAPS.min(fir_len / 2);

        let mut window = vec![0.0; n];
        design_tukey_window(&mut window, fir_len.max(3), ramp);

        let offset = (n - fir_len) / 2;
        let common_delay_secs =
            (offset + CAUSALITY_MARGIN_TAPS) as f32 / geometry.sample_rate as f32;

        let num_mics = geometry.num_mics();
        Self {
            geometry,
            window,
            common_delay_secs,
            delays: vec![0.0; num_mics],
            mask: vec![0.0; num_mics],
            spectrum: vec![Complex32::default(); fft.num_bins()],
            time_scratch: vec![0.0; n],
            fft,
        }
    }

    pub fn geometry(&self) -> &ArrayGeometry {
        &self.geometry
    }

    /// Compute the steering FIR for `params` and blend it into `fir`
    /// (one coefficient lane per microphone, each `N` samples long) as
    /// `(1-alpha)·old + alpha·new`.
    ///
    /// Excess destination lanes are cleared; excess microphones are
    /// ignored.
    pub fn synthesize(&mut self, params: &BeamParams, alpha: f32, fir: &mut [Vec<f32>]) {
        let params = params.clamped();
        let alpha = alpha.clamp(0.0, 1.0);

        self.compute_delays(&params);
        let mask_scale = self.compute_taper_mask(params.width);

        let n = self.fft.size();
        let num_bins = self.fft.num_bins();
        let sample_rate = self.geometry.sample_rate as f32;
        let active = self.geometry.num_mics().min(fir.len());

        for (mic, lane) in fir.iter_mut().enumerate().take(active) {
            let gain = self.mask[mic] * mask_scale;
            let delay = self.delays[mic];

            for (k, bin) in self.spectrum.iter_mut().enumerate() {
                let freq = k as f32 * sample_rate / n as f32;
                *bin = Complex32::from_polar(gain, -2.0 * PI * freq * delay);
            }
            // DC and Nyquist bins of a real design carry no phase.
            self.spectrum[0] = Complex32::new(gain, 0.0);
            self.spectrum[num_bins - 1].im = 0.0;

            self.fft.inverse(&mut self.spectrum, &mut self.time_scratch);

            for ((coeff, &tap), &w) in lane
                .iter_mut()
                .zip(&self.time_scratch)
                .zip(&self.window)
            {
                *coeff = (1.0 - alpha) * *coeff + alpha * tap * w;
            }
        }

        for lane in fir.iter_mut().skip(active) {
            lane.fill(0.0);
        }
    }

    /// Per-microphone propagation delays for the steered direction,
    /// normalized so the earliest arrival sits at the common delay.
    fn compute_delays(&mut self, params: &BeamParams) {
        let angle_x = params.steer_x * FRAC_PI_2;
        let angle_y = params.steer_y * FRAC_PI_2;

        // Inter-element delay along each axis; a degenerate axis (single
        // row or column) contributes nothing since its index is always 0.
        let tau_x = angle_x.sin() * self.geometry.spacing_x_m / self.geometry.sound_speed_mps;
        let tau_y = angle_y.sin() * self.geometry.spacing_y_m / self.geometry.sound_speed_mps;

        for row in 0..self.geometry.rows {
            for col in 0..self.geometry.cols {
                self.delays[row * self.geometry.cols + col] =
                    tau_x * col as f32 + tau_y * row as f32;
            }
        }

        let min = self.delays.iter().cloned().fold(f32::INFINITY, f32::min);
        for delay in &mut self.delays {
            *delay += self.common_delay_secs - min;
        }
    }

    /// Width-driven spatial taper: the muted count per axis end grows
    /// linearly with width, up to a quarter of the extent per end (half
    /// the extent in total), the edge-most live element carrying a
    /// fractional gain. Returns the scale holding total radiated power
    /// at the delay-and-sum reference (`1/num_mics`), so width 0 yields
    /// the classic uniform `1/M` weights.
    fn compute_taper_mask(&mut self, width: f32) -> f32 {
        for row in 0..self.geometry.rows {
            let gain_y = axis_gain(row, self.geometry.rows, width);
            for col in 0..self.geometry.cols {
                let gain_x = axis_gain(col, self.geometry.cols, width);
                self.mask[row * self.geometry.cols + col] = gain_x * gain_y;
            }
        }

        let reference = 1.0 / self.geometry.num_mics() as f32;
        let power: f32 = self.mask.iter().map(|g| g * g).sum();
        (reference / power.max(MASK_POWER_EPSILON)).sqrt()
    }
}

/// Taper gain for one element along one axis. Degenerate axes are left
/// untapered.
fn axis_gain(index: usize, count: usize, width: f32) -> f32 {
    if count <= 1 {
        return 1.0;
    }
    let muted_per_end = width * count as f32 / 4.0;
    let edge_distance = index.min(count - 1 - index) as f32;
    (edge_distance + 1.0 - muted_per_end).clamp(0.0, 1.0)
}

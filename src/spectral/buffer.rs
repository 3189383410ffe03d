//! Packed-spectrum convolution buffers
//!
//! A [`SpectralBuffer`] holds, per channel, `2N` floats that are either
//! time-domain samples, the full interleaved complex spectrum of those
//! samples, or a packed half-spectrum operand ready for the fast
//! real-signal convolution.
//!
//! The packed layout exploits conjugate symmetry of real signals: index
//! `[0, N/2)` holds the real parts (the even-indexed interleaved
//! values), `[N/2, N)` holds the imaginary parts (the odd-indexed
//! values negated and reflected), slot `N/2` is pinned to zero, and the
//! Nyquist real part sits at position `N`. Two operands in this layout
//! multiply with four fused multiply-accumulate passes over half the
//! spectrum plus a single scalar Nyquist product — no complex-multiply
//! loop needed.

use realfft::num_complex::Complex32;
use std::sync::Arc;

use crate::spectral::context::FftContext;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BufferState {
    /// Plain time-domain samples (or cleared)
    Time,
    /// Interleaved complex spectrum, not yet packed
    Transformed,
    /// Packed half-spectrum convolution operand
    ConvolutionReady,
}

pub struct SpectralBuffer {
    fft: Arc<FftContext>,
    /// One `2N`-float lane per channel
    channels: Vec<Vec<f32>>,
    spectrum_scratch: Vec<Complex32>,
    time_scratch: Vec<f32>,
    state: BufferState,
}

impl SpectralBuffer {
    pub fn new(num_channels: usize, fft: Arc<FftContext>) -> Self {
        let n = fft.size();
        Self {
            channels: vec![vec![0.0; 2 * n]; num_channels],
            spectrum_scratch: vec![Complex32::default(); fft.num_bins()],
            time_scratch: vec![0.0; n],
            fft,
            state: BufferState::Time,
        }
    }

    pub fn num_channels(&self) -> usize {
        self.channels.len()
    }

    pub fn transform_size(&self) -> usize {
        self.fft.size()
    }

    pub fn is_convolution_ready(&self) -> bool {
        self.state == BufferState::ConvolutionReady
    }

    /// Zero all channels and revoke convolution readiness.
    pub fn clear(&mut self) {
        for channel in &mut self.channels {
            channel.fill(0.0);
        }
        self.state = BufferState::Time;
    }

    /// Load time-domain content and forward-transform every channel.
    ///
    /// Clears the buffer, copies up to `min(N, len)` samples per input
    /// channel (excess buffer channels stay silent, excess input
    /// channels are ignored), then leaves each channel holding its
    /// interleaved complex spectrum. The buffer is *not* yet a
    /// convolution operand; call [`prepare_for_convolution`] next.
    ///
    /// [`prepare_for_convolution`]: SpectralBuffer::prepare_for_convolution
    pub fn load_time_series<S: AsRef<[f32]>>(&mut self, input: &[S]) {
        self.clear();

        let n = self.fft.size();
        for (channel, source) in self.channels.iter_mut().zip(input.iter()) {
            let source = source.as_ref();
            let len = source.len().min(n);
            channel[..len].copy_from_slice(&source[..len]);
        }

        for channel in &mut self.channels {
            self.time_scratch.copy_from_slice(&channel[..n]);
            self.fft
                .forward(&mut self.time_scratch, &mut self.spectrum_scratch);

            // Interleave the full conjugate-symmetric spectrum: bins
            // 0..=N/2 from the transform, the upper half mirrored.
            for (k, bin) in self.spectrum_scratch.iter().enumerate() {
                channel[2 * k] = bin.re;
                channel[2 * k + 1] = bin.im;
            }
            for k in n / 2 + 1..n {
                let bin = self.spectrum_scratch[n - k];
                channel[2 * k] = bin.re;
                channel[2 * k + 1] = -bin.im;
            }
        }

        self.state = BufferState::Transformed;
    }

    /// Repack every channel's interleaved spectrum into the packed
    /// half-spectrum operand layout.
    ///
    /// # Panics
    /// If the buffer is already prepared (reset first) or holds no
    /// transformed content.
    pub fn prepare_for_convolution(&mut self) {
        assert!(
            self.state != BufferState::ConvolutionReady,
            "prepare_for_convolution called twice without reset"
        );
        assert!(
            self.state == BufferState::Transformed,
            "prepare_for_convolution on a buffer with no transformed content"
        );

        let n = self.fft.size();
        let half = n / 2;
        for channel in &mut self.channels {
            // Even-indexed values (real parts) collapse into [0, N/2).
            for i in 0..half {
                channel[i] = channel[2 * i];
            }
            channel[half] = 0.0;
            // Odd-indexed values negated and reflected into [N/2, N);
            // conjugate symmetry makes these the imaginary parts of the
            // lower bins. Position N already holds the Nyquist real part.
            for i in 1..half {
                channel[half + i] = -channel[2 * (n - i) + 1];
            }
        }

        self.state = BufferState::ConvolutionReady;
    }

    /// Multiply one channel of `input` by one channel of `filter` in the
    /// packed domain and accumulate into `out_ch` of this buffer —
    /// mathematically a real circular convolution restricted to the
    /// valid linear length.
    ///
    /// The destination must be cleared (or already accumulating) before
    /// a sequence of accumulations; it becomes convolution-ready.
    ///
    /// # Panics
    /// If either operand is not convolution-ready or the transform sizes
    /// differ.
    pub fn convolve_accumulate(
        &mut self,
        out_ch: usize,
        input: &SpectralBuffer,
        in_ch: usize,
        filter: &SpectralBuffer,
        filt_ch: usize,
    ) {
        assert!(
            input.is_convolution_ready() && filter.is_convolution_ready(),
            "convolve_accumulate operands must be prepared for convolution"
        );
        assert!(
            input.transform_size() == self.transform_size()
                && filter.transform_size() == self.transform_size(),
            "convolve_accumulate operands have mismatched transform sizes"
        );
        assert!(
            self.state != BufferState::Transformed,
            "convolve_accumulate destination holds unpacked spectral content"
        );

        let n = self.fft.size();
        let half = n / 2;
        let a = &input.channels[in_ch];
        let b = &filter.channels[filt_ch];
        let out = &mut self.channels[out_ch];

        for i in 0..half {
            out[i] = a[i].mul_add(b[i], out[i]);
        }
        for i in 0..half {
            out[i] = (-a[half + i]).mul_add(b[half + i], out[i]);
        }
        for i in 0..half {
            out[half + i] = a[i].mul_add(b[half + i], out[half + i]);
        }
        for i in 0..half {
            out[half + i] = a[half + i].mul_add(b[i], out[half + i]);
        }
        out[n] = a[n].mul_add(b[n], out[n]);

        self.state = BufferState::ConvolutionReady;
    }

    /// Inverse-transform every channel back to the time domain and copy
    /// (or add, with `accumulate`) the first `min(N, dest len)` samples
    /// into `dest`.
    ///
    /// A convolution-ready buffer is first unpacked, reconstructing the
    /// conjugate-symmetric spectrum from the packed lower half. The
    /// buffer ends up holding the produced time series.
    ///
    /// # Panics
    /// If the buffer holds plain time-domain content.
    pub fn to_time_series<S: AsMut<[f32]>>(&mut self, dest: &mut [S], accumulate: bool) {
        assert!(
            self.state != BufferState::Time,
            "to_time_series on a buffer with no spectral content"
        );

        let n = self.fft.size();
        let half = n / 2;
        let packed = self.state == BufferState::ConvolutionReady;

        for (channel, dest) in self.channels.iter_mut().zip(dest.iter_mut()) {
            if packed {
                self.spectrum_scratch[0] = Complex32::new(channel[0], 0.0);
                for k in 1..half {
                    self.spectrum_scratch[k] = Complex32::new(channel[k], channel[half + k]);
                }
                self.spectrum_scratch[half] = Complex32::new(channel[n], 0.0);
            } else {
                for k in 0..=half {
                    self.spectrum_scratch[k] = Complex32::new(channel[2 * k], channel[2 * k + 1]);
                }
                // The transform requires purely real DC and Nyquist bins.
                self.spectrum_scratch[0].im = 0.0;
                self.spectrum_scratch[half].im = 0.0;
            }

            self.fft
                .inverse(&mut self.spectrum_scratch, &mut self.time_scratch);

            let dest = dest.as_mut();
            let len = dest.len().min(n);
            if accumulate {
                for (d, &s) in dest[..len].iter_mut().zip(&self.time_scratch[..len]) {
                    *d += s;
                }
            } else {
                dest[..len].copy_from_slice(&self.time_scratch[..len]);
            }

            channel[..n].copy_from_slice(&self.time_scratch);
            channel[n..].fill(0.0);
        }

        self.state = BufferState::Time;
    }

    /// Full time-domain contents of one channel (N samples), valid after
    /// [`to_time_series`](SpectralBuffer::to_time_series).
    pub fn time_channel(&self, channel: usize) -> &[f32] {
        debug_assert!(self.state == BufferState::Time);
        &self.channels[channel][..self.fft.size()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn context() -> Arc<FftContext> {
        FftContext::new(64)
    }

    #[test]
    fn test_load_prepare_round_trip() {
        let fft = context();
        let signal: Vec<f32> = (0..40).map(|i| ((i * 13 + 5) % 17) as f32 / 8.5 - 1.0).collect();

        let mut buffer = SpectralBuffer::new(1, fft);
        buffer.load_time_series(&[&signal]);
        buffer.prepare_for_convolution();

        let mut restored = vec![vec![0.0f32; 64]];
        buffer.to_time_series(&mut restored, false);

        for (i, &s) in signal.iter().enumerate() {
            assert_abs_diff_eq!(restored[0][i], s, epsilon = 1e-4);
        }
        for &s in &restored[0][40..] {
            assert_abs_diff_eq!(s, 0.0, epsilon = 1e-4);
        }
    }

    #[test]
    #[should_panic(expected = "called twice")]
    fn test_double_prepare_panics() {
        let mut buffer = SpectralBuffer::new(1, context());
        buffer.load_time_series(&[vec![1.0f32; 8]]);
        buffer.prepare_for_convolution();
        buffer.prepare_for_convolution();
    }

    #[test]
    #[should_panic(expected = "mismatched transform sizes")]
    fn test_size_mismatch_panics() {
        let mut small = SpectralBuffer::new(1, FftContext::new(32));
        let mut big = SpectralBuffer::new(1, FftContext::new(64));
        small.load_time_series(&[vec![1.0f32; 8]]);
        small.prepare_for_convolution();
        big.load_time_series(&[vec![1.0f32; 8]]);
        big.prepare_for_convolution();

        let mut out = SpectralBuffer::new(1, FftContext::new(32));
        out.clear();
        out.convolve_accumulate(0, &small, 0, &big, 0);
    }

    #[test]
    fn test_identity_filter_reproduces_input() {
        let fft = context();
        let signal: Vec<f32> = (0..32).map(|i| (i as f32 * 0.37).sin()).collect();

        let mut input = SpectralBuffer::new(1, fft.clone());
        input.load_time_series(&[&signal]);
        input.prepare_for_convolution();

        let mut impulse = vec![0.0f32; 64];
        impulse[0] = 1.0;
        let mut filter = SpectralBuffer::new(1, fft.clone());
        filter.load_time_series(&[&impulse]);
        filter.prepare_for_convolution();

        let mut output = SpectralBuffer::new(1, fft);
        output.clear();
        output.convolve_accumulate(0, &input, 0, &filter, 0);

        let mut result = vec![vec![0.0f32; 64]];
        output.to_time_series(&mut result, false);

        for (i, &s) in signal.iter().enumerate() {
            assert_abs_diff_eq!(result[0][i], s, epsilon = 1e-3);
        }
    }

    #[test]
    fn test_delay_filter_shifts_input() {
        let fft = context();
        let signal: Vec<f32> = (0..24).map(|i| (i as f32 * 0.61).cos()).collect();
        let delay = 5usize;

        let mut input = SpectralBuffer::new(1, fft.clone());
        input.load_time_series(&[&signal]);
        input.prepare_for_convolution();

        let mut impulse = vec![0.0f32; 64];
        impulse[delay] = 1.0;
        let mut filter = SpectralBuffer::new(1, fft.clone());
        filter.load_time_series(&[&impulse]);
        filter.prepare_for_convolution();

        let mut output = SpectralBuffer::new(1, fft);
        output.clear();
        output.convolve_accumulate(0, &input, 0, &filter, 0);

        let mut result = vec![vec![0.0f32; 64]];
        output.to_time_series(&mut result, false);

        for i in 0..delay {
            assert_abs_diff_eq!(result[0][i], 0.0, epsilon = 1e-3);
        }
        for (i, &s) in signal.iter().enumerate() {
            assert_abs_diff_eq!(result[0][i + delay], s, epsilon = 1e-3);
        }
    }

    #[test]
    fn test_accumulation_sums_channels() {
        let fft = context();
        let a: Vec<f32> = (0..16).map(|i| i as f32 / 16.0).collect();
        let b: Vec<f32> = (0..16).map(|i| 1.0 - i as f32 / 16.0).collect();

        let mut input = SpectralBuffer::new(2, fft.clone());
        input.load_time_series(&[&a, &b]);
        input.prepare_for_convolution();

        let mut impulse = vec![0.0f32; 64];
        impulse[0] = 1.0;
        let mut filter = SpectralBuffer::new(1, fft.clone());
        filter.load_time_series(&[&impulse]);
        filter.prepare_for_convolution();

        let mut output = SpectralBuffer::new(1, fft);
        output.clear();
        output.convolve_accumulate(0, &input, 0, &filter, 0);
        output.convolve_accumulate(0, &input, 1, &filter, 0);

        let mut result = vec![vec![0.0f32; 64]];
        output.to_time_series(&mut result, false);

        for i in 0..16 {
            assert_abs_diff_eq!(result[0][i], a[i] + b[i], epsilon = 1e-3);
        }
    }
}

//! Beam rendering engine
//!
//! Owns the steering filter bank and the per-block convolution state for
//! every output beam, and publishes input snapshots for the background
//! DOA scanner. All mutating entry points take `&mut self`, so filter
//! updates are serialized with rendering by ownership; the only state
//! shared with the scan thread is the snapshot slot, touched through a
//! bounded, copy-scoped critical section.

use std::sync::Arc;

use crate::beam::{ArrayGeometry, FilterBank};
use crate::config::{BeamParams, EngineConfig};
use crate::doa::DoaScanner;
use crate::error::{BeamError, Result};
use crate::metering::PeakMeter;
use crate::snapshot::SnapshotSlot;
use crate::spectral::{FftContext, SpectralBuffer};

pub struct BeamEngine {
    config: EngineConfig,
    fft: Arc<FftContext>,
    beams: FilterBank,
    input_op: SpectralBuffer,
    accumulator: SpectralBuffer,
    /// Full N-sample convolution result for the beam being rendered
    full_block: Vec<f32>,
    /// Per-beam overlap-add carry (the convolution tail beyond the block)
    tails: Vec<Vec<f32>>,
    snapshot: Arc<SnapshotSlot>,
    input_meters: Vec<PeakMeter>,
    beam_meters: Vec<PeakMeter>,
}

impl BeamEngine {
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;

        let n = config.geometry.transform_size(config.block_size);
        let fft = FftContext::new(n);
        let num_mics = config.geometry.num_mics();

        let beam_params = vec![BeamParams::default(); config.num_beams];
        let meter = |_| {
            PeakMeter::new(
                config.meter.release_time_ms,
                config.geometry.sample_rate,
                config.block_size,
            )
        };

        Ok(Self {
            beams: FilterBank::new(config.geometry.clone(), fft.clone(), &beam_params),
            input_op: SpectralBuffer::new(num_mics, fft.clone()),
            accumulator: SpectralBuffer::new(1, fft.clone()),
            full_block: vec![0.0; n],
            tails: vec![vec![0.0; n]; config.num_beams],
            snapshot: Arc::new(SnapshotSlot::new(num_mics, config.block_size)),
            input_meters: (0..num_mics).map(meter).collect(),
            beam_meters: (0..config.num_beams).map(meter).collect(),
            fft,
            config,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn fft(&self) -> &Arc<FftContext> {
        &self.fft
    }

    /// Snapshot slot the render path publishes into; hand this to the
    /// scanner.
    pub fn snapshot_slot(&self) -> Arc<SnapshotSlot> {
        self.snapshot.clone()
    }

    /// Build a DOA scanner wired to this engine's geometry and snapshot
    /// feed. Spawn it yourself; stop and rebuild it after
    /// [`configure`](BeamEngine::configure).
    pub fn make_scanner(&self) -> DoaScanner {
        DoaScanner::new(&self.config, self.fft.clone(), self.snapshot.clone())
    }

    /// Replace the array geometry and rebuild every size-dependent
    /// buffer and filter. Beam steering parameters are preserved.
    pub fn configure(&mut self, geometry: ArrayGeometry) -> Result<()> {
        let params: Vec<BeamParams> =
            (0..self.beams.len()).map(|b| *self.beams.params(b)).collect();

        let mut config = self.config.clone();
        config.geometry = geometry;
        let mut rebuilt = Self::new(config)?;
        for (index, &p) in params.iter().enumerate() {
            rebuilt.set_beam_parameters(index, p, 1.0)?;
        }

        *self = rebuilt;
        Ok(())
    }

    /// Re-steer one output beam, blending with interpolation factor
    /// `alpha` to keep the transition click-free.
    pub fn set_beam_parameters(
        &mut self,
        index: usize,
        params: BeamParams,
        alpha: f32,
    ) -> Result<()> {
        self.beams.update(index, params, alpha)
    }

    pub fn beam_params(&self, index: usize) -> &BeamParams {
        self.beams.params(index)
    }

    /// Render one fixed-size block: each output channel receives its
    /// beam, formed by convolving every input channel against that
    /// beam's steering filter and overlap-adding the tail carried from
    /// previous blocks. Excess input channels or output beams on either
    /// side are ignored.
    pub fn render_block(&mut self, input: &[&[f32]], output: &mut [&mut [f32]]) -> Result<()> {
        let block = self.config.block_size;
        if let Some(len) = input.iter().map(|ch| ch.len()).max()
            && len > block
        {
            return Err(BeamError::BlockTooLarge { got: len, max: block });
        }

        for (meter, channel) in self.input_meters.iter_mut().zip(input) {
            meter.process_block(channel);
        }

        self.input_op.load_time_series(input);
        self.input_op.prepare_for_convolution();

        // Best-effort: dropped when the scanner is mid-copy.
        self.snapshot.try_publish(input);

        let n = self.fft.size();
        let active_inputs = self.config.geometry.num_mics().min(input.len());
        let beams_to_render = self.beams.len().min(output.len());

        for beam in 0..beams_to_render {
            self.full_block.fill(0.0);

            if active_inputs > 0 {
                self.accumulator.clear();
                for ch in 0..active_inputs {
                    self.accumulator
                        .convolve_accumulate(0, &self.input_op, ch, self.beams.filter(beam), ch);
                }
                self.accumulator
                    .to_time_series(&mut [self.full_block.as_mut_slice()], false);
            }

            let tail = &mut self.tails[beam];
            let out = &mut *output[beam];
            let emit = out.len().min(block);
            for i in 0..emit {
                out[i] = self.full_block[i] + tail[i];
            }

            // Carry the remainder of the convolution into future blocks.
            tail.copy_within(block.., 0);
            tail[n - block..].fill(0.0);
            for (carry, &tap) in tail.iter_mut().zip(&self.full_block[block..]) {
                *carry += tap;
            }

            self.beam_meters[beam].process_block(&out[..emit]);
        }

        Ok(())
    }

    /// Per-input-channel decaying peak meters.
    pub fn input_meters(&self) -> &[PeakMeter] {
        &self.input_meters
    }

    /// Per-beam decaying peak meters.
    pub fn beam_meters(&self) -> &[PeakMeter] {
        &self.beam_meters
    }
}

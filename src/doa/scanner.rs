//! Background direction-of-arrival scan loop
//!
//! Owns one precomputed steering filter per candidate direction and a
//! dedicated thread that, at a fixed target rate, convolves the latest
//! input snapshot against every grid cell, converts each scratch beam's
//! peak to decibels and publishes the completed grid wholesale.
//!
//! The loop is best-effort real time: a cycle that overruns the period
//! starts the next one immediately with no phase correction. Shutdown is
//! checked at every cycle boundary via the handle's channel.

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TryRecvError, bounded};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crate::beam::FilterBank;
use crate::config::{BeamParams, EngineConfig};
use crate::constants::{AMPLITUDE_FLOOR, DB_FLOOR};
use crate::doa::energy_map::{EnergyMap, EnergyMapSlot};
use crate::snapshot::{InputSnapshot, SnapshotSlot};
use crate::spectral::{FftContext, SpectralBuffer};

/// Steer value for one grid index, spanning [-1, 1] across the axis.
fn grid_steer(index: usize, count: usize) -> f32 {
    if count <= 1 {
        0.0
    } else {
        -1.0 + 2.0 * index as f32 / (count - 1) as f32
    }
}

pub struct DoaScanner {
    filters: FilterBank,
    input_op: SpectralBuffer,
    scratch: SpectralBuffer,
    beam_time: Vec<f32>,
    local: InputSnapshot,
    grid: EnergyMap,
    map: Arc<EnergyMapSlot>,
    snapshot: Arc<SnapshotSlot>,
    period: Duration,
    num_mics: usize,
    cycle: u64,
}

impl DoaScanner {
    /// Build the scanner and its per-cell filter bank. The candidate
    /// directions are fixed, so each filter is designed exactly once
    /// (full replacement, no blending).
    pub fn new(config: &EngineConfig, fft: Arc<FftContext>, snapshot: Arc<SnapshotSlot>) -> Self {
        let rows = config.doa.grid_rows;
        let cols = config.doa.grid_cols;

        let mut params = Vec::with_capacity(rows * cols);
        for row in 0..rows {
            for col in 0..cols {
                params.push(BeamParams::new(
                    grid_steer(col, cols),
                    grid_steer(row, rows),
                    config.doa.scan_width,
                ));
            }
        }

        let num_mics = config.geometry.num_mics();
        let n = fft.size();
        Self {
            filters: FilterBank::new(config.geometry.clone(), fft.clone(), &params),
            input_op: SpectralBuffer::new(num_mics, fft.clone()),
            scratch: SpectralBuffer::new(1, fft),
            beam_time: vec![0.0; n],
            local: InputSnapshot::new(num_mics, config.block_size),
            grid: EnergyMap::new(rows, cols),
            map: Arc::new(EnergyMapSlot::new(rows, cols)),
            snapshot,
            period: Duration::from_secs_f32(1.0 / config.doa.scan_rate_hz),
            num_mics,
            cycle: 0,
        }
    }

    /// Shared slot the scan thread publishes completed grids into.
    pub fn map(&self) -> Arc<EnergyMapSlot> {
        self.map.clone()
    }

    /// Move the scanner onto its background thread.
    pub fn spawn(self) -> ScannerHandle {
        let (shutdown_tx, shutdown_rx) = bounded::<()>(1);
        let map = self.map.clone();
        let thread = std::thread::Builder::new()
            .name("doa-scan".into())
            .spawn(move || self.run(shutdown_rx))
            .expect("failed to spawn DOA scan thread");

        ScannerHandle {
            shutdown: shutdown_tx,
            thread: Some(thread),
            map,
        }
    }

    fn run(mut self, shutdown: Receiver<()>) {
        log::info!(
            "DOA scan loop started: {}x{} grid at {:.1} Hz",
            self.grid.rows(),
            self.grid.cols(),
            1.0 / self.period.as_secs_f32()
        );

        loop {
            let cycle_start = Instant::now();

            if !self.scan_cycle() {
                log::debug!("scan cycle skipped: no input snapshot yet");
            }

            let elapsed = cycle_start.elapsed();
            match self.period.checked_sub(elapsed) {
                Some(remaining) => match shutdown.recv_timeout(remaining) {
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    Err(RecvTimeoutError::Timeout) => {}
                },
                None => {
                    // Overrun: start the next cycle immediately, no
                    // phase correction.
                    log::debug!("scan cycle overran the period: {:?}", elapsed);
                    match shutdown.try_recv() {
                        Ok(()) | Err(TryRecvError::Disconnected) => break,
                        Err(TryRecvError::Empty) => {}
                    }
                }
            }
        }

        log::info!("DOA scan loop stopped");
    }

    /// One full sweep over the grid. Returns `false` when no snapshot
    /// was available and the cycle was skipped.
    fn scan_cycle(&mut self) -> bool {
        if !self.snapshot.read_latest(&mut self.local) {
            return false;
        }

        self.input_op.load_time_series(&self.local.channels);
        self.input_op.prepare_for_convolution();

        for row in 0..self.grid.rows() {
            for col in 0..self.grid.cols() {
                let filter = self.filters.filter(row * self.grid.cols() + col);
                let active = self.num_mics.min(filter.num_channels());

                self.scratch.clear();
                for ch in 0..active {
                    self.scratch
                        .convolve_accumulate(0, &self.input_op, ch, filter, ch);
                }
                self.scratch
                    .to_time_series(&mut [self.beam_time.as_mut_slice()], false);

                let peak = self
                    .beam_time
                    .iter()
                    .fold(0.0f32, |acc, &s| acc.max(s.abs()));
                let db = (20.0 * peak.max(AMPLITUDE_FLOOR).log10()).max(DB_FLOOR);
                self.grid.set(row, col, db);
            }
        }

        self.cycle += 1;
        self.grid.set_generation(self.cycle);
        self.map.publish(&self.grid);
        true
    }
}

/// Owner handle for the scan thread; stops it promptly on drop.
pub struct ScannerHandle {
    shutdown: Sender<()>,
    thread: Option<JoinHandle<()>>,
    map: Arc<EnergyMapSlot>,
}

impl ScannerHandle {
    /// Latest published energy map slot, for display readers.
    pub fn map(&self) -> Arc<EnergyMapSlot> {
        self.map.clone()
    }

    /// Request shutdown and wait for the thread to finish its current
    /// cycle.
    pub fn stop(&mut self) {
        let _ = self.shutdown.try_send(());
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

impl Drop for ScannerHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_steer_spans_axis() {
        assert_eq!(grid_steer(0, 5), -1.0);
        assert_eq!(grid_steer(2, 5), 0.0);
        assert_eq!(grid_steer(4, 5), 1.0);
        assert_eq!(grid_steer(0, 1), 0.0);
    }

    #[test]
    fn test_cycle_skipped_without_snapshot() {
        let config = EngineConfig {
            block_size: 64,
            ..Default::default()
        };
        let fft = FftContext::new(config.geometry.transform_size(config.block_size));
        let snapshot = Arc::new(SnapshotSlot::new(config.geometry.num_mics(), 64));
        let mut scanner = DoaScanner::new(&config, fft, snapshot);

        assert!(!scanner.scan_cycle());
        assert_eq!(scanner.map.snapshot().generation(), 0);
    }
}

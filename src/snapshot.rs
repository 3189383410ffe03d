//! Live-input snapshot hand-off
//!
//! The audio path publishes a frozen copy of each processed block for
//! the background scan loop. Both sides touch the shared slot only for
//! the duration of a memcpy: the audio path uses `try_lock` and simply
//! skips the update when the scanner is mid-copy, so it can never block
//! on the scan thread.

use std::sync::Mutex;

/// A frozen multichannel block of recent input.
#[derive(Debug, Clone)]
pub struct InputSnapshot {
    pub channels: Vec<Vec<f32>>,
    /// Bumped on every publish; 0 means nothing published yet.
    pub generation: u64,
}

impl InputSnapshot {
    pub fn new(num_channels: usize, block_size: usize) -> Self {
        Self {
            channels: vec![vec![0.0; block_size]; num_channels],
            generation: 0,
        }
    }
}

pub struct SnapshotSlot {
    inner: Mutex<InputSnapshot>,
}

impl SnapshotSlot {
    pub fn new(num_channels: usize, block_size: usize) -> Self {
        Self {
            inner: Mutex::new(InputSnapshot::new(num_channels, block_size)),
        }
    }

    /// Copy the block into the slot if it is free right now. Returns
    /// `false` (and drops the update) when the reader holds the lock.
    pub fn try_publish(&self, input: &[&[f32]]) -> bool {
        let Ok(mut slot) = self.inner.try_lock() else {
            return false;
        };
        for (channel, source) in slot.channels.iter_mut().zip(input) {
            let len = channel.len().min(source.len());
            channel[..len].copy_from_slice(&source[..len]);
            channel[len..].fill(0.0);
        }
        slot.generation += 1;
        true
    }

    /// Copy the latest snapshot out into `dest`. Returns `false` if
    /// nothing has ever been published.
    pub fn read_latest(&self, dest: &mut InputSnapshot) -> bool {
        let slot = self.inner.lock().expect("snapshot slot poisoned");
        if slot.generation == 0 {
            return false;
        }
        dest.clone_from(&slot);
        true
    }
}

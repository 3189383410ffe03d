//! Directional energy map
//!
//! A 2-D grid of decibel energies (rows = vertical directions, columns
//! = horizontal directions), rewritten wholesale once per scan cycle.
//! Publication replaces the whole grid under a lock scoped strictly to
//! the copy, so a display reader can never observe cells from two
//! different cycles.

use std::sync::Mutex;

use crate::constants::DB_FLOOR;

#[derive(Debug, Clone, PartialEq)]
pub struct EnergyMap {
    rows: usize,
    cols: usize,
    cells: Vec<f32>,
    /// Scan cycle that produced this grid; 0 before the first publish.
    generation: u64,
}

impl EnergyMap {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            cells: vec![DB_FLOOR; rows * cols],
            generation: 0,
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn get(&self, row: usize, col: usize) -> f32 {
        self.cells[row * self.cols + col]
    }

    pub fn set(&mut self, row: usize, col: usize, db: f32) {
        self.cells[row * self.cols + col] = db;
    }

    pub fn set_generation(&mut self, generation: u64) {
        self.generation = generation;
    }

    pub fn cells(&self) -> &[f32] {
        &self.cells
    }

    /// Grid cell with the highest energy: `(row, col, db)`.
    pub fn peak(&self) -> (usize, usize, f32) {
        let mut best = (0, 0, f32::NEG_INFINITY);
        for row in 0..self.rows {
            for col in 0..self.cols {
                let db = self.get(row, col);
                if db > best.2 {
                    best = (row, col, db);
                }
            }
        }
        best
    }
}

/// Shared publication slot for the latest completed grid.
pub struct EnergyMapSlot {
    inner: Mutex<EnergyMap>,
}

impl EnergyMapSlot {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            inner: Mutex::new(EnergyMap::new(rows, cols)),
        }
    }

    /// Replace the published grid wholesale.
    pub fn publish(&self, map: &EnergyMap) {
        self.inner
            .lock()
            .expect("energy map slot poisoned")
            .clone_from(map);
    }

    /// Copy the latest published grid out into `dest`.
    pub fn read_into(&self, dest: &mut EnergyMap) {
        dest.clone_from(&self.inner.lock().expect("energy map slot poisoned"));
    }

    /// Clone of the latest published grid.
    pub fn snapshot(&self) -> EnergyMap {
        self.inner.lock().expect("energy map slot poisoned").clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_map_starts_at_floor() {
        let map = EnergyMap::new(3, 4);
        assert_eq!(map.cells().len(), 12);
        assert!(map.cells().iter().all(|&db| db == DB_FLOOR));
        assert_eq!(map.generation(), 0);
    }

    #[test]
    fn test_peak_finds_hottest_cell() {
        let mut map = EnergyMap::new(2, 3);
        map.set(0, 1, -20.0);
        map.set(1, 2, -5.0);
        assert_eq!(map.peak(), (1, 2, -5.0));
    }

    #[test]
    fn test_publish_replaces_whole_grid() {
        let slot = EnergyMapSlot::new(2, 2);
        let mut map = EnergyMap::new(2, 2);
        map.set(0, 0, -1.0);
        map.set(1, 1, -2.0);
        map.set_generation(7);
        slot.publish(&map);

        let seen = slot.snapshot();
        assert_eq!(seen, map);
    }
}

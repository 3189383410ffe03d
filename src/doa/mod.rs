pub mod energy_map;
pub mod scanner;

pub use energy_map::{EnergyMap, EnergyMapSlot};
pub use scanner::{DoaScanner, ScannerHandle};

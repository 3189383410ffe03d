pub mod beam;
pub mod config;
pub mod constants;
pub mod doa;
pub mod engine;
pub mod error;
pub mod metering;
pub mod snapshot;
pub mod spectral;
pub mod wav;

#[cfg(feature = "simulation")]
pub mod simulation;

pub use beam::ArrayGeometry;
pub use config::{BeamParams, EngineConfig};
pub use doa::{EnergyMap, EnergyMapSlot};
pub use engine::BeamEngine;
pub use error::{BeamError, Result};

//! Configuration for the beamgrid engine.
//!
//! All knobs live in plain structs with `Default` impls; the demo binary
//! can additionally load an [`EngineConfig`] from a TOML file. The array
//! geometry itself lives in [`crate::beam::geometry`] and is re-exported
//! here for config-file use.

use serde::Deserialize;

use crate::beam::geometry::ArrayGeometry;
use crate::error::{BeamError, Result};

/// Beam steering parameters.
///
/// `steer_x` / `steer_y` are broadside offset fractions along each array
/// axis in `[-1, 1]` (±1 = end-fire). `width` in `[0, 1]` controls the
/// spatial taper: 0 keeps the full aperture (sharpest beam), 1 mutes half
/// the array's extent at each axis end.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct BeamParams {
    pub steer_x: f32,
    pub steer_y: f32,
    pub width: f32,
}

impl BeamParams {
    pub fn new(steer_x: f32, steer_y: f32, width: f32) -> Self {
        Self {
            steer_x,
            steer_y,
            width,
        }
    }

    /// Copy with every field clamped into its legal range.
    pub fn clamped(&self) -> Self {
        Self {
            steer_x: self.steer_x.clamp(-1.0, 1.0),
            steer_y: self.steer_y.clamp(-1.0, 1.0),
            width: self.width.clamp(0.0, 1.0),
        }
    }
}

impl Default for BeamParams {
    fn default() -> Self {
        Self {
            steer_x: 0.0,
            steer_y: 0.0,
            width: 0.0,
        }
    }
}

/// Direction-of-arrival scan configuration
///
/// The scanner sweeps a `grid_rows` × `grid_cols` grid of candidate
/// directions spanning steer `[-1, 1]` on each axis and refreshes the
/// energy map at `scan_rate_hz`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DoaConfig {
    /// Vertical candidate directions (rows of the energy map)
    pub grid_rows: usize,
    /// Horizontal candidate directions (columns of the energy map)
    pub grid_cols: usize,
    /// Target energy-map refresh rate in Hz
    pub scan_rate_hz: f32,
    /// Fixed beam width used for every candidate-direction filter
    pub scan_width: f32,
}

impl Default for DoaConfig {
    fn default() -> Self {
        Self {
            grid_rows: 5,
            grid_cols: 9,
            scan_rate_hz: 10.0,
            scan_width: 0.2,
        }
    }
}

/// Level-meter configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MeterConfig {
    /// Peak release time constant in milliseconds
    pub release_time_ms: f32,
}

impl Default for MeterConfig {
    fn default() -> Self {
        Self {
            release_time_ms: 200.0,
        }
    }
}

/// Top-level engine configuration
///
/// # Example
/// ```
/// use beamgrid::config::EngineConfig;
///
/// let mut config = EngineConfig::default();
/// config.num_beams = 4;
/// config.validate().unwrap();
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Microphone array geometry
    pub geometry: ArrayGeometry,
    /// Fixed processing block size in samples
    pub block_size: usize,
    /// Number of simultaneously rendered output beams
    pub num_beams: usize,
    /// Direction-of-arrival scan configuration
    pub doa: DoaConfig,
    /// Level-meter configuration
    pub meter: MeterConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            geometry: ArrayGeometry::default(),
            block_size: 512,
            num_beams: 2,
            doa: DoaConfig::default(),
            meter: MeterConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Load a configuration from a TOML file, falling back to defaults
    /// for any omitted field.
    pub fn from_toml_file(path: &std::path::Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| BeamError::Config(format!("{}: {}", path.display(), e)))?;
        let config: Self =
            toml::from_str(&text).map_err(|e| BeamError::Config(format!("{}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Check structural invariants that the engine relies on.
    pub fn validate(&self) -> Result<()> {
        self.geometry.validate()?;
        if self.block_size == 0 {
            return Err(BeamError::Config("block_size must be positive".into()));
        }
        if self.num_beams == 0 {
            return Err(BeamError::Config("num_beams must be positive".into()));
        }
        if self.doa.grid_rows == 0 || self.doa.grid_cols == 0 {
            return Err(BeamError::Config(
                "DOA grid must have at least one row and column".into(),
            ));
        }
        if self.doa.scan_rate_hz <= 0.0 {
            return Err(BeamError::Config("scan_rate_hz must be positive".into()));
        }
        Ok(())
    }
}

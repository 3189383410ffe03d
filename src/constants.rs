//! Numeric constants shared across the beamforming pipeline
//!
//! These constants define margins, floors and reference levels used
//! throughout filter synthesis and energy mapping.

/// Extra taps added at each end of the designed FIR so that the earliest
/// arrival still maps to a realizable (non-negative) tap index and the
/// window ramps have room to decay the fractional-delay tails.
pub const CAUSALITY_MARGIN_TAPS: usize = 8;

/// Lower clamp for decibel conversions, applied before `log10` so that a
/// silent scratch beam produces a finite energy value.
pub const DB_FLOOR: f32 = -120.0;

/// Minimum linear amplitude corresponding to `DB_FLOOR`.
pub const AMPLITUDE_FLOOR: f32 = 1e-6;

/// Epsilon guarding the taper-mask power renormalization against an
/// all-muted (zero-power) mask.
pub const MASK_POWER_EPSILON: f32 = 1e-12;

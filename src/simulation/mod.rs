//! Synthetic array-capture generation for tests and the demo binary.

pub mod noise;
pub mod signal;

pub use noise::add_gaussian_noise;
pub use signal::{capture_far_field, multitone, source_delays};

pub mod buffer;
pub mod context;
pub mod window;

pub use buffer::SpectralBuffer;
pub use context::FftContext;
pub use window::design_tukey_window;

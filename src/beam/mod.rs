pub mod filter_bank;
pub mod geometry;
pub mod synthesis;

pub use filter_bank::FilterBank;
pub use geometry::ArrayGeometry;
pub use synthesis::FilterSynthesizer;

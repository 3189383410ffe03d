use thiserror::Error;

#[derive(Error, Debug)]
pub enum BeamError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Filter design failed: {0}")]
    FilterDesign(String),

    #[error("Beam index {index} out of range (have {count} beams)")]
    BeamIndex { index: usize, count: usize },

    #[error("Block too large: {got} samples, engine renders at most {max}")]
    BlockTooLarge { got: usize, max: usize },

    #[error("Scan loop error: {0}")]
    ScanLoop(String),

    #[error("WAV file error: {0}")]
    Wav(String),
}

pub type Result<T> = std::result::Result<T, BeamError>;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum HomographyError {
    #[error("too few points: need {needed}, got {got}")]
    TooFewPoints { needed: usize, got: usize },
    #[error("source and destination point counts differ: {src} vs {dst}")]
    LengthMismatch { src: usize, dst: usize },
    #[error("numerical failure: {0}")]
    NumericalFailure(String),
    #[error("insufficient inliers: need {needed}, found {found} of {total}")]
    InsufficientInliers { needed: usize, found: usize, total: usize },
    #[error("implausible warp: {0}")]
    Implausible(String),
}

pub type HomographyResult<T> = Result<T, HomographyError>;

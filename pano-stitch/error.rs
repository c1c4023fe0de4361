use pano_brief::BriefError;
use pano_fast::FastError;
use pano_geometry::HomographyError;
use pano_match::MatchError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StitchError {
    #[error("invalid frame {width}x{height}: expected {expected_len} bytes of RGBA, got {actual_len}")]
    InvalidDimensions {
        width: u32,
        height: u32,
        expected_len: usize,
        actual_len: usize,
    },
    #[error("not enough alignable frames to build a panorama ({usable} usable, need 2)")]
    InsufficientFrames { usable: usize },
    #[error("panorama of {width}x{height} exceeds the output limit ({max_pixels} pixels)")]
    OutputTooLarge { width: u64, height: u64, max_pixels: u64 },
    #[error("PNG encoding failed: {0}")]
    Encoding(String),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
    #[error("feature detection failed: {0}")]
    Fast(#[from] FastError),
    #[error("descriptor extraction failed: {0}")]
    Brief(#[from] BriefError),
}

pub type StitchResult<T> = Result<T, StitchError>;

/// Why a pair of consecutive frames could not be aligned.
///
/// Recorded in the pair report; the panorama is cut before the pair.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PairFailure {
    #[error("too few matches: found {found}, need {needed}")]
    TooFewMatches { found: usize, needed: usize },
    #[error(transparent)]
    Homography(#[from] HomographyError),
}

impl From<MatchError> for PairFailure {
    fn from(err: MatchError) -> Self {
        match err {
            MatchError::TooFewMatches { found, needed } => PairFailure::TooFewMatches { found, needed },
        }
    }
}

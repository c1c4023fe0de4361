//! FAST corner detection for panorama feature extraction.
//!
//! Corners are found with the FAST-9 segment test, ranked by Harris response,
//! thinned with non-maximum suppression and capped to a per-image budget. Each
//! surviving corner gets an intensity-centroid orientation for steered BRIEF.

pub mod corner_detection;
pub mod detector;
pub mod error;
pub mod pyramid;
pub mod refinement;
pub mod types;
pub mod utils;

pub use corner_detection::CornerDetector;
pub use detector::FastDetector;
pub use error::{FastError, FastResult};
pub use pyramid::ImagePyramid;
pub use refinement::KeypointRefinement;
pub use types::{ScaleLevel, ScoredKeypoint};

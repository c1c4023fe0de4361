//! Geometric alignment of overlapping frames.
//!
//! - [`homography`]: the [`Homography`] type and the normalized DLT solver
//! - [`ransac`]: robust, seed-deterministic fitting in the presence of outliers

pub mod error;
pub mod homography;
pub mod ransac;

pub use error::{HomographyError, HomographyResult};
pub use homography::{estimate_homography_dlt, Homography, Point};
pub use ransac::{fit_homography_ransac, RansacConfig, RansacResult};

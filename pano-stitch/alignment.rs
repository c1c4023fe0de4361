//! Pairwise registration of consecutive frames and chaining of the pair
//! homographies into one transform per frame.

use crate::config::StitchConfig;
use crate::error::PairFailure;
use crate::features::FrameFeatures;
use crate::frame_store::Frame;
use pano_geometry::{fit_homography_ransac, Homography, HomographyError, Point};
use pano_match::match_pair;
use rayon::prelude::*;

/// Outcome of aligning frame `index + 1` onto frame `index`
#[derive(Debug, Clone, PartialEq)]
pub struct PairReport {
    pub index: usize,
    /// Correspondences that survived the matcher
    pub matches: usize,
    pub inliers: usize,
    /// Maps frame `index + 1` into frame `index`
    pub homography: Option<Homography>,
    pub failure: Option<PairFailure>,
}

impl PairReport {
    pub fn is_aligned(&self) -> bool {
        self.failure.is_none()
    }

    fn failed(index: usize, matches: usize, inliers: usize, failure: PairFailure) -> Self {
        Self { index, matches, inliers, homography: None, failure: Some(failure) }
    }
}

/// Transforms of the alignable prefix of the frame sequence
#[derive(Debug, Clone, PartialEq)]
pub struct Alignment {
    /// `transforms[k]` maps frame `k` into frame 0; one entry per used frame
    pub transforms: Vec<Homography>,
    /// One report per consecutive pair
    pub pairs: Vec<PairReport>,
    /// Keypoints found per frame
    pub keypoint_counts: Vec<usize>,
}

impl Alignment {
    /// Number of leading frames that made it into the panorama
    pub fn used_frames(&self) -> usize {
        self.transforms.len()
    }

    /// First pair that could not be aligned, which ends the panorama
    pub fn first_failure(&self) -> Option<&PairReport> {
        self.pairs.iter().find(|p| !p.is_aligned())
    }
}

/// Match features of frame `index` (query) against frame `index + 1` (train)
/// and fit the homography taking frame `index + 1` into frame `index`.
pub fn align_pair(index: usize, a: &FrameFeatures, b: &FrameFeatures, next_frame: &Frame, config: &StitchConfig) -> PairReport {
    let matches = match match_pair(&a.descriptors, &b.descriptors, &config.matching) {
        Ok(m) => m,
        Err(e) => return PairReport::failed(index, 0, 0, e.into()),
    };

    let src: Vec<Point> = matches.iter().map(|c| b.point(c.train)).collect();
    let dst: Vec<Point> = matches.iter().map(|c| a.point(c.query)).collect();

    let fit = match fit_homography_ransac(&src, &dst, &config.ransac.for_stream(index as u64)) {
        Ok(fit) => fit,
        Err(e) => return PairReport::failed(index, matches.len(), 0, e.into()),
    };

    if let Err(e) = fit.h.check_plausible(next_frame.width(), next_frame.height()) {
        return PairReport::failed(index, matches.len(), fit.n_inliers, e.into());
    }

    log::debug!(
        "pair {}-{}: {} matches, {} inliers, translation ({:.1}, {:.1})",
        index,
        index + 1,
        matches.len(),
        fit.n_inliers,
        fit.h.translation().0,
        fit.h.translation().1
    );

    PairReport {
        index,
        matches: matches.len(),
        inliers: fit.n_inliers,
        homography: Some(fit.h),
        failure: None,
    }
}

/// Align every consecutive pair and chain the transforms up to the first failure.
pub fn align_frames(frames: &[Frame], features: &[FrameFeatures], config: &StitchConfig) -> Alignment {
    let mut pairs: Vec<PairReport> = (0..frames.len().saturating_sub(1))
        .into_par_iter()
        .map(|i| align_pair(i, &features[i], &features[i + 1], &frames[i + 1], config))
        .collect();

    let mut transforms = Vec::with_capacity(frames.len());
    if !frames.is_empty() {
        transforms.push(Homography::identity());
    }

    for pair in pairs.iter_mut() {
        let Some(h) = pair.homography else {
            break;
        };
        let Some(previous) = transforms.last() else {
            break;
        };
        let global = previous.compose(&h);

        // The chained transform must stay invertible and in front of the camera
        let frame = &frames[pair.index + 1];
        if global.inverse().is_none() || global.warp_corners(frame.width(), frame.height()).is_none() {
            pair.homography = None;
            pair.failure = Some(PairFailure::Homography(HomographyError::Implausible(
                "chained transform is degenerate".into(),
            )));
            break;
        }
        transforms.push(global);
    }

    for pair in pairs.iter().filter(|p| !p.is_aligned()) {
        if let Some(failure) = &pair.failure {
            log::warn!("frames {} and {} could not be aligned: {}", pair.index, pair.index + 1, failure);
        }
    }

    Alignment {
        transforms,
        pairs,
        keypoint_counts: features.iter().map(FrameFeatures::len).collect(),
    }
}

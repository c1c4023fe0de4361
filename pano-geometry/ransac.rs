use crate::error::{HomographyError, HomographyResult};
use crate::homography::{estimate_homography_dlt, Homography, Point};
use rand::{rngs::StdRng, SeedableRng};
use rayon::prelude::*;
use std::cmp::Ordering;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// RANSAC configuration for homography fitting.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RansacConfig {
    /// Number of minimal samples drawn.
    pub max_iters: usize,
    /// Inlier threshold (reprojection error in pixels).
    pub inlier_threshold: f64,
    /// Minimum number of inliers for a valid model.
    pub min_inliers: usize,
    /// Minimum fraction of correspondences that must be inliers.
    pub min_inlier_ratio: f64,
    /// Random seed.
    pub seed: u64,
}

impl Default for RansacConfig {
    fn default() -> Self {
        Self {
            max_iters: 1000,
            inlier_threshold: 3.0,
            min_inliers: 8,
            min_inlier_ratio: 0.25,
            seed: 0x5eed,
        }
    }
}

impl RansacConfig {
    /// Copy of this configuration with the seed mixed with `stream`, so that
    /// independent problems (e.g. frame pairs) draw independent samples.
    pub fn for_stream(&self, stream: u64) -> Self {
        // SplitMix64 finalizer
        let mut z = self.seed ^ stream.wrapping_add(1).wrapping_mul(0x9e37_79b9_7f4a_7c15);
        z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
        Self { seed: z ^ (z >> 31), ..self.clone() }
    }
}

/// Result of RANSAC homography fitting.
#[derive(Debug, Clone)]
pub struct RansacResult {
    /// The fitted homography, mapping `src` onto `dst`.
    pub h: Homography,
    /// Boolean mask: true for inliers.
    pub inlier_mask: Vec<bool>,
    /// Number of inliers.
    pub n_inliers: usize,
    /// Mean squared reprojection error over the inliers.
    pub residual: f64,
    /// Index of the winning minimal sample.
    pub trial: usize,
}

impl RansacResult {
    pub fn inlier_ratio(&self) -> f64 {
        if self.inlier_mask.is_empty() {
            0.0
        } else {
            self.n_inliers as f64 / self.inlier_mask.len() as f64
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Candidate {
    trial: usize,
    h: Homography,
    n_inliers: usize,
    residual: f64,
}

impl Candidate {
    /// Total order: more inliers, then lower residual, then earlier trial
    fn rank(&self, other: &Candidate) -> Ordering {
        other
            .n_inliers
            .cmp(&self.n_inliers)
            .then_with(|| self.residual.total_cmp(&other.residual))
            .then_with(|| self.trial.cmp(&other.trial))
    }

    fn better(self, other: Candidate) -> Candidate {
        if self.rank(&other) == Ordering::Greater {
            other
        } else {
            self
        }
    }
}

/// Inlier count and mean squared inlier error of `h`
fn score(h: &Homography, src: &[Point], dst: &[Point], threshold: f64) -> (usize, f64) {
    let mut count = 0usize;
    let mut sum_sq = 0.0f64;
    for (s, d) in src.iter().zip(dst.iter()) {
        let err = h.reprojection_error(s, d);
        if err < threshold {
            count += 1;
            sum_sq += err * err;
        }
    }
    let residual = if count > 0 { sum_sq / count as f64 } else { f64::INFINITY };
    (count, residual)
}

/// True when three of the four points are (nearly) collinear
fn is_degenerate(pts: &[Point; 4]) -> bool {
    const MIN_TWICE_AREA: f64 = 1e-2;
    for i in 0..4 {
        for j in (i + 1)..4 {
            for k in (j + 1)..4 {
                let (a, b, c) = (pts[i], pts[j], pts[k]);
                let cross = (b[0] - a[0]) * (c[1] - a[1]) - (b[1] - a[1]) * (c[0] - a[0]);
                if cross.abs() < MIN_TWICE_AREA {
                    return true;
                }
            }
        }
    }
    false
}

/// Fit homography with RANSAC.
///
/// All minimal samples are drawn up front from the seeded generator and then
/// scored in parallel. The winner is chosen with a total order, so the result
/// depends only on the inputs and the seed, never on thread scheduling.
pub fn fit_homography_ransac(src: &[Point], dst: &[Point], config: &RansacConfig) -> HomographyResult<RansacResult> {
    if src.len() != dst.len() {
        return Err(HomographyError::LengthMismatch { src: src.len(), dst: dst.len() });
    }
    let n = src.len();
    if n < 4 {
        return Err(HomographyError::TooFewPoints { needed: 4, got: n });
    }

    let mut rng = StdRng::seed_from_u64(config.seed);
    let samples: Vec<[usize; 4]> = (0..config.max_iters)
        .map(|_| {
            let idx = rand::seq::index::sample(&mut rng, n, 4);
            [idx.index(0), idx.index(1), idx.index(2), idx.index(3)]
        })
        .collect();

    let best = samples
        .par_iter()
        .enumerate()
        .filter_map(|(trial, idx)| {
            let s4 = idx.map(|i| src[i]);
            let d4 = idx.map(|i| dst[i]);
            if is_degenerate(&s4) || is_degenerate(&d4) {
                return None;
            }
            let h = estimate_homography_dlt(&s4, &d4).ok()?;
            let (n_inliers, residual) = score(&h, src, dst, config.inlier_threshold);
            Some(Candidate { trial, h, n_inliers, residual })
        })
        .reduce_with(Candidate::better);

    let best = best.ok_or(HomographyError::InsufficientInliers {
        needed: config.min_inliers,
        found: 0,
        total: n,
    })?;

    let ratio = best.n_inliers as f64 / n as f64;
    if best.n_inliers < config.min_inliers.max(4) || ratio < config.min_inlier_ratio {
        return Err(HomographyError::InsufficientInliers {
            needed: config.min_inliers.max((config.min_inlier_ratio * n as f64).ceil() as usize),
            found: best.n_inliers,
            total: n,
        });
    }

    // Refit using all inliers
    let (inlier_src, inlier_dst): (Vec<Point>, Vec<Point>) = src
        .iter()
        .zip(dst.iter())
        .filter(|(s, d)| best.h.reprojection_error(s, d) < config.inlier_threshold)
        .map(|(s, d)| (*s, *d))
        .unzip();

    let chosen = match estimate_homography_dlt(&inlier_src, &inlier_dst) {
        Ok(h_refit) => {
            let (n_inliers, residual) = score(&h_refit, src, dst, config.inlier_threshold);
            if n_inliers >= best.n_inliers {
                Candidate { trial: best.trial, h: h_refit, n_inliers, residual }
            } else {
                best
            }
        }
        Err(_) => best,
    };

    let inlier_mask: Vec<bool> = src
        .iter()
        .zip(dst.iter())
        .map(|(s, d)| chosen.h.reprojection_error(s, d) < config.inlier_threshold)
        .collect();

    log::debug!(
        "ransac: {} of {} inliers (trial {}, mse {:.4})",
        chosen.n_inliers,
        n,
        chosen.trial,
        chosen.residual
    );

    Ok(RansacResult {
        h: chosen.h,
        inlier_mask,
        n_inliers: chosen.n_inliers,
        residual: chosen.residual,
        trial: chosen.trial,
    })
}

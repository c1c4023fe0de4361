//! Projective transforms and their estimation from point correspondences via
//! the normalized Direct Linear Transform.

use crate::error::{HomographyError, HomographyResult};
use nalgebra::{Matrix3, SMatrix, SVector, SymmetricEigen, Vector3};
use std::ops::Mul;

/// 2D point in pixel coordinates
pub type Point = [f64; 2];

const PROJECTION_EPS: f64 = 1e-12;

/// Warped frames may shrink or grow by at most this factor in area
const MAX_AREA_RATIO: f64 = 4.0;

/// 3x3 projective transform, kept normalized so that `h[(2, 2)] == 1` when possible
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Homography(Matrix3<f64>);

impl Default for Homography {
    fn default() -> Self {
        Self::identity()
    }
}

impl Homography {
    pub fn identity() -> Self {
        Self(Matrix3::identity())
    }

    pub fn from_translation(tx: f64, ty: f64) -> Self {
        Self(Matrix3::new(1.0, 0.0, tx, 0.0, 1.0, ty, 0.0, 0.0, 1.0))
    }

    /// Wrap a matrix, rescaling it so the bottom-right entry is 1
    pub fn from_matrix(m: Matrix3<f64>) -> Self {
        let scale = m[(2, 2)];
        if scale.abs() > 1e-15 {
            Self(m / scale)
        } else {
            Self(m)
        }
    }

    pub fn matrix(&self) -> &Matrix3<f64> {
        &self.0
    }

    /// Translation component `(h02, h12)`
    pub fn translation(&self) -> (f64, f64) {
        (self.0[(0, 2)], self.0[(1, 2)])
    }

    /// Map `(x, y)`; `None` when the point lands on or behind the horizon
    pub fn project(&self, x: f64, y: f64) -> Option<Point> {
        let p = self.0 * Vector3::new(x, y, 1.0);
        if p[2] <= PROJECTION_EPS {
            return None;
        }
        Some([p[0] / p[2], p[1] / p[2]])
    }

    pub fn inverse(&self) -> Option<Self> {
        self.0.try_inverse().map(Self::from_matrix)
    }

    /// `self * other`: apply `other` first, then `self`
    pub fn compose(&self, other: &Homography) -> Self {
        Self::from_matrix(self.0 * other.0)
    }

    /// Distance between the projection of `src` and `dst`; infinite if `src` does not project
    pub fn reprojection_error(&self, src: &Point, dst: &Point) -> f64 {
        match self.project(src[0], src[1]) {
            Some(p) => ((p[0] - dst[0]).powi(2) + (p[1] - dst[1]).powi(2)).sqrt(),
            None => f64::INFINITY,
        }
    }

    /// Pixel-centre corners of a `width x height` frame, in clockwise order
    pub fn frame_corners(width: u32, height: u32) -> [Point; 4] {
        let (w, h) = ((width.max(1) - 1) as f64, (height.max(1) - 1) as f64);
        [[0.0, 0.0], [w, 0.0], [w, h], [0.0, h]]
    }

    /// Warped frame corners, or `None` if any corner fails to project
    pub fn warp_corners(&self, width: u32, height: u32) -> Option<[Point; 4]> {
        let c = Self::frame_corners(width, height);
        Some([
            self.project(c[0][0], c[0][1])?,
            self.project(c[1][0], c[1][1])?,
            self.project(c[2][0], c[2][1])?,
            self.project(c[3][0], c[3][1])?,
        ])
    }

    /// Reject warps that fold, flip or wildly rescale a `width x height` frame.
    pub fn check_plausible(&self, width: u32, height: u32) -> HomographyResult<()> {
        let quad = self
            .warp_corners(width, height)
            .ok_or_else(|| HomographyError::Implausible("frame corner maps behind the horizon".into()))?;

        let src_area = polygon_area(&Self::frame_corners(width, height));
        if src_area <= 0.0 {
            return Ok(());
        }

        // Convex, orientation-preserving quadrilateral: every turn has the same positive sign
        for i in 0..4 {
            let (a, b, c) = (quad[i], quad[(i + 1) % 4], quad[(i + 2) % 4]);
            let cross = (b[0] - a[0]) * (c[1] - b[1]) - (b[1] - a[1]) * (c[0] - b[0]);
            if cross <= 0.0 {
                return Err(HomographyError::Implausible("warped frame is folded or mirrored".into()));
            }
        }

        let ratio = polygon_area(&quad) / src_area;
        if !(1.0 / MAX_AREA_RATIO..=MAX_AREA_RATIO).contains(&ratio) {
            return Err(HomographyError::Implausible(format!("area scales by {:.3}", ratio)));
        }
        Ok(())
    }
}

impl Mul for Homography {
    type Output = Homography;

    fn mul(self, rhs: Homography) -> Homography {
        self.compose(&rhs)
    }
}

/// Shoelace area of a simple polygon
fn polygon_area(pts: &[Point]) -> f64 {
    let n = pts.len();
    let twice: f64 = (0..n)
        .map(|i| {
            let (a, b) = (pts[i], pts[(i + 1) % n]);
            a[0] * b[1] - b[0] * a[1]
        })
        .sum();
    twice.abs() / 2.0
}

/// Translate the centroid to the origin and scale the mean distance to sqrt(2).
fn normalize_points(pts: &[Point]) -> (Matrix3<f64>, Vec<Point>) {
    let n = pts.len() as f64;
    let cx = pts.iter().map(|p| p[0]).sum::<f64>() / n;
    let cy = pts.iter().map(|p| p[1]).sum::<f64>() / n;

    let mean_dist = pts
        .iter()
        .map(|p| ((p[0] - cx).powi(2) + (p[1] - cy).powi(2)).sqrt())
        .sum::<f64>()
        / n;

    let s = if mean_dist > 1e-15 {
        std::f64::consts::SQRT_2 / mean_dist
    } else {
        1.0
    };

    let t = Matrix3::new(s, 0.0, -s * cx, 0.0, s, -s * cy, 0.0, 0.0, 1.0);
    let normalized = pts.iter().map(|p| [s * (p[0] - cx), s * (p[1] - cy)]).collect();
    (t, normalized)
}

/// Estimate the homography `H` with `dst ≈ H(src)` from at least four correspondences.
///
/// With more than four points this is the algebraic least-squares solution:
/// the eigenvector of the smallest eigenvalue of `AᵀA`, accumulated row by row.
pub fn estimate_homography_dlt(src: &[Point], dst: &[Point]) -> HomographyResult<Homography> {
    if src.len() != dst.len() {
        return Err(HomographyError::LengthMismatch { src: src.len(), dst: dst.len() });
    }
    if src.len() < 4 {
        return Err(HomographyError::TooFewPoints { needed: 4, got: src.len() });
    }

    let (t_src, src_n) = normalize_points(src);
    let (t_dst, dst_n) = normalize_points(dst);

    let mut ata = SMatrix::<f64, 9, 9>::zeros();
    for (s, d) in src_n.iter().zip(dst_n.iter()) {
        let (sx, sy) = (s[0], s[1]);
        let (dx, dy) = (d[0], d[1]);
        let r1 = SVector::<f64, 9>::from_column_slice(&[0.0, 0.0, 0.0, -sx, -sy, -1.0, dy * sx, dy * sy, dy]);
        let r2 = SVector::<f64, 9>::from_column_slice(&[sx, sy, 1.0, 0.0, 0.0, 0.0, -dx * sx, -dx * sy, -dx]);
        ata += r1 * r1.transpose() + r2 * r2.transpose();
    }

    let eig = SymmetricEigen::new(ata);
    let min_idx = eig.eigenvalues.iamin();
    let v = eig.eigenvectors.column(min_idx);
    let h_norm = Matrix3::new(v[0], v[1], v[2], v[3], v[4], v[5], v[6], v[7], v[8]);

    // Denormalize: H = T_dst^-1 * H_norm * T_src
    let t_dst_inv = t_dst
        .try_inverse()
        .ok_or_else(|| HomographyError::NumericalFailure("destination normalization not invertible".into()))?;
    let h = t_dst_inv * h_norm * t_src;

    if h[(2, 2)].abs() < 1e-12 || h.iter().any(|v| !v.is_finite()) {
        return Err(HomographyError::NumericalFailure("degenerate homography".into()));
    }
    Ok(Homography::from_matrix(h))
}

use pano_core::Keypoint;
use crate::types::{CornerType, ScoredKeypoint};
use crate::utils::has_consecutive_bits;
use rayon::prelude::*;

/// Corner detection algorithms (FAST and Harris)
pub struct CornerDetector;

impl CornerDetector {
    /// FAST circle offsets for corner detection
    pub const FAST_OFFSETS: [(i32, i32); 16] = [
        (0, -3), (1, -3), (2, -2), (3, -1),
        (3, 0), (3, 1), (2, 2), (1, 3),
        (0, 3), (-1, 3), (-2, 2), (-3, 1),
        (-3, 0), (-3, -1), (-2, -2), (-1, -3),
    ];

    /// Contiguous arc length of the segment test (FAST-9)
    pub const ARC_LENGTH: usize = 9;

    const HARRIS_K: f64 = 0.04;

    /// Detect FAST corners at least `border` pixels away from every image edge.
    ///
    /// Rows are scanned in parallel; the result is in raster order regardless of
    /// the number of worker threads.
    pub fn detect_corners(
        img: &[u8],
        width: usize,
        height: usize,
        threshold: u8,
        border: usize,
        harris_scoring: bool,
    ) -> Vec<ScoredKeypoint> {
        let border = border.max(3);
        if width <= 2 * border || height <= 2 * border {
            return Vec::new();
        }

        (border..height - border)
            .into_par_iter()
            .flat_map_iter(|y| {
                let mut row = Vec::new();
                for x in border..width - border {
                    if Self::classify(img, width, x, y, threshold) == CornerType::None {
                        continue;
                    }
                    let response = if harris_scoring {
                        Self::compute_harris_response(img, width, height, x, y)
                    } else {
                        Self::compute_arc_response(img, width, x, y, threshold)
                    };
                    // Negative Harris response means an edge, not a corner
                    if response > 0.0 {
                        row.push(ScoredKeypoint {
                            keypoint: Keypoint { x: x as f32, y: y as f32, angle: 0.0 },
                            response,
                        });
                    }
                }
                row
            })
            .collect()
    }

    /// Segment test: at least nine contiguous circle pixels all brighter or all darker
    pub(crate) fn classify(img: &[u8], width: usize, x: usize, y: usize, threshold: u8) -> CornerType {
        let center = img[y * width + x] as i16;
        let high = center + threshold as i16;
        let low = center - threshold as i16;
        let sample = |i: usize| {
            let (dx, dy) = Self::FAST_OFFSETS[i];
            let px = (x as i32 + dx) as usize;
            let py = (y as i32 + dy) as usize;
            img[py * width + px] as i16
        };

        // A nine-pixel arc always covers two of the four compass pixels
        let compass = [sample(0), sample(4), sample(8), sample(12)];
        let bright_compass = compass.iter().filter(|&&v| v > high).count();
        let dark_compass = compass.iter().filter(|&&v| v < low).count();
        if bright_compass < 2 && dark_compass < 2 {
            return CornerType::None;
        }

        let mut bright = 0u16;
        let mut dark = 0u16;
        for i in 0..16 {
            let v = sample(i);
            if v > high {
                bright |= 1 << i;
            } else if v < low {
                dark |= 1 << i;
            }
        }

        if has_consecutive_bits(bright, Self::ARC_LENGTH) {
            CornerType::Bright
        } else if has_consecutive_bits(dark, Self::ARC_LENGTH) {
            CornerType::Dark
        } else {
            CornerType::None
        }
    }

    /// Mean squared contrast of the circle pixels that pass the threshold
    pub fn compute_arc_response(img: &[u8], width: usize, x: usize, y: usize, threshold: u8) -> f32 {
        let center = img[y * width + x] as f32;
        let mut sum_diff = 0.0f32;
        let mut count = 0;

        for &(dx, dy) in Self::FAST_OFFSETS.iter() {
            let px = (x as i32 + dx) as usize;
            let py = (y as i32 + dy) as usize;
            let diff = (center - img[py * width + px] as f32).abs();
            if diff > threshold as f32 {
                sum_diff += diff * diff;
                count += 1;
            }
        }

        if count > 0 {
            sum_diff / count as f32
        } else {
            0.0
        }
    }

    /// Harris corner response `det(M) - k * trace(M)^2` over a 5x5 window.
    ///
    /// Returns 0 when the window does not fit inside the image.
    pub fn compute_harris_response(img: &[u8], width: usize, height: usize, x: usize, y: usize) -> f32 {
        if x < 3 || y < 3 || x + 3 >= width || y + 3 >= height {
            return 0.0;
        }

        let mut ixx = 0.0f64;
        let mut ixy = 0.0f64;
        let mut iyy = 0.0f64;

        for ny in y - 2..=y + 2 {
            for nx in x - 2..=x + 2 {
                let (gx, gy) = Self::sobel(img, width, nx, ny);
                ixx += (gx * gx) as f64;
                ixy += (gx * gy) as f64;
                iyy += (gy * gy) as f64;
            }
        }

        let det = ixx * iyy - ixy * ixy;
        let trace = ixx + iyy;
        (det - Self::HARRIS_K * trace * trace) as f32
    }

    /// Sobel gradients at an interior pixel, scaled by 1/8
    fn sobel(img: &[u8], width: usize, x: usize, y: usize) -> (f32, f32) {
        let p = |xx: usize, yy: usize| img[yy * width + xx] as f32;

        let gx = p(x + 1, y - 1) + 2.0 * p(x + 1, y) + p(x + 1, y + 1)
            - p(x - 1, y - 1) - 2.0 * p(x - 1, y) - p(x - 1, y + 1);
        let gy = p(x - 1, y + 1) + 2.0 * p(x, y + 1) + p(x + 1, y + 1)
            - p(x - 1, y - 1) - 2.0 * p(x, y - 1) - p(x + 1, y - 1);

        (gx / 8.0, gy / 8.0)
    }
}

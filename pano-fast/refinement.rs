use pano_core::Image;
use crate::types::ScoredKeypoint;
use std::cmp::Ordering;

/// Non-maximum suppression, ranking and orientation of detected corners
pub struct KeypointRefinement;

impl KeypointRefinement {
    /// Keep corners that have the strongest response inside a square window of
    /// half-size `radius`. Equal responses are resolved in favour of the corner
    /// that comes first in raster order, so exactly one survives a plateau.
    pub fn non_maximum_suppression(
        keypoints: &[ScoredKeypoint],
        width: usize,
        height: usize,
        radius: usize,
    ) -> Vec<ScoredKeypoint> {
        if keypoints.is_empty() || radius == 0 {
            return keypoints.to_vec();
        }

        // Response map; NaN marks "no corner here"
        let mut map = vec![f32::NAN; width * height];
        for kp in keypoints {
            let (x, y) = (kp.keypoint.x as usize, kp.keypoint.y as usize);
            map[y * width + x] = kp.response;
        }

        keypoints
            .iter()
            .filter(|kp| {
                let (x, y) = (kp.keypoint.x as usize, kp.keypoint.y as usize);
                let own = y * width + x;
                let x0 = x.saturating_sub(radius);
                let y0 = y.saturating_sub(radius);
                let x1 = (x + radius).min(width - 1);
                let y1 = (y + radius).min(height - 1);

                for ny in y0..=y1 {
                    for nx in x0..=x1 {
                        let idx = ny * width + nx;
                        let other = map[idx];
                        if idx == own || other.is_nan() {
                            continue;
                        }
                        if other > kp.response || (other == kp.response && idx < own) {
                            return false;
                        }
                    }
                }
                true
            })
            .copied()
            .collect()
    }

    /// Sort by descending response (raster order on ties) and keep the best `max_count`
    pub fn retain_strongest(keypoints: &mut Vec<ScoredKeypoint>, max_count: usize) {
        keypoints.sort_by(|a, b| {
            b.response
                .partial_cmp(&a.response)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.keypoint.y.total_cmp(&b.keypoint.y))
                .then_with(|| a.keypoint.x.total_cmp(&b.keypoint.x))
        });
        keypoints.truncate(max_count);
    }

    /// Compute orientation for keypoint using intensity centroid method
    pub fn compute_orientation(img: &Image, width: usize, height: usize, x: f32, y: f32, patch_size: usize) -> f32 {
        let half = (patch_size / 2) as i64;
        let (cx, cy) = (x.round() as i64, y.round() as i64);

        // Patch must fit within image bounds
        if cx - half < 0 || cy - half < 0 || cx + half >= width as i64 || cy + half >= height as i64 {
            return 0.0;
        }

        let mut m10 = 0i64;
        let mut m01 = 0i64;
        for dy in -half..=half {
            let row = ((cy + dy) as usize) * width;
            for dx in -half..=half {
                let val = img[row + (cx + dx) as usize] as i64;
                m10 += dx * val;
                m01 += dy * val;
            }
        }

        if m10 == 0 && m01 == 0 {
            0.0
        } else {
            (m01 as f32).atan2(m10 as f32)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pano_core::Keypoint;

    fn scored(x: usize, y: usize, response: f32) -> ScoredKeypoint {
        ScoredKeypoint {
            keypoint: Keypoint { x: x as f32, y: y as f32, angle: 0.0 },
            response,
        }
    }

    #[test]
    fn test_nms_keeps_local_maximum() {
        let kps = vec![scored(10, 10, 5.0), scored(11, 10, 9.0), scored(12, 11, 3.0), scored(30, 30, 1.0)];
        let kept = KeypointRefinement::non_maximum_suppression(&kps, 40, 40, 3);
        assert_eq!(kept, vec![scored(11, 10, 9.0), scored(30, 30, 1.0)]);
    }

    #[test]
    fn test_nms_plateau_keeps_first_in_raster_order() {
        let kps = vec![scored(10, 10, 4.0), scored(11, 10, 4.0), scored(10, 11, 4.0)];
        let kept = KeypointRefinement::non_maximum_suppression(&kps, 20, 20, 2);
        assert_eq!(kept, vec![scored(10, 10, 4.0)]);
    }

    #[test]
    fn test_nms_enforces_spacing() {
        let kps: Vec<_> = (0..20).map(|i| scored(5 + i, 5 + (i % 3), (i * 7 % 11) as f32 + 1.0)).collect();
        let kept = KeypointRefinement::non_maximum_suppression(&kps, 40, 40, 3);
        for (i, a) in kept.iter().enumerate() {
            for b in &kept[i + 1..] {
                let dx = (a.keypoint.x - b.keypoint.x).abs();
                let dy = (a.keypoint.y - b.keypoint.y).abs();
                assert!(dx > 3.0 || dy > 3.0, "Keypoints too close after NMS");
            }
        }
    }

    #[test]
    fn test_retain_strongest_is_deterministic() {
        let mut kps = vec![scored(3, 9, 1.0), scored(8, 2, 5.0), scored(1, 2, 5.0), scored(4, 4, 2.0)];
        KeypointRefinement::retain_strongest(&mut kps, 3);
        assert_eq!(kps, vec![scored(1, 2, 5.0), scored(8, 2, 5.0), scored(4, 4, 2.0)]);
    }

    #[test]
    fn test_orientation_points_to_bright_side() {
        let (w, h) = (21, 21);
        let mut img = vec![10u8; w * h];
        for y in 0..h {
            for x in 11..w {
                img[y * w + x] = 200;
            }
        }
        let angle = KeypointRefinement::compute_orientation(&img, w, h, 10.0, 10.0, 15);
        assert!(angle.abs() < 1e-3, "angle {}", angle);

        let angle = KeypointRefinement::compute_orientation(&img, w, h, 2.0, 10.0, 15);
        assert_eq!(angle, 0.0);
    }
}

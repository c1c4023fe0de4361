use crate::error::StitchResult;
use crate::frame_store::Frame;
use pano_brief::BriefGenerator;
use pano_core::{luma_from_rgba, Descriptor, FeatureConfig, Keypoint};
use pano_fast::{FastDetector, ImagePyramid};
use pano_geometry::Point;
use rayon::prelude::*;

/// Keypoints of one frame, in full-resolution frame coordinates, with their descriptors
#[derive(Debug, Clone, Default)]
pub struct FrameFeatures {
    pub keypoints: Vec<Keypoint>,
    pub descriptors: Vec<Descriptor>,
}

impl FrameFeatures {
    pub fn len(&self) -> usize {
        self.keypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keypoints.is_empty()
    }

    pub fn point(&self, index: usize) -> Point {
        let kp = &self.keypoints[index];
        [kp.x as f64, kp.y as f64]
    }
}

/// Detect and describe keypoints of a single frame.
///
/// Frames larger than `analysis_max_dimension` are analysed on a bilinearly
/// downsampled copy; coordinates are mapped back to the full frame.
pub fn extract_features(frame: &Frame, config: &FeatureConfig, analysis_max_dimension: usize) -> StitchResult<FrameFeatures> {
    let (width, height) = (frame.width() as usize, frame.height() as usize);
    let luma = luma_from_rgba(frame.pixels());

    let level = ImagePyramid::analysis_level(width, height, analysis_max_dimension);
    let analysis = ImagePyramid::downsample(&luma, width, height, &level)?;

    let detector = FastDetector::new(config.clone(), level.width, level.height)?;
    let mut keypoints = detector.detect_keypoints(&analysis)?;
    let descriptors = BriefGenerator::new(level.width, level.height)?.generate_descriptors(&analysis, &keypoints)?;

    if level.width != width || level.height != height {
        let sx = width as f32 / level.width as f32;
        let sy = height as f32 / level.height as f32;
        for kp in keypoints.iter_mut() {
            kp.x = (kp.x + 0.5) * sx - 0.5;
            kp.y = (kp.y + 0.5) * sy - 0.5;
        }
    }

    log::debug!(
        "frame {}: {} keypoints ({}x{} analysed at {}x{})",
        frame.id(),
        keypoints.len(),
        width,
        height,
        level.width,
        level.height
    );

    Ok(FrameFeatures { keypoints, descriptors })
}

/// [`extract_features`] for every frame, in parallel; output is in frame order
pub fn extract_all(frames: &[Frame], config: &FeatureConfig, analysis_max_dimension: usize) -> StitchResult<Vec<FrameFeatures>> {
    frames
        .par_iter()
        .map(|frame| extract_features(frame, config, analysis_max_dimension))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    fn blocks_frame(width: u32, height: u32, seed: u64) -> Frame {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut pixels = vec![0u8; (width * height * 4) as usize];
        for px in pixels.chunks_exact_mut(4) {
            px.copy_from_slice(&[90, 90, 90, 255]);
        }
        for _ in 0..40 {
            let (bw, bh) = (rng.gen_range(6..24), rng.gen_range(6..24));
            let x0 = rng.gen_range(0..width - bw);
            let y0 = rng.gen_range(0..height - bh);
            let color: [u8; 4] = [rng.gen_range(0..255), rng.gen_range(0..255), rng.gen_range(0..255), 255];
            for y in y0..y0 + bh {
                for x in x0..x0 + bw {
                    let i = ((y * width + x) * 4) as usize;
                    pixels[i..i + 4].copy_from_slice(&color);
                }
            }
        }
        Frame::new(0, &pixels, width, height).unwrap()
    }

    #[test]
    fn test_uniform_frame_has_no_features() {
        let frame = Frame::new(0, &vec![128u8; 64 * 48 * 4], 64, 48).unwrap();
        let features = extract_features(&frame, &FeatureConfig::default(), 1024).unwrap();
        assert!(features.is_empty());
        assert!(features.descriptors.is_empty());
    }

    #[test]
    fn test_textured_frame_has_features_inside_border() {
        let frame = blocks_frame(160, 120, 3);
        let cfg = FeatureConfig::default();
        let features = extract_features(&frame, &cfg, 1024).unwrap();
        assert!(!features.is_empty());
        assert_eq!(features.keypoints.len(), features.descriptors.len());
        let border = cfg.border() as f32;
        for kp in &features.keypoints {
            assert!(kp.x >= border && kp.x < 160.0 - border);
            assert!(kp.y >= border && kp.y < 120.0 - border);
        }
    }

    #[test]
    fn test_downsampled_analysis_maps_back_to_frame() {
        let frame = blocks_frame(320, 240, 8);
        let features = extract_features(&frame, &FeatureConfig::default(), 160).unwrap();
        assert!(!features.is_empty());
        for kp in &features.keypoints {
            assert!(kp.x >= 0.0 && kp.x < 320.0);
            assert!(kp.y >= 0.0 && kp.y < 240.0);
        }
        assert!(features.keypoints.iter().any(|kp| kp.x > 160.0));
    }

    #[test]
    fn test_keypoint_budget() {
        let frame = blocks_frame(160, 120, 5);
        let cfg = FeatureConfig { max_keypoints: 5, ..FeatureConfig::default() };
        let features = extract_features(&frame, &cfg, 1024).unwrap();
        assert!(features.len() <= 5);
    }

    #[test]
    fn test_extract_all_keeps_frame_order() {
        let frames = vec![blocks_frame(96, 96, 1), blocks_frame(96, 96, 2)];
        let cfg = FeatureConfig::default();
        let all = extract_all(&frames, &cfg, 1024).unwrap();
        let single = extract_features(&frames[1], &cfg, 1024).unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[1].descriptors, single.descriptors);
    }
}

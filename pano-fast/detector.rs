use pano_core::{FeatureConfig, Image, Keypoint};
use crate::corner_detection::CornerDetector;
use crate::error::{FastError, FastResult};
use crate::refinement::KeypointRefinement;
use crate::types::ScoredKeypoint;

/// FAST-9 corner detector with Harris ranking, NMS and a per-image keypoint budget
#[derive(Debug, Clone)]
pub struct FastDetector {
    cfg: FeatureConfig,
    w: usize,
    h: usize,
}

impl FastDetector {
    /// Creates a new FAST detector with validation
    pub fn new(cfg: FeatureConfig, width: usize, height: usize) -> FastResult<Self> {
        if width == 0 || height == 0 {
            return Err(FastError::InvalidImageSize { width, height });
        }

        // 0 would detect everything, >127 could overflow the signed comparisons
        if cfg.threshold == 0 || cfg.threshold > 127 {
            return Err(FastError::InvalidThreshold(cfg.threshold));
        }

        if cfg.patch_size % 2 == 0 || cfg.patch_size < 3 {
            return Err(FastError::InvalidPatchSize(cfg.patch_size));
        }

        Ok(Self { cfg, w: width, h: height })
    }

    /// Validates image data before processing
    fn validate_image(&self, img: &Image) -> FastResult<()> {
        let expected_len = self.w * self.h;
        if img.len() != expected_len {
            return Err(FastError::InvalidImageData {
                expected_len,
                actual_len: img.len(),
            });
        }
        Ok(())
    }

    /// Detect oriented keypoints, strongest first
    pub fn detect_keypoints(&self, img: &Image) -> FastResult<Vec<Keypoint>> {
        let scored = self.detect_keypoints_with_response(img)?;
        Ok(scored.into_iter().map(|sk| sk.keypoint).collect())
    }

    /// Detect oriented keypoints together with their corner response
    pub fn detect_keypoints_with_response(&self, img: &Image) -> FastResult<Vec<ScoredKeypoint>> {
        self.validate_image(img)?;

        let corners = CornerDetector::detect_corners(
            img,
            self.w,
            self.h,
            self.cfg.threshold,
            self.cfg.border(),
            self.cfg.harris_scoring,
        );
        let mut kept = KeypointRefinement::non_maximum_suppression(&corners, self.w, self.h, self.cfg.nms_radius);
        KeypointRefinement::retain_strongest(&mut kept, self.cfg.max_keypoints);

        for sk in kept.iter_mut() {
            sk.keypoint.angle = KeypointRefinement::compute_orientation(
                img,
                self.w,
                self.h,
                sk.keypoint.x,
                sk.keypoint.y,
                self.cfg.patch_size,
            );
        }

        Ok(kept)
    }

    /// Get detector configuration
    pub fn config(&self) -> &FeatureConfig {
        &self.cfg
    }

    /// Get image dimensions
    pub fn dimensions(&self) -> (usize, usize) {
        (self.w, self.h)
    }
}

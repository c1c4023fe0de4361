use crate::config::StitchConfig;
use crate::error::StitchResult;
use crate::Stitcher;

/// Builder for creating a [`Stitcher`]
#[derive(Debug, Clone, Default)]
pub struct StitcherBuilder {
    config: StitchConfig,
}

impl StitcherBuilder {
    /// Create a new builder with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the FAST threshold (1-127)
    pub fn threshold(mut self, threshold: u8) -> Self {
        self.config.features.threshold = threshold;
        self
    }

    /// Set the patch size for orientation calculation
    pub fn patch_size(mut self, patch_size: usize) -> Self {
        self.config.features.patch_size = patch_size;
        self
    }

    /// Set the number of worker threads
    pub fn threads(mut self, n_threads: usize) -> Self {
        self.config.features.n_threads = n_threads;
        self
    }

    /// Set the per-frame keypoint budget
    pub fn max_keypoints(mut self, max_keypoints: usize) -> Self {
        self.config.features.max_keypoints = max_keypoints;
        self
    }

    /// Set the non-maximum suppression radius
    pub fn nms_radius(mut self, radius: usize) -> Self {
        self.config.features.nms_radius = radius;
        self
    }

    /// Enable or disable Harris corner scoring
    pub fn harris_scoring(mut self, enable: bool) -> Self {
        self.config.features.harris_scoring = enable;
        self
    }

    /// Longest frame side used for feature analysis (0 analyses at full size)
    pub fn analysis_max_dimension(mut self, max_dimension: usize) -> Self {
        self.config.analysis_max_dimension = max_dimension;
        self
    }

    /// Set the largest accepted Hamming distance
    pub fn max_distance(mut self, max_distance: u32) -> Self {
        self.config.matching.max_distance = max_distance;
        self
    }

    /// Set the nearest/second-nearest ratio
    pub fn ratio(mut self, ratio: f32) -> Self {
        self.config.matching.ratio = ratio;
        self
    }

    /// Enable or disable mutual nearest-neighbour matching
    pub fn cross_check(mut self, enable: bool) -> Self {
        self.config.matching.cross_check = enable;
        self
    }

    pub fn min_matches(mut self, min_matches: usize) -> Self {
        self.config.matching.min_matches = min_matches;
        self
    }

    /// Set the number of RANSAC samples
    pub fn ransac_iterations(mut self, max_iters: usize) -> Self {
        self.config.ransac.max_iters = max_iters;
        self
    }

    /// Set the RANSAC reprojection threshold in pixels
    pub fn inlier_threshold(mut self, threshold: f64) -> Self {
        self.config.ransac.inlier_threshold = threshold;
        self
    }

    pub fn min_inliers(mut self, min_inliers: usize) -> Self {
        self.config.ransac.min_inliers = min_inliers;
        self
    }

    pub fn min_inlier_ratio(mut self, ratio: f64) -> Self {
        self.config.ransac.min_inlier_ratio = ratio;
        self
    }

    /// Set the RANSAC seed
    pub fn seed(mut self, seed: u64) -> Self {
        self.config.ransac.seed = seed;
        self
    }

    pub fn max_output_pixels(mut self, max_pixels: u64) -> Self {
        self.config.compositor.max_output_pixels = max_pixels;
        self
    }

    pub fn max_output_dimension(mut self, max_dimension: u32) -> Self {
        self.config.compositor.max_output_dimension = max_dimension;
        self
    }

    /// Apply the fast preset, keeping the thread count and seed
    pub fn preset_fast(self) -> Self {
        self.with_preset(StitchConfig::fast_preset())
    }

    /// Apply the balanced preset, keeping the thread count and seed
    pub fn preset_balanced(self) -> Self {
        self.with_preset(StitchConfig::balanced_preset())
    }

    /// Apply the precise preset, keeping the thread count and seed
    pub fn preset_precise(self) -> Self {
        self.with_preset(StitchConfig::precise_preset())
    }

    fn with_preset(mut self, mut preset: StitchConfig) -> Self {
        preset.features.n_threads = self.config.features.n_threads;
        preset.ransac.seed = self.config.ransac.seed;
        self.config = preset;
        self
    }

    /// Validate the configuration and build the [`Stitcher`]
    pub fn build(self) -> StitchResult<Stitcher> {
        Stitcher::new(self.config)
    }

    /// Generate a summary of the builder's configuration
    pub fn summary(&self) -> String {
        self.config.summary()
    }

    /// Create a builder from an existing `StitchConfig`
    pub fn from_config(config: StitchConfig) -> Self {
        Self { config }
    }

    /// Convert the builder into a `StitchConfig`
    pub fn to_config(self) -> StitchConfig {
        self.config
    }

    pub fn config(&self) -> &StitchConfig {
        &self.config
    }
}

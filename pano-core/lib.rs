#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Row-major 8-bit grayscale image
pub type Image = Vec<u8>;

/// Key-point ≙ FAST corner + orientation (radians), in frame pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Keypoint {
    pub x: f32,
    pub y: f32,
    pub angle: f32,
}

/// 256-bit binary descriptor = 32 bytes
pub type Descriptor = [u8; 32];

/// Number of binary tests packed into a [`Descriptor`]
pub const DESCRIPTOR_BITS: usize = 256;

/// Radius of the disc holding every descriptor sampling point
pub const DESCRIPTOR_RADIUS: usize = 13;

/// Settings shared by the feature detection and description stages
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FeatureConfig {
    /// FAST intensity threshold
    pub threshold: u8,
    /// Side of the square patch used for orientation (odd)
    pub patch_size: usize,
    pub n_threads: usize,
    /// Upper bound on keypoints kept per frame
    pub max_keypoints: usize,
    /// Half-size of the non-maximum suppression window
    pub nms_radius: usize,
    /// Rank corners by Harris response instead of FAST arc contrast
    pub harris_scoring: bool,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            threshold: 20,
            patch_size: 31,
            n_threads: num_cpus::get().max(1),
            max_keypoints: 2000,
            nms_radius: 3,
            harris_scoring: true,
        }
    }
}

impl FeatureConfig {
    /// Pixels kept clear of the image edge so orientation patches and
    /// descriptor samples stay inside the frame
    pub fn border(&self) -> usize {
        (self.patch_size / 2 + 3).max(DESCRIPTOR_RADIUS)
    }
}

/// Convert an RGBA8 buffer to luma using integer BT.601 weights.
pub fn luma_from_rgba(rgba: &[u8]) -> Image {
    rgba.chunks_exact(4)
        .map(|px| ((77 * px[0] as u32 + 150 * px[1] as u32 + 29 * px[2] as u32) >> 8) as u8)
        .collect()
}

/// Build a dedicated Rayon thread pool with the specified number of threads
pub fn build_thread_pool(n_threads: usize) -> Result<rayon::ThreadPool, rayon::ThreadPoolBuildError> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(n_threads.max(1))
        .build()
}

//! Panorama stitching engine.
//!
//! Frames are added one at a time with [`Stitcher::add_frame`]. On
//! [`Stitcher::stitch`] every frame is described with FAST/BRIEF features,
//! consecutive frames are matched and aligned with a RANSAC homography, and
//! the alignable prefix of the sequence is warped into the coordinate system
//! of the first frame, feather-blended and encoded as PNG.
//!
//! ```no_run
//! use pano_stitch::Stitcher;
//!
//! # fn frames() -> Vec<(Vec<u8>, u32, u32)> { Vec::new() }
//! let mut stitcher = Stitcher::default();
//! for (rgba, w, h) in frames() {
//!     stitcher.add_frame(&rgba, w, h)?;
//! }
//! let png = stitcher.stitch()?;
//! # Ok::<(), pano_stitch::StitchError>(())
//! ```

pub mod alignment;
pub mod builder;
pub mod compositor;
pub mod config;
pub mod encoder;
pub mod error;
pub mod features;
pub mod frame_store;
#[cfg(feature = "wasm")]
pub mod wasm;

pub use alignment::{Alignment, PairReport};
pub use builder::StitcherBuilder;
pub use compositor::{Canvas, CanvasBounds};
pub use config::{CompositorConfig, StitchConfig};
pub use error::{PairFailure, StitchError, StitchResult};
pub use frame_store::{Frame, FrameStore};

pub use pano_core::{FeatureConfig, Keypoint};
pub use pano_geometry::{Homography, RansacConfig};
pub use pano_match::MatchConfig;

use image::RgbaImage;
use std::time::Instant;

/// A composited, not yet encoded panorama
#[derive(Debug, Clone)]
pub struct Panorama {
    pub image: RgbaImage,
    /// Position of the canvas in the coordinate system of frame 0
    pub bounds: CanvasBounds,
    pub alignment: Alignment,
}

impl Panorama {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn frames_used(&self) -> usize {
        self.alignment.used_frames()
    }

    pub fn to_png(&self) -> StitchResult<Vec<u8>> {
        encoder::encode_png(&self.image)
    }
}

/// Stateful stitching engine owning the ingested frames
#[derive(Debug, Clone, Default)]
pub struct Stitcher {
    config: StitchConfig,
    store: FrameStore,
}

impl Stitcher {
    /// Create a stitcher after validating `config`
    pub fn new(config: StitchConfig) -> StitchResult<Self> {
        config.validate()?;
        Ok(Self { config, store: FrameStore::new() })
    }

    pub fn builder() -> StitcherBuilder {
        StitcherBuilder::new()
    }

    pub fn config(&self) -> &StitchConfig {
        &self.config
    }

    /// Append an RGBA8 frame of `width * height * 4` bytes
    pub fn add_frame(&mut self, pixels: &[u8], width: u32, height: u32) -> StitchResult<()> {
        let id = self.store.push(pixels, width, height)?;
        log::debug!("added frame {} ({}x{}), {} total", id, width, height, self.store.len());
        Ok(())
    }

    /// Drop every frame
    pub fn clear(&mut self) {
        self.store.clear();
        log::debug!("cleared all frames");
    }

    pub fn frame_count(&self) -> u32 {
        self.store.len() as u32
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    pub fn frames(&self) -> std::slice::Iter<'_, Frame> {
        self.store.iter()
    }

    pub fn get(&self, index: usize) -> Option<&Frame> {
        self.store.get(index)
    }

    /// Stitch all frames and encode the result as PNG.
    ///
    /// Returns an empty buffer when fewer than two frames can be aligned.
    pub fn stitch(&self) -> StitchResult<Vec<u8>> {
        match self.stitch_panorama() {
            Ok(panorama) => panorama.to_png(),
            Err(StitchError::InsufficientFrames { usable }) => {
                log::info!("nothing to stitch ({} usable frames)", usable);
                Ok(Vec::new())
            }
            Err(e) => Err(e),
        }
    }

    /// Stitch all frames without encoding
    pub fn stitch_panorama(&self) -> StitchResult<Panorama> {
        let start = Instant::now();
        let frames = self.store.as_slice();
        if frames.len() < 2 {
            return Err(StitchError::InsufficientFrames { usable: frames.len() });
        }

        let panorama = self.run_parallel(|| -> StitchResult<Panorama> {
            let alignment = self.align(frames)?;
            let used = alignment.used_frames();
            if used < 2 {
                return Err(StitchError::InsufficientFrames { usable: used });
            }
            let (image, bounds) =
                compositor::composite(&frames[..used], &alignment.transforms, &self.config.compositor)?;
            Ok(Panorama { image, bounds, alignment })
        })??;

        log::info!(
            "stitched {} of {} frames into {}x{} in {:.2?}",
            panorama.frames_used(),
            frames.len(),
            panorama.width(),
            panorama.height(),
            start.elapsed()
        );
        Ok(panorama)
    }

    /// Feature extraction, matching and homography estimation only
    pub fn estimate_alignment(&self) -> StitchResult<Alignment> {
        let frames = self.store.as_slice();
        if frames.len() < 2 {
            return Err(StitchError::InsufficientFrames { usable: frames.len() });
        }
        self.run_parallel(|| self.align(frames))?
    }

    /// Must run inside the pool of [`Self::run_parallel`]
    fn align(&self, frames: &[Frame]) -> StitchResult<Alignment> {
        let features = features::extract_all(frames, &self.config.features, self.config.analysis_max_dimension)?;
        Ok(alignment::align_frames(frames, &features, &self.config))
    }

    /// Run `op` on a dedicated pool of `n_threads` workers
    fn run_parallel<T: Send>(&self, op: impl FnOnce() -> T + Send) -> StitchResult<T> {
        match pano_core::build_thread_pool(self.config.features.n_threads) {
            Ok(pool) => Ok(pool.install(op)),
            // Targets without thread support run on the caller's thread
            Err(_) if cfg!(target_arch = "wasm32") => Ok(op()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_and_single_frame_yield_empty_output() {
        let mut stitcher = Stitcher::default();
        assert!(stitcher.stitch().unwrap().is_empty());
        assert!(matches!(
            stitcher.stitch_panorama(),
            Err(StitchError::InsufficientFrames { usable: 0 })
        ));

        stitcher.add_frame(&[128; 16 * 16 * 4], 16, 16).unwrap();
        assert!(stitcher.stitch().unwrap().is_empty());
        assert!(matches!(
            stitcher.estimate_alignment(),
            Err(StitchError::InsufficientFrames { usable: 1 })
        ));
    }

    #[test]
    fn test_featureless_frames_are_not_an_error() {
        let mut stitcher = Stitcher::default();
        stitcher.add_frame(&[128; 32 * 32 * 4], 32, 32).unwrap();
        stitcher.add_frame(&[128; 32 * 32 * 4], 32, 32).unwrap();
        let alignment = stitcher.estimate_alignment().unwrap();
        assert_eq!(alignment.used_frames(), 1);
        assert_eq!(alignment.keypoint_counts, vec![0, 0]);
        assert!(stitcher.stitch().unwrap().is_empty());
    }

    #[test]
    fn test_accessors_and_clear() {
        let mut stitcher = Stitcher::default();
        assert!(stitcher.is_empty());
        stitcher.add_frame(&[1; 2 * 2 * 4], 2, 2).unwrap();
        stitcher.add_frame(&[2; 3 * 4], 3, 1).unwrap();
        assert!(stitcher.add_frame(&[2; 5], 3, 1).is_err());
        assert_eq!(stitcher.frame_count(), 2);
        assert_eq!(stitcher.get(1).map(Frame::dimensions), Some((3, 1)));
        assert_eq!(stitcher.frames().count(), 2);

        stitcher.clear();
        assert_eq!(stitcher.frame_count(), 0);
        assert!(stitcher.get(0).is_none());
    }

    #[test]
    fn test_work_runs_on_a_pool_of_the_configured_size() {
        let stitcher = StitcherBuilder::new().threads(3).build().unwrap();
        let threads = stitcher.run_parallel(rayon::current_num_threads).unwrap();
        assert_eq!(threads, 3);
        assert!(stitcher.run_parallel(|| rayon::current_thread_index().is_some()).unwrap());
    }

    #[test]
    fn test_panorama_alignment_matches_standalone_alignment() {
        let (w, h) = (96u32, 64u32);
        let frame: Vec<u8> = (0..w * h)
            .flat_map(|i| {
                let (x, y) = (i % w, i / w);
                let v = if ((x / 8) + (y / 8)) % 2 == 0 { 40 } else { 200 };
                [v, v, v, 255]
            })
            .collect();
        let mut stitcher = StitcherBuilder::new().threads(2).build().unwrap();
        stitcher.add_frame(&frame, w, h).unwrap();
        stitcher.add_frame(&frame, w, h).unwrap();

        let alignment = stitcher.estimate_alignment().unwrap();
        match stitcher.stitch_panorama() {
            Ok(panorama) => {
                assert_eq!(panorama.alignment.used_frames(), alignment.used_frames());
                assert_eq!(panorama.alignment.transforms, alignment.transforms);
            }
            Err(StitchError::InsufficientFrames { usable }) => assert_eq!(usable, alignment.used_frames()),
            Err(e) => panic!("unexpected error: {}", e),
        }
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let mut cfg = StitchConfig::default();
        cfg.ransac.max_iters = 0;
        assert!(matches!(Stitcher::new(cfg), Err(StitchError::InvalidConfig(_))));
    }
}

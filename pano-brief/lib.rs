//! Steered BRIEF descriptors.
//!
//! Each descriptor packs 256 intensity comparisons between point pairs of a
//! fixed sampling pattern, rotated by the keypoint orientation and evaluated on
//! a box-filtered copy of the image. Only the sign of each difference is kept,
//! which makes the descriptor insensitive to brightness offsets and gain.

use image::GrayImage;
use imageproc::filter::box_filter;
use pano_core::{Descriptor, Image, Keypoint, DESCRIPTOR_BITS, DESCRIPTOR_RADIUS};
use rand::{rngs::StdRng, Rng, SeedableRng};
use rayon::prelude::*;
use thiserror::Error;

const DESCRIPTOR_SIZE: usize = DESCRIPTOR_BITS / 8;

/// Sampling pairs stay inside this radius so rotated pairs never leave the patch
pub const PATTERN_RADIUS: f32 = DESCRIPTOR_RADIUS as f32;

/// Half-size of the box filter applied before sampling
pub const SMOOTHING_RADIUS: u32 = 2;

const PATTERN_SEED: u64 = 0x0b71_ef5e_ed00_0256;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum BriefError {
    #[error("Invalid image dimensions: {width}x{height} (must be > 0)")]
    InvalidImageSize { width: usize, height: usize },
    #[error("Image data length mismatch: expected {expected_len}, got {actual_len}")]
    InvalidImageData { expected_len: usize, actual_len: usize },
}

pub type BriefResult<T> = Result<T, BriefError>;

/// Number of differing bits between two descriptors
#[inline]
pub fn hamming_distance(a: &Descriptor, b: &Descriptor) -> u32 {
    a.iter().zip(b.iter()).map(|(x, y)| (x ^ y).count_ones()).sum()
}

pub struct BriefGenerator {
    w: usize,
    h: usize,
    pattern: Vec<[f32; 4]>,
}

impl BriefGenerator {
    pub fn new(width: usize, height: usize) -> BriefResult<Self> {
        if width == 0 || height == 0 {
            return Err(BriefError::InvalidImageSize { width, height });
        }
        Ok(Self { w: width, h: height, pattern: Self::sampling_pattern() })
    }

    /// Isotropic Gaussian-like pairs (sum of uniforms), rejected outside the pattern disc
    fn sampling_pattern() -> Vec<[f32; 4]> {
        let mut rng = StdRng::seed_from_u64(PATTERN_SEED);
        let sigma = PATTERN_RADIUS / 2.5;
        let mut point = || loop {
            let mut sample = || (0..4).map(|_| rng.gen_range(-1.0f32..1.0)).sum::<f32>() * sigma * 0.866;
            let (x, y) = (sample().round(), sample().round());
            if x * x + y * y <= PATTERN_RADIUS * PATTERN_RADIUS {
                return (x, y);
            }
        };

        let mut pairs = Vec::with_capacity(DESCRIPTOR_BITS);
        while pairs.len() < DESCRIPTOR_BITS {
            let (x1, y1) = point();
            let (x2, y2) = point();
            if (x1, y1) != (x2, y2) {
                pairs.push([x1, y1, x2, y2]);
            }
        }
        pairs
    }

    /// Box-filtered copy of the image that descriptors are sampled from
    pub fn smooth(&self, img: &Image) -> BriefResult<Image> {
        let expected_len = self.w * self.h;
        let gray = GrayImage::from_raw(self.w as u32, self.h as u32, img.clone()).ok_or(
            BriefError::InvalidImageData { expected_len, actual_len: img.len() },
        )?;
        Ok(box_filter(&gray, SMOOTHING_RADIUS, SMOOTHING_RADIUS).into_raw())
    }

    pub fn generate_descriptors(&self, img: &Image, kps: &[Keypoint]) -> BriefResult<Vec<Descriptor>> {
        let smoothed = self.smooth(img)?;
        Ok(kps.par_iter().map(|kp| self.describe(&smoothed, kp)).collect())
    }

    fn describe(&self, smoothed: &[u8], kp: &Keypoint) -> Descriptor {
        let (s, c) = kp.angle.sin_cos();
        let (cx, cy) = (kp.x, kp.y);
        let mut d = [0u8; DESCRIPTOR_SIZE];

        for (i, &[dx1, dy1, dx2, dy2]) in self.pattern.iter().enumerate() {
            let v1 = self.sample(smoothed, cx + c * dx1 - s * dy1, cy + s * dx1 + c * dy1);
            let v2 = self.sample(smoothed, cx + c * dx2 - s * dy2, cy + s * dx2 + c * dy2);
            let bit = (v1 < v2) as u8;
            d[i / 8] |= bit << (i % 8);
        }
        d
    }

    /// Nearest-pixel lookup clamped to the image
    #[inline]
    fn sample(&self, img: &[u8], x: f32, y: f32) -> u8 {
        let x = x.round().clamp(0.0, (self.w - 1) as f32) as usize;
        let y = y.round().clamp(0.0, (self.h - 1) as f32) as usize;
        img[y * self.w + x]
    }
}

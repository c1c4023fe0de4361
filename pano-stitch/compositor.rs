//! Warping and feathered blending of aligned frames onto a shared canvas.

use crate::config::CompositorConfig;
use crate::error::{StitchError, StitchResult};
use crate::frame_store::Frame;
use image::RgbaImage;
use pano_geometry::Homography;
use rayon::prelude::*;

/// Tolerance for snapping warped corners onto the integer grid
const SNAP_EPS: f64 = 1e-3;

/// Integer extent of the panorama in frame-0 coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanvasBounds {
    pub min_x: i64,
    pub min_y: i64,
    pub width: u32,
    pub height: u32,
}

/// Bounding box of the warped pixel centres of every frame.
///
/// Fails with [`StitchError::OutputTooLarge`] before anything is allocated.
pub fn canvas_bounds(frames: &[Frame], transforms: &[Homography], config: &CompositorConfig) -> StitchResult<CanvasBounds> {
    let mut min = [f64::INFINITY; 2];
    let mut max = [f64::NEG_INFINITY; 2];
    for (frame, t) in frames.iter().zip(transforms) {
        let Some(corners) = t.warp_corners(frame.width(), frame.height()) else {
            continue;
        };
        for c in corners {
            for axis in 0..2 {
                min[axis] = min[axis].min(c[axis]);
                max[axis] = max[axis].max(c[axis]);
            }
        }
    }

    let too_large = |width: f64, height: f64| StitchError::OutputTooLarge {
        width: width as u64,
        height: height as u64,
        max_pixels: config.max_output_pixels,
    };
    if !(min[0].is_finite() && min[1].is_finite() && max[0].is_finite() && max[1].is_finite()) {
        return Err(too_large(f64::INFINITY, f64::INFINITY));
    }

    let min_x = (min[0] + SNAP_EPS).floor();
    let min_y = (min[1] + SNAP_EPS).floor();
    let width = ((max[0] - SNAP_EPS).ceil() - min_x + 1.0).max(1.0);
    let height = ((max[1] - SNAP_EPS).ceil() - min_y + 1.0).max(1.0);

    let max_dim = config.max_output_dimension as f64;
    if width > max_dim || height > max_dim || width * height > config.max_output_pixels as f64 {
        return Err(too_large(width, height));
    }

    Ok(CanvasBounds {
        min_x: min_x as i64,
        min_y: min_y as i64,
        width: width as u32,
        height: height as u32,
    })
}

/// Feathering weight: largest in the frame centre, positive up to the edge
#[inline]
pub fn feather_weight(x: f64, y: f64, width: u32, height: u32) -> f64 {
    let (w, h) = (width as f64, height as f64);
    (x + 1.0).min(w - x) * (y + 1.0).min(h - y)
}

/// Bilinear RGBA lookup with coordinates clamped to the pixel grid
fn sample_bilinear(frame: &Frame, x: f64, y: f64) -> [f64; 4] {
    let (w, h) = (frame.width() as usize, frame.height() as usize);
    let x = x.clamp(0.0, (w - 1) as f64);
    let y = y.clamp(0.0, (h - 1) as f64);
    let (x0, y0) = (x.floor() as usize, y.floor() as usize);
    let (x1, y1) = ((x0 + 1).min(w - 1), (y0 + 1).min(h - 1));
    let (fx, fy) = (x - x0 as f64, y - y0 as f64);

    let (p00, p10) = (frame.pixel(x0, y0), frame.pixel(x1, y0));
    let (p01, p11) = (frame.pixel(x0, y1), frame.pixel(x1, y1));
    let mut out = [0.0; 4];
    for c in 0..4 {
        let top = p00[c] as f64 * (1.0 - fx) + p10[c] as f64 * fx;
        let bottom = p01[c] as f64 * (1.0 - fx) + p11[c] as f64 * fx;
        out[c] = top * (1.0 - fy) + bottom * fy;
    }
    out
}

/// Weighted RGBA accumulator for one stitch
#[derive(Debug, Clone)]
pub struct Canvas {
    bounds: CanvasBounds,
    accum: Vec<f32>,
    weight: Vec<f32>,
}

impl Canvas {
    pub fn new(bounds: CanvasBounds) -> Self {
        let n = bounds.width as usize * bounds.height as usize;
        Self { bounds, accum: vec![0.0; n * 4], weight: vec![0.0; n] }
    }

    pub fn bounds(&self) -> CanvasBounds {
        self.bounds
    }

    /// Inverse-warp `frame` through `transform` (frame into canvas coordinates)
    /// and add its feathered contribution. Rows are filled in parallel.
    pub fn accumulate(&mut self, frame: &Frame, transform: &Homography) {
        let Some(inverse) = transform.inverse() else {
            log::warn!("frame {}: transform is not invertible, skipped", frame.id());
            return;
        };
        let Some(corners) = transform.warp_corners(frame.width(), frame.height()) else {
            return;
        };

        // Canvas rectangle covered by the warped frame, grown by one pixel
        let b = self.bounds;
        let span = |axis: usize, origin: i64, len: u32| {
            let lo = corners.iter().map(|c| c[axis]).fold(f64::INFINITY, f64::min);
            let hi = corners.iter().map(|c| c[axis]).fold(f64::NEG_INFINITY, f64::max);
            let lo = ((lo.floor() as i64 - 1) - origin).clamp(0, len as i64) as usize;
            let hi = ((hi.ceil() as i64 + 2) - origin).clamp(0, len as i64) as usize;
            lo..hi
        };
        let xs = span(0, b.min_x, b.width);
        let ys = span(1, b.min_y, b.height);
        if xs.is_empty() || ys.is_empty() {
            return;
        }

        let (fw, fh) = (frame.width() as f64, frame.height() as f64);
        let width = b.width as usize;
        self.accum
            .par_chunks_mut(width * 4)
            .zip(self.weight.par_chunks_mut(width))
            .enumerate()
            .skip(ys.start)
            .take(ys.len())
            .for_each(|(cy, (acc_row, w_row))| {
                let py = (b.min_y + cy as i64) as f64;
                for cx in xs.clone() {
                    let px = (b.min_x + cx as i64) as f64;
                    let Some([sx, sy]) = inverse.project(px, py) else {
                        continue;
                    };
                    if sx < -0.5 || sy < -0.5 || sx > fw - 0.5 || sy > fh - 0.5 {
                        continue;
                    }
                    let sx = sx.clamp(0.0, fw - 1.0);
                    let sy = sy.clamp(0.0, fh - 1.0);
                    let weight = feather_weight(sx, sy, frame.width(), frame.height());
                    let rgba = sample_bilinear(frame, sx, sy);
                    for c in 0..4 {
                        acc_row[cx * 4 + c] += (rgba[c] * weight) as f32;
                    }
                    w_row[cx] += weight as f32;
                }
            });
    }

    /// Normalize by the accumulated weight; uncovered pixels are transparent black
    pub fn finalize(self) -> RgbaImage {
        let mut out = vec![0u8; self.weight.len() * 4];
        out.par_chunks_mut(4)
            .zip(self.accum.par_chunks(4))
            .zip(self.weight.par_iter())
            .for_each(|((px, acc), &w)| {
                if w > 0.0 {
                    for c in 0..4 {
                        px[c] = (acc[c] / w).round().clamp(0.0, 255.0) as u8;
                    }
                }
            });
        RgbaImage::from_raw(self.bounds.width, self.bounds.height, out)
            .unwrap_or_else(|| RgbaImage::new(self.bounds.width, self.bounds.height))
    }
}

/// Warp every frame through its transform into frame-0 space and blend them
pub fn composite(frames: &[Frame], transforms: &[Homography], config: &CompositorConfig) -> StitchResult<(RgbaImage, CanvasBounds)> {
    let bounds = canvas_bounds(frames, transforms, config)?;
    let mut canvas = Canvas::new(bounds);
    for (frame, t) in frames.iter().zip(transforms) {
        canvas.accumulate(frame, t);
    }
    Ok((canvas.finalize(), bounds))
}

use image::GrayImage;
use imageproc::filter::box_filter;
use pano_core::Image;
use crate::error::{FastError, FastResult};
use crate::types::ScaleLevel;

/// Resolution reduction ahead of feature detection
pub struct ImagePyramid;

impl ImagePyramid {
    /// Scale level at which the longest image side does not exceed `max_dimension`.
    ///
    /// A `max_dimension` of 0 disables downsampling.
    pub fn analysis_level(width: usize, height: usize, max_dimension: usize) -> ScaleLevel {
        let longest = width.max(height);
        if max_dimension == 0 || longest <= max_dimension {
            return ScaleLevel { scale: 1.0, width, height };
        }

        let scale = longest as f32 / max_dimension as f32;
        ScaleLevel {
            scale,
            width: ((width as f32 / scale).round() as usize).max(1),
            height: ((height as f32 / scale).round() as usize).max(1),
        }
    }

    /// Resample `img` to the dimensions of `level`; returns the input unchanged at scale 1.
    ///
    /// Reductions beyond 2x are box-filtered first so that detail finer than
    /// the destination grid does not alias into spurious corners.
    pub fn downsample(img: &Image, width: usize, height: usize, level: &ScaleLevel) -> FastResult<Image> {
        let expected_len = width * height;
        if img.len() != expected_len {
            return Err(FastError::InvalidImageData { expected_len, actual_len: img.len() });
        }
        if level.width == width && level.height == height {
            return Ok(img.clone());
        }

        let x_ratio = width as f32 / level.width as f32;
        let y_ratio = height as f32 / level.height as f32;
        let (rx, ry) = (Self::prefilter_radius(x_ratio), Self::prefilter_radius(y_ratio));
        let prefiltered;
        let img = if rx > 0 || ry > 0 {
            let gray = GrayImage::from_raw(width as u32, height as u32, img.clone())
                .ok_or(FastError::InvalidImageData { expected_len, actual_len: img.len() })?;
            prefiltered = box_filter(&gray, rx, ry).into_raw();
            &prefiltered
        } else {
            img
        };
        let mut downsampled = vec![0u8; level.width * level.height];

        for y in 0..level.height {
            // Sample at the centre of the destination pixel's footprint
            let src_y = ((y as f32 + 0.5) * y_ratio - 0.5).clamp(0.0, (height - 1) as f32);
            for x in 0..level.width {
                let src_x = ((x as f32 + 0.5) * x_ratio - 0.5).clamp(0.0, (width - 1) as f32);
                let value = Self::bilinear_sample(img, width, height, src_x, src_y);
                downsampled[y * level.width + x] = value.round().clamp(0.0, 255.0) as u8;
            }
        }

        Ok(downsampled)
    }

    /// Box radius whose window roughly spans one destination pixel
    fn prefilter_radius(ratio: f32) -> u32 {
        ((ratio - 1.0) / 2.0).floor().max(0.0) as u32
    }

    /// Sample image at fractional coordinates using bilinear interpolation
    pub fn bilinear_sample(img: &[u8], width: usize, height: usize, x: f32, y: f32) -> f32 {
        let x1 = x.floor().max(0.0) as usize;
        let y1 = y.floor().max(0.0) as usize;
        let x1 = x1.min(width - 1);
        let y1 = y1.min(height - 1);
        let x2 = (x1 + 1).min(width - 1);
        let y2 = (y1 + 1).min(height - 1);

        let fx = (x - x1 as f32).clamp(0.0, 1.0);
        let fy = (y - y1 as f32).clamp(0.0, 1.0);

        let p11 = img[y1 * width + x1] as f32;
        let p12 = img[y1 * width + x2] as f32;
        let p21 = img[y2 * width + x1] as f32;
        let p22 = img[y2 * width + x2] as f32;

        let top = p11 * (1.0 - fx) + p12 * fx;
        let bottom = p21 * (1.0 - fx) + p22 * fx;
        top * (1.0 - fy) + bottom * fy
    }
}

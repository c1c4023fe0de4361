use crate::error::{StitchError, StitchResult};
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder, RgbaImage};

/// Encode an RGBA8 image as PNG
pub fn encode_png(image: &RgbaImage) -> StitchResult<Vec<u8>> {
    encode_rgba(image.as_raw(), image.width(), image.height())
}

/// Encode a raw RGBA8 buffer as PNG
pub fn encode_rgba(pixels: &[u8], width: u32, height: u32) -> StitchResult<Vec<u8>> {
    let expected = width as u64 * height as u64 * 4;
    if pixels.len() as u64 != expected {
        return Err(StitchError::Encoding(format!(
            "buffer of {} bytes does not match a {}x{} RGBA image",
            pixels.len(),
            width,
            height
        )));
    }

    let mut bytes = Vec::new();
    PngEncoder::new(&mut bytes)
        .write_image(pixels, width, height, ExtendedColorType::Rgba8)
        .map_err(|e| StitchError::Encoding(e.to_string()))?;
    Ok(bytes)
}

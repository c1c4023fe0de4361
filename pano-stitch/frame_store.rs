use crate::error::{StitchError, StitchResult};

/// An RGBA8 frame owned by the store
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    id: u64,
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Frame {
    /// Copy `pixels` into a new frame after checking that it holds exactly
    /// `width * height` RGBA pixels.
    pub fn new(id: u64, pixels: &[u8], width: u32, height: u32) -> StitchResult<Self> {
        let expected_len = (width as usize)
            .checked_mul(height as usize)
            .and_then(|n| n.checked_mul(4))
            .unwrap_or(usize::MAX);
        if width == 0 || height == 0 || pixels.len() != expected_len {
            return Err(StitchError::InvalidDimensions {
                width,
                height,
                expected_len,
                actual_len: pixels.len(),
            });
        }
        Ok(Self { id, width, height, pixels: pixels.to_vec() })
    }

    /// Ingestion sequence number, unique within one store
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Row-major RGBA8 pixel data
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    #[inline]
    pub(crate) fn pixel(&self, x: usize, y: usize) -> [u8; 4] {
        let i = (y * self.width as usize + x) * 4;
        [self.pixels[i], self.pixels[i + 1], self.pixels[i + 2], self.pixels[i + 3]]
    }
}

/// Frames in ingestion order
#[derive(Debug, Default, Clone)]
pub struct FrameStore {
    frames: Vec<Frame>,
    next_id: u64,
}

impl FrameStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a frame; on error the store is left as it was
    pub fn push(&mut self, pixels: &[u8], width: u32, height: u32) -> StitchResult<u64> {
        let frame = Frame::new(self.next_id, pixels, width, height)?;
        self.next_id += 1;
        self.frames.push(frame);
        Ok(self.next_id - 1)
    }

    pub fn clear(&mut self) {
        self.frames.clear();
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Frame> {
        self.frames.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Frame> {
        self.frames.iter()
    }

    pub fn as_slice(&self) -> &[Frame] {
        &self.frames
    }
}
